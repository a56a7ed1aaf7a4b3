use bytes::Bytes;
use headers::{ContentType, HeaderMapExt};
use http::header::{
    AUTHORIZATION, CONTENT_TYPE, COOKIE, HeaderName, HeaderValue, PROXY_AUTHORIZATION,
};
use http::{HeaderMap, Method};
use reqwest::{Body, Request};
use serde::Serialize;
use url::Url;

use super::RequestOptionsError;

/// Credential headers, whose values are hidden from `Debug` output and thus from logs.
fn is_sensitive(name: &HeaderName) -> bool {
    [AUTHORIZATION, COOKIE, PROXY_AUTHORIZATION].contains(name)
}

/// Options of a single dispatch: method, headers and body.
///
/// Options are handed to the transport as they are, the dispatcher adds nothing.
/// The default is a `GET` request without headers or body.
///
/// # Example
///
/// ```rust
/// use bea_api_client::RequestOptions;
/// use http::Method;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let options = RequestOptions::new()
///     .with_method(Method::PUT)
///     .with_header("authorization", "Bearer token")?
///     .with_json(&serde_json::json!({ "quantity": 3 }))?;
///
/// assert_eq!(options.method(), Method::PUT);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    method: Method,
    headers: HeaderMap,
    body: Option<RequestBody>,
}

impl RequestOptions {
    /// Creates `GET` options without headers or body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets a header, replacing any previous value for the same name.
    ///
    /// # Errors
    ///
    /// Fails if the name or the value is not a valid HTTP header.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, RequestOptionsError> {
        let name = HeaderName::from_bytes(name.as_ref().as_bytes())?;
        let value = HeaderValue::from_str(value.as_ref())?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds all the given headers, replacing previous values for the same names.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Sets a typed header.
    pub fn with_typed_header<H>(mut self, header: H) -> Self
    where
        H: headers::Header,
    {
        self.headers.typed_insert(header);
        self
    }

    /// Sets the body.
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets a JSON body.
    ///
    /// # Errors
    ///
    /// Fails if the value cannot be serialized as JSON.
    pub fn with_json<T>(self, value: &T) -> Result<Self, RequestOptionsError>
    where
        T: Serialize + ?Sized,
    {
        Ok(self.with_body(RequestBody::json(value)?))
    }

    /// Sets a form-encoded body.
    ///
    /// # Errors
    ///
    /// Fails if the value cannot be serialized as a form.
    pub fn with_form<T>(self, value: &T) -> Result<Self, RequestOptionsError>
    where
        T: Serialize + ?Sized,
    {
        Ok(self.with_body(RequestBody::form(value)?))
    }

    /// Sets a plain text body.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_body(RequestBody::text(text))
    }

    /// The HTTP method.
    pub fn method(&self) -> Method {
        self.method.clone()
    }

    /// The headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The body, if any.
    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Builds the transport request.
    ///
    /// The body content type is only used when no `Content-Type` header was set explicitly.
    /// Credential headers are marked sensitive.
    pub(in crate::client) fn into_request(self, url: Url) -> Request {
        let Self {
            method,
            mut headers,
            body,
        } = self;

        for (name, value) in &mut headers {
            if is_sensitive(name) {
                value.set_sensitive(true);
            }
        }

        let mut request = Request::new(method, url);
        *request.headers_mut() = headers;

        if let Some(RequestBody { content_type, data }) = body {
            if let Some(content_type) = content_type
                && !request.headers().contains_key(CONTENT_TYPE)
            {
                request.headers_mut().typed_insert(content_type);
            }
            *request.body_mut() = Some(Body::from(data));
        }

        request
    }
}

/// The body of a request, with its default content type.
#[derive(Clone, derive_more::Debug)]
pub struct RequestBody {
    content_type: Option<ContentType>,
    #[debug(ignore)]
    data: Bytes,
}

impl RequestBody {
    /// Creates an `application/json` body.
    ///
    /// # Errors
    ///
    /// Fails if the value cannot be serialized as JSON.
    pub fn json<T>(value: &T) -> Result<Self, RequestOptionsError>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_json::to_vec(value)?;
        Ok(Self::raw(data, Some(ContentType::json())))
    }

    /// Creates an `application/x-www-form-urlencoded` body.
    ///
    /// # Errors
    ///
    /// Fails if the value cannot be serialized as a form.
    pub fn form<T>(value: &T) -> Result<Self, RequestOptionsError>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_urlencoded::to_string(value)?;
        Ok(Self::raw(data, Some(ContentType::form_url_encoded())))
    }

    /// Creates a `text/plain; charset=utf-8` body.
    pub fn text(text: impl Into<String>) -> Self {
        Self::raw(text.into(), Some(ContentType::text_utf8()))
    }

    /// Creates a body from raw bytes, with an optional content type.
    pub fn raw(data: impl Into<Bytes>, content_type: Option<ContentType>) -> Self {
        Self {
            content_type,
            data: data.into(),
        }
    }

    /// The default content type of this body.
    pub fn content_type(&self) -> Option<&ContentType> {
        self.content_type.as_ref()
    }

    /// The raw body data.
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}
