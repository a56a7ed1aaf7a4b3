use std::future::{Future, IntoFuture};
use std::pin::Pin;

use http::HeaderMap;
use serde::Serialize;

use super::{
    DispatchError, Dispatcher, ErrorHandler, ParseBody, Payload, RequestBody, RequestOptions,
    RequestOptionsError, Rethrow, SuccessHandler,
};

/// A prepared call, dispatched when awaited.
///
/// Created by [`Dispatcher::get`], [`Dispatcher::post`] and friends. Building a call
/// does not touch the network.
///
/// # Example
///
/// ```rust,no_run
/// # use bea_api_client::Dispatcher;
/// # async fn example(api: &Dispatcher) -> Result<(), Box<dyn std::error::Error>> {
/// let order = api
///     .post("/orders")
///     .with_header("x-cart-id", "c-42")?
///     .json(&serde_json::json!({ "payment": "card" }))?
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(derive_more::Debug)]
pub struct DispatchCall<S = ParseBody, E = Rethrow> {
    dispatcher: Dispatcher<S, E>,
    relative_path: String,
    options: RequestOptions,
}

impl<S, E> DispatchCall<S, E> {
    pub(in crate::client) fn new(
        dispatcher: Dispatcher<S, E>,
        relative_path: String,
        options: RequestOptions,
    ) -> Self {
        Self {
            dispatcher,
            relative_path,
            options,
        }
    }

    /// The relative path of this call.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// The request options of this call.
    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Sets a header.
    ///
    /// # Errors
    ///
    /// Fails if the name or the value is not a valid HTTP header.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, RequestOptionsError> {
        self.options = self.options.with_header(name, value)?;
        Ok(self)
    }

    /// Adds headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.options = self.options.with_headers(headers);
        self
    }

    /// Sets a JSON body.
    ///
    /// # Errors
    ///
    /// Fails if the value cannot be serialized as JSON.
    pub fn json<T>(mut self, value: &T) -> Result<Self, RequestOptionsError>
    where
        T: Serialize + ?Sized,
    {
        self.options = self.options.with_json(value)?;
        Ok(self)
    }

    /// Sets a form-encoded body.
    ///
    /// # Errors
    ///
    /// Fails if the value cannot be serialized as a form.
    pub fn form<T>(mut self, value: &T) -> Result<Self, RequestOptionsError>
    where
        T: Serialize + ?Sized,
    {
        self.options = self.options.with_form(value)?;
        Ok(self)
    }

    /// Sets a plain text body.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.options = self.options.with_text(text);
        self
    }

    /// Sets the body.
    pub fn body(mut self, body: RequestBody) -> Self {
        self.options = self.options.with_body(body);
        self
    }

    /// Replaces all the request options, method included.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

impl<S, E> IntoFuture for DispatchCall<S, E>
where
    S: SuccessHandler + 'static,
    E: ErrorHandler + 'static,
{
    type Output = Result<Payload, DispatchError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        let Self {
            dispatcher,
            relative_path,
            options,
        } = self;
        Box::pin(async move { dispatcher.dispatch(&relative_path, Some(options)).await })
    }
}
