use std::fmt;

use serde::de::DeserializeOwned;

/// A response body, parsed according to its declared content type.
///
/// Bodies declared as a structured-data format (JSON media types) are parsed,
/// everything else is read as text.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A parsed JSON body.
    Json(serde_json::Value),
    /// A body read as plain text.
    Text(String),
}

impl Payload {
    /// Returns `true` for a parsed JSON body.
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json(_))
    }

    /// Deserializes the JSON body into `T`.
    ///
    /// A text body is deserialized as a JSON string.
    ///
    /// # Errors
    ///
    /// Fails if the payload does not match the shape of `T`.
    pub fn as_json<T>(&self) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned,
    {
        match self {
            Self::Json(value) => T::deserialize(value),
            Self::Text(text) => T::deserialize(serde_json::Value::String(text.clone())),
        }
    }

    /// Returns the text body, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }

    /// Converts the payload into a JSON value.
    pub fn into_value(self) -> serde_json::Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => serde_json::Value::String(text),
        }
    }

    /// Returns the top-level `error` field when it holds a usable value.
    ///
    /// `null`, `false`, `0` and `""` are not usable, callers fall back to the status code.
    pub fn error_field(&self) -> Option<&serde_json::Value> {
        let Self::Json(value) = self else {
            return None;
        };
        value.get("error").filter(|error| is_truthy(error))
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => write!(formatter, "{value}"),
            Self::Text(text) => formatter.write_str(text),
        }
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(flag) => *flag,
        serde_json::Value::Number(number) => number.as_f64().is_some_and(|it| it != 0.0),
        serde_json::Value::String(text) => !text.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

/// Tells whether a `Content-Type` header value denotes a structured-data format.
///
/// `application/json` and any `+json` suffixed media type qualify. A value that
/// cannot be parsed as a media type qualifies if it mentions `application/json`.
pub fn is_structured(content_type: &str) -> bool {
    match content_type.parse::<mime::Mime>() {
        Ok(media_type) => {
            media_type.subtype() == mime::JSON || media_type.suffix() == Some(mime::JSON)
        }
        Err(_) => content_type.contains("application/json"),
    }
}
