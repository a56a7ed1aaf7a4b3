use std::fmt::Debug;

use super::payload::Payload;

/// Errors that can settle a dispatch.
///
/// Every variant reaches the configured [`ErrorHandler`](super::ErrorHandler) before it is
/// returned to the caller. Use [`kind`](Self::kind) to tell the failure categories apart, or
/// [`rejection`](Self::rejection) to get the bare rejected value.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum DispatchError {
    /// The concatenated base address and relative path is not a valid URL.
    ///
    /// The base address is not validated when the dispatcher is built, so a malformed
    /// address only surfaces here, when a request is attempted.
    #[display("Invalid request URL '{url}': {error}")]
    #[from(skip)]
    InvalidUrl {
        /// The URL that failed to parse.
        url: String,
        /// The underlying parse error.
        #[error(source)]
        error: url::ParseError,
    },

    /// The transport failed before any response was received.
    ///
    /// Covers DNS failures, refused connections, and aborted exchanges.
    #[display("Transport failure: {_0}")]
    Transport(reqwest::Error),

    /// A response was received but its body could not be read.
    #[display("Failed to read response body (status {status}): {error}")]
    #[from(skip)]
    BodyRead {
        /// The HTTP status of the response.
        status: u16,
        /// The underlying read error.
        #[error(source)]
        error: reqwest::Error,
    },

    /// The response declared a JSON content type but the body is not valid JSON.
    #[display("Failed to parse JSON response body (status {status}): {error}")]
    #[from(skip)]
    InvalidJson {
        /// The HTTP status of the response.
        status: u16,
        /// The underlying parse error.
        #[error(source)]
        error: serde_json::Error,
    },

    /// The response was read but its status is not a success.
    #[display("Request rejected with status {status}: {rejection}")]
    #[from(skip)]
    Rejected {
        /// The HTTP status of the response.
        status: u16,
        /// The `error` field of the body, or the status code.
        rejection: Rejection,
        /// The parsed response body.
        body: Payload,
    },

    /// Raised by a custom success or error handler.
    #[display("{message}")]
    #[from(skip)]
    Handler {
        /// Description of the failure.
        message: String,
    },
}

/// Failure categories of a [`DispatchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No response was received.
    Transport,
    /// A response was received but its body could not be read or parsed.
    BodyRead,
    /// A response was read and the backend, or a handler, rejected the call.
    Application,
}

/// The bare value a dispatch rejects with.
///
/// This is the view callers get when they do not care about the failure category:
/// the body's `error` field, the numeric status code, or the message of the underlying error.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum Rejection {
    /// The `error` field of a structured error body.
    #[display("{_0}")]
    Value(serde_json::Value),
    /// The HTTP status code, when the body carries no usable `error` field.
    #[display("{_0}")]
    Status(u16),
    /// The message of a transport, parsing, or handler error.
    #[display("{_0}")]
    Error(String),
}

impl DispatchError {
    /// Creates an error for a custom handler rejection.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }

    /// Returns the failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl { .. } | Self::Transport(_) => ErrorKind::Transport,
            Self::BodyRead { .. } | Self::InvalidJson { .. } => ErrorKind::BodyRead,
            Self::Rejected { .. } | Self::Handler { .. } => ErrorKind::Application,
        }
    }

    /// Returns the bare rejected value, without its category.
    pub fn rejection(&self) -> Rejection {
        match self {
            Self::InvalidUrl { error, .. } => Rejection::Error(error.to_string()),
            Self::Transport(error) | Self::BodyRead { error, .. } => {
                Rejection::Error(error.to_string())
            }
            Self::InvalidJson { error, .. } => Rejection::Error(error.to_string()),
            Self::Rejected { rejection, .. } => rejection.clone(),
            Self::Handler { message } => Rejection::Error(message.clone()),
        }
    }

    /// Returns the HTTP status when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BodyRead { status, .. }
            | Self::InvalidJson { status, .. }
            | Self::Rejected { status, .. } => Some(*status),
            Self::Transport(error) => error.status().map(|status| status.as_u16()),
            Self::InvalidUrl { .. } | Self::Handler { .. } => None,
        }
    }
}

/// Errors raised while assembling [`RequestOptions`](super::RequestOptions).
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum RequestOptionsError {
    /// Invalid HTTP header name.
    InvalidHeaderName(http::header::InvalidHeaderName),

    /// Invalid HTTP header value.
    InvalidHeaderValue(http::header::InvalidHeaderValue),

    /// The body could not be serialized as JSON.
    JsonError(serde_json::Error),

    /// The body could not be serialized as a form.
    FormError(serde_urlencoded::ser::Error),
}
