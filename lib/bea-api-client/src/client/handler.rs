//! Success and error handlers.
//!
//! A [`Dispatcher`](super::Dispatcher) funnels every completed exchange through its
//! [`SuccessHandler`], and every failure through its [`ErrorHandler`].
//!
//! The defaults are [`ParseBody`] and [`Rethrow`]. Closures with the matching shape
//! can be used as handlers too:
//!
//! ```rust,no_run
//! use bea_api_client::{DispatchError, Dispatcher, Payload};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = Dispatcher::builder()
//!     .with_base_address("https://api.bea-ecommerce.example")
//!     .with_error_handler(|error: DispatchError| match error.status() {
//!         Some(401) => Ok(Payload::Json(serde_json::json!({ "guest": true }))),
//!         _ => Err(error),
//!     })
//!     .build()?;
//! # Ok(())
//! # }
//! ```
use std::future::Future;

use http::header::CONTENT_TYPE;
use reqwest::Response;
use tracing::{debug, warn};

use super::payload::is_structured;
use super::{DispatchError, Payload, Rejection};

/// Receives every response the transport yields, whatever its status code.
pub trait SuccessHandler: Send + Sync {
    /// Turns a response into the dispatch outcome.
    fn on_response(
        &self,
        response: Response,
    ) -> impl Future<Output = Result<Payload, DispatchError>> + Send;
}

impl<F, Fut> SuccessHandler for F
where
    F: Fn(Response) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Payload, DispatchError>> + Send,
{
    fn on_response(
        &self,
        response: Response,
    ) -> impl Future<Output = Result<Payload, DispatchError>> + Send {
        self(response)
    }
}

/// Receives every failure: transport errors and success handler rejections.
pub trait ErrorHandler: Send + Sync {
    /// Turns a failure into the dispatch outcome, re-raising or recovering.
    ///
    /// # Errors
    ///
    /// Returns the error to propagate to the caller.
    fn on_error(&self, error: DispatchError) -> Result<Payload, DispatchError>;
}

impl<F> ErrorHandler for F
where
    F: Fn(DispatchError) -> Result<Payload, DispatchError> + Send + Sync,
{
    fn on_error(&self, error: DispatchError) -> Result<Payload, DispatchError> {
        self(error)
    }
}

/// The default success handler.
///
/// Parses the body according to its content type, then rejects non-success statuses
/// with the body's `error` field, or the status code when there is none.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseBody;

impl SuccessHandler for ParseBody {
    async fn on_response(&self, response: Response) -> Result<Payload, DispatchError> {
        settle(response).await
    }
}

/// The default error handler: re-raises the error unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rethrow;

impl ErrorHandler for Rethrow {
    fn on_error(&self, error: DispatchError) -> Result<Payload, DispatchError> {
        Err(error)
    }
}

/// Logs the failure as a warning, then re-raises it unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct WarnAndRethrow;

impl ErrorHandler for WarnAndRethrow {
    fn on_error(&self, error: DispatchError) -> Result<Payload, DispatchError> {
        warn!(kind = ?error.kind(), rejection = %error.rejection(), "dispatch failed: {error}");
        Err(error)
    }
}

/// Byte order mark, skipped at the start of JSON bodies.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads the response body as a [`Payload`] without looking at the status.
///
/// JSON content types are parsed, other bodies are read as text.
///
/// # Errors
///
/// Fails with [`DispatchError::BodyRead`] if the body cannot be read, and with
/// [`DispatchError::InvalidJson`] if a JSON body cannot be parsed.
pub async fn read_payload(response: Response) -> Result<Payload, DispatchError> {
    let status = response.status().as_u16();
    let structured = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(is_structured);

    if structured {
        let data = response
            .bytes()
            .await
            .map_err(|error| DispatchError::BodyRead { status, error })?;
        let data = data.strip_prefix(UTF8_BOM).unwrap_or(&data[..]);
        let value = serde_json::from_slice(data)
            .map_err(|error| DispatchError::InvalidJson { status, error })?;
        Ok(Payload::Json(value))
    } else {
        let text = response
            .text()
            .await
            .map_err(|error| DispatchError::BodyRead { status, error })?;
        Ok(Payload::Text(text))
    }
}

/// Reads the response body, then settles on its status.
///
/// This is what [`ParseBody`] does; custom success handlers can reuse it.
///
/// # Errors
///
/// Fails like [`read_payload`], or with [`DispatchError::Rejected`] when the status
/// is not a success.
pub async fn settle(response: Response) -> Result<Payload, DispatchError> {
    let status = response.status();
    let payload = read_payload(response).await?;

    if !status.is_success() {
        let status = status.as_u16();
        let rejection = payload
            .error_field()
            .cloned()
            .map_or(Rejection::Status(status), Rejection::Value);
        debug!(%status, %rejection, "response rejected");
        return Err(DispatchError::Rejected {
            status,
            rejection,
            body: payload,
        });
    }

    Ok(payload)
}
