use std::env::VarError;
use std::sync::Arc;

use super::handler::{ErrorHandler, ParseBody, Rethrow, SuccessHandler};
use super::{Dispatcher, DispatcherConfig};
use crate::config::{self, ConfigError};

/// Builder for [`Dispatcher`] instances.
///
/// # Default Configuration
///
/// - **Base address**: none, it must be set before [`build`](Self::build)
/// - **Success handler**: [`ParseBody`]
/// - **Error handler**: [`Rethrow`]
/// - **HTTP client**: a default `reqwest::Client`, without timeout
///
/// # Example
///
/// ```rust
/// use bea_api_client::{Dispatcher, WarnAndRethrow};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let api = Dispatcher::builder()
///     .with_base_address("https://api.bea-ecommerce.example")
///     .with_error_handler(WarnAndRethrow)
///     .build()?;
///
/// assert_eq!(api.base_address(), "https://api.bea-ecommerce.example");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DispatcherBuilder<S = ParseBody, E = Rethrow> {
    http: reqwest::Client,
    base_address: Option<String>,
    success_handler: S,
    error_handler: E,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_address: None,
            success_handler: ParseBody,
            error_handler: Rethrow,
        }
    }
}

impl<S, E> DispatcherBuilder<S, E>
where
    S: SuccessHandler,
    E: ErrorHandler,
{
    /// Builds the dispatcher.
    ///
    /// No network activity happens here, and the base address is not checked for
    /// well-formedness: a malformed address only surfaces when a request is dispatched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingBaseAddress`] if no base address was set, or if it is empty.
    pub fn build(self) -> Result<Dispatcher<S, E>, ConfigError> {
        let Self {
            http,
            base_address,
            success_handler,
            error_handler,
        } = self;

        let base_address = base_address
            .filter(|address| !address.is_empty())
            .ok_or(ConfigError::MissingBaseAddress)?;

        let config = DispatcherConfig {
            http,
            base_address,
            success_handler,
            error_handler,
        };
        Ok(Dispatcher {
            config: Arc::new(config),
        })
    }
}

impl<S, E> DispatcherBuilder<S, E> {
    /// Sets the base address every relative path is appended to.
    ///
    /// The path is appended as is: `"https://api.example"` with `"/products"` targets
    /// `"https://api.example/products"`, and a trailing slash on the base address is kept.
    pub fn with_base_address(mut self, base_address: impl Into<String>) -> Self {
        self.base_address = Some(base_address.into());
        self
    }

    /// Sets the base address from the `NX_API_HOST` environment variable.
    ///
    /// # Errors
    ///
    /// Fails if the variable is missing, empty, or not valid unicode.
    pub fn with_base_address_from_env(self) -> Result<Self, ConfigError> {
        let base_address = config::base_address_from_env()?;
        Ok(self.with_base_address(base_address))
    }

    /// Sets the base address from the `NX_API_HOST` variable, read with the given lookup.
    ///
    /// # Errors
    ///
    /// Fails if the variable is missing, empty, or not valid unicode.
    pub fn with_base_address_from<F>(self, lookup: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(&str) -> Result<String, VarError>,
    {
        let base_address = config::base_address_from(lookup)?;
        Ok(self.with_base_address(base_address))
    }

    /// Sets the HTTP client used as transport.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Replaces the success handler.
    pub fn with_success_handler<S2>(self, success_handler: S2) -> DispatcherBuilder<S2, E>
    where
        S2: SuccessHandler,
    {
        let Self {
            http,
            base_address,
            error_handler,
            ..
        } = self;
        DispatcherBuilder {
            http,
            base_address,
            success_handler,
            error_handler,
        }
    }

    /// Replaces the error handler.
    pub fn with_error_handler<E2>(self, error_handler: E2) -> DispatcherBuilder<S, E2>
    where
        E2: ErrorHandler,
    {
        let Self {
            http,
            base_address,
            success_handler,
            ..
        } = self;
        DispatcherBuilder {
            http,
            base_address,
            success_handler,
            error_handler,
        }
    }
}
