use std::fmt::Debug;
use std::sync::Arc;

use http::Method;
use tracing::debug;
use url::Url;

use crate::config::ConfigError;

mod builder;
pub use self::builder::DispatcherBuilder;

mod call;
pub use self::call::DispatchCall;

mod error;
pub use self::error::{DispatchError, ErrorKind, Rejection, RequestOptionsError};

pub mod handler;
pub use self::handler::{ErrorHandler, ParseBody, Rethrow, SuccessHandler, WarnAndRethrow};

mod options;
pub use self::options::{RequestBody, RequestOptions};

mod payload;
pub use self::payload::{Payload, is_structured};

/// Request dispatcher bound to a base address and a pair of handlers.
///
/// Each [`dispatch`](Self::dispatch) issues exactly one HTTP request to
/// `base_address + relative_path`. The response, whatever its status, goes to the
/// [`SuccessHandler`]. Transport failures and success handler rejections go to the
/// [`ErrorHandler`], whose result settles the dispatch.
///
/// Use [`Dispatcher::builder`] to create instances.
///
/// # Example
///
/// ```rust,no_run
/// use bea_api_client::{Dispatcher, Rejection};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let api = Dispatcher::builder()
///     .with_base_address("https://api.bea-ecommerce.example")
///     .build()?;
///
/// let products = api.dispatch("/products?page=2", None).await?;
///
/// let error = api.dispatch("/products/unknown", None).await.unwrap_err();
/// assert_eq!(error.rejection(), Rejection::Value("not found".into()));
/// # Ok(())
/// # }
/// ```
///
/// # Thread Safety
///
/// The configuration is immutable and shared behind an [`Arc`]: clones are cheap, and
/// concurrent dispatches are independent from each other.
pub struct Dispatcher<S = ParseBody, E = Rethrow> {
    config: Arc<DispatcherConfig<S, E>>,
}

struct DispatcherConfig<S, E> {
    http: reqwest::Client,
    base_address: String,
    success_handler: S,
    error_handler: E,
}

impl<S, E> Clone for Dispatcher<S, E> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, E> Debug for Dispatcher<S, E> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Dispatcher")
            .field("base_address", &self.config.base_address)
            .field("success_handler", &std::any::type_name::<S>())
            .field("error_handler", &std::any::type_name::<E>())
            .finish_non_exhaustive()
    }
}

// Create
impl Dispatcher {
    /// Creates a builder with the default handlers.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Creates a dispatcher with the default handlers, bound to the `NX_API_HOST` address.
    ///
    /// The environment is read once, here.
    ///
    /// # Errors
    ///
    /// Fails if the variable is missing, empty, or not valid unicode.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::builder().with_base_address_from_env()?.build()
    }
}

impl<S, E> Dispatcher<S, E> {
    /// The base address every relative path is appended to.
    pub fn base_address(&self) -> &str {
        &self.config.base_address
    }
}

// Dispatch
impl<S, E> Dispatcher<S, E>
where
    S: SuccessHandler,
    E: ErrorHandler,
{
    /// Issues one HTTP request to `base_address + relative_path`.
    ///
    /// The relative path is appended to the base address as is. `None` options
    /// send a `GET` request without headers or body.
    ///
    /// # Errors
    ///
    /// Returns whatever the error handler returns for a failure. With the default
    /// [`Rethrow`] handler, this is the failure itself:
    /// - [`DispatchError::InvalidUrl`] if the concatenated URL is malformed
    /// - [`DispatchError::Transport`] if no response was received
    /// - [`DispatchError::BodyRead`] or [`DispatchError::InvalidJson`] if the body cannot be read
    /// - [`DispatchError::Rejected`] if the status is not a success
    pub async fn dispatch(
        &self,
        relative_path: &str,
        options: Option<RequestOptions>,
    ) -> Result<Payload, DispatchError> {
        let DispatcherConfig {
            success_handler,
            error_handler,
            ..
        } = self.config.as_ref();

        let outcome = match self.exchange(relative_path, options.unwrap_or_default()).await {
            Ok(response) => success_handler.on_response(response).await,
            Err(error) => Err(error),
        };

        outcome.or_else(|error| error_handler.on_error(error))
    }

    async fn exchange(
        &self,
        relative_path: &str,
        options: RequestOptions,
    ) -> Result<reqwest::Response, DispatchError> {
        let DispatcherConfig {
            http, base_address, ..
        } = self.config.as_ref();

        let url = format!("{base_address}{relative_path}");
        let url = match Url::parse(&url) {
            Ok(url) => url,
            Err(error) => return Err(DispatchError::InvalidUrl { url, error }),
        };
        let request = options.into_request(url);

        debug!(?request, "sending...");
        let response = http.execute(request).await?;
        debug!(?response, "...receiving");

        Ok(response)
    }
}

impl<S, E> Dispatcher<S, E> {
    /// Prepares a call with the given method, awaited to dispatch it.
    pub fn request(&self, method: Method, relative_path: impl Into<String>) -> DispatchCall<S, E> {
        DispatchCall::new(
            self.clone(),
            relative_path.into(),
            RequestOptions::new().with_method(method),
        )
    }

    /// Prepares a `GET` call.
    pub fn get(&self, relative_path: impl Into<String>) -> DispatchCall<S, E> {
        self.request(Method::GET, relative_path)
    }

    /// Prepares a `POST` call.
    pub fn post(&self, relative_path: impl Into<String>) -> DispatchCall<S, E> {
        self.request(Method::POST, relative_path)
    }

    /// Prepares a `PUT` call.
    pub fn put(&self, relative_path: impl Into<String>) -> DispatchCall<S, E> {
        self.request(Method::PUT, relative_path)
    }

    /// Prepares a `PATCH` call.
    pub fn patch(&self, relative_path: impl Into<String>) -> DispatchCall<S, E> {
        self.request(Method::PATCH, relative_path)
    }

    /// Prepares a `DELETE` call.
    pub fn delete(&self, relative_path: impl Into<String>) -> DispatchCall<S, E> {
        self.request(Method::DELETE, relative_path)
    }
}
