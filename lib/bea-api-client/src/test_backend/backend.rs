use std::future::Future;
use std::net::TcpListener;
use std::time::Duration;

use crate::{Dispatcher, DispatcherBuilder};

/// A backend launched in-process for tests.
///
/// Implementations start an HTTP server on the given listener, with whatever framework
/// they like, and optionally tell when the server is ready.
///
/// # Example
///
/// ```rust
/// use bea_api_client::Dispatcher;
/// use bea_api_client::test_backend::TestBackend;
/// use std::net::TcpListener;
///
/// #[derive(Debug)]
/// struct CatalogBackend;
///
/// impl TestBackend for CatalogBackend {
///     async fn launch(&self, listener: TcpListener) {
///         listener.set_nonblocking(true).expect("set non-blocking");
///         let listener = tokio::net::TcpListener::from_std(listener).expect("valid listener");
///         // axum::serve(listener, router).await.expect("backend served");
///     }
///
///     async fn is_healthy(&self, dispatcher: &Dispatcher) -> Option<bool> {
///         Some(dispatcher.dispatch("/health", None).await.is_ok())
///     }
/// }
/// ```
pub trait TestBackend {
    /// Launches the backend on the provided listener, bound to a random local port.
    fn launch(&self, listener: TcpListener) -> impl Future<Output = ()> + Send;

    /// Tells whether the backend is ready.
    ///
    /// * `Some(true)` - ready
    /// * `Some(false)` - not ready yet
    /// * `None` - ready as soon as a TCP connection can be established (the default)
    fn is_healthy(&self, _dispatcher: &Dispatcher) -> impl Future<Output = Option<bool>> + Send {
        std::future::ready(None)
    }

    /// Configuration of the dispatcher and of the health check.
    fn config(&self) -> TestBackendConfig {
        TestBackendConfig::default()
    }
}

/// Default minimum delay between health checks.
pub const DEFAULT_MIN_BACKOFF_DELAY: Duration = Duration::from_millis(10);

/// Default maximum delay between health checks.
pub const DEFAULT_MAX_BACKOFF_DELAY: Duration = Duration::from_secs(1);

/// Default number of health check retries.
pub const DEFAULT_MAX_RETRY_ATTEMPTS: usize = 10;

/// Configuration of a [`TestClient`](super::TestClient).
#[derive(Debug, Clone)]
pub struct TestBackendConfig {
    /// Dispatcher builder to start from.
    ///
    /// Its base address is replaced with the address of the launched backend.
    pub dispatcher: Option<DispatcherBuilder>,

    /// Minimum delay between health checks.
    pub min_backoff_delay: Duration,

    /// Maximum delay between health checks.
    pub max_backoff_delay: Duration,

    /// Number of health check retries before giving up.
    pub max_retry_attempts: usize,
}

impl Default for TestBackendConfig {
    fn default() -> Self {
        Self {
            dispatcher: None,
            min_backoff_delay: DEFAULT_MIN_BACKOFF_DELAY,
            max_backoff_delay: DEFAULT_MAX_BACKOFF_DELAY,
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
        }
    }
}
