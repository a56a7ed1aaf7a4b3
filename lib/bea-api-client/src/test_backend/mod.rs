//! In-process backends for dispatcher tests.
//!
//! [`TestClient::start`] binds a random local port, launches a [`TestBackend`] on it,
//! waits until the backend is healthy, and hands out a [`Dispatcher`] bound to it.
//!
//! ```rust,no_run
//! use bea_api_client::test_backend::{TestBackend, TestClient};
//! use std::net::TcpListener;
//!
//! #[derive(Debug)]
//! struct CatalogBackend;
//!
//! impl TestBackend for CatalogBackend {
//!     async fn launch(&self, listener: TcpListener) {
//!         listener.set_nonblocking(true).expect("set non-blocking");
//!         let _listener = tokio::net::TcpListener::from_std(listener).expect("valid listener");
//!         // Serve the catalog here
//!     }
//! }
//!
//! #[tokio::test]
//! async fn should_list_products() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = TestClient::start(CatalogBackend).await?;
//!
//!     let products = backend.dispatch("/products", None).await?;
//!     Ok(())
//! }
//! ```

use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::sync::Arc;

use backon::{ExponentialBuilder, Retryable};
use tracing::{debug, error};

use crate::Dispatcher;

mod backend;
pub use self::backend::*;

mod error;
pub use self::error::*;

/// A dispatcher bound to a running [`TestBackend`].
///
/// Derefs to [`Dispatcher`]. The backend task is aborted when the client is dropped.
#[derive(Debug, derive_more::Deref)]
pub struct TestClient<T> {
    local_addr: SocketAddr,
    #[deref]
    dispatcher: Dispatcher,
    handle: Option<tokio::task::JoinHandle<()>>,
    backend: Arc<T>,
}

impl<T> TestClient<T>
where
    T: TestBackend + Send + Sync + 'static,
{
    /// Starts the backend and waits until it is healthy.
    ///
    /// # Errors
    ///
    /// Fails if the port cannot be bound, if the dispatcher cannot be built, or if
    /// the backend does not become healthy within the configured retries.
    pub async fn start(backend: T) -> Result<Self, TestClientError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
        let listener = TcpListener::bind(addr)?;
        let local_addr = listener.local_addr()?;

        let backend = Arc::new(backend);
        let handle = tokio::spawn({
            let backend = Arc::clone(&backend);
            async move {
                backend.launch(listener).await;
            }
        });

        let TestBackendConfig {
            dispatcher,
            min_backoff_delay,
            max_backoff_delay,
            max_retry_attempts,
        } = backend.config();

        let dispatcher = dispatcher
            .unwrap_or_else(Dispatcher::builder)
            .with_base_address(format!("http://{local_addr}"))
            .build()?;

        let backoff = ExponentialBuilder::default()
            .with_min_delay(min_backoff_delay)
            .with_max_delay(max_backoff_delay)
            .with_max_times(max_retry_attempts);

        if !Self::wait_for_health(&backend, &dispatcher, local_addr, backoff).await {
            handle.abort();
            return Err(TestClientError::UnhealthyBackend {
                attempts: max_retry_attempts,
            });
        }

        Ok(Self {
            local_addr,
            dispatcher,
            handle: Some(handle),
            backend,
        })
    }

    async fn wait_for_health(
        backend: &Arc<T>,
        dispatcher: &Dispatcher,
        local_addr: SocketAddr,
        backoff: ExponentialBuilder,
    ) -> bool {
        let health_check = || {
            let backend = Arc::clone(backend);
            let dispatcher = dispatcher.clone();
            async move {
                match backend.is_healthy(&dispatcher).await {
                    Some(true) => {
                        debug!(%local_addr, "backend healthy");
                        Ok(())
                    }
                    Some(false) => {
                        debug!(%local_addr, "backend not yet healthy, retrying");
                        Err(std::io::Error::new(
                            std::io::ErrorKind::ConnectionRefused,
                            "backend not healthy yet",
                        ))
                    }
                    None => tokio::net::TcpStream::connect(local_addr)
                        .await
                        .map(drop)
                        .inspect_err(|err| debug!(?err, %local_addr, "no connection yet")),
                }
            }
        };

        match health_check.retry(backoff).await {
            Ok(()) => true,
            Err(err) => {
                error!(?err, %local_addr, "backend never became healthy");
                false
            }
        }
    }
}

impl<T> TestClient<T> {
    /// The address the backend listens on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The launched backend.
    pub fn backend(&self) -> &T {
        &self.backend
    }
}

impl<T> Drop for TestClient<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
