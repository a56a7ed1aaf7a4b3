use crate::ConfigError;

/// Errors raised while starting a [`TestClient`](super::TestClient).
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum TestClientError {
    /// Binding the backend listener failed.
    #[display("I/O error: {_0}")]
    IoError(std::io::Error),

    /// The dispatcher could not be built.
    #[display("Dispatcher configuration error: {_0}")]
    ConfigError(ConfigError),

    /// The backend did not become healthy in time.
    #[from(ignore)]
    #[display("Backend failed to become healthy after {attempts} attempts")]
    UnhealthyBackend {
        /// Number of health check retries.
        attempts: usize,
    },
}
