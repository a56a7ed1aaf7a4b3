//! Base address resolution from the process environment.
//!
//! The storefront reads the API host once, at startup, from [`API_HOST_VAR`].
//! The resolved address is then handed to [`DispatcherBuilder::with_base_address`](crate::DispatcherBuilder::with_base_address),
//! so dispatchers never read ambient state themselves.

use std::env::{self, VarError};

/// Environment variable holding the backend API base address.
pub const API_HOST_VAR: &str = "NX_API_HOST";

/// Errors raised while resolving the dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum ConfigError {
    /// The environment variable is not set.
    #[display("Environment variable {name} is not set")]
    MissingEnvVar {
        /// Name of the variable.
        name: &'static str,
    },

    /// The environment variable is not valid unicode.
    #[display("Environment variable {name} is not valid unicode")]
    InvalidEnvVar {
        /// Name of the variable.
        name: &'static str,
    },

    /// No base address was configured, or it is empty.
    #[display("Missing base address")]
    MissingBaseAddress,
}

/// Reads the base address from [`API_HOST_VAR`].
///
/// # Errors
///
/// Fails if the variable is missing, empty, or not valid unicode.
pub fn base_address_from_env() -> Result<String, ConfigError> {
    base_address_from(|name| env::var(name))
}

/// Reads the base address with the given variable lookup.
///
/// # Errors
///
/// Fails if the variable is missing, empty, or not valid unicode.
pub fn base_address_from<F>(lookup: F) -> Result<String, ConfigError>
where
    F: FnOnce(&str) -> Result<String, VarError>,
{
    match lookup(API_HOST_VAR) {
        Ok(address) if address.is_empty() => Err(ConfigError::MissingBaseAddress),
        Ok(address) => Ok(address),
        Err(VarError::NotPresent) => Err(ConfigError::MissingEnvVar { name: API_HOST_VAR }),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnvVar { name: API_HOST_VAR }),
    }
}
