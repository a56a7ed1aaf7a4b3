//! # BeA API client
//!
//! HTTP request dispatcher used by the BeA-Ecommerce storefront to reach its backend API.
//!
//! A [`Dispatcher`] is bound once to a base address and a pair of handlers:
//! - a [`SuccessHandler`] that receives every completed HTTP exchange, whatever its status
//! - an [`ErrorHandler`] that receives every failure, transport-level or raised by the success handler
//!
//! Each dispatch issues exactly one request to `base_address + relative_path` and settles exactly once.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bea_api_client::Dispatcher;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let api = Dispatcher::builder()
//!     .with_base_address("https://api.bea-ecommerce.example")
//!     .build()?;
//!
//! // JSON bodies are parsed, other bodies are read as text
//! let product = api.dispatch("/products/1", None).await?;
//! println!("{product}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Request options
//!
//! ```rust,no_run
//! use bea_api_client::{Dispatcher, RequestOptions};
//! use http::Method;
//!
//! # async fn example(api: &Dispatcher) -> Result<(), Box<dyn std::error::Error>> {
//! let options = RequestOptions::new()
//!     .with_method(Method::POST)
//!     .with_header("x-cart-id", "c-42")?
//!     .with_json(&serde_json::json!({ "sku": "TSHIRT-M", "quantity": 2 }))?;
//! let cart = api.dispatch("/cart/items", Some(options)).await?;
//!
//! // Or the fluent form, awaited directly
//! let cart = api
//!     .post("/cart/items")
//!     .json(&serde_json::json!({ "sku": "TSHIRT-L", "quantity": 1 }))?
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Failures
//!
//! Every failure is a [`DispatchError`]. Its [`kind`](DispatchError::kind) tells transport,
//! body-read and application failures apart, while [`rejection`](DispatchError::rejection)
//! gives the bare value: the body's `error` field, the HTTP status code, or the error message.
//!
//! ```rust,no_run
//! use bea_api_client::{Dispatcher, ErrorKind, Rejection};
//!
//! # async fn example(api: &Dispatcher) {
//! match api.dispatch("/products/404", None).await {
//!     Ok(product) => println!("{product}"),
//!     Err(error) if error.kind() == ErrorKind::Application => match error.rejection() {
//!         Rejection::Value(value) => println!("backend said {value}"),
//!         Rejection::Status(status) => println!("backend answered {status}"),
//!         Rejection::Error(message) => println!("{message}"),
//!     },
//!     Err(error) => println!("request failed: {error}"),
//! }
//! # }
//! ```

mod client;
pub use self::client::*;

pub mod config;
pub use self::config::ConfigError;

pub mod test_backend;
