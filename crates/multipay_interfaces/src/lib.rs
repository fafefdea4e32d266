//! Seams between the lifecycle engine, the provider integrations and the
//! outside world: the uniform provider contract, the HTTP client
//! abstraction, configuration types and provider-facing errors.

pub mod api;
pub mod client;
pub mod configs;
pub mod errors;

pub use api::{Provider, ProviderConstructor};
pub use client::{HttpClient, HttpClientError, ReqwestClient, Response};
pub use configs::GatewayParams;
pub use errors::{ImproperlyConfigured, ProviderError};
