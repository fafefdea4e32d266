//! Errors surfaced by provider integrations.

use multipay_domain_models::errors::PaymentError;

/// Failures inside a provider operation.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Failed to serialize an outbound request body.
    #[error("Failed to encode the request to the payment service provider")]
    RequestEncodingFailed,
    /// The PSP's response could not be parsed.
    #[error("Failed to deserialize the payment service provider response")]
    ResponseDeserializationFailed,
    /// The outbound call itself failed (network error, timeout, PSP 5xx).
    #[error("Failed to communicate with the payment service provider")]
    ProcessingStepFailed,
    /// A field the operation needs is absent from the payment or request.
    #[error("Missing required field: {field_name}")]
    MissingRequiredField { field_name: &'static str },
    /// The provider does not support this operation.
    #[error("{0} is not supported by this provider")]
    NotImplemented(&'static str),
    /// Persisting provider state on the payment record failed.
    #[error("Failed to persist payment state")]
    StorageFailed,
    /// A failure the PSP reported about the payment itself.
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// A static configuration error, raised at provider construction and never
/// at request time.
#[derive(Debug, thiserror::Error)]
#[error("improperly configured: {0}")]
pub struct ImproperlyConfigured(pub String);

impl ImproperlyConfigured {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}
