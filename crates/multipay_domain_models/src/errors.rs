//! Errors surfaced by payment records and provider operations.

/// A failure reported by (or while talking to) a payment service provider.
///
/// `code` carries the PSP's machine-readable reason code when one exists;
/// `gateway_message` carries the PSP's own human-readable text.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct PaymentError {
    pub message: String,
    pub code: Option<String>,
    pub gateway_message: Option<String>,
}

impl PaymentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            gateway_message: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
            gateway_message: None,
        }
    }

    pub fn gateway_message(mut self, message: impl Into<String>) -> Self {
        self.gateway_message = Some(message.into());
        self
    }
}

/// Failures of the host's persistence layer as seen through the payment
/// record contract.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("payment record not found")]
    NotFound,
    #[error("failed to serialize payment extension data")]
    SerializationFailed,
    #[error("failed to persist payment record")]
    PersistenceFailed,
}
