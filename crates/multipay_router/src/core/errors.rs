//! Errors surfaced by the lifecycle engine and callback dispatcher.

use common_enums::PaymentStatus;

#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("`{operation}` requires status `{required}`, payment is `{found}`")]
    InvalidTransition {
        operation: &'static str,
        required: PaymentStatus,
        found: PaymentStatus,
    },
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("no provider is registered for variant `{0}`")]
    UnknownVariant(String),
    #[error("payment not found")]
    NotFound,
    #[error("provider operation failed")]
    Provider,
    #[error("storage operation failed")]
    Storage,
}
