//! Orchestration core: the provider registry, the payment lifecycle
//! engine and the PSP callback dispatcher.
//!
//! The host owns persistence and HTTP framework glue; this crate owns
//! everything between "a payment record exists" and "a provider talked to
//! its PSP about it".

pub mod core;
pub mod registry;
pub mod storage;

pub use self::{
    core::{
        errors::OperationError,
        payments::Gateway,
        webhooks::CallbackDispatcher,
    },
    registry::ProviderRegistry,
    storage::{InMemoryStore, Payment, PaymentStore},
};
