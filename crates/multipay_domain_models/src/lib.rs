//! Domain types shared between the lifecycle engine and the provider
//! integrations: the payment record contract, status-change signals, and the
//! control-flow types providers hand back to the host.

pub mod errors;
pub mod payment;
pub mod signals;
pub mod types;

pub use payment::{BillingDetails, PaymentHandle, PaymentRecord, PurchasedItem};
pub use signals::{SignalHub, StatusChanged};
pub use types::{FormField, FormResult, PaymentForm, RequestView, ResponseDirective, SubmittedForm};
