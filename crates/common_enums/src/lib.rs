//! Enums shared by the payment orchestration crates.

pub mod enums;

pub use enums::{FraudStatus, PaymentStatus};
