use serde::{Deserialize, Serialize};

/// Lifecycle status of a payment.
///
/// The lifecycle engine enforces the operation preconditions (capture and
/// release require [`Self::Preauth`], refund requires [`Self::Confirmed`]);
/// providers record the transitions reported by the payment service provider.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    /// Created, nothing has happened yet or an asynchronous step is pending.
    #[default]
    Waiting,
    /// The buyer is filling in payment details.
    Input,
    /// Authorization granted, capture deferred.
    Preauth,
    /// Funds captured.
    Confirmed,
    /// Declined by the payment service provider.
    Rejected,
    /// Released, voided or fully refunded.
    Refunded,
    /// A fatal provider error occurred.
    Error,
}

impl PaymentStatus {
    /// Whether the payment reached a state from which the buyer cannot
    /// resume the flow.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Refunded | Self::Error)
    }
}

/// Fraud verdict reported by a provider, orthogonal to [`PaymentStatus`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FraudStatus {
    /// No fraud check has run.
    #[default]
    Unknown,
    /// Passed the provider's fraud screening.
    Accept,
    /// Flagged as fraudulent.
    Reject,
    /// Held for manual review.
    Review,
}
