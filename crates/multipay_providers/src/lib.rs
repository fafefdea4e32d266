//! Provider integrations.
//!
//! Each submodule implements the uniform [`multipay_interfaces::Provider`]
//! contract for one payment service provider shape: hosted-redirect with
//! OAuth (PayPal), signed server-to-server callbacks (Dotpay), session
//! checkout with signed webhooks (Stripe) and two-phase 3-D Secure
//! (CyberSource).

pub mod cybersource;
pub mod dotpay;
pub mod paypal;
pub mod stripe;

pub(crate) mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

pub use cybersource::Cybersource;
pub use dotpay::Dotpay;
pub use paypal::Paypal;
pub use stripe::Stripe;
