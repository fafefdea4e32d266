pub mod errors;
pub mod payments;
pub mod webhooks;
