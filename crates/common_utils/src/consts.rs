//! Constants shared across the workspace.

/// Length of a hyphenated RFC-4122 payment token.
pub const PAYMENT_TOKEN_LENGTH: usize = 36;

/// Default timeout for outbound provider calls, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default maximum age of a signed envelope before `unseal` rejects it.
pub const SIGNED_ENVELOPE_MAX_AGE_SECS: i64 = 15 * 60;

/// Number of fractional digits carried by all monetary amounts.
pub const AMOUNT_FRACTIONAL_DIGITS: u32 = 2;
