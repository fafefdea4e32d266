//! Helpers shared by the provider integrations.

use base64::Engine;
use common_utils::errors::CustomResult;
use error_stack::report;
use masking::{Mask, Maskable, PeekInterface, Secret};
use multipay_domain_models::errors::PaymentError;
use multipay_interfaces::errors::{ImproperlyConfigured, ProviderError};

/// `Authorization: Basic base64(user:password)` header value, masked for
/// logging.
pub(crate) fn basic_auth_header(user: &str, password: &Secret<String>) -> Maskable<String> {
    let credentials = format!("{user}:{}", password.peek());
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(credentials)
    )
    .into_masked()
}

/// Parse a provider's variant options map into its typed configuration.
///
/// Unknown or missing options surface here, at construction time.
pub(crate) fn parse_config<T: serde::de::DeserializeOwned>(
    config: serde_json::Value,
) -> CustomResult<T, ImproperlyConfigured> {
    serde_json::from_value(config).map_err(|err| {
        report!(ImproperlyConfigured::new(format!(
            "invalid provider options: {err}"
        )))
    })
}

/// Map a non-2xx PSP response into the error the caller surfaces.
pub(crate) fn psp_error(message: impl Into<String>) -> error_stack::Report<ProviderError> {
    report!(ProviderError::Payment(PaymentError::new(message)))
}

pub(crate) fn missing_field(field_name: &'static str) -> error_stack::Report<ProviderError> {
    report!(ProviderError::MissingRequiredField { field_name })
}

/// Provider-wide constants.
pub(crate) mod consts {
    /// Grace window subtracted from an OAuth token's expiry so a token about
    /// to lapse is refreshed before use.
    pub(crate) const TOKEN_EXPIRY_GRACE_SECS: i64 = 3;
    /// Maximum accepted clock skew for webhook signature timestamps.
    pub(crate) const WEBHOOK_TOLERANCE_SECS: i64 = 300;
}
