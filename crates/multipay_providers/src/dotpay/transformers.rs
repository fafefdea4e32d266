//! Signature contract for Dotpay server-to-server callbacks.

use common_utils::{
    crypto::{GenerateDigest, Sha256},
    errors::CustomResult,
};
use error_stack::ResultExt;
use masking::{PeekInterface, Secret};
use multipay_interfaces::errors::ProviderError;

/// Callback fields covered by the signature, in the order the PSP
/// concatenates them. The order is part of the wire contract; a missing
/// field contributes the empty string.
pub const SIGNATURE_FIELDS: [&str; 26] = [
    "id",
    "operation_number",
    "operation_type",
    "operation_status",
    "operation_amount",
    "operation_currency",
    "operation_withdrawal_amount",
    "operation_commission_amount",
    "is_completed",
    "operation_original_amount",
    "operation_original_currency",
    "operation_datetime",
    "operation_related_number",
    "control",
    "description",
    "email",
    "p_info",
    "p_email",
    "credit_card_issuer_identification_number",
    "credit_card_masked_number",
    "credit_card_brand_codename",
    "credit_card_brand_code",
    "credit_card_id",
    "channel",
    "channel_country",
    "geoip_country",
];

/// Lowercase hex SHA-256 over the PIN followed by every signature field's
/// value in [`SIGNATURE_FIELDS`] order.
pub fn compute_signature(
    pin: &Secret<String>,
    form: &[(String, String)],
) -> CustomResult<String, ProviderError> {
    let mut message = String::from(pin.peek().as_str());
    for field in SIGNATURE_FIELDS {
        if let Some((_, value)) = form.iter().find(|(name, _)| name == field) {
            message.push_str(value);
        }
    }
    let digest = Sha256
        .generate_digest(message.as_bytes())
        .change_context(ProviderError::RequestEncodingFailed)?;
    Ok(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn signature_covers_pin_and_ordered_fields() {
        // sha256("PIN" + "123" + "MI-5" + "completed" + "1")
        let form = vec![
            ("operation_status".to_string(), "completed".to_string()),
            ("id".to_string(), "123".to_string()),
            ("control".to_string(), "1".to_string()),
            ("operation_number".to_string(), "MI-5".to_string()),
        ];
        let signature = compute_signature(&Secret::from("PIN"), &form).unwrap();
        assert_eq!(
            signature,
            "876328c7bc0a8c69d4996e856fd03f23e74918221f819113839124bbd53a73c3"
        );
    }

    #[test]
    fn missing_fields_contribute_empty_strings() {
        let with_empty = vec![
            ("id".to_string(), "123".to_string()),
            ("description".to_string(), String::new()),
        ];
        let without = vec![("id".to_string(), "123".to_string())];
        let pin = Secret::from("PIN");
        assert_eq!(
            compute_signature(&pin, &with_empty).unwrap(),
            compute_signature(&pin, &without).unwrap()
        );
    }
}
