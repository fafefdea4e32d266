//! Wire types for Stripe Checkout sessions and webhooks.

use common_utils::{
    crypto::{HmacSha256, SignMessage},
    date_time,
    errors::CustomResult,
    types::MinorUnit,
};
use error_stack::ResultExt;
use masking::{PeekInterface, Secret};
use multipay_domain_models::payment::PaymentRecord;
use multipay_interfaces::errors::ProviderError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::{self, consts::WEBHOOK_TOLERANCE_SECS};

/// Currencies whose minor unit equals their major unit; amounts for these
/// are passed to the PSP without scaling.
const ZERO_DECIMAL_CURRENCIES: [&str; 16] = [
    "bif", "clp", "djf", "gnf", "jpy", "kmf", "krw", "mga", "pyg", "rwf", "ugx", "vnd", "vuv",
    "xaf", "xof", "xpf",
];

pub const ENABLED_EVENTS: [&str; 4] = [
    "checkout.session.expired",
    "checkout.session.async_payment_failed",
    "checkout.session.async_payment_succeeded",
    "checkout.session.completed",
];

/// Convert a major-unit amount to the PSP's minor unit.
pub fn convert_amount(currency: &str, amount: Decimal) -> CustomResult<MinorUnit, ProviderError> {
    let zero_decimal = ZERO_DECIMAL_CURRENCIES.contains(&currency.to_lowercase().as_str());
    MinorUnit::from_major(amount, zero_decimal)
        .change_context(ProviderError::RequestEncodingFailed)
}

#[derive(Debug, Serialize)]
pub struct StripeProductData {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct StripePriceData {
    pub currency: String,
    pub unit_amount: MinorUnit,
    pub product_data: StripeProductData,
}

#[derive(Debug, Serialize)]
pub struct StripeLineItem {
    pub price_data: StripePriceData,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct StripeMetadata {
    pub customer_name: String,
}

#[derive(Debug, Serialize)]
pub struct StripeSessionRequest {
    pub line_items: Vec<StripeLineItem>,
    pub mode: &'static str,
    pub success_url: String,
    pub cancel_url: String,
    pub client_reference_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<StripeMetadata>,
}

impl TryFrom<&dyn PaymentRecord> for StripeSessionRequest {
    type Error = error_stack::Report<ProviderError>;

    fn try_from(payment: &dyn PaymentRecord) -> Result<Self, Self::Error> {
        let unit_amount = convert_amount(payment.currency(), payment.total())?;
        let customer_email = payment
            .billing()
            .map(|billing| billing.email.clone())
            .filter(|email| !email.is_empty());
        let metadata = payment.billing().and_then(|billing| {
            let name = format!("{} {}", billing.first_name, billing.last_name);
            (!name.trim().is_empty()).then_some(StripeMetadata {
                customer_name: name,
            })
        });
        Ok(Self {
            line_items: vec![StripeLineItem {
                price_data: StripePriceData {
                    currency: payment.currency().to_lowercase(),
                    unit_amount,
                    product_data: StripeProductData {
                        name: format!("Order #{}", payment.token()),
                    },
                },
                quantity: 1,
            }],
            mode: "payment",
            success_url: payment.get_success_url(),
            cancel_url: payment.get_failure_url(),
            client_reference_id: payment.token().to_string(),
            customer_email,
            metadata,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StripeSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StripeErrorDetail {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StripeErrorResponse {
    pub error: Option<StripeErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

impl StripeEvent {
    pub fn session_field(&self, name: &str) -> Option<&str> {
        self.data.object.get(name)?.as_str()
    }
}

#[derive(Debug, Serialize)]
pub struct StripeRefundRequest {
    pub payment_intent: String,
    pub amount: MinorUnit,
    pub reason: &'static str,
}

/// Verify a `Stripe-Signature` header: `t=<unix>,v1=<hex hmac>` where the
/// HMAC-SHA-256 covers `"{t}.{body}"`. Timestamps outside the tolerance
/// window are rejected to limit replay.
pub fn verify_webhook_signature(
    secret: &Secret<String>,
    header: &str,
    body: &[u8],
) -> CustomResult<(), ProviderError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }
    let timestamp = timestamp.ok_or_else(|| utils::psp_error("malformed signature header"))?;
    let parsed: i64 = timestamp
        .parse::<i64>()
        .change_context(ProviderError::ResponseDeserializationFailed)?;
    if (date_time::now_unix_timestamp() - parsed).abs() > WEBHOOK_TOLERANCE_SECS {
        return Err(utils::psp_error("webhook timestamp outside tolerance"));
    }

    let mut message = Vec::with_capacity(timestamp.len() + 1 + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.push(b'.');
    message.extend_from_slice(body);
    let expected = HmacSha256
        .sign_message(secret.peek().as_bytes(), &message)
        .change_context(ProviderError::RequestEncodingFailed)?;
    let expected = hex::encode(expected);

    if signatures.iter().any(|signature| *signature == expected) {
        Ok(())
    } else {
        Err(utils::psp_error("webhook signature mismatch"))
    }
}

/// Build a valid signature header for `body` stamped `now`.
#[cfg(test)]
pub fn sign_webhook(secret: &Secret<String>, body: &[u8]) -> String {
    #![allow(clippy::unwrap_used)]
    let timestamp = date_time::now_unix_timestamp();
    let mut message = Vec::new();
    message.extend_from_slice(timestamp.to_string().as_bytes());
    message.push(b'.');
    message.extend_from_slice(body);
    let signature = HmacSha256
        .sign_message(secret.peek().as_bytes(), &message)
        .unwrap();
    format!("t={timestamp},v1={}", hex::encode(signature))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn regular_currencies_are_scaled_to_cents() {
        assert_eq!(
            convert_amount("USD", Decimal::new(1999, 2))
                .unwrap()
                .get_amount_as_i64(),
            1999
        );
    }

    #[test]
    fn zero_decimal_currencies_pass_through() {
        assert_eq!(
            convert_amount("JPY", Decimal::from(500))
                .unwrap()
                .get_amount_as_i64(),
            500
        );
    }

    #[test]
    fn webhook_signature_round_trips() {
        let secret = Secret::from("whsec_test");
        let body = br#"{"type":"checkout.session.completed"}"#;
        let header = sign_webhook(&secret, body);
        assert!(verify_webhook_signature(&secret, &header, body).is_ok());
    }

    #[test]
    fn webhook_signature_rejects_wrong_secret() {
        let secret = Secret::from("whsec_test");
        let body = br#"{}"#;
        let header = sign_webhook(&secret, body);
        assert!(verify_webhook_signature(&Secret::from("other"), &header, body).is_err());
    }

    #[test]
    fn webhook_signature_rejects_stale_timestamp() {
        let secret = Secret::from("whsec_test");
        let body = br#"{}"#;
        let stale = date_time::now_unix_timestamp() - WEBHOOK_TOLERANCE_SECS - 10;
        let mut message = Vec::new();
        message.extend_from_slice(stale.to_string().as_bytes());
        message.push(b'.');
        message.extend_from_slice(body);
        let signature = HmacSha256
            .sign_message(b"whsec_test", &message)
            .unwrap();
        let header = format!("t={stale},v1={}", hex::encode(signature));
        assert!(verify_webhook_signature(&secret, &header, body).is_err());
    }
}
