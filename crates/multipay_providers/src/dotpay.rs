//! Signed-callback provider backed by Dotpay.
//!
//! Outbound, the buyer is sent to the PSP with a plain hidden-field form.
//! Inbound, the PSP notifies payment results by POSTing a flat field set
//! whose SHA-256 signature is verified before any state changes.

pub mod transformers;

use std::sync::Arc;

use common_enums::PaymentStatus;
use common_utils::{errors::CustomResult, request::Method, types::StringMajorUnit};
use error_stack::{report, ResultExt};
use masking::Secret;
use multipay_domain_models::{
    payment::PaymentHandle,
    types::{FormField, RequestView, ResponseDirective},
};
use multipay_interfaces::{
    api::Provider,
    client::HttpClient,
    configs::GatewayParams,
    errors::{ImproperlyConfigured, ProviderError},
};
use serde::Deserialize;

use self::transformers as dotpay;
use crate::utils;

const DEFAULT_ENDPOINT: &str = "https://ssl.dotpay.pl/";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_lang() -> String {
    "pl".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DotpayConfig {
    seller_id: String,
    pin: Secret<String>,
    #[serde(default = "default_endpoint")]
    endpoint: String,
    #[serde(default)]
    channel: u32,
    #[serde(default = "default_lang")]
    lang: String,
    #[serde(default)]
    lock: bool,
    capture: Option<bool>,
}

pub struct Dotpay {
    config: DotpayConfig,
    params: GatewayParams,
}

impl Dotpay {
    pub fn construct(
        config: serde_json::Value,
        params: GatewayParams,
        _client: Arc<dyn HttpClient>,
    ) -> CustomResult<Box<dyn Provider>, ImproperlyConfigured> {
        let config: DotpayConfig = utils::parse_config(config)?;
        if config.capture == Some(false) {
            return Err(report!(ImproperlyConfigured::new(
                "dotpay does not support pre-authorization",
            )));
        }
        Ok(Box::new(Self { config, params }))
    }

    fn description(payment: &PaymentHandle<'_>) -> String {
        let items: Vec<String> = payment
            .get_purchased_items()
            .into_iter()
            .map(|item| {
                if item.quantity == 1 {
                    item.name
                } else {
                    format!("{} × {}", item.name, item.quantity)
                }
            })
            .collect();
        items.join(", ")
    }
}

impl Provider for Dotpay {
    fn gateway_params(&self) -> &GatewayParams {
        &self.params
    }

    fn get_action(&self, _payment: &mut PaymentHandle<'_>) -> CustomResult<String, ProviderError> {
        Ok(self.config.endpoint.clone())
    }

    fn get_hidden_fields(
        &self,
        payment: &mut PaymentHandle<'_>,
    ) -> CustomResult<Vec<FormField>, ProviderError> {
        let callback_url = self.get_return_url(payment.as_record(), None)?;
        Ok(vec![
            FormField::hidden("id", self.config.seller_id.clone()),
            FormField::hidden(
                "amount",
                StringMajorUnit::from_decimal(payment.total())
                    .get_amount_as_string()
                    .to_string(),
            ),
            FormField::hidden("control", payment.id().to_string()),
            FormField::hidden("currency", payment.currency().to_string()),
            FormField::hidden("description", Self::description(payment)),
            FormField::hidden("lang", self.config.lang.clone()),
            FormField::hidden("channel", self.config.channel.to_string()),
            FormField::hidden("ch_lock", if self.config.lock { "1" } else { "0" }),
            FormField::hidden("URL", payment.get_success_url()),
            FormField::hidden("URLC", callback_url),
            FormField::hidden("type", "2"),
        ])
    }

    fn process_data(
        &self,
        payment: &mut PaymentHandle<'_>,
        request: &RequestView,
    ) -> CustomResult<ResponseDirective, ProviderError> {
        if request.method != Some(Method::Post) {
            return Ok(ResponseDirective::forbidden_failed());
        }

        let submitted = request.form_param("signature").unwrap_or_default();
        let expected = dotpay::compute_signature(&self.config.pin, &request.form)?;
        if submitted != expected {
            return Ok(ResponseDirective::forbidden_failed());
        }

        // Guards against a callback for a different payment being replayed
        // against this record.
        if request.form_param("control") != Some(payment.id().to_string().as_str()) {
            return Ok(ResponseDirective::forbidden_failed());
        }

        match request.form_param("operation_status") {
            Some("completed") => {
                let operation_number = request
                    .form_param("operation_number")
                    .ok_or_else(|| utils::missing_field("operation_number"))?;
                payment.set_transaction_id(operation_number.to_string());
                let total = payment.total();
                payment.set_captured_amount(total);
                payment
                    .change_status(PaymentStatus::Confirmed, "")
                    .change_context(ProviderError::StorageFailed)?;
            }
            Some("rejected") => {
                payment
                    .change_status(PaymentStatus::Rejected, "")
                    .change_context(ProviderError::StorageFailed)?;
            }
            // Intermediate statuses (new, processing) leave the record alone.
            _ => {}
        }
        Ok(ResponseDirective::ok("OK"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use multipay_domain_models::signals::SignalHub;
    use rust_decimal::Decimal;

    use super::*;
    use crate::test_utils::{StubClient, TestPayment};

    fn provider() -> Dotpay {
        Dotpay {
            config: DotpayConfig {
                seller_id: "123".to_string(),
                pin: Secret::from("PIN"),
                endpoint: DEFAULT_ENDPOINT.to_string(),
                channel: 0,
                lang: "pl".to_string(),
                lock: false,
                capture: None,
            },
            params: GatewayParams::new("http://example.com"),
        }
    }

    fn callback_form(operation_status: &str) -> Vec<(String, String)> {
        vec![
            ("id".to_string(), "123".to_string()),
            ("operation_number".to_string(), "MI-5".to_string()),
            ("operation_type".to_string(), "payment".to_string()),
            ("operation_status".to_string(), operation_status.to_string()),
            ("operation_amount".to_string(), "100.00".to_string()),
            ("operation_currency".to_string(), "USD".to_string()),
            ("control".to_string(), "1".to_string()),
        ]
    }

    fn signed_view(mut form: Vec<(String, String)>, pin: &Secret<String>) -> RequestView {
        let signature = dotpay::compute_signature(pin, &form).unwrap();
        form.push(("signature".to_string(), signature));
        RequestView {
            method: Some(Method::Post),
            form,
            ..RequestView::default()
        }
    }

    #[test]
    fn completed_callback_confirms_payment() {
        let signals = SignalHub::new();
        let mut record = TestPayment::default();
        let mut payment = PaymentHandle::new(&mut record, &signals);
        let provider = provider();
        let view = signed_view(callback_form("completed"), &provider.config.pin);

        let directive = provider.process_data(&mut payment, &view).unwrap();

        assert_eq!(directive, ResponseDirective::ok("OK"));
        assert_eq!(record.status, PaymentStatus::Confirmed);
        assert_eq!(record.transaction_id.as_deref(), Some("MI-5"));
        assert_eq!(record.captured_amount, Decimal::from(100));
    }

    #[test]
    fn bad_signature_is_rejected_without_state_change() {
        let signals = SignalHub::new();
        let mut record = TestPayment::default();
        let mut payment = PaymentHandle::new(&mut record, &signals);
        let mut form = callback_form("completed");
        form.push(("signature".to_string(), "0".to_string()));
        let view = RequestView {
            method: Some(Method::Post),
            form,
            ..RequestView::default()
        };

        let directive = provider().process_data(&mut payment, &view).unwrap();

        assert_eq!(directive, ResponseDirective::forbidden_failed());
        assert_eq!(record.status, PaymentStatus::Waiting);
        assert_eq!(record.captured_amount, Decimal::ZERO);
    }

    #[test]
    fn non_post_requests_are_rejected() {
        let signals = SignalHub::new();
        let mut record = TestPayment::default();
        let mut payment = PaymentHandle::new(&mut record, &signals);
        let view = RequestView {
            method: Some(Method::Get),
            ..RequestView::default()
        };

        let directive = provider().process_data(&mut payment, &view).unwrap();
        assert_eq!(directive, ResponseDirective::forbidden_failed());
    }

    #[test]
    fn control_mismatch_is_rejected() {
        let signals = SignalHub::new();
        let mut record = TestPayment {
            id: 7,
            ..TestPayment::default()
        };
        let mut payment = PaymentHandle::new(&mut record, &signals);
        let provider = provider();
        // control still says payment 1
        let view = signed_view(callback_form("completed"), &provider.config.pin);

        let directive = provider.process_data(&mut payment, &view).unwrap();
        assert_eq!(directive, ResponseDirective::forbidden_failed());
        assert_eq!(record.status, PaymentStatus::Waiting);
    }

    #[test]
    fn rejected_callback_sets_rejected_status() {
        let signals = SignalHub::new();
        let mut record = TestPayment::default();
        let mut payment = PaymentHandle::new(&mut record, &signals);
        let provider = provider();
        let view = signed_view(callback_form("rejected"), &provider.config.pin);

        provider.process_data(&mut payment, &view).unwrap();
        assert_eq!(record.status, PaymentStatus::Rejected);
    }

    #[test]
    fn intermediate_status_changes_nothing() {
        let signals = SignalHub::new();
        let mut record = TestPayment::default();
        let mut payment = PaymentHandle::new(&mut record, &signals);
        let provider = provider();
        let view = signed_view(callback_form("processing"), &provider.config.pin);

        let directive = provider.process_data(&mut payment, &view).unwrap();
        assert_eq!(directive, ResponseDirective::ok("OK"));
        assert_eq!(record.status, PaymentStatus::Waiting);
    }

    #[test]
    fn hidden_fields_carry_the_outbound_contract() {
        let signals = SignalHub::new();
        let mut record = TestPayment::default();
        let mut payment = PaymentHandle::new(&mut record, &signals);

        let fields = provider().get_hidden_fields(&mut payment).unwrap();
        let value = |name: &str| {
            fields
                .iter()
                .find(|field| field.name == name)
                .and_then(|field| field.value.clone())
                .unwrap()
        };

        assert_eq!(value("id"), "123");
        assert_eq!(value("amount"), "100.00");
        assert_eq!(value("control"), "1");
        assert_eq!(value("type"), "2");
        assert_eq!(value("URL"), "http://example.com/success");
        assert_eq!(
            value("URLC"),
            format!("http://example.com/process/{}/", record.token)
        );
    }

    #[test]
    fn construction_rejects_preauth_configuration() {
        let client = StubClient::new(vec![]);
        let result = Dotpay::construct(
            serde_json::json!({"seller_id": "123", "pin": "PIN", "capture": false}),
            GatewayParams::new("http://example.com"),
            client,
        );
        assert!(result.is_err());
    }
}
