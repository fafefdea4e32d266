//! Session-checkout provider backed by Stripe Checkout (API v3).
//!
//! A Checkout Session is created up front and the buyer is redirected to
//! its hosted URL; results arrive on a webhook whose signature is verified
//! against the endpoint secret.

pub mod transformers;

use std::sync::Arc;

use common_enums::PaymentStatus;
use common_utils::{
    errors::CustomResult,
    ext_traits::BytesExt,
    request::{Method, RequestBuilder},
};
use error_stack::{report, ResultExt};
use masking::{Mask, Secret};
use multipay_domain_models::{
    payment::PaymentHandle,
    types::{FormResult, RequestView, ResponseDirective, SubmittedForm},
};
use multipay_interfaces::{
    api::Provider,
    client::HttpClient,
    configs::GatewayParams,
    errors::{ImproperlyConfigured, ProviderError},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use self::transformers as stripe;
use crate::utils;

const ATTR_SESSION: &str = "session";
const ATTR_REFUND: &str = "refund";

const DEFAULT_ENDPOINT: &str = "https://api.stripe.com";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_secure_endpoint() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StripeConfig {
    api_key: Secret<String>,
    endpoint_secret: Option<Secret<String>>,
    #[serde(default = "default_secure_endpoint")]
    secure_endpoint: bool,
    #[serde(default = "default_endpoint")]
    endpoint: String,
    capture: Option<bool>,
}

pub struct Stripe {
    config: StripeConfig,
    params: GatewayParams,
    client: Arc<dyn HttpClient>,
}

impl Stripe {
    pub fn construct(
        config: serde_json::Value,
        params: GatewayParams,
        client: Arc<dyn HttpClient>,
    ) -> CustomResult<Box<dyn Provider>, ImproperlyConfigured> {
        let config: StripeConfig = utils::parse_config(config)?;
        if config.capture == Some(false) {
            return Err(report!(ImproperlyConfigured::new(
                "stripe checkout does not support pre-authorization",
            )));
        }
        if config.secure_endpoint && config.endpoint_secret.is_none() {
            return Err(report!(ImproperlyConfigured::new(
                "secure_endpoint requires an endpoint_secret",
            )));
        }
        Ok(Box::new(Self {
            config,
            params,
            client,
        }))
    }

    fn sessions_url(&self) -> String {
        format!("{}/v1/checkout/sessions", self.config.endpoint)
    }

    fn refunds_url(&self) -> String {
        format!("{}/v1/refunds", self.config.endpoint)
    }

    fn post_json(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> CustomResult<multipay_interfaces::client::Response, ProviderError> {
        let request = RequestBuilder::new()
            .method(Method::Post)
            .url(url)
            .headers(vec![(
                "Authorization".to_string(),
                format!("Bearer {}", masking::PeekInterface::peek(&self.config.api_key))
                    .into_masked(),
            )])
            .header("Content-Type", "application/json")
            .set_body(body)
            .build();
        self.client
            .send(request)
            .change_context(ProviderError::ProcessingStepFailed)
    }

    fn error_message(response: &multipay_interfaces::client::Response) -> String {
        response
            .response
            .parse_struct::<stripe::StripeErrorResponse>("StripeErrorResponse")
            .ok()
            .and_then(|error| error.error)
            .and_then(|detail| detail.message)
            .unwrap_or_else(|| "Payment has been declined by Stripe".to_string())
    }

    /// Read and (when configured) authenticate the webhook payload.
    fn event_payload(
        &self,
        request: &RequestView,
    ) -> CustomResult<stripe::StripeEvent, ProviderError> {
        if self.config.secure_endpoint {
            let secret = self
                .config
                .endpoint_secret
                .as_ref()
                .ok_or_else(|| utils::missing_field("endpoint_secret"))?;
            let header = request
                .header("Stripe-Signature")
                .ok_or_else(|| utils::missing_field("Stripe-Signature"))?;
            stripe::verify_webhook_signature(secret, header, &request.body)?;
        }
        request
            .body
            .parse_struct("StripeEvent")
            .change_context(ProviderError::ResponseDeserializationFailed)
    }

    fn create_session(
        &self,
        payment: &mut PaymentHandle<'_>,
    ) -> CustomResult<(), ProviderError> {
        let session_request = stripe::StripeSessionRequest::try_from(payment.as_record())?;
        let body = serde_json::to_value(&session_request)
            .change_context(ProviderError::RequestEncodingFailed)?;
        let response = self.post_json(&self.sessions_url(), body)?;
        if response.status_code >= 400 {
            let message = Self::error_message(&response);
            payment
                .change_status(PaymentStatus::Error, &message)
                .change_context(ProviderError::StorageFailed)?;
            return Err(utils::psp_error(message));
        }
        let raw: serde_json::Value = response
            .response
            .parse_struct("StripeSession")
            .change_context(ProviderError::ResponseDeserializationFailed)?;
        let session: stripe::StripeSession = serde_json::from_value(raw.clone())
            .change_context(ProviderError::ResponseDeserializationFailed)?;
        payment.set_transaction_id(session.id);
        payment
            .set_attr(ATTR_SESSION, &raw)
            .change_context(ProviderError::StorageFailed)?;
        Ok(())
    }
}

impl Provider for Stripe {
    fn gateway_params(&self) -> &GatewayParams {
        &self.params
    }

    fn get_form(
        &self,
        payment: &mut PaymentHandle<'_>,
        _data: Option<&SubmittedForm>,
    ) -> CustomResult<FormResult, ProviderError> {
        if payment.transaction_id().is_none() {
            self.create_session(payment)?;
        }
        let session: serde_json::Value = payment
            .attr(ATTR_SESSION)
            .ok_or_else(|| utils::missing_field("session"))?;
        let url = session
            .get("url")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| utils::psp_error("Stripe returned a session without a URL"))?;
        Ok(FormResult::Redirect(url.to_string()))
    }

    fn get_token_from_request(&self, request: &RequestView) -> Option<String> {
        let event: stripe::StripeEvent = serde_json::from_slice(&request.body).ok()?;
        event
            .session_field("client_reference_id")
            .map(str::to_string)
    }

    fn process_data(
        &self,
        payment: &mut PaymentHandle<'_>,
        request: &RequestView,
    ) -> CustomResult<ResponseDirective, ProviderError> {
        let event = match self.event_payload(request) {
            Ok(event) => event,
            Err(_) => return Ok(ResponseDirective::forbidden_failed()),
        };

        if stripe::ENABLED_EVENTS.contains(&event.event_type.as_str()) {
            match event.event_type.as_str() {
                "checkout.session.expired" | "checkout.session.async_payment_failed" => {
                    payment
                        .change_status(PaymentStatus::Rejected, "")
                        .change_context(ProviderError::StorageFailed)?;
                }
                _ if event.session_field("payment_status") == Some("paid") => {
                    let total = payment.total();
                    payment.set_captured_amount(total);
                    payment
                        .change_status(PaymentStatus::Confirmed, "")
                        .change_context(ProviderError::StorageFailed)?;
                }
                _ => {}
            }
            payment
                .set_attr(ATTR_SESSION, &event.data.object)
                .change_context(ProviderError::StorageFailed)?;
        }
        Ok(ResponseDirective::ok(r#"{"status": "OK"}"#))
    }

    fn refund(
        &self,
        payment: &mut PaymentHandle<'_>,
        amount: Option<Decimal>,
    ) -> CustomResult<Decimal, ProviderError> {
        let session: serde_json::Value = payment
            .attr(ATTR_SESSION)
            .ok_or_else(|| utils::missing_field("session"))?;
        let payment_intent = session
            .get("payment_intent")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| utils::psp_error("Can't refund, payment_intent does not exist"))?
            .to_string();

        let to_refund = amount.unwrap_or_else(|| payment.total());
        let refund_request = stripe::StripeRefundRequest {
            payment_intent,
            amount: stripe::convert_amount(payment.currency(), to_refund)?,
            reason: "requested_by_customer",
        };
        let body = serde_json::to_value(&refund_request)
            .change_context(ProviderError::RequestEncodingFailed)?;
        let response = self.post_json(&self.refunds_url(), body)?;
        if response.status_code >= 400 {
            return Err(utils::psp_error(Self::error_message(&response)));
        }
        let refund: serde_json::Value = response
            .response
            .parse_struct("StripeRefund")
            .change_context(ProviderError::ResponseDeserializationFailed)?;
        payment
            .set_attr(ATTR_REFUND, &refund)
            .change_context(ProviderError::StorageFailed)?;
        Ok(to_refund)
    }
}
