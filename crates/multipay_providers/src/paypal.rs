//! Redirect-flow provider backed by the PayPal REST payments API.
//!
//! OAuth client-credentials tokens and the HATEOAS links returned by the
//! PSP are cached per payment in the record's extension blob, so one
//! payment's stale token never affects another.

pub mod transformers;

use std::{collections::HashMap, sync::Arc};

use common_enums::PaymentStatus;
use common_utils::{
    errors::CustomResult,
    ext_traits::BytesExt,
    request::{Method, RequestBuilder, RequestContent},
    types::StringMajorUnit,
};
use error_stack::ResultExt;
use masking::{Mask, Secret};
use multipay_domain_models::{
    errors::PaymentError,
    payment::PaymentHandle,
    types::{FormResult, RequestView, ResponseDirective, SubmittedForm},
};
use multipay_interfaces::{
    api::Provider,
    client::{HttpClient, Response},
    configs::GatewayParams,
    errors::{ImproperlyConfigured, ProviderError},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use self::transformers as paypal;
use crate::utils;

const ATTR_AUTH: &str = "auth_response";
const ATTR_LINKS: &str = "links";
const ATTR_PAYER: &str = "payer";

const DEFAULT_ENDPOINT: &str = "https://api.paypal.com";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_capture() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PaypalConfig {
    client_id: String,
    secret: Secret<String>,
    #[serde(default = "default_endpoint")]
    endpoint: String,
    #[serde(default = "default_capture")]
    capture: bool,
}

pub struct Paypal {
    config: PaypalConfig,
    params: GatewayParams,
    client: Arc<dyn HttpClient>,
}

impl Paypal {
    pub fn construct(
        config: serde_json::Value,
        params: GatewayParams,
        client: Arc<dyn HttpClient>,
    ) -> CustomResult<Box<dyn Provider>, ImproperlyConfigured> {
        let config: PaypalConfig = utils::parse_config(config)?;
        Ok(Box::new(Self {
            config,
            params,
            client,
        }))
    }

    fn oauth_url(&self) -> String {
        format!("{}/v1/oauth2/token", self.config.endpoint)
    }

    fn payments_url(&self) -> String {
        format!("{}/v1/payments/payment", self.config.endpoint)
    }

    fn stored_links(&self, payment: &PaymentHandle<'_>) -> HashMap<String, String> {
        payment.attr(ATTR_LINKS).unwrap_or_default()
    }

    /// Request a fresh client-credentials token and cache it on the payment.
    fn obtain_token(
        &self,
        payment: &mut PaymentHandle<'_>,
    ) -> CustomResult<paypal::StoredAuth, ProviderError> {
        let request = RequestBuilder::new()
            .method(Method::Post)
            .url(&self.oauth_url())
            .headers(vec![(
                "Authorization".to_string(),
                utils::basic_auth_header(&self.config.client_id, &self.config.secret),
            )])
            .set_body(vec![(
                "grant_type".to_string(),
                "client_credentials".to_string(),
            )])
            .build();
        let response = self
            .client
            .send(request)
            .change_context(ProviderError::ProcessingStepFailed)?;
        if response.status_code >= 400 {
            return Err(utils::psp_error(
                "Failed to obtain an access token from PayPal",
            ));
        }
        let token: paypal::PaypalTokenResponse = response
            .response
            .parse_struct("PaypalTokenResponse")
            .change_context(ProviderError::ResponseDeserializationFailed)?;
        let auth = paypal::StoredAuth::from_token_response(token);
        payment
            .set_attr(ATTR_AUTH, &auth)
            .change_context(ProviderError::StorageFailed)?;
        Ok(auth)
    }

    fn access_token(
        &self,
        payment: &mut PaymentHandle<'_>,
    ) -> CustomResult<paypal::StoredAuth, ProviderError> {
        match payment.attr::<paypal::StoredAuth>(ATTR_AUTH) {
            Some(auth) if auth.is_fresh() => Ok(auth),
            _ => self.obtain_token(payment),
        }
    }

    /// POST with a bearer token; a 401 invalidates the cached token and the
    /// call is retried exactly once with a fresh one.
    fn authorized_post(
        &self,
        payment: &mut PaymentHandle<'_>,
        url: &str,
        body: RequestContent,
    ) -> CustomResult<Response, ProviderError> {
        let mut auth = self.access_token(payment)?;
        let mut response = self.send_authorized(url, body.clone(), &auth)?;
        if response.status_code == 401 {
            auth = self.obtain_token(payment)?;
            response = self.send_authorized(url, body, &auth)?;
            if response.status_code == 401 {
                return Err(utils::psp_error(
                    "PayPal rejected the access token after a refresh",
                ));
            }
        }
        Ok(response)
    }

    fn send_authorized(
        &self,
        url: &str,
        body: RequestContent,
        auth: &paypal::StoredAuth,
    ) -> CustomResult<Response, ProviderError> {
        let request = RequestBuilder::new()
            .method(Method::Post)
            .url(url)
            .headers(vec![(
                "Authorization".to_string(),
                auth.authorization().into_masked(),
            )])
            .header("Content-Type", "application/json")
            .set_body(body)
            .build();
        self.client
            .send(request)
            .change_context(ProviderError::ProcessingStepFailed)
    }

    /// Surface a non-2xx body as the PSP's own message.
    fn reject_on_error(response: &Response) -> CustomResult<(), ProviderError> {
        if response.status_code < 400 {
            return Ok(());
        }
        let error: paypal::PaypalErrorResponse = response
            .response
            .parse_struct("PaypalErrorResponse")
            .unwrap_or_default();
        Err(utils::psp_error(error.user_message()))
    }

    fn create_payment(&self, payment: &mut PaymentHandle<'_>) -> CustomResult<(), ProviderError> {
        let request_payload =
            paypal::PaypalPaymentRequest::try_from(paypal::PaypalPaymentRequestData {
                payment: payment.as_record(),
                auto_capture: self.config.capture,
                return_url: self.get_return_url(payment.as_record(), None)?,
                cancel_url: payment.get_failure_url(),
            })?;
        let body = serde_json::to_value(&request_payload)
            .change_context(ProviderError::RequestEncodingFailed)?;
        let response = self.authorized_post(payment, &self.payments_url(), body.into());
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                payment
                    .change_status(PaymentStatus::Error, &err.to_string())
                    .change_context(ProviderError::StorageFailed)?;
                return Err(err);
            }
        };
        if let Err(err) = Self::reject_on_error(&response) {
            payment
                .change_status(PaymentStatus::Error, &err.to_string())
                .change_context(ProviderError::StorageFailed)?;
            return Err(err);
        }
        let created: paypal::PaypalPaymentResponse = response
            .response
            .parse_struct("PaypalPaymentResponse")
            .change_context(ProviderError::ResponseDeserializationFailed)?;
        payment.set_transaction_id(created.id.clone());
        payment
            .set_attr(ATTR_LINKS, &created.links_map())
            .change_context(ProviderError::StorageFailed)?;
        Ok(())
    }
}

impl Provider for Paypal {
    fn auto_capture(&self) -> bool {
        self.config.capture
    }

    fn gateway_params(&self) -> &GatewayParams {
        &self.params
    }

    fn get_form(
        &self,
        payment: &mut PaymentHandle<'_>,
        _data: Option<&SubmittedForm>,
    ) -> CustomResult<FormResult, ProviderError> {
        if !self.stored_links(payment).contains_key("approval_url") {
            self.create_payment(payment)?;
        }
        payment
            .change_status(PaymentStatus::Waiting, "")
            .change_context(ProviderError::StorageFailed)?;
        let approval_url = self
            .stored_links(payment)
            .remove("approval_url")
            .ok_or_else(|| utils::psp_error("PayPal returned no approval URL"))?;
        Ok(FormResult::Redirect(approval_url))
    }

    fn process_data(
        &self,
        payment: &mut PaymentHandle<'_>,
        request: &RequestView,
    ) -> CustomResult<ResponseDirective, ProviderError> {
        let payer_id = request
            .query_param("PayerID")
            .filter(|value| !value.is_empty());
        let Some(payer_id) = payer_id else {
            payment
                .change_status(PaymentStatus::Rejected, "Payer did not approve the payment")
                .change_context(ProviderError::StorageFailed)?;
            return Ok(ResponseDirective::redirect(payment.get_failure_url()));
        };

        let links = self.stored_links(payment);
        let execute_url = links
            .get("execute")
            .ok_or_else(|| utils::missing_field("execute link"))?
            .clone();
        let body = serde_json::to_value(paypal::PaypalExecuteRequest {
            payer_id: payer_id.to_string(),
        })
        .change_context(ProviderError::RequestEncodingFailed)?;

        let executed = self
            .authorized_post(payment, &execute_url, body.into())
            .and_then(|response| {
                Self::reject_on_error(&response)?;
                response
                    .response
                    .parse_struct::<paypal::PaypalExecuteResponse>("PaypalExecuteResponse")
                    .change_context(ProviderError::ResponseDeserializationFailed)
            });
        let executed = match executed {
            Ok(executed) => executed,
            Err(err) => {
                payment
                    .change_status(PaymentStatus::Error, &err.to_string())
                    .change_context(ProviderError::StorageFailed)?;
                return Ok(ResponseDirective::redirect(payment.get_failure_url()));
            }
        };

        if let Some(payer) = &executed.payer {
            payment
                .set_attr(ATTR_PAYER, payer)
                .change_context(ProviderError::StorageFailed)?;
        }
        let mut links = self.stored_links(payment);
        links.extend(executed.resource_links());
        payment
            .set_attr(ATTR_LINKS, &links)
            .change_context(ProviderError::StorageFailed)?;

        if self.config.capture {
            let total = payment.total();
            payment.set_captured_amount(total);
            payment
                .change_status(PaymentStatus::Confirmed, "")
                .change_context(ProviderError::StorageFailed)?;
        } else {
            payment
                .change_status(PaymentStatus::Preauth, "")
                .change_context(ProviderError::StorageFailed)?;
        }
        Ok(ResponseDirective::redirect(payment.get_success_url()))
    }

    fn capture(
        &self,
        payment: &mut PaymentHandle<'_>,
        amount: Option<Decimal>,
    ) -> CustomResult<Option<Decimal>, ProviderError> {
        let amount = amount.unwrap_or_else(|| payment.total());
        let links = self.stored_links(payment);
        let Some(capture_url) = links.get("capture").cloned() else {
            return Ok(None);
        };

        let body = serde_json::to_value(paypal::PaypalCaptureRequest {
            amount: paypal::PaypalSimpleAmount {
                currency: payment.currency().to_string(),
                total: StringMajorUnit::from_decimal(amount),
            },
            is_final_capture: true,
        })
        .change_context(ProviderError::RequestEncodingFailed)?;
        let response = self.authorized_post(payment, &capture_url, body.into())?;

        let state = if response.status_code >= 400 {
            let error: paypal::PaypalErrorResponse = response
                .response
                .parse_struct("PaypalErrorResponse")
                .unwrap_or_default();
            // An authorization captured out-of-band is not a failure.
            if error.name.as_deref() != Some("AUTHORIZATION_ALREADY_COMPLETED") {
                return Err(utils::psp_error(error.user_message()));
            }
            "completed".to_string()
        } else {
            let captured: paypal::PaypalCaptureResponse = response
                .response
                .parse_struct("PaypalCaptureResponse")
                .change_context(ProviderError::ResponseDeserializationFailed)?;
            captured.state
        };

        match state.as_str() {
            "completed" | "partially_captured" | "partially_refunded" => Ok(Some(amount)),
            "pending" => {
                payment
                    .change_status(PaymentStatus::Waiting, "Capture is pending on PayPal")
                    .change_context(ProviderError::StorageFailed)?;
                Ok(None)
            }
            "refunded" => Err(ProviderError::Payment(PaymentError::new(
                "Payment has already been refunded",
            ))
            .into()),
            other => Err(utils::psp_error(format!(
                "Unexpected capture state: {other}"
            ))),
        }
    }

    fn release(&self, payment: &mut PaymentHandle<'_>) -> CustomResult<(), ProviderError> {
        let links = self.stored_links(payment);
        let void_url = links
            .get("void")
            .ok_or_else(|| utils::missing_field("void link"))?
            .clone();
        let response =
            self.authorized_post(payment, &void_url, serde_json::json!({}).into())?;
        Self::reject_on_error(&response)
    }

    fn refund(
        &self,
        payment: &mut PaymentHandle<'_>,
        amount: Option<Decimal>,
    ) -> CustomResult<Decimal, ProviderError> {
        let links = self.stored_links(payment);
        let refund_url = links
            .get("refund")
            .ok_or_else(|| utils::missing_field("refund link"))?
            .clone();
        let request_payload = paypal::PaypalRefundRequest {
            amount: amount.map(|amount| paypal::PaypalSimpleAmount {
                currency: payment.currency().to_string(),
                total: StringMajorUnit::from_decimal(amount),
            }),
        };
        let body = serde_json::to_value(&request_payload)
            .change_context(ProviderError::RequestEncodingFailed)?;
        let response = self.authorized_post(payment, &refund_url, body.into())?;
        Self::reject_on_error(&response)?;
        let refunded: paypal::PaypalRefundResponse = response
            .response
            .parse_struct("PaypalRefundResponse")
            .change_context(ProviderError::ResponseDeserializationFailed)?;
        paypal::parse_amount(&refunded.amount.total)
    }
}
