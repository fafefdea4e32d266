//! 3-D Secure card provider backed by the CyberSource transaction API.
//!
//! A charge either settles in one round-trip or comes back with reason
//! code 475, in which case the buyer is auto-POSTed to the issuer's access
//! control server and the card data rides along inside a signed envelope
//! until the validation callback.

pub mod transformers;

use std::sync::Arc;

use common_enums::{FraudStatus, PaymentStatus};
use common_utils::{
    crypto::SignedEnvelope,
    errors::CustomResult,
    ext_traits::BytesExt,
    request::{Method, RequestBuilder},
};
use error_stack::ResultExt;
use masking::Secret;
use multipay_domain_models::{
    payment::PaymentHandle,
    types::{FormField, FormResult, PaymentForm, RequestView, ResponseDirective, SubmittedForm},
};
use multipay_interfaces::{
    api::Provider,
    client::HttpClient,
    configs::GatewayParams,
    errors::{ImproperlyConfigured, ProviderError},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use self::transformers as cybersource;
use crate::utils;

const ATTR_CAPTURE: &str = "capture";
const ATTR_XID: &str = "xid";
const ATTR_FINGERPRINT: &str = "fingerprint_session_id";
const ATTR_LAST_RESPONSE: &str = "last_response";

const LIVE_ENDPOINT: &str = "https://ics2ws.ic3.com/commerce/1.x/transactionProcessor";
const TEST_ENDPOINT: &str = "https://ics2wstest.ic3.com/commerce/1.x/transactionProcessor";

fn default_sandbox() -> bool {
    true
}

fn default_capture() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CybersourceConfig {
    merchant_id: String,
    password: Secret<String>,
    /// Secret signing the card envelope across the 3-DS interstitial.
    envelope_secret: Secret<String>,
    #[serde(default = "default_sandbox")]
    sandbox: bool,
    endpoint: Option<String>,
    #[serde(default = "default_capture")]
    capture: bool,
}

pub struct Cybersource {
    config: CybersourceConfig,
    params: GatewayParams,
    client: Arc<dyn HttpClient>,
}

impl Cybersource {
    pub fn construct(
        config: serde_json::Value,
        params: GatewayParams,
        client: Arc<dyn HttpClient>,
    ) -> CustomResult<Box<dyn Provider>, ImproperlyConfigured> {
        let config: CybersourceConfig = utils::parse_config(config)?;
        Ok(Box::new(Self {
            config,
            params,
            client,
        }))
    }

    fn endpoint(&self) -> String {
        self.config.endpoint.clone().unwrap_or_else(|| {
            if self.config.sandbox {
                TEST_ENDPOINT.to_string()
            } else {
                LIVE_ENDPOINT.to_string()
            }
        })
    }

    fn envelope(&self) -> SignedEnvelope {
        SignedEnvelope::new(self.config.envelope_secret.clone())
    }

    fn base_request(&self, payment: &PaymentHandle<'_>) -> cybersource::CybersourceRequest {
        cybersource::CybersourceRequest {
            merchant_id: self.config.merchant_id.clone(),
            merchant_reference_code: payment.id().to_string(),
            device_fingerprint_id: payment.attr(ATTR_FINGERPRINT),
            ..cybersource::CybersourceRequest::default()
        }
    }

    /// POST a transaction request and keep the raw reply on the payment for
    /// later inspection.
    fn send(
        &self,
        payment: &mut PaymentHandle<'_>,
        request: &cybersource::CybersourceRequest,
    ) -> CustomResult<cybersource::CybersourceResponse, ProviderError> {
        let body = serde_json::to_value(request)
            .change_context(ProviderError::RequestEncodingFailed)?;
        let http_request = RequestBuilder::new()
            .method(Method::Post)
            .url(&self.endpoint())
            .headers(vec![(
                "Authorization".to_string(),
                utils::basic_auth_header(&self.config.merchant_id, &self.config.password),
            )])
            .header("Content-Type", "application/json")
            .set_body(body)
            .build();
        let response = self
            .client
            .send(http_request)
            .change_context(ProviderError::ProcessingStepFailed)?;
        if response.status_code >= 400 {
            return Err(utils::psp_error(
                "CyberSource rejected the transaction request",
            ));
        }
        let raw: serde_json::Value = response
            .response
            .parse_struct("CybersourceResponse")
            .change_context(ProviderError::ResponseDeserializationFailed)?;
        payment
            .set_attr(ATTR_LAST_RESPONSE, &raw)
            .change_context(ProviderError::StorageFailed)?;
        serde_json::from_value(raw).change_context(ProviderError::ResponseDeserializationFailed)
    }

    fn stored_capture_flag(&self, payment: &PaymentHandle<'_>) -> bool {
        payment.attr(ATTR_CAPTURE).unwrap_or(true)
    }

    fn confirm_or_preauth(
        &self,
        payment: &mut PaymentHandle<'_>,
    ) -> CustomResult<(), ProviderError> {
        if self.stored_capture_flag(payment) {
            let total = payment.total();
            payment.set_captured_amount(total);
            payment
                .change_status(PaymentStatus::Confirmed, "")
                .change_context(ProviderError::StorageFailed)
        } else {
            payment
                .change_status(PaymentStatus::Preauth, "")
                .change_context(ProviderError::StorageFailed)
        }
    }

    /// Map an authorization reply's reason code onto payment and fraud
    /// state. Soft declines proceed with a fraud verdict; hard declines
    /// surface the buyer-facing message and park the payment in `error`.
    fn apply_reason_code(
        &self,
        payment: &mut PaymentHandle<'_>,
        reason_code: i32,
    ) -> CustomResult<(), ProviderError> {
        let fraud_verdict = match reason_code {
            cybersource::ACCEPTED => Some((FraudStatus::Accept, "")),
            cybersource::FRAUD_MANAGER_REVIEW => Some((
                FraudStatus::Review,
                "The order is marked for review by Decision Manager",
            )),
            cybersource::FRAUD_MANAGER_REJECT => Some((
                FraudStatus::Reject,
                "The order has been rejected by Decision Manager",
            )),
            cybersource::FRAUD_SCORE_EXCEEDS_THRESHOLD => {
                Some((FraudStatus::Reject, "Fraud score exceeds threshold."))
            }
            cybersource::SMART_AUTHORIZATION_FAIL => Some((
                FraudStatus::Reject,
                "CyberSource Smart Authorization failed.",
            )),
            cybersource::CARD_VERIFICATION_NUMBER_FAIL => Some((
                FraudStatus::Reject,
                "Card verification number (CVN) did not match.",
            )),
            cybersource::ADDRESS_VERIFICATION_SERVICE_FAIL => Some((
                FraudStatus::Reject,
                "CyberSource Address Verification Service failed.",
            )),
            _ => None,
        };
        match fraud_verdict {
            Some((status, message)) => {
                payment
                    .change_fraud_status(status, message, false)
                    .change_context(ProviderError::StorageFailed)?;
                self.confirm_or_preauth(payment)
            }
            None => {
                let error = cybersource::error_message(reason_code);
                payment
                    .change_status(PaymentStatus::Error, error)
                    .change_context(ProviderError::StorageFailed)?;
                Err(utils::psp_error(error))
            }
        }
    }

    /// Authorize (or sale) the card, answering with the auto-POST form when
    /// the issuer requires 3-D Secure authentication.
    fn charge(
        &self,
        payment: &mut PaymentHandle<'_>,
        card: &cybersource::CardData,
    ) -> CustomResult<Option<PaymentForm>, ProviderError> {
        let mut request = self.base_request(payment);
        request.payer_auth_enroll_service = Some(cybersource::ServiceRequest::run());
        if self.config.capture {
            request.cc_credit_service = Some(cybersource::ServiceRequest::run());
        } else {
            request.cc_auth_service = Some(cybersource::ServiceRequest::run());
        }
        request.bill_to = Some(cybersource::BillTo::try_from_payment(payment.as_record())?);
        request.card = Some(cybersource::CybersourceCard::from(card));
        request.items = cybersource::items_from_payment(payment.as_record());
        request.purchase_totals = Some(cybersource::PurchaseTotals::full(payment.as_record()));

        let response = self.send(payment, &request)?;
        payment
            .set_attr(ATTR_CAPTURE, &self.config.capture)
            .change_context(ProviderError::StorageFailed)?;
        if let Some(request_id) = &response.request_id {
            payment.set_transaction_id(request_id.clone());
        }

        if response.reason_code == cybersource::AUTHENTICATE_REQUIRED {
            let enroll = response
                .payer_auth_enroll_reply
                .ok_or_else(|| utils::missing_field("payerAuthEnrollReply"))?;
            payment
                .set_attr(ATTR_XID, &enroll.xid)
                .change_context(ProviderError::StorageFailed)?;
            payment
                .change_status(
                    PaymentStatus::Waiting,
                    "3-D Secure verification in progress",
                )
                .change_context(ProviderError::StorageFailed)?;
            let sealed = self
                .envelope()
                .seal(&cybersource::SealedCard::from(card))
                .change_context(ProviderError::RequestEncodingFailed)?;
            let term_url = self.get_return_url(
                payment.as_record(),
                Some(&[("token".to_string(), sealed)]),
            )?;
            let form = PaymentForm::new(enroll.acs_url, Method::Post)
                .field(FormField::hidden("PaReq", enroll.pa_req))
                .field(FormField::hidden("TermUrl", term_url))
                .field(FormField::hidden("MD", enroll.xid));
            return Ok(Some(form));
        }

        self.apply_reason_code(payment, response.reason_code)?;
        Ok(None)
    }

    fn card_entry_form(&self) -> PaymentForm {
        PaymentForm::new("", Method::Post)
            .field(FormField::input("name"))
            .field(FormField::input("number"))
            .field(FormField::input("expiration_month"))
            .field(FormField::input("expiration_year"))
            .field(FormField::input("cvv2"))
    }
}

impl Provider for Cybersource {
    fn auto_capture(&self) -> bool {
        self.config.capture
    }

    fn gateway_params(&self) -> &GatewayParams {
        &self.params
    }

    fn get_form(
        &self,
        payment: &mut PaymentHandle<'_>,
        data: Option<&SubmittedForm>,
    ) -> CustomResult<FormResult, ProviderError> {
        if payment.status() == PaymentStatus::Waiting {
            payment
                .change_status(PaymentStatus::Input, "")
                .change_context(ProviderError::StorageFailed)?;
        }
        let Some(data) = data else {
            return Ok(FormResult::Present(self.card_entry_form()));
        };
        let card = cybersource::CardData::try_from_form(data)?;
        if card
            .expiration
            .is_expired()
            .change_context(ProviderError::RequestEncodingFailed)?
        {
            return Err(utils::psp_error(cybersource::error_message(202)));
        }
        match self.charge(payment, &card)? {
            Some(form) => Ok(FormResult::ExternalPost(form)),
            None => Ok(FormResult::Redirect(payment.get_success_url())),
        }
    }

    fn process_data(
        &self,
        payment: &mut PaymentHandle<'_>,
        request: &RequestView,
    ) -> CustomResult<ResponseDirective, ProviderError> {
        let stored_xid: Option<String> = payment.attr(ATTR_XID);
        if request.form_param("MD") != stored_xid.as_deref() {
            return Ok(ResponseDirective::redirect(payment.get_failure_url()));
        }
        if matches!(
            payment.status(),
            PaymentStatus::Confirmed | PaymentStatus::Preauth
        ) {
            return Ok(ResponseDirective::redirect(payment.get_success_url()));
        }

        let Some(token) = request.query_param("token") else {
            return Ok(ResponseDirective::redirect(payment.get_failure_url()));
        };
        let card = self
            .envelope()
            .unseal::<cybersource::SealedCard>(token)
            .ok()
            .and_then(|sealed| cybersource::CardData::try_from(sealed).ok());
        let Some(card) = card else {
            return Ok(ResponseDirective::redirect(payment.get_failure_url()));
        };

        let pa_res = request.form_param("PaRes").unwrap_or_default();
        let mut validation = self.base_request(payment);
        validation.payer_auth_validate_service =
            Some(cybersource::ServiceRequest::with_signed_pa_res(pa_res));
        if self.stored_capture_flag(payment) {
            validation.cc_credit_service = Some(cybersource::ServiceRequest::run());
        } else {
            validation.cc_auth_service = Some(cybersource::ServiceRequest::run());
        }
        validation.bill_to = Some(cybersource::BillTo::try_from_payment(payment.as_record())?);
        validation.card = Some(cybersource::CybersourceCard::from(&card));
        validation.items = cybersource::items_from_payment(payment.as_record());
        validation.purchase_totals = Some(cybersource::PurchaseTotals::full(payment.as_record()));

        let response = self.send(payment, &validation)?;
        if let Some(request_id) = response.request_id {
            payment.set_transaction_id(request_id);
        }
        if self.apply_reason_code(payment, response.reason_code).is_err() {
            return Ok(ResponseDirective::redirect(payment.get_failure_url()));
        }
        if matches!(
            payment.status(),
            PaymentStatus::Confirmed | PaymentStatus::Preauth
        ) {
            Ok(ResponseDirective::redirect(payment.get_success_url()))
        } else {
            Ok(ResponseDirective::redirect(payment.get_failure_url()))
        }
    }

    fn capture(
        &self,
        payment: &mut PaymentHandle<'_>,
        amount: Option<Decimal>,
    ) -> CustomResult<Option<Decimal>, ProviderError> {
        let amount = amount.unwrap_or_else(|| payment.total());
        let transaction_id = payment
            .transaction_id()
            .ok_or_else(|| utils::missing_field("transaction_id"))?
            .to_string();
        let mut request = self.base_request(payment);
        request.cc_capture_service = Some(cybersource::ServiceRequest::with_auth_request(
            &transaction_id,
        ));
        request.purchase_totals = Some(cybersource::PurchaseTotals::amount(
            payment.as_record(),
            amount,
        ));

        let response = self.send(payment, &request)?;
        match response.reason_code {
            cybersource::ACCEPTED => {
                if let Some(request_id) = response.request_id {
                    payment.set_transaction_id(request_id);
                }
                Ok(Some(amount))
            }
            // Already settled on the PSP side.
            cybersource::TRANSACTION_SETTLED => {
                payment
                    .change_status(PaymentStatus::Confirmed, "")
                    .change_context(ProviderError::StorageFailed)?;
                Ok(Some(amount))
            }
            code => Err(utils::psp_error(cybersource::error_message(code))),
        }
    }

    fn release(&self, payment: &mut PaymentHandle<'_>) -> CustomResult<(), ProviderError> {
        let transaction_id = payment
            .transaction_id()
            .ok_or_else(|| utils::missing_field("transaction_id"))?
            .to_string();
        let mut request = self.base_request(payment);
        request.cc_auth_reversal_service = Some(cybersource::ServiceRequest::with_auth_request(
            &transaction_id,
        ));
        request.purchase_totals = Some(cybersource::PurchaseTotals::full(payment.as_record()));

        let response = self.send(payment, &request)?;
        match response.reason_code {
            cybersource::ACCEPTED => {
                if let Some(request_id) = response.request_id {
                    payment.set_transaction_id(request_id);
                }
                Ok(())
            }
            cybersource::TRANSACTION_REVERSED => Ok(()),
            code => Err(utils::psp_error(cybersource::error_message(code))),
        }
    }

    fn refund(
        &self,
        payment: &mut PaymentHandle<'_>,
        amount: Option<Decimal>,
    ) -> CustomResult<Decimal, ProviderError> {
        let amount = amount.unwrap_or_else(|| payment.captured_amount());
        let transaction_id = payment
            .transaction_id()
            .ok_or_else(|| utils::missing_field("transaction_id"))?
            .to_string();
        let mut request = self.base_request(payment);
        request.cc_credit_service = Some(cybersource::ServiceRequest::with_capture_request(
            &transaction_id,
        ));
        request.purchase_totals = Some(cybersource::PurchaseTotals::amount(
            payment.as_record(),
            amount,
        ));

        let response = self.send(payment, &request)?;
        if response.reason_code != cybersource::ACCEPTED {
            return Err(utils::psp_error(cybersource::error_message(
                response.reason_code,
            )));
        }
        Ok(amount)
    }
}
