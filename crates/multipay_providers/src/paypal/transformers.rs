//! Wire types for the PayPal REST payments API.

use std::collections::HashMap;

use common_utils::{date_time, errors::CustomResult, types::StringMajorUnit};
use error_stack::Report;
use multipay_domain_models::payment::PaymentRecord;
use multipay_interfaces::errors::ProviderError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::consts::TOKEN_EXPIRY_GRACE_SECS;

/// OAuth token cached in the payment's extension blob under `auth_response`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredAuth {
    pub token_type: String,
    pub access_token: String,
    pub expires_in: i64,
    pub expires_at: i64,
}

impl StoredAuth {
    pub fn from_token_response(response: PaypalTokenResponse) -> Self {
        let expires_in = response.expires_in.unwrap_or_default();
        Self {
            token_type: response.token_type,
            access_token: response.access_token,
            expires_in,
            expires_at: date_time::now_unix_timestamp() + expires_in,
        }
    }

    /// Usable without a refresh, allowing for a small grace window so a
    /// token about to lapse is not sent out.
    pub fn is_fresh(&self) -> bool {
        self.expires_at - TOKEN_EXPIRY_GRACE_SECS > date_time::now_unix_timestamp()
    }

    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

#[derive(Debug, Deserialize)]
pub struct PaypalTokenResponse {
    pub token_type: String,
    pub access_token: String,
    pub expires_in: Option<i64>,
}

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaypalIntent {
    Sale,
    Authorize,
}

#[derive(Debug, Serialize)]
pub struct PaypalPayer {
    pub payment_method: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PaypalRedirectUrls {
    pub return_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Serialize)]
pub struct PaypalAmountDetails {
    pub subtotal: StringMajorUnit,
    pub tax: StringMajorUnit,
    pub shipping: StringMajorUnit,
}

#[derive(Debug, Serialize)]
pub struct PaypalAmount {
    pub total: StringMajorUnit,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<PaypalAmountDetails>,
}

#[derive(Debug, Serialize)]
pub struct PaypalItem {
    pub name: String,
    pub sku: String,
    pub quantity: i64,
    pub price: StringMajorUnit,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct PaypalItemList {
    pub items: Vec<PaypalItem>,
}

#[derive(Debug, Serialize)]
pub struct PaypalTransaction {
    pub amount: PaypalAmount,
    pub item_list: PaypalItemList,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct PaypalPaymentRequest {
    pub intent: PaypalIntent,
    pub payer: PaypalPayer,
    pub transactions: Vec<PaypalTransaction>,
    pub redirect_urls: PaypalRedirectUrls,
}

/// Everything needed to build a payment-create call.
pub struct PaypalPaymentRequestData<'a> {
    pub payment: &'a dyn PaymentRecord,
    pub auto_capture: bool,
    pub return_url: String,
    pub cancel_url: String,
}

impl TryFrom<PaypalPaymentRequestData<'_>> for PaypalPaymentRequest {
    type Error = Report<ProviderError>;

    fn try_from(data: PaypalPaymentRequestData<'_>) -> Result<Self, Self::Error> {
        let payment = data.payment;
        let subtotal = payment.total() - payment.delivery() - payment.tax();
        let items = payment
            .get_purchased_items()
            .into_iter()
            .map(|item| PaypalItem {
                name: item.name,
                sku: item.sku,
                quantity: item.quantity,
                price: StringMajorUnit::from_decimal(item.price),
                currency: item.currency,
            })
            .collect();
        Ok(Self {
            intent: if data.auto_capture {
                PaypalIntent::Sale
            } else {
                PaypalIntent::Authorize
            },
            payer: PaypalPayer {
                payment_method: "paypal",
            },
            transactions: vec![PaypalTransaction {
                amount: PaypalAmount {
                    total: StringMajorUnit::from_decimal(payment.total()),
                    currency: payment.currency().to_string(),
                    details: Some(PaypalAmountDetails {
                        subtotal: StringMajorUnit::from_decimal(subtotal),
                        tax: StringMajorUnit::from_decimal(payment.tax()),
                        shipping: StringMajorUnit::from_decimal(payment.delivery()),
                    }),
                },
                item_list: PaypalItemList { items },
                description: payment.description().to_string(),
            }],
            redirect_urls: PaypalRedirectUrls {
                return_url: data.return_url,
                cancel_url: data.cancel_url,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PaypalLink {
    pub rel: String,
    pub href: String,
}

#[derive(Debug, Deserialize)]
pub struct PaypalPaymentResponse {
    pub id: String,
    #[serde(default)]
    pub links: Vec<PaypalLink>,
}

impl PaypalPaymentResponse {
    /// Flatten HATEOAS links into a rel -> href map for the extension blob.
    pub fn links_map(&self) -> HashMap<String, String> {
        self.links
            .iter()
            .map(|link| (link.rel.clone(), link.href.clone()))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct PaypalResource {
    #[serde(default)]
    pub links: Vec<PaypalLink>,
}

#[derive(Debug, Deserialize)]
pub struct PaypalRelatedResources {
    pub sale: Option<PaypalResource>,
    pub authorization: Option<PaypalResource>,
}

#[derive(Debug, Deserialize)]
pub struct PaypalExecutedTransaction {
    #[serde(default)]
    pub related_resources: Vec<PaypalRelatedResources>,
}

#[derive(Debug, Deserialize)]
pub struct PaypalExecuteResponse {
    pub payer: Option<serde_json::Value>,
    #[serde(default)]
    pub transactions: Vec<PaypalExecutedTransaction>,
}

impl PaypalExecuteResponse {
    /// Links of the sale or authorization resource created by the execute
    /// call, whichever is present.
    pub fn resource_links(&self) -> HashMap<String, String> {
        self.transactions
            .iter()
            .flat_map(|transaction| transaction.related_resources.iter())
            .flat_map(|resources| {
                resources
                    .sale
                    .iter()
                    .chain(resources.authorization.iter())
                    .flat_map(|resource| resource.links.iter())
            })
            .map(|link| (link.rel.clone(), link.href.clone()))
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct PaypalExecuteRequest {
    pub payer_id: String,
}

#[derive(Debug, Serialize)]
pub struct PaypalCaptureRequest {
    pub amount: PaypalSimpleAmount,
    pub is_final_capture: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaypalSimpleAmount {
    pub currency: String,
    pub total: StringMajorUnit,
}

#[derive(Debug, Deserialize)]
pub struct PaypalCaptureResponse {
    pub state: String,
}

#[derive(Debug, Default, Serialize)]
pub struct PaypalRefundRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<PaypalSimpleAmount>,
}

#[derive(Debug, Deserialize)]
pub struct PaypalRefundResponse {
    pub amount: PaypalSimpleAmount,
}

#[derive(Debug, Deserialize)]
pub struct PaypalErrorDetail {
    pub issue: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaypalErrorResponse {
    pub name: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub details: Vec<PaypalErrorDetail>,
}

impl PaypalErrorResponse {
    /// Best user-facing message the error payload offers.
    pub fn user_message(&self) -> String {
        self.details
            .iter()
            .find_map(|detail| detail.issue.clone())
            .or_else(|| self.message.clone())
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| "Payment provider rejected the request".to_string())
    }
}

/// Parse a decimal amount off the wire.
pub fn parse_amount(amount: &StringMajorUnit) -> CustomResult<Decimal, ProviderError> {
    amount
        .to_decimal()
        .map_err(|err| err.change_context(ProviderError::ResponseDeserializationFailed))
}
