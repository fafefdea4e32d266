//! Wire types and decision tables for the CyberSource transaction API.

use cards::{CardExpiration, CardIssuer, CardNumber, CardSecurityCode};
use common_utils::{errors::CustomResult, types::StringMajorUnit};
use masking::{PeekInterface, Secret};
use multipay_domain_models::{
    payment::PaymentRecord,
    types::SubmittedForm,
};
use multipay_interfaces::errors::ProviderError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils;

pub const ACCEPTED: i32 = 100;
pub const TRANSACTION_REVERSED: i32 = 237;
pub const TRANSACTION_SETTLED: i32 = 238;
pub const AUTHENTICATE_REQUIRED: i32 = 475;

pub const FRAUD_MANAGER_REVIEW: i32 = 480;
pub const FRAUD_MANAGER_REJECT: i32 = 481;
pub const FRAUD_SCORE_EXCEEDS_THRESHOLD: i32 = 400;

// Soft declines: the charge proceeds but carries a fraud-reject verdict.
pub const ADDRESS_VERIFICATION_SERVICE_FAIL: i32 = 200;
pub const CARD_VERIFICATION_NUMBER_FAIL: i32 = 230;
pub const SMART_AUTHORIZATION_FAIL: i32 = 520;

/// Buyer-facing message for a declining reason code.
pub fn error_message(code: i32) -> &'static str {
    match code {
        221 | 222 | 700 | 701 | 702 | 703 => {
            "Our bank has flagged your transaction as unusually suspicious. Please contact us to resolve this issue."
        }
        201 | 203 | 209 => {
            "Your bank has declined the transaction. No additional information was provided."
        }
        202 => "The card has either expired or you have entered an incorrect expiration date.",
        204 | 210 | 251 => {
            "There are insufficient funds on your card or it has reached its credit limit."
        }
        205 => "The card you are trying to use was reported as lost or stolen.",
        208 => {
            "Your card is either inactive or it does not permit online payments. Please contact your bank to resolve this issue."
        }
        211 => {
            "Your bank has declined the transaction. Please check the verification number of your card and retry."
        }
        231 => {
            "Your bank has declined the transaction. Please make sure the card number you have entered is correct and retry."
        }
        232 | 240 => "We are sorry but our bank cannot handle the card type you are using.",
        450..=461 => {
            "We were unable to verify your address. Please make sure the address you entered is correct and retry."
        }
        _ => "We were unable to complete the transaction. Please try again later.",
    }
}

/// CyberSource's numeric card-type code for a detected network.
pub fn card_type_code(issuer: CardIssuer) -> Option<&'static str> {
    match issuer {
        CardIssuer::Visa => Some("001"),
        CardIssuer::Mastercard => Some("002"),
        CardIssuer::Amex => Some("003"),
        CardIssuer::Jcb => Some("004"),
        CardIssuer::Maestro => Some("042"),
        CardIssuer::Discover | CardIssuer::Diners => None,
    }
}

/// Validated card details collected from the buyer.
pub struct CardData {
    pub name: Secret<String>,
    pub number: CardNumber,
    pub expiration: CardExpiration,
    pub cvv: Secret<String>,
}

impl CardData {
    /// Validate the card entry fields of a submitted payment form.
    pub fn try_from_form(form: &SubmittedForm) -> CustomResult<Self, ProviderError> {
        let name = form
            .field("name")
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| utils::psp_error("Cardholder name is required"))?;
        let number: CardNumber = form
            .field("number")
            .unwrap_or_default()
            .parse()
            .map_err(|_| utils::psp_error("Please enter a valid card number"))?;
        let month: u8 = form
            .field("expiration_month")
            .unwrap_or_default()
            .parse()
            .map_err(|_| utils::psp_error("Please enter a valid expiration date"))?;
        let year: u16 = form
            .field("expiration_year")
            .unwrap_or_default()
            .parse()
            .map_err(|_| utils::psp_error("Please enter a valid expiration date"))?;
        let expiration = CardExpiration::new(month.into(), year.into())
            .map_err(|_| utils::psp_error("Please enter a valid expiration date"))?;
        let cvv = form
            .field("cvv2")
            .ok_or_else(|| utils::psp_error("Please enter the card verification number"))?;
        let code: u16 = cvv
            .parse()
            .map_err(|_| utils::psp_error("Please enter a valid card verification number"))?;
        CardSecurityCode::new(code.into())
            .map_err(|_| utils::psp_error("Please enter a valid card verification number"))?;
        Ok(Self {
            name: Secret::new(name.to_string()),
            number,
            expiration,
            cvv: Secret::new(cvv.to_string()),
        })
    }
}

/// Card data as carried through the 3-D Secure interstitial, inside a
/// signed envelope. Expiration is decomposed so no date type crosses the
/// wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct SealedCard {
    pub name: Secret<String>,
    pub number: Secret<String>,
    pub expiration: SealedExpiration,
    pub cvv: Secret<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SealedExpiration {
    pub month: u8,
    pub year: u16,
}

impl From<&CardData> for SealedCard {
    fn from(card: &CardData) -> Self {
        Self {
            name: card.name.clone(),
            number: Secret::new(card.number.get_card_no()),
            expiration: SealedExpiration {
                month: *card.expiration.get_month().peek().peek(),
                year: *card.expiration.get_year().peek().peek(),
            },
            cvv: card.cvv.clone(),
        }
    }
}

impl TryFrom<SealedCard> for CardData {
    type Error = error_stack::Report<ProviderError>;

    fn try_from(sealed: SealedCard) -> Result<Self, Self::Error> {
        let number: CardNumber = sealed
            .number
            .peek()
            .parse()
            .map_err(|_| utils::psp_error("Please enter a valid card number"))?;
        let expiration =
            CardExpiration::new(sealed.expiration.month.into(), sealed.expiration.year.into())
                .map_err(|_| utils::psp_error("Please enter a valid expiration date"))?;
        Ok(Self {
            name: sealed.name,
            number,
            expiration,
            cvv: sealed.cvv,
        })
    }
}

/// One `<service>_run` block of a transaction request.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub run: bool,
    #[serde(rename = "authRequestID", skip_serializing_if = "Option::is_none")]
    pub auth_request_id: Option<String>,
    #[serde(rename = "captureRequestID", skip_serializing_if = "Option::is_none")]
    pub capture_request_id: Option<String>,
    #[serde(rename = "signedPARes", skip_serializing_if = "Option::is_none")]
    pub signed_pa_res: Option<String>,
}

impl ServiceRequest {
    pub fn run() -> Self {
        Self {
            run: true,
            ..Self::default()
        }
    }

    pub fn with_auth_request(transaction_id: &str) -> Self {
        Self {
            run: true,
            auth_request_id: Some(transaction_id.to_string()),
            ..Self::default()
        }
    }

    pub fn with_capture_request(transaction_id: &str) -> Self {
        Self {
            run: true,
            capture_request_id: Some(transaction_id.to_string()),
            ..Self::default()
        }
    }

    pub fn with_signed_pa_res(pa_res: &str) -> Self {
        Self {
            run: true,
            signed_pa_res: Some(pa_res.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillTo {
    pub first_name: String,
    pub last_name: String,
    pub street1: String,
    pub street2: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub state: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

impl BillTo {
    pub fn try_from_payment(payment: &dyn PaymentRecord) -> CustomResult<Self, ProviderError> {
        let billing = payment
            .billing()
            .ok_or_else(|| utils::missing_field("billing"))?;
        Ok(Self {
            first_name: billing.first_name.clone(),
            last_name: billing.last_name.clone(),
            street1: billing.address_1.clone(),
            street2: billing.address_2.clone(),
            city: billing.city.clone(),
            postal_code: billing.postcode.clone(),
            country: billing.country_code.clone(),
            state: billing.country_area.clone(),
            email: billing.email.clone(),
            ip_address: payment.customer_ip_address().map(str::to_string),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CybersourceCard {
    pub full_name: Secret<String>,
    pub account_number: CardNumber,
    pub expiration_month: String,
    pub expiration_year: String,
    pub cv_number: Secret<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_type: Option<&'static str>,
}

impl From<&CardData> for CybersourceCard {
    fn from(card: &CardData) -> Self {
        Self {
            full_name: card.name.clone(),
            account_number: card.number.clone(),
            expiration_month: card.expiration.get_month().two_digits(),
            expiration_year: card.expiration.get_year().four_digits(),
            cv_number: card.cvv.clone(),
            card_type: card.number.issuer().and_then(card_type_code),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub unit_price: StringMajorUnit,
    pub quantity: i64,
    pub product_name: String,
    pub product_sku: String,
}

pub fn items_from_payment(payment: &dyn PaymentRecord) -> Vec<Item> {
    (0_i64..)
        .zip(payment.get_purchased_items())
        .map(|(id, item)| Item {
            id,
            unit_price: StringMajorUnit::from_decimal(item.price),
            quantity: item.quantity,
            product_name: item.name,
            product_sku: item.sku,
        })
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseTotals {
    pub currency: String,
    pub grand_total_amount: StringMajorUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freight_amount: Option<StringMajorUnit>,
}

impl PurchaseTotals {
    /// The payment's full totals, delivery broken out.
    pub fn full(payment: &dyn PaymentRecord) -> Self {
        Self {
            currency: payment.currency().to_string(),
            grand_total_amount: StringMajorUnit::from_decimal(payment.total()),
            freight_amount: Some(StringMajorUnit::from_decimal(payment.delivery())),
        }
    }

    /// An explicit operation amount (capture, refund).
    pub fn amount(payment: &dyn PaymentRecord, amount: Decimal) -> Self {
        Self {
            currency: payment.currency().to_string(),
            grand_total_amount: StringMajorUnit::from_decimal(amount),
            freight_amount: None,
        }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CybersourceRequest {
    #[serde(rename = "merchantID")]
    pub merchant_id: String,
    pub merchant_reference_code: String,
    #[serde(rename = "deviceFingerprintID", skip_serializing_if = "Option::is_none")]
    pub device_fingerprint_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc_auth_service: Option<ServiceRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc_capture_service: Option<ServiceRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc_credit_service: Option<ServiceRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc_auth_reversal_service: Option<ServiceRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_auth_enroll_service: Option<ServiceRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_auth_validate_service: Option<ServiceRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_to: Option<BillTo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<CybersourceCard>,
    #[serde(rename = "item", skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_totals: Option<PurchaseTotals>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayerAuthEnrollReply {
    pub xid: String,
    #[serde(rename = "acsURL")]
    pub acs_url: String,
    pub pa_req: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CybersourceResponse {
    #[serde(rename = "requestID")]
    pub request_id: Option<String>,
    pub reason_code: i32,
    pub payer_auth_enroll_reply: Option<PayerAuthEnrollReply>,
}
