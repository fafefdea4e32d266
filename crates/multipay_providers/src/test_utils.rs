//! Scripted HTTP client and in-memory payment record for provider tests.

#![allow(clippy::unwrap_used)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use common_enums::{FraudStatus, PaymentStatus};
use common_utils::{errors::CustomResult, request::Request};
use multipay_domain_models::{
    errors::StorageError,
    payment::{BillingDetails, PaymentRecord, PurchasedItem},
};
use multipay_interfaces::client::{HttpClient, HttpClientError, Response};
use rust_decimal::Decimal;
use time::OffsetDateTime;

pub(crate) const TEST_TOKEN: &str = "5a4dae68-2715-4b1e-8bb2-2c2dbe9255f6";

/// Replays a scripted sequence of responses and records every request.
pub(crate) struct StubClient {
    responses: Mutex<VecDeque<Response>>,
    requests: Mutex<Vec<Request>>,
}

impl StubClient {
    pub(crate) fn new(responses: Vec<(u16, &str)>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(status_code, body)| Response {
                        status_code,
                        response: bytes::Bytes::from(body.to_string()),
                    })
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn request_url(&self, index: usize) -> String {
        self.requests.lock().unwrap()[index].url.clone()
    }
}

impl HttpClient for StubClient {
    fn send(&self, request: Request) -> CustomResult<Response, HttpClientError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| error_stack::report!(HttpClientError::RequestNotSent))
    }
}

/// Minimal in-memory payment record for exercising providers directly.
pub(crate) struct TestPayment {
    pub(crate) id: i64,
    pub(crate) token: String,
    pub(crate) variant: String,
    pub(crate) currency: String,
    pub(crate) total: Decimal,
    pub(crate) delivery: Decimal,
    pub(crate) tax: Decimal,
    pub(crate) captured_amount: Decimal,
    pub(crate) status: PaymentStatus,
    pub(crate) fraud_status: FraudStatus,
    pub(crate) message: String,
    pub(crate) fraud_message: String,
    pub(crate) transaction_id: Option<String>,
    pub(crate) description: String,
    pub(crate) billing: Option<BillingDetails>,
    pub(crate) extra_data: String,
}

impl Default for TestPayment {
    fn default() -> Self {
        Self {
            id: 1,
            token: TEST_TOKEN.to_string(),
            variant: "test".to_string(),
            currency: "USD".to_string(),
            total: Decimal::from(100),
            delivery: Decimal::ZERO,
            tax: Decimal::ZERO,
            captured_amount: Decimal::ZERO,
            status: PaymentStatus::Waiting,
            fraud_status: FraudStatus::Unknown,
            message: String::new(),
            fraud_message: String::new(),
            transaction_id: None,
            description: "payment".to_string(),
            billing: None,
            extra_data: String::new(),
        }
    }
}

impl PaymentRecord for TestPayment {
    fn id(&self) -> i64 {
        self.id
    }
    fn token(&self) -> &str {
        &self.token
    }
    fn variant(&self) -> &str {
        &self.variant
    }
    fn currency(&self) -> &str {
        &self.currency
    }
    fn total(&self) -> Decimal {
        self.total
    }
    fn delivery(&self) -> Decimal {
        self.delivery
    }
    fn tax(&self) -> Decimal {
        self.tax
    }
    fn captured_amount(&self) -> Decimal {
        self.captured_amount
    }
    fn set_captured_amount(&mut self, amount: Decimal) {
        self.captured_amount = amount;
    }
    fn status(&self) -> PaymentStatus {
        self.status
    }
    fn set_status(&mut self, status: PaymentStatus) {
        self.status = status;
    }
    fn fraud_status(&self) -> FraudStatus {
        self.fraud_status
    }
    fn set_fraud_status(&mut self, status: FraudStatus) {
        self.fraud_status = status;
    }
    fn message(&self) -> &str {
        &self.message
    }
    fn set_message(&mut self, message: String) {
        self.message = message;
    }
    fn fraud_message(&self) -> &str {
        &self.fraud_message
    }
    fn set_fraud_message(&mut self, message: String) {
        self.fraud_message = message;
    }
    fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }
    fn set_transaction_id(&mut self, transaction_id: String) {
        self.transaction_id = Some(transaction_id);
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn billing(&self) -> Option<&BillingDetails> {
        self.billing.as_ref()
    }
    fn customer_ip_address(&self) -> Option<&str> {
        None
    }
    fn created(&self) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH
    }
    fn extra_data(&self) -> &str {
        &self.extra_data
    }
    fn set_extra_data(&mut self, data: String) {
        self.extra_data = data;
    }
    fn save(&mut self) -> CustomResult<(), StorageError> {
        Ok(())
    }
    fn get_success_url(&self) -> String {
        "http://example.com/success".to_string()
    }
    fn get_failure_url(&self) -> String {
        "http://example.com/failure".to_string()
    }
    fn get_purchased_items(&self) -> Vec<PurchasedItem> {
        vec![PurchasedItem {
            name: "foo".to_string(),
            sku: "bar".to_string(),
            quantity: 10,
            price: Decimal::from(20),
            currency: self.currency.clone(),
        }]
    }
}
