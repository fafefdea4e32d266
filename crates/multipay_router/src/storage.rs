//! Reference storage: a concrete payment record plus an in-memory store
//! with transactional callback processing.
//!
//! Production hosts keep payments in their own database and implement
//! [`PaymentStore`] over it; [`InMemoryStore`] exists for tests, demos and
//! as the model for what a real implementation must guarantee.

use std::{
    collections::HashMap,
    sync::Mutex,
};

use common_enums::{FraudStatus, PaymentStatus};
use common_utils::{date_time, errors::CustomResult, generate_payment_token};
use error_stack::report;
use multipay_domain_models::{
    errors::StorageError,
    payment::{BillingDetails, PaymentRecord, PurchasedItem},
};
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::core::errors::OperationError;

/// Transactional access to payment records, keyed by token.
///
/// `in_transaction` loads the record, runs `operation` against it, and
/// commits the mutated record only when the operation succeeds; a failing
/// operation must leave the stored record untouched. Results other than
/// success/failure travel out through captures on the closure.
pub trait PaymentStore: Send + Sync {
    fn in_transaction(
        &self,
        token: &str,
        operation: &mut dyn FnMut(&mut dyn PaymentRecord) -> CustomResult<(), OperationError>,
    ) -> CustomResult<(), OperationError>;
}

/// A plain owned payment record.
#[derive(Clone, Debug)]
pub struct Payment {
    pub id: i64,
    pub token: String,
    pub variant: String,
    pub currency: String,
    pub total: Decimal,
    pub delivery: Decimal,
    pub tax: Decimal,
    pub captured_amount: Decimal,
    pub status: PaymentStatus,
    pub fraud_status: FraudStatus,
    pub message: String,
    pub fraud_message: String,
    pub transaction_id: Option<String>,
    pub description: String,
    pub billing: Option<BillingDetails>,
    pub customer_ip_address: Option<String>,
    pub extra_data: String,
    pub success_url: String,
    pub failure_url: String,
    pub items: Vec<PurchasedItem>,
    pub created: OffsetDateTime,
    pub modified: OffsetDateTime,
}

impl Payment {
    pub fn new(
        id: i64,
        variant: impl Into<String>,
        currency: impl Into<String>,
        total: Decimal,
    ) -> Self {
        let now = date_time::now();
        Self {
            id,
            token: generate_payment_token(),
            variant: variant.into(),
            currency: currency.into(),
            total,
            delivery: Decimal::ZERO,
            tax: Decimal::ZERO,
            captured_amount: Decimal::ZERO,
            status: PaymentStatus::default(),
            fraud_status: FraudStatus::default(),
            message: String::new(),
            fraud_message: String::new(),
            transaction_id: None,
            description: String::new(),
            billing: None,
            customer_ip_address: None,
            extra_data: String::new(),
            success_url: "http://example.com/success".to_string(),
            failure_url: "http://example.com/failure".to_string(),
            items: Vec::new(),
            created: now,
            modified: now,
        }
    }
}

impl PaymentRecord for Payment {
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
        self.customer_ip_address.as_deref()
    }
    fn created(&self) -> OffsetDateTime {
        self.created
    }
    fn extra_data(&self) -> &str {
        &self.extra_data
    }
    fn set_extra_data(&mut self, data: String) {
        self.extra_data = data;
    }
    fn save(&mut self) -> CustomResult<(), StorageError> {
        self.modified = date_time::now();
        Ok(())
    }
    fn get_success_url(&self) -> String {
        self.success_url.clone()
    }
    fn get_failure_url(&self) -> String {
        self.failure_url.clone()
    }
    fn get_purchased_items(&self) -> Vec<PurchasedItem> {
        self.items.clone()
    }
}

/// Token-keyed store backed by a mutex-held map.
#[derive(Default)]
pub struct InMemoryStore {
    payments: Mutex<HashMap<String, Payment>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, payment: Payment) {
        if let Ok(mut payments) = self.payments.lock() {
            payments.insert(payment.token.clone(), payment);
        }
    }

    pub fn get(&self, token: &str) -> Option<Payment> {
        self.payments.lock().ok()?.get(token).cloned()
    }
}

impl PaymentStore for InMemoryStore {
    /// Clone-and-commit: the operation runs against a working copy, which
    /// replaces the stored record only on success.
    fn in_transaction(
        &self,
        token: &str,
        operation: &mut dyn FnMut(&mut dyn PaymentRecord) -> CustomResult<(), OperationError>,
    ) -> CustomResult<(), OperationError> {
        let mut payments = self
            .payments
            .lock()
            .map_err(|_| report!(OperationError::Storage))?;
        let stored = payments
            .get(token)
            .ok_or_else(|| report!(OperationError::NotFound))?;
        let mut working = stored.clone();
        operation(&mut working)?;
        payments.insert(token.to_string(), working);
        Ok(())
    }
}
