//! The payment record contract and the handle providers operate through.

use std::ops::{Deref, DerefMut};

use common_enums::{FraudStatus, PaymentStatus};
use common_utils::errors::CustomResult;
use error_stack::{report, ResultExt};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use time::OffsetDateTime;

use crate::{
    errors::StorageError,
    signals::{SignalHub, StatusChanged},
};

/// Counterparty details captured by the host at checkout time.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BillingDetails {
    pub first_name: String,
    pub last_name: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub postcode: String,
    pub country_code: String,
    pub country_area: String,
    pub email: String,
}

/// A single line item of the purchase.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PurchasedItem {
    pub name: String,
    pub sku: String,
    pub quantity: i64,
    pub price: Decimal,
    pub currency: String,
}

/// Capability set the host's persistent payment record must expose.
///
/// Persistence lives with the host; the orchestration core only reads and
/// mutates records through this contract. Amounts are fixed-point decimals
/// with two fractional digits and `captured_amount <= total` must hold after
/// every engine operation.
pub trait PaymentRecord {
    /// Stable numeric identity assigned by the host.
    fn id(&self) -> i64;
    /// Opaque 36-character token, unique per record.
    fn token(&self) -> &str;
    /// Name of the registered provider variant this record is bound to.
    fn variant(&self) -> &str;
    /// Currency code, passed through to the provider uninterpreted.
    fn currency(&self) -> &str;

    fn total(&self) -> Decimal;
    fn delivery(&self) -> Decimal;
    fn tax(&self) -> Decimal;
    fn captured_amount(&self) -> Decimal;
    fn set_captured_amount(&mut self, amount: Decimal);

    fn status(&self) -> PaymentStatus;
    fn set_status(&mut self, status: PaymentStatus);
    fn fraud_status(&self) -> FraudStatus;
    fn set_fraud_status(&mut self, status: FraudStatus);

    fn message(&self) -> &str;
    fn set_message(&mut self, message: String);
    fn fraud_message(&self) -> &str;
    fn set_fraud_message(&mut self, message: String);

    /// Identifier assigned by the payment service provider, once known.
    fn transaction_id(&self) -> Option<&str>;
    fn set_transaction_id(&mut self, transaction_id: String);

    fn description(&self) -> &str;
    fn billing(&self) -> Option<&BillingDetails>;
    fn customer_ip_address(&self) -> Option<&str>;
    fn created(&self) -> OffsetDateTime;

    /// JSON-serialized provider extension blob. Empty string means no
    /// extension data has been written yet.
    fn extra_data(&self) -> &str;
    fn set_extra_data(&mut self, data: String);

    /// Persist the record through the host's storage layer.
    fn save(&mut self) -> CustomResult<(), StorageError>;

    /// Relative URL routing asynchronous PSP callbacks to this record.
    fn get_process_url(&self) -> String {
        format!("/process/{}/", self.token())
    }

    /// Absolute URL the buyer lands on after a successful payment.
    fn get_success_url(&self) -> String;
    /// Absolute URL the buyer lands on after a failed payment.
    fn get_failure_url(&self) -> String;

    fn get_purchased_items(&self) -> Vec<PurchasedItem>;
}

/// A payment record paired with the engine's signal hub.
///
/// Derefs to the underlying record for plain reads and writes; the inherent
/// methods add the behavior the record contract alone cannot provide:
/// signal-emitting status changes and typed access to the extension blob.
pub struct PaymentHandle<'a> {
    record: &'a mut dyn PaymentRecord,
    signals: &'a SignalHub,
}

impl<'a> PaymentHandle<'a> {
    pub fn new(record: &'a mut dyn PaymentRecord, signals: &'a SignalHub) -> Self {
        Self { record, signals }
    }

    /// Borrow the underlying record as a trait object.
    pub fn as_record(&self) -> &dyn PaymentRecord {
        &*self.record
    }

    /// Set the status, persist, and notify observers.
    ///
    /// Writing the status the record already has persists the message but
    /// emits no signal.
    pub fn change_status(
        &mut self,
        new_status: PaymentStatus,
        message: &str,
    ) -> CustomResult<(), StorageError> {
        let old_status = self.record.status();
        if !message.is_empty() {
            self.record.set_message(message.to_string());
        }
        if old_status == new_status {
            self.record.save()?;
            return Ok(());
        }
        self.record.set_status(new_status);
        self.record.save()?;
        self.signals.emit(&StatusChanged {
            token: self.record.token().to_string(),
            old_status,
            new_status,
        });
        Ok(())
    }

    /// Set the fraud verdict, optionally persisting immediately.
    pub fn change_fraud_status(
        &mut self,
        new_status: FraudStatus,
        message: &str,
        commit: bool,
    ) -> CustomResult<(), StorageError> {
        self.record.set_fraud_status(new_status);
        if !message.is_empty() {
            self.record.set_fraud_message(message.to_string());
        }
        if commit {
            self.record.save()?;
        }
        Ok(())
    }

    /// Read a typed value out of the extension blob.
    pub fn attr<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let blob = self.record.extra_data();
        if blob.is_empty() {
            return None;
        }
        let attrs: serde_json::Value = serde_json::from_str(blob).ok()?;
        let value = attrs.get(key)?.clone();
        serde_json::from_value(value).ok()
    }

    /// Write a typed value into the extension blob and persist.
    pub fn set_attr<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
    ) -> CustomResult<(), StorageError> {
        let blob = self.record.extra_data();
        let mut attrs: serde_json::Value = if blob.is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(blob).change_context(StorageError::SerializationFailed)?
        };
        let object = attrs
            .as_object_mut()
            .ok_or_else(|| report!(StorageError::SerializationFailed))?;
        object.insert(
            key.to_string(),
            serde_json::to_value(value).change_context(StorageError::SerializationFailed)?,
        );
        let serialized =
            serde_json::to_string(&attrs).change_context(StorageError::SerializationFailed)?;
        self.record.set_extra_data(serialized);
        self.record.save()
    }
}

impl<'a> Deref for PaymentHandle<'a> {
    type Target = dyn PaymentRecord + 'a;

    fn deref(&self) -> &Self::Target {
        self.record
    }
}

impl DerefMut for PaymentHandle<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.record
    }
}
