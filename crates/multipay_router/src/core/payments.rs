//! The payment lifecycle engine.
//!
//! Providers report what the PSP did; the engine owns the state-machine
//! preconditions and the `captured_amount` bookkeeping around capture,
//! release and refund.

use std::sync::Arc;

use common_enums::PaymentStatus;
use common_utils::errors::CustomResult;
use error_stack::{report, ResultExt};
use multipay_domain_models::{
    payment::{PaymentHandle, PaymentRecord},
    signals::SignalHub,
    types::{FormResult, RequestView, ResponseDirective, SubmittedForm},
};
use multipay_interfaces::api::Provider;
use rust_decimal::Decimal;

use crate::{core::errors::OperationError, registry::ProviderRegistry};

/// The registry plus the engine-scoped signal hub, bound together as the
/// single entry point hosts drive payments through.
pub struct Gateway {
    registry: ProviderRegistry,
    signals: SignalHub,
}

impl Gateway {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            signals: SignalHub::new(),
        }
    }

    /// Observers of `status-changed` subscribe here.
    pub fn signals(&self) -> &SignalHub {
        &self.signals
    }

    pub fn provider(&self, variant: &str) -> CustomResult<Arc<dyn Provider>, OperationError> {
        self.registry
            .resolve(variant)
            .map_err(|err| {
                let context = match err.current_context() {
                    crate::registry::RegistryError::UnknownVariant(variant) => {
                        OperationError::UnknownVariant(variant.clone())
                    }
                    _ => OperationError::Provider,
                };
                err.change_context(context)
            })
    }

    /// Start or resume the payment flow for `record`.
    pub fn get_form(
        &self,
        record: &mut dyn PaymentRecord,
        data: Option<&SubmittedForm>,
    ) -> CustomResult<FormResult, OperationError> {
        let provider = self.provider(record.variant())?;
        let mut payment = PaymentHandle::new(record, &self.signals);
        provider
            .get_form(&mut payment, data)
            .change_context(OperationError::Provider)
    }

    /// Hand an inbound PSP callback to the record's provider.
    pub fn process(
        &self,
        record: &mut dyn PaymentRecord,
        request: &RequestView,
    ) -> CustomResult<ResponseDirective, OperationError> {
        let provider = self.provider(record.variant())?;
        let mut payment = PaymentHandle::new(record, &self.signals);
        provider
            .process_data(&mut payment, request)
            .change_context(OperationError::Provider)
    }

    /// Capture a pre-authorized payment. Permitted only from `preauth`; a
    /// provider answering `None` performed no capture and the status stays
    /// put.
    pub fn capture(
        &self,
        record: &mut dyn PaymentRecord,
        amount: Option<Decimal>,
    ) -> CustomResult<Option<Decimal>, OperationError> {
        Self::require_status(record, "capture", PaymentStatus::Preauth)?;
        let provider = self.provider(record.variant())?;
        let mut payment = PaymentHandle::new(record, &self.signals);
        let captured = provider
            .capture(&mut payment, amount)
            .change_context(OperationError::Provider)?;
        if let Some(captured) = captured {
            tracing::info!(token = payment.token(), %captured, "payment captured");
            payment.set_captured_amount(captured);
            payment
                .change_status(PaymentStatus::Confirmed, "")
                .change_context(OperationError::Storage)?;
        }
        Ok(captured)
    }

    /// Void a pre-authorization. Permitted only from `preauth`.
    pub fn release(&self, record: &mut dyn PaymentRecord) -> CustomResult<(), OperationError> {
        Self::require_status(record, "release", PaymentStatus::Preauth)?;
        let provider = self.provider(record.variant())?;
        let mut payment = PaymentHandle::new(record, &self.signals);
        provider
            .release(&mut payment)
            .change_context(OperationError::Provider)?;
        tracing::info!(token = payment.token(), "pre-authorization released");
        payment
            .change_status(PaymentStatus::Refunded, "")
            .change_context(OperationError::Storage)
    }

    /// Refund a settled payment. Permitted only from `confirmed`; partial
    /// refunds decrement `captured_amount` and the payment moves to
    /// `refunded` once nothing remains captured.
    pub fn refund(
        &self,
        record: &mut dyn PaymentRecord,
        amount: Option<Decimal>,
    ) -> CustomResult<Decimal, OperationError> {
        Self::require_status(record, "refund", PaymentStatus::Confirmed)?;
        if let Some(amount) = amount {
            if amount > record.captured_amount() {
                return Err(report!(OperationError::InvalidAmount(format!(
                    "refund of {amount} exceeds captured amount {}",
                    record.captured_amount()
                ))));
            }
        }
        let provider = self.provider(record.variant())?;
        let mut payment = PaymentHandle::new(record, &self.signals);
        let refunded = provider
            .refund(&mut payment, amount)
            .change_context(OperationError::Provider)?;
        tracing::info!(token = payment.token(), %refunded, "payment refunded");

        let remaining = (payment.captured_amount() - refunded).max(Decimal::ZERO);
        payment.set_captured_amount(remaining);
        if remaining.is_zero() {
            payment
                .change_status(PaymentStatus::Refunded, "")
                .change_context(OperationError::Storage)?;
        } else {
            payment.save().change_context(OperationError::Storage)?;
        }
        Ok(refunded)
    }

    fn require_status(
        record: &dyn PaymentRecord,
        operation: &'static str,
        required: PaymentStatus,
    ) -> CustomResult<(), OperationError> {
        let found = record.status();
        if found == required {
            Ok(())
        } else {
            Err(report!(OperationError::InvalidTransition {
                operation,
                required,
                found,
            }))
        }
    }
}
