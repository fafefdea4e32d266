//! The uniform provider contract.

use std::sync::Arc;

use common_utils::{errors::CustomResult, request::Method};
use error_stack::report;
use multipay_domain_models::{
    payment::{PaymentHandle, PaymentRecord},
    types::{FormResult, PaymentForm, RequestView, ResponseDirective, SubmittedForm},
};
use rust_decimal::Decimal;

use crate::{
    client::HttpClient,
    configs::GatewayParams,
    errors::{ImproperlyConfigured, ProviderError},
};

/// Typed constructor the registry stores for each provider variant.
///
/// `config` is the variant's options map; unknown or missing options are a
/// construction-time error, never a request-time one.
pub type ProviderConstructor = fn(
    config: serde_json::Value,
    params: GatewayParams,
    client: Arc<dyn HttpClient>,
) -> CustomResult<Box<dyn Provider>, ImproperlyConfigured>;

/// Uniform operations every payment provider implements.
///
/// Providers are stateless between calls; everything per-payment lives in
/// the payment record's extension blob.
pub trait Provider: Send + Sync {
    /// Submission method of the presentation form.
    fn method(&self) -> Method {
        Method::Post
    }

    /// Whether the provider settles immediately (`true`) or only
    /// pre-authorizes, leaving capture to a later engine call.
    fn auto_capture(&self) -> bool {
        true
    }

    /// The host-level gateway parameters this provider was constructed with.
    fn gateway_params(&self) -> &GatewayParams;

    /// URL the presentation form submits to.
    fn get_action(&self, _payment: &mut PaymentHandle<'_>) -> CustomResult<String, ProviderError> {
        Err(report!(ProviderError::NotImplemented("get_action")))
    }

    /// Hidden fields of the presentation form.
    fn get_hidden_fields(
        &self,
        _payment: &mut PaymentHandle<'_>,
    ) -> CustomResult<Vec<multipay_domain_models::types::FormField>, ProviderError> {
        Err(report!(ProviderError::NotImplemented("get_hidden_fields")))
    }

    /// Start or resume the payment flow.
    ///
    /// The default builds a presentation form from [`Self::get_action`] and
    /// [`Self::get_hidden_fields`]; providers that redirect or auto-POST
    /// return the other [`FormResult`] variants instead.
    fn get_form(
        &self,
        payment: &mut PaymentHandle<'_>,
        _data: Option<&SubmittedForm>,
    ) -> CustomResult<FormResult, ProviderError> {
        let action = self.get_action(payment)?;
        let fields = self.get_hidden_fields(payment)?;
        Ok(FormResult::Present(PaymentForm {
            action,
            method: self.method(),
            fields,
        }))
    }

    /// Handle an asynchronous PSP callback for this payment.
    fn process_data(
        &self,
        payment: &mut PaymentHandle<'_>,
        request: &RequestView,
    ) -> CustomResult<ResponseDirective, ProviderError>;

    /// Extract the payment token from a static-variant callback whose URL
    /// does not carry it. `None` means the payload is unrecognized.
    fn get_token_from_request(&self, _request: &RequestView) -> Option<String> {
        None
    }

    /// Capture a pre-authorized amount. Returning `Ok(None)` means no
    /// capture was performed and the status must stay `preauth`.
    fn capture(
        &self,
        _payment: &mut PaymentHandle<'_>,
        _amount: Option<Decimal>,
    ) -> CustomResult<Option<Decimal>, ProviderError> {
        Err(report!(ProviderError::NotImplemented("capture")))
    }

    /// Void a pre-authorization.
    fn release(&self, _payment: &mut PaymentHandle<'_>) -> CustomResult<(), ProviderError> {
        Err(report!(ProviderError::NotImplemented("release")))
    }

    /// Refund a settled charge, returning the refunded amount.
    fn refund(
        &self,
        _payment: &mut PaymentHandle<'_>,
        _amount: Option<Decimal>,
    ) -> CustomResult<Decimal, ProviderError> {
        Err(report!(ProviderError::NotImplemented("refund")))
    }

    /// Absolute URL the PSP sends the buyer (or its server callback) back to.
    fn get_return_url(
        &self,
        payment: &dyn PaymentRecord,
        extra: Option<&[(String, String)]>,
    ) -> CustomResult<String, ProviderError> {
        self.gateway_params()
            .absolute_url(&payment.get_process_url(), extra)
    }
}
