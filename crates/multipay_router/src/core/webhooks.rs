//! Inbound PSP callback dispatch.
//!
//! Two URL shapes reach the dispatcher:
//!
//! * `/process/<token>/` where the token is the payment's UUID; and
//! * `/process/<variant>/` for PSPs that call one static endpoint per
//!   variant, where the provider extracts the token from the payload.
//!
//! The dispatcher itself never answers anything other than the provider's
//! directive or 404: malformed tokens, unknown payments, unparseable
//! payloads and internal failures all collapse to "not found" so probes
//! learn nothing. Providers that want a different status (the 403 on a bad
//! webhook signature, say) return it through their directive, which passes
//! through untouched.

use std::sync::Arc;

use multipay_domain_models::types::{RequestView, ResponseDirective};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    core::payments::Gateway,
    storage::PaymentStore,
};

#[allow(clippy::expect_used)]
static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("token pattern is valid")
});

#[allow(clippy::expect_used)]
static VARIANT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z-]+$").expect("variant pattern is valid"));

pub struct CallbackDispatcher {
    gateway: Gateway,
    store: Arc<dyn PaymentStore>,
}

impl CallbackDispatcher {
    pub fn new(gateway: Gateway, store: Arc<dyn PaymentStore>) -> Self {
        Self { gateway, store }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Handle `/process/<token>/`.
    ///
    /// The provider runs inside a storage transaction: its record mutations
    /// commit only when it returns a directive, so a provider error leaves
    /// the payment exactly as the callback found it.
    pub fn process_callback(&self, token: &str, request: &RequestView) -> ResponseDirective {
        if !TOKEN_PATTERN.is_match(token) {
            tracing::warn!(token, "callback token does not match the expected shape");
            return ResponseDirective::not_found();
        }

        let mut directive = None;
        let result = self.store.in_transaction(token, &mut |record| {
            directive = Some(self.gateway.process(record, request)?);
            Ok(())
        });
        match result {
            Ok(()) => directive.unwrap_or_else(ResponseDirective::not_found),
            Err(err) => {
                tracing::warn!(token, error = ?err, "callback processing failed");
                ResponseDirective::not_found()
            }
        }
    }

    /// Handle `/process/<variant>/` for providers with a static callback
    /// endpoint. The provider inspects the payload to name the payment,
    /// then the callback proceeds exactly as the token route would.
    pub fn process_static_callback(&self, variant: &str, request: &RequestView) -> ResponseDirective {
        if !VARIANT_PATTERN.is_match(variant) {
            tracing::warn!(variant, "static callback variant does not match the expected shape");
            return ResponseDirective::not_found();
        }
        let provider = match self.gateway.provider(variant) {
            Ok(provider) => provider,
            Err(err) => {
                tracing::warn!(variant, error = ?err, "static callback for unresolvable variant");
                return ResponseDirective::not_found();
            }
        };
        let Some(token) = provider.get_token_from_request(request) else {
            tracing::warn!(variant, "static callback payload names no payment");
            return ResponseDirective::not_found();
        };
        self.process_callback(&token, request)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use common_enums::PaymentStatus;
    use common_utils::errors::CustomResult;
    use error_stack::{report, ResultExt};
    use multipay_domain_models::payment::PaymentHandle;
    use multipay_interfaces::{
        api::Provider,
        client::{HttpClient, HttpClientError, Response},
        configs::GatewayParams,
        errors::{ImproperlyConfigured, ProviderError},
    };
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        registry::ProviderRegistry,
        storage::{InMemoryStore, Payment},
    };

    struct NullClient;

    impl HttpClient for NullClient {
        fn send(
            &self,
            _request: common_utils::request::Request,
        ) -> CustomResult<Response, HttpClientError> {
            Err(report!(HttpClientError::RequestNotSent))
        }
    }

    /// Confirms on `result=ok`, rejects the signature with a 403 on
    /// `result=forged`, errors otherwise.
    struct CallbackProvider {
        params: GatewayParams,
    }

    impl Provider for CallbackProvider {
        fn gateway_params(&self) -> &GatewayParams {
            &self.params
        }

        fn process_data(
            &self,
            payment: &mut PaymentHandle<'_>,
            request: &RequestView,
        ) -> CustomResult<ResponseDirective, ProviderError> {
            match request.query_param("result") {
                Some("ok") => {
                    let total = payment.total();
                    payment.set_captured_amount(total);
                    payment
                        .change_status(PaymentStatus::Confirmed, "")
                        .change_context(ProviderError::StorageFailed)?;
                    Ok(ResponseDirective::ok("OK"))
                }
                Some("forged") => Ok(ResponseDirective::forbidden_failed()),
                _ => Err(report!(ProviderError::ResponseDeserializationFailed)),
            }
        }

        fn get_token_from_request(&self, request: &RequestView) -> Option<String> {
            request.query_param("reference").map(ToString::to_string)
        }
    }

    fn callback_constructor(
        _config: serde_json::Value,
        params: GatewayParams,
        _client: std::sync::Arc<dyn HttpClient>,
    ) -> CustomResult<Box<dyn Provider>, ImproperlyConfigured> {
        Ok(Box::new(CallbackProvider { params }))
    }

    fn dispatcher() -> (CallbackDispatcher, Arc<InMemoryStore>) {
        let mut registry = ProviderRegistry::new(
            GatewayParams::new("http://example.com"),
            Arc::new(NullClient),
        );
        registry.register("callback", callback_constructor, serde_json::json!({}));
        let store = Arc::new(InMemoryStore::new());
        let dispatcher = CallbackDispatcher::new(
            Gateway::new(registry),
            Arc::clone(&store) as Arc<dyn PaymentStore>,
        );
        (dispatcher, store)
    }

    fn seeded_payment(store: &InMemoryStore) -> String {
        let payment = Payment::new(1, "callback", "USD", Decimal::from(50));
        let token = payment.token.clone();
        store.insert(payment);
        token
    }

    fn request_with_query(pairs: &[(&str, &str)]) -> RequestView {
        RequestView {
            query: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..RequestView::default()
        }
    }

    #[test]
    fn valid_callback_commits_and_returns_the_directive() {
        let (dispatcher, store) = dispatcher();
        let token = seeded_payment(&store);
        let directive =
            dispatcher.process_callback(&token, &request_with_query(&[("result", "ok")]));
        assert_eq!(directive.status_code(), 200);
        let stored = store.get(&token).unwrap();
        assert_eq!(stored.status, PaymentStatus::Confirmed);
        assert_eq!(stored.captured_amount, Decimal::from(50));
    }

    #[test]
    fn malformed_token_is_not_found() {
        let (dispatcher, _store) = dispatcher();
        let directive =
            dispatcher.process_callback("not-a-token", &request_with_query(&[("result", "ok")]));
        assert_eq!(directive.status_code(), 404);
    }

    #[test]
    fn unknown_token_is_not_found() {
        let (dispatcher, _store) = dispatcher();
        let directive = dispatcher.process_callback(
            "3ef5f72a-0c4f-4a02-9a9e-8c5f75f3a201",
            &request_with_query(&[("result", "ok")]),
        );
        assert_eq!(directive.status_code(), 404);
    }

    #[test]
    fn provider_error_is_not_found_and_rolls_back() {
        let (dispatcher, store) = dispatcher();
        let token = seeded_payment(&store);
        let directive = dispatcher.process_callback(&token, &request_with_query(&[]));
        assert_eq!(directive.status_code(), 404);
        assert_eq!(store.get(&token).unwrap().status, PaymentStatus::Waiting);
    }

    #[test]
    fn provider_forbidden_directive_passes_through() {
        let (dispatcher, store) = dispatcher();
        let token = seeded_payment(&store);
        let directive =
            dispatcher.process_callback(&token, &request_with_query(&[("result", "forged")]));
        assert_eq!(directive.status_code(), 403);
    }

    #[test]
    fn static_callback_routes_through_the_extracted_token() {
        let (dispatcher, store) = dispatcher();
        let token = seeded_payment(&store);
        let directive = dispatcher.process_static_callback(
            "callback",
            &request_with_query(&[("result", "ok"), ("reference", token.as_str())]),
        );
        assert_eq!(directive.status_code(), 200);
        assert_eq!(store.get(&token).unwrap().status, PaymentStatus::Confirmed);
    }

    #[test]
    fn static_callback_for_unknown_variant_is_not_found() {
        let (dispatcher, _store) = dispatcher();
        let directive = dispatcher
            .process_static_callback("missing", &request_with_query(&[("result", "ok")]));
        assert_eq!(directive.status_code(), 404);
    }

    #[test]
    fn static_callback_without_a_token_is_not_found() {
        let (dispatcher, _store) = dispatcher();
        let directive =
            dispatcher.process_static_callback("callback", &request_with_query(&[("result", "ok")]));
        assert_eq!(directive.status_code(), 404);
    }
}
