//! Variant-to-provider binding with lazy, cached construction.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use common_utils::errors::CustomResult;
use error_stack::{report, ResultExt};
use multipay_interfaces::{
    api::{Provider, ProviderConstructor},
    client::HttpClient,
    configs::GatewayParams,
};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no provider is registered for variant `{0}`")]
    UnknownVariant(String),
    #[error("provider construction failed for variant `{0}`")]
    ConstructionFailed(String),
    #[error("provider cache lock is poisoned")]
    CachePoisoned,
}

/// Maps registered variant names to provider instances.
///
/// Construction is lazy on the first [`Self::resolve`] of a variant and the
/// instance is cached for the process lifetime; the cache is written once
/// per variant and read thereafter, so a single mutex over the map is
/// enough. Bad options surface as a construction error carrying the
/// variant's `ImproperlyConfigured` context, never as a request-time error.
pub struct ProviderRegistry {
    entries: HashMap<String, (ProviderConstructor, serde_json::Value)>,
    cache: Mutex<HashMap<String, Arc<dyn Provider>>>,
    params: GatewayParams,
    client: Arc<dyn HttpClient>,
}

impl ProviderRegistry {
    pub fn new(params: GatewayParams, client: Arc<dyn HttpClient>) -> Self {
        Self {
            entries: HashMap::new(),
            cache: Mutex::new(HashMap::new()),
            params,
            client,
        }
    }

    /// Bind `variant` to a provider constructor and its options map.
    pub fn register(
        &mut self,
        variant: impl Into<String>,
        constructor: ProviderConstructor,
        config: serde_json::Value,
    ) {
        self.entries.insert(variant.into(), (constructor, config));
    }

    pub fn resolve(&self, variant: &str) -> CustomResult<Arc<dyn Provider>, RegistryError> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| report!(RegistryError::CachePoisoned))?;
        if let Some(provider) = cache.get(variant) {
            return Ok(Arc::clone(provider));
        }

        let (constructor, config) = self
            .entries
            .get(variant)
            .ok_or_else(|| report!(RegistryError::UnknownVariant(variant.to_string())))?;
        tracing::debug!(variant, "constructing provider");
        let provider: Arc<dyn Provider> = constructor(
            config.clone(),
            self.params.clone(),
            Arc::clone(&self.client),
        )
        .change_context(RegistryError::ConstructionFailed(variant.to_string()))?
        .into();
        cache.insert(variant.to_string(), Arc::clone(&provider));
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::atomic::{AtomicUsize, Ordering};

    use common_utils::errors::CustomResult;
    use multipay_domain_models::{
        payment::PaymentHandle,
        types::{RequestView, ResponseDirective},
    };
    use multipay_interfaces::{
        client::{HttpClientError, Response},
        errors::{ImproperlyConfigured, ProviderError},
    };

    use super::*;

    static CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

    struct NullClient;

    impl HttpClient for NullClient {
        fn send(
            &self,
            _request: common_utils::request::Request,
        ) -> CustomResult<Response, HttpClientError> {
            Err(report!(HttpClientError::RequestNotSent))
        }
    }

    struct CountingProvider {
        params: GatewayParams,
    }

    impl Provider for CountingProvider {
        fn gateway_params(&self) -> &GatewayParams {
            &self.params
        }

        fn process_data(
            &self,
            _payment: &mut PaymentHandle<'_>,
            _request: &RequestView,
        ) -> CustomResult<ResponseDirective, ProviderError> {
            Ok(ResponseDirective::ok("OK"))
        }
    }

    fn counting_constructor(
        config: serde_json::Value,
        params: GatewayParams,
        _client: Arc<dyn HttpClient>,
    ) -> CustomResult<Box<dyn Provider>, ImproperlyConfigured> {
        if config.get("fail").is_some() {
            return Err(report!(ImproperlyConfigured::new("unusable options")));
        }
        CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingProvider { params }))
    }

    fn registry() -> ProviderRegistry {
        ProviderRegistry::new(
            GatewayParams::new("http://example.com"),
            Arc::new(NullClient),
        )
    }

    #[test]
    fn resolve_constructs_once_and_caches() {
        let mut registry = registry();
        registry.register("counting", counting_constructor, serde_json::json!({}));

        let before = CONSTRUCTIONS.load(Ordering::SeqCst);
        let first = registry.resolve("counting").unwrap();
        let second = registry.resolve("counting").unwrap();
        assert_eq!(CONSTRUCTIONS.load(Ordering::SeqCst), before + 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn unknown_variant_is_an_error() {
        let registry = registry();
        let err = registry.resolve("nonexistent").err().unwrap();
        assert!(matches!(
            err.current_context(),
            RegistryError::UnknownVariant(variant) if variant == "nonexistent"
        ));
    }

    #[test]
    fn bad_options_fail_at_construction() {
        let mut registry = registry();
        registry.register(
            "broken",
            counting_constructor,
            serde_json::json!({"fail": true}),
        );
        let err = registry.resolve("broken").err().unwrap();
        assert!(matches!(
            err.current_context(),
            RegistryError::ConstructionFailed(_)
        ));
    }
}
