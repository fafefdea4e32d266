//! Host-supplied gateway parameters shared by every provider.

use common_utils::errors::CustomResult;
use error_stack::ResultExt;
use serde::Deserialize;

use crate::errors::ProviderError;

/// Parameters the host resolves once and hands to every provider at
/// construction time.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GatewayParams {
    /// Absolute base URL of the host application, used to turn relative
    /// process URLs into the return URLs handed to PSPs.
    pub base_url: String,
}

impl GatewayParams {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Join the base URL with a relative path and optional query parameters.
    pub fn absolute_url(
        &self,
        path: &str,
        extra: Option<&[(String, String)]>,
    ) -> CustomResult<String, ProviderError> {
        let base = url::Url::parse(&self.base_url)
            .change_context(ProviderError::RequestEncodingFailed)
            .attach_printable("gateway base_url is not an absolute URL")?;
        let mut joined = base
            .join(path)
            .change_context(ProviderError::RequestEncodingFailed)?;
        if let Some(pairs) = extra {
            let mut query = joined.query_pairs_mut();
            for (name, value) in pairs {
                query.append_pair(name, value);
            }
        }
        Ok(joined.to_string())
    }
}
