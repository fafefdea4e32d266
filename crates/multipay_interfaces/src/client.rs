//! HTTP client abstraction used for every outbound PSP call.
//!
//! Providers build [`Request`]s and hand them to an [`HttpClient`]; tests
//! substitute scripted clients so no network is involved.

use std::time::Duration;

use common_utils::{
    consts,
    errors::CustomResult,
    request::{Method, Request, RequestContent},
};
use error_stack::ResultExt;
use masking::Maskable;

/// A raw response from a payment service provider.
#[derive(Clone, Debug)]
pub struct Response {
    pub status_code: u16,
    pub response: bytes::Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    #[error("Failed to construct the HTTP client")]
    ClientConstructionFailed,
    #[error("Failed to send the request to the payment service provider")]
    RequestNotSent,
    #[error("Failed to read the response body")]
    ResponseDecodingFailed,
}

/// Blocking HTTP transport. Every call is bounded by the client's timeout;
/// a timeout surfaces as [`HttpClientError::RequestNotSent`].
pub trait HttpClient: Send + Sync {
    fn send(&self, request: Request) -> CustomResult<Response, HttpClientError>;
}

/// [`reqwest`]-backed client with a 30 second request timeout.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    pub fn new() -> CustomResult<Self, HttpClientError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(consts::REQUEST_TIMEOUT_SECS))
            .build()
            .change_context(HttpClientError::ClientConstructionFailed)?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn send(&self, request: Request) -> CustomResult<Response, HttpClientError> {
        tracing::debug!(method = %request.method, url = %request.url, "outbound PSP call");
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in request.headers {
            let value = match value {
                Maskable::Masked(secret) => masking::ExposeInterface::expose(secret),
                Maskable::Normal(value) => value,
            };
            builder = builder.header(name, value);
        }
        builder = match request.body {
            Some(RequestContent::Json(payload)) => builder.json(&payload),
            Some(RequestContent::FormUrlEncoded(pairs)) => builder.form(&pairs),
            None => builder,
        };

        let response = builder.send().map_err(|err| {
            tracing::warn!(error = %err, "PSP call failed to complete");
            err
        })
        .change_context(HttpClientError::RequestNotSent)?;
        let status_code = response.status().as_u16();
        let body = response
            .bytes()
            .change_context(HttpClientError::ResponseDecodingFailed)?;
        Ok(Response {
            status_code,
            response: body,
        })
    }
}
