//! Outbound request types used by every provider integration.

use masking::Maskable;
use serde::{Deserialize, Serialize};

/// Header set for an outbound request. Values may be masked so that logging
/// a request never leaks credentials.
pub type Headers = std::collections::HashSet<(String, Maskable<String>)>;

/// HTTP method of an outbound or inbound request.
#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// Content type of an outbound request body.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum ContentType {
    Json,
    FormUrlEncoded,
}

/// Body of an outbound request.
///
/// Json bodies are already-serialized [`serde_json::Value`]s built by the
/// provider transformers; form bodies are ordered key/value pairs.
#[derive(Clone)]
pub enum RequestContent {
    Json(serde_json::Value),
    FormUrlEncoded(Vec<(String, String)>),
}

impl std::fmt::Debug for RequestContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Json(_) => "JsonRequestBody",
            Self::FormUrlEncoded(_) => "FormUrlEncodedRequestBody",
        })
    }
}

/// An outbound request to a payment service provider.
#[derive(Debug)]
pub struct Request {
    pub url: String,
    pub headers: Headers,
    pub method: Method,
    pub body: Option<RequestContent>,
}

impl Request {
    /// Creates a new request with the specified HTTP method and URL.
    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: String::from(url),
            headers: std::collections::HashSet::new(),
            body: None,
        }
    }

    /// Sets the body of the request.
    pub fn set_body<T: Into<RequestContent>>(&mut self, body: T) {
        self.body.replace(body.into());
    }

    /// Adds a new header. If the header already exists, its value is updated.
    pub fn add_header(&mut self, header: &str, value: Maskable<String>) {
        self.headers.insert((String::from(header), value));
    }
}

impl From<serde_json::Value> for RequestContent {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<Vec<(String, String)>> for RequestContent {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::FormUrlEncoded(pairs)
    }
}

/// Builder for [`Request`].
#[derive(Debug)]
pub struct RequestBuilder {
    pub url: String,
    pub headers: Headers,
    pub method: Method,
    pub body: Option<RequestContent>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: Method::Get,
            url: String::with_capacity(1024),
            headers: std::collections::HashSet::new(),
            body: None,
        }
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = url.into();
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, header: &str, value: &str) -> Self {
        self.headers.insert((header.into(), value.into()));
        self
    }

    pub fn headers(mut self, headers: Vec<(String, Maskable<String>)>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn set_body<T: Into<RequestContent>>(mut self, body: T) -> Self {
        self.body.replace(body.into());
        self
    }

    pub fn build(self) -> Request {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
