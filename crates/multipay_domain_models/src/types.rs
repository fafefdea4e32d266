//! Control-flow types exchanged between providers and the host.

use common_utils::request::Method;

/// One field of a presentation form.
///
/// `value` is `Some` for hidden fields the host renders verbatim and `None`
/// for inputs the buyer must fill in (e.g. card entry).
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FormField {
    pub name: String,
    pub value: Option<String>,
}

impl FormField {
    pub fn hidden(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn input(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// A form the host renders: target URL, submission method and fields.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PaymentForm {
    pub action: String,
    pub method: Method,
    pub fields: Vec<FormField>,
}

impl PaymentForm {
    pub fn new(action: impl Into<String>, method: Method) -> Self {
        Self {
            action: action.into(),
            method,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FormField) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field's rendered value by name.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .and_then(|field| field.value.as_deref())
    }
}

/// Outcome of `get_form`: what the host must do next.
#[derive(Clone, Debug, PartialEq)]
pub enum FormResult {
    /// Render this form to the buyer.
    Present(PaymentForm),
    /// Redirect the buyer's browser to the URL.
    Redirect(String),
    /// Render an auto-submitting form that POSTs to an external URL
    /// (3-D Secure interstitials).
    ExternalPost(PaymentForm),
}

/// Buyer-submitted form data handed back into `get_form`.
#[derive(Clone, Debug, Default)]
pub struct SubmittedForm(std::collections::HashMap<String, String>);

impl SubmittedForm {
    pub fn new(fields: std::collections::HashMap<String, String>) -> Self {
        Self(fields)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for SubmittedForm {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The slice of an inbound HTTP request the dispatcher and providers see.
#[derive(Clone, Debug, Default)]
pub struct RequestView {
    pub method: Option<Method>,
    pub headers: std::collections::HashMap<String, String>,
    pub query: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
    pub body: bytes::Bytes,
}

impl RequestView {
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn form_param(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// What the host should send back to the PSP (or the buyer's browser) after
/// `process_data`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResponseDirective {
    /// Plain HTTP response with a status code and body.
    Response { status_code: u16, body: String },
    /// Redirect the buyer's browser.
    Redirect(String),
}

impl ResponseDirective {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::Response {
            status_code: 200,
            body: body.into(),
        }
    }

    /// Signature verification failure on an inbound callback.
    pub fn forbidden_failed() -> Self {
        Self::Response {
            status_code: 403,
            body: "FAILED".to_string(),
        }
    }

    pub fn not_found() -> Self {
        Self::Response {
            status_code: 404,
            body: String::new(),
        }
    }

    pub fn redirect(url: impl Into<String>) -> Self {
        Self::Redirect(url.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Response { status_code, .. } => *status_code,
            Self::Redirect(_) => 302,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_view_header_lookup_is_case_insensitive() {
        let mut view = RequestView::default();
        view.headers
            .insert("Stripe-Signature".to_string(), "t=1,v1=abc".to_string());
        assert_eq!(view.header("stripe-signature"), Some("t=1,v1=abc"));
    }

    #[test]
    fn form_builder_collects_fields() {
        let form = PaymentForm::new("https://psp.example/pay", Method::Post)
            .field(FormField::hidden("amount", "100.00"))
            .field(FormField::input("number"));
        assert_eq!(form.value_of("amount"), Some("100.00"));
        assert_eq!(form.value_of("number"), None);
        assert_eq!(form.fields.len(), 2);
    }

    #[test]
    fn forbidden_directive_carries_failed_body() {
        let directive = ResponseDirective::forbidden_failed();
        assert_eq!(directive.status_code(), 403);
        assert_eq!(
            directive,
            ResponseDirective::Response {
                status_code: 403,
                body: "FAILED".to_string()
            }
        );
    }
}
