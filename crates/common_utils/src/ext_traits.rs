//! Extension traits for foreign types.

use error_stack::ResultExt;
use serde::de::DeserializeOwned;

use crate::errors::{CustomResult, ParsingError, ValidationError};

/// Extension trait for parsing response bodies.
pub trait BytesExt {
    /// Parse the bytes as JSON into `T`, naming the target type in the error.
    fn parse_struct<T>(&self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: DeserializeOwned;
}

impl BytesExt for bytes::Bytes {
    fn parse_struct<T>(&self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(self)
            .change_context(ParsingError::StructParseFailure(type_name))
            .attach_printable_lazy(|| {
                format!("Unable to parse {type_name} from the response body")
            })
    }
}

/// Extension trait for re-shaping [`serde_json::Value`].
pub trait ValueExt {
    /// Deserialize the value into `T`, naming the target type in the error.
    fn parse_value<T>(self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: DeserializeOwned;
}

impl ValueExt for serde_json::Value {
    fn parse_value<T>(self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(self).change_context(ParsingError::StructParseFailure(type_name))
    }
}

/// Extension trait for unwrapping optional values that are required.
pub trait OptionExt<T> {
    /// Return the value or a `MissingRequiredField` validation error.
    fn get_required_value(self, field_name: &'static str) -> CustomResult<T, ValidationError>;
}

impl<T> OptionExt<T> for Option<T> {
    fn get_required_value(self, field_name: &'static str) -> CustomResult<T, ValidationError> {
        self.ok_or_else(|| {
            error_stack::report!(ValidationError::MissingRequiredField {
                field_name: field_name.to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Reply {
        id: String,
    }

    #[test]
    fn parse_struct_reads_json_bodies() {
        let body = bytes::Bytes::from_static(b"{\"id\":\"T1\"}");
        let reply: Reply = body.parse_struct("Reply").ok().unwrap_or(Reply {
            id: String::new(),
        });
        assert_eq!(reply.id, "T1");
    }

    #[test]
    fn parse_struct_names_the_type_on_failure() {
        let body = bytes::Bytes::from_static(b"not json");
        assert!(body.parse_struct::<Reply>("Reply").is_err());
    }

    #[test]
    fn get_required_value_fails_on_none() {
        let value: Option<u32> = None;
        assert!(value.get_required_value("amount").is_err());
    }
}
