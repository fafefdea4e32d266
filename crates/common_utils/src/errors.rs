//! Errors and error specific types for universal use

/// A custom datatype that wraps the error variant `<E>` into a report,
/// allowing [`error_stack::Report<E>`] specific extendability.
///
/// Effectively, equivalent to `Result<T, error_stack::Report<E>>`.
pub type CustomResult<T, E> = error_stack::Result<T, E>;

/// Parsing errors.
#[derive(Debug, thiserror::Error)]
pub enum ParsingError {
    /// Failed to parse the given value into the named structure.
    #[error("Failed to parse {0}")]
    StructParseFailure(&'static str),
    /// Failed to serialize the named structure.
    #[error("Failed to serialize to {0}")]
    EncodeError(&'static str),
}

/// Validation errors.
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The provided input is missing a required field.
    #[error("Missing required field: {field_name}")]
    MissingRequiredField { field_name: String },

    /// An incorrect value was provided for the field specified by `field_name`.
    #[error("Incorrect value provided for field: {field_name}")]
    IncorrectValueProvided { field_name: &'static str },

    /// An invalid input was provided.
    #[error("{message}")]
    InvalidValue { message: String },
}

/// Cryptographic algorithm errors
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The cryptographic algorithm was unable to encode the message
    #[error("Failed to encode given message")]
    EncodingFailed,
    /// The cryptographic algorithm was unable to decode the message
    #[error("Failed to decode given message")]
    DecodingFailed,
    /// The cryptographic algorithm was unable to sign the message
    #[error("Failed to sign message")]
    MessageSigningFailed,
    /// The cryptographic algorithm was unable to verify the given signature
    #[error("Failed to verify signature")]
    SignatureVerificationFailed,
    /// A signed envelope outlived its maximum age
    #[error("Signed envelope has expired")]
    EnvelopeExpired,
}
