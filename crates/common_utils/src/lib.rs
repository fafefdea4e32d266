//! Utilities shared by the payment orchestration crates.

pub mod consts;
pub mod crypto;
pub mod errors;
pub mod ext_traits;
pub mod request;
pub mod types;

/// Date and time helpers built on the [`time`] crate.
pub mod date_time {
    use time::OffsetDateTime;

    /// Current UTC time.
    pub fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    /// Current unix timestamp in seconds.
    pub fn now_unix_timestamp() -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }
}

/// Generate an RFC-4122 payment token (36 characters, hyphenated v4 UUID).
pub fn generate_payment_token() -> String {
    uuid::Uuid::new_v4().to_string()
}
