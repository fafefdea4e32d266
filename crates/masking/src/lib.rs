#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Wrapper types and traits for secret management, inspired by secrecy.
//!
//! Values wrapped in [`Secret`] never appear in `Debug` or `Display` output;
//! access to the inner value is explicit through [`PeekInterface`] or
//! [`ExposeInterface`].

mod abs;
mod maskable;
mod secret;
mod strategy;

pub use abs::{ExposeInterface, ExposeOptionInterface, PeekInterface};
pub use maskable::{Mask, Maskable};
pub use secret::Secret;
pub use strategy::{Strategy, WithType, WithoutType};

/// This module should be included with asterisk.
///
/// `use masking::prelude::*;`
pub mod prelude {
    pub use super::{ExposeInterface, ExposeOptionInterface, PeekInterface};
}
