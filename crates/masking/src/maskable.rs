//! A wrapper for values that may or may not be sensitive, used primarily for
//! HTTP header values.

use crate::{ExposeInterface, PeekInterface, Secret};

/// Either a masked (secret) value or a plain one.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Maskable<T: Eq + PartialEq + Clone> {
    /// The value is sensitive and is kept inside a [`Secret`].
    Masked(Secret<T>),
    /// The value is not sensitive.
    Normal(T),
}

impl<T: Eq + PartialEq + Clone> Maskable<T> {
    /// Construct a masked variant.
    pub fn new_masked(value: Secret<T>) -> Self {
        Self::Masked(value)
    }

    /// Construct a plain variant.
    pub fn new_normal(value: T) -> Self {
        Self::Normal(value)
    }

    /// Whether the value is masked.
    pub fn is_masked(&self) -> bool {
        matches!(self, Self::Masked(_))
    }

    /// Borrow the inner value regardless of masking.
    pub fn peek_inner(&self) -> &T {
        match self {
            Self::Masked(secret) => secret.peek(),
            Self::Normal(value) => value,
        }
    }

    /// Consume the wrapper and return the inner value regardless of masking.
    pub fn into_inner(self) -> T {
        match self {
            Self::Masked(secret) => secret.expose(),
            Self::Normal(value) => value,
        }
    }
}

impl<T: Eq + PartialEq + Clone> From<T> for Maskable<T> {
    fn from(value: T) -> Self {
        Self::new_normal(value)
    }
}

impl From<&str> for Maskable<String> {
    fn from(value: &str) -> Self {
        Self::new_normal(value.to_string())
    }
}

/// Trait for converting a value into a masked [`Maskable`].
pub trait Mask {
    /// The wrapped type.
    type Output: Eq + Clone + PartialEq;

    /// Wrap the value as masked.
    fn into_masked(self) -> Maskable<Self::Output>;
}

impl Mask for String {
    type Output = Self;

    fn into_masked(self) -> Maskable<Self::Output> {
        Maskable::new_masked(Secret::new(self))
    }
}

impl Mask for Secret<String> {
    type Output = String;

    fn into_masked(self) -> Maskable<Self::Output> {
        Maskable::new_masked(self)
    }
}
