//! Structure describing secret.

use std::{fmt, marker::PhantomData};

use crate::{
    abs::{ExposeInterface, PeekInterface},
    strategy::Strategy,
    WithType,
};

/// Secret thing.
///
/// To get access to the value use [`PeekInterface::peek`] for a reference or
/// [`ExposeInterface::expose`] to consume the wrapper. The second generic
/// parameter selects the masking [`Strategy`] used when formatting.
pub struct Secret<S, I = WithType>
where
    I: Strategy<S>,
{
    inner_secret: S,
    marker: PhantomData<I>,
}

impl<S, I> Secret<S, I>
where
    I: Strategy<S>,
{
    /// Take ownership of a secret value.
    pub fn new(secret: S) -> Self {
        Self {
            inner_secret: secret,
            marker: PhantomData,
        }
    }

    /// Transform the inner secret, keeping it wrapped.
    pub fn map<T>(self, f: impl FnOnce(S) -> T) -> Secret<T>
    where
        WithType: Strategy<T>,
    {
        Secret::new(f(self.inner_secret))
    }
}

impl<S, I> PeekInterface<S> for Secret<S, I>
where
    I: Strategy<S>,
{
    fn peek(&self) -> &S {
        &self.inner_secret
    }
}

impl<S, I> ExposeInterface<S> for Secret<S, I>
where
    I: Strategy<S>,
{
    fn expose(self) -> S {
        self.inner_secret
    }
}

impl<S, I> From<S> for Secret<S, I>
where
    I: Strategy<S>,
{
    fn from(secret: S) -> Self {
        Self::new(secret)
    }
}

impl<I> From<&str> for Secret<String, I>
where
    I: Strategy<String>,
{
    fn from(secret: &str) -> Self {
        Self::new(secret.to_string())
    }
}

impl<S, I> Clone for Secret<S, I>
where
    S: Clone,
    I: Strategy<S>,
{
    fn clone(&self) -> Self {
        Self {
            inner_secret: self.inner_secret.clone(),
            marker: PhantomData,
        }
    }
}

impl<S, I> PartialEq for Secret<S, I>
where
    S: PartialEq,
    I: Strategy<S>,
{
    fn eq(&self, other: &Self) -> bool {
        self.peek().eq(other.peek())
    }
}

impl<S, I> Eq for Secret<S, I>
where
    S: Eq,
    I: Strategy<S>,
{
}

impl<S, I> std::hash::Hash for Secret<S, I>
where
    S: std::hash::Hash,
    I: Strategy<S>,
{
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner_secret.hash(state);
    }
}

impl<S, I> fmt::Debug for Secret<S, I>
where
    I: Strategy<S>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        I::fmt(&self.inner_secret, f)
    }
}

impl<S, I> Default for Secret<S, I>
where
    S: Default,
    I: Strategy<S>,
{
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S, I> serde::Serialize for Secret<S, I>
where
    S: serde::Serialize,
    I: Strategy<S>,
{
    fn serialize<T: serde::Serializer>(&self, serializer: T) -> Result<T::Ok, T::Error> {
        self.peek().serialize(serializer)
    }
}

impl<'de, S, I> serde::Deserialize<'de> for Secret<S, I>
where
    S: serde::Deserialize<'de>,
    I: Strategy<S>,
{
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        S::deserialize(deserializer).map(Self::new)
    }
}
