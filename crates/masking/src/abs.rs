//! Abstract data types.

/// Interface to peek a reference to the inner secret without consuming it.
pub trait PeekInterface<S> {
    /// Expose a reference for viewing.
    fn peek(&self) -> &S;
}

/// Interface that consumes the wrapper and exposes the inner secret.
pub trait ExposeInterface<S> {
    /// Consume the secret and return its inner value.
    fn expose(self) -> S;
}

/// Interface that exposes an optional secret, defaulting when absent.
pub trait ExposeOptionInterface<S> {
    /// Expose the inner value or a default.
    fn expose_option(self) -> S;
}

impl<S> ExposeOptionInterface<Option<S>> for Option<crate::Secret<S>>
where
    S: Clone,
{
    fn expose_option(self) -> Option<S> {
        self.map(ExposeInterface::expose)
    }
}
