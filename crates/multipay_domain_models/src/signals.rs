//! Status-change notifications.

use std::sync::Mutex;

use common_enums::PaymentStatus;

/// Payload delivered to observers when a payment changes status.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusChanged {
    pub token: String,
    pub old_status: PaymentStatus,
    pub new_status: PaymentStatus,
}

type Observer = Box<dyn Fn(&StatusChanged) + Send + Sync>;

/// Engine-scoped observer registry.
///
/// Observers are registered once at setup time; emission happens on every
/// successful status transition and never on a no-op write.
#[derive(Default)]
pub struct SignalHub {
    observers: Mutex<Vec<Observer>>,
}

impl SignalHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for status-changed events.
    pub fn subscribe(&self, observer: impl Fn(&StatusChanged) + Send + Sync + 'static) {
        if let Ok(mut observers) = self.observers.lock() {
            observers.push(Box::new(observer));
        }
    }

    /// Deliver an event to every registered observer.
    pub fn emit(&self, event: &StatusChanged) {
        if let Ok(observers) = self.observers.lock() {
            for observer in observers.iter() {
                observer(event);
            }
        }
    }
}

impl std::fmt::Debug for SignalHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.observers.lock().map(|o| o.len()).unwrap_or_default();
        f.debug_struct("SignalHub").field("observers", &count).finish()
    }
}
