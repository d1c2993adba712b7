//! # warden-signals
//!
//! Signal dispatcher for warden. Provides a decoupled event system so that
//! applications can react to token lifecycle events (reset instructions sent,
//! password reset, email confirmed, ...) without the token flows knowing
//! about them.
//!
//! Signals are owned by whoever fires them. There is no process-wide registry:
//! a [`TokenSignals`] lives inside each token service.
//!
//! ## Usage
//!
//! ```
//! use warden_signals::{Signal, UserEvent};
//! use std::sync::Arc;
//!
//! let signal: Signal<UserEvent> = Signal::named("password_reset");
//!
//! signal.connect("audit", Arc::new(|event: &UserEvent| {
//!     println!("password reset for {}", event.email);
//!     None
//! }));
//!
//! let results = signal.send(&UserEvent { user_id: 1, email: "matt@lp.com".into() });
//! assert_eq!(results.len(), 1);
//! ```

use std::any::Any;
use std::sync::{Arc, PoisonError, RwLock};

/// The type signature for a signal receiver callback.
///
/// Receivers accept a reference to the signal payload and may optionally
/// return a boxed value. Receivers must be `Send + Sync` so that signals
/// can be dispatched from any thread.
pub type SignalReceiver<T> = Arc<dyn Fn(&T) -> Option<Box<dyn Any + Send>> + Send + Sync>;

/// A signal that can be connected to and dispatched.
///
/// Each signal carries a payload type `T`. Receivers are called in the order
/// they were connected.
///
/// # Examples
///
/// ```
/// use warden_signals::Signal;
/// use std::sync::Arc;
///
/// let signal: Signal<String> = Signal::new();
///
/// signal.connect("logger", Arc::new(|msg: &String| {
///     println!("Received: {msg}");
///     None
/// }));
///
/// signal.send(&"hello".to_string());
/// ```
pub struct Signal<T: 'static> {
    name: &'static str,
    receivers: RwLock<Vec<(String, SignalReceiver<T>)>>,
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("receivers", &self.receiver_count())
            .finish()
    }
}

impl<T: 'static> Signal<T> {
    /// Creates a new anonymous signal with no connected receivers.
    pub fn new() -> Self {
        Self::named("anonymous")
    }

    /// Creates a new signal whose name appears in dispatch logs.
    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            receivers: RwLock::new(Vec::new()),
        }
    }

    /// The signal's name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Connects a receiver to this signal.
    ///
    /// The `receiver_id` is used to identify the receiver for later disconnection.
    /// If a receiver with the same ID is already connected, it is replaced.
    pub fn connect(&self, receiver_id: impl Into<String>, callback: SignalReceiver<T>) {
        let id = receiver_id.into();
        let mut receivers = self.receivers.write().unwrap_or_else(PoisonError::into_inner);

        // Replace if already connected with this ID
        if let Some(entry) = receivers.iter_mut().find(|(rid, _)| *rid == id) {
            entry.1 = callback;
        } else {
            receivers.push((id, callback));
        }
    }

    /// Disconnects the receiver with the given ID.
    ///
    /// Returns `true` if a receiver was found and removed.
    pub fn disconnect(&self, receiver_id: &str) -> bool {
        let mut receivers = self.receivers.write().unwrap_or_else(PoisonError::into_inner);
        let len_before = receivers.len();
        receivers.retain(|(id, _)| id != receiver_id);
        receivers.len() < len_before
    }

    /// Sends the signal to all connected receivers.
    ///
    /// Receivers are called in connection order. Returns a vector of the
    /// return values from each receiver.
    pub fn send(&self, sender: &T) -> Vec<Option<Box<dyn Any + Send>>> {
        // Snapshot so a receiver may connect or disconnect without deadlocking.
        let receivers: Vec<SignalReceiver<T>> = self
            .receivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        tracing::debug!(signal = self.name, receivers = receivers.len(), "Dispatching signal");
        receivers.iter().map(|callback| callback(sender)).collect()
    }

    /// Returns the number of connected receivers.
    pub fn receiver_count(&self) -> usize {
        self.receivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

// ── Event payloads ───────────────────────────────────────────────────

/// An event about one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEvent {
    /// The user's identity reference.
    pub user_id: u64,
    /// The user's email at the time of the event.
    pub email: String,
}

/// An event that carries a freshly issued token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEvent {
    /// The user's identity reference.
    pub user_id: u64,
    /// The user's email at the time of the event.
    pub email: String,
    /// The issued token string.
    pub token: String,
}

// ── Registry ─────────────────────────────────────────────────────────

/// The signals fired by the token flows.
///
/// # Examples
///
/// ```
/// use warden_signals::{TokenSignals, UserEvent};
/// use std::sync::Arc;
///
/// let signals = TokenSignals::new();
/// signals.user_confirmed.connect("welcome", Arc::new(|_: &UserEvent| None));
/// assert_eq!(signals.user_confirmed.receiver_count(), 1);
/// ```
#[derive(Debug)]
pub struct TokenSignals {
    /// Fired after password-reset instructions were sent.
    pub reset_password_instructions_sent: Signal<TokenEvent>,
    /// Fired after a password was reset through a reset token.
    pub password_reset: Signal<UserEvent>,
    /// Fired after confirmation instructions were sent.
    pub confirm_instructions_sent: Signal<TokenEvent>,
    /// Fired after a user confirmed their email.
    pub user_confirmed: Signal<UserEvent>,
    /// Fired after an authenticated password change.
    pub password_changed: Signal<UserEvent>,
    /// Fired after an account was created.
    pub user_created: Signal<UserEvent>,
    /// Fired after an auth token was issued.
    pub auth_token_issued: Signal<TokenEvent>,
}

impl Default for TokenSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSignals {
    /// Creates a registry with no receivers connected.
    pub fn new() -> Self {
        Self {
            reset_password_instructions_sent: Signal::named("reset_password_instructions_sent"),
            password_reset: Signal::named("password_reset"),
            confirm_instructions_sent: Signal::named("confirm_instructions_sent"),
            user_confirmed: Signal::named("user_confirmed"),
            password_changed: Signal::named("password_changed"),
            user_created: Signal::named("user_created"),
            auth_token_issued: Signal::named("auth_token_issued"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_signal_connect_and_send() {
        let signal: Signal<String> = Signal::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();

        signal.connect(
            "counter",
            Arc::new(move |_: &String| {
                count_clone.fetch_add(1, Ordering::SeqCst);
                None
            }),
        );

        let results = signal.send(&"hello".to_string());
        assert_eq!(results.len(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_signal_multiple_receivers() {
        let signal: Signal<i32> = Signal::new();
        let count = Arc::new(AtomicUsize::new(0));

        for i in 0..3 {
            let c = count.clone();
            signal.connect(
                format!("receiver_{i}"),
                Arc::new(move |_: &i32| {
                    c.fetch_add(1, Ordering::SeqCst);
                    None
                }),
            );
        }

        assert_eq!(signal.receiver_count(), 3);

        let results = signal.send(&42);
        assert_eq!(results.len(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_signal_disconnect() {
        let signal: Signal<()> = Signal::new();

        signal.connect("a", Arc::new(|(): &()| None));
        signal.connect("b", Arc::new(|(): &()| None));
        assert_eq!(signal.receiver_count(), 2);

        assert!(signal.disconnect("a"));
        assert_eq!(signal.receiver_count(), 1);

        assert!(!signal.disconnect("nonexistent"));
        assert_eq!(signal.receiver_count(), 1);
    }

    #[test]
    fn test_signal_replace_receiver() {
        let signal: Signal<()> = Signal::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();

        signal.connect("handler", Arc::new(|(): &()| None));
        signal.connect(
            "handler",
            Arc::new(move |(): &()| {
                count_clone.fetch_add(1, Ordering::SeqCst);
                None
            }),
        );

        assert_eq!(signal.receiver_count(), 1);
        signal.send(&());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_signal_return_values() {
        let signal: Signal<i32> = Signal::new();

        signal.connect(
            "doubler",
            Arc::new(|val: &i32| Some(Box::new(val * 2) as Box<dyn Any + Send>)),
        );
        signal.connect("none", Arc::new(|_: &i32| None));

        let results = signal.send(&21);
        assert_eq!(results.len(), 2);

        let first = results[0].as_ref().unwrap();
        let doubled = first.downcast_ref::<i32>().unwrap();
        assert_eq!(*doubled, 42);

        assert!(results[1].is_none());
    }

    #[test]
    fn test_empty_signal_send() {
        let signal: Signal<()> = Signal::new();
        let results = signal.send(&());
        assert!(results.is_empty());
    }

    #[test]
    fn test_receiver_may_disconnect_itself() {
        let signal: Arc<Signal<()>> = Arc::new(Signal::new());
        let weak = Arc::downgrade(&signal);
        signal.connect(
            "once",
            Arc::new(move |(): &()| {
                if let Some(signal) = weak.upgrade() {
                    signal.disconnect("once");
                }
                None
            }),
        );

        assert_eq!(signal.send(&()).len(), 1);
        assert_eq!(signal.receiver_count(), 0);
    }

    #[test]
    fn test_signal_names() {
        let signals = TokenSignals::new();
        assert_eq!(signals.password_reset.name(), "password_reset");
        assert_eq!(signals.auth_token_issued.name(), "auth_token_issued");
        assert_eq!(Signal::<()>::default().name(), "anonymous");
    }

    #[test]
    fn test_registries_are_independent() {
        let a = TokenSignals::new();
        let b = TokenSignals::default();
        a.user_created.connect("x", Arc::new(|_: &UserEvent| None));
        assert_eq!(a.user_created.receiver_count(), 1);
        assert_eq!(b.user_created.receiver_count(), 0);
    }
}
