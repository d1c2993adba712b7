//! Integration tests for the signal dispatch system.
//!
//! Tests cover: connect/send, disconnect, ordering, payload delivery through
//! the token registry, and receivers returning values.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use warden_signals::{Signal, TokenEvent, TokenSignals, UserEvent};

fn matt() -> UserEvent {
    UserEvent {
        user_id: 1,
        email: "matt@lp.com".to_string(),
    }
}

// ═════════════════════════════════════════════════════════════════════
// 1. Signal connect and send: handler receives data
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_signal_connect_and_send_receives_data() {
    let signal: Signal<String> = Signal::new();
    let received = Arc::new(Mutex::new(String::new()));
    let received_clone = received.clone();

    signal.connect(
        "capture",
        Arc::new(move |msg: &String| {
            *received_clone.lock().unwrap() = msg.clone();
            None
        }),
    );

    signal.send(&"hello world".to_string());
    assert_eq!(*received.lock().unwrap(), "hello world");
}

// ═════════════════════════════════════════════════════════════════════
// 2. Signal disconnect: handler stops firing
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_signal_disconnect_stops_handler() {
    let signals = TokenSignals::new();
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();

    signals.password_reset.connect(
        "counter",
        Arc::new(move |_: &UserEvent| {
            c.fetch_add(1, Ordering::SeqCst);
            None
        }),
    );

    signals.password_reset.send(&matt());
    assert_eq!(count.load(Ordering::SeqCst), 1);

    assert!(signals.password_reset.disconnect("counter"));
    signals.password_reset.send(&matt());
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

// ═════════════════════════════════════════════════════════════════════
// 3. Multiple handlers fire in registration order
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_handlers_fire_in_registration_order() {
    let signal: Signal<UserEvent> = Signal::named("user_confirmed");
    let order = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second", "third"] {
        let o = order.clone();
        signal.connect(
            name,
            Arc::new(move |_: &UserEvent| {
                o.lock().unwrap().push(name);
                None
            }),
        );
    }

    signal.send(&matt());
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}

// ═════════════════════════════════════════════════════════════════════
// 4. Token events carry the issued token
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_instructions_sent_carries_token() {
    let signals = TokenSignals::new();
    let captured: Arc<Mutex<Vec<TokenEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let cap = captured.clone();

    signals.reset_password_instructions_sent.connect(
        "capture",
        Arc::new(move |event: &TokenEvent| {
            cap.lock().unwrap().push(event.clone());
            None
        }),
    );

    signals.reset_password_instructions_sent.send(&TokenEvent {
        user_id: 1,
        email: "matt@lp.com".to_string(),
        token: "abc.def.ghi".to_string(),
    });

    let captured = captured.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].email, "matt@lp.com");
    assert_eq!(captured[0].token, "abc.def.ghi");
}

// ═════════════════════════════════════════════════════════════════════
// 5. Signals in one registry do not leak into another
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_signals_are_isolated_per_event() {
    let signals = TokenSignals::new();
    let fired = Arc::new(AtomicBool::new(false));
    let f = fired.clone();

    signals.user_created.connect(
        "flag",
        Arc::new(move |_: &UserEvent| {
            f.store(true, Ordering::SeqCst);
            None
        }),
    );

    signals.password_changed.send(&matt());
    assert!(!fired.load(Ordering::SeqCst));

    signals.user_created.send(&matt());
    assert!(fired.load(Ordering::SeqCst));
}

// ═════════════════════════════════════════════════════════════════════
// 6. Handler return values are collected in order
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_handler_return_values_collected() {
    let signal: Signal<UserEvent> = Signal::new();
    let first_ran = Arc::new(AtomicBool::new(false));
    let third_ran = Arc::new(AtomicBool::new(false));

    let f = first_ran.clone();
    signal.connect(
        "first",
        Arc::new(move |_: &UserEvent| {
            f.store(true, Ordering::SeqCst);
            None
        }),
    );
    signal.connect(
        "second",
        Arc::new(|event: &UserEvent| Some(Box::new(event.user_id * 10) as Box<dyn Any + Send>)),
    );
    let t = third_ran.clone();
    signal.connect(
        "third",
        Arc::new(move |_: &UserEvent| {
            t.store(true, Ordering::SeqCst);
            None
        }),
    );

    let results = signal.send(&matt());
    assert_eq!(results.len(), 3);
    assert!(first_ran.load(Ordering::SeqCst));
    assert!(third_ran.load(Ordering::SeqCst));
    assert_eq!(
        results[1].as_ref().unwrap().downcast_ref::<u64>(),
        Some(&10)
    );
}
