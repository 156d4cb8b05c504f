//! Thread-confinement enforcement and live-list dispatch semantics.

#![allow(clippy::expect_used, missing_docs)]

use std::sync::Arc;
use std::thread;

use chorus_dispatch::broadcast::ConfinedBroadcast;
use chorus_dispatch::chain::ConfinedChain;
use chorus_dispatch::{EventError, Key};
use chorus_testkit::RecordingLog;

#[test]
fn off_thread_register_fails_with_a_state_error() {
    let event = Arc::new(ConfinedBroadcast::<()>::new());
    let remote = event.clone();

    let result = thread::spawn(move || remote.register(|_: &()| {}))
        .join()
        .expect("thread should not panic");
    assert!(matches!(result, Err(EventError::WrongThread { .. })));
}

#[test]
fn off_thread_unregister_clear_and_fire_all_fail() {
    let event = Arc::new(ConfinedBroadcast::<()>::new());
    let key = event.register(|_: &()| {}).expect("register");

    let remote = event.clone();
    let (unregistered, cleared, fired) = thread::spawn(move || {
        (remote.unregister(key), remote.clear(), remote.fire(()))
    })
    .join()
    .expect("thread should not panic");

    assert!(matches!(unregistered, Err(EventError::WrongThread { .. })));
    assert!(matches!(cleared, Err(EventError::WrongThread { .. })));
    assert!(matches!(fired, Err(EventError::WrongThread { .. })));

    // The owning thread is unaffected by the rejected calls.
    event.fire(()).expect("fire on the owning thread");
}

#[test]
fn off_thread_chain_access_fails_too() {
    let event = Arc::new(ConfinedChain::<i32>::new());
    let remote = event.clone();

    let result = thread::spawn(move || remote.fire(1))
        .join()
        .expect("thread should not panic");
    assert!(matches!(result, Err(EventError::WrongThread { .. })));
}

#[test]
fn handler_registered_mid_fire_joins_the_same_pass() {
    let event = Arc::new(ConfinedBroadcast::<()>::new());
    let log = RecordingLog::new();

    let inner = event.clone();
    let first = log.clone();
    let late = log.clone();
    event
        .register(move |_: &()| {
            first.push("first");
            let log = late.clone();
            inner
                .register(move |_: &()| log.push("late"))
                .expect("mid-fire register");
        })
        .expect("register");

    event.fire(()).expect("fire");
    // The live list is re-read each step, so the appended handler was
    // visited by the same firing.
    assert_eq!(log.snapshot(), vec!["first", "late"]);
}

#[test]
fn unregister_mid_fire_skips_the_removed_handler() {
    let event = Arc::new(ConfinedBroadcast::<()>::new());
    let log = RecordingLog::new();
    let victim = Key::new();

    let inner = event.clone();
    let remover_log = log.clone();
    event
        .register(move |_: &()| {
            remover_log.push("remover");
            inner.unregister(victim).expect("mid-fire unregister");
        })
        .expect("register remover");

    let victim_log = log.clone();
    event
        .register_keyed(move |_: &()| victim_log.push("victim"), victim)
        .expect("register victim");

    event.fire(()).expect("fire");
    // The live list is re-read each step, so the entry removed behind the
    // cursor never ran.
    assert_eq!(log.snapshot(), vec!["remover"]);
}
