//! Snapshot isolation in the thread-safe regime.

#![allow(clippy::expect_used, missing_docs)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use chorus_dispatch::broadcast::{ConfinedBroadcast, SharedBroadcast};
use chorus_testkit::RecordingLog;

#[test]
fn a_firing_in_progress_keeps_its_snapshot() {
    let event = Arc::new(SharedBroadcast::<()>::new());
    let log = RecordingLog::new();

    let entered = Arc::new(AtomicBool::new(false));
    let release = Arc::new(AtomicBool::new(false));

    let gate_entered = entered.clone();
    let gate_release = release.clone();
    let first = log.clone();
    event.register(move |_: &()| {
        gate_entered.store(true, Ordering::SeqCst);
        while !gate_release.load(Ordering::SeqCst) {
            thread::yield_now();
        }
        first.push("one");
    });
    let second = log.clone();
    event.register(move |_: &()| second.push("two"));

    let firing = {
        let event = event.clone();
        thread::spawn(move || event.fire(()))
    };
    while !entered.load(Ordering::SeqCst) {
        thread::yield_now();
    }

    // Mutate while the fire is parked inside its first handler.
    let third = log.clone();
    event.register(move |_: &()| third.push("three"));
    release.store(true, Ordering::SeqCst);
    firing.join().expect("firing thread should not panic");

    // The in-flight firing used the handler set from its start.
    assert_eq!(log.snapshot(), vec!["one", "two"]);

    // The next firing sees the enlarged set.
    event.fire(());
    assert_eq!(log.snapshot(), vec!["one", "two", "one", "two", "three"]);
}

#[test]
fn shared_invokers_capture_the_snapshot_at_fetch_time() {
    let event = SharedBroadcast::<()>::new();
    let log = RecordingLog::new();

    let a = log.clone();
    event.register(move |_: &()| a.push("a"));
    let stale = event.invoker();

    let b = log.clone();
    event.register(move |_: &()| b.push("b"));

    stale.fire(());
    assert_eq!(log.snapshot(), vec!["a"]);

    event.invoker().fire(());
    assert_eq!(log.snapshot(), vec!["a", "a", "b"]);
}

#[test]
fn confined_invokers_observe_the_live_state() {
    let event = ConfinedBroadcast::<()>::new();
    let invoker = event.invoker();

    let log = RecordingLog::new();
    let sink = log.clone();
    event.register(move |_: &()| sink.push(())).expect("register");

    // The invoker was fetched before the registration and still sees it.
    invoker.fire(()).expect("fire");
    assert_eq!(log.len(), 1);
}

#[test]
fn mutation_never_blocks_on_a_parked_firing() {
    let event = Arc::new(SharedBroadcast::<()>::new());

    let entered = Arc::new(AtomicBool::new(false));
    let release = Arc::new(AtomicBool::new(false));
    let gate_entered = entered.clone();
    let gate_release = release.clone();
    event.register(move |_: &()| {
        gate_entered.store(true, Ordering::SeqCst);
        while !gate_release.load(Ordering::SeqCst) {
            thread::yield_now();
        }
    });

    let firing = {
        let event = event.clone();
        thread::spawn(move || event.fire(()))
    };
    while !entered.load(Ordering::SeqCst) {
        thread::yield_now();
    }

    // Register and unregister complete while the fire is parked; if they
    // blocked on the firing this test would deadlock.
    let key = event.register(|_: &()| {});
    event.unregister(key);

    release.store(true, Ordering::SeqCst);
    firing.join().expect("firing thread should not panic");
}
