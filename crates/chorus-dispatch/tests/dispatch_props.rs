//! Property tests for dispatch semantics.

#![allow(clippy::expect_used, missing_docs)]

use chorus_dispatch::broadcast::SharedBroadcast;
use chorus_dispatch::chain::SharedChain;
use chorus_dispatch::reduce::SharedReduce;
use chorus_testkit::RecordingLog;
use proptest::prelude::*;

proptest! {
    #[test]
    fn broadcast_visits_handlers_in_registration_order(
        ids in proptest::collection::vec(any::<u16>(), 0..32),
    ) {
        let event = SharedBroadcast::<()>::new();
        let log = RecordingLog::new();
        for id in ids.clone() {
            let log = log.clone();
            event.register(move |_: &()| log.push(id));
        }

        event.fire(());
        prop_assert_eq!(log.snapshot(), ids);
    }

    #[test]
    fn chain_with_zero_handlers_is_identity(payload in any::<i64>()) {
        let event = SharedChain::<i64>::new();
        prop_assert_eq!(event.fire(payload), payload);
    }

    #[test]
    fn chain_applies_handlers_in_order(
        steps in proptest::collection::vec(any::<i8>(), 0..16),
        seed in any::<i64>(),
    ) {
        let event = SharedChain::<i64>::new();
        for step in steps.clone() {
            event.register(move |value: i64, _: &()| {
                value.wrapping_mul(3).wrapping_add(i64::from(step))
            });
        }

        let expected = steps
            .iter()
            .fold(seed, |value, &step| value.wrapping_mul(3).wrapping_add(i64::from(step)));
        prop_assert_eq!(event.fire(seed), expected);
    }

    #[test]
    fn reduce_matches_a_left_fold(
        results in proptest::collection::vec(any::<i32>(), 0..16),
    ) {
        let event = SharedReduce::<(), i64>::with_reducer(|acc, next| {
            acc.wrapping_mul(31).wrapping_add(next)
        });
        for value in results.clone() {
            event.register(move |_: &()| i64::from(value));
        }

        let expected = results
            .iter()
            .map(|&value| i64::from(value))
            .reduce(|acc, next| acc.wrapping_mul(31).wrapping_add(next));
        prop_assert_eq!(event.fire(&()), expected);
    }

    #[test]
    fn unregistered_keys_no_longer_dispatch(
        kept in proptest::collection::vec(any::<u8>(), 0..12),
        removed in proptest::collection::vec(any::<u8>(), 0..12),
    ) {
        let event = SharedBroadcast::<()>::new();
        let log = RecordingLog::new();
        let mut expected = Vec::new();
        let mut doomed = Vec::new();

        // Interleave surviving and to-be-removed registrations so removal
        // cannot rely on position.
        for i in 0..kept.len().max(removed.len()) {
            if let Some(&value) = kept.get(i) {
                let log = log.clone();
                event.register(move |_: &()| log.push(("keep", value)));
                expected.push(("keep", value));
            }
            if let Some(&value) = removed.get(i) {
                let log = log.clone();
                doomed.push(event.register(move |_: &()| log.push(("drop", value))));
            }
        }
        for key in doomed {
            event.unregister(key);
        }

        event.fire(());
        prop_assert_eq!(log.snapshot(), expected);
    }
}
