/*!
 * Atomic Counter Tests
 * Lost-update freedom, CAS exclusivity and a sequential model check
 */

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use shareable_sync::{AtomicCounter, SyncError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_one_increment_per_thread() {
    let counter = Arc::new(AtomicCounter::new(0));

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let counter = counter.clone();
            thread::spawn(move || {
                counter.increment();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(counter.get(), 100);
}

#[test]
fn test_many_increments_per_thread() {
    let counter = Arc::new(AtomicCounter::new(0));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    counter.increment();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(counter.get(), 1000);
}

#[test]
fn test_mixed_arithmetic_balances() {
    let counter = Arc::new(AtomicCounter::new(500));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..1000 {
                    if i % 2 == 0 {
                        counter.add(3);
                    } else {
                        counter.subtract(3);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(counter.get(), 500);
}

#[test]
fn test_exactly_one_cas_wins() {
    const RACERS: usize = 16;
    let counter = Arc::new(AtomicCounter::new(0));
    let barrier = Arc::new(Barrier::new(RACERS));
    let winners = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..RACERS)
        .map(|i| {
            let counter = counter.clone();
            let barrier = barrier.clone();
            let winners = winners.clone();
            thread::spawn(move || {
                barrier.wait();
                if counter.compare_and_set(0, i as i64 + 1) {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(winners.load(Ordering::SeqCst), 1);
    assert!((1..=RACERS as i64).contains(&counter.get()));
}

#[test]
fn test_negative_values() {
    let counter = AtomicCounter::new(-5);
    assert_eq!(counter.increment(), -4);
    assert_eq!(counter.subtract(10), -14);
    counter.set(-1);
    assert_eq!(counter.decrement(), -2);
    assert!(counter.compare_and_set(-2, 7));
}

#[test]
fn test_out_of_range_arguments_are_rejected() {
    let counter = AtomicCounter::new(1);

    let err = counter.try_add(u64::MAX).unwrap_err();
    assert!(matches!(err, SyncError::InvalidArgument(_)));
    assert_eq!(counter.get(), 1);

    assert!(counter.try_set(i128::MIN).is_err());
    assert!(AtomicCounter::try_new(u64::MAX).is_err());
    assert_eq!(AtomicCounter::try_new(7_u8).unwrap().get(), 7);
}

#[derive(Debug, Clone)]
enum CounterOp {
    Increment,
    Decrement,
    Add(i64),
    Subtract(i64),
    Set(i64),
    CompareAndSet(i64, i64),
}

fn counter_op() -> impl Strategy<Value = CounterOp> {
    let small = -1_000_i64..1_000;
    prop_oneof![
        Just(CounterOp::Increment),
        Just(CounterOp::Decrement),
        small.clone().prop_map(CounterOp::Add),
        small.clone().prop_map(CounterOp::Subtract),
        small.clone().prop_map(CounterOp::Set),
        (small.clone(), small).prop_map(|(e, n)| CounterOp::CompareAndSet(e, n)),
    ]
}

proptest! {
    #[test]
    fn prop_sequential_ops_match_model(
        start in -1_000_i64..1_000,
        ops in prop::collection::vec(counter_op(), 0..100),
    ) {
        let counter = AtomicCounter::new(start);
        let mut model = start;

        for op in ops {
            match op {
                CounterOp::Increment => {
                    model += 1;
                    prop_assert_eq!(counter.increment(), model);
                }
                CounterOp::Decrement => {
                    model -= 1;
                    prop_assert_eq!(counter.decrement(), model);
                }
                CounterOp::Add(delta) => {
                    model += delta;
                    prop_assert_eq!(counter.add(delta), model);
                }
                CounterOp::Subtract(delta) => {
                    model -= delta;
                    prop_assert_eq!(counter.subtract(delta), model);
                }
                CounterOp::Set(value) => {
                    model = value;
                    counter.set(value);
                }
                CounterOp::CompareAndSet(expected, new) => {
                    let swapped = model == expected;
                    if swapped {
                        model = new;
                    }
                    prop_assert_eq!(counter.compare_and_set(expected, new), swapped);
                }
            }
            prop_assert_eq!(counter.get(), model);
        }
    }
}
