//! Property-based tests for the linked deque using proptest
//!
//! Single-threaded operation sequences are replayed against
//! `std::collections::VecDeque` as a model; multi-threaded runs check that no
//! element is lost or duplicated.

use super::LinkedDeque;
use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
enum Op {
    PushFront(i32),
    PushBack(i32),
    PopFront,
    PopBack,
    Traverse,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<i32>().prop_map(Op::PushFront),
        any::<i32>().prop_map(Op::PushBack),
        Just(Op::PopFront),
        Just(Op::PopBack),
        Just(Op::Traverse),
    ]
}

#[cfg(test)]
mod sequential_properties {
    use super::*;

    proptest! {
        #[test]
        fn test_matches_vecdeque_model(ops in prop::collection::vec(op_strategy(), 1..200)) {
            let deque = LinkedDeque::new();
            let mut model = VecDeque::new();

            for op in ops {
                match op {
                    Op::PushFront(v) => {
                        deque.push_front(v).unwrap();
                        model.push_front(v);
                    }
                    Op::PushBack(v) => {
                        deque.push_back(v).unwrap();
                        model.push_back(v);
                    }
                    // Blocking pops would hang on an empty deque.
                    Op::PopFront => {
                        prop_assert_eq!(deque.try_pop_front(), model.pop_front());
                    }
                    Op::PopBack => {
                        prop_assert_eq!(deque.try_pop_back(), model.pop_back());
                    }
                    Op::Traverse => {
                        if !model.is_empty() {
                            let mut seen = Vec::new();
                            deque.traverse(|v| seen.push(*v)).unwrap();
                            prop_assert_eq!(seen, model.iter().copied().collect::<Vec<_>>());
                        }
                    }
                }
                prop_assert_eq!(deque.len(), model.len());
            }

            deque.check_links();
            prop_assert_eq!(deque.deinit(), model.into_iter().collect::<Vec<_>>());
        }

        #[test]
        fn test_blocking_pop_on_non_empty(values in prop::collection::vec(any::<u16>(), 1..100)) {
            let deque = LinkedDeque::new();
            for &v in &values {
                deque.push_front(v).unwrap();
            }

            // push_front then pop_back is FIFO.
            for &v in &values {
                prop_assert_eq!(deque.pop_back(), Some(v));
            }
            prop_assert!(deque.is_empty());
        }

        #[test]
        fn test_round_trip_each_end(value in any::<i64>(), front in any::<bool>()) {
            let deque = LinkedDeque::new();
            if front {
                deque.push_front(value).unwrap();
                prop_assert_eq!(deque.pop_front(), Some(value));
            } else {
                deque.push_back(value).unwrap();
                prop_assert_eq!(deque.pop_back(), Some(value));
            }
            prop_assert!(deque.is_empty());
            deque.check_links();
        }
    }
}

#[cfg(test)]
mod concurrent_properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn test_no_lost_or_duplicated_elements(
            num_producers in 1usize..5,
            per_producer in 1usize..300,
        ) {
            let deque = Arc::new(LinkedDeque::new());
            let total = num_producers * per_producer;

            let producers: Vec<_> = (0..num_producers)
                .map(|p| {
                    let deque = Arc::clone(&deque);
                    thread::spawn(move || {
                        for i in 0..per_producer {
                            let value = p * per_producer + i;
                            if i % 2 == 0 {
                                deque.push_back(value).unwrap();
                            } else {
                                deque.push_front(value).unwrap();
                            }
                        }
                    })
                })
                .collect();

            let consumer = thread::spawn({
                let deque = Arc::clone(&deque);
                move || {
                    let mut received = Vec::with_capacity(total);
                    for i in 0..total {
                        let value = if i % 2 == 0 { deque.pop_front() } else { deque.pop_back() };
                        received.push(value.expect("deque torn down early"));
                    }
                    received
                }
            });

            for producer in producers {
                producer.join().unwrap();
            }
            let mut received = consumer.join().unwrap();
            received.sort_unstable();

            prop_assert_eq!(received, (0..total).collect::<Vec<_>>());
            prop_assert!(deque.is_empty());
        }
    }
}
