//! End-to-end producer/consumer scenarios

use super::{init_test_logging, SETTLE};
use crate::queue::{BoundedQueue, PutError, QueueState, TakeError};
use crossbeam::channel;
use std::collections::HashSet;
use std::thread;
use std::time::{Duration, Instant};

/// Take until end-of-stream, collecting every item
fn drain_until_closed<T>(queue: &BoundedQueue<T>) -> Vec<T> {
    let mut items = Vec::new();
    loop {
        match queue.take() {
            Ok(item) => items.push(item),
            Err(TakeError::ClosedEmpty) => return items,
            Err(e) => panic!("unexpected take error: {}", e),
        }
    }
}

#[test]
fn test_spsc_happy_path() {
    init_test_logging();
    let queue = BoundedQueue::new(4, 1).unwrap();

    let producer = queue.clone();
    let handle = thread::spawn(move || {
        for value in [10, 20, 30, 40, 50] {
            producer.put(value).unwrap();
        }
        producer.producer_done().unwrap();
    });

    let received = drain_until_closed(&queue);
    handle.join().unwrap();

    assert_eq!(received, vec![10, 20, 30, 40, 50]);
    // End-of-stream is sticky
    assert_eq!(queue.take(), Err(TakeError::ClosedEmpty));
    assert_eq!(queue.state(), QueueState::ClosedEmpty);
}

#[test]
fn test_spsc_exact_take_count() {
    init_test_logging();
    const N: usize = 500;
    let queue = BoundedQueue::new(3, 1).unwrap();

    let producer = queue.clone();
    let handle = thread::spawn(move || {
        for i in 0..N {
            producer.put(i).unwrap();
        }
        producer.producer_done().unwrap();
    });

    let mut successes = 0;
    let mut end_of_stream = 0;
    loop {
        match queue.take() {
            Ok(item) => {
                assert_eq!(item, successes);
                successes += 1;
            }
            Err(e) => {
                assert!(e.is_end_of_stream());
                end_of_stream += 1;
                break;
            }
        }
    }
    handle.join().unwrap();

    assert_eq!(successes, N);
    assert_eq!(end_of_stream, 1);
}

#[test]
fn test_mpmc_drain() {
    init_test_logging();
    let queue = BoundedQueue::new(2, 3).unwrap();
    let (tx, rx) = channel::unbounded();

    crossbeam::scope(|s| {
        for pid in 0..3u32 {
            let queue = &queue;
            s.spawn(move |_| {
                for i in 0..3u32 {
                    queue.put((pid, i)).unwrap();
                }
                queue.producer_done().unwrap();
            });
        }

        for _ in 0..4 {
            let queue = &queue;
            let tx = tx.clone();
            s.spawn(move |_| {
                let items = drain_until_closed(queue);
                tx.send(items).unwrap();
            });
        }
    })
    .unwrap();
    drop(tx);

    let per_consumer: Vec<Vec<(u32, u32)>> = rx.iter().collect();
    assert_eq!(per_consumer.len(), 4);

    // Each consumer sees every producer's items in put order
    for items in &per_consumer {
        for pid in 0..3 {
            let seq: Vec<u32> = items.iter().filter(|(p, _)| *p == pid).map(|(_, i)| *i).collect();
            assert!(seq.windows(2).all(|w| w[0] < w[1]), "out of order: {:?}", seq);
        }
    }

    let all: Vec<(u32, u32)> = per_consumer.into_iter().flatten().collect();
    let unique: HashSet<(u32, u32)> = all.iter().copied().collect();
    assert_eq!(all.len(), 9);
    assert_eq!(unique.len(), 9);
    assert!(queue.is_closed());
    assert_eq!(queue.statistics().total_taken, 9);
}

#[test]
fn test_explicit_shutdown_mid_flight() {
    init_test_logging();
    let queue = BoundedQueue::new(1, 1).unwrap();
    queue.put('A').unwrap();

    let producer = queue.clone();
    let blocked = thread::spawn(move || producer.put('B'));

    thread::sleep(SETTLE);
    assert_eq!(queue.size(), 1);
    queue.close();

    let result = blocked.join().unwrap();
    assert!(matches!(result, Err(PutError::Closed('B'))));
    assert_eq!(queue.state(), QueueState::Draining);
    assert_eq!(queue.take(), Ok('A'));
    assert_eq!(queue.take(), Err(TakeError::ClosedEmpty));
}

#[test]
fn test_take_timeout_leaves_state_unchanged() {
    init_test_logging();
    let queue: BoundedQueue<u64> = BoundedQueue::new(1, 1).unwrap();

    let start = Instant::now();
    assert_eq!(queue.take_for(Duration::from_millis(100)), Err(TakeError::Timeout));
    assert!(start.elapsed() >= Duration::from_millis(100));

    assert_eq!(queue.size(), 0);
    assert!(!queue.is_closed());
    assert_eq!(queue.statistics().total_taken, 0);
}

#[test]
fn test_try_put_saturation() {
    let queue = BoundedQueue::new(2, 1).unwrap();
    assert!(queue.try_put("X").is_ok());
    assert!(queue.try_put("Y").is_ok());
    assert!(matches!(queue.try_put("Z"), Err(PutError::WouldBlock("Z"))));
    assert_eq!(queue.take(), Ok("X"));
}

#[test]
fn test_single_put_wakes_single_taker() {
    init_test_logging();
    let queue = BoundedQueue::new(1, 1).unwrap();

    let consumer = queue.clone();
    let first = thread::spawn(move || consumer.take_for(Duration::from_secs(5)));
    thread::sleep(SETTLE);

    let started = Instant::now();
    queue.put("V").unwrap();
    assert_eq!(first.join().unwrap(), Ok("V"));
    assert!(started.elapsed() < Duration::from_secs(5));

    // A consumer arriving later finds nothing: the put was consumed once
    assert_eq!(queue.try_take(), Err(TakeError::WouldBlock));
    let stats = queue.statistics();
    assert_eq!(stats.total_put, 1);
    assert_eq!(stats.total_taken, 1);
}

#[test]
fn test_capacity_one_is_strict_handoff() {
    init_test_logging();
    let queue = BoundedQueue::new(1, 1).unwrap();
    queue.put(0).unwrap();

    // Second put cannot complete until the first item is taken
    assert!(matches!(
        queue.put_for(1, Duration::from_millis(30)),
        Err(PutError::Timeout(1))
    ));

    let producer = queue.clone();
    let handle = thread::spawn(move || {
        for i in 1..20 {
            producer.put(i).unwrap();
        }
        producer.producer_done().unwrap();
    });

    let mut expected = 0;
    while let Ok(item) = queue.take() {
        assert_eq!(item, expected);
        assert!(queue.size() <= 1);
        expected += 1;
    }
    handle.join().unwrap();
    assert_eq!(expected, 20);
}

#[test]
fn test_zero_expected_producers_waits_for_registration() {
    init_test_logging();
    let queue = BoundedQueue::new(2, 0).unwrap();

    // Nobody has registered, so the queue must not be closed yet
    assert_eq!(queue.take_for(Duration::from_millis(30)), Err(TakeError::Timeout));
    assert!(!queue.is_closed());

    let producer = queue.clone();
    let handle = thread::spawn(move || {
        thread::sleep(SETTLE);
        producer.register_producer().unwrap();
        producer.put(42).unwrap();
        producer.producer_done().unwrap();
    });

    assert_eq!(queue.take(), Ok(42));
    assert_eq!(queue.take(), Err(TakeError::ClosedEmpty));
    handle.join().unwrap();
}

#[test]
fn test_zero_expected_producers_released_by_close() {
    init_test_logging();
    let queue: BoundedQueue<u8> = BoundedQueue::new(2, 0).unwrap();

    let consumer = queue.clone();
    let handle = thread::spawn(move || consumer.take());
    thread::sleep(SETTLE);
    queue.close();

    assert_eq!(handle.join().unwrap(), Err(TakeError::ClosedEmpty));
}
