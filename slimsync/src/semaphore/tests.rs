// Copyright 2024 tison <wander4096@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::util::test::spin_until;
use crate::util::test::trace_init;

#[test]
fn invalid_arguments() {
    assert_eq!(
        Semaphore::new(0, 0).unwrap_err(),
        Error::NotGreater {
            name: "capacity",
            bound: 0,
            value: 0,
        }
    );
    assert_eq!(
        Semaphore::new(2, 3).unwrap_err(),
        Error::NotLessOrEqual {
            name: "entered",
            bound: 2,
            value: 3,
        }
    );
    assert!(Semaphore::with_capacity(0).is_err());

    let sem = Semaphore::with_capacity(1).unwrap();
    assert_eq!(sem.set_capacity(0).unwrap_err().name(), "capacity");
    assert_eq!(sem.capacity(), 1);
}

#[test]
fn capacity_bounded_by_isize() {
    let too_large = Semaphore::MAX_CAPACITY + 1;
    assert_eq!(
        Semaphore::with_capacity(too_large).unwrap_err(),
        Error::NotLessOrEqual {
            name: "capacity",
            bound: Semaphore::MAX_CAPACITY,
            value: too_large,
        }
    );

    let sem = Semaphore::with_capacity(Semaphore::MAX_CAPACITY).unwrap();
    assert_eq!(sem.increment(), 1 - isize::MAX);
    assert!(sem.set_capacity(usize::MAX).is_err());
    assert_eq!(sem.capacity(), Semaphore::MAX_CAPACITY);
}

#[test]
fn default_capacity() {
    let sem = Semaphore::default();
    assert_eq!(sem.capacity(), 1);
    assert_eq!(sem.entered(), 0);
    assert_eq!(sem.waiting(), 0);
}

#[test]
fn enter_up_to_capacity() {
    let sem = Semaphore::with_capacity(3).unwrap();
    let p1 = sem.enter();
    let p2 = sem.enter();
    let p3 = sem.try_enter(Duration::ZERO);
    assert!(p3.is_acquired());
    assert_eq!(sem.entered(), 3);

    let p4 = sem.try_enter(Duration::from_millis(5));
    assert!(!p4.is_acquired());
    assert_eq!(sem.waiting(), 0);

    drop((p1, p2, p3, p4));
    assert_eq!(sem.entered(), 0);
}

#[test]
fn third_holder_waits_for_a_slot() {
    let _trace = trace_init();
    let sem = Semaphore::new(2, 0).unwrap();
    let admitted = AtomicUsize::new(0);
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let release_rx = std::sync::Mutex::new(release_rx);

    std::thread::scope(|s| {
        for _ in 0..3 {
            s.spawn(|| {
                let _permit = sem.enter();
                admitted.fetch_add(1, Ordering::SeqCst);
                release_rx.lock().unwrap().recv().unwrap();
            });
        }

        spin_until(|| admitted.load(Ordering::SeqCst) == 2 && sem.waiting() == 1);
        assert_eq!(sem.entered(), 2);

        release_tx.send(()).unwrap();
        spin_until(|| admitted.load(Ordering::SeqCst) == 3);
        assert_eq!(sem.waiting(), 0);
        assert_eq!(sem.entered(), 2);

        release_tx.send(()).unwrap();
        release_tx.send(()).unwrap();
    });

    assert_eq!(sem.entered(), 0);
    assert_eq!(sem.waiting(), 0);
}

#[test]
fn increment_and_decrement() {
    let sem = Semaphore::with_capacity(2).unwrap();
    assert_eq!(sem.increment(), -1);
    assert_eq!(sem.increment(), 0);
    assert_eq!(sem.entered(), 2);
    assert_eq!(sem.decrement(), -1);
    assert_eq!(sem.decrement(), -2);
    assert_eq!(sem.entered(), 0);
}

#[test]
fn decrement_waits_for_increment() {
    let sem = Semaphore::with_capacity(1).unwrap();

    std::thread::scope(|s| {
        let taker = s.spawn(|| sem.decrement());
        spin_until(|| sem.waiting() == 1);
        assert_eq!(sem.increment(), 0);
        assert_eq!(taker.join().unwrap(), -1);
    });

    assert_eq!(sem.entered(), 0);
    assert_eq!(sem.waiting(), 0);
}

#[test]
fn increment_waits_while_full() {
    let sem = Semaphore::new(1, 1).unwrap();

    std::thread::scope(|s| {
        let giver = s.spawn(|| sem.increment());
        spin_until(|| sem.waiting() == 1);
        assert_eq!(sem.decrement(), -1);
        assert_eq!(giver.join().unwrap(), 0);
    });

    assert_eq!(sem.entered(), 1);
}

#[test]
fn growing_capacity_wakes_waiters() {
    let _trace = trace_init();
    let sem = Semaphore::with_capacity(1).unwrap();
    let held = sem.enter();

    std::thread::scope(|s| {
        let waiters: Vec<_> = (0..2)
            .map(|_| {
                s.spawn(|| {
                    let permit = sem.enter();
                    permit.is_acquired()
                })
            })
            .collect();
        spin_until(|| sem.waiting() == 2);

        sem.set_capacity(3).unwrap();
        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }
    });

    assert_eq!(sem.capacity(), 3);
    assert_eq!(sem.entered(), 1);
    drop(held);
    assert_eq!(sem.entered(), 0);
}

#[test]
fn shrinking_capacity_waits_for_holders() {
    let sem = Semaphore::with_capacity(3).unwrap();
    let p1 = sem.enter();
    let p2 = sem.enter();
    let p3 = sem.enter();
    let shrunk = std::sync::atomic::AtomicBool::new(false);

    std::thread::scope(|s| {
        s.spawn(|| {
            sem.set_capacity(1).unwrap();
            shrunk.store(true, Ordering::SeqCst);
        });

        drop(p1);
        std::thread::sleep(Duration::from_millis(20));
        assert!(!shrunk.load(Ordering::SeqCst));
        assert_eq!(sem.capacity(), 3);

        drop(p2);
        spin_until(|| shrunk.load(Ordering::SeqCst));
    });

    assert_eq!(sem.capacity(), 1);
    assert_eq!(sem.entered(), 1);
    assert!(!sem.try_enter(Duration::ZERO).is_acquired());
    drop(p3);
    assert!(sem.try_enter(Duration::ZERO).is_acquired());
}

#[test]
fn timed_enter_succeeds_after_release() {
    let sem = Semaphore::with_capacity(1).unwrap();
    let held = sem.enter();

    std::thread::scope(|s| {
        let waiter = s.spawn(|| sem.try_enter(Duration::from_secs(5)).is_acquired());
        spin_until(|| sem.waiting() == 1);
        drop(held);
        assert!(waiter.join().unwrap());
    });

    assert_eq!(sem.entered(), 0);
    assert_eq!(sem.waiting(), 0);
}

#[test]
fn release_twice() {
    let sem = Semaphore::with_capacity(2).unwrap();
    let _held = sem.enter();
    let mut permit = sem.enter();
    permit.release();
    assert_eq!(sem.entered(), 1);
    permit.release();
    drop(permit);
    assert_eq!(sem.entered(), 1);
}

#[test]
fn permit_after_raw_decrement() {
    let sem = Semaphore::with_capacity(2).unwrap();
    let permit = sem.enter();
    assert_eq!(sem.decrement(), -2);
    drop(permit);
    assert_eq!(sem.entered(), 0);

    // the semaphore is still usable up to its capacity
    let _p1 = sem.enter();
    let p2 = sem.try_enter(Duration::ZERO);
    assert!(p2.is_acquired());
    assert_eq!(sem.entered(), 2);
    assert!(!sem.try_enter(Duration::ZERO).is_acquired());
}

#[test]
fn panic_in_critical_section_releases() {
    let sem = Semaphore::with_capacity(2).unwrap();
    let result = std::thread::scope(|s| {
        s.spawn(|| {
            let _permit = sem.enter();
            panic!("critical section failed");
        })
        .join()
    });
    assert!(result.is_err());
    assert_eq!(sem.entered(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stress_test() {
    let sem = Arc::new(Semaphore::with_capacity(5).unwrap());
    let inside = Arc::new(AtomicUsize::new(0));
    let max_inside = Arc::new(AtomicUsize::new(0));

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..200 {
        let sem = sem.clone();
        let inside = inside.clone();
        let max_inside = max_inside.clone();
        tasks.spawn_blocking(move || {
            let _permit = sem.enter();
            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
            max_inside.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_micros(100));
            inside.fetch_sub(1, Ordering::SeqCst);
        });
    }
    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    assert!(max_inside.load(Ordering::SeqCst) <= 5);
    assert_eq!(sem.entered(), 0);
    assert_eq!(sem.waiting(), 0);
}

#[test]
fn round_trip() {
    let sem = Semaphore::new(3, 1).unwrap();
    for _ in 0..1000 {
        drop(sem.enter());
        drop(sem.try_enter(Duration::ZERO));
        sem.increment();
        sem.decrement();
    }
    assert_eq!(
        format!("{sem:?}"),
        "Semaphore { capacity: 3, entered: 1, waiting: 0, .. }"
    );
}
