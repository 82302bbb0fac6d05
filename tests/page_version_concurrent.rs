//! Concurrent tests for the page version word.
//!
//! These verify the atomic protocol under real contention: writer
//! exclusivity, the stable-version spin, timeout semantics, and the
//! soundness of optimistic reads against a torn-write payload.

use pactdb::storage::PageVersion;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn concurrent_writers_serialize_through_the_lock() {
    let version = Arc::new(PageVersion::new_initialized(false, false, true, false, 0));
    let num_threads = 8;
    let iterations = 500u16;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let version = Arc::clone(&version);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..iterations {
                    let mut guard = version.lock();
                    guard.set_inserting_and_increment_key_count();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer panicked");
    }

    // Every increment happened under mutual exclusion, so none were lost.
    let total = num_threads as u16 * iterations;
    let value = version.stable_version();
    assert_eq!(value.key_count(), total);
    assert!(!value.is_locked());
    assert!(!value.is_inserting());
    // 8 * 500 = 4000 insert cycles: the 6-bit counter wrapped many times
    // but ends exactly at total mod 64.
    assert_eq!(value.insertion_counter(), (total % 64) as u32);
}

#[test]
fn stable_version_spins_until_the_writer_unlocks() {
    let version = Arc::new(PageVersion::new_initialized(false, false, true, false, 0));
    let writer_done = Arc::new(AtomicBool::new(false));

    let writer = {
        let version = Arc::clone(&version);
        let writer_done = Arc::clone(&writer_done);
        thread::spawn(move || {
            let mut guard = version.lock();
            guard.set_inserting();
            thread::sleep(Duration::from_millis(50));
            writer_done.store(true, Ordering::Release);
            drop(guard);
        })
    };

    // Let the writer take the lock and mark the insert.
    while !version.value().is_inserting() {
        std::hint::spin_loop();
    }

    let reader = {
        let version = Arc::clone(&version);
        let writer_done = Arc::clone(&writer_done);
        thread::spawn(move || {
            let stable = version.stable_version();
            // stable_version must not have returned while the insert was
            // still in flight.
            assert!(writer_done.load(Ordering::Acquire));
            assert!(!stable.is_inserting());
            assert_eq!(stable.insertion_counter(), 1);
        })
    };

    writer.join().expect("writer panicked");
    reader.join().expect("reader panicked");
}

#[test]
fn conditional_try_lock_fails_immediately_when_held() {
    let version = Arc::new(PageVersion::new());
    let _held = version.lock();

    let start = Instant::now();
    assert!(version.try_lock(0).is_none());
    // A conditional attempt must not wait.
    assert!(start.elapsed() < Duration::from_millis(50));
}

#[test]
fn bounded_try_lock_respects_its_budget() {
    let version = Arc::new(PageVersion::new());

    let holder = {
        let version = Arc::clone(&version);
        thread::spawn(move || {
            let guard = version.lock();
            thread::sleep(Duration::from_millis(200));
            drop(guard);
        })
    };

    while version.try_lock(0).is_some() {
        // The holder has not acquired yet; back off and retry.
        thread::sleep(Duration::from_millis(1));
    }

    let start = Instant::now();
    let result = version.try_lock(1_000);
    let elapsed = start.elapsed();
    assert!(result.is_none(), "should have timed out");
    assert!(elapsed >= Duration::from_millis(1));

    holder.join().expect("holder panicked");
    assert!(version.try_lock(1_000).is_some());
}

#[test]
fn negative_timeout_waits_until_release() {
    let version = Arc::new(PageVersion::new());
    let barrier = Arc::new(Barrier::new(2));

    let holder = {
        let version = Arc::clone(&version);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            let guard = version.lock();
            barrier.wait();
            thread::sleep(Duration::from_millis(50));
            drop(guard);
        })
    };

    barrier.wait();
    let start = Instant::now();
    let guard = version.try_lock(-1);
    assert!(guard.is_some());
    assert!(start.elapsed() >= Duration::from_millis(40));

    holder.join().expect("holder panicked");
}

/// The optimistic read protocol over a payload the writers keep tearing.
///
/// Writers repeatedly fill a shared buffer with a single repeated byte
/// under the lock, marking the cycle as an insert. Readers snapshot the
/// buffer between a stable_version observation and the has_changed
/// re-check; every snapshot that validates must be tear-free.
#[test]
fn optimistic_reads_never_observe_torn_writes() {
    const PAYLOAD: usize = 256;
    let version = Arc::new(PageVersion::new_initialized(false, false, true, false, 0));
    let payload: Arc<Vec<AtomicU8>> =
        Arc::new((0..PAYLOAD).map(|_| AtomicU8::new(0)).collect());
    let stop = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = (1..=2u8)
        .map(|seed| {
            let version = Arc::clone(&version);
            let payload = Arc::clone(&payload);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut pattern = seed;
                while !stop.load(Ordering::Relaxed) {
                    let mut guard = version.lock();
                    guard.set_inserting();
                    for byte in payload.iter() {
                        byte.store(pattern, Ordering::Relaxed);
                    }
                    drop(guard);
                    pattern = pattern.wrapping_add(2);
                    // Leave readers a window between critical sections.
                    thread::sleep(Duration::from_micros(50));
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let version = Arc::clone(&version);
            let payload = Arc::clone(&payload);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut validated = 0u32;
                while validated < 200 && !stop.load(Ordering::Relaxed) {
                    let observed = version.stable_version();
                    let snapshot: Vec<u8> = payload
                        .iter()
                        .map(|byte| byte.load(Ordering::Relaxed))
                        .collect();
                    if version.has_changed(observed) {
                        continue; // torn; retry
                    }
                    // Validated read: the buffer must be a single pattern.
                    let first = snapshot[0];
                    assert!(
                        snapshot.iter().all(|&b| b == first),
                        "validated optimistic read observed a torn write"
                    );
                    validated += 1;
                }
            })
        })
        .collect();

    for reader in readers {
        reader.join().expect("reader panicked");
    }
    stop.store(true, Ordering::Relaxed);
    for writer in writers {
        writer.join().expect("writer panicked");
    }
}

#[test]
fn lock_is_released_even_when_the_holder_panics() {
    let version = Arc::new(PageVersion::new());

    let handle = {
        let version = Arc::clone(&version);
        thread::spawn(move || {
            let mut guard = version.lock();
            guard.set_inserting();
            panic!("intentional panic");
        })
    };
    assert!(handle.join().is_err());

    // The unwinding drop released the lock and promoted the counter.
    assert!(!version.value().is_locked());
    assert_eq!(version.stable_version().insertion_counter(), 1);
    let _reacquired = version.lock();
}
