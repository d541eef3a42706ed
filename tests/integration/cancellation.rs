//! Early stop, idempotent cancel and clean shutdown of producer stages

use powerset_walk::{callback, fixed_size, variable_size, Canceller, Directive, PowersetError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc, OnceLock};
use std::thread;
use std::time::Duration;

/// Run `f` on a helper thread and fail if it does not finish promptly
fn within_deadline<F: FnOnce() + Send + 'static>(f: F) {
    let (done, finished) = mpsc::channel();
    thread::spawn(move || {
        f();
        let _ = done.send(());
    });
    finished
        .recv_timeout(Duration::from_secs(5))
        .expect("operation did not finish in time");
}

#[test]
fn test_cancel_after_partial_consumption() {
    let mut enumeration = fixed_size(3).unwrap();
    let mut results = Vec::new();
    for _ in 0..3 {
        results.push(enumeration.next().unwrap().unwrap());
    }
    enumeration.cancel();

    assert_eq!(
        results,
        vec![
            vec![false, false, false],
            vec![false, false, true],
            vec![false, true, false],
        ]
    );
    assert!(enumeration.next().is_none());
    assert!(enumeration.is_cancelled());
}

#[test]
fn test_cancel_is_idempotent_and_safe_after_exhaustion() {
    let mut enumeration = variable_size(2).unwrap();
    let all: Vec<_> = enumeration.by_ref().collect();
    assert_eq!(all.len(), 4);

    enumeration.cancel();
    enumeration.cancel();
    enumeration.canceller().cancel();
    assert!(enumeration.next().is_none());
}

#[test]
fn test_cancel_with_values_in_flight() {
    let mut enumeration = fixed_size(12).unwrap();
    assert!(enumeration.next().is_some());

    // Give both stages time to block on their handoffs.
    thread::sleep(Duration::from_millis(50));

    let canceller = enumeration.canceller();
    within_deadline(move || canceller.cancel());
    assert!(enumeration.next().is_none());
}

#[test]
fn test_cancel_from_another_thread_unblocks_consumer() {
    let enumeration = fixed_size(40).unwrap();
    let canceller = enumeration.canceller();

    let consumer = thread::spawn(move || enumeration.count());
    thread::sleep(Duration::from_millis(50));
    within_deadline(move || canceller.cancel());

    let consumed = consumer.join().unwrap();
    assert!(consumed > 0);
    assert!((consumed as u64) < (1u64 << 40));
}

#[test]
fn test_emitter_reports_cancellation() {
    let saw_cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&saw_cancel);

    let mut enumeration = callback(10, (), move |path, _, state, emit| {
        if let Err(err) = emit.emit(path.depth()) {
            assert!(matches!(err, PowersetError::Cancelled));
            flag.store(true, Ordering::SeqCst);
            return Err(err);
        }
        Ok(Directive::Continue(state))
    })
    .unwrap();

    assert_eq!(enumeration.next().unwrap().unwrap(), 0);
    assert_eq!(enumeration.next().unwrap().unwrap(), 1);
    enumeration.cancel();

    assert!(saw_cancel.load(Ordering::SeqCst));
    assert!(enumeration.next().is_none());
}

#[test]
fn test_drop_stops_background_work() {
    let visits = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&visits);

    let mut enumeration = callback(16, (), move |_, _, state, emit| {
        counter.fetch_add(1, Ordering::SeqCst);
        emit.emit(())?;
        Ok(Directive::Continue(state))
    })
    .unwrap();
    for _ in 0..5 {
        enumeration.next().unwrap().unwrap();
    }
    drop(enumeration);

    let after_drop = visits.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(30));
    assert_eq!(visits.load(Ordering::SeqCst), after_drop);
    assert!(after_drop < 16);
}

#[test]
fn test_concurrent_cancels_both_return() {
    let enumeration = variable_size(30).unwrap();
    let first = enumeration.canceller();
    let second = enumeration.canceller();

    within_deadline(move || {
        let racer = thread::spawn(move || second.cancel());
        first.cancel();
        racer.join().unwrap();
    });
    assert!(enumeration.is_cancelled());
}

#[test]
fn test_decision_function_waits_for_consumer() {
    let visits = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&visits);

    let mut enumeration = callback(4, (), move |path, _, state, emit| {
        counter.fetch_add(1, Ordering::SeqCst);
        emit.emit(path.depth())?;
        Ok(Directive::Continue(state))
    })
    .unwrap();

    for taken in 1..=3u64 {
        enumeration.next().unwrap().unwrap();
        thread::sleep(Duration::from_millis(30));
        // Only the node whose value is waiting to be taken has been visited.
        assert_eq!(visits.load(Ordering::SeqCst), taken + 1);
    }
    enumeration.cancel();
}

#[test]
fn test_large_item_count_is_read_partially_then_cancelled() {
    let mut enumeration = fixed_size(60).unwrap();
    assert_eq!(enumeration.next().unwrap().unwrap(), vec![false; 60]);

    let mut second = vec![false; 60];
    second[59] = true;
    assert_eq!(enumeration.next().unwrap().unwrap(), second);

    let canceller = enumeration.canceller();
    within_deadline(move || canceller.cancel());
    assert!(enumeration.next().is_none());
}

/// Start a traversal whose decision function stalls at depth 1 until the
/// consumer cancels, then fails through `fail`
fn stalled_until_cancel(
    fail: fn() -> Result<Directive<()>, PowersetError>,
) -> powerset_walk::Enumeration<usize> {
    let handle: Arc<OnceLock<Canceller>> = Arc::new(OnceLock::new());
    let shared = Arc::clone(&handle);

    let enumeration = callback(3, (), move |path, _, state, emit| {
        if path.depth() == 1 {
            while !shared.get().is_some_and(Canceller::is_cancelled) {
                thread::sleep(Duration::from_millis(1));
            }
            return fail();
        }
        emit.emit(path.depth())?;
        Ok(Directive::Continue(state))
    })
    .unwrap();

    let _ = handle.set(enumeration.canceller());
    enumeration
}

#[test]
fn test_cancel_unblocks_when_decision_fails_during_cancel() {
    let mut enumeration =
        stalled_until_cancel(|| Err(PowersetError::Decision("gave up".to_string())));
    assert_eq!(enumeration.next().unwrap().unwrap(), 0);

    let canceller = enumeration.canceller();
    within_deadline(move || canceller.cancel());
    assert!(enumeration.next().is_none());
}

#[test]
fn test_cancel_unblocks_when_decision_panics_during_cancel() {
    let mut enumeration = stalled_until_cancel(|| panic!("gave up"));
    assert_eq!(enumeration.next().unwrap().unwrap(), 0);

    let canceller = enumeration.canceller();
    within_deadline(move || canceller.cancel());
    assert!(enumeration.next().is_none());
}
