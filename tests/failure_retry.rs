// tests/failure_retry.rs

use std::error::Error;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use foreman::{
    ErrorCode, ExecutionMode, ForemanError, Manager, ManagerConfig, Notifier, PriorityPolicy,
    Worker, work_fn,
};
use foreman_test_utils::{
    FakeExecutor, FlakyWork, ListenerEvent, RecordingListener, RejectingExecutor, failing,
    init_tracing, ok,
};

type TestResult = Result<(), Box<dyn Error>>;

fn serial(exec: Arc<dyn foreman::Executor>) -> Manager {
    let config = ManagerConfig {
        id: "retry".to_string(),
        execution_mode: ExecutionMode::Serial,
        ..ManagerConfig::default()
    };
    Manager::with_executor(config, Box::new(PriorityPolicy::new()), exec)
}

#[test]
fn failure_pauses_and_records_an_error() -> TestResult {
    init_tracing();

    let exec = FakeExecutor::new();
    let listener = RecordingListener::new();
    let mut m = serial(exec.clone());
    m.set_listener(listener.clone());

    m.enqueue(failing("w1", "disk full"))?;
    m.enqueue(ok("w2"))?;
    m.start()?;
    exec.run_all();
    m.dispatch_signals();

    assert!(m.is_paused());
    assert_eq!(m.running_count(), 0);
    assert_eq!(m.pending_count(), 1, "w2 waits until resume or retry");
    assert_eq!(m.failed_workers().len(), 1);
    assert!(m.failed_workers()[0].is_failed());

    let errors = m.status_info().errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, ErrorCode::FailedWorker);
    assert!(errors[0].message.contains("w1"));
    assert!(errors[0].message.contains("disk full"));
    assert_eq!(errors[0].worker_id(), Some("w1"));

    assert_eq!(
        listener.events(),
        vec![ListenerEvent::Error {
            worker: Some("w1".to_string()),
            message: errors[0].message.clone(),
        }]
    );
    Ok(())
}

#[test]
fn retry_round_trip_completes_the_worker() -> TestResult {
    let exec = FakeExecutor::new();
    let listener = RecordingListener::new();
    let mut m = serial(exec.clone());
    m.set_listener(listener.clone());

    let work = FlakyWork::new(1);
    let attempts = work.attempts();
    m.enqueue(Worker::builder(work).id("flaky").build())?;
    m.start()?;
    exec.run_all();
    m.dispatch_signals();
    assert!(m.is_paused());

    m.retry()?;
    assert!(m.failed_workers().is_empty());
    assert!(m.is_working());
    exec.run_all();
    m.dispatch_signals();

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert!(m.is_idle());
    assert_eq!(m.status_info().num_complete, 1);
    assert!(m.failed_workers().is_empty());
    assert_eq!(listener.errors(), 1);
    assert_eq!(listener.completions(), 1);

    // The error log is kept until cleared.
    assert_eq!(m.status_info().errors().len(), 1);
    m.clear_errors();
    assert!(m.status_info().errors().is_empty());
    Ok(())
}

#[test]
fn other_running_workers_are_unaffected_by_a_failure() -> TestResult {
    let exec = FakeExecutor::new();
    let config = ManagerConfig {
        execution_mode: ExecutionMode::NonSerial,
        ..ManagerConfig::default()
    };
    let mut m = Manager::with_executor(config, Box::new(PriorityPolicy::new()), exec.clone());

    let good = ok("good");
    good.set_priority(1);
    m.enqueue(good)?;
    m.enqueue(failing("bad", "nope"))?;
    m.start()?;
    assert_eq!(m.running_count(), 2);

    // "good" was admitted first; run "bad" first so the failure lands while
    // "good" is still in flight.
    exec.run_last();
    m.dispatch_signals();
    assert!(m.is_paused());
    assert_eq!(m.running_count(), 1);

    exec.run_all();
    m.dispatch_signals();
    assert_eq!(m.running_count(), 0);
    assert_eq!(m.status_info().num_complete, 1);
    assert!(m.finished_worker("good").is_some());
    Ok(())
}

#[test]
fn executor_rejection_is_returned_and_recorded() -> TestResult {
    let listener = RecordingListener::new();
    let mut m = serial(Arc::new(RejectingExecutor));
    m.set_listener(listener.clone());
    m.enqueue(ok("refused"))?;

    match m.start() {
        Err(ForemanError::ExecutorRejected { worker, reason }) => {
            assert_eq!(worker, "refused");
            assert!(reason.contains("refuses"));
        }
        other => panic!("expected rejection, got {other:?}"),
    }

    assert!(m.is_paused());
    assert_eq!(m.running_count(), 0);
    assert_eq!(m.failed_workers().len(), 1);
    assert_eq!(listener.errors(), 1);

    // Retrying against the same executor fails the same way.
    assert!(m.retry().is_err());
    assert_eq!(m.failed_workers().len(), 1);
    Ok(())
}

#[test]
fn stale_notifier_from_a_failed_manual_run_is_ignored_after_retry() -> TestResult {
    let exec = FakeExecutor::new();
    let mut m = serial(exec.clone());

    let notifiers: Arc<Mutex<Vec<Notifier>>> = Arc::default();
    let sink = notifiers.clone();
    let worker = Worker::builder(work_fn(move |n| {
        sink.lock().unwrap().push(n.clone());
        Ok(())
    }))
    .id("manual")
    .manual()
    .build();

    m.enqueue(worker.clone())?;
    m.start()?;
    exec.run_all();
    let first = notifiers.lock().unwrap()[0].clone();
    first.error("lost connection");
    m.dispatch_signals();
    assert!(m.is_paused());

    m.retry()?;
    exec.run_all();
    let second = notifiers.lock().unwrap()[1].clone();

    // The first run's activity finishes late.
    assert!(!first.complete());
    assert_eq!(m.dispatch_signals(), 0);
    assert_eq!(m.running_count(), 1);
    assert_eq!(m.status_info().num_complete, 0);

    assert!(second.complete());
    m.dispatch_signals();
    assert!(m.is_idle());
    assert_eq!(m.status_info().num_complete, 1);
    assert!(worker.is_finished());
    Ok(())
}
