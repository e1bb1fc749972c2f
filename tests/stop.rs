// tests/stop.rs

use std::error::Error;
use std::sync::atomic::Ordering;

use foreman::{
    ExecutionMode, ForemanError, Manager, ManagerConfig, PriorityPolicy, Worker, WorkerStatus,
};
use foreman_test_utils::{FakeExecutor, StoppableWork, ok};

type TestResult = Result<(), Box<dyn Error>>;

fn manager(exec: &std::sync::Arc<FakeExecutor>) -> Manager {
    let config = ManagerConfig {
        execution_mode: ExecutionMode::NonSerial,
        ..ManagerConfig::default()
    };
    Manager::with_executor(config, Box::new(PriorityPolicy::new()), exec.clone())
}

#[test]
fn stop_asks_every_running_worker_and_clears_everything() -> TestResult {
    let exec = FakeExecutor::new();
    let mut m = manager(&exec);

    let work_a = StoppableWork::new();
    let work_b = StoppableWork::new();
    let (stops_a, stops_b) = (work_a.stops(), work_b.stops());
    let a = Worker::builder(work_a).id("a").build();
    let b = Worker::builder(work_b).id("b").build();

    m.enqueue(a.clone())?;
    m.enqueue(b.clone())?;
    m.start()?;
    assert_eq!(m.running_count(), 2);

    m.stop()?;
    assert!(m.is_stopped());
    assert_eq!(m.running_count(), 0);
    assert_eq!(stops_a.load(Ordering::SeqCst), 1);
    assert_eq!(stops_b.load(Ordering::SeqCst), 1);
    assert_eq!(a.status(), WorkerStatus::Stop);

    // Stopping twice is harmless.
    m.stop()?;
    assert_eq!(stops_a.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn unsupported_stop_propagates_after_bookkeeping() -> TestResult {
    let exec = FakeExecutor::new();
    let mut m = manager(&exec);

    let cancellable = StoppableWork::new();
    let stops = cancellable.stops();
    m.enqueue(Worker::builder(cancellable).id("cancellable").build())?;
    m.enqueue(ok("stubborn"))?;
    m.start()?;

    match m.stop() {
        Err(ForemanError::StopUnsupported { worker }) => assert_eq!(worker, "stubborn"),
        other => panic!("expected StopUnsupported, got {other:?}"),
    }
    assert_eq!(stops.load(Ordering::SeqCst), 1);
    assert!(m.is_stopped());
    assert_eq!(m.running_count(), 0);
    Ok(())
}

#[test]
fn restart_after_stop_starts_empty() -> TestResult {
    let exec = FakeExecutor::new();
    let mut m = manager(&exec);
    for id in ["a", "b", "c"] {
        m.enqueue(Worker::builder(StoppableWork::new()).id(id).build())?;
    }
    m.set_execution_mode(ExecutionMode::Serial);
    m.start()?;
    m.stop()?;
    assert_eq!(m.pending_count(), 0);

    // Late signals from the stopped worker are dropped.
    exec.run_all();
    assert_eq!(m.dispatch_signals(), 0);

    m.start()?;
    assert!(m.is_idle());
    assert_eq!(m.running_count(), 0);
    assert_eq!(m.status_info().num_total, 3);

    // New work after the restart runs normally.
    m.enqueue(ok("fresh"))?;
    exec.run_all();
    m.dispatch_signals();
    assert!(m.finished_worker("fresh").is_some());
    Ok(())
}

#[test]
fn enqueue_while_stopped_waits_for_start() -> TestResult {
    let exec = FakeExecutor::new();
    let mut m = manager(&exec);
    m.start()?;
    m.stop()?;

    m.enqueue(ok("queued"))?;
    assert_eq!(m.pending_count(), 1);
    assert_eq!(exec.submitted(), 0);

    m.start()?;
    assert_eq!(exec.submitted(), 1);
    Ok(())
}

#[test]
fn late_run_of_a_stopped_worker_is_not_credited_to_its_restart() -> TestResult {
    let exec = FakeExecutor::new();
    let config = ManagerConfig {
        execution_mode: ExecutionMode::Serial,
        ..ManagerConfig::default()
    };
    let mut m = Manager::with_executor(config, Box::new(PriorityPolicy::new()), exec.clone());

    let w = Worker::builder(StoppableWork::new()).id("w").priority(1).build();
    m.enqueue(w.clone())?;
    m.start()?;
    m.stop()?;

    m.enqueue(w.clone())?;
    m.enqueue(ok("next"))?;
    m.start()?;
    assert_eq!(exec.queued(), 2);
    assert_eq!(w.current_run(), 2);

    // The first dispatch finally gets a thread after the restart.
    exec.run_next();
    assert_eq!(m.dispatch_signals(), 0);
    assert_eq!(m.status_info().num_complete, 0);
    assert_eq!(m.running_count(), 1);
    assert!(m.is_working());
    assert_eq!(exec.queued(), 1, "serial manager must not admit \"next\" yet");

    exec.run_next();
    assert_eq!(m.dispatch_signals(), 1);
    assert_eq!(m.status_info().num_complete, 1);
    assert!(w.is_finished());

    exec.run_all();
    m.dispatch_signals();
    assert!(m.is_idle());
    assert_eq!(m.status_info().num_complete, 2);
    Ok(())
}
