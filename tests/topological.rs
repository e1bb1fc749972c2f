// tests/topological.rs

use std::error::Error;
use std::sync::Arc;

use foreman::{ExecutionMode, ForemanError, Manager};
use foreman_test_utils::{EventLog, FakeExecutor, RecordingListener, init_tracing, logged};

type TestResult = Result<(), Box<dyn Error>>;

fn position(entries: &[String], id: &str) -> usize {
    entries.iter().position(|e| e == id).unwrap()
}

#[test]
fn dispatch_order_satisfies_before_and_after() -> TestResult {
    init_tracing();

    let exec = FakeExecutor::new();
    let log = EventLog::new();
    let fetch = logged("fetch", &log);
    let configure = logged("configure", &log);
    let compile = logged("compile", &log);
    let test = logged("test", &log);
    let package = logged("package", &log);

    let listener = RecordingListener::new();
    let mut manager = Manager::topological()
        .id("build")
        .before(&fetch, &configure)
        .before(&configure, &compile)
        .after(&test, &compile)
        .after(&package, &compile)
        .before(&test, &package)
        .listener(listener.clone())
        .executor(exec.clone())
        .build()?;

    assert_eq!(manager.execution_mode(), ExecutionMode::Serial);
    assert_eq!(manager.status_info().num_total, 5);

    manager.start()?;
    while exec.run_next() {
        assert!(manager.running_count() <= 1);
        manager.dispatch_signals();
    }

    let entries = log.entries();
    assert_eq!(entries.len(), 5);
    assert!(position(&entries, "fetch") < position(&entries, "configure"));
    assert!(position(&entries, "configure") < position(&entries, "compile"));
    assert!(position(&entries, "compile") < position(&entries, "test"));
    assert!(position(&entries, "test") < position(&entries, "package"));

    assert!(manager.is_idle());
    assert_eq!(listener.completions(), 1);
    Ok(())
}

#[test]
fn never_more_than_one_worker_in_flight() -> TestResult {
    let exec = FakeExecutor::new();
    let log = EventLog::new();
    let workers: Vec<_> = (0..6).map(|i| logged(&format!("w{i}"), &log)).collect();

    let mut builder = Manager::topological().executor(exec.clone());
    for w in &workers {
        builder = builder.worker(w);
    }
    let mut manager = builder.build()?;
    manager.set_execution_mode(ExecutionMode::NonSerial);

    manager.start()?;
    assert_eq!(manager.running_count(), 1);
    assert_eq!(exec.queued(), 1);
    while exec.run_next() {
        assert!(manager.running_count() <= 1);
        manager.dispatch_signals();
    }
    assert_eq!(log.len(), 6);
    Ok(())
}

#[test]
fn cycle_produces_no_manager() {
    let log = EventLog::new();
    let a = logged("a", &log);
    let b = logged("b", &log);

    let result = Manager::topological()
        .before(&a, &b)
        .after(&a, &b)
        .executor(Arc::new(foreman_test_utils::RejectingExecutor))
        .build();

    match result {
        Err(ForemanError::DependencyCycle(msg)) => {
            assert!(msg.contains("'a'") || msg.contains("'b'"), "{msg}");
        }
        Err(other) => panic!("expected a cycle error, got {other}"),
        Ok(manager) => panic!("expected no manager, got {manager}"),
    }
}

#[test]
fn stop_drops_the_remaining_order() -> TestResult {
    let exec = FakeExecutor::new();
    let log = EventLog::new();
    let a = logged("a", &log);
    let b = logged("b", &log);
    let c = logged("c", &log);

    let mut manager = Manager::topological()
        .before(&a, &b)
        .before(&b, &c)
        .executor(exec.clone())
        .build()?;
    manager.start()?;

    // Closure-backed work cannot be cancelled.
    assert!(matches!(
        manager.stop(),
        Err(ForemanError::StopUnsupported { .. })
    ));
    assert_eq!(manager.pending_count(), 0);
    assert_eq!(manager.running_count(), 0);

    exec.run_all();
    manager.dispatch_signals();
    assert_eq!(log.entries(), ["a"]);
    assert_eq!(manager.status_info().num_complete, 0);
    Ok(())
}
