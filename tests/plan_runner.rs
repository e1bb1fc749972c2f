// tests/plan_runner.rs
#![cfg(unix)]

use std::error::Error;
use std::fs;
use std::io::Write;

use foreman::cli::CliArgs;
use foreman::config::load_and_validate;
use foreman::{ExecutionMode, ForemanError, build_manager, run};
use foreman_test_utils::{init_tracing, with_timeout};
use tempfile::NamedTempFile;

type TestResult = Result<(), Box<dyn Error>>;

fn plan_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn args(file: &NamedTempFile, dry_run: bool) -> CliArgs {
    CliArgs {
        plan: file.path().to_path_buf(),
        log_level: None,
        dry_run,
    }
}

#[tokio::test]
async fn topological_plan_runs_commands_in_order() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempfile::tempdir()?;
        let out = dir.path().join("order.txt");
        let out = out.display();
        let file = plan_file(&format!(
            r#"
[manager]
id = "ordered"
policy = "topological"

[worker.package]
cmd = "echo package >> {out}"
after = ["compile"]

[worker.compile]
cmd = "echo compile >> {out}"

[worker.fetch]
cmd = "echo fetch >> {out}"
before = ["compile"]
"#
        ));

        let plan = load_and_validate(file.path())?;
        let mut manager = build_manager(&plan)?;
        assert_eq!(manager.execution_mode(), ExecutionMode::Serial);
        assert_eq!(manager.status_info().num_total, 3);

        manager.start()?;
        manager.run_until_settled().await;
        assert!(manager.is_idle());

        let written = fs::read_to_string(dir.path().join("order.txt"))?;
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines, ["fetch", "compile", "package"]);
        Ok::<_, Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn run_reports_success_and_failure() -> TestResult {
    with_timeout(async {
        let ok = plan_file(
            r#"
[worker.a]
cmd = "true"
[worker.b]
cmd = "exit 0"
"#,
        );
        assert!(run(args(&ok, false)).await?);

        let failing = plan_file(
            r#"
[manager]
execution_mode = "serial"
[worker.a]
cmd = "exit 7"
"#,
        );
        assert!(!run(args(&failing, false)).await?);
        Ok::<_, Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn dry_run_executes_nothing() -> TestResult {
    with_timeout(async {
        let dir = tempfile::tempdir()?;
        let marker = dir.path().join("ran");
        let file = plan_file(&format!("[worker.a]\ncmd = \"touch {}\"\n", marker.display()));

        assert!(run(args(&file, true)).await?);
        assert!(!marker.exists());
        Ok::<_, Box<dyn Error>>(())
    })
    .await
}

#[test]
fn cyclic_plan_fails_when_the_manager_is_built() {
    let file = plan_file(
        r#"
[manager]
policy = "topological"
[worker.a]
cmd = "true"
after = ["b"]
[worker.b]
cmd = "true"
after = ["a"]
"#,
    );

    let plan = load_and_validate(file.path()).unwrap();
    assert!(matches!(
        build_manager(&plan),
        Err(ForemanError::DependencyCycle(_))
    ));
}

#[test]
fn priority_plan_enqueues_by_priority() {
    let file = plan_file(
        r#"
[manager]
execution_mode = "serial"
[worker.low]
cmd = "true"
priority = 1
[worker.high]
cmd = "true"
priority = 5
"#,
    );

    let plan = load_and_validate(file.path()).unwrap();
    let manager = build_manager(&plan).unwrap();
    let order: Vec<String> = manager
        .pending_workers()
        .iter()
        .map(|w| w.id().to_string())
        .collect();
    assert_eq!(order, ["high", "low"]);
}
