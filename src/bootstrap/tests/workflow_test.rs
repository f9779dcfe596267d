//! Integration tests for the task executor and progress interpolation.
//!
//! Exec tasks run real (trivial) host commands; kubectl-backed tasks are not
//! exercised here since they need a cluster.

use bootstrap::{run_tasks, BootstrapTask, ExecTask, HostRunner, TaskExecutor, WaitTask};
use std::sync::Mutex;
use std::time::Duration;

fn executor() -> TaskExecutor {
    TaskExecutor::new(HostRunner::new(), std::env::temp_dir())
}

#[tokio::test]
async fn test_run_tasks_reports_progress_span() {
    let tasks = vec![
        BootstrapTask::exec(ExecTask::new(
            "step-one",
            "sh",
            vec!["-c".to_string(), "exit 0".to_string()],
        )),
        BootstrapTask::exec(ExecTask::new(
            "step-two",
            "sh",
            vec!["-c".to_string(), "exit 0".to_string()],
        )),
    ];

    let seen = Mutex::new(Vec::new());
    run_tasks(
        &tasks,
        &executor(),
        20,
        80,
        |p, m| seen.lock().unwrap().push((p, m.to_string())),
        "test",
    )
    .await
    .unwrap();

    let seen = seen.into_inner().unwrap();
    assert_eq!(seen.first().unwrap().0, 20);
    assert_eq!(seen.last().unwrap().0, 80);
    assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0), "{seen:?}");
    assert!(seen
        .iter()
        .any(|(_, m)| m.contains("sh/step-one")));
}

#[tokio::test]
async fn test_run_tasks_fails_fast() {
    let tasks = vec![
        BootstrapTask::exec(ExecTask::new(
            "boom",
            "sh",
            vec!["-c".to_string(), "echo kaput >&2; exit 3".to_string()],
        )),
        BootstrapTask::exec(ExecTask::new(
            "never-runs",
            "sh",
            vec!["-c".to_string(), "exit 0".to_string()],
        )),
    ];

    let seen = Mutex::new(Vec::new());
    let err = run_tasks(
        &tasks,
        &executor(),
        0,
        100,
        |p, m| seen.lock().unwrap().push((p, m.to_string())),
        "test",
    )
    .await
    .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("sh/boom"), "{message}");
    assert!(message.contains("exit code 3"), "{message}");
    assert!(message.contains("kaput"), "{message}");
    assert!(!seen
        .lock()
        .unwrap()
        .iter()
        .any(|(_, m)| m.contains("never-runs")));
}

#[tokio::test]
async fn test_exec_task_missing_binary() {
    let task = BootstrapTask::exec(ExecTask::new(
        "missing",
        "xpdemo-definitely-not-a-binary",
        vec![],
    ));
    let err = executor().execute(&task).await.unwrap_err();
    assert!(err.to_string().contains("not found on PATH"), "{err}");
}

#[tokio::test]
async fn test_exec_task_timeout() {
    let task = BootstrapTask::exec(
        ExecTask::new("sleepy", "sh", vec!["-c".to_string(), "sleep 5".to_string()])
            .with_timeout(Duration::from_millis(200)),
    );
    let err = executor().execute(&task).await.unwrap_err();
    assert!(err.to_string().contains("did not finish"), "{err}");
}

#[test]
fn test_display_names() {
    let exec = BootstrapTask::exec(ExecTask::new("install", "helm", vec![]));
    assert_eq!(exec.display_name(), "helm/install");

    let wait = BootstrapTask::wait(WaitTask::new(
        "provider-helm",
        "provider.pkg.crossplane.io/provider-helm",
        "Healthy",
    ));
    assert_eq!(wait.display_name(), "wait/provider-helm");
}
