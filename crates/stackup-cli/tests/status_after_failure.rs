use std::io::Cursor;
use std::rc::Rc;

use stackup_cli::commands;
use stackup_cli::summary::status_text;
use stackup_cli::InstallArgs;
use stackup_core::StepStatus;
use stackup_host::{CommandOutput, ScriptedRunner, StaticInterfaces};
use stackup_persistence::StatePaths;

fn install_args(root: &std::path::Path) -> InstallArgs {
    InstallArgs { yes: true,
                  root: root.to_path_buf(),
                  json: false,
                  management_address: Some("10.0.0.11".parse().unwrap()),
                  provider_interface: Some("eth1".into()) }
}

fn runner() -> Rc<ScriptedRunner> {
    let runner = Rc::new(ScriptedRunner::new());
    runner
}

fn interfaces() -> Rc<StaticInterfaces> {
    Rc::new(StaticInterfaces::new().with("eth0", &["10.0.0.11"]).with("eth1", &[]))
}

#[test]
fn status_points_at_the_failed_step() {
    let state = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let paths = StatePaths::in_dir(state.path());
    let runner = runner();
    runner.on("apt-get install -y --no-install-recommends rabbitmq-server",
              CommandOutput::failed(100, "E: Unable to locate package rabbitmq-server"));

    let err = commands::install(&paths, &install_args(root.path()), runner, interfaces(), Cursor::new(""), &mut Vec::new()).unwrap_err();
    assert_eq!(commands::exit_code(&err), commands::EXIT_STEP_FAILED);

    let status = commands::status(&paths).unwrap();
    assert_eq!(status.steps[status.cursor].step_id, "install-rabbitmq");
    assert_eq!(status.steps[status.cursor].status, StepStatus::Failed);
    assert!(status.steps[..status.cursor].iter().all(|s| s.status == StepStatus::FinishedOk));
    assert!(status.steps[status.cursor + 1..].iter().all(|s| s.status == StepStatus::Pending));

    let text = status_text(&status);
    assert!(text.contains("->  7. install-rabbitmq"));
    assert!(text.contains("6/30 steps done"));

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["steps"][6]["status"], "Failed");
}

#[test]
fn status_without_state_is_all_pending() {
    let state = tempfile::tempdir().unwrap();
    let status = commands::status(&StatePaths::in_dir(state.path())).unwrap();
    assert_eq!(status.cursor, 0);
    assert!(!status.completed);
    assert!(status.run_id.is_none());
}
