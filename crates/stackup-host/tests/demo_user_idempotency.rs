//! create-demo-user contra un servicio de identidad simulado: la segunda
//! ejecución del body no emite ningún comando mutante.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;
use std::rc::Rc;

use stackup_core::{ExecutionContext, RunConfiguration, Secrets, StepDefinition, StepRunResult};
use stackup_host::{reference_workflow, CommandOutput, CommandRunner, HostCommand, HostError, HostOps};
use uuid::Uuid;

/// Recursos de identidad en memoria, manipulados sólo por `openstack ...`.
#[derive(Default)]
struct FakeIdentity {
    resources: RefCell<BTreeSet<(String, String)>>,
    assignments: RefCell<BTreeSet<(String, String, String)>>,
    passwords: RefCell<BTreeMap<String, String>>,
    mutations: RefCell<Vec<String>>,
}

fn env<'a>(cmd: &'a HostCommand, key: &str) -> &'a str {
    cmd.env.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str()).unwrap_or("")
}

impl CommandRunner for FakeIdentity {
    fn run(&self, cmd: &HostCommand) -> Result<CommandOutput, HostError> {
        assert_eq!(cmd.program, "openstack", "unexpected program {}", cmd.program);
        if cmd.mutating {
            self.mutations.borrow_mut().push(cmd.line());
        }
        let a: Vec<&str> = cmd.args.iter().map(String::as_str).collect();
        let out = match a.as_slice() {
            [kind, "show", name] => {
                if self.resources.borrow().contains(&(kind.to_string(), name.to_string())) {
                    CommandOutput::ok(*name)
                } else {
                    CommandOutput::failed(1, format!("No {kind} with a name or ID of '{name}' exists."))
                }
            }
            ["token", "issue", ..] => {
                let user = env(cmd, "OS_USERNAME");
                let pw = env(cmd, "OS_PASSWORD");
                if self.passwords.borrow().get(user).map(String::as_str) == Some(pw) {
                    CommandOutput::ok("gAAAAA")
                } else {
                    CommandOutput::failed(1, "The request you have made requires authentication. (HTTP 401)")
                }
            }
            ["user", "set", "--password", pw, name] => {
                self.passwords.borrow_mut().insert(name.to_string(), pw.to_string());
                CommandOutput::ok("")
            }
            ["role", "assignment", "list", "--project", p, "--user", u, "--role", r, ..] => {
                let key = (p.to_string(), u.to_string(), r.to_string());
                if self.assignments.borrow().contains(&key) {
                    CommandOutput::ok(format!("{r} {u} {p}"))
                } else {
                    CommandOutput::ok("")
                }
            }
            ["role", "add", "--project", p, "--user", u, r] => {
                self.assignments.borrow_mut().insert((p.to_string(), u.to_string(), r.to_string()));
                CommandOutput::ok("")
            }
            [kind, "create", rest @ .., name] => {
                if let Some(i) = rest.iter().position(|a| *a == "--password") {
                    self.passwords.borrow_mut().insert(name.to_string(), rest[i + 1].to_string());
                }
                let fresh = self.resources.borrow_mut().insert((kind.to_string(), name.to_string()));
                if fresh {
                    CommandOutput::ok("")
                } else {
                    CommandOutput::failed(1, "Conflict occurred attempting to store")
                }
            }
            other => panic!("unscripted command {other:?}"),
        };
        Ok(out)
    }
}

fn run_step(step: &dyn StepDefinition, cfg: &RunConfiguration) -> StepRunResult {
    let ctx = ExecutionContext { config: cfg,
                                 run_id: Uuid::new_v4(),
                                 position: 15,
                                 step_count: 30 };
    step.run(&ctx)
}

#[test]
fn create_demo_user_twice_mutates_only_once() {
    let root = tempfile::tempdir().unwrap();
    let identity = Rc::new(FakeIdentity::default());
    let ops = Rc::new(HostOps::new(identity.clone(), root.path()));
    let steps = reference_workflow(ops);
    let step = steps.iter().find(|s| s.id() == "create-demo-user").unwrap();
    let cfg = RunConfiguration::new("10.0.0.11".parse::<IpAddr>().unwrap(), "eth1", Secrets::generate());

    assert!(run_step(step.as_ref(), &cfg).is_success());
    let first = identity.mutations.borrow().clone();
    assert_eq!(first.len(), 4);
    assert!(first[0].starts_with("openstack project create"));
    assert!(first[3].starts_with("openstack role add --project demo --user demo user"));

    identity.mutations.borrow_mut().clear();
    let second = run_step(step.as_ref(), &cfg);
    assert!(second.is_success());
    assert!(identity.mutations.borrow().is_empty());
    match second {
        StepRunResult::SuccessWithSignals { signals } => {
            assert!(signals.iter().all(|s| s.data["change"] == "unchanged"));
        }
        other => panic!("expected signals, got {other:?}"),
    }
}

#[test]
fn partially_created_demo_resources_are_completed() {
    let root = tempfile::tempdir().unwrap();
    let identity = Rc::new(FakeIdentity::default());
    // un run anterior se interrumpió tras crear el proyecto
    identity.resources.borrow_mut().insert(("project".into(), "demo".into()));
    let ops = Rc::new(HostOps::new(identity.clone(), root.path()));
    let steps = reference_workflow(ops);
    let step = steps.iter().find(|s| s.id() == "create-demo-user").unwrap();
    let cfg = RunConfiguration::new("10.0.0.11".parse::<IpAddr>().unwrap(), "eth1", Secrets::generate());

    assert!(run_step(step.as_ref(), &cfg).is_success());
    let muts = identity.mutations.borrow();
    assert_eq!(muts.len(), 3);
    assert!(!muts.iter().any(|m| m.starts_with("openstack project create")));
}

#[test]
fn demo_user_with_stale_password_is_reset() {
    let root = tempfile::tempdir().unwrap();
    let identity = Rc::new(FakeIdentity::default());
    identity.resources.borrow_mut().insert(("user".into(), "demo".into()));
    identity.passwords.borrow_mut().insert("demo".into(), "from-an-older-run".into());
    let ops = Rc::new(HostOps::new(identity.clone(), root.path()));
    let steps = reference_workflow(ops);
    let step = steps.iter().find(|s| s.id() == "create-demo-user").unwrap();
    let cfg = RunConfiguration::new("10.0.0.11".parse::<IpAddr>().unwrap(), "eth1", Secrets::generate());

    assert!(run_step(step.as_ref(), &cfg).is_success());
    assert!(identity.mutations.borrow().iter().any(|m| m.starts_with("openstack user set --password")));
    assert!(!identity.mutations.borrow().iter().any(|m| m.starts_with("openstack user create")));
    assert_eq!(identity.passwords.borrow()["demo"], cfg.secrets().demo_password.expose());

    identity.mutations.borrow_mut().clear();
    assert!(run_step(step.as_ref(), &cfg).is_success());
    assert!(identity.mutations.borrow().is_empty());
}
