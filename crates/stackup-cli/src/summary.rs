//! Salida para el operador: resumen de configuración, resumen final y estado.

use serde::Serialize;
use stackup_core::{RunConfiguration, RunReport, WorkflowInstance};
use stackup_host::service_endpoints;

/// Resumen previo a la confirmación. Los secretos salen redactados.
pub fn configuration_text(cfg: &RunConfiguration) -> String {
    let s = cfg.secrets();
    format!("Configuration:\n  management address: {}\n  provider interface: {}\n  admin password:     {}\n  \
             other credentials:  generated\n  fingerprint:        {}",
            cfg.management_address(),
            cfg.provider_interface(),
            s.admin_password,
            &cfg.fingerprint()[..12])
}

#[derive(Debug, Serialize)]
pub struct Endpoint {
    pub service: &'static str,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct Credentials {
    pub admin_user: &'static str,
    pub admin_password: String,
    pub demo_user: &'static str,
    pub demo_password: String,
    pub database_root_password: String,
}

/// Resumen final de un run completo; incluye credenciales en claro.
#[derive(Debug, Serialize)]
pub struct FinalSummary {
    pub run_id: String,
    pub executed: Vec<String>,
    pub skipped: usize,
    pub endpoints: Vec<Endpoint>,
    pub credentials: Credentials,
}

impl FinalSummary {
    pub fn new(report: &RunReport, cfg: &RunConfiguration) -> Self {
        let s = cfg.secrets();
        Self { run_id: report.run_id.to_string(),
               executed: report.executed.clone(),
               skipped: report.skipped.len(),
               endpoints: service_endpoints(cfg).into_iter()
                                                .map(|(service, url)| Endpoint { service, url })
                                                .collect(),
               credentials: Credentials { admin_user: stackup_host::ops::ADMIN_USER,
                                          admin_password: s.admin_password.expose().to_string(),
                                          demo_user: stackup_host::steps::DEMO_NAME,
                                          demo_password: s.demo_password.expose().to_string(),
                                          database_root_password: s.db_root_password.expose().to_string() } }
    }

    pub fn to_text(&self) -> String {
        let mut out = format!("Installation complete ({} steps run, {} already done).\n\nEndpoints:\n",
                              self.executed.len(),
                              self.skipped);
        for e in &self.endpoints {
            out.push_str(&format!("  {:<14} {}\n", e.service, e.url));
        }
        let c = &self.credentials;
        out.push_str(&format!("\nCredentials:\n  {:<14} {}\n  {:<14} {}\n  {:<14} {}\n",
                              c.admin_user, c.admin_password, c.demo_user, c.demo_password, "db root", c.database_root_password));
        out.push_str("\nCredential files: /root/admin-openrc, /root/demo-openrc\n");
        out
    }
}

/// Tabla de `stackup status`.
pub fn status_text(status: &WorkflowInstance) -> String {
    let mut out = String::new();
    for (i, slot) in status.steps.iter().enumerate() {
        let marker = if i == status.cursor && !status.completed { "->" } else { "  " };
        out.push_str(&format!("{marker} {:>2}. {:<24} {}", i + 1, slot.step_id, slot.status.label()));
        if let Some(err) = &slot.error {
            out.push_str(&format!("  ({err})"));
        }
        out.push('\n');
    }
    let done = status.steps.iter().filter(|s| s.status == stackup_core::StepStatus::FinishedOk).count();
    out.push_str(&format!("{done}/{} steps done", status.steps.len()));
    if !status.unknown_completed.is_empty() {
        out.push_str(&format!("; ledger also lists retired steps: {}", status.unknown_completed.join(", ")));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use std::net::IpAddr;

    use stackup_core::{Secret, Secrets};
    use uuid::Uuid;

    use super::*;

    fn cfg() -> RunConfiguration {
        RunConfiguration::new("10.0.0.11".parse::<IpAddr>().unwrap(),
                              "eth1",
                              Secrets::generate().with_admin_password(Secret::new("hunter2hunter2")))
    }

    #[test]
    fn configuration_text_redacts_secrets() {
        let text = configuration_text(&cfg());
        assert!(text.contains("management address: 10.0.0.11"));
        assert!(text.contains("admin password:     ******"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn final_summary_lists_endpoints_and_credentials() {
        let report = RunReport { run_id: Uuid::nil(),
                                 definition_hash: "abc".into(),
                                 executed: vec!["verify-services".into()],
                                 skipped: vec!["apt-update".into()] };
        let summary = FinalSummary::new(&report, &cfg());
        let text = summary.to_text();
        assert!(text.contains("dashboard      http://10.0.0.11/horizon"));
        assert!(text.contains("admin          hunter2hunter2"));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["credentials"]["admin_password"], "hunter2hunter2");
        assert_eq!(json["endpoints"][1]["service"], "identity");
    }
}
