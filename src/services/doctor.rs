use crate::domain::models::{CheckItem, DoctorReport};
use crate::services::cluster::StatePaths;
use crate::services::invoke;
use std::path::Path;

/// Preflight the cluster state dir without constructing a client. Mirrors
/// the checks `ClusterClient::new` performs, plus a tool availability probe.
pub fn state_doctor(cli_path: &str, state_dir: &Path) -> DoctorReport {
    let paths = StatePaths::new(state_dir);
    let mut checks = vec![CheckItem {
        name: "state_dir_exists".to_string(),
        status: if state_dir.exists() { "ok" } else { "missing" }.to_string(),
    }];

    for (name, file) in paths.required() {
        checks.push(CheckItem {
            name: name.to_string(),
            status: if file.exists() { "ok" } else { "missing" }.to_string(),
        });
    }

    checks.push(CheckItem {
        name: "cli_available".to_string(),
        status: if invoke::run(cli_path, &["--version".to_string()]).is_ok() {
            "ok"
        } else {
            "missing"
        }
        .to_string(),
    });

    let overall = if checks.iter().all(|c| c.status == "ok") {
        "ok"
    } else {
        "needs_attention"
    }
    .to_string();

    DoctorReport { overall, checks }
}
