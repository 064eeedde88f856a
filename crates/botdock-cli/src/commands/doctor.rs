use std::path::Path;

use botdock_core::{BotdockConfig, CONFIG_FILE, CargoProject, Credential, SecretDelivery};
use botdock_engine::{CheckResult, DockerClient, DoctorReport};

pub async fn doctor() -> anyhow::Result<()> {
    let report = diagnose(Path::new(".")).await;

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed; see above for details");
    }
    Ok(())
}

/// Every check runs regardless of earlier failures.
pub(crate) async fn diagnose(project_dir: &Path) -> DoctorReport {
    let mut report = DockerClient::new().doctor().await;

    let config = match BotdockConfig::load(project_dir) {
        Ok(c) => {
            report.config_file = if project_dir.join(CONFIG_FILE).exists() {
                CheckResult::ok("Found")
            } else {
                CheckResult::ok("Not found (using defaults)")
            };
            c
        }
        Err(e) => {
            report.config_file = CheckResult::fail(&e.to_string());
            BotdockConfig::default()
        }
    };

    report.cargo_project =
        match CargoProject::discover(project_dir, config.project.binary.as_deref()) {
            Ok(p) if p.is_workspace_member() => CheckResult::ok(&format!(
                "{} v{} (--bin {}), member of {}; only {} is bundled",
                p.name,
                p.version,
                p.binary,
                p.workspace_root.display(),
                p.package_dir.display()
            )),
            Ok(p) => CheckResult::ok(&format!("{} v{} (--bin {})", p.name, p.version, p.binary)),
            Err(e) => CheckResult::fail(&e.to_string()),
        };

    let var = &config.secret.env_var;
    let dotenv = project_dir.join(&config.paths.dotenv_file);
    report.credential = match (Credential::resolve(var, &dotenv), config.secret.delivery) {
        (Ok(c), SecretDelivery::BuildTimeFile) => match c.ensure_dotenv_safe() {
            Ok(()) => CheckResult::ok(&format!("{var} set")),
            Err(e) => CheckResult::fail(&e.to_string()),
        },
        (Ok(_), SecretDelivery::RuntimeEnv) => CheckResult::ok(&format!("{var} set")),
        (Err(botdock_core::Error::CredentialMissing { .. }), SecretDelivery::RuntimeEnv) => {
            CheckResult::ok(&format!("{var} not set (needed at `botdock run`)"))
        }
        (Err(e), _) => CheckResult::fail(&e.to_string()),
    };

    report
}
