//! Post-build inspection of a packaged image.
//!
//! Checks what the image is allowed to carry for its delivery variant:
//! the declared variable name, no bound credential, an exec-form entry point
//! on the artifact, a layer history free of the credential value, and the
//! dotenv file present (and byte-identical) only for `build_time_file`.

use std::fmt;

use botdock_core::{Credential, SecretDelivery, StagePaths};

use crate::client::{CheckResult, DockerClient};
use crate::docker::DockerError;
use crate::executor::DockerExecutor;

/// What the image is checked against.
#[derive(Debug)]
pub struct AuditExpectation<'a> {
    pub env_var: &'a str,
    pub delivery: SecretDelivery,
    pub paths: &'a StagePaths,
    /// Without a credential the value-based checks are skipped.
    pub credential: Option<&'a Credential>,
}

#[derive(Debug, Default)]
pub struct AuditReport {
    pub image: String,
    pub declared: CheckResult,
    pub unbound: CheckResult,
    pub entrypoint: CheckResult,
    pub history: CheckResult,
    pub dotenv: CheckResult,
}

impl AuditReport {
    pub fn passed(&self) -> bool {
        self.rows().iter().all(|(_, r)| r.passed)
    }

    fn rows(&self) -> [(&'static str, &CheckResult); 5] {
        [
            ("Declared env", &self.declared),
            ("Value unbound", &self.unbound),
            ("Entry point", &self.entrypoint),
            ("Layer history", &self.history),
            ("Dotenv file", &self.dotenv),
        ]
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Image: {}", self.image)?;
        for (name, result) in self.rows() {
            writeln!(f, "  {name:<16}{:<4}{}", result.icon(), result.detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("failed to inspect image {image}")]
    Inspect { image: String, source: DockerError },

    #[error("failed to read image history of {image}")]
    History { image: String, source: DockerError },

    #[error("failed to create scratch directory")]
    Scratch { source: std::io::Error },

    #[error("failed to copy {path} out of {image}")]
    CopyOut {
        image: String,
        path: String,
        source: DockerError,
    },

    #[error("failed to read {path} copied out of the image")]
    ReadCopied {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

pub async fn audit_image<E: DockerExecutor>(
    client: &DockerClient<E>,
    image: &str,
    expect: &AuditExpectation<'_>,
) -> Result<AuditReport, AuditError> {
    let summary = client
        .inspect(image)
        .await
        .map_err(|e| AuditError::Inspect {
            image: image.to_owned(),
            source: e,
        })?;

    let mut report = AuditReport {
        image: image.to_owned(),
        ..Default::default()
    };

    let declared = summary.declared_env();
    report.declared = if declared.contains(&expect.env_var) {
        CheckResult::ok(&declared.join(","))
    } else {
        CheckResult::fail(&format!("{} not declared", expect.env_var))
    };

    report.unbound = if summary.binds_env(expect.env_var) {
        CheckResult::fail(&format!("{} is bound in the image config", expect.env_var))
    } else {
        CheckResult::ok("no value in image config")
    };

    let artifact = expect.paths.runtime_artifact_path();
    report.entrypoint = if summary.config.entrypoint == [artifact.as_str()] && summary.config.cmd.is_empty()
    {
        CheckResult::ok(&artifact)
    } else {
        CheckResult::fail(&format!(
            "expected [\"{artifact}\"], found {:?} {:?}",
            summary.config.entrypoint, summary.config.cmd
        ))
    };

    report.history = match expect.credential {
        Some(credential) => {
            let history = client
                .history(image)
                .await
                .map_err(|e| AuditError::History {
                    image: image.to_owned(),
                    source: e,
                })?;
            let leaks = history
                .iter()
                .filter(|line| credential.appears_in(line))
                .count();
            if leaks == 0 {
                CheckResult::ok(&format!("{} layers, value not present", history.len()))
            } else {
                CheckResult::fail(&format!("value appears in {leaks} layer(s)"))
            }
        }
        None => CheckResult::ok("skipped (no credential available)"),
    };

    report.dotenv = check_dotenv(client, image, expect).await?;

    tracing::debug!(image, passed = report.passed(), "image audited");
    Ok(report)
}

async fn check_dotenv<E: DockerExecutor>(
    client: &DockerClient<E>,
    image: &str,
    expect: &AuditExpectation<'_>,
) -> Result<CheckResult, AuditError> {
    let scratch = tempfile::TempDir::new().map_err(|e| AuditError::Scratch { source: e })?;
    let local = scratch.path().join(&expect.paths.dotenv_file);
    let in_image = expect.paths.dotenv_path();

    let copied = client
        .copy_from_image(image, &in_image, &local)
        .await
        .map_err(|e| AuditError::CopyOut {
            image: image.to_owned(),
            path: in_image.clone(),
            source: e,
        })?;

    match (expect.delivery, copied) {
        (SecretDelivery::RuntimeEnv, false) => Ok(CheckResult::ok(&format!("{in_image} absent"))),
        (SecretDelivery::RuntimeEnv, true) => Ok(CheckResult::fail(&format!(
            "{in_image} present with delivery = runtime_env"
        ))),
        (SecretDelivery::BuildTimeFile, false) => {
            Ok(CheckResult::fail(&format!("{in_image} missing")))
        }
        (SecretDelivery::BuildTimeFile, true) => {
            let Some(credential) = expect.credential else {
                return Ok(CheckResult::ok(&format!("{in_image} present (value not compared)")));
            };
            let content = std::fs::read(&local).map_err(|e| AuditError::ReadCopied {
                path: local.clone(),
                source: e,
            })?;
            let matches = credential
                .dotenv_line()
                .is_ok_and(|line| line.as_bytes() == content.as_slice());
            Ok(if matches {
                CheckResult::ok(&format!("{in_image} matches {}", credential.name()))
            } else {
                CheckResult::fail(&format!("{in_image} differs from {}", credential.name()))
            })
        }
    }
}
