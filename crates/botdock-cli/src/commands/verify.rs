use std::path::Path;

use botdock_engine::{AuditExpectation, DockerClient, audit_image};

use super::BotProject;

/// Audit the packaged image against the configured delivery variant.
pub async fn verify(tag: Option<String>) -> anyhow::Result<()> {
    let project = BotProject::load(Path::new("."))?;
    let image = project.image(tag.as_deref()).to_string();
    let credential = project.credential()?;

    let client = DockerClient::new();
    let report = audit_image(
        &client,
        &image,
        &AuditExpectation {
            env_var: &project.config.secret.env_var,
            delivery: project.config.secret.delivery,
            paths: &project.config.paths,
            credential: credential.as_ref(),
        },
    )
    .await?;

    println!("{report}");

    if !report.passed() {
        anyhow::bail!("image {image} failed verification; see above for details");
    }
    Ok(())
}
