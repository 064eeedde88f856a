use std::path::{Path, PathBuf};

use botdock_engine::{DockerClient, RunRequest};

use super::BotProject;

/// Run the packaged image once and return the container's exit code.
///
/// The credential is forwarded by name only. When it is not available the
/// container is started anyway; reporting the missing token is the bot's job.
pub async fn run(tag: Option<String>, env_file: Option<PathBuf>) -> anyhow::Result<i32> {
    let project = BotProject::load(Path::new("."))?;
    let image = project.image(tag.as_deref()).to_string();

    let client = DockerClient::new();
    if !client.image_exists(&image).await {
        anyhow::bail!("image {image} not found. Run `botdock build` first.");
    }

    let credential = project.credential()?;
    if credential.is_none() && env_file.is_none() {
        tracing::warn!(
            var = %project.config.secret.env_var,
            "credential not set; the bot will start without it"
        );
    }
    let env: Vec<_> = credential.into_iter().collect();

    let code = client
        .run(&RunRequest {
            image: &image,
            env: &env,
            env_file: env_file.as_deref(),
        })
        .await?;

    tracing::debug!(image = %image, code, "container exited");
    Ok(code)
}
