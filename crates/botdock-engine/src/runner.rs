//! Drives one bundled Build Context through the pipeline states.
//!
//! ```text
//! docker build --target builder -t <repo>:botdock-builder   BUILDING
//! docker build               -t <repo>:botdock-staging     PACKAGING
//! docker tag <repo>:botdock-staging <repo>:<tag>           PACKAGED
//! docker image rm <repo>:botdock-staging <repo>:botdock-builder
//! ```
//!
//! The requested tag is only written by the final `docker tag`, so a failed
//! or interrupted packaging step never leaves a runtime image under it.

use std::fmt;
use std::path::Path;

use botdock_core::{BUILDER_STAGE, Credential, PipelineRun, PipelineState, SecretDelivery};

use crate::client::{BuildRequest, DockerClient, ImageSummary};
use crate::docker::DockerError;
use crate::executor::DockerExecutor;

const BUILDER_TAG: &str = "botdock-builder";
const STAGING_TAG: &str = "botdock-staging";

/// `<repository>:<tag>` of the runtime image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub repository: String,
    pub tag: String,
}

impl ImageRef {
    pub fn new(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            tag: tag.into(),
        }
    }

    /// Intermediate tag for the builder stage; removed after every run.
    pub fn builder(&self) -> String {
        format!("{}:{BUILDER_TAG}", self.repository)
    }

    /// Tag the runtime image lives under until it is promoted.
    pub fn staging(&self) -> String {
        format!("{}:{STAGING_TAG}", self.repository)
    }

    /// Reject references docker would refuse, and the tags cleanup removes.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |reason| PipelineError::InvalidImage {
            image: self.to_string(),
            reason,
        };
        if let Some(reason) = repository_problem(&self.repository) {
            return Err(invalid(reason));
        }
        if let Some(reason) = tag_problem(&self.tag) {
            return Err(invalid(reason));
        }
        if self.tag == BUILDER_TAG || self.tag == STAGING_TAG {
            return Err(invalid("tag is reserved for intermediate images"));
        }
        Ok(())
    }
}

/// `[host[:port]/]component[/component...]`, components lowercase.
fn repository_problem(repository: &str) -> Option<&'static str> {
    if repository.is_empty() {
        return Some("repository is empty");
    }
    if repository.len() > 255 {
        return Some("repository is longer than 255 characters");
    }

    let mut parts: Vec<&str> = repository.split('/').collect();
    let first = parts[0];
    if parts.len() > 1 && (first.contains(['.', ':']) || first == "localhost") {
        let (host, port) = first.split_once(':').unwrap_or((first, ""));
        let host_ok = !host.is_empty()
            && host.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'));
        let port_ok = first.contains(':') == !port.is_empty()
            && port.chars().all(|c| c.is_ascii_digit());
        if !host_ok || !port_ok {
            return Some("registry host is malformed");
        }
        parts.remove(0);
    }

    for part in parts {
        if part.is_empty() {
            return Some("repository has an empty path component");
        }
        if !part
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
        {
            return Some("repository must be lowercase letters, digits, '.', '_' or '-'");
        }
        let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
        if !part.starts_with(alnum) || !part.ends_with(alnum) {
            return Some("repository components must start and end with a letter or digit");
        }
    }
    None
}

/// `[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}`
fn tag_problem(tag: &str) -> Option<&'static str> {
    if tag.is_empty() {
        return Some("tag is empty");
    }
    if tag.len() > 128 {
        return Some("tag is longer than 128 characters");
    }
    if tag.starts_with(['.', '-']) {
        return Some("tag must not start with '.' or '-'");
    }
    if !tag
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Some("tag must be letters, digits, '_', '.' or '-'");
    }
    None
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

/// Inputs for one pipeline invocation.
#[derive(Debug)]
pub struct BuildPlan<'a> {
    /// Bundle directory holding the sources and the Dockerfile.
    pub context: &'a Path,
    pub image: &'a ImageRef,
    pub delivery: SecretDelivery,
    pub env_var: &'a str,
    /// Required for `build_time_file`, ignored for `runtime_env`.
    pub credential: Option<&'a Credential>,
}

#[derive(Debug)]
pub struct PipelineReport {
    pub image: String,
    pub run: PipelineRun,
    pub summary: ImageSummary,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid image reference {image}: {reason}")]
    InvalidImage { image: String, reason: &'static str },

    #[error("{name} is required for delivery = build_time_file; set it in the environment or the dotenv file")]
    MissingCredential { name: String },

    #[error("credential rejected")]
    Credential { source: botdock_core::Error },

    #[error("builder stage failed; no image was produced")]
    BuildFailed { source: DockerError },

    #[error("packaging failed; no image was tagged")]
    PackagingFailed { source: DockerError },

    #[error("pipeline state error")]
    State { source: botdock_core::Error },
}

impl PipelineError {
    /// The last state the pipeline reached before failing.
    pub fn state(&self) -> PipelineState {
        match self {
            Self::InvalidImage { .. }
            | Self::MissingCredential { .. }
            | Self::Credential { .. }
            | Self::State { .. } => PipelineState::BuildPending,
            Self::BuildFailed { .. } => PipelineState::BuildFailed,
            Self::PackagingFailed { .. } => PipelineState::Packaging,
        }
    }
}

pub struct PipelineRunner<'c, E: DockerExecutor> {
    client: &'c DockerClient<E>,
}

impl<'c, E: DockerExecutor> PipelineRunner<'c, E> {
    pub fn new(client: &'c DockerClient<E>) -> Self {
        Self { client }
    }

    pub async fn run(&self, plan: &BuildPlan<'_>) -> Result<PipelineReport, PipelineError> {
        plan.image.validate()?;
        let build_args = build_args(plan)?;
        let mut run = PipelineRun::new();

        let result = self.drive(plan, &build_args, &mut run).await;
        self.cleanup(plan.image).await;

        let summary = result?;
        tracing::info!(image = %plan.image, id = summary.short_id(), "image packaged");
        Ok(PipelineReport {
            image: plan.image.to_string(),
            run,
            summary,
        })
    }

    async fn drive(
        &self,
        plan: &BuildPlan<'_>,
        build_args: &[Credential],
        run: &mut PipelineRun,
    ) -> Result<ImageSummary, PipelineError> {
        advance(run, PipelineState::Building)?;
        let builder_tag = plan.image.builder();
        let built = self
            .client
            .build(&BuildRequest {
                context: plan.context,
                target: Some(BUILDER_STAGE),
                tag: &builder_tag,
                build_args,
            })
            .await;
        if let Err(e) = built {
            advance(run, PipelineState::BuildFailed)?;
            return Err(PipelineError::BuildFailed { source: e });
        }
        advance(run, PipelineState::BuildSucceeded)?;

        advance(run, PipelineState::Packaging)?;
        let staging_tag = plan.image.staging();
        let final_tag = plan.image.to_string();
        self.client
            .build(&BuildRequest {
                context: plan.context,
                target: None,
                tag: &staging_tag,
                build_args,
            })
            .await
            .map_err(|e| PipelineError::PackagingFailed { source: e })?;
        let summary = self
            .client
            .inspect(&staging_tag)
            .await
            .map_err(|e| PipelineError::PackagingFailed { source: e })?;
        self.client
            .tag(&staging_tag, &final_tag)
            .await
            .map_err(|e| PipelineError::PackagingFailed { source: e })?;
        advance(run, PipelineState::Packaged)?;

        Ok(summary)
    }

    async fn cleanup(&self, image: &ImageRef) {
        for tag in [image.staging(), image.builder()] {
            if !self.client.image_exists(&tag).await {
                continue;
            }
            match self.client.remove_image(&tag).await {
                Ok(()) => tracing::debug!(tag = %tag, "intermediate tag removed"),
                Err(e) => tracing::warn!(tag = %tag, error = %e, "failed to remove intermediate tag"),
            }
        }
    }
}

fn advance(run: &mut PipelineRun, next: PipelineState) -> Result<(), PipelineError> {
    run.advance(next)
        .map(|_| ())
        .map_err(|e| PipelineError::State { source: e })
}

/// The credential is only handed to the builder when it is baked in.
fn build_args(plan: &BuildPlan<'_>) -> Result<Vec<Credential>, PipelineError> {
    match plan.delivery {
        SecretDelivery::RuntimeEnv => {
            if plan.credential.is_some() {
                tracing::debug!(var = plan.env_var, "credential withheld from build; delivered at run time");
            }
            Ok(Vec::new())
        }
        SecretDelivery::BuildTimeFile => {
            let credential = plan
                .credential
                .ok_or_else(|| PipelineError::MissingCredential {
                    name: plan.env_var.to_owned(),
                })?;
            credential
                .ensure_dotenv_safe()
                .map_err(|e| PipelineError::Credential { source: e })?;
            Ok(vec![credential.clone()])
        }
    }
}
