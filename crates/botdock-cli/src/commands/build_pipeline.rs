use botdock_build::bundle;
use botdock_engine::{BuildPlan, DockerClient, PipelineReport, PipelineRunner};
use std::path::Path;

use super::{BotProject, DeliveryArg};

pub(crate) struct BuildOptions<'a> {
    pub allow_dirty: bool,
    pub delivery: Option<DeliveryArg>,
    pub tag: Option<&'a str>,
}

/// Result of a successful pipeline run.
pub(crate) struct BuildOutcome {
    pub steps: Vec<String>,
    pub report: PipelineReport,
}

/// Run the full build pipeline: dirty check → Dockerfile → bundle → builder → runtime.
///
/// Shared by `botdock build` and the MCP `build` tool.
pub(crate) async fn run(project_dir: &Path, opts: BuildOptions<'_>) -> anyhow::Result<BuildOutcome> {
    let mut steps = Vec::new();

    if !opts.allow_dirty && bundle::is_dirty(project_dir)? {
        anyhow::bail!(
            "uncommitted changes detected.\n\
             Commit your changes, or pass --allow-dirty / allow_dirty=true to build anyway."
        );
    }

    let project = BotProject::load(project_dir)?.with_delivery(opts.delivery);
    let secret = &project.config.secret;
    let image = project.image(opts.tag);
    image.validate()?;
    steps.push(format!(
        "Building {} (--bin {}) as {image}, delivery = {}",
        project.cargo.name, project.cargo.binary, secret.delivery
    ));

    if project.cargo.is_workspace_member() {
        tracing::warn!(
            package_dir = %project.cargo.package_dir.display(),
            workspace_root = %project.cargo.workspace_root.display(),
            "only the package directory is bundled; workspace-inherited manifest keys will not resolve"
        );
    }

    let (dockerfile, ejected) = project.dockerfile()?;
    if ejected {
        steps.push("Using ejected Dockerfile from .botdock/Dockerfile".to_string());
        if opts.delivery.is_some() {
            tracing::warn!("--delivery does not rewrite an ejected Dockerfile");
        }
    }

    let credential = project.credential()?;
    match (&credential, secret.delivery.bakes_into_image()) {
        (Some(c), true) => {
            c.ensure_dotenv_safe()?;
            steps.push(format!("{} will be written into the image", c.name()));
        }
        (None, true) => anyhow::bail!(
            "{} is not set. Export it or add it to {} before building with delivery = build_time_file.",
            secret.env_var,
            project.config.paths.dotenv_file
        ),
        (_, false) => steps.push(format!("{} will be required at `docker run`", secret.env_var)),
    }

    let exclude = [project.config.paths.dotenv_file.as_str()];
    let bundle = bundle::create_bundle(project_dir, &dockerfile, &exclude)?;
    steps.push(format!("Build context bundled ({} files)", bundle.file_count));

    let client = DockerClient::new();
    let report = PipelineRunner::new(&client)
        .run(&BuildPlan {
            context: &bundle.dir,
            image: &image,
            delivery: secret.delivery,
            env_var: &secret.env_var,
            credential: credential.as_ref(),
        })
        .await
        .map_err(|e| {
            let state = e.state();
            anyhow::Error::new(e).context(format!("pipeline stopped in {state}"))
        })?;

    let states: Vec<String> = report.run.history().iter().map(|s| s.to_string()).collect();
    steps.push(states.join(" → "));
    steps.push(format!(
        "Packaged {} ({}, {:.1} MB)",
        report.image,
        report.summary.short_id(),
        report.summary.size_mb()
    ));

    Ok(BuildOutcome { steps, report })
}
