use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use botdock_core::{Credential, RUNTIME_ENV_LABEL};
use serde::Deserialize;

use crate::docker::DockerError;
use crate::executor::{DockerExecutor, RealExecutor};

/// Docker operations client, parameterized over the executor for testability.
pub struct DockerClient<E: DockerExecutor = RealExecutor> {
    executor: E,
}

impl DockerClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for DockerClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

/// One `docker build` invocation against the bundled Build Context.
#[derive(Debug)]
pub struct BuildRequest<'a> {
    pub context: &'a Path,
    /// Stop after this stage (`--target`).
    pub target: Option<&'a str>,
    pub tag: &'a str,
    /// Passed as `--build-arg NAME`; the value travels in the child env.
    pub build_args: &'a [Credential],
}

/// One `docker run --rm` invocation of a packaged image.
#[derive(Debug)]
pub struct RunRequest<'a> {
    pub image: &'a str,
    /// Passed as `-e NAME`; the value travels in the child env.
    pub env: &'a [Credential],
    pub env_file: Option<&'a Path>,
}

impl<E: DockerExecutor> DockerClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    // ── Engine ──

    pub async fn client_version(&self) -> Result<String, DockerError> {
        let v = self
            .executor
            .exec(&args(["version", "--format", "{{.Client.Version}}"]))
            .await?;
        Ok(v.trim().to_owned())
    }

    /// Fails when the daemon is unreachable even if the CLI is installed.
    pub async fn server_version(&self) -> Result<String, DockerError> {
        let v = self
            .executor
            .exec(&args(["version", "--format", "{{.Server.Version}}"]))
            .await?;
        Ok(v.trim().to_owned())
    }

    // ── Doctor ──

    /// Run the engine checks without early return.
    ///
    /// Project-level checks (config file, Cargo project, credential) are
    /// filled in by the caller.
    pub async fn doctor(&self) -> DoctorReport {
        let mut report = DoctorReport::default();

        match self.client_version().await {
            Ok(v) => report.docker = CheckResult::ok(&v),
            Err(e) => report.docker = CheckResult::fail(&e.to_string()),
        }

        match self.server_version().await {
            Ok(v) if !v.is_empty() => report.daemon = CheckResult::ok(&format!("Engine {v}")),
            Ok(_) => report.daemon = CheckResult::fail("no server version reported"),
            Err(_) => report.daemon = CheckResult::fail("daemon not reachable"),
        }

        report
    }

    // ── Images ──

    pub async fn build(&self, req: &BuildRequest<'_>) -> Result<(), DockerError> {
        let context = path_str(req.context)?;
        let dockerfile = req.context.join("Dockerfile");
        let dockerfile = path_str(&dockerfile)?;

        let mut cmd = args(["build", "--file", dockerfile, "--tag", req.tag]);
        if let Some(target) = req.target {
            cmd.extend(args(["--target", target]));
        }
        for arg in req.build_args {
            cmd.extend(args(["--build-arg", arg.name()]));
        }
        cmd.push(context.to_owned());

        tracing::debug!(tag = req.tag, stage = ?req.target, "docker build");
        self.executor.exec_streaming(&cmd, req.build_args).await
    }

    pub async fn tag(&self, source: &str, target: &str) -> Result<(), DockerError> {
        self.executor
            .exec(&args(["tag", source, target]))
            .await?;
        Ok(())
    }

    /// Remove one tag. The image itself goes away with its last tag.
    pub async fn remove_image(&self, tag: &str) -> Result<(), DockerError> {
        self.executor
            .exec(&args(["image", "rm", tag]))
            .await?;
        Ok(())
    }

    pub async fn image_exists(&self, tag: &str) -> bool {
        self.executor
            .exec(&args(["image", "inspect", "--format", "{{.Id}}", tag]))
            .await
            .is_ok()
    }

    pub async fn inspect(&self, tag: &str) -> Result<ImageSummary, DockerError> {
        let out = self
            .executor
            .exec(&args(["image", "inspect", tag]))
            .await?;
        let mut images: Vec<ImageSummary> =
            serde_json::from_str(&out).map_err(|e| DockerError::UnexpectedOutput {
                command: "image inspect",
                source: e,
            })?;
        images.pop().ok_or_else(|| DockerError::CommandFailed {
            args: args(["image", "inspect", tag]),
            stderr: "no such image".to_owned(),
        })
    }

    /// `CreatedBy` of every layer, newest first.
    pub async fn history(&self, tag: &str) -> Result<Vec<String>, DockerError> {
        let out = self
            .executor
            .exec(&args([
                "image",
                "history",
                "--no-trunc",
                "--format",
                "{{.CreatedBy}}",
                tag,
            ]))
            .await?;
        Ok(out.lines().map(str::to_owned).collect())
    }

    /// Copy one file out of an image without running it.
    ///
    /// A stopped container is created for the copy and always removed.
    /// `Ok(false)` means the path does not exist in the image.
    pub async fn copy_from_image(
        &self,
        image: &str,
        src: &str,
        dest: &Path,
    ) -> Result<bool, DockerError> {
        let container = self
            .executor
            .exec(&args(["create", image]))
            .await?
            .trim()
            .to_owned();

        let dest_str = path_str(dest)?;
        let copied = self
            .executor
            .exec(&args(["cp", &format!("{container}:{src}"), dest_str]))
            .await;

        if let Err(e) = self.executor.exec(&args(["rm", &container])).await {
            tracing::warn!(container = %container, error = %e, "failed to remove temporary container");
        }

        match copied {
            Ok(_) => Ok(true),
            Err(DockerError::CommandFailed { ref stderr, .. }) if is_missing_path(stderr) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    // ── Containers ──

    /// Returns the container's exit code, which is the artifact's.
    pub async fn run(&self, req: &RunRequest<'_>) -> Result<i32, DockerError> {
        let mut cmd = args(["run", "--rm"]);
        if let Some(env_file) = req.env_file {
            cmd.extend(args(["--env-file", path_str(env_file)?]));
        }
        for var in req.env {
            cmd.extend(args(["-e", var.name()]));
        }
        cmd.push(req.image.to_owned());

        tracing::debug!(image = req.image, "docker run");
        self.executor.exec_attached(&cmd, req.env).await
    }
}

// ── Helper ──

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

fn path_str(path: &Path) -> Result<&str, DockerError> {
    path.to_str()
        .ok_or_else(|| DockerError::InvalidPath(path.to_path_buf()))
}

// ── Image inspection ──

/// The parts of `docker image inspect` botdock reports on.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageSummary {
    pub id: String,
    #[serde(default)]
    pub repo_tags: Vec<String>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub config: ImageConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub env: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub entrypoint: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cmd: Vec<String>,
    #[serde(default)]
    pub working_dir: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: HashMap<String, String>,
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

impl ImageSummary {
    /// Variable names the image declares for runtime injection.
    pub fn declared_env(&self) -> Vec<&str> {
        self.config
            .labels
            .get(RUNTIME_ENV_LABEL)
            .map(|v| v.split(',').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    /// Whether `Config.Env` binds `name` to any value.
    pub fn binds_env(&self, name: &str) -> bool {
        self.config
            .env
            .iter()
            .any(|kv| kv.split_once('=').map_or(kv.as_str(), |(k, _)| k) == name)
    }

    pub fn short_id(&self) -> &str {
        let id = self.id.strip_prefix("sha256:").unwrap_or(&self.id);
        id.get(..12).unwrap_or(id)
    }

    pub fn size_mb(&self) -> f64 {
        self.size as f64 / 1_000_000.0
    }
}

// ── Doctor types ──

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub docker: CheckResult,
    pub daemon: CheckResult,
    pub config_file: CheckResult,
    pub cargo_project: CheckResult,
    pub credential: CheckResult,
}

impl DoctorReport {
    pub fn all_passed(&self) -> bool {
        self.rows().iter().all(|(_, r)| r.passed)
    }

    fn rows(&self) -> [(&'static str, &CheckResult); 5] {
        [
            ("docker CLI", &self.docker),
            ("docker daemon", &self.daemon),
            ("botdock.toml", &self.config_file),
            ("Cargo project", &self.cargo_project),
            ("Credential", &self.credential),
        ]
    }
}

impl fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, result) in self.rows() {
            writeln!(f, "{name:<16}{:<4}{}", result.icon(), result.detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}

/// `docker cp` wording for a source path that does not exist in the container.
fn is_missing_path(stderr: &str) -> bool {
    stderr.contains("Could not find the file") || stderr.contains("No such container:path")
}
