//! The fixed path contract shared by the Builder and Runtime stages.
//!
//! Both stage descriptions are rendered from the same [`StagePaths`], so the
//! location the builder writes to is always the location the runtime stage
//! copies from.

use serde::{Deserialize, Serialize};

/// Name of the builder stage; the runtime stage copies `--from` it.
pub const BUILDER_STAGE: &str = "builder";

/// Well-known locations inside the build and runtime images.
///
/// # Examples
///
/// ```
/// use botdock_core::StagePaths;
///
/// let paths = StagePaths::default();
/// assert_eq!(paths.builder_artifact_path("my-bot"), "/app/target/release/my-bot");
/// assert_eq!(paths.runtime_artifact_path(), "/app/bot");
/// assert_eq!(paths.dotenv_path(), "/app/.env");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePaths {
    /// Working directory of both stages (Build Context root in the builder).
    #[serde(default = "default_workdir")]
    pub workdir: String,
    /// File name of the shipped executable inside `workdir`.
    #[serde(default = "default_artifact_name")]
    pub artifact_name: String,
    /// File name of the dotenv credential file inside `workdir`.
    #[serde(default = "default_dotenv_file")]
    pub dotenv_file: String,
}

impl Default for StagePaths {
    fn default() -> Self {
        Self {
            workdir: default_workdir(),
            artifact_name: default_artifact_name(),
            dotenv_file: default_dotenv_file(),
        }
    }
}

impl StagePaths {
    /// Where `cargo build --release` leaves the binary in the builder stage.
    pub fn builder_artifact_path(&self, binary: &str) -> String {
        format!("{}/target/release/{binary}", self.workdir_trimmed())
    }

    /// Where the executable lives in the runtime image (also the entry point).
    pub fn runtime_artifact_path(&self) -> String {
        format!("{}/{}", self.workdir_trimmed(), self.artifact_name)
    }

    /// Dotenv file location; identical in both stages.
    pub fn dotenv_path(&self) -> String {
        format!("{}/{}", self.workdir_trimmed(), self.dotenv_file)
    }

    fn workdir_trimmed(&self) -> &str {
        if self.workdir == "/" {
            ""
        } else {
            self.workdir.trim_end_matches('/')
        }
    }

    /// Check the path contract before anything is rendered.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.workdir.starts_with('/') {
            return Err(invalid("workdir", &self.workdir, "must be an absolute path"));
        }
        if self.workdir.split('/').any(|seg| seg == "..") {
            return Err(invalid("workdir", &self.workdir, "must not contain '..'"));
        }
        check_plain(&self.workdir, "workdir")?;
        check_file_name(&self.artifact_name, "artifact_name")?;
        check_file_name(&self.dotenv_file, "dotenv_file")?;
        if self.artifact_name == self.dotenv_file {
            return Err(invalid(
                "dotenv_file",
                &self.dotenv_file,
                "must differ from artifact_name",
            ));
        }
        Ok(())
    }
}

fn check_file_name(value: &str, field: &'static str) -> crate::Result<()> {
    if value.is_empty() {
        return Err(invalid(field, value, "must not be empty"));
    }
    if value.contains('/') {
        return Err(invalid(field, value, "must be a file name, not a path"));
    }
    if value == "." || value == ".." {
        return Err(invalid(field, value, "must be a regular file name"));
    }
    check_plain(value, field)
}

/// Paths are spliced into Dockerfile instructions and JSON-form ENTRYPOINT.
fn check_plain(value: &str, field: &'static str) -> crate::Result<()> {
    if value
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\\' | '$'))
    {
        return Err(invalid(
            field,
            value,
            "must not contain whitespace, quotes, '\\' or '$'",
        ));
    }
    Ok(())
}

fn invalid(field: &'static str, value: &str, reason: &'static str) -> crate::Error {
    crate::Error::InvalidStagePath {
        field,
        value: value.to_owned(),
        reason,
    }
}

fn default_workdir() -> String {
    "/app".to_owned()
}

fn default_artifact_name() -> String {
    "bot".to_owned()
}

fn default_dotenv_file() -> String {
    ".env".to_owned()
}
