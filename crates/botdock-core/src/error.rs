use std::path::PathBuf;

use crate::pipeline::PipelineState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    // ── Stage path contract ──
    #[error("invalid stage path {field} = {value:?}: {reason}")]
    InvalidStagePath {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    // ── Credential ──
    #[error("invalid environment variable name {name:?}: {reason}")]
    InvalidEnvVarName { name: String, reason: &'static str },

    #[error(
        "static env entry {name} would bake the credential into the image; \
         remove it from [build.env]"
    )]
    CredentialInStaticEnv { name: String },

    #[error("credential {name} is not set; export it or add it to .env")]
    CredentialMissing { name: String },

    #[error("credential {name} cannot be written to a dotenv file verbatim: {reason}")]
    CredentialNotDotenvSafe { name: String, reason: &'static str },

    #[error("failed to read dotenv file {path}")]
    DotenvRead {
        path: PathBuf,
        source: dotenvy::Error,
    },

    // ── Pipeline ──
    #[error("pipeline cannot move from {from} to {to}")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },

    // ── Cargo project discovery ──
    #[error("cargo metadata failed for {manifest_path}: {detail}")]
    CargoMetadata {
        manifest_path: PathBuf,
        detail: String,
    },

    #[error("failed to resolve project directory {path}")]
    ProjectDirResolve {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "no package found in {dir}; workspace members: {}",
        format_members(workspace_members)
    )]
    NoPackageInDir {
        dir: PathBuf,
        workspace_members: Vec<String>,
    },

    #[error("no binary target in package '{package}'; botdock needs a bot binary to build")]
    NoBinaryTarget { package: String },

    #[error("binary '{requested}' not found; available: {}", available.join(", "))]
    UnknownBinary {
        requested: String,
        available: Vec<String>,
    },

    #[error(
        "multiple binary targets found: {}; set `default-run` in Cargo.toml or [project].binary in botdock.toml",
        names.join(", ")
    )]
    MultipleBinaries { names: Vec<String> },
}

fn format_members(members: &[String]) -> String {
    if members.is_empty() {
        "(none)".to_owned()
    } else {
        members.join(", ")
    }
}
