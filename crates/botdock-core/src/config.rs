use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::paths::StagePaths;
use crate::secret::{SecretConfig, validate_env_var_name};

/// Config file name looked up in the project root.
pub const CONFIG_FILE: &str = "botdock.toml";

/// botdock.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotdockConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub secret: SecretConfig,
    #[serde(default)]
    pub paths: StagePaths,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Image repository name (defaults to the Cargo package name)
    pub name: Option<String>,
    /// Binary target to build (defaults to Cargo's selection)
    pub binary: Option<String>,
    /// Image tag applied to the packaged runtime image
    #[serde(default = "default_tag")]
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Rust toolchain image for the builder stage
    #[serde(default = "default_builder_image")]
    pub base_image: String,
    /// Minimal base image for the runtime stage
    #[serde(default = "default_runtime_image")]
    pub runtime_image: String,
    /// Additional system packages installed in the builder via apt-get
    #[serde(default)]
    pub extra_packages: Vec<String>,
    /// Pass `--locked` to cargo build
    #[serde(default)]
    pub locked: bool,
    /// Cargo features enabled for the release build
    #[serde(default)]
    pub features: Vec<String>,
    /// Static, non-secret environment variables baked into the runtime image.
    /// These become ENV directives in the Dockerfile.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Emit APP_NAME / APP_VERSION from the Cargo package into the runtime image
    #[serde(default = "default_true")]
    pub app_metadata_env: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: None,
            binary: None,
            tag: default_tag(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            base_image: default_builder_image(),
            runtime_image: default_runtime_image(),
            extra_packages: Vec::new(),
            locked: false,
            features: Vec::new(),
            env: HashMap::new(),
            app_metadata_env: true,
        }
    }
}

impl BotdockConfig {
    /// Load from botdock.toml at the given path, or return defaults if not found.
    ///
    /// The loaded config is validated before it is returned.
    pub fn load(project_dir: &std::path::Path) -> crate::Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        let config = if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path.clone(),
                source: e,
            })?
        } else {
            tracing::debug!(path = %config_path.display(), "no config file; using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Enforce the invariants every renderer relies on.
    pub fn validate(&self) -> crate::Result<()> {
        self.paths.validate()?;
        self.secret.validate()?;

        for key in self.build.env.keys() {
            validate_env_var_name(key)?;
            if *key == self.secret.env_var {
                return Err(crate::Error::CredentialInStaticEnv { name: key.clone() });
            }
        }
        Ok(())
    }

    /// Image repository name: `[project].name`, else the Cargo package name.
    pub fn image_name<'a>(&'a self, package_name: &'a str) -> &'a str {
        self.project.name.as_deref().unwrap_or(package_name)
    }

    /// `<name>:<tag>` for the packaged runtime image.
    pub fn image_tag(&self, package_name: &str) -> String {
        format!("{}:{}", self.image_name(package_name), self.project.tag)
    }
}

fn default_tag() -> String {
    "latest".to_owned()
}

fn default_builder_image() -> String {
    "rust:1.84-bookworm".to_owned()
}

fn default_runtime_image() -> String {
    "gcr.io/distroless/cc-debian12".to_owned()
}

fn default_true() -> bool {
    true
}
