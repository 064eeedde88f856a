mod build;
mod build_pipeline;
mod destroy;
mod doctor;
mod dockerfile;
mod eject;
mod init;
pub(crate) mod mcp;
mod run;
mod status;
mod verify;

use std::path::{Path, PathBuf};

use botdock_build::{DockerfileGenerator, eject as eject_mod};
use botdock_core::{BotdockConfig, CargoProject, Credential, SecretDelivery};
use botdock_engine::ImageRef;

pub use build::build;
pub use destroy::destroy;
pub use doctor::doctor;
pub use dockerfile::dockerfile;
pub use eject::eject;
pub use init::init_project;
pub use run::run;
pub use status::status;
pub use verify::verify;

/// `--delivery` values; kebab-case on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DeliveryArg {
    /// Bake the credential into a dotenv file in the image
    BuildTimeFile,
    /// Declare the variable; supply the value at `docker run`
    RuntimeEnv,
}

impl From<DeliveryArg> for SecretDelivery {
    fn from(arg: DeliveryArg) -> Self {
        match arg {
            DeliveryArg::BuildTimeFile => Self::BuildTimeFile,
            DeliveryArg::RuntimeEnv => Self::RuntimeEnv,
        }
    }
}

/// botdock.toml plus the Cargo package it builds.
pub(crate) struct BotProject {
    pub dir: PathBuf,
    pub config: BotdockConfig,
    pub cargo: CargoProject,
}

impl BotProject {
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let config = BotdockConfig::load(dir)?;
        let cargo = CargoProject::discover(dir, config.project.binary.as_deref())?;
        Ok(Self {
            dir: dir.to_path_buf(),
            config,
            cargo,
        })
    }

    pub fn with_delivery(mut self, delivery: Option<DeliveryArg>) -> Self {
        if let Some(d) = delivery {
            self.config.secret.delivery = d.into();
        }
        self
    }

    pub fn image(&self, tag: Option<&str>) -> ImageRef {
        ImageRef::new(
            self.config.image_name(&self.cargo.name),
            tag.unwrap_or(self.config.project.tag.as_str()),
        )
    }

    pub fn render_dockerfile(&self) -> String {
        DockerfileGenerator::new(&self.config, &self.cargo).render()
    }

    /// The ejected Dockerfile if there is one, else a freshly rendered one.
    pub fn dockerfile(&self) -> anyhow::Result<(String, bool)> {
        if eject_mod::is_ejected(&self.dir) {
            Ok((eject_mod::load_ejected_dockerfile(&self.dir)?, true))
        } else {
            Ok((self.render_dockerfile(), false))
        }
    }

    /// Local dotenv file the credential may be read from (never bundled).
    pub fn local_dotenv(&self) -> PathBuf {
        self.dir.join(&self.config.paths.dotenv_file)
    }

    /// Process environment first, then the local dotenv file.
    ///
    /// `Ok(None)` when the credential is simply not set anywhere.
    pub fn credential(&self) -> anyhow::Result<Option<Credential>> {
        let name = &self.config.secret.env_var;
        match Credential::resolve(name, &self.local_dotenv()) {
            Ok(c) => Ok(Some(c)),
            Err(botdock_core::Error::CredentialMissing { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Ask on stdin; anything but y/yes aborts.
pub(crate) fn confirm(prompt: &str) -> anyhow::Result<bool> {
    use std::io::Write;

    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim(), "y" | "Y" | "yes" | "YES"))
}
