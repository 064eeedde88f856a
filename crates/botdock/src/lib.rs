//! Build minimal two-stage container images for Rust bots, and load their
//! credentials at startup.
//!
//! This is the facade crate that re-exports the botdock sub-crates and adds
//! [`BotEnv`], the loader a bot binary calls from `main()`.
//!
//! # Feature flags
//!
//! | Feature | Default | Crate | Description |
//! |---------|---------|-------|-------------|
//! | `core` | yes | `botdock-core` | Configuration, stage paths, credentials |
//! | `build` | yes | `botdock-build` | Dockerfile generation, bundling, eject |
//! | `engine` | yes | `botdock-engine` | Docker build/run pipeline and image audit |
//!
//! # Inside the bot
//!
//! ```rust,no_run
//! # fn main() -> Result<(), botdock::RuntimeError> {
//! let env = botdock::BotEnv::load()?;
//! println!("{} v{} starting", env.app_name, env.app_version);
//! let token: &str = env.expose_token();
//! # let _ = token;
//! # Ok(())
//! # }
//! ```
//!
//! # Rendering a Dockerfile
//!
//! ```rust,no_run
//! # #[cfg(feature = "build")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::Path;
//! use botdock::{BotdockConfig, CargoProject};
//! use botdock::build::DockerfileGenerator;
//!
//! let config = BotdockConfig::load(Path::new("."))?;
//! let project = CargoProject::discover(Path::new("."), config.project.binary.as_deref())?;
//! let dockerfile = DockerfileGenerator::new(&config, &project).render();
//! # let _ = dockerfile;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "build"))]
//! # fn main() {}
//! ```

mod env;
mod error;

pub use env::{BotEnv, DEFAULT_APP_NAME, DEFAULT_APP_VERSION};
pub use error::RuntimeError;

// Core types flattened into root namespace for convenience.
#[cfg(feature = "core")]
pub use botdock_core::*;

/// Dockerfile generation, source bundling, and eject.
#[cfg(feature = "build")]
pub mod build {
    pub use botdock_build::*;
}

/// Docker client, build/package pipeline, and image audit.
#[cfg(feature = "engine")]
pub mod engine {
    pub use botdock_engine::*;
}
