//! Core types and configuration for botdock.
//!
//! This crate defines the `botdock.toml` schema ([`BotdockConfig`]), the
//! stage path contract ([`StagePaths`]), credential delivery
//! ([`SecretDelivery`], [`Credential`]), the pipeline lifecycle
//! ([`PipelineState`]), Cargo project discovery ([`CargoProject`]), and shared
//! error types.

pub mod cargo;
pub mod config;
pub mod error;
pub mod paths;
pub mod pipeline;
pub mod secret;

pub use cargo::CargoProject;
pub use config::{BotdockConfig, BuildConfig, CONFIG_FILE, ProjectConfig};
pub use error::{Error, Result};
pub use paths::{BUILDER_STAGE, StagePaths};
pub use pipeline::{PipelineRun, PipelineState};
pub use secret::{Credential, RUNTIME_ENV_LABEL, SecretConfig, SecretDelivery};
