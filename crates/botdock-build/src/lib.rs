//! Two-stage Dockerfile generation, build context bundling, and eject.
//!
//! # Build pipeline
//!
//! ```text
//! botdock build
//!   1. Dirty check ── git status --porcelain (skip with --allow-dirty)
//!   2. Dockerfile  ── DockerfileGenerator::render() or .botdock/Dockerfile
//!   3. Bundle      ── git ls-files → .botdock-bundle/
//!   4. Builder     ── docker build --target builder
//!   5. Runtime     ── docker build (staging tag, promoted on success)
//! ```
//!
//! # Bundle strategy
//!
//! The bundle mirrors the git repository state:
//! - All tracked and untracked (non-ignored) files via `git ls-files`
//! - `.botdock-bundle/`, `.botdock/`, `.git/` are always excluded
//! - The local dotenv file is excluded by name, so a developer's token
//!   never enters the build context
//!
//! # Runtime content
//!
//! The runtime stage copies only the compiled artifact out of the builder.
//! With `delivery = "build_time_file"` it also copies the dotenv file the
//! builder wrote from the build argument. Nothing else from the source tree
//! reaches the final image.

pub mod bundle;
pub mod dockerfile;
pub mod eject;

pub use bundle::{Bundle, BundleError};
pub use dockerfile::{BUILDER_STAGE, DockerfileGenerator};
pub use eject::EjectError;
