//! Locating the bot binary via `cargo metadata --no-deps`.
//!
//! The builder stage compiles exactly one `--bin`; this module decides which.

use cargo_metadata::{Metadata, MetadataCommand, Package, TargetKind};
use std::path::{Path, PathBuf};

/// The Cargo package that produces the Compiled Artifact.
///
/// # Examples
///
/// ```no_run
/// use botdock_core::CargoProject;
/// use std::path::Path;
///
/// let project = CargoProject::discover(Path::new("."), None).unwrap();
/// println!("building {} v{} (--bin {})", project.name, project.version, project.binary);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoProject {
    pub name: String,
    /// Resolved version (handles `version.workspace = true`)
    pub version: String,
    /// Directory holding the package manifest.
    pub package_dir: PathBuf,
    pub workspace_root: PathBuf,
    /// Every binary target of the package
    pub binaries: Vec<String>,
    /// The binary compiled by the builder stage.
    ///
    /// **Invariant:** one of [`binaries`](Self::binaries).
    pub binary: String,
}

impl CargoProject {
    /// Discover the package whose manifest lives in `project_dir`.
    ///
    /// `requested` is `[project].binary` from botdock.toml; when absent the
    /// binary is chosen by [`select_binary`].
    pub fn discover(project_dir: &Path, requested: Option<&str>) -> crate::Result<Self> {
        let manifest_path = project_dir.join("Cargo.toml");
        tracing::debug!(path = %manifest_path.display(), "running cargo metadata");

        let metadata = MetadataCommand::new()
            .manifest_path(&manifest_path)
            .no_deps()
            .exec()
            .map_err(|e| crate::Error::CargoMetadata {
                manifest_path: manifest_path.clone(),
                detail: e.to_string(),
            })?;

        let dir = project_dir
            .canonicalize()
            .map_err(|e| crate::Error::ProjectDirResolve {
                path: project_dir.to_path_buf(),
                source: e,
            })?;

        let package = package_in_dir(&metadata, &dir)?;

        let binaries: Vec<String> = package
            .targets
            .iter()
            .filter(|t| t.kind.contains(&TargetKind::Bin))
            .map(|t| t.name.clone())
            .collect();

        let binary = select_binary(
            &binaries,
            requested,
            package.default_run.as_deref(),
            &package.name,
        )?;

        let package_dir = package
            .manifest_path
            .parent()
            .map(|p| PathBuf::from(p.as_std_path()))
            .unwrap_or_else(|| dir.clone());

        tracing::debug!(
            name = %package.name,
            version = %package.version,
            binary = %binary,
            "cargo project discovered"
        );

        Ok(Self {
            name: package.name.to_string(),
            version: package.version.to_string(),
            package_dir,
            workspace_root: PathBuf::from(metadata.workspace_root.as_std_path()),
            binaries,
            binary,
        })
    }

    /// The package sits inside a larger workspace, whose root manifest is
    /// not part of a Build Context taken from [`package_dir`](Self::package_dir).
    pub fn is_workspace_member(&self) -> bool {
        self.package_dir != self.workspace_root
    }
}

fn package_in_dir<'m>(metadata: &'m Metadata, dir: &Path) -> crate::Result<&'m Package> {
    metadata
        .packages
        .iter()
        .find(|p| {
            let Some(parent) = p.manifest_path.parent() else {
                return false;
            };
            match parent.as_std_path().canonicalize() {
                Ok(c) => c == dir,
                Err(e) => {
                    tracing::warn!(
                        path = %parent,
                        error = %e,
                        "failed to canonicalize manifest parent; skipping package"
                    );
                    false
                }
            }
        })
        .ok_or_else(|| crate::Error::NoPackageInDir {
            dir: dir.to_path_buf(),
            workspace_members: metadata
                .packages
                .iter()
                .filter(|p| metadata.workspace_members.contains(&p.id))
                .map(|p| p.name.to_string())
                .collect(),
        })
}

/// Pick the binary the builder stage compiles.
///
/// Priority:
/// 1. `[project].binary` from botdock.toml (must exist)
/// 2. `default-run` from Cargo.toml, when it names a real target
/// 3. the only binary
/// 4. the binary named after the package
pub fn select_binary(
    binaries: &[String],
    requested: Option<&str>,
    default_run: Option<&str>,
    package_name: &str,
) -> crate::Result<String> {
    if let Some(name) = requested {
        return if binaries.iter().any(|b| b == name) {
            Ok(name.to_owned())
        } else {
            Err(crate::Error::UnknownBinary {
                requested: name.to_owned(),
                available: binaries.to_vec(),
            })
        };
    }

    if let Some(name) = default_run
        && binaries.iter().any(|b| b == name)
    {
        return Ok(name.to_owned());
    }

    match binaries {
        [] => Err(crate::Error::NoBinaryTarget {
            package: package_name.to_owned(),
        }),
        [only] => Ok(only.clone()),
        _ if binaries.iter().any(|b| b == package_name) => Ok(package_name.to_owned()),
        _ => Err(crate::Error::MultipleBinaries {
            names: binaries.to_vec(),
        }),
    }
}
