use std::path::{Component, Path, PathBuf};
use std::process::Command;

/// Bundle directory, relative to the project root.
pub const BUNDLE_DIR: &str = ".botdock-bundle";

/// Top-level directories never handed to the builder stage.
const ALWAYS_EXCLUDED_DIRS: &[&str] = &[BUNDLE_DIR, ".botdock", ".git"];

/// The Build Context as materialized on disk.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub dir: PathBuf,
    /// Source files copied (the generated Dockerfile not included)
    pub file_count: usize,
}

impl Bundle {
    pub fn dockerfile(&self) -> PathBuf {
        self.dir.join("Dockerfile")
    }
}

/// Assembles the Build Context under `.botdock-bundle/`.
///
/// Uses `git ls-files` to respect `.gitignore`, then copies all tracked
/// and untracked-but-not-ignored files. Files whose name is in
/// `secret_files` are skipped wherever they appear, so a local dotenv file
/// never reaches the builder even when it is committed.
/// The generated Dockerfile is written into the bundle root.
pub fn create_bundle(
    project_dir: &Path,
    dockerfile_content: &str,
    secret_files: &[&str],
) -> Result<Bundle, BundleError> {
    let bundle_dir = project_dir.join(BUNDLE_DIR);

    if bundle_dir.exists() {
        std::fs::remove_dir_all(&bundle_dir).map_err(|e| BundleError::Cleanup {
            path: bundle_dir.clone(),
            source: e,
        })?;
    }
    std::fs::create_dir_all(&bundle_dir).map_err(|e| BundleError::Create {
        path: bundle_dir.clone(),
        source: e,
    })?;

    let files = git_ls_files(project_dir)?;
    let mut file_count = 0;

    for relative_path in &files {
        if is_excluded(relative_path, secret_files) {
            tracing::debug!(path = %relative_path.display(), "excluded from build context");
            continue;
        }

        let src = project_dir.join(relative_path);
        let dst = bundle_dir.join(relative_path);

        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BundleError::Create {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::copy(&src, &dst).map_err(|e| BundleError::CopyFile {
            path: src,
            source: e,
        })?;
        file_count += 1;
    }

    let bundle = Bundle {
        dir: bundle_dir,
        file_count,
    };
    std::fs::write(bundle.dockerfile(), dockerfile_content).map_err(|e| {
        BundleError::WriteDockerfile {
            path: bundle.dockerfile(),
            source: e,
        }
    })?;

    tracing::debug!(dir = %bundle.dir.display(), files = file_count, "build context bundled");
    Ok(bundle)
}

/// Remove the bundle directory if present. Returns whether anything was removed.
pub fn remove_bundle(project_dir: &Path) -> Result<bool, BundleError> {
    let bundle_dir = project_dir.join(BUNDLE_DIR);
    if !bundle_dir.exists() {
        return Ok(false);
    }
    std::fs::remove_dir_all(&bundle_dir).map_err(|e| BundleError::Cleanup {
        path: bundle_dir,
        source: e,
    })?;
    Ok(true)
}

fn is_excluded(relative_path: &Path, secret_files: &[&str]) -> bool {
    let top_level = relative_path.components().next().and_then(|c| match c {
        Component::Normal(s) => s.to_str(),
        _ => None,
    });
    if top_level.is_some_and(|top| ALWAYS_EXCLUDED_DIRS.contains(&top)) {
        return true;
    }

    relative_path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| secret_files.contains(&name))
}

/// Returns the list of files git considers part of the project:
/// tracked files + untracked files that are not .gitignored.
fn git_ls_files(project_dir: &Path) -> Result<Vec<PathBuf>, BundleError> {
    let stdout = git(project_dir, &["ls-files", "--cached", "--others", "--exclude-standard"])?;
    Ok(stdout
        .lines()
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        // deleted-but-tracked files are still listed by --cached
        .filter(|p| project_dir.join(p).is_file())
        .collect())
}

/// Checks whether the git working tree has uncommitted changes.
pub fn is_dirty(project_dir: &Path) -> Result<bool, BundleError> {
    let stdout = git(project_dir, &["status", "--porcelain"])?;
    Ok(!stdout.trim().is_empty())
}

fn git(project_dir: &Path, args: &[&str]) -> Result<String, BundleError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(project_dir)
        .output()
        .map_err(|e| BundleError::GitCommand {
            detail: format!("failed to execute git {}", args.first().unwrap_or(&"")),
            source: e,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BundleError::GitFailed {
            detail: format!(
                "git {} exited with {}: {}",
                args.first().unwrap_or(&""),
                output.status,
                stderr.trim()
            ),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("failed to clean up bundle directory {path}")]
    Cleanup {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create directory {path}")]
    Create {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to copy file {path}")]
    CopyFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write Dockerfile at {path}")]
    WriteDockerfile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("git command failed: {detail}")]
    GitCommand {
        detail: String,
        source: std::io::Error,
    },
    #[error("git failed: {detail}")]
    GitFailed { detail: String },
}
