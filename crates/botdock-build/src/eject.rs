use std::path::{Path, PathBuf};

/// Directory holding a hand-maintained Dockerfile.
pub const EJECT_DIR: &str = ".botdock";

fn ejected_path(project_dir: &Path) -> PathBuf {
    project_dir.join(EJECT_DIR).join("Dockerfile")
}

/// Writes the rendered pipeline description to `.botdock/Dockerfile`.
///
/// After ejecting, `botdock build` uses that file instead of rendering one.
/// The stage name and paths in the ejected file are then the user's to keep
/// consistent with botdock.toml.
pub fn eject(project_dir: &Path, dockerfile_content: &str) -> Result<PathBuf, EjectError> {
    let dir = project_dir.join(EJECT_DIR);
    std::fs::create_dir_all(&dir).map_err(|e| EjectError::CreateDir {
        path: dir.clone(),
        source: e,
    })?;

    let path = ejected_path(project_dir);
    if path.exists() {
        return Err(EjectError::AlreadyEjected(path));
    }

    std::fs::write(&path, dockerfile_content).map_err(|e| EjectError::Write {
        path: path.clone(),
        source: e,
    })?;

    tracing::debug!(path = %path.display(), "Dockerfile ejected");
    Ok(path)
}

pub fn is_ejected(project_dir: &Path) -> bool {
    ejected_path(project_dir).exists()
}

pub fn load_ejected_dockerfile(project_dir: &Path) -> Result<String, EjectError> {
    let path = ejected_path(project_dir);
    std::fs::read_to_string(&path).map_err(|e| EjectError::Read { path, source: e })
}

#[derive(Debug, thiserror::Error)]
pub enum EjectError {
    #[error("failed to create {EJECT_DIR} directory at {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Dockerfile already ejected at {0}; edit it directly or delete it to re-eject")]
    AlreadyEjected(PathBuf),
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read ejected Dockerfile at {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
