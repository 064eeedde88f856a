#[derive(Debug, thiserror::Error)]
pub enum DockerError {
    #[error("docker CLI not found; install Docker Engine or Docker Desktop")]
    NotFound { source: std::io::Error },

    #[error("docker command failed: {args:?}\n{stderr}")]
    CommandFailed { args: Vec<String>, stderr: String },

    #[error("docker output was not valid UTF-8")]
    InvalidUtf8 { source: std::string::FromUtf8Error },

    #[error("unexpected `docker {command}` output")]
    UnexpectedOutput {
        command: &'static str,
        source: serde_json::Error,
    },

    #[error("path is not valid UTF-8: {0}")]
    InvalidPath(std::path::PathBuf),
}
