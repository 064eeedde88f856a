use std::process::{ExitStatus, Stdio};

use botdock_core::Credential;

use crate::docker::DockerError;

/// Abstraction over docker CLI execution for testability.
///
/// Credentials are handed over as child-process environment, so a command
/// can refer to them by name (`--build-arg NAME`, `-e NAME`) and the value
/// never appears in the argument list.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait DockerExecutor: Send + Sync {
    /// Execute a docker command and capture stdout.
    async fn exec(&self, args: &[String]) -> Result<String, DockerError>;

    /// Execute a docker command, streaming its output to stderr.
    ///
    /// Stdout is kept free for machine-readable output (and the MCP transport).
    async fn exec_streaming(
        &self,
        args: &[String],
        secrets: &[Credential],
    ) -> Result<(), DockerError>;

    /// Execute a docker command attached to the terminal and return its exit
    /// code instead of treating non-zero as an error.
    async fn exec_attached(
        &self,
        args: &[String],
        secrets: &[Credential],
    ) -> Result<i32, DockerError>;
}

/// Real docker CLI executor.
pub struct RealExecutor;

impl RealExecutor {
    fn command(args: &[String], secrets: &[Credential]) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new("docker");
        cmd.args(args)
            .envs(secrets.iter().map(|c| (c.name(), c.expose())));
        cmd
    }
}

impl DockerExecutor for RealExecutor {
    async fn exec(&self, args: &[String]) -> Result<String, DockerError> {
        let output = Self::command(args, &[])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| DockerError::NotFound { source: e })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| DockerError::InvalidUtf8 { source: e })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(DockerError::CommandFailed {
                args: args.to_vec(),
                stderr,
            })
        }
    }

    async fn exec_streaming(
        &self,
        args: &[String],
        secrets: &[Credential],
    ) -> Result<(), DockerError> {
        let status = Self::command(args, secrets)
            .stdout(Stdio::from(std::io::stderr()))
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| DockerError::NotFound { source: e })?;

        if status.success() {
            Ok(())
        } else {
            Err(DockerError::CommandFailed {
                args: args.to_vec(),
                stderr: format!("exit code: {status}"),
            })
        }
    }

    async fn exec_attached(
        &self,
        args: &[String],
        secrets: &[Credential],
    ) -> Result<i32, DockerError> {
        let status = Self::command(args, secrets)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| DockerError::NotFound { source: e })?;

        Ok(exit_code(status))
    }
}

/// Shell convention: a child killed by signal N reports `128 + N`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
