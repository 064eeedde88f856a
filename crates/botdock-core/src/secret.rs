//! Credential delivery: how the bot token reaches the running artifact.
//!
//! | Delivery | Build argument | Dotenv file in image | Runtime variable |
//! |----------|----------------|----------------------|------------------|
//! | [`SecretDelivery::RuntimeEnv`] | no | no | required at `docker run` |
//! | [`SecretDelivery::BuildTimeFile`] | yes | yes (value baked in) | optional |
//!
//! With `RuntimeEnv` the image only declares the variable name. The value is
//! supplied when the container starts and never lands in an image layer.

use std::fmt;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Image label carrying the comma-separated names of runtime-injected variables.
pub const RUNTIME_ENV_LABEL: &str = "io.botdock.runtime-env";

/// Which representation of the credential the pipeline produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretDelivery {
    /// Capture the build argument into a dotenv file shipped in the image.
    BuildTimeFile,
    /// Declare the variable name only; the value comes from `docker run`.
    #[default]
    RuntimeEnv,
}

impl SecretDelivery {
    pub fn bakes_into_image(self) -> bool {
        matches!(self, Self::BuildTimeFile)
    }
}

impl fmt::Display for SecretDelivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildTimeFile => f.write_str("build_time_file"),
            Self::RuntimeEnv => f.write_str("runtime_env"),
        }
    }
}

/// `[secret]` section of botdock.toml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub delivery: SecretDelivery,
    /// Name of the credential variable the bot reads at startup.
    #[serde(default = "default_env_var")]
    pub env_var: String,
}

impl Default for SecretConfig {
    fn default() -> Self {
        Self {
            delivery: SecretDelivery::default(),
            env_var: default_env_var(),
        }
    }
}

impl SecretConfig {
    pub fn validate(&self) -> crate::Result<()> {
        validate_env_var_name(&self.env_var)
    }
}

fn default_env_var() -> String {
    "TELOXIDE_TOKEN".to_owned()
}

/// Accepts POSIX-style names: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_env_var_name(name: &str) -> crate::Result<()> {
    let invalid = |reason| crate::Error::InvalidEnvVarName {
        name: name.to_owned(),
        reason,
    };

    let mut chars = name.chars();
    match chars.next() {
        None => return Err(invalid("must not be empty")),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            return Err(invalid("must start with a letter or '_'"));
        }
        Some(_) => {}
    }
    if chars.any(|c| !(c.is_ascii_alphanumeric() || c == '_')) {
        return Err(invalid("may only contain ASCII letters, digits and '_'"));
    }
    Ok(())
}

/// The bot token, held as a [`SecretString`].
///
/// `Debug` never prints the value. Call [`Credential::expose`] only at the
/// point where the value is handed to a child process or compared.
#[derive(Clone)]
pub struct Credential {
    name: String,
    value: SecretString,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl Credential {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: SecretString::from(value.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    /// Read the credential from the process environment.
    ///
    /// Unset and blank values are both treated as missing.
    pub fn from_env(name: &str) -> crate::Result<Self> {
        match std::env::var(name) {
            Ok(v) if !v.trim().is_empty() => Ok(Self::new(name, v)),
            _ => Err(crate::Error::CredentialMissing {
                name: name.to_owned(),
            }),
        }
    }

    /// Read the credential from a dotenv file without touching the process
    /// environment.
    pub fn from_dotenv_file(path: &Path, name: &str) -> crate::Result<Self> {
        let iter = dotenvy::from_path_iter(path).map_err(|e| crate::Error::DotenvRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        for item in iter {
            let (key, value) = item.map_err(|e| crate::Error::DotenvRead {
                path: path.to_path_buf(),
                source: e,
            })?;
            if key == name && !value.trim().is_empty() {
                return Ok(Self::new(name, value));
            }
        }

        Err(crate::Error::CredentialMissing {
            name: name.to_owned(),
        })
    }

    /// Environment first, then the dotenv file if one exists.
    pub fn resolve(name: &str, dotenv: &Path) -> crate::Result<Self> {
        match Self::from_env(name) {
            Ok(c) => Ok(c),
            Err(crate::Error::CredentialMissing { .. }) if dotenv.exists() => {
                tracing::debug!(path = %dotenv.display(), var = name, "reading credential from dotenv file");
                Self::from_dotenv_file(dotenv, name)
            }
            Err(e) => Err(e),
        }
    }

    /// Reject values that would not survive an unquoted `NAME=value` line.
    pub fn ensure_dotenv_safe(&self) -> crate::Result<()> {
        let unsafe_reason = |reason| crate::Error::CredentialNotDotenvSafe {
            name: self.name.clone(),
            reason,
        };
        let v = self.expose();
        if v.is_empty() {
            return Err(unsafe_reason("value is empty"));
        }
        if v.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(unsafe_reason("value contains whitespace or control characters"));
        }
        if v.chars().any(|c| matches!(c, '#' | '"' | '\'' | '\\' | '$' | '`')) {
            return Err(unsafe_reason("value contains one of # \" ' \\ $ `"));
        }
        Ok(())
    }

    /// The dotenv line the builder stage writes for this credential.
    pub fn dotenv_line(&self) -> crate::Result<String> {
        self.ensure_dotenv_safe()?;
        Ok(format!("{}={}\n", self.name, self.expose()))
    }

    /// Byte-for-byte comparison against a value recovered from an image.
    pub fn matches(&self, other: &str) -> bool {
        self.expose().as_bytes() == other.as_bytes()
    }

    /// Whether the value occurs anywhere in `text` (build logs, layer history).
    pub fn appears_in(&self, text: &str) -> bool {
        text.contains(self.expose())
    }
}
