use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::error::RuntimeError;

pub const DEFAULT_APP_NAME: &str = "Bot";
pub const DEFAULT_APP_VERSION: &str = "0.1";

/// What a bot binary needs at startup: its token and how to introduce itself.
///
/// The token is read the same way for both delivery modes: a dotenv file
/// baked next to the binary (`build_time_file`) is loaded first, and a
/// variable passed with `docker run -e` (`runtime_env`) takes precedence
/// because dotenv loading never overrides the process environment.
#[derive(Clone)]
pub struct BotEnv {
    token_var: String,
    token: SecretString,
    pub app_name: String,
    pub app_version: String,
}

impl fmt::Debug for BotEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotEnv")
            .field("token_var", &self.token_var)
            .field("token", &"[REDACTED]")
            .field("app_name", &self.app_name)
            .field("app_version", &self.app_version)
            .finish()
    }
}

impl BotEnv {
    /// Load `.env` (if any) and read `TELOXIDE_TOKEN`, `APP_NAME`, `APP_VERSION`.
    ///
    /// ```rust,no_run
    /// let env = botdock::BotEnv::load()?;
    /// println!("{} v{} starting", env.app_name, env.app_version);
    /// # Ok::<(), botdock::RuntimeError>(())
    /// ```
    pub fn load() -> Result<Self, RuntimeError> {
        Self::load_token(&botdock_core::SecretConfig::default().env_var)
    }

    /// Same as [`BotEnv::load`] with a custom token variable (`[secret].env_var`).
    pub fn load_token(token_var: &str) -> Result<Self, RuntimeError> {
        let dotenv = match dotenvy::dotenv() {
            Ok(path) => Some(path),
            Err(e) if e.not_found() => None,
            Err(e) => return Err(RuntimeError::Dotenv { source: e }),
        };
        tracing::debug!(dotenv = ?dotenv, token_var, "loading bot environment");

        Self::from_lookup(token_var, process_env)
    }

    /// Build from an arbitrary variable source instead of the process environment.
    pub fn from_lookup<F>(token_var: &str, lookup: F) -> Result<Self, RuntimeError>
    where
        F: Fn(&str) -> Result<Option<String>, RuntimeError>,
    {
        let token = lookup(token_var)?
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| RuntimeError::MissingToken {
                name: token_var.to_owned(),
            })?;

        let env = Self {
            token_var: token_var.to_owned(),
            token: SecretString::from(token),
            app_name: lookup("APP_NAME")?.unwrap_or_else(|| DEFAULT_APP_NAME.to_owned()),
            app_version: lookup("APP_VERSION")?
                .unwrap_or_else(|| DEFAULT_APP_VERSION.to_owned()),
        };

        tracing::debug!(
            app_name = %env.app_name,
            app_version = %env.app_version,
            "bot environment loaded",
        );
        Ok(env)
    }

    pub fn token_var(&self) -> &str {
        &self.token_var
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    /// Raw token for handing to the bot framework.
    pub fn expose_token(&self) -> &str {
        self.token.expose_secret()
    }
}

fn process_env(key: &str) -> Result<Option<String>, RuntimeError> {
    match std::env::var(key) {
        Ok(v) => Ok(Some(v)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(RuntimeError::NotUnicode {
            name: key.to_owned(),
        }),
    }
}
