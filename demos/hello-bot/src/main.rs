//! Smallest bot botdock can package: reads its token and says hello.
//!
//! Build with either delivery mode:
//!   botdock build --delivery build-time-file   # token baked into /app/.env
//!   botdock build                              # token passed at `docker run -e`

use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match dotenvy::dotenv() {
        Ok(path) => tracing::info!("loaded {}", path.display()),
        Err(e) if e.not_found() => tracing::info!("no .env file, using process environment"),
        Err(e) => {
            tracing::error!("failed to read .env: {e}");
            return ExitCode::FAILURE;
        }
    }

    let token = match std::env::var("TELOXIDE_TOKEN") {
        Ok(t) if !t.trim().is_empty() => t,
        _ => {
            tracing::error!("TELOXIDE_TOKEN is not set");
            return ExitCode::FAILURE;
        }
    };
    let name = std::env::var("APP_NAME").unwrap_or_else(|_| "Bot".to_owned());
    let version = std::env::var("APP_VERSION").unwrap_or_else(|_| "0.1".to_owned());

    let bot_id = token.split(':').next().unwrap_or_default();
    tracing::info!(bot_id, "{name} v{version} ready");
    println!("Hello from {name} v{version}!");
    ExitCode::SUCCESS
}
