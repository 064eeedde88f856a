mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::DeliveryArg;

#[derive(Parser)]
#[command(
    name = "botdock",
    about = "Build minimal two-stage container images for Rust bots"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add botdock to an existing Rust project
    Init,
    /// Print the generated two-stage Dockerfile
    Dockerfile {
        /// Override [secret].delivery
        #[arg(long, value_enum)]
        delivery: Option<DeliveryArg>,
    },
    /// Eject Dockerfile for manual customization
    Eject,
    /// Compile the bot and package the runtime image
    Build {
        /// Allow building with uncommitted changes
        #[arg(long)]
        allow_dirty: bool,
        /// Override [secret].delivery
        #[arg(long, value_enum)]
        delivery: Option<DeliveryArg>,
        /// Image tag (default: [project].tag)
        #[arg(long, short = 't')]
        tag: Option<String>,
    },
    /// Run the packaged image once; exits with the bot's exit code
    Run {
        /// Image tag (default: [project].tag)
        #[arg(long, short = 't')]
        tag: Option<String>,
        /// Extra environment file passed to docker run
        #[arg(long)]
        env_file: Option<PathBuf>,
    },
    /// Check the packaged image for leaked or misplaced credentials
    Verify {
        /// Image tag (default: [project].tag)
        #[arg(long, short = 't')]
        tag: Option<String>,
    },
    /// Show the packaged image
    Status {
        /// Image tag (default: [project].tag)
        #[arg(long, short = 't')]
        tag: Option<String>,
    },
    /// Delete the image tag and the local bundle
    Destroy {
        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Check docker and project readiness
    Doctor,
    /// Serve botdock operations over MCP (stdio)
    Mcp(commands::mcp::McpArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => commands::init_project().await?,
        Commands::Dockerfile { delivery } => commands::dockerfile(delivery).await?,
        Commands::Eject => commands::eject().await?,
        Commands::Build {
            allow_dirty,
            delivery,
            tag,
        } => commands::build(allow_dirty, delivery, tag).await?,
        Commands::Run { tag, env_file } => {
            let code = commands::run(tag, env_file).await?;
            std::process::exit(code);
        }
        Commands::Verify { tag } => commands::verify(tag).await?,
        Commands::Status { tag } => commands::status(tag).await?,
        Commands::Destroy { yes } => commands::destroy(yes).await?,
        Commands::Doctor => commands::doctor().await?,
        Commands::Mcp(args) => commands::mcp::execute(args).await?,
    }

    Ok(())
}
