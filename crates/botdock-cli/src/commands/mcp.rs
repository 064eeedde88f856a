//! MCP server for botdock
//!
//! MCP Protocol (stdio) <-> botdock-engine / botdock-core / botdock-build
//!
//! Each tool is a thin wrapper around existing CLI logic.
//! The build pipeline and doctor checks are shared with the CLI.

use anyhow::Result;
use botdock_engine::DockerClient;
use clap::Args;
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::{tool::ToolCallContext, tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
    transport::stdio,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::build_pipeline::{self, BuildOptions};
use super::{BotProject, DeliveryArg};

// =============================================================================
// CLI entry point
// =============================================================================

/// MCP subcommand arguments
#[derive(Args)]
#[command(after_long_help = r#"SETUP (~/.claude.json or any MCP client):
  {
    "mcpServers": {
      "botdock": {
        "command": "botdock",
        "args": ["mcp", "-p", "/path/to/bot"]
      }
    }
  }

TOOLS PROVIDED:
  doctor, config, dockerfile, status, build, eject

EXAMPLES:
  $ botdock mcp -p ./my-bot
"#)]
pub(crate) struct McpArgs {
    /// Project path containing Cargo.toml (and optionally botdock.toml)
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,
}

/// Execute the MCP server
pub(crate) async fn execute(args: McpArgs) -> Result<()> {
    let project_path = args.path.canonicalize().map_err(|e| {
        anyhow::anyhow!("Project path '{}' not accessible: {e}", args.path.display())
    })?;

    let server = BotdockMcpServer::new(project_path);
    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    Ok(())
}

// =============================================================================
// MCP Server
// =============================================================================

#[derive(Clone)]
struct BotdockMcpServer {
    project_path: PathBuf,
    tool_router: ToolRouter<Self>,
}

impl BotdockMcpServer {
    fn new(project_path: PathBuf) -> Self {
        Self {
            project_path,
            tool_router: Self::tool_router(),
        }
    }

    fn load_project(&self) -> Result<BotProject, McpError> {
        BotProject::load(&self.project_path)
            .map_err(|e| McpError::internal_error(format!("Failed to load project: {e:#}"), None))
    }
}

/// MCP clients send snake_case, matching botdock.toml.
fn parse_delivery(value: Option<&str>) -> Result<Option<DeliveryArg>, McpError> {
    match value {
        None => Ok(None),
        Some("build_time_file") => Ok(Some(DeliveryArg::BuildTimeFile)),
        Some("runtime_env") => Ok(Some(DeliveryArg::RuntimeEnv)),
        Some(other) => Err(McpError::invalid_params(
            format!("unknown delivery '{other}'; expected build_time_file or runtime_env"),
            None,
        )),
    }
}

// =============================================================================
// ServerHandler impl
// =============================================================================

impl ServerHandler for BotdockMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "botdock".to_string(),
                title: Some("botdock: minimal container images for Rust bots".to_string()),
                description: Some(
                    "Compile a Rust bot in a toolchain image and package only the binary into a minimal runtime image."
                        .to_string(),
                ),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "botdock MCP server for building bot images. \
                 Start with `doctor` to check docker and the project, use `config` to see settings, \
                 `dockerfile` to preview the two-stage build, `build` to package, and `status` to inspect the result."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool_ctx = ToolCallContext::new(self, request, context);
        self.tool_router.call(tool_ctx).await
    }
}

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpDoctorRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpConfigRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpDockerfileRequest {
    #[schemars(description = "Override [secret].delivery: build_time_file or runtime_env")]
    pub delivery: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpStatusRequest {
    #[schemars(description = "Image tag (default: [project].tag)")]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBuildRequest {
    #[schemars(description = "Allow building with uncommitted changes (default: false)")]
    #[serde(default)]
    pub allow_dirty: bool,
    #[schemars(description = "Override [secret].delivery: build_time_file or runtime_env")]
    pub delivery: Option<String>,
    #[schemars(description = "Image tag (default: [project].tag)")]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpEjectRequest {}

// =============================================================================
// Tool implementations: thin wrappers only
// =============================================================================

#[tool_router]
impl BotdockMcpServer {
    /// Uses shared DoctorReport Display impl.
    #[tool(
        name = "doctor",
        description = "Check readiness: docker CLI, docker daemon, botdock.toml, Cargo project and binary, and whether the bot token is available. Never returns the token value.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn doctor(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpDoctorRequest>,
    ) -> Result<CallToolResult, McpError> {
        let report = super::doctor::diagnose(&self.project_path).await;
        Ok(CallToolResult::success(vec![Content::text(
            report.to_string(),
        )]))
    }

    #[tool(
        name = "config",
        description = "Show the current botdock.toml configuration as JSON with defaults applied: project, build, secret, and paths.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn config(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpConfigRequest>,
    ) -> Result<CallToolResult, McpError> {
        let config = botdock_core::BotdockConfig::load(&self.project_path)
            .map_err(|e| McpError::internal_error(format!("Failed to load config: {e}"), None))?;

        let json = serde_json::to_string_pretty(&config).map_err(|e| {
            McpError::internal_error(format!("Failed to serialize config: {e}"), None)
        })?;

        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(
        name = "dockerfile",
        description = "Render the two-stage Dockerfile (builder + runtime) for the configured or given delivery variant.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn dockerfile(
        &self,
        Parameters(req): Parameters<McpDockerfileRequest>,
    ) -> Result<CallToolResult, McpError> {
        let delivery = parse_delivery(req.delivery.as_deref())?;
        let project = self.load_project()?.with_delivery(delivery);
        Ok(CallToolResult::success(vec![Content::text(
            project.render_dockerfile(),
        )]))
    }

    #[tool(
        name = "status",
        description = "Inspect the packaged image: id, size, entry point, and declared runtime environment variables.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn status(
        &self,
        Parameters(req): Parameters<McpStatusRequest>,
    ) -> Result<CallToolResult, McpError> {
        let project = self.load_project()?;
        let image = project.image(req.tag.as_deref()).to_string();

        let client = DockerClient::new();
        if !client.image_exists(&image).await {
            return Ok(CallToolResult::success(vec![Content::text(format!(
                "{image}: not built"
            ))]));
        }
        let summary = client
            .inspect(&image)
            .await
            .map_err(|e| McpError::internal_error(format!("Failed to inspect {image}: {e}"), None))?;

        let text = format!(
            "Image: {image}\nID: {}\nSize: {:.1} MB\nEntry point: {:?}\nDeclared env: {}",
            summary.short_id(),
            summary.size_mb(),
            summary.config.entrypoint,
            summary.declared_env().join(", ")
        );
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Uses shared build pipeline.
    #[tool(
        name = "build",
        description = "Full pipeline: dirty check -> bundle -> builder stage -> runtime stage -> tag. Returns the pipeline states and the image tag. Long-running operation.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = false,
            open_world_hint = false
        )
    )]
    async fn build(
        &self,
        Parameters(req): Parameters<McpBuildRequest>,
    ) -> Result<CallToolResult, McpError> {
        let delivery = parse_delivery(req.delivery.as_deref())?;
        let outcome = build_pipeline::run(
            &self.project_path,
            BuildOptions {
                allow_dirty: req.allow_dirty,
                delivery,
                tag: req.tag.as_deref(),
            },
        )
        .await
        .map_err(|e| McpError::internal_error(format!("{e:#}"), None))?;

        Ok(CallToolResult::success(vec![Content::text(
            outcome.steps.join("\n"),
        )]))
    }

    #[tool(
        name = "eject",
        description = "Export the generated Dockerfile to .botdock/Dockerfile for manual customization. After ejecting, `build` uses the ejected file instead of generating one.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn eject(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpEjectRequest>,
    ) -> Result<CallToolResult, McpError> {
        let project = self.load_project()?;

        let path = botdock_build::eject::eject(&self.project_path, &project.render_dockerfile())
            .map_err(|e| McpError::internal_error(format!("Eject failed: {e}"), None))?;

        Ok(CallToolResult::success(vec![Content::text(format!(
            "Ejected build config to {}\n\
             You can now edit it directly. `build` will use this file.",
            path.display()
        ))]))
    }
}

// =============================================================================
// Tests
// =============================================================================
