//! CLI module for archgrade.
//!
//! Subcommands:
//! - `evaluate`: Score a submission file against a challenge file
//! - `catalog`: Print the priced service catalog
//! - `mcp`: Run the MCP server (stdio transport)
//! - `serve`: Run the MCP server (HTTP transport)

mod catalog;
mod evaluate;
mod mcp;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// archgrade - Cloud Architecture Submission Evaluator
#[derive(Parser)]
#[command(name = "archgrade")]
#[command(about = "Cloud architecture submission evaluator - cost, pattern rules and LLM review")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum Format {
    /// Human-readable summary
    #[default]
    Text,
    /// Full result as JSON
    Json,
    /// Full result as TOON
    Toon,
}

#[derive(Subcommand)]
pub enum Command {
    /// Evaluate a submission against a challenge
    Evaluate {
        /// Challenge JSON file
        #[arg(long)]
        challenge: PathBuf,

        /// Submission JSON file ({"provider": ..., "architecture": {...}})
        #[arg(long)]
        submission: PathBuf,

        /// Run the LLM review (needs an oracle API key)
        #[arg(long)]
        qualitative: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// List catalog services with their monthly cost
    Catalog {
        /// Only this provider
        #[arg(long)]
        provider: Option<String>,
    },

    /// Run the MCP server (stdio transport for local use)
    Mcp,

    /// Run the MCP server (HTTP transport for remote access)
    Serve {
        /// Host address to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value = "3000")]
        port: u16,
    },
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Evaluate {
                ref challenge,
                ref submission,
                qualitative,
                format,
            } => {
                self.run_evaluate(challenge, submission, qualitative, format)
                    .await
            }
            Command::Catalog { ref provider } => self.run_catalog(provider.as_deref()),
            Command::Mcp => self.run_mcp().await,
            Command::Serve { ref host, port } => self.run_serve(host, port).await,
        }
    }
}
