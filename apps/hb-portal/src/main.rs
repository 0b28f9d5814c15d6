//! # HB Portal
//!
//! The main binary for the HB training portal.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for roster, mission, approval and support operations
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │               apps/hb-portal (THE BINARY)            │
//! │                                                      │
//! │   ┌─────────────┐   ┌─────────────┐   ┌──────────┐   │
//! │   │    CLI      │   │  HTTP API   │   │  Config  │   │
//! │   │   (clap)    │   │   (axum)    │   │  (toml)  │   │
//! │   └──────┬──────┘   └──────┬──────┘   └────┬─────┘   │
//! │          └─────────────────┼───────────────┘         │
//! │                            ▼                         │
//! │                   ┌────────────────┐                 │
//! │                   │ hb-portal-core │                 │
//! │                   │  (THE LOGIC)   │                 │
//! │                   └────────────────┘                 │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Create a database with the demo roster
//! hb-portal init --seed
//!
//! # Start the HTTP server
//! HB_PORTAL_ADMIN_KEY=change-me hb-portal server --port 8080
//!
//! # CLI operations
//! hb-portal missions --trainee trainee-1
//! hb-portal complete --trainee trainee-1 --task task-1
//! hb-portal approve --trainee trainee-1 --task task-2
//! ```

use clap::Parser;
use hb_portal::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // HB_PORTAL_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("HB_PORTAL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "hb_portal=debug,tower_http=debug"
    } else {
        "hb_portal=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the HB Portal startup banner.
fn print_banner() {
    println!(
        r#"
  ██╗  ██╗██████╗     ██████╗  ██████╗ ██████╗ ████████╗ █████╗ ██╗
  ██║  ██║██╔══██╗    ██╔══██╗██╔═══██╗██╔══██╗╚══██╔══╝██╔══██╗██║
  ███████║██████╔╝    ██████╔╝██║   ██║██████╔╝   ██║   ███████║██║
  ██╔══██║██╔══██╗    ██╔═══╝ ██║   ██║██╔══██╗   ██║   ██╔══██║██║
  ██║  ██║██████╔╝    ██║     ╚██████╔╝██║  ██║   ██║   ██║  ██║███████╗
  ╚═╝  ╚═╝╚═════╝     ╚═╝      ╚═════╝ ╚═╝  ╚═╝   ╚═╝   ╚═╝  ╚═╝╚══════╝

  Trainee Progression Portal v{}

  Missions • Levels • Badges
"#,
        env!("CARGO_PKG_VERSION")
    );
}
