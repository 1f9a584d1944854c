//! oscal-gateway - OSCAL documents as pull requests
//!
//! Binary entry point: runs the HTTP gateway and the auth helpers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use oscal_gateway::config::{GatewayArgs, DEFAULT_API_URL};
use tracing_subscriber::EnvFilter;

mod cli;

const DEFAULT_LOG_FILTER: &str = "oscal_gateway=info,tower_http=info";

#[derive(Parser)]
#[command(name = "oscal-gateway")]
#[command(about = "HTTP gateway proposing OSCAL privacy documents as pull requests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway (default)
    Serve(GatewayArgs),

    /// Authentication management
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Test the data repository token
    Test {
        /// GitHub REST API root
        #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,
    },
    /// Show authentication setup instructions
    Setup,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve(args)) => cli::run_serve(args).await?,
        None => {
            // Default: serve with arguments taken from the environment
            let args = GatewayArgs::from_env()?;
            cli::run_serve(args).await?;
        }
        Some(Commands::Auth { action }) => match action {
            AuthAction::Test { api_url } => cli::run_auth_test(&api_url).await?,
            AuthAction::Setup => cli::run_auth_setup(),
        },
    }

    Ok(())
}
