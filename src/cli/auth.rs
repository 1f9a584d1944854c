//! Auth command - test and explain the data repository token

use crate::cli::style::{arrow, check, cross, Stylize};
use oscal_gateway::auth::{get_github_auth, test_github_auth};
use oscal_gateway::error::Result;

/// Run the auth test command
pub async fn run_auth_test(api_url: &str) -> Result<()> {
    println!("{} Testing GitHub authentication against {}", arrow(), api_url.accent());

    let config = match get_github_auth().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", cross(), e.error());
            eprintln!("{}", "Run `oscal-gateway auth setup` for instructions".muted());
            return Err(e);
        }
    };

    let username = test_github_auth(&config, api_url).await?;
    println!("{} Authenticated as: {}", check(), username.accent());
    println!("  {}", format!("Token source: {:?}", config.source).muted());
    Ok(())
}

/// Run the auth setup command (show instructions)
pub fn run_auth_setup() {
    println!("{}", "GitHub Authentication Setup".emphasis());
    println!();
    println!("The gateway needs a token with contents and pull request write");
    println!("access to the data repository.");
    println!();
    println!("{}", "Option 1: Environment variable (recommended for deployments)".emphasis());
    println!("  Set {} (or GITHUB_TOKEN / GH_TOKEN)", "GH_TOKEN_DATA".accent());
    println!();
    println!("{}", "Option 2: GitHub CLI".emphasis());
    println!("  Install: {}", "https://cli.github.com/".accent());
    println!("  Run: {}", "gh auth login".accent());
    println!();
    println!("{}", "For GitHub Enterprise:".emphasis());
    println!(
        "  Set DATA_REPO to the repository URL, or {} and {}",
        "GITHUB_API_URL".muted(),
        "GITHUB_RAW_URL".muted()
    );
    println!();
    println!("Callers of write routes send the APP_API_KEY value in the x-api-key header.");
}
