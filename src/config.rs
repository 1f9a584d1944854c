//! Gateway configuration
//!
//! Everything per-deployment (store coordinates, data root, API key) lives in
//! [`GatewayConfig`], which is handed explicitly to the store, the plan
//! builders and the server. Nothing reads ambient globals after startup.

use crate::error::{Error, Result};
use crate::store::parse_repo_spec;
use crate::types::StoreConfig;
use clap::{Args, Parser, ValueEnum};

/// Default GitHub REST API root
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default GitHub raw content root
pub const DEFAULT_RAW_URL: &str = "https://raw.githubusercontent.com";

/// Gateway operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Write routes are open (local development against a scratch repo)
    Mock,
    /// Write routes require the API key
    Prod,
}

impl Mode {
    /// Lowercase name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Prod => "prod",
        }
    }
}

/// Command-line / environment arguments for the gateway
#[derive(Debug, Clone, Args)]
pub struct GatewayArgs {
    /// Address to listen on
    #[arg(long, env = "BIND", default_value = "0.0.0.0:8787")]
    pub bind: String,

    /// Owner of the data repository (optional when DATA_REPO is `owner/repo`)
    #[arg(long, env = "DATA_OWNER")]
    pub data_owner: Option<String>,

    /// Data repository: `repo`, `owner/repo` or a GitHub URL
    #[arg(long, env = "DATA_REPO")]
    pub data_repo: String,

    /// Base branch changes are proposed against
    #[arg(long, env = "DATA_BASE", default_value = "main")]
    pub data_base: String,

    /// Directory inside the repository that holds tenant data
    #[arg(long, env = "DATA_ROOT", default_value = "data")]
    pub data_root: String,

    /// Shared API key required in the `x-api-key` header for write routes
    #[arg(long, env = "APP_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Operating mode
    #[arg(long, env = "MODE", value_enum, default_value_t = Mode::Prod)]
    pub mode: Mode,

    /// Profile href injected into new SSPs when the caller gives none
    #[arg(long, env = "DEFAULT_PROFILE_HREF")]
    pub default_profile_href: Option<String>,

    /// URL of a JSON SSP template to start new SSPs from
    #[arg(long, env = "TEMPLATE_SSP_HREF")]
    pub template_ssp_href: Option<String>,

    /// Value of the `access-control-allow-origin` header
    #[arg(long, env = "ALLOW_ORIGIN", default_value = "*")]
    pub allow_origin: String,

    /// GitHub REST API root (defaults from the repository host)
    #[arg(long, env = "GITHUB_API_URL")]
    pub api_url: Option<String>,

    /// GitHub raw content root (defaults from the repository host)
    #[arg(long, env = "GITHUB_RAW_URL")]
    pub raw_url: Option<String>,
}

/// Resolved gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to listen on
    pub bind: String,
    /// Content store coordinates
    pub store: StoreConfig,
    /// Directory inside the repository that holds tenant data
    pub data_root: String,
    /// API key for write routes
    pub api_key: Option<String>,
    /// Operating mode
    pub mode: Mode,
    /// Default profile href for new SSPs
    pub default_profile_href: Option<String>,
    /// Remote SSP template URL
    pub template_ssp_href: Option<String>,
    /// CORS allowed origin
    pub allow_origin: String,
}

impl GatewayConfig {
    /// Configuration with defaults around the given store coordinates
    pub fn new(store: StoreConfig) -> Self {
        Self {
            bind: "0.0.0.0:8787".to_string(),
            store,
            data_root: "data".to_string(),
            api_key: None,
            mode: Mode::Prod,
            default_profile_href: None,
            template_ssp_href: None,
            allow_origin: "*".to_string(),
        }
    }

    /// Whether write routes can skip the API key check
    pub fn auth_disabled(&self) -> bool {
        self.mode == Mode::Mock
    }
}

#[derive(Parser)]
#[command(name = "oscal-gateway")]
struct EnvOnly {
    #[command(flatten)]
    args: GatewayArgs,
}

impl GatewayArgs {
    /// Read the arguments from the environment alone
    pub fn from_env() -> Result<Self> {
        EnvOnly::try_parse_from(["oscal-gateway"])
            .map(|cli| cli.args)
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Resolve arguments into a [`GatewayConfig`]
    pub fn into_config(self) -> Result<GatewayConfig> {
        let spec = parse_repo_spec(&self.data_repo)?;

        let owner = spec
            .owner
            .clone()
            .or(self.data_owner)
            .filter(|o| !o.trim().is_empty())
            .ok_or_else(|| {
                Error::Config("DATA_OWNER is required when DATA_REPO has no owner".to_string())
            })?;

        let base_branch = self.data_base.trim().to_string();
        if base_branch.is_empty() {
            return Err(Error::Config("DATA_BASE must not be empty".to_string()));
        }

        let api_url = self
            .api_url
            .or_else(|| spec.api_url())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let raw_url = self
            .raw_url
            .or_else(|| spec.raw_url())
            .unwrap_or_else(|| DEFAULT_RAW_URL.to_string());

        Ok(GatewayConfig {
            bind: self.bind,
            store: StoreConfig {
                owner,
                repo: spec.repo,
                base_branch,
                api_url,
                raw_url,
            },
            data_root: self.data_root.trim_matches('/').to_string(),
            api_key: self.api_key.filter(|k| !k.is_empty()),
            mode: self.mode,
            default_profile_href: self.default_profile_href.filter(|h| !h.is_empty()),
            template_ssp_href: self.template_ssp_href.filter(|h| !h.is_empty()),
            allow_origin: self.allow_origin,
        })
    }
}
