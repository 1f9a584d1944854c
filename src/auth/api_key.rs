//! Shared API key check for write routes

use crate::config::GatewayConfig;
use crate::error::{Error, Result};

/// Header carrying the caller's API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Check the `x-api-key` value presented by a caller
///
/// Mock mode accepts every caller. Otherwise the key must be configured and
/// match exactly.
pub fn check_api_key(config: &GatewayConfig, presented: Option<&str>) -> Result<()> {
    if config.auth_disabled() {
        return Ok(());
    }

    match (config.api_key.as_deref(), presented) {
        (Some(expected), Some(given)) if expected == given => Ok(()),
        (None, _) => Err(Error::Unauthorized("API key not configured".to_string())),
        _ => Err(Error::Unauthorized("missing or invalid API key".to_string())),
    }
}
