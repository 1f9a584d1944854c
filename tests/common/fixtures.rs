//! Test data factories for oscal-gateway types
//!
//! These are test utilities - not all may be used by every test binary.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use oscal_gateway::config::{GatewayConfig, Mode};
use oscal_gateway::types::StoreConfig;
use serde_json::{Value, json};

pub const OWNER: &str = "open-gov-group";
pub const REPO: &str = "opengov-privacy-data";
pub const BASE: &str = "main";
pub const BASE_SHA: &str = "abc123";
pub const API_KEY: &str = "test-key";

/// Store coordinates pointing at `api_url`
pub fn store_config_at(api_url: &str) -> StoreConfig {
    StoreConfig {
        owner: OWNER.to_string(),
        repo: REPO.to_string(),
        base_branch: BASE.to_string(),
        api_url: api_url.to_string(),
        raw_url: format!("{api_url}/raw"),
    }
}

/// Store coordinates for the in-memory store
pub fn store_config() -> StoreConfig {
    StoreConfig {
        raw_url: "https://raw.githubusercontent.com".to_string(),
        ..store_config_at("https://api.github.com")
    }
}

/// Gateway configuration in prod mode with [`API_KEY`]
pub fn gateway_config() -> GatewayConfig {
    let mut config = GatewayConfig::new(store_config());
    config.api_key = Some(API_KEY.to_string());
    config.mode = Mode::Prod;
    config
}

/// A fixed point in time
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// A minimal valid SSP
pub fn ssp_doc(title: &str) -> Value {
    json!({
        "system-security-plan": {
            "uuid": "11111111-2222-3333-4444-555555555555",
            "metadata": { "title": title, "oscal-version": "1.1.2" }
        }
    })
}

/// A RoPA processing activity
pub fn process_doc(title: &str) -> Value {
    json!({ "title": title, "purpose": "payroll", "legalBasis": "Art. 6(1)(b) GDPR" })
}
