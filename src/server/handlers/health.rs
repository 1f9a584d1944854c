//! Health and template routes

use crate::oscal::ssp_template;
use crate::server::AppState;
use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

/// `GET /healthz`, `GET /api/healthz`
///
/// Reports which settings are present. Secret values are never echoed.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let config = &state.config;
    Json(json!({
        "ok": true,
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "mode": config.mode.as_str(),
            "envVars": {
                "DATA_OWNER": !config.store.owner.is_empty(),
                "DATA_REPO": !config.store.repo.is_empty(),
                "DATA_BASE": config.store.base_branch,
                "DATA_ROOT": config.data_root,
                "DEFAULT_PROFILE_HREF": config.default_profile_href.is_some(),
                "TEMPLATE_SSP_HREF": config.template_ssp_href.is_some(),
            },
            "secrets": {
                "APP_API_KEY": config.api_key.is_some(),
            }
        }
    }))
}

/// Query of the template route
#[derive(Debug, Deserialize)]
pub struct TemplateQuery {
    /// Profile href to import
    pub profile: Option<String>,
}

/// `GET /api/templates/ssp?profile=`
pub async fn ssp_template_route(
    State(state): State<AppState>,
    Query(query): Query<TemplateQuery>,
) -> Json<Value> {
    let profile = query
        .profile
        .filter(|p| !p.trim().is_empty())
        .or_else(|| state.config.default_profile_href.clone());

    let doc = ssp_template(
        &state.http,
        state.config.template_ssp_href.as_deref(),
        profile.as_deref(),
        Utc::now(),
    )
    .await;

    Json(doc)
}
