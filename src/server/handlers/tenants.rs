//! Tenant routes: metadata, init, drafts and merges

use super::{propose, read_document, tenant_paths};
use crate::error::Error;
use crate::oscal::ssp_template;
use crate::paths::INITIAL_PROCEDURE_ID;
use crate::pipeline::{
    change_branch_name, merge_review_request, plan_delete_tenant, plan_init_tenant,
    plan_save_draft, plan_update_tenant, sanitize_branch_name, Failure, TenantInit,
};
use crate::server::error::ApiError;
use crate::server::extract::{ApiKey, JsonBody};
use crate::server::response::{ChangeResponse, MergeResponse};
use crate::server::AppState;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

/// `GET /api/tenants/:org`
pub async fn get_tenant(
    State(state): State<AppState>,
    Path(org): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let (org_id, paths) = tenant_paths(&state, &org)?;
    let meta = read_document(&state, &paths.meta(), &format!("tenant {org_id}")).await?;
    Ok(Json(meta))
}

/// `POST /api/tenants/:org/init`
///
/// The body is optional; an empty body initializes with defaults.
pub async fn init_tenant(
    State(state): State<AppState>,
    _key: ApiKey,
    Path(org): Path<String>,
    body: Bytes,
) -> Result<Json<ChangeResponse>, ApiError> {
    let init: TenantInit = if body.iter().all(u8::is_ascii_whitespace) {
        TenantInit::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| Error::ValidationFailed(format!("invalid init body: {e}")))?
    };

    let (_, paths) = tenant_paths(&state, &org)?;
    let now = Utc::now();
    let profile = init
        .profile_href()
        .map(ToString::to_string)
        .or_else(|| state.config.default_profile_href.clone());

    let ssp = ssp_template(
        &state.http,
        state.config.template_ssp_href.as_deref(),
        profile.as_deref(),
        now,
    )
    .await;

    let plan = plan_init_tenant(&state.config, &org, &init, ssp, now)
        .map_err(Failure::validation)?;
    let response = propose(&state, &plan).await?;

    let ssp_href = state
        .config
        .store
        .raw_file_url(&response.branch, &paths.ssp(INITIAL_PROCEDURE_ID));
    Ok(Json(response.with_next(json!({ "sspBundleHref": ssp_href }))))
}

/// `PUT /api/tenants/:org`
pub async fn update_tenant(
    State(state): State<AppState>,
    _key: ApiKey,
    Path(org): Path<String>,
    JsonBody(meta): JsonBody<Value>,
) -> Result<Json<ChangeResponse>, ApiError> {
    let plan = plan_update_tenant(&state.config, &org, &meta, Utc::now())
        .map_err(Failure::validation)?;
    Ok(Json(propose(&state, &plan).await?))
}

/// `DELETE /api/tenants/:org`
pub async fn delete_tenant(
    State(state): State<AppState>,
    _key: ApiKey,
    Path(org): Path<String>,
) -> Result<Json<ChangeResponse>, ApiError> {
    let plan = plan_delete_tenant(&state.config, &org, Utc::now())
        .map_err(Failure::validation)?;
    Ok(Json(propose(&state, &plan).await?))
}

/// Query naming the caller's branch
#[derive(Debug, Deserialize)]
pub struct RefQuery {
    /// Branch reference
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    /// Base branch (merge only)
    pub base: Option<String>,
}

impl RefQuery {
    fn reference(&self) -> Result<&str, ApiError> {
        self.reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| Error::ValidationFailed("missing ref".to_string()).into())
    }
}

/// `PUT /api/tenants/:org/save?ref=`
pub async fn save_draft(
    State(state): State<AppState>,
    _key: ApiKey,
    Path(org): Path<String>,
    Query(query): Query<RefQuery>,
    JsonBody(draft): JsonBody<Value>,
) -> Result<Json<ChangeResponse>, ApiError> {
    let reference = query.reference()?;
    let plan = plan_save_draft(&state.config, &org, reference, &draft)
        .map_err(Failure::validation)?;
    Ok(Json(propose(&state, &plan).await?))
}

/// `POST /api/tenants/:org/merge?ref=&base=`
pub async fn merge(
    State(state): State<AppState>,
    _key: ApiKey,
    Path(org): Path<String>,
    Query(query): Query<RefQuery>,
) -> Result<Json<MergeResponse>, ApiError> {
    tenant_paths(&state, &org)?;
    let base = match query.base.as_deref().map(str::trim) {
        Some(base) if !base.is_empty() => sanitize_branch_name(base)?,
        _ => state.config.store.base_branch.clone(),
    };
    let reference = change_branch_name(&base, query.reference()?)?;

    let outcome = merge_review_request(state.store.as_ref(), &reference, &base).await?;

    Ok(Json(MergeResponse {
        ok: true,
        merged: outcome.merged,
        base,
        reference,
        commit_sha: outcome.commit_sha,
    }))
}
