//! Document routes: procedures (SSPs), profiles and RoPA

use super::{propose, read_document, tenant_paths};
use crate::paths::{require_id, require_process_id, ROPA_REGISTER_ID};
use crate::pipeline::{plan_write_process, plan_write_profile, plan_write_ssp, Failure};
use crate::server::error::ApiError;
use crate::server::extract::{ApiKey, JsonBody};
use crate::server::response::{ChangeResponse, Listing};
use crate::server::AppState;
use crate::types::EntryKind;
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde_json::Value;

/// Names of the entries of `dir` on the base branch
///
/// With `json_stems`, only `*.json` files are listed, without extension;
/// otherwise only sub-directories.
async fn list(state: &AppState, dir: &str, json_stems: bool) -> Result<Json<Listing>, ApiError> {
    let base = &state.config.store.base_branch;
    let entries = state.store.list_dir(base, dir).await?;

    let items = entries
        .into_iter()
        .filter_map(|entry| match (entry.kind, json_stems) {
            (EntryKind::Dir, false) => Some(entry.name),
            (EntryKind::File, true) => entry.name.strip_suffix(".json").map(ToString::to_string),
            _ => None,
        })
        .collect();

    Ok(Json(Listing { ok: true, items }))
}

/// `GET /api/tenants/:org/procedures`
pub async fn list_procedures(
    State(state): State<AppState>,
    Path(org): Path<String>,
) -> Result<Json<Listing>, ApiError> {
    let (_, paths) = tenant_paths(&state, &org)?;
    list(&state, &paths.procedures_dir(), false).await
}

/// `GET /api/tenants/:org/procedures/:proc`, `GET /api/ssp/:org/:proc`
pub async fn read_ssp(
    State(state): State<AppState>,
    Path((org, proc)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let (_, paths) = tenant_paths(&state, &org)?;
    let proc_id = require_id(&proc, "procedure id")?;
    let doc = read_document(&state, &paths.ssp(&proc_id), &format!("ssp {proc_id}")).await?;
    Ok(Json(doc))
}

/// `PUT /api/tenants/:org/procedures/:proc`, `POST /api/ssp/:org/:proc`
pub async fn write_ssp(
    State(state): State<AppState>,
    _key: ApiKey,
    Path((org, proc)): Path<(String, String)>,
    JsonBody(doc): JsonBody<Value>,
) -> Result<Json<ChangeResponse>, ApiError> {
    let plan = plan_write_ssp(&state.config, &org, &proc, &doc, Utc::now())
        .map_err(Failure::validation)?;
    Ok(Json(propose(&state, &plan).await?))
}

/// `GET /api/tenants/:org/profiles`
pub async fn list_profiles(
    State(state): State<AppState>,
    Path(org): Path<String>,
) -> Result<Json<Listing>, ApiError> {
    let (_, paths) = tenant_paths(&state, &org)?;
    list(&state, &paths.profiles_dir(), true).await
}

/// `GET /api/tenants/:org/profiles/:id`
pub async fn read_profile(
    State(state): State<AppState>,
    Path((org, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let (_, paths) = tenant_paths(&state, &org)?;
    let profile_id = require_id(&id, "profile id")?;
    let doc = read_document(&state, &paths.profile(&profile_id), "profile").await?;
    Ok(Json(doc))
}

/// `PUT /api/tenants/:org/profiles/:id`
pub async fn write_profile(
    State(state): State<AppState>,
    _key: ApiKey,
    Path((org, id)): Path<(String, String)>,
    JsonBody(doc): JsonBody<Value>,
) -> Result<Json<ChangeResponse>, ApiError> {
    let plan = plan_write_profile(&state.config, &org, &id, &doc, Utc::now())
        .map_err(Failure::validation)?;
    Ok(Json(propose(&state, &plan).await?))
}

/// `GET /api/tenants/:org/ropa`, without the register itself
pub async fn list_processes(
    State(state): State<AppState>,
    Path(org): Path<String>,
) -> Result<Json<Listing>, ApiError> {
    let (_, paths) = tenant_paths(&state, &org)?;
    let Json(mut listing) = list(&state, &paths.ropa_dir(), true).await?;
    listing.items.retain(|item| item != ROPA_REGISTER_ID);
    Ok(Json(listing))
}

/// `GET /api/tenants/:org/ropa/:id`
pub async fn read_process(
    State(state): State<AppState>,
    Path((org, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let (_, paths) = tenant_paths(&state, &org)?;
    let process_id = require_process_id(&id)?;
    let doc = read_document(&state, &paths.process(&process_id), "process").await?;
    Ok(Json(doc))
}

/// `PUT /api/tenants/:org/ropa/:id`
pub async fn write_process(
    State(state): State<AppState>,
    _key: ApiKey,
    Path((org, id)): Path<(String, String)>,
    JsonBody(doc): JsonBody<Value>,
) -> Result<Json<ChangeResponse>, ApiError> {
    let plan = plan_write_process(&state.config, &org, &id, &doc, Utc::now())
        .map_err(Failure::validation)?;
    Ok(Json(propose(&state, &plan).await?))
}

/// `GET /api/ropa/:org`
pub async fn read_ropa(
    State(state): State<AppState>,
    Path(org): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let (org_id, paths) = tenant_paths(&state, &org)?;
    let doc = read_document(&state, &paths.ropa(), &format!("ropa of {org_id}")).await?;
    Ok(Json(doc))
}
