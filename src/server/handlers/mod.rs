//! Route handlers

pub mod documents;
pub mod health;
pub mod tenants;

use crate::error::Error;
use crate::paths::{require_id, TenantPaths};
use crate::pipeline::{execute_change, ChangePlan, TracingProgress};
use crate::server::error::ApiError;
use crate::server::response::ChangeResponse;
use crate::server::AppState;
use serde_json::Value;

/// Paths of the tenant named in the URL
fn tenant_paths(state: &AppState, org: &str) -> Result<(String, TenantPaths), ApiError> {
    let org_id = require_id(org, "organization id")?;
    let paths = TenantPaths::new(&state.config.data_root, &org_id);
    Ok((org_id, paths))
}

/// Read a document from the base branch
async fn read_document(state: &AppState, path: &str, what: &str) -> Result<Value, ApiError> {
    let base = &state.config.store.base_branch;
    state
        .store
        .read_raw(base, path)
        .await?
        .ok_or_else(|| Error::NotFound(what.to_string()).into())
}

/// Run a plan through the pipeline
async fn propose(state: &AppState, plan: &ChangePlan) -> Result<ChangeResponse, ApiError> {
    let progress = TracingProgress { flow: plan.flow };
    let outcome = execute_change(state.store.as_ref(), plan, &progress).await?;
    Ok(ChangeResponse::from(outcome))
}
