//! Change planning
//!
//! Turns a caller request into a [`ChangePlan`]: the branch to use, the files
//! to write and the pull request to open. Planning is pure; every input check
//! happens here, before the store is touched.

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::oscal::require_ssp_root;
use crate::paths::{
    require_id, require_process_id, TenantPaths, DEFAULT_PROFILE_ID, INITIAL_PROCEDURE_ID,
};
use crate::pipeline::branch::{branch_stamp, change_branch_name};
use crate::pipeline::publish::FileChange;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Version stamped into new tenant metadata
pub const TENANT_META_VERSION: &str = "0.1.0";

/// Top-level sections accepted in a draft body
pub const DRAFT_SECTIONS: &[&str] = &["meta", "procedures", "profiles", "ropa"];

/// A planned change, ready for [`crate::pipeline::execute_change`]
#[derive(Debug, Clone, PartialEq)]
pub struct ChangePlan {
    /// Short flow label used in logs
    pub flow: &'static str,
    /// Base branch the change is proposed against
    pub base: String,
    /// Desired branch name (sanitized when provisioned)
    pub branch: String,
    /// Files to write, in order
    pub changes: Vec<FileChange>,
    /// Pull request title
    pub title: String,
    /// Pull request body
    pub body: String,
}

impl ChangePlan {
    /// Paths touched by the plan, in write order
    pub fn paths(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.path.as_str()).collect()
    }
}

/// Body of a tenant initialization request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantInit {
    /// Display name of the organization
    #[serde(default)]
    pub org_name: Option<String>,
    /// Contact address
    #[serde(default)]
    pub contact_email: Option<String>,
    /// Profile the tenant's SSPs import by default
    #[serde(default)]
    pub default_profile_href: Option<String>,
}

impl TenantInit {
    /// Trimmed default profile href, if any
    pub fn profile_href(&self) -> Option<&str> {
        self.default_profile_href
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn trimmed(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::ValidationFailed(format!("{what} must be a JSON object")))
}

fn tenant(config: &GatewayConfig, org: &str) -> Result<(String, TenantPaths)> {
    let org_id = require_id(org, "organization id")?;
    let paths = TenantPaths::new(&config.data_root, &org_id);
    Ok((org_id, paths))
}

/// Plan the initialization of a tenant
///
/// Writes `meta.json`, a default profile pointer when a profile href is given,
/// and the first procedure's SSP.
pub fn plan_init_tenant(
    config: &GatewayConfig,
    org: &str,
    init: &TenantInit,
    ssp: Value,
    now: DateTime<Utc>,
) -> Result<ChangePlan> {
    let (org_id, paths) = tenant(config, org)?;
    require_ssp_root(&ssp)?;

    let created = timestamp(now);
    let org_name = match trimmed(init.org_name.as_deref()) {
        name if name.is_empty() => org_id.clone(),
        name => name,
    };

    let meta = json!({
        "orgId": org_id,
        "orgName": org_name,
        "contactEmail": trimmed(init.contact_email.as_deref()),
        "createdAt": created,
        "updatedAt": created,
        "version": TENANT_META_VERSION,
    });

    let mut targets = vec![(paths.meta(), meta)];
    if let Some(href) = init.profile_href() {
        targets.push((paths.profile(DEFAULT_PROFILE_ID), json!({ "href": href })));
    }
    targets.push((paths.ssp(INITIAL_PROCEDURE_ID), ssp));

    let changes = targets
        .into_iter()
        .map(|(path, doc)| {
            let message = format!("chore(tenant): add {path}");
            FileChange::put(path, doc, message)
        })
        .collect();

    Ok(ChangePlan {
        flow: "init-tenant",
        base: config.store.base_branch.clone(),
        branch: format!("init/{org_id}-{}", branch_stamp(now)),
        changes,
        title: format!("feat(tenant): init {org_id}"),
        body: format!("Automated init at {created}"),
    })
}

/// Plan an update of a tenant's metadata
///
/// The caller's object is kept as-is apart from `orgId` and `updatedAt`.
pub fn plan_update_tenant(
    config: &GatewayConfig,
    org: &str,
    meta: &Value,
    now: DateTime<Utc>,
) -> Result<ChangePlan> {
    let (org_id, paths) = tenant(config, org)?;

    let mut meta = as_object(meta, "tenant metadata")?.clone();
    meta.insert("orgId".to_string(), json!(org_id));
    meta.insert("updatedAt".to_string(), json!(timestamp(now)));

    let path = paths.meta();
    let message = format!("chore(tenant): update {path}");

    Ok(ChangePlan {
        flow: "update-tenant",
        base: config.store.base_branch.clone(),
        branch: format!("update/{org_id}-{}", branch_stamp(now)),
        changes: vec![FileChange::put(path, Value::Object(meta), message)],
        title: format!("chore(tenant): update {org_id}"),
        body: "Automated update".to_string(),
    })
}

/// Plan the removal of a tenant's metadata
pub fn plan_delete_tenant(
    config: &GatewayConfig,
    org: &str,
    now: DateTime<Utc>,
) -> Result<ChangePlan> {
    let (org_id, paths) = tenant(config, org)?;

    let path = paths.meta();
    let message = format!("chore(tenant): delete {path}");

    Ok(ChangePlan {
        flow: "delete-tenant",
        base: config.store.base_branch.clone(),
        branch: format!("delete/{org_id}-{}", branch_stamp(now)),
        changes: vec![FileChange::delete(path, message)],
        title: format!("chore(tenant): delete meta of {org_id}"),
        body: "Automated delete".to_string(),
    })
}

fn draft_documents<'a>(section: &'a Value, name: &str) -> Result<Vec<(String, &'a Value)>> {
    let what = format!("{name} id");
    as_object(section, &format!("draft section '{name}'"))?
        .iter()
        .map(|(id, doc)| Ok((require_id(id, &what)?, doc)))
        .collect()
}

/// Plan saving a draft onto the caller's branch `reference`
///
/// The body holds up to four sections:
///
/// ```json
/// {
///   "meta": { ... },
///   "procedures": { "<procId>": { "system-security-plan": { ... } } },
///   "profiles": { "<profileId>": { ... } },
///   "ropa": { "<processId>": { ... } }
/// }
/// ```
///
/// Repeated saves to the same reference land on the same branch and pull
/// request. A reference naming the base branch is rejected.
pub fn plan_save_draft(
    config: &GatewayConfig,
    org: &str,
    reference: &str,
    draft: &Value,
) -> Result<ChangePlan> {
    let (org_id, paths) = tenant(config, org)?;

    let reference = reference.trim();
    if reference.is_empty() {
        return Err(Error::ValidationFailed("missing ref".to_string()));
    }
    change_branch_name(&config.store.base_branch, reference)?;

    let sections = as_object(draft, "draft")?;
    if let Some(unknown) = sections.keys().find(|k| !DRAFT_SECTIONS.contains(&k.as_str())) {
        return Err(Error::ValidationFailed(format!(
            "unknown draft section '{unknown}'"
        )));
    }

    let mut targets = Vec::new();

    if let Some(meta) = sections.get("meta") {
        let mut meta = as_object(meta, "draft section 'meta'")?.clone();
        meta.insert("orgId".to_string(), json!(org_id));
        targets.push((paths.meta(), Value::Object(meta)));
    }

    if let Some(section) = sections.get("procedures") {
        for (proc_id, doc) in draft_documents(section, "procedures")? {
            require_ssp_root(doc).map_err(|e| {
                Error::ValidationFailed(format!("procedure {proc_id}: {}", e.detail()))
            })?;
            targets.push((paths.ssp(&proc_id), doc.clone()));
        }
    }

    if let Some(section) = sections.get("profiles") {
        for (profile_id, doc) in draft_documents(section, "profiles")? {
            targets.push((paths.profile(&profile_id), doc.clone()));
        }
    }

    if let Some(section) = sections.get("ropa") {
        for (process_id, doc) in draft_documents(section, "ropa")? {
            let process_id = require_process_id(&process_id)?;
            targets.push((paths.process(&process_id), doc.clone()));
        }
    }

    if targets.is_empty() {
        return Err(Error::ValidationFailed("draft contains no documents".to_string()));
    }

    let changes = targets
        .into_iter()
        .map(|(path, doc)| {
            let message = format!("draft({org_id}): {path}");
            FileChange::put(path, doc, message)
        })
        .collect();

    Ok(ChangePlan {
        flow: "save-draft",
        base: config.store.base_branch.clone(),
        branch: reference.to_string(),
        changes,
        title: format!("draft({org_id}): {reference}"),
        body: format!("Draft saved for {org_id}"),
    })
}

/// Plan writing a procedure's SSP
pub fn plan_write_ssp(
    config: &GatewayConfig,
    org: &str,
    proc: &str,
    ssp: &Value,
    now: DateTime<Utc>,
) -> Result<ChangePlan> {
    require_ssp_root(ssp)?;
    let (org_id, paths) = tenant(config, org)?;
    let proc_id = require_id(proc, "procedure id")?;

    Ok(ChangePlan {
        flow: "write-ssp",
        base: config.store.base_branch.clone(),
        branch: format!("procedure/{org_id}/{proc_id}/{}", branch_stamp(now)),
        changes: vec![FileChange::put(
            paths.ssp(&proc_id),
            ssp.clone(),
            format!("feat(procedure): {org_id}/{proc_id} update SSP"),
        )],
        title: format!("[SSP] {org_id}/{proc_id}"),
        body: format!("Update SSP of procedure {proc_id}"),
    })
}

/// Plan writing a profile document
pub fn plan_write_profile(
    config: &GatewayConfig,
    org: &str,
    profile: &str,
    doc: &Value,
    now: DateTime<Utc>,
) -> Result<ChangePlan> {
    let (org_id, paths) = tenant(config, org)?;
    let profile_id = require_id(profile, "profile id")?;
    as_object(doc, "profile")?;

    Ok(ChangePlan {
        flow: "write-profile",
        base: config.store.base_branch.clone(),
        branch: format!("profile/{org_id}/{profile_id}/{}", branch_stamp(now)),
        changes: vec![FileChange::put(
            paths.profile(&profile_id),
            doc.clone(),
            format!("feat(profile): {org_id}/{profile_id} update"),
        )],
        title: format!("[Profile] {org_id}/{profile_id}"),
        body: format!("Update profile {profile_id}"),
    })
}

/// Plan writing a RoPA processing activity
pub fn plan_write_process(
    config: &GatewayConfig,
    org: &str,
    process: &str,
    doc: &Value,
    now: DateTime<Utc>,
) -> Result<ChangePlan> {
    let (org_id, paths) = tenant(config, org)?;
    let process_id = require_process_id(process)?;
    as_object(doc, "processing activity")?;

    Ok(ChangePlan {
        flow: "write-ropa",
        base: config.store.base_branch.clone(),
        branch: format!("ropa/{org_id}/{process_id}/{}", branch_stamp(now)),
        changes: vec![FileChange::put(
            paths.process(&process_id),
            doc.clone(),
            format!("feat(ropa): {org_id}/{process_id} update"),
        )],
        title: format!("[RoPA] {org_id}/{process_id}"),
        body: format!("Update processing activity {process_id}"),
    })
}
