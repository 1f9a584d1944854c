//! Repository layout of tenant documents
//!
//! ```text
//! {root}/tenants/{org}/meta.json
//! {root}/tenants/{org}/procedures/{proc}/ssp.json
//! {root}/tenants/{org}/profiles/{profile}.json
//! {root}/tenants/{org}/ropa/ropa.json
//! {root}/tenants/{org}/ropa/{process}.json
//! ```

use crate::error::{Error, Result};

/// Procedure id used for the SSP written at tenant initialization
pub const INITIAL_PROCEDURE_ID: &str = "proc-1";

/// Profile id of the tenant's default profile pointer
pub const DEFAULT_PROFILE_ID: &str = "default";

/// RoPA register file stem
pub const ROPA_REGISTER_ID: &str = "ropa";

/// Strip everything but `[A-Za-z0-9._-]` from an identifier
pub fn sanitize_id(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

/// Sanitize an identifier and reject it if nothing usable remains
pub fn require_id(raw: &str, what: &str) -> Result<String> {
    let id = sanitize_id(raw);
    if id.is_empty() || id.chars().all(|c| c == '.') {
        return Err(Error::ValidationFailed(format!("invalid {what}: {raw:?}")));
    }
    Ok(id)
}

/// Sanitize a processing activity id; the register's own stem is reserved
pub fn require_process_id(raw: &str) -> Result<String> {
    let id = require_id(raw, "process id")?;
    if id == ROPA_REGISTER_ID {
        return Err(Error::ValidationFailed(format!(
            "process id {ROPA_REGISTER_ID:?} is reserved for the RoPA register"
        )));
    }
    Ok(id)
}

/// Paths of one tenant's documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantPaths {
    root: String,
}

impl TenantPaths {
    /// Paths for `org_id` under `data_root`; `org_id` must already be sanitized
    pub fn new(data_root: &str, org_id: &str) -> Self {
        let data_root = data_root.trim_matches('/');
        let root = if data_root.is_empty() {
            format!("tenants/{org_id}")
        } else {
            format!("{data_root}/tenants/{org_id}")
        };
        Self { root }
    }

    /// Tenant directory
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Tenant metadata
    pub fn meta(&self) -> String {
        format!("{}/meta.json", self.root)
    }

    /// Directory holding one sub-directory per procedure
    pub fn procedures_dir(&self) -> String {
        format!("{}/procedures", self.root)
    }

    /// SSP of a procedure
    pub fn ssp(&self, proc_id: &str) -> String {
        format!("{}/procedures/{proc_id}/ssp.json", self.root)
    }

    /// Directory holding profiles
    pub fn profiles_dir(&self) -> String {
        format!("{}/profiles", self.root)
    }

    /// A profile document
    pub fn profile(&self, profile_id: &str) -> String {
        format!("{}/profiles/{profile_id}.json", self.root)
    }

    /// Directory holding RoPA documents
    pub fn ropa_dir(&self) -> String {
        format!("{}/ropa", self.root)
    }

    /// The tenant's RoPA register
    pub fn ropa(&self) -> String {
        self.process(ROPA_REGISTER_ID)
    }

    /// A single processing activity
    pub fn process(&self, process_id: &str) -> String {
        format!("{}/ropa/{process_id}.json", self.root)
    }
}
