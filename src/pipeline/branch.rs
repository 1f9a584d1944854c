//! Branch provisioning
//!
//! Derives a valid branch name and creates it at the base branch's head.

use crate::error::{Error, Result};
use crate::store::ContentStore;
use crate::types::CreateBranch;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

static FORBIDDEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[:?*\[\]^~\\\x00-\x1f\x7f]|@\{").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static REPEATED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/{2,}|-{2,}|\.{2,}").unwrap());

const EDGE_SEPARATORS: &[char] = &['-', '.', '/'];

fn sanitize_pass(raw: &str) -> String {
    let cleaned = FORBIDDEN.replace_all(raw.trim(), "");
    let cleaned = WHITESPACE.replace_all(&cleaned, "-");
    let cleaned = REPEATED.replace_all(&cleaned, |caps: &regex::Captures<'_>| {
        caps[0][..1].to_string()
    });

    cleaned
        .split('/')
        .map(|component| {
            let component = component.trim_matches(EDGE_SEPARATORS);
            component
                .strip_suffix(".lock")
                .unwrap_or(component)
                .trim_matches(EDGE_SEPARATORS)
        })
        .filter(|component| !component.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Rewrite `raw` into a name git accepts as a branch
///
/// Forbidden characters are dropped, whitespace becomes `-`, repeated
/// separators collapse to one, and separators are trimmed from the ends of
/// the name and of every `/` component. Passes repeat until the name stops
/// changing, so removals never leave a new forbidden sequence behind and
/// sanitizing a sanitized name returns it unchanged.
pub fn sanitize_branch_name(raw: &str) -> Result<String> {
    let mut name = sanitize_pass(raw);
    loop {
        let next = sanitize_pass(&name);
        if next == name {
            break;
        }
        name = next;
    }

    if name.is_empty() || name == "@" {
        return Err(Error::ValidationFailed(format!(
            "branch name {raw:?} is empty after sanitization"
        )));
    }

    Ok(name)
}

/// Sanitize `desired` and refuse names that resolve to the base branch
///
/// Changes only ever land on their own branch; the base is reached through
/// a pull request or an explicit merge.
pub fn change_branch_name(base: &str, desired: &str) -> Result<String> {
    let branch = sanitize_branch_name(desired)?;
    if branch == base.trim() {
        return Err(Error::ValidationFailed(format!(
            "branch {branch:?} is the base branch"
        )));
    }
    Ok(branch)
}

/// Timestamp fragment used in derived branch names, e.g. `2024-01-01T00-00-00-000Z`
pub fn branch_stamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Ensure a branch named after `desired` exists, starting at `base`'s head
///
/// A missing base is `BaseRefNotFound`; a failed lookup keeps the remote
/// status as `BranchCreateFailed`.
///
/// An existing branch with the same sanitized name is reused, so repeating
/// the call for the same logical change succeeds. Returns the branch name
/// actually used.
pub async fn ensure_branch(store: &dyn ContentStore, base: &str, desired: &str) -> Result<String> {
    let branch = change_branch_name(base, desired)?;

    let sha = match store.branch_head(base).await {
        Ok(Some(sha)) => sha,
        Ok(None) => return Err(Error::BaseRefNotFound(base.to_string())),
        Err(e) => return Err(Error::branch_create_failed(&branch, e)),
    };

    match store.create_branch(&branch, &sha).await {
        Ok(CreateBranch::Created) => {
            info!(%branch, base, %sha, "created branch");
        }
        Ok(CreateBranch::AlreadyExists) => {
            debug!(%branch, "branch already exists, reusing");
        }
        Err(e) => return Err(Error::branch_create_failed(&branch, e)),
    }

    Ok(branch)
}
