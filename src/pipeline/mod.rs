//! Change-proposal pipeline
//!
//! Every edit reaches the data repository the same way:
//! - Branch: derive a valid branch name and create it at the base head
//! - Write: commit the documents onto that branch, one file at a time
//! - Review: open a pull request back to the base, or reuse the open one
//!
//! Plans are built up front so all input checks run before the store is
//! called.

mod branch;
mod execute;
mod plan;
mod progress;
mod publish;
mod review;

pub use branch::{branch_stamp, change_branch_name, ensure_branch, sanitize_branch_name};
pub use execute::{execute_change, ChangeOutcome, Failure, Stage};
pub use plan::{
    plan_delete_tenant, plan_init_tenant, plan_save_draft, plan_update_tenant, plan_write_process,
    plan_write_profile, plan_write_ssp, ChangePlan, TenantInit, DRAFT_SECTIONS,
    TENANT_META_VERSION,
};
pub use progress::{FileStatus, NoopProgress, Phase, ProgressCallback, TracingProgress};
pub use publish::{
    delete_document, put_document, put_documents, render_document, FileChange, FileOp,
};
pub use review::{merge_review_request, open_or_reuse_review_request, ReviewRequest};
