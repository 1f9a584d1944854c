//! Change pipeline tests against the in-memory store

mod common;

use common::fixtures::{self, BASE, BASE_SHA};
use common::mock_store::MockStore;
use oscal_gateway::error::Error;
use oscal_gateway::oscal::complete_ssp;
use oscal_gateway::pipeline::{
    ChangeOutcome, ChangePlan, FileChange, NoopProgress, Stage, TenantInit, delete_document, ensure_branch,
    execute_change, merge_review_request, open_or_reuse_review_request, plan_delete_tenant,
    plan_init_tenant, plan_save_draft, plan_write_process, plan_write_ssp, put_document,
    put_documents,
};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

fn store() -> MockStore {
    MockStore::new(fixtures::store_config(), BASE_SHA)
}

// === Branch provisioning ===

#[tokio::test]
async fn test_ensure_branch_creates_at_base_head() {
    let store = store();

    let branch = ensure_branch(&store, BASE, "init/acme-2024-01-01T00-00-00-000Z")
        .await
        .unwrap();

    assert_eq!(branch, "init/acme-2024-01-01T00-00-00-000Z");
    assert_eq!(
        store.head_of("init/acme-2024-01-01T00-00-00-000Z").as_deref(),
        Some(BASE_SHA)
    );
}

#[tokio::test]
async fn test_ensure_branch_is_idempotent() {
    let store = store();
    let name = "init/acme-2024-01-01T00-00-00-000Z";

    let first = assert_ok!(ensure_branch(&store, BASE, name).await);
    let second = assert_ok!(ensure_branch(&store, BASE, name).await);

    assert_eq!(first, second);
    assert_eq!(store.branch_names().len(), 2);
}

#[tokio::test]
async fn test_ensure_branch_sanitizes_name() {
    let store = store();

    let branch = ensure_branch(&store, BASE, " draft: acme / ssp?* ").await.unwrap();

    assert_eq!(branch, "draft-acme/ssp");
    assert!(store.branch_names().contains("draft-acme/ssp"));
}

#[tokio::test]
async fn test_ensure_branch_missing_base() {
    let store = MockStore::empty(fixtures::store_config());

    let err = assert_err!(ensure_branch(&store, BASE, "init/acme").await);

    assert_eq!(err.kind(), "base_ref_not_found");
    assert!(store.branch_names().is_empty());
}

#[tokio::test]
async fn test_ensure_branch_other_create_failure() {
    let store = store();
    store.fail_create_branch(422, r#"{"message":"Reference update failed"}"#);

    let err = ensure_branch(&store, BASE, "init/acme").await.unwrap_err();

    assert!(matches!(err, Error::BranchCreateFailed { status: Some(422), .. }));
    assert!(err.to_string().contains("Reference update failed"));
}

#[tokio::test]
async fn test_ensure_branch_rejects_empty_name_without_calls() {
    let store = store();

    let err = ensure_branch(&store, BASE, " :?* ").await.unwrap_err();

    assert_eq!(err.kind(), "validation_failed");
    store.assert_untouched();
}

#[tokio::test]
async fn test_ensure_branch_refuses_base_without_calls() {
    let store = store();

    for desired in [BASE, " main ", "main.lock", "/main/"] {
        let err = ensure_branch(&store, BASE, desired).await.unwrap_err();
        assert_eq!(err.kind(), "validation_failed", "{desired:?}");
    }
    store.assert_untouched();
}

#[tokio::test]
async fn test_ensure_branch_lookup_failure_keeps_status() {
    let store = store();
    store.fail_branch_head(401, r#"{"message":"Bad credentials"}"#);

    let err = ensure_branch(&store, BASE, "init/acme").await.unwrap_err();

    assert_eq!(err.kind(), "branch_create_failed");
    assert_eq!(err.remote_status(), Some(401));
    assert!(err.detail().contains("Bad credentials"));
    assert!(store.branch_names().contains(BASE));
    assert_eq!(store.branch_names().len(), 1);
}

// === Document writes ===

#[tokio::test]
async fn test_write_then_read_round_trip() {
    let store = store();
    let path = "data/tenants/acme/ropa/hr-1.json";
    let doc = fixtures::process_doc("Payroll");
    ensure_branch(&store, BASE, "ropa/acme").await.unwrap();

    let handle = put_document(&store, "ropa/acme", path, &doc, "add").await.unwrap();

    assert_eq!(handle.path, path);
    assert!(handle.blob_sha.is_some());
    assert_eq!(store.document("ropa/acme", path), Some(doc));
    assert!(store.file_content("ropa/acme", path).unwrap().ends_with('\n'));
}

#[tokio::test]
async fn test_overwrite_sends_current_sha() {
    let store = store();
    let path = "data/tenants/acme/meta.json";
    ensure_branch(&store, BASE, "update/acme").await.unwrap();

    let first = put_document(&store, "update/acme", path, &json!({ "v": 1 }), "one")
        .await
        .unwrap();
    put_document(&store, "update/acme", path, &json!({ "v": 2 }), "two")
        .await
        .unwrap();

    let calls = store.get_put_calls();
    assert_eq!(calls[0].sha, None);
    assert_eq!(calls[1].sha, first.blob_sha);
    assert_eq!(store.document("update/acme", path), Some(json!({ "v": 2 })));
}

#[tokio::test]
async fn test_stale_sha_is_rejected() {
    let store = store();
    let path = "data/tenants/acme/meta.json";
    ensure_branch(&store, BASE, "update/acme").await.unwrap();
    put_document(&store, "update/acme", path, &json!({ "v": 1 }), "one")
        .await
        .unwrap();
    store.race_after_lookup(path);

    let err = put_document(&store, "update/acme", path, &json!({ "v": 2 }), "two")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "write_failed");
    assert_eq!(err.detail(), path);
    assert_eq!(err.remote_status(), Some(409));
    assert_eq!(
        store.document("update/acme", path),
        Some(json!({ "written": "elsewhere" }))
    );
}

#[tokio::test]
async fn test_batch_stops_at_first_failure() {
    let store = store();
    let first = "data/tenants/acme/meta.json";
    let second = "data/tenants/acme/procedures/proc-1/ssp.json";
    ensure_branch(&store, BASE, "init/acme").await.unwrap();
    store.fail_put(second, 409, r#"{"message":"conflict"}"#);

    let changes = vec![
        FileChange::put(first, json!({ "orgId": "acme" }), "meta"),
        FileChange::put(second, fixtures::ssp_doc("x"), "ssp"),
        FileChange::put("data/tenants/acme/ropa/ropa.json", json!({}), "ropa"),
    ];
    let err = put_documents(&store, "init/acme", &changes, &NoopProgress)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "write_failed");
    assert_eq!(err.detail(), second);
    assert_eq!(err.remote_status(), Some(409));
    assert!(store.document("init/acme", first).is_some());
    assert_eq!(store.get_put_calls().len(), 2);
}

#[tokio::test]
async fn test_delete_missing_document() {
    let store = store();
    ensure_branch(&store, BASE, "delete/acme").await.unwrap();

    let err = delete_document(&store, "delete/acme", "data/tenants/acme/meta.json", "rm")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::WriteFailed { status: Some(404), .. }));
}

// === Review requests ===

#[tokio::test]
async fn test_open_pr_is_reused() {
    let store = store();
    let existing = store.seed_open_pr("draft/acme", BASE);

    let review = open_or_reuse_review_request(&store, "draft/acme", BASE, "t", "b")
        .await
        .unwrap();

    assert!(review.reused);
    assert_eq!(review.pull_request, existing);
    assert_eq!(store.pr_count(), 1);
    assert!(store.get_create_pr_calls().is_empty());
}

#[tokio::test]
async fn test_review_failure_keeps_remote_detail() {
    let store = store();
    store.fail_create_pr(422, r#"{"message":"No commits between main and x"}"#);

    let err = open_or_reuse_review_request(&store, "x", BASE, "t", "b")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "review_request_failed");
    assert_eq!(err.remote_status(), Some(422));
    assert!(err.detail().contains("No commits"));
}

#[tokio::test]
async fn test_merge_through_open_pr() {
    let store = store();
    let config = fixtures::gateway_config();
    let plan = plan_write_process(&config, "acme", "hr-1", &fixtures::process_doc("Payroll"), fixtures::now())
        .unwrap();
    let outcome = execute_change(&store, &plan, &NoopProgress).await.unwrap();

    let merged = merge_review_request(&store, outcome.branch(), BASE).await.unwrap();

    assert!(merged.merged);
    assert!(merged.commit_sha.is_some());
    assert!(store.document(BASE, "data/tenants/acme/ropa/hr-1.json").is_some());
    assert!(store.get_calls().contains(&"merge_pr".to_string()));
}

#[tokio::test]
async fn test_merge_not_mergeable_reports_unmerged() {
    let store = store();
    store.seed_open_pr("draft/acme", BASE);
    store.fail_merge_pr(405, r#"{"message":"Pull Request is not mergeable"}"#);

    let merged = merge_review_request(&store, "draft/acme", BASE).await.unwrap();

    assert!(!merged.merged);
    assert_eq!(merged.commit_sha, None);
}

#[tokio::test]
async fn test_merge_failure_is_merge_failed() {
    let store = store();
    store.seed_open_pr("draft/acme", BASE);
    store.fail_merge_pr(409, r#"{"message":"Head branch was modified"}"#);

    let err = merge_review_request(&store, "draft/acme", BASE).await.unwrap_err();

    assert_eq!(err.kind(), "merge_failed");
    assert_eq!(err.remote_status(), Some(409));
}

#[tokio::test]
async fn test_merge_without_pr_merges_branch() {
    let store = store();
    ensure_branch(&store, BASE, "draft/acme").await.unwrap();
    put_document(&store, "draft/acme", "data/tenants/acme/meta.json", &json!({}), "m")
        .await
        .unwrap();

    let merged = merge_review_request(&store, "draft/acme", BASE).await.unwrap();

    assert!(merged.merged);
    assert!(store.get_calls().contains(&"merge_branch".to_string()));
    assert!(store.document(BASE, "data/tenants/acme/meta.json").is_some());
}

#[tokio::test]
async fn test_merge_base_into_itself_is_refused() {
    let store = store();

    let err = merge_review_request(&store, BASE, BASE).await.unwrap_err();

    assert_eq!(err.kind(), "validation_failed");
    store.assert_untouched();
}

// === End-to-end changes ===

#[tokio::test]
async fn test_init_tenant_change() {
    let store = store();
    let config = fixtures::gateway_config();
    let init = TenantInit {
        org_name: Some("Acme".to_string()),
        contact_email: Some("dpo@acme.example".to_string()),
        default_profile_href: Some("https://example.org/profile.json".to_string()),
    };
    let ssp = complete_ssp(None, init.profile_href(), fixtures::now());
    let plan = plan_init_tenant(&config, "acme", &init, ssp, fixtures::now()).unwrap();

    let outcome = execute_change(&store, &plan, &NoopProgress).await.unwrap();

    let ChangeOutcome::Proposed { branch, files, review } = outcome else {
        panic!("expected a proposed change");
    };
    assert_eq!(branch, "init/acme-2024-01-01T00-00-00-000Z");
    assert_eq!(files.len(), 3);
    assert!(!review.reused);
    assert_eq!(review.pull_request.title, "feat(tenant): init acme");

    let ssp = store
        .document(&branch, "data/tenants/acme/procedures/proc-1/ssp.json")
        .unwrap();
    assert_eq!(
        ssp["system-security-plan"]["import-profile"]["href"],
        "https://example.org/profile.json"
    );
    let meta = store.document(&branch, "data/tenants/acme/meta.json").unwrap();
    assert_eq!(meta["contactEmail"], "dpo@acme.example");
}

#[tokio::test]
async fn test_repeated_draft_saves_share_branch_and_pr() {
    let store = store();
    let config = fixtures::gateway_config();

    let first = plan_save_draft(&config, "acme", "draft/acme", &json!({ "meta": { "v": 1 } })).unwrap();
    let second = plan_save_draft(&config, "acme", "draft/acme", &json!({ "meta": { "v": 2 } })).unwrap();

    let a = execute_change(&store, &first, &NoopProgress).await.unwrap();
    let b = execute_change(&store, &second, &NoopProgress).await.unwrap();

    assert_eq!(a.branch(), b.branch());
    assert!(!a.review().unwrap().reused);
    assert!(b.review().unwrap().reused);
    assert_eq!(
        a.review().unwrap().pull_request.number,
        b.review().unwrap().pull_request.number
    );
    assert_eq!(store.pr_count(), 1);
    assert_eq!(
        store.document("draft/acme", "data/tenants/acme/meta.json").unwrap()["v"],
        2
    );
}

#[tokio::test]
async fn test_review_failure_is_partial_success() {
    let store = store();
    store.fail_create_pr(403, r#"{"message":"Resource not accessible"}"#);
    let config = fixtures::gateway_config();
    let plan = plan_write_ssp(&config, "acme", "emr", &fixtures::ssp_doc("EMR"), fixtures::now())
        .unwrap();

    let outcome = execute_change(&store, &plan, &NoopProgress).await.unwrap();

    let ChangeOutcome::Persisted { branch, files, advisory } = outcome else {
        panic!("expected a persisted change");
    };
    assert_eq!(files.len(), 1);
    assert_eq!(advisory.kind(), "review_request_failed");
    assert!(store.document(&branch, "data/tenants/acme/procedures/emr/ssp.json").is_some());
}

#[tokio::test]
async fn test_write_failure_stage() {
    let store = store();
    store.fail_put("data/tenants/acme/meta.json", 500, "boom");
    let config = fixtures::gateway_config();
    let plan = plan_save_draft(&config, "acme", "draft/x", &json!({ "meta": {} })).unwrap();

    let failure = execute_change(&store, &plan, &NoopProgress).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Write);
    assert_eq!(failure.error.detail(), "data/tenants/acme/meta.json");
    assert_eq!(store.pr_count(), 0);
}

#[tokio::test]
async fn test_branch_failure_stage() {
    let store = store();
    store.fail_branch_head(500, "unavailable");
    let config = fixtures::gateway_config();
    let plan = plan_delete_tenant(&config, "acme", fixtures::now()).unwrap();

    let failure = execute_change(&store, &plan, &NoopProgress).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Branch);
    assert_eq!(failure.error.kind(), "branch_create_failed");
    assert_eq!(failure.error.remote_status(), Some(500));
    assert_eq!(failure.error.detail(), "unavailable");
}

#[tokio::test]
async fn test_missing_base_failure_stage() {
    let store = MockStore::empty(fixtures::store_config());
    let config = fixtures::gateway_config();
    let plan = plan_delete_tenant(&config, "acme", fixtures::now()).unwrap();

    let failure = execute_change(&store, &plan, &NoopProgress).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Branch);
    assert_eq!(failure.error.kind(), "base_ref_not_found");
    assert_eq!(failure.error.remote_status(), None);
}

#[tokio::test]
async fn test_draft_onto_base_is_refused() {
    let config = fixtures::gateway_config();

    let err = plan_save_draft(&config, "acme", BASE, &json!({ "meta": { "v": 1 } })).unwrap_err();

    assert_eq!(err.kind(), "validation_failed");
}

#[tokio::test]
async fn test_change_onto_base_leaves_base_untouched() {
    let store = store();
    let path = "data/tenants/acme/meta.json";
    let original = json!({ "orgId": "acme", "v": 0 });
    store.seed_document(BASE, path, &original);
    let plan = ChangePlan {
        flow: "save-draft",
        base: BASE.to_string(),
        branch: " main ".to_string(),
        changes: vec![FileChange::put(path, json!({ "orgId": "acme", "v": 1 }), "draft")],
        title: "draft(acme): main".to_string(),
        body: "Draft saved for acme".to_string(),
    };

    let failure = execute_change(&store, &plan, &NoopProgress).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Validate);
    assert_eq!(failure.error.kind(), "validation_failed");
    store.assert_untouched();
    assert_eq!(store.document(BASE, path), Some(original));
    assert_eq!(store.pr_count(), 0);
}

#[tokio::test]
async fn test_delete_tenant_removes_meta() {
    let store = store();
    store.seed_document(BASE, "data/tenants/acme/meta.json", &json!({ "orgId": "acme" }));
    let config = fixtures::gateway_config();
    let plan = plan_delete_tenant(&config, "acme", fixtures::now()).unwrap();

    let outcome = execute_change(&store, &plan, &NoopProgress).await.unwrap();

    assert_eq!(outcome.files()[0].blob_sha, None);
    assert!(store.document(outcome.branch(), "data/tenants/acme/meta.json").is_none());
    assert!(store.document(BASE, "data/tenants/acme/meta.json").is_some());
}

#[tokio::test]
async fn test_ssp_without_root_never_reaches_store() {
    let store = store();
    let config = fixtures::gateway_config();

    let err = plan_write_ssp(&config, "acme", "emr", &json!({ "metadata": {} }), fixtures::now())
        .unwrap_err();

    assert_eq!(err.kind(), "validation_failed");
    store.assert_untouched();
}
