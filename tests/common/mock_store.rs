//! In-memory content store for testing
//!
//! These are test utilities - not all may be used by every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use oscal_gateway::error::{RemoteError, Result};
use oscal_gateway::store::ContentStore;
use oscal_gateway::types::{
    CreateBranch, DirEntry, EntryKind, MergeOutcome, PullRequest, PutFile, RepoFile, StoreConfig,
    WriteHandle,
};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Call record for `create_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrCall {
    pub head: String,
    pub base: String,
    pub title: String,
}

#[derive(Debug, Clone)]
struct StoredFile {
    sha: String,
    content: String,
}

#[derive(Debug, Clone)]
struct StoredPr {
    pr: PullRequest,
    open: bool,
}

#[derive(Debug, Default)]
struct State {
    /// branch -> head commit sha
    branches: HashMap<String, String>,
    /// branch -> path -> file
    files: HashMap<String, BTreeMap<String, StoredFile>>,
    prs: Vec<StoredPr>,
}

/// In-memory content store
///
/// Features:
/// - Branches with their own file trees, copied from the base on creation
/// - Compare-and-swap writes keyed on blob shas
/// - Pull requests with open/closed state
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockStore {
    config: StoreConfig,
    counter: AtomicU64,
    next_pr_number: AtomicU64,
    state: Mutex<State>,
    // Call tracking
    calls: Mutex<Vec<String>>,
    create_pr_calls: Mutex<Vec<CreatePrCall>>,
    put_calls: Mutex<Vec<PutFile>>,
    // Error injection
    fail_branch_head: Mutex<Option<RemoteError>>,
    fail_create_branch: Mutex<Option<RemoteError>>,
    fail_put_path: Mutex<Option<(String, RemoteError)>>,
    fail_create_pr: Mutex<Option<RemoteError>>,
    fail_merge_pr: Mutex<Option<RemoteError>>,
    race_on_lookup: Mutex<Option<String>>,
}

impl MockStore {
    /// Create a store whose base branch exists at `base_sha`
    pub fn new(config: StoreConfig, base_sha: &str) -> Self {
        let mut state = State::default();
        state
            .branches
            .insert(config.base_branch.clone(), base_sha.to_string());
        state
            .files
            .insert(config.base_branch.clone(), BTreeMap::new());

        Self {
            config,
            counter: AtomicU64::new(1),
            next_pr_number: AtomicU64::new(1),
            state: Mutex::new(state),
            calls: Mutex::new(Vec::new()),
            create_pr_calls: Mutex::new(Vec::new()),
            put_calls: Mutex::new(Vec::new()),
            fail_branch_head: Mutex::new(None),
            fail_create_branch: Mutex::new(None),
            fail_put_path: Mutex::new(None),
            fail_create_pr: Mutex::new(None),
            fail_merge_pr: Mutex::new(None),
            race_on_lookup: Mutex::new(None),
        }
    }

    /// Create a store with no branches at all
    pub fn empty(config: StoreConfig) -> Self {
        let store = Self::new(config, "unused");
        store.state.lock().unwrap().branches.clear();
        store
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.counter.fetch_add(1, Ordering::SeqCst))
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    // === Seeding ===

    /// Put a JSON document directly on a branch
    pub fn seed_document(&self, branch: &str, path: &str, doc: &Value) -> String {
        let sha = self.next_id("seed");
        let mut state = self.state.lock().unwrap();
        state.files.entry(branch.to_string()).or_default().insert(
            path.to_string(),
            StoredFile {
                sha: sha.clone(),
                content: serde_json::to_string_pretty(doc).unwrap(),
            },
        );
        sha
    }

    /// Register an already open PR
    pub fn seed_open_pr(&self, head: &str, base: &str) -> PullRequest {
        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        let pr = PullRequest {
            number,
            html_url: format!("https://github.com/test/repo/pull/{number}"),
            base_ref: base.to_string(),
            head_ref: head.to_string(),
            title: format!("existing {head}"),
        };
        self.state.lock().unwrap().prs.push(StoredPr {
            pr: pr.clone(),
            open: true,
        });
        pr
    }

    // === Error injection methods ===

    /// Make `branch_head` fail
    pub fn fail_branch_head(&self, status: u16, body: &str) {
        *self.fail_branch_head.lock().unwrap() = Some(RemoteError::new(status, body));
    }

    /// Make `create_branch` fail
    pub fn fail_create_branch(&self, status: u16, body: &str) {
        *self.fail_create_branch.lock().unwrap() = Some(RemoteError::new(status, body));
    }

    /// Make `put_file` fail for one path
    pub fn fail_put(&self, path: &str, status: u16, body: &str) {
        *self.fail_put_path.lock().unwrap() =
            Some((path.to_string(), RemoteError::new(status, body)));
    }

    /// Make `create_pr` fail
    pub fn fail_create_pr(&self, status: u16, body: &str) {
        *self.fail_create_pr.lock().unwrap() = Some(RemoteError::new(status, body));
    }

    /// Make `merge_pr` fail
    pub fn fail_merge_pr(&self, status: u16, body: &str) {
        *self.fail_merge_pr.lock().unwrap() = Some(RemoteError::new(status, body));
    }

    /// Simulate another writer updating `path` right after its sha is looked up
    pub fn race_after_lookup(&self, path: &str) {
        *self.race_on_lookup.lock().unwrap() = Some(path.to_string());
    }

    // === Inspection ===

    /// Head sha of a branch
    pub fn head_of(&self, branch: &str) -> Option<String> {
        self.state.lock().unwrap().branches.get(branch).cloned()
    }

    /// Names of all branches
    pub fn branch_names(&self) -> BTreeSet<String> {
        self.state.lock().unwrap().branches.keys().cloned().collect()
    }

    /// Raw content of a file on a branch
    pub fn file_content(&self, branch: &str, path: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(branch)
            .and_then(|tree| tree.get(path))
            .map(|f| f.content.clone())
    }

    /// Parsed JSON of a file on a branch
    pub fn document(&self, branch: &str, path: &str) -> Option<Value> {
        self.file_content(branch, path)
            .map(|c| serde_json::from_str(&c).unwrap())
    }

    /// Number of PRs ever opened
    pub fn pr_count(&self) -> usize {
        self.state.lock().unwrap().prs.len()
    }

    /// Names of the store methods called, in order
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// All `create_pr` calls
    pub fn get_create_pr_calls(&self) -> Vec<CreatePrCall> {
        self.create_pr_calls.lock().unwrap().clone()
    }

    /// All `put_file` calls
    pub fn get_put_calls(&self) -> Vec<PutFile> {
        self.put_calls.lock().unwrap().clone()
    }

    /// Assert that the store was never called
    pub fn assert_untouched(&self) {
        let calls = self.get_calls();
        assert!(calls.is_empty(), "Expected no store calls but got: {calls:?}");
    }

    fn merge_trees(&self, state: &mut State, base: &str, head: &str) -> String {
        let head_files = state.files.get(head).cloned().unwrap_or_default();
        state
            .files
            .entry(base.to_string())
            .or_default()
            .extend(head_files);
        let sha = self.next_id("merge");
        state.branches.insert(base.to_string(), sha.clone());
        sha
    }
}

fn not_found(what: &str) -> oscal_gateway::error::Error {
    RemoteError::new(404, format!(r#"{{"message":"Not Found: {what}"}}"#)).into()
}

#[async_trait]
impl ContentStore for MockStore {
    async fn branch_head(&self, branch: &str) -> Result<Option<String>> {
        self.record("branch_head");
        if let Some(err) = self.fail_branch_head.lock().unwrap().clone() {
            return Err(err.into());
        }
        Ok(self.head_of(branch))
    }

    async fn create_branch(&self, branch: &str, sha: &str) -> Result<CreateBranch> {
        self.record("create_branch");
        if let Some(err) = self.fail_create_branch.lock().unwrap().clone() {
            return Err(err.into());
        }

        let mut state = self.state.lock().unwrap();
        if state.branches.contains_key(branch) {
            return Ok(CreateBranch::AlreadyExists);
        }

        let base = &self.config.base_branch;
        let source = if state.branches.get(base).is_some_and(|head| head == sha) {
            Some(base.clone())
        } else {
            state
                .branches
                .iter()
                .find(|(_, head)| head.as_str() == sha)
                .map(|(name, _)| name.clone())
        };
        let tree = source
            .and_then(|name| state.files.get(&name).cloned())
            .unwrap_or_default();

        state.branches.insert(branch.to_string(), sha.to_string());
        state.files.insert(branch.to_string(), tree);
        Ok(CreateBranch::Created)
    }

    async fn get_file(&self, branch: &str, path: &str) -> Result<Option<RepoFile>> {
        self.record("get_file");
        let found = self
            .state
            .lock()
            .unwrap()
            .files
            .get(branch)
            .and_then(|tree| tree.get(path))
            .map(|f| RepoFile {
                path: path.to_string(),
                sha: f.sha.clone(),
                content: f.content.clone(),
            });

        let race = self.race_on_lookup.lock().unwrap().take();
        if race.as_deref() == Some(path) {
            let sha = self.next_id("concurrent");
            let mut state = self.state.lock().unwrap();
            state.files.entry(branch.to_string()).or_default().insert(
                path.to_string(),
                StoredFile {
                    sha,
                    content: "{\"written\":\"elsewhere\"}\n".to_string(),
                },
            );
        }

        Ok(found)
    }

    async fn put_file(&self, request: &PutFile) -> Result<WriteHandle> {
        self.record("put_file");
        self.put_calls.lock().unwrap().push(request.clone());

        if let Some((path, err)) = self.fail_put_path.lock().unwrap().clone() {
            if path == request.path {
                return Err(err.into());
            }
        }

        let mut state = self.state.lock().unwrap();
        if !state.branches.contains_key(&request.branch) {
            return Err(not_found(&request.branch));
        }

        let current = state
            .files
            .get(&request.branch)
            .and_then(|tree| tree.get(&request.path))
            .map(|f| f.sha.clone());

        match (current, request.sha.as_deref()) {
            (Some(_), None) => {
                return Err(RemoteError::new(
                    422,
                    r#"{"message":"Invalid request.\n\n\"sha\" wasn't supplied."}"#,
                )
                .into());
            }
            (Some(current), Some(expected)) if current != expected => {
                return Err(RemoteError::new(
                    409,
                    format!(r#"{{"message":"{} does not match {expected}"}}"#, request.path),
                )
                .into());
            }
            (None, Some(_)) => return Err(not_found(&request.path)),
            _ => {}
        }

        let blob_sha = self.next_id("blob");
        let commit_sha = self.next_id("commit");
        state
            .files
            .entry(request.branch.clone())
            .or_default()
            .insert(
                request.path.clone(),
                StoredFile {
                    sha: blob_sha.clone(),
                    content: request.content.clone(),
                },
            );
        state
            .branches
            .insert(request.branch.clone(), commit_sha.clone());

        Ok(WriteHandle {
            path: request.path.clone(),
            blob_sha: Some(blob_sha),
            commit_sha,
        })
    }

    async fn delete_file(
        &self,
        branch: &str,
        path: &str,
        sha: &str,
        _message: &str,
    ) -> Result<String> {
        self.record("delete_file");
        let mut state = self.state.lock().unwrap();
        let tree = state.files.entry(branch.to_string()).or_default();

        match tree.get(path) {
            None => return Err(not_found(path)),
            Some(f) if f.sha != sha => {
                return Err(RemoteError::new(409, format!("{path} does not match {sha}")).into());
            }
            Some(_) => {}
        }

        tree.remove(path);
        let commit_sha = self.next_id("commit");
        state
            .branches
            .insert(branch.to_string(), commit_sha.clone());
        Ok(commit_sha)
    }

    async fn list_dir(&self, branch: &str, path: &str) -> Result<Vec<DirEntry>> {
        self.record("list_dir");
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let state = self.state.lock().unwrap();

        let mut entries: BTreeMap<String, EntryKind> = BTreeMap::new();
        if let Some(tree) = state.files.get(branch) {
            for file_path in tree.keys() {
                if let Some(rest) = file_path.strip_prefix(&prefix) {
                    match rest.split_once('/') {
                        Some((dir, _)) => entries.insert(dir.to_string(), EntryKind::Dir),
                        None => entries.insert(rest.to_string(), EntryKind::File),
                    };
                }
            }
        }

        Ok(entries
            .into_iter()
            .map(|(name, kind)| DirEntry { name, kind })
            .collect())
    }

    async fn find_open_pr(&self, head_branch: &str) -> Result<Option<PullRequest>> {
        self.record("find_open_pr");
        Ok(self
            .state
            .lock()
            .unwrap()
            .prs
            .iter()
            .find(|p| p.open && p.pr.head_ref == head_branch)
            .map(|p| p.pr.clone()))
    }

    async fn create_pr(
        &self,
        head: &str,
        base: &str,
        title: &str,
        _body: &str,
    ) -> Result<PullRequest> {
        self.record("create_pr");
        self.create_pr_calls.lock().unwrap().push(CreatePrCall {
            head: head.to_string(),
            base: base.to_string(),
            title: title.to_string(),
        });

        if let Some(err) = self.fail_create_pr.lock().unwrap().clone() {
            return Err(err.into());
        }

        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        let pr = PullRequest {
            number,
            html_url: format!("https://github.com/test/repo/pull/{number}"),
            base_ref: base.to_string(),
            head_ref: head.to_string(),
            title: title.to_string(),
        };
        self.state.lock().unwrap().prs.push(StoredPr {
            pr: pr.clone(),
            open: true,
        });
        Ok(pr)
    }

    async fn merge_pr(&self, pr_number: u64) -> Result<MergeOutcome> {
        self.record("merge_pr");
        if let Some(err) = self.fail_merge_pr.lock().unwrap().clone() {
            return Err(err.into());
        }

        let mut state = self.state.lock().unwrap();
        let Some(index) = state.prs.iter().position(|p| p.pr.number == pr_number) else {
            return Err(not_found("pull request"));
        };
        state.prs[index].open = false;
        let (base, head) = (
            state.prs[index].pr.base_ref.clone(),
            state.prs[index].pr.head_ref.clone(),
        );
        let sha = self.merge_trees(&mut state, &base, &head);

        Ok(MergeOutcome {
            merged: true,
            commit_sha: Some(sha),
        })
    }

    async fn merge_branch(&self, base: &str, head: &str, _message: &str) -> Result<MergeOutcome> {
        self.record("merge_branch");
        let mut state = self.state.lock().unwrap();
        if !state.branches.contains_key(head) {
            return Err(not_found(head));
        }
        let sha = self.merge_trees(&mut state, base, head);
        Ok(MergeOutcome {
            merged: true,
            commit_sha: Some(sha),
        })
    }

    async fn read_raw(&self, branch: &str, path: &str) -> Result<Option<Value>> {
        self.record("read_raw");
        let content = self
            .state
            .lock()
            .unwrap()
            .files
            .get(branch)
            .and_then(|tree| tree.get(path))
            .map(|f| f.content.clone());
        match content {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn config(&self) -> &StoreConfig {
        &self.config
    }
}
