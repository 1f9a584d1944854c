//! Document writes onto a change branch

use crate::error::{Error, Result};
use crate::pipeline::progress::{FileStatus, ProgressCallback};
use crate::store::ContentStore;
use crate::types::{PutFile, WriteHandle};
use serde_json::{Map, Value};
use tracing::debug;

/// What to do with a file
#[derive(Debug, Clone, PartialEq)]
pub enum FileOp {
    /// Create or overwrite with this document
    Put(Value),
    /// Remove the file
    Delete,
}

/// One file touched by a change
#[derive(Debug, Clone, PartialEq)]
pub struct FileChange {
    /// Repository-relative path
    pub path: String,
    /// Operation
    pub op: FileOp,
    /// Commit message
    pub message: String,
}

impl FileChange {
    /// Write `document` at `path`
    pub fn put(path: impl Into<String>, document: Value, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            op: FileOp::Put(document),
            message: message.into(),
        }
    }

    /// Delete the file at `path`
    pub fn delete(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            op: FileOp::Delete,
            message: message.into(),
        }
    }
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect::<Map<_, _>>(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Serialize a document the way it is stored: sorted keys, pretty printed,
/// trailing newline
pub fn render_document(document: &Value) -> Result<String> {
    let mut text = serde_json::to_string_pretty(&canonicalize(document))?;
    text.push('\n');
    Ok(text)
}

/// Create or overwrite one document on `branch`
///
/// The current blob sha is looked up first and sent along, so a concurrent
/// write between lookup and write is rejected by the store instead of being
/// silently overwritten.
pub async fn put_document(
    store: &dyn ContentStore,
    branch: &str,
    path: &str,
    document: &Value,
    message: &str,
) -> Result<WriteHandle> {
    let content = render_document(document)?;

    let existing = store
        .get_file(branch, path)
        .await
        .map_err(|e| Error::write_failed(path, e))?;

    let request = PutFile {
        branch: branch.to_string(),
        path: path.to_string(),
        content,
        message: message.to_string(),
        sha: existing.map(|f| f.sha),
    };

    debug!(branch, path, update = request.sha.is_some(), "putting document");
    store
        .put_file(&request)
        .await
        .map_err(|e| Error::write_failed(path, e))
}

/// Delete one document on `branch`
pub async fn delete_document(
    store: &dyn ContentStore,
    branch: &str,
    path: &str,
    message: &str,
) -> Result<WriteHandle> {
    let existing = store
        .get_file(branch, path)
        .await
        .map_err(|e| Error::write_failed(path, e))?
        .ok_or_else(|| Error::WriteFailed {
            path: path.to_string(),
            status: Some(404),
            detail: format!("{path} does not exist on {branch}"),
        })?;

    let commit_sha = store
        .delete_file(branch, path, &existing.sha, message)
        .await
        .map_err(|e| Error::write_failed(path, e))?;

    Ok(WriteHandle {
        path: path.to_string(),
        blob_sha: None,
        commit_sha,
    })
}

/// Apply `changes` in order; the first failure stops the batch
///
/// Files written before the failure stay committed on the branch.
pub async fn put_documents(
    store: &dyn ContentStore,
    branch: &str,
    changes: &[FileChange],
    progress: &dyn ProgressCallback,
) -> Result<Vec<WriteHandle>> {
    let mut handles = Vec::with_capacity(changes.len());

    for change in changes {
        progress.on_file(&change.path, FileStatus::Started).await;

        let written = match &change.op {
            FileOp::Put(document) => {
                put_document(store, branch, &change.path, document, &change.message).await
            }
            FileOp::Delete => delete_document(store, branch, &change.path, &change.message).await,
        };

        match written {
            Ok(handle) => {
                let status = if handle.blob_sha.is_some() {
                    FileStatus::Written
                } else {
                    FileStatus::Deleted
                };
                progress.on_file(&change.path, status).await;
                handles.push(handle);
            }
            Err(e) => {
                progress
                    .on_file(&change.path, FileStatus::Failed(e.to_string()))
                    .await;
                return Err(e);
            }
        }
    }

    Ok(handles)
}
