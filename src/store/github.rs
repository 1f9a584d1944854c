//! GitHub content store implementation

use crate::error::{Error, RemoteError, Result};
use crate::store::ContentStore;
use crate::types::{
    CreateBranch, DirEntry, MergeOutcome, PullRequest, PutFile, RepoFile, StoreConfig,
    WriteHandle,
};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// GitHub store using the REST API through reqwest
pub struct GitHubStore {
    client: Client,
    token: String,
    config: StoreConfig,
}

#[derive(Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Serialize)]
struct CreateRefPayload<'a> {
    #[serde(rename = "ref")]
    ref_name: String,
    sha: &'a str,
}

#[derive(Deserialize)]
struct ContentFile {
    path: String,
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct PutFilePayload<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Serialize)]
struct DeleteFilePayload<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Deserialize)]
struct CommitInfo {
    sha: String,
}

#[derive(Deserialize)]
struct ContentInfo {
    path: String,
    sha: String,
}

#[derive(Deserialize)]
struct PutFileResponse {
    content: ContentInfo,
    commit: CommitInfo,
}

#[derive(Deserialize)]
struct DeleteFileResponse {
    commit: CommitInfo,
}

#[derive(Deserialize)]
struct PullRef {
    #[serde(rename = "ref")]
    ref_field: String,
}

#[derive(Deserialize)]
struct Pull {
    number: u64,
    html_url: String,
    #[serde(default)]
    title: String,
    base: PullRef,
    head: PullRef,
}

impl From<Pull> for PullRequest {
    fn from(pr: Pull) -> Self {
        Self {
            number: pr.number,
            html_url: pr.html_url,
            base_ref: pr.base.ref_field,
            head_ref: pr.head.ref_field,
            title: pr.title,
        }
    }
}

#[derive(Serialize)]
struct CreatePullPayload<'a> {
    title: &'a str,
    head: &'a str,
    base: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct MergePullResponse {
    sha: Option<String>,
    #[serde(default)]
    merged: bool,
}

#[derive(Serialize)]
struct MergeBranchPayload<'a> {
    base: &'a str,
    head: &'a str,
    commit_message: &'a str,
}

#[derive(Deserialize)]
struct MergeBranchResponse {
    sha: String,
}

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";

impl GitHubStore {
    /// Create a new GitHub store
    pub fn new(token: String, config: StoreConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(concat!("oscal-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            token,
            config,
        }
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            path
        )
    }

    fn contents_url(&self, path: &str) -> String {
        self.repo_url(&format!("/contents/{}", encode_path(path)))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!(%method, url, "content store request");
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, ACCEPT_GITHUB_JSON)
            .header("X-GitHub-Api-Version", "2022-11-28")
    }
}

/// Percent-encode each path segment, keeping the `/` separators
fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Turn a non-success response into a [`RemoteError`] carrying the body verbatim
async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RemoteError::new(status.as_u16(), body).into())
}

fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| Error::Parse(format!("invalid base64 content: {e}")))?;
    String::from_utf8(bytes).map_err(|e| Error::Parse(format!("content is not UTF-8: {e}")))
}

#[async_trait]
impl ContentStore for GitHubStore {
    async fn branch_head(&self, branch: &str) -> Result<Option<String>> {
        let url = self.repo_url(&format!("/git/ref/heads/{branch}"));
        let resp = self.request(Method::GET, &url).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let git_ref: GitRef = check(resp).await?.json().await?;
        Ok(Some(git_ref.object.sha))
    }

    async fn create_branch(&self, branch: &str, sha: &str) -> Result<CreateBranch> {
        let url = self.repo_url("/git/refs");
        let payload = CreateRefPayload {
            ref_name: format!("refs/heads/{branch}"),
            sha,
        };

        let resp = self.request(Method::POST, &url).json(&payload).send().await?;

        if resp.status() == StatusCode::UNPROCESSABLE_ENTITY {
            let body = resp.text().await.unwrap_or_default();
            if body.contains("already exists") {
                return Ok(CreateBranch::AlreadyExists);
            }
            return Err(RemoteError::new(422, body).into());
        }

        check(resp).await?;
        Ok(CreateBranch::Created)
    }

    async fn get_file(&self, branch: &str, path: &str) -> Result<Option<RepoFile>> {
        let url = self.contents_url(path);
        let resp = self
            .request(Method::GET, &url)
            .query(&[("ref", branch)])
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let value: Value = check(resp).await?.json().await?;
        if value.is_array() {
            return Err(Error::Parse(format!("{path} is a directory")));
        }

        let file: ContentFile = serde_json::from_value(value)?;
        let content = match file.content.as_deref() {
            Some(encoded) => decode_content(encoded)?,
            None => String::new(),
        };

        Ok(Some(RepoFile {
            path: file.path,
            sha: file.sha,
            content,
        }))
    }

    async fn put_file(&self, request: &PutFile) -> Result<WriteHandle> {
        let url = self.contents_url(&request.path);
        let payload = PutFilePayload {
            message: &request.message,
            content: BASE64.encode(request.content.as_bytes()),
            branch: &request.branch,
            sha: request.sha.as_deref(),
        };

        let written: PutFileResponse = check(
            self.request(Method::PUT, &url)
                .json(&payload)
                .send()
                .await?,
        )
        .await?
        .json()
        .await?;

        Ok(WriteHandle {
            path: written.content.path,
            blob_sha: Some(written.content.sha),
            commit_sha: written.commit.sha,
        })
    }

    async fn delete_file(
        &self,
        branch: &str,
        path: &str,
        sha: &str,
        message: &str,
    ) -> Result<String> {
        let url = self.contents_url(path);
        let payload = DeleteFilePayload {
            message,
            sha,
            branch,
        };

        let deleted: DeleteFileResponse = check(
            self.request(Method::DELETE, &url)
                .json(&payload)
                .send()
                .await?,
        )
        .await?
        .json()
        .await?;

        Ok(deleted.commit.sha)
    }

    async fn list_dir(&self, branch: &str, path: &str) -> Result<Vec<DirEntry>> {
        let url = self.contents_url(path);
        let resp = self
            .request(Method::GET, &url)
            .query(&[("ref", branch)])
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let value: Value = check(resp).await?.json().await?;
        if !value.is_array() {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_value(value)?)
    }

    async fn find_open_pr(&self, head_branch: &str) -> Result<Option<PullRequest>> {
        let url = self.repo_url("/pulls");
        let head = format!("{}:{}", self.config.owner, head_branch);

        let prs: Vec<Pull> = check(
            self.request(Method::GET, &url)
                .query(&[("head", head.as_str()), ("state", "open")])
                .send()
                .await?,
        )
        .await?
        .json()
        .await?;

        Ok(prs.into_iter().next().map(PullRequest::from))
    }

    async fn create_pr(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        let url = self.repo_url("/pulls");
        let payload = CreatePullPayload {
            title,
            head,
            base,
            body,
        };

        let pr: Pull = check(
            self.request(Method::POST, &url)
                .json(&payload)
                .send()
                .await?,
        )
        .await?
        .json()
        .await?;

        Ok(pr.into())
    }

    async fn merge_pr(&self, pr_number: u64) -> Result<MergeOutcome> {
        let url = self.repo_url(&format!("/pulls/{pr_number}/merge"));

        let merged: MergePullResponse = check(
            self.request(Method::PUT, &url)
                .json(&serde_json::json!({}))
                .send()
                .await?,
        )
        .await?
        .json()
        .await?;

        Ok(MergeOutcome {
            merged: merged.merged,
            commit_sha: merged.sha,
        })
    }

    async fn merge_branch(&self, base: &str, head: &str, message: &str) -> Result<MergeOutcome> {
        let url = self.repo_url("/merges");
        let payload = MergeBranchPayload {
            base,
            head,
            commit_message: message,
        };

        let resp = check(
            self.request(Method::POST, &url)
                .json(&payload)
                .send()
                .await?,
        )
        .await?;

        // 204: head is already contained in base
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(MergeOutcome {
                merged: false,
                commit_sha: None,
            });
        }

        let merge: MergeBranchResponse = resp.json().await?;
        Ok(MergeOutcome {
            merged: true,
            commit_sha: Some(merge.sha),
        })
    }

    async fn read_raw(&self, branch: &str, path: &str) -> Result<Option<Value>> {
        let url = self.config.raw_file_url(branch, path);
        debug!(url, "raw document fetch");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Ok(Some(check(resp).await?.json().await?))
    }

    fn config(&self) -> &StoreConfig {
        &self.config
    }
}
