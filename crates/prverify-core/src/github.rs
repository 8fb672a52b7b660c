//! GitHub Checks API client
//!
//! Implements [`ChecksApi`] over the GitHub REST API using `reqwest`.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{ApiResult, ChecksApi};
use crate::check_run::{CheckRun, CheckRunList, CheckRunUpdate, NewCheckRun, RepoRef};
use crate::error::ApiError;

/// Default public GitHub API endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("prverify/", env!("CARGO_PKG_VERSION"));

/// GitHub connection settings
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API base URL, without trailing slash
    pub api_url: String,
    /// Token used as a bearer credential
    pub token: String,
}

impl GitHubConfig {
    /// Config for the public API
    pub fn new(token: &str) -> Self {
        GitHubConfig {
            api_url: DEFAULT_API_URL.to_string(),
            token: token.to_string(),
        }
    }

    /// Use a different API endpoint (GitHub Enterprise)
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }
}

/// Checks API client backed by `reqwest`
pub struct GitHubChecksClient {
    config: GitHubConfig,
    http_client: reqwest::Client,
}

impl GitHubChecksClient {
    /// Create a new client
    pub fn new(config: GitHubConfig) -> ApiResult<Self> {
        let http_client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(GitHubChecksClient {
            config,
            http_client,
        })
    }

    fn check_runs_url(&self, repo: &RepoRef) -> String {
        format!(
            "{}/repos/{}/{}/check-runs",
            self.config.api_url, repo.owner, repo.repo
        )
    }

    fn check_run_url(&self, repo: &RepoRef, id: u64) -> String {
        format!("{}/{}", self.check_runs_url(repo), id)
    }

    fn commit_check_runs_url(&self, repo: &RepoRef, git_ref: &str) -> String {
        format!(
            "{}/repos/{}/{}/commits/{}/check-runs",
            self.config.api_url, repo.owner, repo.repo, git_ref
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, ACCEPT)
    }

    /// `filter=all` so that repeated runs of one check on a commit are all
    /// listed, not just the latest.
    fn list_request(&self, repo: &RepoRef, git_ref: &str, check_name: &str) -> RequestBuilder {
        let url = self.commit_check_runs_url(repo, git_ref);
        self.request(Method::GET, &url)
            .query(&[("check_name", check_name), ("filter", "all")])
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "checks API response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChecksApi for GitHubChecksClient {
    async fn create_check_run(&self, repo: &RepoRef, run: NewCheckRun) -> ApiResult<CheckRun> {
        let url = self.check_runs_url(repo);
        Self::send(self.request(Method::POST, &url).json(&run)).await
    }

    async fn list_check_runs_for_ref(
        &self,
        repo: &RepoRef,
        git_ref: &str,
        check_name: &str,
    ) -> ApiResult<CheckRunList> {
        Self::send(self.list_request(repo, git_ref, check_name)).await
    }

    async fn update_check_run(
        &self,
        repo: &RepoRef,
        id: u64,
        update: CheckRunUpdate,
    ) -> ApiResult<CheckRun> {
        let url = self.check_run_url(repo, id);
        Self::send(self.request(Method::PATCH, &url).json(&update)).await
    }
}
