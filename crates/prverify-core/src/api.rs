//! Remote Checks API abstraction.
//!
//! `ChecksApi` is the seam between the check-run store and whatever hosts
//! the check runs. [`GitHubChecksClient`](crate::github::GitHubChecksClient)
//! talks to GitHub; [`MemoryChecksApi`](crate::fakes::MemoryChecksApi)
//! keeps everything in memory for tests.

use async_trait::async_trait;

use crate::check_run::{CheckRun, CheckRunList, CheckRunUpdate, NewCheckRun, RepoRef};
use crate::error::ApiError;

/// Result type for remote API calls
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Remote check-run API.
///
/// Calls are plain round-trips: no retries, no upserts. Callers read before
/// they write.
#[async_trait]
pub trait ChecksApi: Send + Sync {
    /// Create a check run and return it as stored.
    async fn create_check_run(&self, repo: &RepoRef, run: NewCheckRun) -> ApiResult<CheckRun>;

    /// List runs on a commit ref whose name equals `check_name`.
    async fn list_check_runs_for_ref(
        &self,
        repo: &RepoRef,
        git_ref: &str,
        check_name: &str,
    ) -> ApiResult<CheckRunList>;

    /// Apply `update` to the run with the given id and return the result.
    async fn update_check_run(
        &self,
        repo: &RepoRef,
        id: u64,
        update: CheckRunUpdate,
    ) -> ApiResult<CheckRun>;
}
