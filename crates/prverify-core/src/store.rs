//! Check-run store.
//!
//! Idempotent create / look-up / reset / finish / duplicate operations for a
//! single named check run, built on a [`ChecksApi`]. The API has no atomic
//! upsert, so every write is preceded by a read that decides what to do.
//!
//! Guarantees:
//! - `get_or_create` never picks between several matching runs: more than one
//!   match on a commit is reported as [`CheckError::AmbiguousCheckRun`].
//! - A commit change never mutates the old commit's run; `duplicate` creates
//!   a new record bound to the new SHA.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, Span};

use crate::api::ChecksApi;
use crate::check_run::{
    CheckConclusion, CheckOutput, CheckRun, CheckRunUpdate, CheckStatus, NewCheckRun, RepoRef,
};
use crate::error::{ApiError, CheckError, Result};

/// Store for one named check run in one repository.
pub struct CheckRunStore {
    api: Arc<dyn ChecksApi>,
    repo: RepoRef,
    name: String,
    title: String,
    span: Span,
}

impl CheckRunStore {
    /// `name` identifies the check on each commit; `title` heads its output.
    pub fn new(api: Arc<dyn ChecksApi>, repo: RepoRef, name: &str, title: &str) -> Self {
        let span = tracing::debug_span!("prverify.store", check = %name, repo = %repo);
        CheckRunStore {
            api,
            repo,
            name: name.to_string(),
            title: title.to_string(),
            span,
        }
    }

    /// Log under `span` instead of the store's own.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    fn remote_error(
        &self,
        operation: &'static str,
        sha: &str,
        source: ApiError,
        last_known: Option<&CheckRun>,
    ) -> CheckError {
        CheckError::RemoteApi {
            operation,
            name: self.name.clone(),
            owner: self.repo.owner.clone(),
            repo: self.repo.repo.clone(),
            sha: sha.to_string(),
            source,
            last_known: last_known.map(|run| Box::new(run.clone())),
        }
    }

    /// Create a new, in-progress run on `sha`.
    pub async fn create(&self, sha: &str) -> Result<CheckRun> {
        debug!(parent: &self.span, sha = %sha, "creating check run");

        let run = self
            .api
            .create_check_run(&self.repo, NewCheckRun::started(&self.name, sha, Utc::now()))
            .await
            .map_err(|e| self.remote_error("create", sha, e, None))?;

        debug!(parent: &self.span, id = run.id, status = %run.status, "created check run");
        Ok(run)
    }

    /// Return the run on `sha`, creating it when there is none.
    pub async fn get_or_create(&self, sha: &str) -> Result<CheckRun> {
        debug!(parent: &self.span, sha = %sha, "getting check run");

        let list = self
            .api
            .list_check_runs_for_ref(&self.repo, sha, &self.name)
            .await
            .map_err(|e| self.remote_error("list", sha, e, None))?;

        debug!(parent: &self.span, total = list.total_count, "listed check runs");

        match (list.total_count, list.check_runs.into_iter().next()) {
            (0, _) => self.create(sha).await,
            (1, Some(run)) => Ok(run),
            (1, None) => Err(self.remote_error(
                "list",
                sha,
                ApiError::Decode("total_count is 1 but no check run was returned".to_string()),
                None,
            )),
            (count, _) => Err(CheckError::AmbiguousCheckRun {
                name: self.name.clone(),
                owner: self.repo.owner.clone(),
                repo: self.repo.repo.clone(),
                sha: sha.to_string(),
                count,
            }),
        }
    }

    /// Return the run on `sha` with status in-progress, creating or resetting it.
    ///
    /// When the reset itself fails the error still carries the run as read.
    pub async fn reset_if_needed(&self, sha: &str) -> Result<CheckRun> {
        let run = self.get_or_create(sha).await?;
        if run.status == CheckStatus::InProgress {
            return Ok(run);
        }

        debug!(parent: &self.span, id = run.id, status = %run.status, "resetting check run");

        let update = CheckRunUpdate {
            name: Some(self.name.clone()),
            status: Some(CheckStatus::InProgress),
            ..Default::default()
        };
        let reset = self
            .api
            .update_check_run(&self.repo, run.id, update)
            .await
            .map_err(|e| self.remote_error("reset", sha, e, Some(&run)))?;

        debug!(parent: &self.span, id = reset.id, status = %reset.status, "reset check run");
        Ok(reset)
    }

    /// Complete `run` with a conclusion and output.
    ///
    /// On failure the error carries `run` as the best-effort state.
    pub async fn finish(
        &self,
        run: &CheckRun,
        conclusion: CheckConclusion,
        summary: &str,
        text: &str,
    ) -> Result<CheckRun> {
        debug!(parent: &self.span, id = run.id, conclusion = %conclusion, "finishing check run");

        let update = CheckRunUpdate {
            name: Some(self.name.clone()),
            status: Some(CheckStatus::Completed),
            conclusion: Some(conclusion),
            completed_at: Some(Utc::now()),
            output: Some(CheckOutput {
                title: Some(self.title.clone()),
                summary: Some(summary.to_string()),
                text: Some(text.to_string()),
            }),
        };
        let finished = self
            .api
            .update_check_run(&self.repo, run.id, update)
            .await
            .map_err(|e| self.remote_error("update with results", &run.head_sha, e, Some(run)))?;

        debug!(parent: &self.span, id = finished.id, status = %finished.status, "finished check run");
        Ok(finished)
    }

    /// Create a copy of `source` on `new_sha`, keeping per-commit history intact.
    pub async fn duplicate(&self, source: &CheckRun, new_sha: &str) -> Result<CheckRun> {
        debug!(
            parent: &self.span,
            source_id = source.id,
            from = %source.head_sha,
            to = %new_sha,
            "duplicating check run"
        );

        let run = self
            .api
            .create_check_run(&self.repo, NewCheckRun::copy_of(source, new_sha))
            .await
            .map_err(|e| self.remote_error("create duplicate", new_sha, e, None))?;

        debug!(parent: &self.span, id = run.id, status = %run.status, "duplicated check run");
        Ok(run)
    }
}
