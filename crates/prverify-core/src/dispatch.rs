//! Event dispatcher: maps pull request actions onto check-run transitions.
//!
//! Per commit lineage a run moves `none -> in_progress -> completed`. A push
//! (synchronize) leaves the old commit's run untouched and copies it onto the
//! new head commit.
//!
//! | action      | transition                                                   |
//! |-------------|--------------------------------------------------------------|
//! | opened      | create run, verify, finish                                   |
//! | reopened    | get-or-create; verify+finish unless completed; a completed failure is reported again |
//! | edited      | get-or-create and reset to in-progress, verify, finish       |
//! | synchronize | get-or-create on `before`, verify+finish unless completed, duplicate onto `after` |
//! | other       | nothing                                                      |
//!
//! Whenever a transition ends on (or finds) a failed run, [`CheckError::Failed`]
//! is returned as well: the surrounding workflow job does not fail on a failed
//! check run alone.

use std::sync::Arc;

use tracing::{debug, info, warn, Span};

use crate::api::ChecksApi;
use crate::check_run::{CheckRun, RepoRef};
use crate::error::{CheckError, Result};
use crate::event::{PrAction, PrEvent, PullRequest};
use crate::store::CheckRunStore;
use crate::verify::{VerificationOutcome, VerificationRunner, Verifier};

/// One named check backed by one verifier.
pub struct PrPlugin {
    name: String,
    verifier: Arc<dyn Verifier>,
    store: CheckRunStore,
    runner: VerificationRunner,
    span: Span,
}

impl PrPlugin {
    /// Build a plugin whose check is called `name` and whose output is headed `title`.
    pub fn new(
        api: Arc<dyn ChecksApi>,
        repo: RepoRef,
        name: &str,
        title: &str,
        verifier: Arc<dyn Verifier>,
    ) -> Self {
        let span = tracing::info_span!("prverify.plugin", plugin = %name, repo = %repo);
        PrPlugin {
            name: name.to_string(),
            verifier,
            store: CheckRunStore::new(api, repo, name, title).with_span(span.clone()),
            runner: VerificationRunner::new(span.clone()),
            span,
        }
    }

    /// Log under `span` instead of the plugin's own.
    pub fn with_span(mut self, span: Span) -> Self {
        self.store = self.store.with_span(span.clone());
        self.runner = VerificationRunner::new(span.clone());
        self.span = span;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &CheckRunStore {
        &self.store
    }

    /// Handle one event.
    pub async fn handle(&self, event: &PrEvent) -> Result<()> {
        info!(
            parent: &self.span,
            action = %event.action.as_str(),
            pr = event.pull_request.number,
            "handling pull request event"
        );

        let pr = &event.pull_request;
        match &event.action {
            PrAction::Opened => self.on_open(pr).await,
            PrAction::Reopened => self.on_reopen(pr).await,
            PrAction::Edited => self.on_edit(pr).await,
            PrAction::Synchronize { before, after } => self.on_sync(pr, before, after).await,
            PrAction::Other(action) => {
                debug!(parent: &self.span, action = %action, "ignoring action");
                Ok(())
            }
        }
    }

    async fn on_open(&self, pr: &PullRequest) -> Result<()> {
        let run = self.store.create(&pr.head_sha).await?;
        let (_, outcome) = self.process_and_submit(pr, &run).await?;
        failure_of(&outcome)
    }

    async fn on_reopen(&self, pr: &PullRequest) -> Result<()> {
        let run = self.store.get_or_create(&pr.head_sha).await?;

        if !run.is_completed() {
            let (_, outcome) = self.process_and_submit(pr, &run).await?;
            return failure_of(&outcome);
        }

        debug!(parent: &self.span, id = run.id, "check run already completed");
        reported_failure(&run)
    }

    async fn on_edit(&self, pr: &PullRequest) -> Result<()> {
        let run = self.store.reset_if_needed(&pr.head_sha).await?;
        let (_, outcome) = self.process_and_submit(pr, &run).await?;
        failure_of(&outcome)
    }

    async fn on_sync(&self, pr: &PullRequest, before: &str, after: &str) -> Result<()> {
        let mut run = self.store.get_or_create(before).await?;

        if !run.is_completed() {
            let (finished, _) = self.process_and_submit(pr, &run).await?;
            run = finished;
        }

        let duplicate = self.store.duplicate(&run, after).await?;
        reported_failure(&duplicate)
    }

    /// Verify `pr` and record the outcome on `run`.
    async fn process_and_submit(
        &self,
        pr: &PullRequest,
        run: &CheckRun,
    ) -> Result<(CheckRun, VerificationOutcome)> {
        let outcome = self.runner.run(self.verifier.as_ref(), pr);
        let finished = self
            .store
            .finish(run, outcome.conclusion, &outcome.summary, &outcome.text)
            .await?;

        if !outcome.passed() {
            warn!(parent: &self.span, id = finished.id, summary = %outcome.summary, "check failed");
        }
        Ok((finished, outcome))
    }
}

fn failure_of(outcome: &VerificationOutcome) -> Result<()> {
    match &outcome.error {
        Some(err) => Err(CheckError::Failed(err.to_string())),
        None => Ok(()),
    }
}

fn reported_failure(run: &CheckRun) -> Result<()> {
    if run.is_failure() {
        return Err(CheckError::Failed(run.summary().to_string()));
    }
    Ok(())
}
