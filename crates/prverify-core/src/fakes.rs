//! In-memory fake for the Checks API (testing only)
//!
//! `MemoryChecksApi` behaves like the hosted API closely enough for the
//! store and dispatcher contracts: setting a conclusion completes a run,
//! listing filters by commit and name, ids are allocated sequentially.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::api::{ApiResult, ChecksApi};
use crate::check_run::{
    CheckOutput, CheckRun, CheckRunList, CheckRunUpdate, CheckStatus, NewCheckRun, RepoRef,
};
use crate::error::ApiError;

/// Remote operation, used to inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCall {
    Create,
    List,
    Update,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    runs: BTreeMap<u64, (RepoRef, CheckRun)>,
    creates: usize,
    lists: usize,
    updates: usize,
    fail_on: Option<ApiCall>,
}

/// In-memory Checks API backed by a `BTreeMap<id, run>`.
#[derive(Debug, Default)]
pub struct MemoryChecksApi {
    state: Mutex<State>,
}

impl MemoryChecksApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a run directly, bypassing the call counters. Returns its id.
    pub fn seed(&self, repo: &RepoRef, run: NewCheckRun) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.insert(repo, run).id
    }

    /// Make every subsequent call of this kind fail with a 503.
    pub fn fail_on(&self, call: ApiCall) {
        self.state.lock().unwrap().fail_on = Some(call);
    }

    /// Stop injecting failures.
    pub fn heal(&self) {
        self.state.lock().unwrap().fail_on = None;
    }

    /// All runs stored for a commit, in creation order.
    pub fn runs_for(&self, repo: &RepoRef, sha: &str) -> Vec<CheckRun> {
        let state = self.state.lock().unwrap();
        state
            .runs
            .values()
            .filter(|(r, run)| r == repo && run.head_sha == sha)
            .map(|(_, run)| run.clone())
            .collect()
    }

    /// Total number of runs stored.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().creates
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().lists
    }

    pub fn update_calls(&self) -> usize {
        self.state.lock().unwrap().updates
    }
}

impl State {
    fn check(&self, call: ApiCall) -> ApiResult<()> {
        if self.fail_on == Some(call) {
            return Err(ApiError::Status {
                status: 503,
                body: format!("injected failure on {:?}", call),
            });
        }
        Ok(())
    }

    fn insert(&mut self, repo: &RepoRef, run: NewCheckRun) -> CheckRun {
        self.next_id += 1;
        let stored = CheckRun {
            id: self.next_id,
            name: run.name,
            head_sha: run.head_sha,
            status: if run.conclusion.is_some() {
                CheckStatus::Completed
            } else {
                run.status
            },
            conclusion: run.conclusion,
            external_id: run.external_id,
            details_url: run.details_url,
            started_at: run.started_at.or_else(|| Some(Utc::now())),
            completed_at: run.completed_at,
            output: run.output.unwrap_or_default(),
        };
        self.runs.insert(stored.id, (repo.clone(), stored.clone()));
        stored
    }
}

#[async_trait]
impl ChecksApi for MemoryChecksApi {
    async fn create_check_run(&self, repo: &RepoRef, run: NewCheckRun) -> ApiResult<CheckRun> {
        let mut state = self.state.lock().unwrap();
        state.creates += 1;
        state.check(ApiCall::Create)?;
        Ok(state.insert(repo, run))
    }

    async fn list_check_runs_for_ref(
        &self,
        repo: &RepoRef,
        git_ref: &str,
        check_name: &str,
    ) -> ApiResult<CheckRunList> {
        let mut state = self.state.lock().unwrap();
        state.lists += 1;
        state.check(ApiCall::List)?;

        let check_runs: Vec<CheckRun> = state
            .runs
            .values()
            .filter(|(r, run)| r == repo && run.head_sha == git_ref && run.name == check_name)
            .map(|(_, run)| run.clone())
            .collect();
        Ok(CheckRunList {
            total_count: check_runs.len() as u64,
            check_runs,
        })
    }

    async fn update_check_run(
        &self,
        repo: &RepoRef,
        id: u64,
        update: CheckRunUpdate,
    ) -> ApiResult<CheckRun> {
        let mut state = self.state.lock().unwrap();
        state.updates += 1;
        state.check(ApiCall::Update)?;

        let (owner, run) = state
            .runs
            .get_mut(&id)
            .ok_or(ApiError::NotFound { id })?;
        if owner != repo {
            return Err(ApiError::NotFound { id });
        }

        if let Some(name) = update.name {
            run.name = name;
        }
        if let Some(status) = update.status {
            run.status = status;
            if status != CheckStatus::Completed {
                run.conclusion = None;
                run.completed_at = None;
            }
        }
        if let Some(conclusion) = update.conclusion {
            run.conclusion = Some(conclusion);
            run.status = CheckStatus::Completed;
        }
        if let Some(completed_at) = update.completed_at {
            run.completed_at = Some(completed_at);
        }
        if let Some(output) = update.output {
            let previous = std::mem::take(&mut run.output);
            run.output = CheckOutput {
                title: output.title.or(previous.title),
                summary: output.summary.or(previous.summary),
                text: output.text.or(previous.text),
            };
        }
        Ok(run.clone())
    }
}
