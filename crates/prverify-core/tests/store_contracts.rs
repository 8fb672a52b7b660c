//! Contract tests for CheckRunStore.
//!
//! Run against the in-memory Checks API fake; any conforming backend must
//! behave the same way.

use std::sync::Arc;

use chrono::Utc;
use prverify_core::fakes::{ApiCall, MemoryChecksApi};
use prverify_core::{
    CheckConclusion, CheckError, CheckOutput, CheckRunStore, CheckStatus, NewCheckRun, RepoRef,
};

const NAME: &str = "PR Title Verifier";
const SHA: &str = "1111111111111111111111111111111111111111";
const NEW_SHA: &str = "2222222222222222222222222222222222222222";

fn repo() -> RepoRef {
    RepoRef::new("octo", "widgets")
}

fn setup() -> (Arc<MemoryChecksApi>, CheckRunStore) {
    let api = Arc::new(MemoryChecksApi::new());
    let store = CheckRunStore::new(api.clone(), repo(), NAME, "Verify PR title");
    (api, store)
}

fn completed(sha: &str, conclusion: CheckConclusion, summary: &str) -> NewCheckRun {
    let mut run = NewCheckRun::started(NAME, sha, Utc::now());
    run.status = CheckStatus::Completed;
    run.conclusion = Some(conclusion);
    run.completed_at = Some(Utc::now());
    run.output = Some(CheckOutput {
        title: Some("Verify PR title".to_string()),
        summary: Some(summary.to_string()),
        text: Some(summary.to_string()),
    });
    run
}

// ===========================================================================
// get_or_create
// ===========================================================================

#[tokio::test]
async fn get_or_create_creates_when_missing() {
    let (api, store) = setup();

    let run = store.get_or_create(SHA).await.unwrap();

    assert_eq!(api.create_calls(), 1);
    assert_eq!(api.runs_for(&repo(), SHA), vec![run.clone()]);
    assert_eq!(run.status, CheckStatus::InProgress);
}

#[tokio::test]
async fn get_or_create_is_idempotent() {
    let (api, store) = setup();

    let first = store.get_or_create(SHA).await.unwrap();
    let second = store.get_or_create(SHA).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(api.create_calls(), 1);
    assert_eq!(api.runs_for(&repo(), SHA).len(), 1);
}

#[tokio::test]
async fn get_or_create_returns_existing_run() {
    let (api, store) = setup();
    let id = api.seed(&repo(), completed(SHA, CheckConclusion::Success, "Success"));

    let run = store.get_or_create(SHA).await.unwrap();

    assert_eq!(run.id, id);
    assert!(run.is_completed());
    assert_eq!(api.create_calls(), 0);
}

#[tokio::test]
async fn get_or_create_ignores_other_check_names() {
    let (api, store) = setup();
    api.seed(&repo(), NewCheckRun::started("some other check", SHA, Utc::now()));

    store.get_or_create(SHA).await.unwrap();

    assert_eq!(api.create_calls(), 1);
    assert_eq!(api.runs_for(&repo(), SHA).len(), 2);
}

#[tokio::test]
async fn get_or_create_rejects_ambiguous_matches() {
    let (api, store) = setup();
    api.seed(&repo(), NewCheckRun::started(NAME, SHA, Utc::now()));
    api.seed(&repo(), NewCheckRun::started(NAME, SHA, Utc::now()));

    let err = store.get_or_create(SHA).await.unwrap_err();

    assert!(matches!(err, CheckError::AmbiguousCheckRun { count: 2, .. }));
    assert!(err.to_string().contains("multiple instances"));
    assert_eq!(api.create_calls(), 0);
    assert_eq!(api.len(), 2);
}

#[tokio::test]
async fn get_or_create_list_failure_creates_nothing() {
    let (api, store) = setup();
    api.fail_on(ApiCall::List);

    let err = store.get_or_create(SHA).await.unwrap_err();

    assert!(matches!(err, CheckError::RemoteApi { operation: "list", .. }));
    assert_eq!(api.create_calls(), 0);
}

// ===========================================================================
// reset_if_needed
// ===========================================================================

#[tokio::test]
async fn reset_skips_update_for_fresh_run() {
    let (api, store) = setup();

    let run = store.reset_if_needed(SHA).await.unwrap();

    assert_eq!(run.status, CheckStatus::InProgress);
    assert_eq!(api.update_calls(), 0);
}

#[tokio::test]
async fn reset_moves_completed_run_back_to_in_progress() {
    let (api, store) = setup();
    let id = api.seed(&repo(), completed(SHA, CheckConclusion::Failure, "bad"));

    let run = store.reset_if_needed(SHA).await.unwrap();

    assert_eq!(run.id, id);
    assert_eq!(run.status, CheckStatus::InProgress);
    assert_eq!(run.conclusion, None);
    assert_eq!(api.update_calls(), 1);
}

#[tokio::test]
async fn reset_failure_returns_run_as_read() {
    let (api, store) = setup();
    let id = api.seed(&repo(), completed(SHA, CheckConclusion::Failure, "bad"));
    api.fail_on(ApiCall::Update);

    let err = store.reset_if_needed(SHA).await.unwrap_err();

    assert!(matches!(err, CheckError::RemoteApi { operation: "reset", .. }));
    let last_known = err.last_known().unwrap();
    assert_eq!(last_known.id, id);
    assert!(last_known.is_failure());
}

// ===========================================================================
// finish / duplicate
// ===========================================================================

#[tokio::test]
async fn finish_completes_with_output() {
    let (api, store) = setup();
    let run = store.create(SHA).await.unwrap();

    store
        .finish(&run, CheckConclusion::Failure, "bad title", "long help")
        .await
        .unwrap();

    let stored = api.runs_for(&repo(), SHA).remove(0);
    assert!(stored.is_failure());
    assert_eq!(stored.summary(), "bad title");
    assert_eq!(stored.output.text.as_deref(), Some("long help"));
    assert!(stored.completed_at.is_some());
}

#[tokio::test]
async fn duplicate_copies_onto_new_sha() {
    let (api, store) = setup();
    api.seed(&repo(), completed(SHA, CheckConclusion::Success, "Success"));
    let source = store.get_or_create(SHA).await.unwrap();

    let copy = store.duplicate(&source, NEW_SHA).await.unwrap();

    assert_ne!(copy.id, source.id);
    assert_eq!(copy.head_sha, NEW_SHA);
    assert_eq!(copy.name, source.name);
    assert_eq!(copy.status, source.status);
    assert_eq!(copy.conclusion, source.conclusion);
    assert_eq!(copy.output, source.output);
    assert_eq!(copy.completed_at, source.completed_at);

    // the source is left alone
    assert_eq!(api.runs_for(&repo(), SHA), vec![source]);
    assert_eq!(api.runs_for(&repo(), NEW_SHA), vec![copy]);
}

#[tokio::test]
async fn duplicate_failure_is_remote_error() {
    let (api, store) = setup();
    let source = store.create(SHA).await.unwrap();
    api.fail_on(ApiCall::Create);

    let err = store.duplicate(&source, NEW_SHA).await.unwrap_err();

    assert!(matches!(
        err,
        CheckError::RemoteApi { operation: "create duplicate", .. }
    ));
    assert!(api.runs_for(&repo(), NEW_SHA).is_empty());
}
