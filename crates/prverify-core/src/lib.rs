//! prverify - check runs for pull request verification
//!
//! Keeps one named GitHub check run per commit in step with a pull request's
//! lifecycle and fills it with the result of a pluggable verification:
//! - `store`: idempotent create / get / reset / finish / duplicate of a run
//! - `verify`: runs a verifier and turns its result into a conclusion
//! - `dispatch`: picks the transition for each pull request action
//! - `title`: the PR-title verifier

pub mod api;
pub mod check_run;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod fakes;
pub mod github;
pub mod store;
pub mod telemetry;
pub mod title;
pub mod verify;

pub use api::{ApiResult, ChecksApi};
pub use check_run::{
    CheckConclusion, CheckOutput, CheckRun, CheckRunList, CheckRunUpdate, CheckStatus,
    NewCheckRun, RepoRef,
};
pub use dispatch::PrPlugin;
pub use error::{ApiError, CheckError, EventError, Result};
pub use event::{PrAction, PrEvent, PullRequest};
pub use github::{GitHubChecksClient, GitHubConfig, DEFAULT_API_URL};
pub use store::CheckRunStore;
pub use telemetry::init_tracing;
pub use title::{classify, verify_pr_title, PrType, TitleTypeError};
pub use verify::{
    HelpfulError, VerificationOutcome, VerificationRunner, Verifier, VerifyError, SUCCESS_SUMMARY,
};
