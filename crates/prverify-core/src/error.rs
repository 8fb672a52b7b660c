//! Error types for prverify-core

use thiserror::Error;

use crate::check_run::CheckRun;

/// Errors returned by a [`ChecksApi`](crate::api::ChecksApi) backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Request could not be sent or the connection failed
    #[error("HTTP error: {0}")]
    Http(String),

    /// The API answered with a non-success status
    #[error("API returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// Response body did not match the expected shape
    #[error("Malformed API response: {0}")]
    Decode(String),

    /// No check run with the given id exists
    #[error("Check run not found: {id}")]
    NotFound { id: u64 },
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Http(err.to_string())
        }
    }
}

/// Errors surfaced by the check-run store and the event dispatcher.
#[derive(Error, Debug)]
pub enum CheckError {
    /// A call to the remote Checks API failed.
    ///
    /// `last_known` holds the run as it was last observed, when the failing
    /// call happened after the run had already been read.
    #[error("unable to {operation} check run `{name}` on {owner}/{repo} @ {sha}: {source}")]
    RemoteApi {
        operation: &'static str,
        name: String,
        owner: String,
        repo: String,
        sha: String,
        #[source]
        source: ApiError,
        last_known: Option<Box<CheckRun>>,
    },

    /// More than one run with the same name exists on a commit.
    #[error("multiple instances ({count}) of `{name}` check run found on {owner}/{repo} @ {sha}")]
    AmbiguousCheckRun {
        name: String,
        owner: String,
        repo: String,
        sha: String,
        count: u64,
    },

    /// The run concluded with a failure. Returned so the surrounding job fails too.
    #[error("failed: {0}")]
    Failed(String),
}

impl CheckError {
    /// Best-effort state of the run when a remote call failed midway.
    pub fn last_known(&self) -> Option<&CheckRun> {
        match self {
            CheckError::RemoteApi { last_known, .. } => last_known.as_deref(),
            _ => None,
        }
    }

    /// Whether this error is the propagated verification failure rather than a fault.
    pub fn is_failed_check(&self) -> bool {
        matches!(self, CheckError::Failed(_))
    }
}

/// Result type for store and dispatcher operations
pub type Result<T> = std::result::Result<T, CheckError>;

/// Errors decoding an inbound pull request event.
#[derive(Error, Debug)]
pub enum EventError {
    /// Payload is not valid JSON or has the wrong shape
    #[error("invalid event payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload carries no `pull_request` object
    #[error("event payload has no pull_request")]
    MissingPullRequest,

    /// A synchronize event without both commit SHAs
    #[error("synchronize event is missing `{0}`")]
    MissingSha(&'static str),
}
