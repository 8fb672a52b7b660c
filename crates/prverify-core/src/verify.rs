//! Verification plugins and the runner that turns their result into a
//! check-run conclusion.
//!
//! A plugin is anything implementing [`Verifier`], including a plain
//! `Fn(&PullRequest) -> Result<String, VerifyError>`. It knows nothing about
//! check runs: success returns a human-readable confirmation, failure returns
//! a [`VerifyError`] which may carry longer remediation help.

use tracing::{debug, Span};

use crate::check_run::CheckConclusion;
use crate::event::PullRequest;

/// Summary recorded for a passing verification.
pub const SUCCESS_SUMMARY: &str = "Success";

/// A pull request failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyError {
    message: String,
    help: Option<String>,
}

impl VerifyError {
    pub fn new(message: impl Into<String>) -> Self {
        VerifyError {
            message: message.into(),
            help: None,
        }
    }

    /// Attach extended remediation text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Short, one-line description.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Extended remediation text, when the failure carries any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }
}

impl std::fmt::Display for VerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for VerifyError {}

/// An error type that can explain how to fix itself.
pub trait HelpfulError: std::error::Error {
    fn help(&self) -> String;
}

impl<E: HelpfulError> From<E> for VerifyError {
    fn from(err: E) -> Self {
        VerifyError::new(err.to_string()).with_help(err.help())
    }
}

/// A verification check run against a pull request.
pub trait Verifier: Send + Sync {
    fn verify(&self, pr: &PullRequest) -> Result<String, VerifyError>;
}

impl<F> Verifier for F
where
    F: Fn(&PullRequest) -> Result<String, VerifyError> + Send + Sync,
{
    fn verify(&self, pr: &PullRequest) -> Result<String, VerifyError> {
        self(pr)
    }
}

/// Result of one verification, ready to be written to a check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub conclusion: CheckConclusion,
    pub summary: String,
    pub text: String,
    pub error: Option<VerifyError>,
}

impl VerificationOutcome {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs a [`Verifier`] and normalises its result.
#[derive(Debug, Clone)]
pub struct VerificationRunner {
    span: Span,
}

impl Default for VerificationRunner {
    fn default() -> Self {
        VerificationRunner {
            span: Span::current(),
        }
    }
}

impl VerificationRunner {
    /// Runner that logs under `span`.
    pub fn new(span: Span) -> Self {
        VerificationRunner { span }
    }

    /// Verify `pr`.
    ///
    /// - success: conclusion `success`, summary [`SUCCESS_SUMMARY`], the
    ///   verifier's text.
    /// - failure: conclusion `failure`, summary and text are the error
    ///   message, except that help text replaces the text when present.
    ///
    /// The outcome is logged before returning so it can be reconstructed even
    /// if submitting it fails afterwards.
    pub fn run(&self, verifier: &dyn Verifier, pr: &PullRequest) -> VerificationOutcome {
        let outcome = match verifier.verify(pr) {
            Ok(text) => VerificationOutcome {
                conclusion: CheckConclusion::Success,
                summary: SUCCESS_SUMMARY.to_string(),
                text,
                error: None,
            },
            Err(err) => VerificationOutcome {
                conclusion: CheckConclusion::Failure,
                summary: err.message().to_string(),
                text: err.help().unwrap_or(err.message()).to_string(),
                error: Some(err),
            },
        };

        debug!(parent: &self.span, conclusion = %outcome.conclusion, "plugin conclusion");
        debug!(parent: &self.span, summary = ?outcome.summary, "plugin result summary");
        debug!(parent: &self.span, text = ?outcome.text, "plugin result details");

        outcome
    }
}
