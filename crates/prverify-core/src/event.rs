//! Pull request lifecycle events.
//!
//! [`PrEvent::from_json`] decodes the GitHub `pull_request` webhook payload
//! (as delivered to Actions via `GITHUB_EVENT_PATH`) into the closed set of
//! actions the dispatcher understands.

use serde::{Deserialize, Serialize};

use crate::check_run::RepoRef;
use crate::error::EventError;

/// Snapshot of the pull request an event refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub head_sha: String,
}

/// What happened to the pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrAction {
    Opened,
    Reopened,
    Edited,
    /// New commits were pushed: the head moved from `before` to `after`.
    Synchronize { before: String, after: String },
    /// Any action this crate does not act on.
    Other(String),
}

impl PrAction {
    pub fn as_str(&self) -> &str {
        match self {
            PrAction::Opened => "opened",
            PrAction::Reopened => "reopened",
            PrAction::Edited => "edited",
            PrAction::Synchronize { .. } => "synchronize",
            PrAction::Other(action) => action.as_str(),
        }
    }
}

/// One inbound pull request event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrEvent {
    pub action: PrAction,
    pub pull_request: PullRequest,
    /// Repository named in the payload, if any.
    pub repository: Option<RepoRef>,
}

#[derive(Deserialize)]
struct Payload {
    action: String,
    pull_request: Option<PayloadPullRequest>,
    before: Option<String>,
    after: Option<String>,
    repository: Option<PayloadRepository>,
}

#[derive(Deserialize)]
struct PayloadPullRequest {
    number: u64,
    #[serde(default)]
    title: String,
    head: PayloadHead,
}

#[derive(Deserialize)]
struct PayloadHead {
    sha: String,
}

#[derive(Deserialize)]
struct PayloadRepository {
    name: String,
    owner: PayloadOwner,
}

#[derive(Deserialize)]
struct PayloadOwner {
    login: String,
}

impl PrEvent {
    /// Decode a webhook payload.
    pub fn from_json(payload: &[u8]) -> Result<Self, EventError> {
        let payload: Payload = serde_json::from_slice(payload)?;
        Self::from_payload(payload)
    }

    fn from_payload(payload: Payload) -> Result<Self, EventError> {
        let pr = payload
            .pull_request
            .ok_or(EventError::MissingPullRequest)?;

        let action = match payload.action.as_str() {
            "opened" | "open" => PrAction::Opened,
            "reopened" | "reopen" => PrAction::Reopened,
            "edited" | "edit" => PrAction::Edited,
            "synchronize" => PrAction::Synchronize {
                before: payload.before.ok_or(EventError::MissingSha("before"))?,
                after: payload.after.ok_or(EventError::MissingSha("after"))?,
            },
            other => PrAction::Other(other.to_string()),
        };

        Ok(PrEvent {
            action,
            pull_request: PullRequest {
                number: pr.number,
                title: pr.title,
                head_sha: pr.head.sha,
            },
            repository: payload
                .repository
                .map(|r| RepoRef::new(r.owner.login, r.name)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_decode_opened() {
        let event = PrEvent::from_json(&payload(json!({
            "action": "opened",
            "number": 7,
            "pull_request": {
                "number": 7,
                "title": "✨ Add widgets",
                "head": { "sha": "abc", "ref": "feature" }
            },
            "repository": { "name": "widgets", "owner": { "login": "octo" } }
        })))
        .unwrap();

        assert_eq!(event.action, PrAction::Opened);
        assert_eq!(event.pull_request.title, "✨ Add widgets");
        assert_eq!(event.pull_request.head_sha, "abc");
        assert_eq!(event.repository, Some(RepoRef::new("octo", "widgets")));
    }

    #[test]
    fn test_decode_short_action_aliases() {
        for (wire, expected) in [
            ("open", PrAction::Opened),
            ("reopen", PrAction::Reopened),
            ("edit", PrAction::Edited),
        ] {
            let event = PrEvent::from_json(&payload(json!({
                "action": wire,
                "pull_request": { "number": 1, "title": "t", "head": { "sha": "s" } }
            })))
            .unwrap();
            assert_eq!(event.action, expected);
        }
    }

    #[test]
    fn test_decode_synchronize() {
        let event = PrEvent::from_json(&payload(json!({
            "action": "synchronize",
            "before": "old",
            "after": "new",
            "pull_request": { "number": 1, "title": "t", "head": { "sha": "new" } }
        })))
        .unwrap();

        assert_eq!(
            event.action,
            PrAction::Synchronize {
                before: "old".to_string(),
                after: "new".to_string()
            }
        );
    }

    #[test]
    fn test_synchronize_without_before_fails() {
        let err = PrEvent::from_json(&payload(json!({
            "action": "synchronize",
            "after": "new",
            "pull_request": { "number": 1, "title": "t", "head": { "sha": "new" } }
        })))
        .unwrap_err();

        assert!(matches!(err, EventError::MissingSha("before")));
    }

    #[test]
    fn test_unknown_action_is_other() {
        let event = PrEvent::from_json(&payload(json!({
            "action": "labeled",
            "pull_request": { "number": 1, "title": "t", "head": { "sha": "s" } }
        })))
        .unwrap();

        assert_eq!(event.action, PrAction::Other("labeled".to_string()));
        assert_eq!(event.action.as_str(), "labeled");
    }

    #[test]
    fn test_missing_pull_request() {
        let err = PrEvent::from_json(&payload(json!({ "action": "opened" }))).unwrap_err();
        assert!(matches!(err, EventError::MissingPullRequest));
    }

    #[test]
    fn test_invalid_json() {
        let err = PrEvent::from_json(b"not json").unwrap_err();
        assert!(matches!(err, EventError::Json(_)));
    }
}
