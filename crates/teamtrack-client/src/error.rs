// Error taxonomy for backend calls and game mutations.
//
// Every variant can be turned into a display string with `user_message()`;
// the controller does that at the view boundary so nothing here is fatal.

use teamtrack_core::ValidationError;
use thiserror::Error;

/// Failure of a single request to the backend collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// 422: the backend refused the payload (e.g. malformed score).
    #[error("request rejected as invalid: {0}")]
    Validation(String),

    #[error("not found")]
    NotFound,

    /// The endpoint does not exist on this backend.
    #[error("operation not supported by the backend")]
    Unsupported,

    #[error("backend returned {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn is_network(&self) -> bool {
        matches!(self, BackendError::Network(_))
    }

    pub fn user_message(&self) -> String {
        match self {
            BackendError::Validation(msg) => msg.clone(),
            BackendError::NotFound => {
                "That item no longer exists. Reload to see the latest schedule.".into()
            }
            BackendError::Unsupported => "The server does not support this operation.".into(),
            BackendError::Rejected { status, message } if message.is_empty() => {
                format!("The server rejected the request ({status}).")
            }
            BackendError::Rejected { message, .. } => message.clone(),
            BackendError::Network(_) => {
                "Could not reach the TeamTrack server. Check your internet connection and try again."
                    .into()
            }
            BackendError::Decode(_) => "The server sent a response we could not read.".into(),
        }
    }
}

/// One member of a fanned-out operation that did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberFailure {
    /// Event id for edits and deletes, team id for creates.
    pub id: String,
    pub error: BackendError,
}

/// Failure of a game-level operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// Some or all member requests failed. Members listed in `succeeded` were
    /// changed on the backend and are not rolled back.
    #[error("{} of {} requests failed", .failed.len(), .failed.len() + .succeeded.len())]
    Group {
        succeeded: Vec<String>,
        failed: Vec<MemberFailure>,
    },
}

impl MutationError {
    pub fn user_message(&self) -> String {
        match self {
            MutationError::Invalid(e) => e.to_string(),
            MutationError::Group { succeeded, failed } => {
                let Some(first) = failed.first() else {
                    return "The request failed.".into();
                };
                // Prefer the network message when any member lost the connection.
                let cause = failed
                    .iter()
                    .find(|f| f.error.is_network())
                    .unwrap_or(first)
                    .error
                    .user_message();
                if succeeded.is_empty() {
                    cause
                } else {
                    format!(
                        "Only {} of {} records were updated; reload to check the game. {}",
                        succeeded.len(),
                        succeeded.len() + failed.len(),
                        cause
                    )
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_message_is_distinct_from_rejection() {
        let net = BackendError::Network("connection refused".into()).user_message();
        let rej = BackendError::Rejected {
            status: 500,
            message: String::new(),
        }
        .user_message();
        assert!(net.contains("internet connection"));
        assert_eq!(rej, "The server rejected the request (500).");
    }

    #[test]
    fn group_message_mentions_partial_success() {
        let err = MutationError::Group {
            succeeded: vec!["e1".into()],
            failed: vec![MemberFailure {
                id: "e2".into(),
                error: BackendError::Rejected {
                    status: 403,
                    message: "Not allowed".into(),
                },
            }],
        };
        assert_eq!(err.to_string(), "1 of 2 requests failed");
        let msg = err.user_message();
        assert!(msg.starts_with("Only 1 of 2 records were updated"));
        assert!(msg.ends_with("Not allowed"));
    }

    #[test]
    fn group_message_prefers_network_cause() {
        let err = MutationError::Group {
            succeeded: vec![],
            failed: vec![
                MemberFailure {
                    id: "e1".into(),
                    error: BackendError::Validation("bad score".into()),
                },
                MemberFailure {
                    id: "e2".into(),
                    error: BackendError::Network("timeout".into()),
                },
            ],
        };
        assert!(err.user_message().contains("Could not reach"));
    }

    #[test]
    fn validation_errors_pass_through() {
        let err: MutationError = ValidationError::IdenticalTeams.into();
        assert_eq!(err.user_message(), "a team cannot play against itself");
    }
}
