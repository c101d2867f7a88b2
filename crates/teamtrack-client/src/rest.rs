// JSON-over-HTTP implementation of the collaborator traits.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use teamtrack_core::tournament::TournamentSummary;
use teamtrack_core::{EventRecord, EventUpdate, NewEvent, Team};
use tracing::{debug, warn};

use crate::backend::{EventBackend, TeamLookup};
use crate::config::Config;
use crate::error::BackendError;

/// HTTP client for the TeamTrack REST API.
pub struct RestBackend {
    http: reqwest::Client,
    base_url: Url,
    id_token: Option<String>,
}

impl RestBackend {
    pub fn new(
        base_url: &str,
        id_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Network(format!("failed to build HTTP client: {e}")))?;
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| BackendError::Network(format!("invalid base URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::Network(format!(
                "invalid base URL {base_url}: not a hierarchical URL"
            )));
        }
        Ok(Self {
            http,
            base_url,
            id_token: id_token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        Self::new(
            &config.backend.base_url,
            config.credentials.id_token.clone(),
            Duration::from_secs(config.backend.timeout_secs),
        )
    }

    /// Append `segments` to the base path. Each segment is percent-encoded,
    /// so ids containing `/`, `?` or `#` stay inside their own segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let rb = self.http.request(method, self.url(segments));
        match &self.id_token {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    async fn send(&self, rb: RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let resp = rb.send().await.map_err(transport_error)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        debug!(%status, body = %body, "backend request failed");
        Err(classify(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, rb: RequestBuilder) -> Result<T, BackendError> {
        let resp = self.send(rb).await?;
        resp.json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

/// List endpoints may answer with a bare array or `{ "events": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum EventList {
    Bare(Vec<EventRecord>),
    Wrapped { events: Vec<EventRecord> },
}

impl EventList {
    fn into_vec(self) -> Vec<EventRecord> {
        match self {
            EventList::Bare(v) | EventList::Wrapped { events: v } => v,
        }
    }
}

#[async_trait]
impl EventBackend for RestBackend {
    async fn create_event(&self, event: &NewEvent) -> Result<EventRecord, BackendError> {
        self.send_json(self.request(Method::POST, &["events"]).json(event))
            .await
    }

    async fn list_team_events(&self, team_id: &str) -> Result<Vec<EventRecord>, BackendError> {
        let list: EventList = self
            .send_json(self.request(Method::GET, &["teams", team_id, "events"]))
            .await?;
        Ok(list.into_vec())
    }

    async fn list_tournament_events(
        &self,
        tournament_id: &str,
    ) -> Result<Vec<EventRecord>, BackendError> {
        let result: Result<EventList, _> = self
            .send_json(self.request(Method::GET, &["tournaments", tournament_id, "events"]))
            .await;
        match result {
            Ok(list) => Ok(list.into_vec()),
            Err(BackendError::NotFound)
            | Err(BackendError::Rejected {
                status: 405 | 501, ..
            }) => Err(BackendError::Unsupported),
            Err(e) => Err(e),
        }
    }

    async fn update_event(
        &self,
        event_id: &str,
        update: &EventUpdate,
    ) -> Result<EventRecord, BackendError> {
        self.send_json(
            self.request(Method::PATCH, &["events", event_id])
                .json(update),
        )
        .await
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), BackendError> {
        self.send(self.request(Method::DELETE, &["events", event_id]))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TeamLookup for RestBackend {
    async fn get_team(&self, team_id: &str) -> Result<Team, BackendError> {
        self.send_json(self.request(Method::GET, &["teams", team_id]))
            .await
    }

    async fn get_tournament(
        &self,
        tournament_id: &str,
    ) -> Result<TournamentSummary, BackendError> {
        self.send_json(self.request(Method::GET, &["tournaments", tournament_id]))
            .await
    }
}

// ---------------------------------------------------------------------------
// Response classification
// ---------------------------------------------------------------------------

/// Map a non-success status and its body to a `BackendError`.
pub(crate) fn classify(status: StatusCode, body: &str) -> BackendError {
    let message = error_message(body).unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => BackendError::NotFound,
        StatusCode::UNPROCESSABLE_ENTITY => BackendError::Validation(if message.is_empty() {
            "The server rejected the submitted values.".to_string()
        } else {
            message
        }),
        _ => BackendError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

/// Pull a human-readable message out of an error body.
///
/// Accepted shapes: `{"error": "..."}`, `{"error": {"message": "..."}}`,
/// `{"message": "..."}`, `{"detail": "..."}`.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    let candidates = [
        v.get("error").and_then(Value::as_str),
        v.get("error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str),
        v.get("message").and_then(Value::as_str),
        v.get("detail").and_then(Value::as_str),
    ];
    let found = candidates
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .map(str::to_string);
    found
}

fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_decode() {
        return BackendError::Decode(err.to_string());
    }
    if !(err.is_timeout() || err.is_connect()) {
        warn!(error = %err, "unexpected transport error");
    }
    BackendError::Network(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_maps_status_codes() {
        assert_eq!(classify(StatusCode::NOT_FOUND, ""), BackendError::NotFound);
        assert_eq!(
            classify(StatusCode::UNPROCESSABLE_ENTITY, r#"{"error":"Invalid score"}"#),
            BackendError::Validation("Invalid score".into())
        );
        assert_eq!(
            classify(StatusCode::FORBIDDEN, r#"{"message":"Not your team"}"#),
            BackendError::Rejected {
                status: 403,
                message: "Not your team".into()
            }
        );
        assert_eq!(
            classify(StatusCode::BAD_GATEWAY, "<html>oops</html>"),
            BackendError::Rejected {
                status: 502,
                message: String::new()
            }
        );
    }

    #[test]
    fn classify_422_without_body_has_generic_message() {
        match classify(StatusCode::UNPROCESSABLE_ENTITY, "") {
            BackendError::Validation(msg) => assert!(!msg.is_empty()),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn error_message_shapes() {
        assert_eq!(
            error_message(r#"{"error":{"message":"nested"}}"#).as_deref(),
            Some("nested")
        );
        assert_eq!(
            error_message(r#"{"detail":"from detail"}"#).as_deref(),
            Some("from detail")
        );
        assert_eq!(
            error_message(r#"{"error":"","message":"fallback"}"#).as_deref(),
            Some("fallback")
        );
        assert_eq!(error_message(r#"{"error":""}"#), None);
        assert_eq!(error_message("not json"), None);
    }

    #[test]
    fn event_list_accepts_bare_and_wrapped() {
        let record = r#"{"id":"1","teamId":"a","name":"x","date":"2024-01-01","startTime":"10:00","lengthMinutes":60}"#;
        let bare: EventList = serde_json::from_str(&format!("[{record}]")).unwrap();
        let wrapped: EventList =
            serde_json::from_str(&format!(r#"{{"events":[{record}]}}"#)).unwrap();
        assert_eq!(bare.into_vec().len(), 1);
        assert_eq!(wrapped.into_vec()[0].team_id, "a");
    }

    #[test]
    fn urls_join_cleanly() {
        let backend =
            RestBackend::new("http://localhost:8080/api/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(
            backend.url(&["teams", "a", "events"]).as_str(),
            "http://localhost:8080/api/teams/a/events"
        );
        assert_eq!(
            backend.url(&["events"]).as_str(),
            "http://localhost:8080/api/events"
        );

        let bare = RestBackend::new("http://x", None, Duration::from_secs(5)).unwrap();
        assert_eq!(bare.url(&["events"]).as_str(), "http://x/events");
    }

    #[test]
    fn ids_are_encoded_as_single_segments() {
        let backend =
            RestBackend::new("http://localhost:8080/api", None, Duration::from_secs(5)).unwrap();
        assert_eq!(
            backend.url(&["events", "a/b?c#d"]).as_str(),
            "http://localhost:8080/api/events/a%2Fb%3Fc%23d"
        );
        assert_eq!(
            backend.url(&["teams", "50% off", "events"]).as_str(),
            "http://localhost:8080/api/teams/50%25%20off/events"
        );
    }

    #[test]
    fn base_url_must_be_hierarchical() {
        for base in ["not a url", "mailto:coach@example.com"] {
            let err = RestBackend::new(base, None, Duration::from_secs(5)).err();
            assert!(matches!(err, Some(BackendError::Network(_))), "{base}: {err:?}");
        }
    }

    #[test]
    fn empty_token_is_dropped() {
        let backend =
            RestBackend::new("http://x", Some(String::new()), Duration::from_secs(5)).unwrap();
        assert!(backend.id_token.is_none());
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        // Port 9 (discard) on localhost is closed on test machines.
        let backend =
            RestBackend::new("http://127.0.0.1:9", None, Duration::from_secs(2)).unwrap();
        let err = backend.list_team_events("a").await.unwrap_err();
        assert!(err.is_network(), "got {err:?}");
    }
}
