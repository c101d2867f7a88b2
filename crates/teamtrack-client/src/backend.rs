// Collaborator contracts: the event backend and the team lookup, plus the
// loading helpers built on them.

use std::collections::HashSet;

use async_trait::async_trait;
use futures_util::future::join_all;
use teamtrack_core::tournament::TournamentSummary;
use teamtrack_core::{EventRecord, EventUpdate, NewEvent, Team, TeamRoster};
use tracing::{debug, warn};

use crate::error::BackendError;

/// REST-style operations over event records.
#[async_trait]
pub trait EventBackend: Send + Sync {
    /// Create an event; the returned record carries its id.
    async fn create_event(&self, event: &NewEvent) -> Result<EventRecord, BackendError>;

    async fn list_team_events(&self, team_id: &str) -> Result<Vec<EventRecord>, BackendError>;

    /// Returns `BackendError::Unsupported` when the backend has no direct
    /// tournament endpoint. Use [`list_tournament_events`] to get the
    /// per-team fallback.
    async fn list_tournament_events(
        &self,
        tournament_id: &str,
    ) -> Result<Vec<EventRecord>, BackendError>;

    async fn update_event(
        &self,
        event_id: &str,
        update: &EventUpdate,
    ) -> Result<EventRecord, BackendError>;

    async fn delete_event(&self, event_id: &str) -> Result<(), BackendError>;
}

/// Team and tournament metadata used for display names.
#[async_trait]
pub trait TeamLookup: Send + Sync {
    async fn get_team(&self, team_id: &str) -> Result<Team, BackendError>;

    async fn get_tournament(&self, tournament_id: &str)
        -> Result<TournamentSummary, BackendError>;
}

/// List a tournament's events, falling back to per-team listing filtered by
/// `tournament_id` when the backend lacks the direct endpoint.
///
/// Fallback results keep team order and drop duplicate ids.
pub async fn list_tournament_events(
    backend: &dyn EventBackend,
    tournament_id: &str,
    team_ids: &[String],
) -> Result<Vec<EventRecord>, BackendError> {
    match backend.list_tournament_events(tournament_id).await {
        Err(BackendError::Unsupported) => {
            debug!(
                tournament_id,
                teams = team_ids.len(),
                "tournament listing unsupported, fetching per team"
            );
        }
        other => return other,
    }

    let per_team = join_all(team_ids.iter().map(|id| backend.list_team_events(id))).await;

    let mut seen = HashSet::new();
    let mut events = Vec::new();
    for result in per_team {
        for event in result? {
            let in_tournament = event.tournament_id.as_deref() == Some(tournament_id);
            if in_tournament && seen.insert(event.id.clone()) {
                events.push(event);
            }
        }
    }
    Ok(events)
}

/// Look up every team in `team_ids` concurrently. Failed lookups are logged
/// and left out, so their names render as "Unknown Team".
pub async fn resolve_roster<'a, I>(lookup: &dyn TeamLookup, team_ids: I) -> TeamRoster
where
    I: IntoIterator<Item = &'a str>,
{
    let mut unique: Vec<&str> = Vec::new();
    for id in team_ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }

    let results = join_all(unique.iter().map(|id| lookup.get_team(id))).await;

    let mut roster = TeamRoster::new();
    for (id, result) in unique.iter().zip(results) {
        match result {
            Ok(team) => roster.insert(team),
            Err(e) => warn!(team_id = %id, error = %e, "team lookup failed"),
        }
    }
    roster
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Call, MemoryBackend};

    fn ev(id: &str, team: &str, tournament: Option<&str>) -> EventRecord {
        EventRecord {
            id: id.into(),
            team_id: team.into(),
            tournament_id: tournament.map(str::to_string),
            name: format!("Event {id}"),
            date: "2024-06-01".into(),
            start_time: "10:00".into(),
            length_minutes: 60,
            location: None,
            description: None,
            score: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn team(id: &str, name: &str) -> Team {
        Team {
            id: id.into(),
            name: name.into(),
            sport: None,
            age_group: None,
        }
    }

    fn fixture() -> Vec<EventRecord> {
        vec![
            ev("1", "a", Some("cup")),
            ev("2", "b", Some("cup")),
            ev("3", "a", None),
            ev("4", "b", Some("other")),
        ]
    }

    #[tokio::test]
    async fn direct_tournament_endpoint_is_used_when_available() {
        let backend = MemoryBackend::with_events(fixture());
        let teams = vec!["a".to_string(), "b".to_string()];
        let events = list_tournament_events(&backend, "cup", &teams).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(backend.calls(), vec![Call::ListTournament("cup".into())]);
    }

    #[tokio::test]
    async fn falls_back_to_per_team_listing() {
        let backend = MemoryBackend::with_events(fixture()).without_tournament_endpoint();
        let teams = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let events = list_tournament_events(&backend, "cup", &teams).await.unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(backend.calls().contains(&Call::ListTeam("b".into())));
    }

    #[tokio::test]
    async fn fallback_propagates_team_listing_errors() {
        let backend = MemoryBackend::with_events(fixture()).without_tournament_endpoint();
        backend.fail_on("b", BackendError::Network("offline".into()));
        let teams = vec!["a".to_string(), "b".to_string()];
        let err = list_tournament_events(&backend, "cup", &teams)
            .await
            .unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn other_errors_do_not_trigger_fallback() {
        let backend = MemoryBackend::with_events(fixture());
        backend.fail_on(
            "cup",
            BackendError::Rejected {
                status: 500,
                message: "boom".into(),
            },
        );
        let err = list_tournament_events(&backend, "cup", &["a".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Rejected { status: 500, .. }));
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn roster_skips_failed_lookups() {
        let backend = MemoryBackend::new();
        backend.add_team(team("a", "Lions"));
        backend.add_team(team("b", "Tigers"));
        backend.fail_on("b", BackendError::Network("offline".into()));

        let roster = resolve_roster(&backend, ["a", "b", "a", "zzz"]).await;
        assert_eq!(roster.name_of("a"), "Lions");
        assert_eq!(roster.name_of("b"), "Unknown Team");
        assert_eq!(roster.name_of("zzz"), "Unknown Team");
        let lookups = backend
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::GetTeam(_)))
            .count();
        assert_eq!(lookups, 3);
    }
}
