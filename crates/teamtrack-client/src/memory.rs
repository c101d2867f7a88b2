// In-memory implementation of the collaborator traits. Records every call so
// callers can assert on what would have been sent, and can be told to fail
// specific requests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use teamtrack_core::score::is_valid_score;
use teamtrack_core::tournament::TournamentSummary;
use teamtrack_core::{EventRecord, EventUpdate, NewEvent, Team};

use crate::backend::{EventBackend, TeamLookup};
use crate::error::BackendError;

/// A request as received by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(NewEvent),
    ListTeam(String),
    ListTournament(String),
    Update(String, EventUpdate),
    Delete(String),
    GetTeam(String),
    GetTournament(String),
}

#[derive(Default)]
struct MemoryState {
    events: Vec<EventRecord>,
    teams: HashMap<String, Team>,
    tournaments: HashMap<String, TournamentSummary>,
    next_id: u64,
    calls: Vec<Call>,
    /// Keyed by event id (update/delete) or team id (create/list/lookup).
    failures: HashMap<String, BackendError>,
    no_tournament_endpoint: bool,
}

#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<EventRecord>) -> Self {
        let backend = Self::new();
        backend.state().events = events;
        backend
    }

    pub fn add_team(&self, team: Team) {
        self.state().teams.insert(team.id.clone(), team);
    }

    pub fn add_tournament(&self, tournament: TournamentSummary) {
        self.state()
            .tournaments
            .insert(tournament.id.clone(), tournament);
    }

    /// Make every request touching `key` fail with `error`.
    pub fn fail_on(&self, key: &str, error: BackendError) {
        self.state().failures.insert(key.to_string(), error);
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Behave like a backend without `GET /tournaments/{id}/events`.
    pub fn without_tournament_endpoint(self) -> Self {
        self.state().no_tournament_endpoint = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.state().events.clone()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory backend mutex poisoned")
    }
}

impl MemoryState {
    fn check(&self, key: &str) -> Result<(), BackendError> {
        match self.failures.get(key) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn check_score(score: Option<&str>) -> Result<(), BackendError> {
    match score {
        Some(s) if !s.is_empty() && !is_valid_score(s) => Err(BackendError::Validation(format!(
            "score must match ^\\d+-\\d+$, got {s:?}"
        ))),
        _ => Ok(()),
    }
}

#[async_trait]
impl EventBackend for MemoryBackend {
    async fn create_event(&self, event: &NewEvent) -> Result<EventRecord, BackendError> {
        let mut state = self.state();
        state.calls.push(Call::Create(event.clone()));
        state.check(&event.team_id)?;
        check_score(event.score.as_deref())?;

        state.next_id += 1;
        let record = event.clone().into_record(format!("ev-{}", state.next_id));
        state.events.push(record.clone());
        Ok(record)
    }

    async fn list_team_events(&self, team_id: &str) -> Result<Vec<EventRecord>, BackendError> {
        let mut state = self.state();
        state.calls.push(Call::ListTeam(team_id.to_string()));
        state.check(team_id)?;
        Ok(state
            .events
            .iter()
            .filter(|e| e.team_id == team_id)
            .cloned()
            .collect())
    }

    async fn list_tournament_events(
        &self,
        tournament_id: &str,
    ) -> Result<Vec<EventRecord>, BackendError> {
        let mut state = self.state();
        state
            .calls
            .push(Call::ListTournament(tournament_id.to_string()));
        if state.no_tournament_endpoint {
            return Err(BackendError::Unsupported);
        }
        state.check(tournament_id)?;
        Ok(state
            .events
            .iter()
            .filter(|e| e.tournament_id.as_deref() == Some(tournament_id))
            .cloned()
            .collect())
    }

    async fn update_event(
        &self,
        event_id: &str,
        update: &EventUpdate,
    ) -> Result<EventRecord, BackendError> {
        let mut state = self.state();
        state
            .calls
            .push(Call::Update(event_id.to_string(), update.clone()));
        state.check(event_id)?;
        check_score(update.score.as_deref())?;

        let record = state
            .events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or(BackendError::NotFound)?;
        record.apply(update);
        Ok(record.clone())
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), BackendError> {
        let mut state = self.state();
        state.calls.push(Call::Delete(event_id.to_string()));
        state.check(event_id)?;
        let before = state.events.len();
        state.events.retain(|e| e.id != event_id);
        if state.events.len() == before {
            return Err(BackendError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl TeamLookup for MemoryBackend {
    async fn get_team(&self, team_id: &str) -> Result<Team, BackendError> {
        let mut state = self.state();
        state.calls.push(Call::GetTeam(team_id.to_string()));
        state.check(team_id)?;
        state.teams.get(team_id).cloned().ok_or(BackendError::NotFound)
    }

    async fn get_tournament(
        &self,
        tournament_id: &str,
    ) -> Result<TournamentSummary, BackendError> {
        let mut state = self.state();
        state
            .calls
            .push(Call::GetTournament(tournament_id.to_string()));
        state
            .tournaments
            .get(tournament_id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }
}
