// Per-screen schedule controller.
//
// Owns the loaded event records for one team or tournament as an immutable
// snapshot, the calendar cursor, and the per-game view state machine:
//
//   Viewing -> Editing -> Saving -> Viewing
//                               \-> ErrorShown -> Editing
//   Viewing -> ConfirmingDelete -> Deleting -> Removed
//                                          \-> ErrorShown -> Viewing
//
// Mutations are split into submit/complete halves around a ticket so the
// network work can run outside the controller. A ticket issued before the
// context changed is discarded on completion.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use teamtrack_core::schedule::{
    calendar_view, list_view, sorted, CalendarCursor, CalendarMode, CalendarView, GameRow,
    WeekStart,
};
use teamtrack_core::tournament::NewTournamentGame;
use teamtrack_core::game::find_game;
use teamtrack_core::{group_events, EventRecord, Game, GroupKey, TeamRoster};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{list_tournament_events, resolve_roster, EventBackend, TeamLookup};
use crate::coordinator::{DeleteConfirmation, GameCoordinator, GameEdit};
use crate::error::{BackendError, MutationError};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Whose schedule the screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleContext {
    Team { team_id: String },
    Tournament { tournament_id: String },
}

impl ScheduleContext {
    fn calendar_mode(&self) -> CalendarMode {
        match self {
            ScheduleContext::Team { .. } => CalendarMode::Month,
            ScheduleContext::Tournament { .. } => CalendarMode::Week,
        }
    }

    fn includes(&self, event: &EventRecord) -> bool {
        match self {
            ScheduleContext::Team { team_id } => event.team_id == *team_id,
            ScheduleContext::Tournament { tournament_id } => {
                event.tournament_id.as_deref() == Some(tournament_id.as_str())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    List,
    Calendar,
}

/// The loaded records at one point in time. Replaced, never mutated.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub version: u64,
    pub events: Arc<[EventRecord]>,
}

impl Snapshot {
    fn empty(version: u64) -> Self {
        Self {
            version,
            events: Arc::from(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Edit,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GamePhase {
    Viewing,
    Editing,
    Saving,
    ConfirmingDelete,
    Deleting,
    ErrorShown { message: String, during: Operation },
    Removed,
}

impl GamePhase {
    fn label(&self) -> &'static str {
        match self {
            GamePhase::Viewing => "viewing",
            GamePhase::Editing => "editing",
            GamePhase::Saving => "saving",
            GamePhase::ConfirmingDelete => "confirming delete",
            GamePhase::Deleting => "deleting",
            GamePhase::ErrorShown { .. } => "showing an error",
            GamePhase::Removed => "removed",
        }
    }

    fn in_flight(&self) -> bool {
        matches!(self, GamePhase::Saving | GamePhase::Deleting)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("that game is no longer on the schedule")]
    UnknownGame,

    #[error("a change to this game is already in progress")]
    Busy,

    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        phase: &'static str,
        action: &'static str,
    },
}

/// Issued when a mutation starts; hand it back with the result.
#[derive(Debug)]
pub struct MutationTicket {
    generation: u64,
    key: GroupKey,
    pub game: Game,
}

/// What happened when a mutation result was handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The game is now in `ErrorShown` with this message.
    Failed(String),
    /// The screen moved on before the result arrived; nothing changed.
    Discarded,
}

/// What the screen should render for the current mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleView {
    List(Vec<GameRow>),
    Calendar(CalendarView),
}

// ---------------------------------------------------------------------------
// ScheduleController
// ---------------------------------------------------------------------------

pub struct ScheduleController {
    backend: Arc<dyn EventBackend>,
    teams: Arc<dyn TeamLookup>,
    coordinator: GameCoordinator,
    context: ScheduleContext,
    snapshot: Snapshot,
    roster: TeamRoster,
    mode: ViewMode,
    cursor: CalendarCursor,
    phases: HashMap<GroupKey, GamePhase>,
    /// Bumped whenever the screen switches context. Tickets from an older
    /// generation are discarded.
    generation: u64,
    load_error: Option<String>,
    /// Set when a partial failure left the snapshot out of step with the
    /// backend.
    needs_refresh: bool,
}

impl ScheduleController {
    pub fn new(
        backend: Arc<dyn EventBackend>,
        teams: Arc<dyn TeamLookup>,
        context: ScheduleContext,
        today: NaiveDate,
        week_start: WeekStart,
    ) -> Self {
        let cursor = CalendarCursor::new(context.calendar_mode(), today, week_start);
        Self {
            coordinator: GameCoordinator::new(Arc::clone(&backend)),
            backend,
            teams,
            context,
            snapshot: Snapshot::empty(0),
            roster: TeamRoster::new(),
            mode: ViewMode::List,
            cursor,
            phases: HashMap::new(),
            generation: 0,
            load_error: None,
            needs_refresh: false,
        }
    }

    pub fn context(&self) -> &ScheduleContext {
        &self.context
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn roster(&self) -> &TeamRoster {
        &self.roster
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    pub fn coordinator(&self) -> GameCoordinator {
        self.coordinator.clone()
    }

    // -- loading ------------------------------------------------------------

    /// Fetch the records and team names for the current context.
    ///
    /// On failure the previous snapshot stays and the message is kept in
    /// `load_error()`.
    pub async fn load(&mut self) -> Result<(), BackendError> {
        let result = match &self.context {
            ScheduleContext::Team { team_id } => self
                .backend
                .list_team_events(team_id)
                .await
                .map(|events| (events, vec![team_id.clone()])),
            ScheduleContext::Tournament { tournament_id } => {
                let team_ids = match self.teams.get_tournament(tournament_id).await {
                    Ok(t) => t.team_ids,
                    Err(e) => {
                        warn!(%tournament_id, error = %e, "could not load tournament teams");
                        Vec::new()
                    }
                };
                list_tournament_events(self.backend.as_ref(), tournament_id, &team_ids)
                    .await
                    .map(|events| (events, team_ids))
            }
        };

        let (events, mut team_ids) = match result {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(context = ?self.context, error = %e, "schedule load failed");
                self.load_error = Some(e.user_message());
                return Err(e);
            }
        };

        for event in &events {
            if !team_ids.contains(&event.team_id) {
                team_ids.push(event.team_id.clone());
            }
        }
        let ids = team_ids.iter().map(String::as_str);
        self.roster = resolve_roster(self.teams.as_ref(), ids).await;

        info!(context = ?self.context, events = events.len(), "schedule loaded");
        self.replace_events(events);
        self.phases.retain(|_, phase| phase.in_flight());
        self.load_error = None;
        self.needs_refresh = false;
        Ok(())
    }

    pub async fn refresh(&mut self) -> Result<(), BackendError> {
        self.load().await
    }

    /// Point the screen at another team or tournament. Pending mutations
    /// keep running on the backend but their results will be discarded.
    pub fn switch_context(&mut self, context: ScheduleContext) {
        debug!(from = ?self.context, to = ?context, "switching schedule context");
        self.generation += 1;
        self.cursor = CalendarCursor::new(
            context.calendar_mode(),
            self.cursor.anchor,
            self.cursor.week_start,
        );
        self.context = context;
        self.snapshot = Snapshot::empty(self.snapshot.version + 1);
        self.roster = TeamRoster::new();
        self.phases.clear();
        self.load_error = None;
        self.needs_refresh = false;
    }

    /// Swap in a new snapshot. Phases for games that are gone, and every
    /// `Removed` marker, are dropped so a later game with the same key starts
    /// out in `Viewing`. In-flight phases stay until their ticket completes.
    fn replace_events(&mut self, events: Vec<EventRecord>) {
        let live: HashSet<GroupKey> = events.iter().map(EventRecord::group_key).collect();
        self.phases.retain(|key, phase| {
            phase.in_flight() || (*phase != GamePhase::Removed && live.contains(key))
        });
        self.snapshot = Snapshot {
            version: self.snapshot.version + 1,
            events: Arc::from(events),
        };
    }

    // -- views ----------------------------------------------------------------

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    pub fn cursor(&self) -> CalendarCursor {
        self.cursor
    }

    pub fn previous(&mut self) {
        self.cursor = self.cursor.previous();
    }

    pub fn next(&mut self) {
        self.cursor = self.cursor.next();
    }

    pub fn go_to_today(&mut self, today: NaiveDate) {
        self.cursor = self.cursor.today(today);
    }

    /// Games in chronological order.
    pub fn games(&self) -> Vec<Game> {
        group_events(&sorted(&self.snapshot.events))
    }

    pub fn game_for_event(&self, event_id: &str) -> Option<Game> {
        find_game(&self.games(), event_id).cloned()
    }

    fn game_by_key(&self, key: &GroupKey) -> Option<Game> {
        self.games().into_iter().find(|g| g.key() == key)
    }

    pub fn list(&self) -> Vec<GameRow> {
        list_view(&self.snapshot.events, &self.roster)
    }

    pub fn calendar(&self) -> CalendarView {
        calendar_view(&self.snapshot.events, &self.roster, &self.cursor)
    }

    pub fn view(&self) -> ScheduleView {
        match self.mode {
            ViewMode::List => ScheduleView::List(self.list()),
            ViewMode::Calendar => ScheduleView::Calendar(self.calendar()),
        }
    }

    // -- game state machine ---------------------------------------------------

    pub fn phase(&self, key: &GroupKey) -> GamePhase {
        self.phases.get(key).cloned().unwrap_or(GamePhase::Viewing)
    }

    /// Move `key` from one of `from` to `to`, or explain why not.
    fn transition(
        &mut self,
        key: &GroupKey,
        from: &[GamePhase],
        to: GamePhase,
        action: &'static str,
    ) -> Result<(), SessionError> {
        let current = self.phase(key);
        if current.in_flight() {
            return Err(SessionError::Busy);
        }
        if !from.contains(&current) {
            return Err(SessionError::InvalidTransition {
                phase: current.label(),
                action,
            });
        }
        self.set_phase(key, to);
        Ok(())
    }

    fn set_phase(&mut self, key: &GroupKey, phase: GamePhase) {
        if phase == GamePhase::Viewing {
            self.phases.remove(key);
        } else {
            self.phases.insert(key.clone(), phase);
        }
    }

    pub fn begin_edit(&mut self, key: &GroupKey) -> Result<Game, SessionError> {
        let game = self.game_by_key(key).ok_or(SessionError::UnknownGame)?;
        self.transition(key, &[GamePhase::Viewing], GamePhase::Editing, "edit")?;
        Ok(game)
    }

    pub fn cancel_edit(&mut self, key: &GroupKey) -> Result<(), SessionError> {
        self.transition(key, &[GamePhase::Editing], GamePhase::Viewing, "cancel editing")
    }

    pub fn submit_edit(&mut self, key: &GroupKey) -> Result<MutationTicket, SessionError> {
        let game = self.game_by_key(key).ok_or(SessionError::UnknownGame)?;
        self.transition(key, &[GamePhase::Editing], GamePhase::Saving, "save")?;
        Ok(MutationTicket {
            generation: self.generation,
            key: key.clone(),
            game,
        })
    }

    pub fn complete_edit(
        &mut self,
        ticket: MutationTicket,
        result: Result<Vec<EventRecord>, MutationError>,
    ) -> Completion {
        if ticket.generation != self.generation {
            debug!("discarding edit result from a previous screen");
            return Completion::Discarded;
        }
        match result {
            Ok(updated) => {
                let mut events: Vec<EventRecord> = self.snapshot.events.to_vec();
                for record in updated {
                    if let Some(slot) = events.iter_mut().find(|e| e.id == record.id) {
                        *slot = record;
                    }
                }
                self.replace_events(events);
                self.set_phase(&ticket.key, GamePhase::Viewing);
                Completion::Applied
            }
            Err(e) => self.fail(&ticket.key, &e, Operation::Edit),
        }
    }

    pub fn request_delete(&mut self, key: &GroupKey) -> Result<(), SessionError> {
        self.game_by_key(key).ok_or(SessionError::UnknownGame)?;
        self.transition(
            key,
            &[GamePhase::Viewing],
            GamePhase::ConfirmingDelete,
            "delete",
        )
    }

    pub fn cancel_delete(&mut self, key: &GroupKey) -> Result<(), SessionError> {
        self.transition(
            key,
            &[GamePhase::ConfirmingDelete],
            GamePhase::Viewing,
            "cancel delete",
        )
    }

    /// The only way to obtain a [`DeleteConfirmation`].
    pub fn confirm_delete(
        &mut self,
        key: &GroupKey,
    ) -> Result<(MutationTicket, DeleteConfirmation), SessionError> {
        let game = self.game_by_key(key).ok_or(SessionError::UnknownGame)?;
        self.transition(
            key,
            &[GamePhase::ConfirmingDelete],
            GamePhase::Deleting,
            "confirm delete",
        )?;
        let ticket = MutationTicket {
            generation: self.generation,
            key: key.clone(),
            game,
        };
        Ok((ticket, DeleteConfirmation::new()))
    }

    pub fn complete_delete(
        &mut self,
        ticket: MutationTicket,
        result: Result<Vec<String>, MutationError>,
    ) -> Completion {
        if ticket.generation != self.generation {
            debug!("discarding delete result from a previous screen");
            return Completion::Discarded;
        }
        match result {
            Ok(deleted) => {
                let events: Vec<EventRecord> = self
                    .snapshot
                    .events
                    .iter()
                    .filter(|e| !deleted.contains(&e.id))
                    .cloned()
                    .collect();
                self.replace_events(events);
                self.set_phase(&ticket.key, GamePhase::Removed);
                Completion::Applied
            }
            Err(e) => self.fail(&ticket.key, &e, Operation::Delete),
        }
    }

    /// Acknowledge an error: back to editing after a failed save, back to
    /// viewing after a failed delete.
    pub fn dismiss_error(&mut self, key: &GroupKey) -> Result<(), SessionError> {
        match self.phase(key) {
            GamePhase::ErrorShown { during, .. } => {
                let next = match during {
                    Operation::Edit => GamePhase::Editing,
                    Operation::Delete => GamePhase::Viewing,
                };
                self.set_phase(key, next);
                Ok(())
            }
            other => Err(SessionError::InvalidTransition {
                phase: other.label(),
                action: "dismiss error",
            }),
        }
    }

    fn fail(&mut self, key: &GroupKey, error: &MutationError, during: Operation) -> Completion {
        if matches!(error, MutationError::Group { succeeded, .. } if !succeeded.is_empty()) {
            self.needs_refresh = true;
        }
        let message = error.user_message();
        self.set_phase(
            key,
            GamePhase::ErrorShown {
                message: message.clone(),
                during,
            },
        );
        Completion::Failed(message)
    }

    // -- one-shot helpers -------------------------------------------------------

    /// Submit an edit for a game in `Editing` and wait for it.
    pub async fn save_edit(
        &mut self,
        key: &GroupKey,
        edit: GameEdit,
    ) -> Result<Completion, SessionError> {
        let ticket = self.submit_edit(key)?;
        let result = self.coordinator.edit_game(&ticket.game, edit).await;
        Ok(self.complete_edit(ticket, result))
    }

    /// Confirm a pending delete and wait for it.
    pub async fn delete_confirmed(&mut self, key: &GroupKey) -> Result<Completion, SessionError> {
        let (ticket, confirmation) = self.confirm_delete(key)?;
        let result = self.coordinator.delete_game(&ticket.game, confirmation).await;
        Ok(self.complete_delete(ticket, result))
    }

    /// Create a tournament game. New records that belong on this screen are
    /// added to the snapshot. Errors come back as display strings.
    ///
    /// Record names are stored, so a team missing from the roster is looked
    /// up first. If that lookup fails nothing is created.
    pub async fn create_game(
        &mut self,
        form: NewTournamentGame,
    ) -> Result<[EventRecord; 2], String> {
        let generation = self.generation;
        let unresolved: Vec<String> = [&form.home_team_id, &form.away_team_id]
            .into_iter()
            .flatten()
            .filter(|id| !id.trim().is_empty() && self.roster.get(id).is_none())
            .cloned()
            .collect();
        for team_id in unresolved {
            match self.teams.get_team(&team_id).await {
                Ok(team) => self.roster.insert(team),
                Err(e) => {
                    warn!(%team_id, error = %e, "cannot name new game without its teams");
                    return Err(e.user_message());
                }
            }
        }

        let created = self
            .coordinator
            .create_tournament_game(form, &self.roster)
            .await;

        match created {
            Ok(records) => {
                if generation == self.generation {
                    let mut events = self.snapshot.events.to_vec();
                    events.extend(records.iter().filter(|r| self.context.includes(r)).cloned());
                    self.replace_events(events);
                }
                Ok(records)
            }
            Err(e) => {
                if matches!(&e, MutationError::Group { succeeded, .. } if !succeeded.is_empty()) {
                    self.needs_refresh = true;
                }
                Err(e.user_message())
            }
        }
    }
}
