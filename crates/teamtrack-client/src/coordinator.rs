// Game mutation fan-out: one edit, delete or create against a displayed game
// becomes one request per underlying event record.
//
// Requests for a game are issued concurrently and all of them settle before a
// result is reported. Members that succeeded are never rolled back.

use std::sync::Arc;

use futures_util::future::{join, join_all};
use serde::Deserialize;
use teamtrack_core::tournament::NewTournamentGame;
use teamtrack_core::{EventRecord, EventUpdate, Game, TeamRoster};
use tracing::{debug, info, warn};

use crate::backend::EventBackend;
use crate::error::{BackendError, MemberFailure, MutationError};

/// Field changes applied to every member of a game. There is no `name`:
/// each record keeps its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEdit {
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub length_minutes: Option<u32>,
    pub location: Option<String>,
    pub description: Option<String>,
    /// `Some("")` clears the score.
    pub score: Option<String>,
}

impl GameEdit {
    pub fn is_empty(&self) -> bool {
        *self == GameEdit::default()
    }

    /// The update sent for one member: the shared changes plus that member's
    /// current name.
    fn update_for(&self, member: &EventRecord) -> EventUpdate {
        EventUpdate {
            name: Some(member.name.clone()),
            date: self.date.clone(),
            start_time: self.start_time.clone(),
            length_minutes: self.length_minutes,
            location: self.location.clone(),
            description: self.description.clone(),
            score: self.score.clone(),
        }
    }

    /// Validation shared by all members, run before anything is sent.
    fn validated(self) -> Result<Self, MutationError> {
        let probe = EventUpdate {
            name: None,
            date: self.date,
            start_time: self.start_time,
            length_minutes: self.length_minutes,
            location: self.location,
            description: self.description,
            score: self.score,
        }
        .validated()?;
        Ok(GameEdit {
            date: probe.date,
            start_time: probe.start_time,
            length_minutes: probe.length_minutes,
            location: probe.location,
            description: probe.description,
            score: probe.score,
        })
    }
}

/// Proof that the user confirmed a delete. Only the controller hands these out.
#[derive(Debug)]
pub struct DeleteConfirmation {
    _private: (),
}

impl DeleteConfirmation {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// Issues the per-member requests for game-level mutations.
#[derive(Clone)]
pub struct GameCoordinator {
    backend: Arc<dyn EventBackend>,
}

impl GameCoordinator {
    pub fn new(backend: Arc<dyn EventBackend>) -> Self {
        Self { backend }
    }

    /// Apply `edit` to every member of `game`.
    ///
    /// Returns the updated records in member order. If any member fails the
    /// whole call fails with [`MutationError::Group`], which names the members
    /// that were already changed.
    pub async fn edit_game(
        &self,
        game: &Game,
        edit: GameEdit,
    ) -> Result<Vec<EventRecord>, MutationError> {
        let edit = edit.validated()?;
        if edit.is_empty() {
            debug!(members = game.len(), "empty edit, nothing sent");
            return Ok(game.members().to_vec());
        }

        let requests = game.members().iter().map(|member| {
            let update = edit.update_for(member);
            let backend = Arc::clone(&self.backend);
            async move { backend.update_event(&member.id, &update).await }
        });
        let results = join_all(requests).await;

        let mut updated = Vec::with_capacity(results.len());
        let mut failed = Vec::new();
        for (member, result) in game.members().iter().zip(results) {
            match result {
                Ok(record) => updated.push(record),
                Err(error) => {
                    warn!(event_id = %member.id, %error, "member update failed");
                    failed.push(MemberFailure {
                        id: member.id.clone(),
                        error,
                    });
                }
            }
        }

        if failed.is_empty() {
            info!(members = updated.len(), "game updated");
            Ok(updated)
        } else {
            Err(MutationError::Group {
                succeeded: updated.into_iter().map(|r| r.id).collect(),
                failed,
            })
        }
    }

    /// Delete every member of `game`. Returns the ids now gone.
    ///
    /// A member the backend no longer has counts as deleted.
    pub async fn delete_game(
        &self,
        game: &Game,
        _confirmed: DeleteConfirmation,
    ) -> Result<Vec<String>, MutationError> {
        let results = join_all(
            game.members()
                .iter()
                .map(|member| self.backend.delete_event(&member.id)),
        )
        .await;

        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        for (member, result) in game.members().iter().zip(results) {
            match result {
                Ok(()) => deleted.push(member.id.clone()),
                Err(BackendError::NotFound) => {
                    debug!(event_id = %member.id, "already deleted");
                    deleted.push(member.id.clone());
                }
                Err(error) => {
                    warn!(event_id = %member.id, %error, "member delete failed");
                    failed.push(MemberFailure {
                        id: member.id.clone(),
                        error,
                    });
                }
            }
        }

        if failed.is_empty() {
            info!(members = deleted.len(), "game deleted");
            Ok(deleted)
        } else {
            Err(MutationError::Group {
                succeeded: deleted,
                failed,
            })
        }
    }

    /// Create both records of a tournament game. Succeeds only if both
    /// creations do.
    pub async fn create_tournament_game(
        &self,
        form: NewTournamentGame,
        roster: &TeamRoster,
    ) -> Result<[EventRecord; 2], MutationError> {
        let [home, away] = form.into_events(roster)?;

        let (home_result, away_result) = join(
            self.backend.create_event(&home),
            self.backend.create_event(&away),
        )
        .await;

        match (home_result, away_result) {
            (Ok(h), Ok(a)) => {
                info!(home = %h.id, away = %a.id, "tournament game created");
                Ok([h, a])
            }
            (h, a) => {
                let mut succeeded = Vec::new();
                let mut failed = Vec::new();
                for (team_id, result) in [(&home.team_id, h), (&away.team_id, a)] {
                    match result {
                        Ok(record) => succeeded.push(record.id),
                        Err(error) => {
                            warn!(%team_id, %error, "tournament game creation failed");
                            failed.push(MemberFailure {
                                id: team_id.clone(),
                                error,
                            });
                        }
                    }
                }
                Err(MutationError::Group { succeeded, failed })
            }
        }
    }
}
