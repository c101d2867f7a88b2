// Tournament-side helpers: building the paired records for a new game,
// organizer invites, and the advisory fullness check.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::event::NewEvent;
use crate::score::normalize_score;
use crate::team::TeamRoster;

// ---------------------------------------------------------------------------
// Two-team game creation
// ---------------------------------------------------------------------------

/// Form input for a tournament game between two teams.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTournamentGame {
    pub tournament_id: String,
    pub home_team_id: Option<String>,
    pub away_team_id: Option<String>,
    pub date: String,
    pub start_time: String,
    pub length_minutes: u32,
    pub location: Option<String>,
    pub description: Option<String>,
    pub score: Option<String>,
}

impl NewTournamentGame {
    /// Validate the form and produce one record per team.
    ///
    /// Both records share every grouping field, so they fold back into one
    /// game once created. Each is named after its opponent.
    pub fn into_events(self, roster: &TeamRoster) -> Result<[NewEvent; 2], ValidationError> {
        let home = selected(self.home_team_id)?;
        let away = selected(self.away_team_id)?;
        if home == away {
            return Err(ValidationError::IdenticalTeams);
        }
        if self.tournament_id.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "tournamentId",
            });
        }
        let score = normalize_score(self.score.as_deref())?;

        let make = |team: &str, opponent: &str| NewEvent {
            team_id: team.to_string(),
            tournament_id: Some(self.tournament_id.clone()),
            name: format!("Game vs {}", roster.name_of(opponent)),
            date: self.date.clone(),
            start_time: self.start_time.clone(),
            length_minutes: self.length_minutes,
            location: self.location.clone().filter(|l| !l.is_empty()),
            description: self.description.clone().filter(|d| !d.is_empty()),
            score: score.clone(),
        };

        let home_event = make(&home, &away).validated()?;
        let away_event = make(&away, &home).validated()?;
        Ok([home_event, away_event])
    }
}

fn selected(team_id: Option<String>) -> Result<String, ValidationError> {
    match team_id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(ValidationError::MissingTeam),
    }
}

// ---------------------------------------------------------------------------
// Tournament summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub team_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_teams: Option<u32>,
    #[serde(default)]
    pub organizers: Vec<OrganizerInvite>,
}

impl TournamentSummary {
    /// Client-side hint that no more teams fit. The server decides; this only
    /// drives whether the join control is offered.
    pub fn appears_full(&self) -> bool {
        match self.max_teams {
            Some(max) => self.team_ids.len() >= max as usize,
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Organizers
// ---------------------------------------------------------------------------

/// An organizer entry on a tournament, decoded once at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OrganizerInvite {
    Pending {
        email: String,
        #[serde(rename = "invitedBy")]
        invited_by: String,
    },
    Accepted {
        #[serde(rename = "userId")]
        user_id: String,
        email: String,
    },
}

impl OrganizerInvite {
    pub fn accepted_user(&self) -> Option<&str> {
        match self {
            OrganizerInvite::Accepted { user_id, .. } => Some(user_id),
            OrganizerInvite::Pending { .. } => None,
        }
    }
}

/// Why a user may not step down as organizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveBlocked {
    /// The user is the only accepted organizer; someone else must accept an
    /// invite first.
    LastOrganizer,
    NotAnOrganizer,
}

/// Whether `user_id` can leave the organizer list without orphaning the
/// tournament.
pub fn can_leave(organizers: &[OrganizerInvite], user_id: &str) -> Result<(), LeaveBlocked> {
    let accepted: Vec<&str> = organizers
        .iter()
        .filter_map(OrganizerInvite::accepted_user)
        .collect();
    if !accepted.contains(&user_id) {
        return Err(LeaveBlocked::NotAnOrganizer);
    }
    if accepted.len() <= 1 {
        return Err(LeaveBlocked::LastOrganizer);
    }
    Ok(())
}
