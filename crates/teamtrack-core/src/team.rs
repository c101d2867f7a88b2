// Team data used only to resolve display names.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Shown wherever a team id cannot be resolved.
pub const UNKNOWN_TEAM: &str = "Unknown Team";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
}

/// Id -> team lookup table. Lookups never fail; misses resolve to
/// [`UNKNOWN_TEAM`].
#[derive(Debug, Clone, Default)]
pub struct TeamRoster {
    teams: HashMap<String, Team>,
}

impl TeamRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, team: Team) {
        self.teams.insert(team.id.clone(), team);
    }

    pub fn get(&self, team_id: &str) -> Option<&Team> {
        self.teams.get(team_id)
    }

    pub fn name_of(&self, team_id: &str) -> &str {
        self.teams
            .get(team_id)
            .map(|t| t.name.as_str())
            .unwrap_or(UNKNOWN_TEAM)
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

impl FromIterator<Team> for TeamRoster {
    fn from_iter<I: IntoIterator<Item = Team>>(iter: I) -> Self {
        let mut roster = TeamRoster::new();
        for team in iter {
            roster.insert(team);
        }
        roster
    }
}
