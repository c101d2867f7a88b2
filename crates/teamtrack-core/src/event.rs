// Event records as exchanged with the backend, plus the create/update payloads.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::score::normalize_score;

/// One scheduled occurrence (practice, game, ...) belonging to one team.
///
/// `date` and `start_time` are kept as the backend's wire strings. Parsing
/// happens on demand so a malformed value never prevents a record from loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    pub team_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_id: Option<String>,
    pub name: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM` or `HH:MM:SS`.
    pub start_time: String,
    pub length_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// The five fields that decide whether two records are the same real-world game.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub date: String,
    pub start_time: String,
    pub location: Option<String>,
    pub tournament_id: Option<String>,
    pub length_minutes: u32,
}

impl EventRecord {
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            date: self.date.clone(),
            start_time: self.start_time.clone(),
            location: self.location.clone(),
            tournament_id: self.tournament_id.clone(),
            length_minutes: self.length_minutes,
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    pub fn parsed_start_time(&self) -> Option<NaiveTime> {
        parse_time(&self.start_time)
    }

    /// Combined date and start time, or `None` if either part is malformed.
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        Some(self.parsed_date()?.and_time(self.parsed_start_time()?))
    }

    /// Apply an update in place, the way the backend would. Fields absent
    /// from `update` are left alone.
    pub fn apply(&mut self, update: &EventUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(date) = &update.date {
            self.date = date.clone();
        }
        if let Some(start_time) = &update.start_time {
            self.start_time = start_time.clone();
        }
        if let Some(length) = update.length_minutes {
            self.length_minutes = length;
        }
        if let Some(location) = &update.location {
            self.location = non_empty(location);
        }
        if let Some(description) = &update.description {
            self.description = non_empty(description);
        }
        if let Some(score) = &update.score {
            self.score = non_empty(score);
        }
    }
}

/// Parse a wire date. A trailing ISO timestamp part (`T...`) is ignored.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.split_once('T').map_or(raw, |(d, _)| d);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Parse a 24-hour `HH:MM` or `HH:MM:SS` time.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// An event to be created: an `EventRecord` without its id or timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub team_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_id: Option<String>,
    pub name: String,
    pub date: String,
    pub start_time: String,
    pub length_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
}

impl NewEvent {
    /// Check the payload and normalize its score. Returns the payload ready
    /// to send.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        if self.team_id.trim().is_empty() {
            return Err(ValidationError::MissingTeam);
        }
        require("date", &self.date)?;
        require("startTime", &self.start_time)?;
        if self.length_minutes == 0 {
            return Err(ValidationError::NonPositiveLength);
        }
        self.score = normalize_score(self.score.as_deref())?;
        Ok(self)
    }

    /// The record the backend would return for this payload under `id`.
    pub fn into_record(self, id: impl Into<String>) -> EventRecord {
        EventRecord {
            id: id.into(),
            team_id: self.team_id,
            tournament_id: self.tournament_id,
            name: self.name,
            date: self.date,
            start_time: self.start_time,
            length_minutes: self.length_minutes,
            location: self.location,
            description: self.description,
            score: self.score,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Partial update for one event. `None` fields are not sent.
///
/// For the optional text fields an empty string clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
}

impl EventUpdate {
    pub fn is_empty(&self) -> bool {
        *self == EventUpdate::default()
    }

    /// Same validation as create, applied to whichever fields are present.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        if let Some(date) = &self.date {
            require("date", date)?;
        }
        if let Some(start_time) = &self.start_time {
            require("startTime", start_time)?;
        }
        if self.length_minutes == Some(0) {
            return Err(ValidationError::NonPositiveLength);
        }
        if let Some(score) = self.score.take() {
            // An empty score is an explicit "clear", kept as "".
            self.score = Some(normalize_score(Some(&score))?.unwrap_or_default());
        }
        Ok(self)
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField { field })
    } else {
        Ok(())
    }
}
