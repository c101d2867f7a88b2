// Pure schedule logic for TeamTrack: event records, game grouping, sorting
// and the list/calendar projections. No I/O lives in this crate.

pub mod error;
pub mod event;
pub mod game;
pub mod schedule;
pub mod score;
pub mod team;
pub mod tournament;

pub use error::ValidationError;
pub use event::{EventRecord, EventUpdate, GroupKey, NewEvent};
pub use game::{group_events, Game};
pub use team::{Team, TeamRoster, UNKNOWN_TEAM};
