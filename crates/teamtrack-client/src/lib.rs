// Backend access and schedule screen state for TeamTrack.

pub mod backend;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod memory;
pub mod rest;

pub use backend::{list_tournament_events, resolve_roster, EventBackend, TeamLookup};
pub use controller::{
    Completion, GamePhase, MutationTicket, ScheduleContext, ScheduleController, ScheduleView,
    SessionError, ViewMode,
};
pub use coordinator::{DeleteConfirmation, GameCoordinator, GameEdit};
pub use error::{BackendError, MemberFailure, MutationError};
pub use memory::MemoryBackend;
pub use rest::RestBackend;
