// Client-side validation errors. Anything raised here is caught before a
// request reaches the backend.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("score must look like \"3-1\", got \"{0}\"")]
    MalformedScore(String),

    #[error("select two teams for the game")]
    MissingTeam,

    #[error("a team cannot play against itself")]
    IdenticalTeams,

    #[error("game length must be greater than 0 minutes")]
    NonPositiveLength,

    #[error("`{field}` is required")]
    MissingField { field: &'static str },
}
