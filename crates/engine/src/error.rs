//! Error types for the simulation core.

use thiserror::Error;

/// A submitted event is missing a required field or carries a malformed one.
///
/// Raised at the live store boundary; a rejected event never touches state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("event must be a JSON object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` is malformed")]
    MalformedField(&'static str),

    #[error("unknown event type `{0}`")]
    UnknownKind(String),

    #[error("unknown team `{0}` (expected `home` or `away`)")]
    UnknownTeam(String),
}

/// The event generator could not produce a candidate this tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("event generator unavailable: {0}")]
    Unavailable(String),
}

/// A fresh fixture batch could not be planned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegenerationError {
    #[error("need at least two distinct teams to pair fixtures, found {0}")]
    NotEnoughTeams(usize),
}

/// A configuration value is outside its accepted range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid `{field}`: {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub reason: &'static str,
}
