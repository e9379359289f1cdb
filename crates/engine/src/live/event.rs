//! In-match events and validation of untyped submissions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// Which side of a fixture an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "home" => Some(Side::Home),
            "away" => Some(Side::Away),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Goal,
    YellowCard,
    RedCard,
    Substitution,
    Corner,
    Foul,
    Offside,
    PenaltyMiss,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Goal,
        EventKind::YellowCard,
        EventKind::RedCard,
        EventKind::Substitution,
        EventKind::Corner,
        EventKind::Foul,
        EventKind::Offside,
        EventKind::PenaltyMiss,
    ];

    pub fn is_goal(self) -> bool {
        self == EventKind::Goal
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Goal => "goal",
            EventKind::YellowCard => "yellow_card",
            EventKind::RedCard => "red_card",
            EventKind::Substitution => "substitution",
            EventKind::Corner => "corner",
            EventKind::Foul => "foul",
            EventKind::Offside => "offside",
            EventKind::PenaltyMiss => "penalty_miss",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

/// Something that happened on the pitch. Immutable once recorded.
///
/// `minute` carries the match clock value at the moment of the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub team: Side,
    pub player: String,
    pub minute: u32,
}

impl MatchEvent {
    pub fn new(kind: EventKind, team: Side, player: impl Into<String>, minute: u32) -> Self {
        Self {
            kind,
            team,
            player: player.into(),
            minute,
        }
    }

    /// Validate an untyped submission of the shape
    /// `{"type": "goal", "team": "home", "player": "...", "minute": 12}`.
    ///
    /// Empty strings count as missing. `minute` must be a non-negative integer.
    pub fn from_json(raw: &Value) -> Result<Self, ValidationError> {
        let obj = raw.as_object().ok_or(ValidationError::NotAnObject)?;

        let kind = required_str(obj.get("type"), "type")?;
        let kind = EventKind::parse(kind).ok_or_else(|| ValidationError::UnknownKind(kind.to_string()))?;

        let team = required_str(obj.get("team"), "team")?;
        let team = Side::parse(team).ok_or_else(|| ValidationError::UnknownTeam(team.to_string()))?;

        let player = required_str(obj.get("player"), "player")?;

        let minute = match obj.get("minute") {
            None | Some(Value::Null) => return Err(ValidationError::MissingField("minute")),
            Some(value) => value
                .as_u64()
                .and_then(|m| u32::try_from(m).ok())
                .ok_or(ValidationError::MalformedField("minute"))?,
        };

        Ok(Self::new(kind, team, player, minute))
    }
}

fn required_str<'a>(value: Option<&'a Value>, field: &'static str) -> Result<&'a str, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ValidationError::MalformedField(field)),
    }
}
