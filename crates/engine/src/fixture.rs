//! Scheduled fixtures and batch regeneration.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::RegenerationError;

/// Minutes between the starts of consecutive fixtures in a regenerated batch.
pub const START_STAGGER_MINUTES: i64 = 1;

/// Row identifier of a fixture in the persistent store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureId(pub i64);

impl fmt::Display for FixtureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Durable lifecycle of a fixture: upcoming -> in progress -> completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureStatus {
    Upcoming,
    InProgress,
    Completed,
}

impl FixtureStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FixtureStatus::Upcoming => "upcoming",
            FixtureStatus::InProgress => "in_progress",
            FixtureStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "upcoming" => Some(FixtureStatus::Upcoming),
            "in_progress" => Some(FixtureStatus::InProgress),
            "completed" => Some(FixtureStatus::Completed),
            _ => None,
        }
    }
}

/// A scheduled match between two teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: FixtureId,
    pub home_team: String,
    pub away_team: String,
    pub scheduled_start: DateTime<Utc>,
    pub status: FixtureStatus,
}

impl Fixture {
    /// Upcoming and scheduled at or before `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == FixtureStatus::Upcoming && self.scheduled_start <= now
    }
}

/// A fixture that has been planned but not yet assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFixture {
    pub home_team: String,
    pub away_team: String,
    pub scheduled_start: DateTime<Utc>,
}

/// Plan `count` fresh upcoming fixtures from the known team names.
///
/// The `i`-th fixture starts `i` minutes after `now`, so starts are strictly
/// increasing. Home and away are always two different teams; duplicate and
/// blank names in `teams` are ignored.
pub fn plan_batch<R: Rng + ?Sized>(
    teams: &[String],
    count: usize,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Vec<NewFixture>, RegenerationError> {
    let mut pool: Vec<&str> = teams
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    pool.sort_unstable();
    pool.dedup();

    if pool.len() < 2 {
        return Err(RegenerationError::NotEnoughTeams(pool.len()));
    }

    let batch = (0..count)
        .map(|i| {
            let pair: Vec<&str> = pool.choose_multiple(rng, 2).copied().collect();
            NewFixture {
                home_team: pair[0].to_string(),
                away_team: pair[1].to_string(),
                scheduled_start: now + TimeDelta::minutes(i as i64 * START_STAGGER_MINUTES),
            }
        })
        .collect();
    tracing::debug!("Planned {} fixtures from {} teams", count, pool.len());
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn teams(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn batch_pairs_distinct_teams_with_staggered_starts() {
        let mut rng = StdRng::seed_from_u64(11);
        let now = Utc::now();
        let batch = plan_batch(&teams(&["Lions", "Cranes", "Eagles"]), 40, now, &mut rng).unwrap();

        assert_eq!(batch.len(), 40);
        for (i, fixture) in batch.iter().enumerate() {
            assert_ne!(fixture.home_team, fixture.away_team);
            assert_eq!(fixture.scheduled_start, now + TimeDelta::minutes(i as i64));
        }
        assert!(batch.windows(2).all(|w| w[0].scheduled_start < w[1].scheduled_start));
    }

    #[test]
    fn duplicate_names_do_not_count_as_opponents() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = plan_batch(&teams(&["Lions", "Lions", " "]), 2, Utc::now(), &mut rng).unwrap_err();
        assert_eq!(err, RegenerationError::NotEnoughTeams(1));
    }

    #[test]
    fn due_only_when_upcoming_and_started() {
        let now = Utc::now();
        let mut fixture = Fixture {
            id: FixtureId(1),
            home_team: "Lions".into(),
            away_team: "Cranes".into(),
            scheduled_start: now,
            status: FixtureStatus::Upcoming,
        };
        assert!(fixture.is_due(now));
        assert!(!fixture.is_due(now - TimeDelta::seconds(1)));

        fixture.status = FixtureStatus::InProgress;
        assert!(!fixture.is_due(now));
    }

    #[test]
    fn status_labels_round_trip() {
        for status in [
            FixtureStatus::Upcoming,
            FixtureStatus::InProgress,
            FixtureStatus::Completed,
        ] {
            assert_eq!(FixtureStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(FixtureStatus::parse("Half-Time"), None);
    }
}
