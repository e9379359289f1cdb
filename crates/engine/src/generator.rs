//! Candidate event generation.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::GeneratorError;
use crate::fixture::FixtureId;
use crate::live::event::{EventKind, MatchEvent, Side};

/// Produces a candidate event for a fixture at a given clock value.
///
/// The simulation decides separately whether to ask (the per-tick trial) and
/// whether to accept (the goal cap); a generator only proposes.
pub trait EventGenerator: Send + Sync + 'static {
    fn generate(&self, fixture: FixtureId, elapsed: u32) -> Result<MatchEvent, GeneratorError>;
}

/// Relative likelihood of each kind of candidate.
static KIND_WEIGHTS: [(EventKind, u32); 8] = [
    (EventKind::Goal, 20),
    (EventKind::YellowCard, 16),
    (EventKind::RedCard, 3),
    (EventKind::Substitution, 12),
    (EventKind::Corner, 20),
    (EventKind::Foul, 18),
    (EventKind::Offside, 9),
    (EventKind::PenaltyMiss, 2),
];

static SURNAMES: [&str; 16] = [
    "Okello", "Mutebi", "Kizito", "Nsubuga", "Onyango", "Wasswa", "Achieng", "Mugisha",
    "Otieno", "Byaruhanga", "Ssekitoleko", "Kato", "Namanya", "Lubega", "Odhiambo", "Tumusiime",
];

/// Weighted random generator. Player names are drawn from a fixed pool with a
/// squad number, e.g. `"Kizito #9"`.
pub struct RandomEventGenerator {
    rng: Mutex<StdRng>,
}

impl RandomEventGenerator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomEventGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl EventGenerator for RandomEventGenerator {
    fn generate(&self, _fixture: FixtureId, elapsed: u32) -> Result<MatchEvent, GeneratorError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| GeneratorError::Unavailable("rng lock poisoned".into()))?;

        let (kind, _) = KIND_WEIGHTS
            .choose_weighted(&mut *rng, |(_, weight)| *weight)
            .map_err(|e| GeneratorError::Unavailable(e.to_string()))?;
        let team = if rng.gen_bool(0.5) { Side::Home } else { Side::Away };
        let surname = SURNAMES.choose(&mut *rng).copied().unwrap_or("Unknown");
        let number: u8 = rng.gen_range(1..=23);

        Ok(MatchEvent::new(*kind, team, format!("{surname} #{number}"), elapsed))
    }
}
