//! Runtime-agnostic core of the match simulator.
//!
//! Everything in here is synchronous and free of I/O: fixture and event
//! types, the phase sequence and its tick-driven clock, the live state cache,
//! and the random event policy. The async runtime, persistence and delivery
//! to viewers live in `matchday-server`.

pub mod config;
pub mod error;
pub mod fixture;
pub mod generator;
pub mod live;
pub mod phase;

pub use config::SimulationConfig;
pub use error::{ConfigError, GeneratorError, RegenerationError, ValidationError};
pub use fixture::{Fixture, FixtureId, FixtureStatus, NewFixture};
pub use generator::{EventGenerator, RandomEventGenerator};
pub use live::event::{EventKind, MatchEvent, Side};
pub use live::state::{MatchState, Score, StateOverride};
pub use live::LiveStore;
pub use phase::{ClockSignal, MatchClock, Phase};
