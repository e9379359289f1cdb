//! Per-fixture state machine.
//!
//! Each fixture runs on its own tokio task and walks the fixed phase sequence
//! `FirstHalf -> HalfTime -> SecondHalf -> ExtraTime -> FullTime -> Completed`.
//! During the halves a periodic clock ticks the [`MatchClock`]; each tick is
//! persisted and may produce an event. Ticks of one fixture are strictly
//! sequential because the runner awaits each tick's work before the next.
//!
//! Failures never escape a runner: persistence errors are logged and the live
//! state moves on, generator errors mean "no event this tick".

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use tokio::time::{Instant, MissedTickBehavior};

use matchday_engine::{ClockSignal, Fixture, FixtureStatus, MatchClock, Phase};

use crate::cycle::CycleCounters;
use crate::event_bus::MatchUpdate;
use crate::persistence::PersistenceResult;
use crate::shutdown::Shutdown;
use crate::simulation::SimContext;

/// How a runner ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerExit {
    /// Reached `Completed`.
    Completed,
    /// Stopped by a shutdown request before completion.
    Stopped,
}

/// Simulate one fixture from kick-off to `Completed`.
pub async fn run(
    ctx: Arc<SimContext>,
    counters: Arc<CycleCounters>,
    fixture: Fixture,
    shutdown: Shutdown,
) -> RunnerExit {
    let rng = ctx.rng(fixture.id.0 as u64);
    let clock = MatchClock::new(ctx.config.match_duration);
    let mut runner = MatchRunner {
        ctx,
        counters,
        fixture,
        clock,
        phase: Phase::NotStarted,
        rng,
        shutdown,
    };

    runner.ctx.metrics.fixture_started();
    let exit = runner.play().await;
    runner.ctx.metrics.fixture_finished(exit == RunnerExit::Completed);
    if exit == RunnerExit::Stopped {
        tracing::info!("Fixture {} stopped during {}", runner.fixture.id, runner.phase.label());
    }
    exit
}

struct MatchRunner {
    ctx: Arc<SimContext>,
    counters: Arc<CycleCounters>,
    fixture: Fixture,
    clock: MatchClock,
    phase: Phase,
    rng: StdRng,
    shutdown: Shutdown,
}

impl MatchRunner {
    async fn play(&mut self) -> RunnerExit {
        let id = self.fixture.id;
        let result = self.ctx.gateway.set_fixture_status(id, FixtureStatus::InProgress).await;
        self.persisted(result, "status");
        self.ctx
            .store
            .begin(id, &self.fixture.home_team, &self.fixture.away_team);

        self.enter(Phase::FirstHalf).await;
        if !self.run_clock().await {
            return RunnerExit::Stopped;
        }

        self.enter(Phase::HalfTime).await;
        if !self.pause(self.ctx.config.break_interval()).await {
            return RunnerExit::Stopped;
        }

        self.enter(Phase::SecondHalf).await;
        if !self.run_clock().await {
            return RunnerExit::Stopped;
        }

        self.enter(Phase::ExtraTime).await;
        if !self.pause(self.ctx.config.extra_time()).await {
            return RunnerExit::Stopped;
        }

        self.enter(Phase::FullTime).await;
        let result = self.ctx.gateway.set_fixture_status(id, FixtureStatus::Completed).await;
        self.persisted(result, "status");
        self.counters.mark_completed();

        self.enter(Phase::Completed).await;
        RunnerExit::Completed
    }

    /// Tick until the clock reports the end of the current half. Returns
    /// `false` if a stop was requested first.
    async fn run_clock(&mut self) -> bool {
        let period = self.ctx.config.tick();
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        // A late wake-up shifts the schedule instead of bursting ticks.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.requested() => return false,
                _ = interval.tick() => {}
            }

            let started = std::time::Instant::now();
            let (elapsed, signal) = self.clock.tick();
            self.on_tick(elapsed).await;
            self.ctx.metrics.record_tick(started.elapsed());

            if signal != ClockSignal::Running {
                return true;
            }
        }
    }

    /// Wait out a break. Returns `false` if a stop was requested first.
    async fn pause(&mut self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.shutdown.requested() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    async fn on_tick(&mut self, elapsed: u32) {
        let id = self.fixture.id;
        self.ctx.store.advance_clock(id, elapsed);
        let result = self.ctx.gateway.set_fixture_elapsed(id, elapsed).await;
        self.persisted(result, "elapsed time");
        self.maybe_generate(elapsed).await;
    }

    /// One Bernoulli trial per tick. Goal candidates also need a free slot
    /// under the per-fixture cap; other candidates are never gated.
    async fn maybe_generate(&mut self, elapsed: u32) {
        if !self.rng.gen_bool(self.ctx.config.event_probability) {
            return;
        }

        let id = self.fixture.id;
        let event = match self.ctx.generator.generate(id, elapsed) {
            Ok(event) => event,
            Err(e) => {
                self.ctx.metrics.generator_miss();
                tracing::debug!("Fixture {}: no event at {} ({})", id, elapsed, e);
                return;
            }
        };

        if event.kind.is_goal() && !self.counters.try_claim_goal(id, self.ctx.config.max_goals) {
            self.ctx.metrics.goal_suppressed();
            tracing::debug!("Fixture {}: goal at {} suppressed, cap reached", id, elapsed);
            return;
        }

        self.ctx.store.record_event(id, event.clone());
        let result = self.ctx.gateway.append_fixture_event(id, &event).await;
        self.persisted(result, "event");
        self.ctx.metrics.event_accepted(event.kind);

        tracing::debug!(
            "Fixture {}: {} for {} by {} at {}",
            id,
            event.kind.as_str(),
            event.team.as_str(),
            event.player,
            event.minute
        );
        self.ctx.broadcast.publish(MatchUpdate::Event { fixture: id, event });
    }

    async fn enter(&mut self, phase: Phase) {
        debug_assert_eq!(self.phase.next(), Some(phase), "phase transition out of order");
        self.phase = phase;

        let id = self.fixture.id;
        self.ctx.store.set_phase(id, phase);
        let result = self.ctx.gateway.set_fixture_phase(id, phase).await;
        self.persisted(result, "phase");

        self.ctx.broadcast.publish(MatchUpdate::Phase {
            fixture: id,
            phase,
            elapsed: self.clock.elapsed(),
        });
        if let Some(message) = announcement(&self.fixture, phase) {
            self.ctx.notifier.notify(&message);
        }

        tracing::info!(
            "Fixture {} ({} vs {}): {} at {}",
            id,
            self.fixture.home_team,
            self.fixture.away_team,
            phase.label(),
            self.clock.elapsed()
        );
    }

    fn persisted(&self, result: PersistenceResult<()>, what: &str) {
        if let Err(e) = result {
            self.ctx.metrics.persistence_failed();
            tracing::warn!("Fixture {}: failed to persist {}: {}", self.fixture.id, what, e);
        }
    }
}

/// Admin message for a phase change; `Completed` is internal and silent.
fn announcement(fixture: &Fixture, phase: Phase) -> Option<String> {
    let what = match phase {
        Phase::FirstHalf => "has started (1st Half)",
        Phase::HalfTime => "reached Half-Time",
        Phase::SecondHalf => "has resumed (2nd Half)",
        Phase::ExtraTime => "entered Extra Time",
        Phase::FullTime => "has ended (Full Time)",
        Phase::NotStarted | Phase::Completed => return None,
    };
    Some(format!(
        "Match {} ({} vs {}) {}",
        fixture.id, fixture.home_team, fixture.away_team, what
    ))
}
