//! Simulation cycle scheduler.
//!
//! Runs forever: wait out the quiescence delay, pick up due fixtures, run one
//! [`match_runner`] task per fixture, wait for the whole batch, then plan and
//! insert the next batch. An empty discovery pass just loops back to the
//! wait; a failed one is logged and retried on the next pass.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use tokio::task::JoinSet;

use matchday_engine::fixture::plan_batch;
use matchday_engine::FixtureId;

use crate::cycle::CycleCounters;
use crate::match_runner::{self, RunnerExit};
use crate::shutdown::Shutdown;
use crate::simulation::SimContext;

/// Random stream reserved for fixture regeneration; fixture runners use
/// their fixture id as stream number.
const REGENERATION_STREAM: u64 = u64::MAX;

/// Outcome of one full cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub launched: usize,
    /// Fixtures that reached full time (the shared completion counter).
    pub completed: usize,
    /// Runner tasks that died without reporting.
    pub faulted: usize,
    /// Ids of the regenerated fixtures. Empty when the cycle was interrupted.
    pub inserted: Vec<FixtureId>,
}

pub struct CycleScheduler {
    ctx: Arc<SimContext>,
    counters: Arc<CycleCounters>,
    shutdown: Shutdown,
    rng: StdRng,
}

impl CycleScheduler {
    pub fn new(ctx: Arc<SimContext>, shutdown: Shutdown) -> Self {
        let rng = ctx.rng(REGENERATION_STREAM);
        Self {
            ctx,
            counters: Arc::new(CycleCounters::new()),
            shutdown,
            rng,
        }
    }

    pub fn counters(&self) -> Arc<CycleCounters> {
        Arc::clone(&self.counters)
    }

    /// Loop until shutdown.
    pub async fn run(mut self) {
        let delay = self.ctx.config.startup_delay();
        tracing::info!(
            "Cycle scheduler started (batch size {}, startup delay {:?})",
            self.ctx.config.batch_size,
            delay
        );

        loop {
            tracing::debug!("Waiting {:?} before the next discovery pass", delay);
            tokio::select! {
                biased;
                _ = self.shutdown.requested() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            match self.run_cycle().await {
                Ok(None) => tracing::info!("No fixtures ready to simulate"),
                Ok(Some(report)) => tracing::info!(
                    "Cycle finished: {}/{} fixtures completed, {} faulted, {} new fixtures",
                    report.completed,
                    report.launched,
                    report.faulted,
                    report.inserted.len()
                ),
                Err(e) => tracing::error!("Simulation cycle failed: {:#}", e),
            }

            if self.shutdown.is_requested() {
                break;
            }
        }

        tracing::info!("Cycle scheduler stopped");
    }

    /// One discovery -> simulate -> regenerate pass. `Ok(None)` when nothing
    /// was due.
    pub async fn run_cycle(&mut self) -> anyhow::Result<Option<CycleReport>> {
        let now = Utc::now();
        let due = self
            .ctx
            .gateway
            .find_due_fixtures(self.ctx.config.batch_size, now)
            .await
            .context("discovering due fixtures")?;
        if due.is_empty() {
            return Ok(None);
        }
        debug_assert!(due.iter().all(|f| f.is_due(now)));

        let launched = due.len();
        tracing::info!("Starting simulations for {} fixtures", launched);
        self.counters.reset(due.iter().map(|f| f.id));

        let mut runners = JoinSet::new();
        let mut tasks = HashMap::with_capacity(launched);
        for fixture in due {
            let id = fixture.id;
            let handle = runners.spawn(match_runner::run(
                Arc::clone(&self.ctx),
                Arc::clone(&self.counters),
                fixture,
                self.shutdown.clone(),
            ));
            tasks.insert(handle.id(), id);
        }

        // A panicking runner surfaces here as a JoinError and is absorbed;
        // the rest of the batch keeps going. Its live entry is abandoned so
        // eviction still reclaims it.
        let mut faulted = 0;
        let mut stopped = 0;
        while let Some(joined) = runners.join_next().await {
            match joined {
                Ok(RunnerExit::Completed) => {}
                Ok(RunnerExit::Stopped) => stopped += 1,
                Err(e) => {
                    faulted += 1;
                    self.ctx.metrics.fixture_faulted();
                    match tasks.get(&e.id()) {
                        Some(&id) => {
                            self.ctx.store.abandon(id);
                            tracing::error!("Runner for fixture {} failed: {}", id, e);
                        }
                        None => tracing::error!("Fixture runner failed: {}", e),
                    }
                }
            }
        }

        let completed = self.counters.completed();
        if stopped > 0 || self.shutdown.is_requested() {
            tracing::info!("Cycle interrupted: {} fixtures stopped before full time", stopped);
            return Ok(Some(CycleReport {
                launched,
                completed,
                faulted,
                inserted: Vec::new(),
            }));
        }
        if completed < launched {
            tracing::warn!("Only {} of {} fixtures reached full time", completed, launched);
        }

        let inserted = regenerate(&self.ctx, Utc::now(), &mut self.rng)
            .await
            .context("regenerating fixtures")?;
        self.ctx.metrics.cycle_completed();

        Ok(Some(CycleReport {
            launched,
            completed,
            faulted,
            inserted,
        }))
    }
}

/// Plan `batch_size` fresh fixtures from the known teams and persist them.
pub async fn regenerate<R: Rng + Send>(
    ctx: &SimContext,
    now: DateTime<Utc>,
    rng: &mut R,
) -> anyhow::Result<Vec<FixtureId>> {
    let teams = ctx
        .gateway
        .list_distinct_teams()
        .await
        .context("listing teams")?;
    let batch = plan_batch(&teams, ctx.config.batch_size, now, rng)?;
    let ids = ctx
        .gateway
        .insert_fixtures(&batch)
        .await
        .context("inserting fixtures")?;
    tracing::info!("Inserted {} new upcoming fixtures", ids.len());
    Ok(ids)
}
