//! First-run seeding so an empty database still has something to simulate.

use anyhow::Context;
use chrono::Utc;

use crate::scheduler;
use crate::simulation::SimContext;

pub const DEFAULT_TEAMS: [&str; 16] = [
    "Arua Hill", "Bright Stars", "BUL", "Busoga United", "Express", "Gaddafi", "KCCA", "Kitara",
    "Maroons", "Mbarara City", "NEC", "Police", "SC Villa", "Soltilo Bright", "UPDF", "Vipers",
];

/// What [`ensure_fixture_pool`] had to add.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Seeded {
    pub teams: usize,
    pub fixtures: usize,
}

/// Seed the default roster when no teams exist, and plan a first batch when
/// no fixture is upcoming.
pub async fn ensure_fixture_pool(ctx: &SimContext) -> anyhow::Result<Seeded> {
    let mut seeded = Seeded::default();

    let teams = ctx.gateway.list_distinct_teams().await.context("listing teams")?;
    if teams.is_empty() {
        seeded.teams = ctx
            .gateway
            .insert_teams(&DEFAULT_TEAMS)
            .await
            .context("seeding default teams")?;
        tracing::info!("Seeded {} default teams", seeded.teams);
    }

    let upcoming = ctx.gateway.count_upcoming().await.context("counting upcoming fixtures")?;
    if upcoming == 0 {
        let mut rng = ctx.rng(0);
        seeded.fixtures = scheduler::regenerate(ctx, Utc::now(), &mut rng).await?.len();
    } else {
        tracing::info!("{} upcoming fixtures already scheduled", upcoming);
    }

    Ok(seeded)
}
