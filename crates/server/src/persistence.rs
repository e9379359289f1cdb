//! Durable fixture storage.
//!
//! [`PersistenceGateway`] is everything the simulation needs from the
//! database. [`SqliteGateway`] implements it on a single SQLite connection
//! behind a mutex. Statements run on tokio's blocking pool; the lock is taken
//! there and never held across an `.await`.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

use matchday_engine::{EventKind, Fixture, FixtureId, FixtureStatus, MatchEvent, NewFixture, Phase, Side};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("database connection poisoned")]
    Poisoned,

    #[error("database task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Storage operations used by the scheduler, the fixture runners and the
/// dashboard.
#[async_trait]
pub trait PersistenceGateway: Send + Sync + 'static {
    /// Up to `limit` upcoming fixtures scheduled at or before `now`, earliest first.
    async fn find_due_fixtures(&self, limit: usize, now: DateTime<Utc>) -> PersistenceResult<Vec<Fixture>>;

    async fn fixture(&self, id: FixtureId) -> PersistenceResult<Option<Fixture>>;

    async fn set_fixture_status(&self, id: FixtureId, status: FixtureStatus) -> PersistenceResult<()>;

    async fn set_fixture_phase(&self, id: FixtureId, phase: Phase) -> PersistenceResult<()>;

    async fn set_fixture_elapsed(&self, id: FixtureId, elapsed: u32) -> PersistenceResult<()>;

    async fn append_fixture_event(&self, id: FixtureId, event: &MatchEvent) -> PersistenceResult<()>;

    /// Recorded events of a fixture in insertion order.
    async fn list_fixture_events(&self, id: FixtureId) -> PersistenceResult<Vec<MatchEvent>>;

    /// Distinct team names, sorted.
    async fn list_distinct_teams(&self) -> PersistenceResult<Vec<String>>;

    /// Insert a batch atomically and return the new ids in batch order.
    async fn insert_fixtures(&self, fixtures: &[NewFixture]) -> PersistenceResult<Vec<FixtureId>>;

    async fn count_upcoming(&self) -> PersistenceResult<usize>;

    /// Register team names, ignoring ones already known. Returns how many were new.
    async fn insert_teams(&self, teams: &[&str]) -> PersistenceResult<usize>;
}

// ── SQLite implementation ───────────────────────────────────────────────────

pub struct SqliteGateway {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGateway {
    /// Open or create a database file.
    pub fn open(path: &Path) -> PersistenceResult<Self> {
        let conn = Connection::open(path)?;
        // WAL lets external readers (the CRUD layer) query while ticks write.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn)
    }

    /// Private in-memory database (tests, dry runs).
    pub fn open_in_memory() -> PersistenceResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> PersistenceResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS teams (
                name TEXT PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS fixtures (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                home_team TEXT NOT NULL,
                away_team TEXT NOT NULL,
                scheduled_start INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'upcoming',
                phase TEXT NOT NULL DEFAULT 'not_started',
                elapsed INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS fixture_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fixture_id INTEGER NOT NULL REFERENCES fixtures(id),
                kind TEXT NOT NULL,
                team TEXT NOT NULL,
                player TEXT NOT NULL,
                minute INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_fixtures_due ON fixtures(status, scheduled_start);
            CREATE INDEX IF NOT EXISTS idx_fixture_events_fixture ON fixture_events(fixture_id);
            "#,
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `work` against the connection on the blocking pool, so a busy
    /// database never parks a runtime worker.
    async fn with_conn<T, F>(&self, work: F) -> PersistenceResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> PersistenceResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| PersistenceError::Poisoned)?;
            work(&mut *guard)
        })
        .await?
    }
}

const FIXTURE_COLUMNS: &str = "id, home_team, away_team, scheduled_start, status";

fn fixture_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, i64, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn decode_fixture(
    (id, home_team, away_team, start_ms, status): (i64, String, String, i64, String),
) -> PersistenceResult<Fixture> {
    let scheduled_start = DateTime::from_timestamp_millis(start_ms)
        .ok_or_else(|| PersistenceError::Corrupt(format!("fixture {id}: start {start_ms} out of range")))?;
    let status = FixtureStatus::parse(&status)
        .ok_or_else(|| PersistenceError::Corrupt(format!("fixture {id}: unknown status {status:?}")))?;
    Ok(Fixture {
        id: FixtureId(id),
        home_team,
        away_team,
        scheduled_start,
        status,
    })
}

fn decode_event(
    (kind, team, player, minute): (String, String, String, i64),
) -> PersistenceResult<MatchEvent> {
    let kind = EventKind::parse(&kind).ok_or_else(|| PersistenceError::Corrupt(format!("event kind {kind:?}")))?;
    let team = Side::parse(&team).ok_or_else(|| PersistenceError::Corrupt(format!("event team {team:?}")))?;
    let minute = u32::try_from(minute).map_err(|_| PersistenceError::Corrupt(format!("event minute {minute}")))?;
    Ok(MatchEvent::new(kind, team, player, minute))
}

#[async_trait]
impl PersistenceGateway for SqliteGateway {
    async fn find_due_fixtures(&self, limit: usize, now: DateTime<Utc>) -> PersistenceResult<Vec<Fixture>> {
        let now_ms = now.timestamp_millis();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {FIXTURE_COLUMNS} FROM fixtures
                 WHERE status = 'upcoming' AND scheduled_start <= ?1
                 ORDER BY scheduled_start ASC, id ASC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![now_ms, limit as i64], fixture_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(decode_fixture).collect()
        })
        .await
    }

    async fn fixture(&self, id: FixtureId) -> PersistenceResult<Option<Fixture>> {
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {FIXTURE_COLUMNS} FROM fixtures WHERE id = ?1"),
                    params![id.0],
                    fixture_from_row,
                )
                .optional()?;
            row.map(decode_fixture).transpose()
        })
        .await
    }

    async fn set_fixture_status(&self, id: FixtureId, status: FixtureStatus) -> PersistenceResult<()> {
        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE fixtures SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id.0],
            )?;
            Ok(())
        })
        .await
    }

    async fn set_fixture_phase(&self, id: FixtureId, phase: Phase) -> PersistenceResult<()> {
        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE fixtures SET phase = ?1 WHERE id = ?2",
                params![phase.as_str(), id.0],
            )?;
            Ok(())
        })
        .await
    }

    async fn set_fixture_elapsed(&self, id: FixtureId, elapsed: u32) -> PersistenceResult<()> {
        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE fixtures SET elapsed = ?1 WHERE id = ?2",
                params![elapsed, id.0],
            )?;
            Ok(())
        })
        .await
    }

    async fn append_fixture_event(&self, id: FixtureId, event: &MatchEvent) -> PersistenceResult<()> {
        let event = event.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO fixture_events (fixture_id, kind, team, player, minute) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id.0, event.kind.as_str(), event.team.as_str(), event.player, event.minute],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_fixture_events(&self, id: FixtureId) -> PersistenceResult<Vec<MatchEvent>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT kind, team, player, minute FROM fixture_events WHERE fixture_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt
                .query_map(params![id.0], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(decode_event).collect()
        })
        .await
    }

    async fn list_distinct_teams(&self) -> PersistenceResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT DISTINCT name FROM teams ORDER BY name ASC")?;
            let teams = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(teams)
        })
        .await
    }

    async fn insert_fixtures(&self, fixtures: &[NewFixture]) -> PersistenceResult<Vec<FixtureId>> {
        let fixtures = fixtures.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let mut ids = Vec::with_capacity(fixtures.len());
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO fixtures (home_team, away_team, scheduled_start, status) VALUES (?1, ?2, ?3, 'upcoming')",
                )?;
                for fixture in &fixtures {
                    stmt.execute(params![
                        fixture.home_team,
                        fixture.away_team,
                        fixture.scheduled_start.timestamp_millis(),
                    ])?;
                    ids.push(FixtureId(tx.last_insert_rowid()));
                }
            }
            tx.commit()?;
            Ok(ids)
        })
        .await
    }

    async fn count_upcoming(&self) -> PersistenceResult<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM fixtures WHERE status = 'upcoming'",
                [],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
        .await
    }

    async fn insert_teams(&self, teams: &[&str]) -> PersistenceResult<usize> {
        let teams: Vec<String> = teams.iter().map(|t| t.to_string()).collect();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let mut added = 0;
            {
                let mut stmt = tx.prepare("INSERT OR IGNORE INTO teams (name) VALUES (?1)")?;
                for team in &teams {
                    added += stmt.execute(params![team])?;
                }
            }
            tx.commit()?;
            Ok(added)
        })
        .await
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
