//! pit-testkit
//!
//! Fixtures shared by the cross-crate scenario tests: seeded SQLite stores on
//! temp directories, daily session axes, and the config-to-loader wiring.

use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::{Context, Result};
use ndarray::Array2;
use pit_adjustments::{AdjustmentAssembler, LoadFlags, LoadedAdjustments};
use pit_config::LoaderSettings;
use pit_db::fixtures::{create_adjustment_tables, insert_adjustments};
use pit_db::SqliteAdjustmentStore;
use pit_schemas::{AdjustmentCategory, RawAdjustmentRecord, RequestAxes, Sid};
use pit_window::{AdjustedArray, AdjustedArrayWindow};
use rusqlite::Connection;
use tempfile::TempDir;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// One session, in epoch seconds.
pub const DAY: i64 = 86_400;

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per process. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        // Another harness may already own the global subscriber; that is fine.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// `n` consecutive daily sessions starting at epoch day `first_day`.
pub fn daily_sessions(first_day: i64, n: usize) -> Vec<i64> {
    (0..n as i64).map(|i| (first_day + i) * DAY).collect()
}

/// Daily axis over `n` sessions from epoch day 0 and the given assets.
pub fn daily_axes(n: usize, assets: &[Sid]) -> Result<RequestAxes> {
    RequestAxes::new(daily_sessions(0, n), assets.to_vec()).context("build daily axes")
}

/// Rows to seed, grouped by category.
#[derive(Clone, Debug, Default)]
pub struct Seed {
    pub splits: Vec<RawAdjustmentRecord>,
    pub mergers: Vec<RawAdjustmentRecord>,
    pub dividends: Vec<RawAdjustmentRecord>,
}

impl Seed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn split(mut self, sid: Sid, ratio: f64, effective_date: i64) -> Self {
        self.splits
            .push(RawAdjustmentRecord::new(sid, ratio, effective_date));
        self
    }

    pub fn merger(mut self, sid: Sid, ratio: f64, effective_date: i64) -> Self {
        self.mergers
            .push(RawAdjustmentRecord::new(sid, ratio, effective_date));
        self
    }

    pub fn dividend(mut self, sid: Sid, ratio: f64, effective_date: i64) -> Self {
        self.dividends
            .push(RawAdjustmentRecord::new(sid, ratio, effective_date));
        self
    }

    fn write(&self, conn: &Connection) -> Result<()> {
        create_adjustment_tables(conn).context("create adjustment tables")?;
        for (category, rows) in [
            (AdjustmentCategory::Split, &self.splits),
            (AdjustmentCategory::Merger, &self.mergers),
            (AdjustmentCategory::Dividend, &self.dividends),
        ] {
            insert_adjustments(conn, category, rows)
                .with_context(|| format!("seed {category} rows"))?;
        }
        Ok(())
    }
}

/// A seeded database file that lives as long as this value.
pub struct SeededDb {
    _dir: TempDir,
    path: PathBuf,
}

impl SeededDb {
    pub fn create(seed: &Seed) -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp dir")?;
        let path = dir.path().join("adjustments.sqlite");
        let conn = Connection::open(&path).context("open fixture db")?;
        seed.write(&conn)?;
        Ok(Self { _dir: dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open_read_only(&self) -> Result<SqliteAdjustmentStore> {
        SqliteAdjustmentStore::open_read_only(&self.path).context("open fixture db read-only")
    }
}

/// Seeded in-memory store.
pub fn memory_store(seed: &Seed) -> Result<SqliteAdjustmentStore> {
    let conn = Connection::open_in_memory().context("open in-memory db")?;
    seed.write(&conn)?;
    Ok(SqliteAdjustmentStore::from_connection(conn))
}

/// Open the store named by `settings.store`.
pub fn open_store(settings: &LoaderSettings) -> Result<SqliteAdjustmentStore> {
    let store = if settings.store.read_only {
        SqliteAdjustmentStore::open_read_only(&settings.store.path)
    } else {
        SqliteAdjustmentStore::open(&settings.store.path)
    }
    .with_context(|| format!("open adjustment store: {}", settings.store.path))?;
    Ok(store.with_max_bound_params(settings.store.max_bound_params))
}

pub fn load_flags(settings: &LoaderSettings) -> LoadFlags {
    LoadFlags {
        include_splits: settings.include_splits,
        include_mergers: settings.include_mergers,
        include_dividends: settings.include_dividends,
        scope: settings.scope,
    }
}

/// Open the configured store and load schedules for `axes`.
pub fn load_from_settings(
    settings: &LoaderSettings,
    axes: &RequestAxes,
) -> Result<LoadedAdjustments> {
    let store = open_store(settings)?;
    info!(
        path = %settings.store.path,
        scope = settings.scope.as_str(),
        sessions = axes.num_dates(),
        assets = axes.num_assets(),
        "testkit/load_from_settings"
    );
    AdjustmentAssembler::new(&store)
        .assemble(axes, &load_flags(settings))
        .context("assemble adjustments")
}

/// Window over `baseline` driven by the price schedule of `loaded`.
pub fn price_window(
    baseline: Array2<f64>,
    loaded: &LoadedAdjustments,
    window_length: usize,
) -> Result<AdjustedArrayWindow<f64>> {
    let schedule = loaded
        .price
        .clone()
        .context("load did not produce a price schedule")?;
    let array = AdjustedArray::new(baseline, schedule).context("build adjusted array")?;
    array
        .into_window(window_length)
        .context("open price window")
}
