use std::collections::BTreeSet;
use std::path::Path;

use pit_schemas::{AdjustmentCategory, RawAdjustmentRecord, Sid};
use rusqlite::{params, params_from_iter, Connection, OpenFlags};

use crate::error::StoreError;

/// SQLite's compiled-in default for `SQLITE_MAX_VARIABLE_NUMBER`.
pub const SQLITE_MAX_VARIABLE_NUMBER: usize = 999;

/// Bound parameters every range fetch spends on `[start_date, end_date]`.
pub const RANGE_PARAMS: usize = 2;

// ---------------------------------------------------------------------------
// Store contract
// ---------------------------------------------------------------------------

/// Queryable source of raw corporate-action rows.
///
/// Dates are epoch seconds; both bounds are inclusive.
pub trait AdjustmentStore {
    /// Maximum number of bound parameters accepted by one statement.
    fn max_bound_params(&self) -> usize;

    /// Sids with at least one `category` row in `[start_date, end_date]`.
    fn distinct_sids(
        &self,
        category: AdjustmentCategory,
        start_date: i64,
        end_date: i64,
    ) -> Result<BTreeSet<Sid>, StoreError>;

    /// Rows for exactly `sids` in `[start_date, end_date]`, ordered by `(sid, effective_date)`.
    ///
    /// One statement. Callers keep `sids.len() + RANGE_PARAMS <= max_bound_params()`.
    fn fetch_range(
        &self,
        category: AdjustmentCategory,
        sids: &[Sid],
        start_date: i64,
        end_date: i64,
    ) -> Result<Vec<RawAdjustmentRecord>, StoreError>;
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

/// Adjustment store backed by one SQLite connection.
///
/// Expects `splits`, `mergers` and `dividends` tables with
/// `(sid INTEGER, ratio REAL, effective_date INTEGER)` columns.
pub struct SqliteAdjustmentStore {
    conn: Connection,
    max_bound_params: usize,
}

impl SqliteAdjustmentStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn))
    }

    /// Open without write access. Loading never writes.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            max_bound_params: SQLITE_MAX_VARIABLE_NUMBER,
        }
    }

    /// Override the parameter budget (e.g. for a build with a raised variable limit).
    pub fn with_max_bound_params(mut self, max_bound_params: usize) -> Self {
        self.max_bound_params = max_bound_params;
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl AdjustmentStore for SqliteAdjustmentStore {
    fn max_bound_params(&self) -> usize {
        self.max_bound_params
    }

    fn distinct_sids(
        &self,
        category: AdjustmentCategory,
        start_date: i64,
        end_date: i64,
    ) -> Result<BTreeSet<Sid>, StoreError> {
        let sql = format!(
            "SELECT DISTINCT sid FROM {} WHERE effective_date >= ?1 AND effective_date <= ?2",
            category.table_name()
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![start_date, end_date], |row| row.get::<_, Sid>(0))?;

        let mut out = BTreeSet::new();
        for sid in rows {
            out.insert(sid?);
        }
        Ok(out)
    }

    fn fetch_range(
        &self,
        category: AdjustmentCategory,
        sids: &[Sid],
        start_date: i64,
        end_date: i64,
    ) -> Result<Vec<RawAdjustmentRecord>, StoreError> {
        if sids.is_empty() {
            return Ok(Vec::new());
        }

        // Same chunk size => same SQL text => same cached statement.
        let sql = format!(
            "SELECT sid, ratio, effective_date FROM {} \
             WHERE sid IN ({}) AND effective_date >= ? AND effective_date <= ? \
             ORDER BY sid ASC, effective_date ASC",
            category.table_name(),
            placeholders(sids.len())
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let binds = sids.iter().copied().chain([start_date, end_date]);
        let rows = stmt.query_map(params_from_iter(binds), |row| {
            Ok(RawAdjustmentRecord {
                sid: row.get(0)?,
                ratio: row.get(1)?,
                effective_date: row.get(2)?,
            })
        })?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }
}

fn placeholders(n: usize) -> String {
    let mut s = String::with_capacity(n * 2);
    for i in 0..n {
        if i > 0 {
            s.push(',');
        }
        s.push('?');
    }
    s
}
