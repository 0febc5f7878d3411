//! Test fixtures: minimal adjustment tables and row inserts.
//!
//! Available under `cfg(test)` and the `testkit` feature only.

use pit_schemas::{AdjustmentCategory, RawAdjustmentRecord};
use rusqlite::{params, Connection};

use crate::error::StoreError;

/// Create the three adjustment tables (idempotent).
pub fn create_adjustment_tables(conn: &Connection) -> Result<(), StoreError> {
    for category in AdjustmentCategory::ALL {
        let table = category.table_name();
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                sid INTEGER NOT NULL,
                ratio REAL NOT NULL,
                effective_date INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS {table}_sid ON {table}(sid);
            CREATE INDEX IF NOT EXISTS {table}_effective_date ON {table}(effective_date);"
        ))?;
    }
    Ok(())
}

/// Insert rows into `category`'s table in one transaction.
pub fn insert_adjustments(
    conn: &Connection,
    category: AdjustmentCategory,
    records: &[RawAdjustmentRecord],
) -> Result<(), StoreError> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare_cached(&format!(
            "INSERT INTO {} (sid, ratio, effective_date) VALUES (?1, ?2, ?3)",
            category.table_name()
        ))?;
        for r in records {
            stmt.execute(params![r.sid, r.ratio, r.effective_date])?;
        }
    }
    tx.commit()?;
    Ok(())
}
