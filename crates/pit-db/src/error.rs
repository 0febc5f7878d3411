use std::fmt;

/// Errors surfaced by an adjustment store or the query drivers on top of it.
///
/// Backend failures are carried unchanged; nothing here retries.
#[derive(Debug)]
pub enum StoreError {
    /// SQLite query / connection failure.
    Sqlite(rusqlite::Error),
    /// Failure from a non-SQLite store implementation.
    Backend(String),
    /// The parameter limit leaves no room for a single asset id next to the
    /// reserved range parameters.
    ParameterLimit {
        max_bound_params: usize,
        reserved: usize,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Sqlite(e) => write!(f, "sqlite: {}", e),
            StoreError::Backend(msg) => write!(f, "store backend: {}", msg),
            StoreError::ParameterLimit {
                max_bound_params,
                reserved,
            } => write!(
                f,
                "max_bound_params={} leaves no room for asset ids ({} reserved for the date range)",
                max_bound_params, reserved
            ),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Sqlite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Sqlite(e)
    }
}
