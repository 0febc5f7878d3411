use std::fmt;

use pit_db::StoreError;
use pit_schemas::{AxesError, ParseScopeError, Sid};

/// Adjustment loading errors. A failed load never returns a partial schedule.
#[derive(Debug)]
pub enum AdjustmentError {
    /// Bad request (scope, axes). Raised before any query is issued.
    Validation(String),
    /// A fetched sid is not on the request's asset axis.
    UnknownAsset { sid: Sid },
    /// Adjustment store failure, forwarded unchanged.
    Store(StoreError),
}

impl fmt::Display for AdjustmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdjustmentError::Validation(msg) => write!(f, "validation: {}", msg),
            AdjustmentError::UnknownAsset { sid } => {
                write!(f, "lookup: sid {} is not on the requested asset axis", sid)
            }
            AdjustmentError::Store(e) => write!(f, "store: {}", e),
        }
    }
}

impl std::error::Error for AdjustmentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AdjustmentError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for AdjustmentError {
    fn from(e: StoreError) -> Self {
        AdjustmentError::Store(e)
    }
}

impl From<AxesError> for AdjustmentError {
    fn from(e: AxesError) -> Self {
        AdjustmentError::Validation(e.to_string())
    }
}

impl From<ParseScopeError> for AdjustmentError {
    fn from(e: ParseScopeError) -> Self {
        AdjustmentError::Validation(e.to_string())
    }
}
