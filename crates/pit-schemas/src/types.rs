use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Asset identifier.
pub type Sid = i64;

// ---------------------------------------------------------------------------
// Raw store rows
// ---------------------------------------------------------------------------

/// One corporate action for one asset, exactly as stored.
///
/// `effective_date` is epoch seconds (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawAdjustmentRecord {
    pub sid: Sid,
    pub ratio: f64,
    pub effective_date: i64,
}

impl RawAdjustmentRecord {
    pub fn new(sid: Sid, ratio: f64, effective_date: i64) -> Self {
        Self {
            sid,
            ratio,
            effective_date,
        }
    }
}

/// Kind of corporate action. Each category lives in its own table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AdjustmentCategory {
    Split,
    Merger,
    Dividend,
}

impl AdjustmentCategory {
    pub const ALL: [AdjustmentCategory; 3] = [
        AdjustmentCategory::Split,
        AdjustmentCategory::Merger,
        AdjustmentCategory::Dividend,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentCategory::Split => "split",
            AdjustmentCategory::Merger => "merger",
            AdjustmentCategory::Dividend => "dividend",
        }
    }

    /// Table holding this category's rows.
    pub fn table_name(&self) -> &'static str {
        match self {
            AdjustmentCategory::Split => "splits",
            AdjustmentCategory::Merger => "mergers",
            AdjustmentCategory::Dividend => "dividends",
        }
    }

    /// Whether this category scales volume (inversely) as well as price.
    pub fn affects_volume(&self) -> bool {
        matches!(self, AdjustmentCategory::Split)
    }
}

impl fmt::Display for AdjustmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AdjustmentScope
// ---------------------------------------------------------------------------

/// Which output schedules a load produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentScope {
    Price,
    Volume,
    All,
}

impl AdjustmentScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentScope::Price => "price",
            AdjustmentScope::Volume => "volume",
            AdjustmentScope::All => "all",
        }
    }

    pub fn includes_price(&self) -> bool {
        matches!(self, AdjustmentScope::Price | AdjustmentScope::All)
    }

    pub fn includes_volume(&self) -> bool {
        matches!(self, AdjustmentScope::Volume | AdjustmentScope::All)
    }
}

/// Rejected `adjustment_scope` value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseScopeError(pub String);

impl fmt::Display for ParseScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid adjustment scope '{}'. expected one of: price | volume | all",
            self.0
        )
    }
}

impl std::error::Error for ParseScopeError {}

impl FromStr for AdjustmentScope {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price" => Ok(AdjustmentScope::Price),
            "volume" => Ok(AdjustmentScope::Volume),
            "all" => Ok(AdjustmentScope::All),
            other => Err(ParseScopeError(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// RequestAxes
// ---------------------------------------------------------------------------

/// Axis validation failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AxesError {
    EmptyDates,
    /// `dates[index]` is not strictly greater than `dates[index - 1]`.
    DatesNotIncreasing { index: usize },
    DuplicateAsset { sid: Sid },
}

impl fmt::Display for AxesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxesError::EmptyDates => write!(f, "date axis is empty"),
            AxesError::DatesNotIncreasing { index } => {
                write!(f, "date axis not strictly increasing at index {}", index)
            }
            AxesError::DuplicateAsset { sid } => write!(f, "duplicate asset in axis: {}", sid),
        }
    }
}

impl std::error::Error for AxesError {}

/// Coordinate system of a load request.
///
/// Row indices in a schedule refer to `dates`, column indices to `assets`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RequestAxes {
    dates: Vec<i64>,
    assets: Vec<Sid>,
}

impl RequestAxes {
    /// `dates` are epoch seconds, strictly increasing, non-empty. `assets` must be unique.
    pub fn new(dates: Vec<i64>, assets: Vec<Sid>) -> Result<Self, AxesError> {
        if dates.is_empty() {
            return Err(AxesError::EmptyDates);
        }
        if let Some(i) = dates.windows(2).position(|w| w[1] <= w[0]) {
            return Err(AxesError::DatesNotIncreasing { index: i + 1 });
        }
        let mut seen = BTreeSet::new();
        for &sid in &assets {
            if !seen.insert(sid) {
                return Err(AxesError::DuplicateAsset { sid });
            }
        }
        Ok(Self { dates, assets })
    }

    /// Build from timezone-aware session instants.
    ///
    /// Each instant becomes whole seconds since the Unix epoch; sub-second parts are dropped.
    pub fn from_datetimes<Tz: TimeZone>(
        sessions: &[DateTime<Tz>],
        assets: Vec<Sid>,
    ) -> Result<Self, AxesError> {
        let dates = sessions.iter().map(|dt| dt.timestamp()).collect();
        Self::new(dates, assets)
    }

    pub fn dates(&self) -> &[i64] {
        &self.dates
    }

    pub fn assets(&self) -> &[Sid] {
        &self.assets
    }

    /// First session of the axis (inclusive lower bound of the request).
    pub fn start_date(&self) -> i64 {
        self.dates[0]
    }

    /// Last session of the axis (inclusive upper bound of the request).
    pub fn end_date(&self) -> i64 {
        self.dates[self.dates.len() - 1]
    }

    pub fn num_dates(&self) -> usize {
        self.dates.len()
    }

    pub fn num_assets(&self) -> usize {
        self.assets.len()
    }
}
