use anyhow::{anyhow, bail, Context, Result};
use pit_schemas::AdjustmentScope;
use serde::Serialize;
use serde_json::Value;

/// SQLite's compiled-in default for SQLITE_MAX_VARIABLE_NUMBER.
const DEFAULT_MAX_BOUND_PARAMS: usize = 999;

/// Two range bounds are bound next to the IN list; a budget must leave room for one sid.
const MIN_MAX_BOUND_PARAMS: usize = 3;

pub const DEFAULT_SCOPE: AdjustmentScope = AdjustmentScope::All;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSettings {
    pub path: String,
    pub max_bound_params: usize,
    pub read_only: bool,
}

/// Typed view over a merged config document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoaderSettings {
    pub store: StoreSettings,
    pub include_splits: bool,
    pub include_mergers: bool,
    pub include_dividends: bool,
    pub scope: AdjustmentScope,
    pub window_length: Option<usize>,
}

impl LoaderSettings {
    pub fn from_config_json(config_json: &Value) -> Result<Self> {
        let path = config_json
            .pointer("/store/path")
            .ok_or_else(|| anyhow!("CONFIG_MISSING: /store/path is required"))?
            .as_str()
            .ok_or_else(|| anyhow!("CONFIG_TYPE: /store/path must be a string"))?
            .to_string();
        if path.trim().is_empty() {
            bail!("CONFIG_INVALID: /store/path must not be empty");
        }

        let max_bound_params =
            read_usize(config_json, "/store/max_bound_params")?.unwrap_or(DEFAULT_MAX_BOUND_PARAMS);
        if max_bound_params < MIN_MAX_BOUND_PARAMS {
            bail!(
                "CONFIG_INVALID: /store/max_bound_params must be at least {} (got {})",
                MIN_MAX_BOUND_PARAMS,
                max_bound_params
            );
        }

        let scope = match config_json.pointer("/adjustments/scope") {
            None => DEFAULT_SCOPE,
            Some(v) => v
                .as_str()
                .ok_or_else(|| anyhow!("CONFIG_TYPE: /adjustments/scope must be a string"))?
                .parse::<AdjustmentScope>()
                .context("CONFIG_INVALID: /adjustments/scope")?,
        };

        let window_length = read_usize(config_json, "/window/length")?;
        if window_length == Some(0) {
            bail!("CONFIG_INVALID: /window/length must be at least 1");
        }

        Ok(Self {
            store: StoreSettings {
                path,
                max_bound_params,
                read_only: read_bool(config_json, "/store/read_only")?.unwrap_or(true),
            },
            include_splits: read_bool(config_json, "/adjustments/include_splits")?.unwrap_or(true),
            include_mergers: read_bool(config_json, "/adjustments/include_mergers")?
                .unwrap_or(true),
            include_dividends: read_bool(config_json, "/adjustments/include_dividends")?
                .unwrap_or(true),
            scope,
            window_length,
        })
    }
}

fn read_bool(v: &Value, pointer: &str) -> Result<Option<bool>> {
    match v.pointer(pointer) {
        None => Ok(None),
        Some(x) => x
            .as_bool()
            .map(Some)
            .ok_or_else(|| anyhow!("CONFIG_TYPE: {pointer} must be a bool")),
    }
}

fn read_usize(v: &Value, pointer: &str) -> Result<Option<usize>> {
    match v.pointer(pointer) {
        None => Ok(None),
        Some(x) => {
            let n = x
                .as_u64()
                .ok_or_else(|| anyhow!("CONFIG_TYPE: {pointer} must be a non-negative integer"))?;
            usize::try_from(n)
                .map(Some)
                .with_context(|| format!("CONFIG_INVALID: {pointer} out of range"))
        }
    }
}
