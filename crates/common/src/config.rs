use serde::{Deserialize, Serialize};

/// Field-to-column binding resolution mode.
///
/// `ByName` matches target field names against source column names
/// case-insensitively; `ByOrdinal` pairs field *i* with column *i*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindMode {
    ByOrdinal,
    ByName,
}

/// Per-task binding and null-policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindConfig {
    /// How target fields are resolved to source columns.
    pub mode: BindMode,
    /// When true, a NULL in a bound column with no default configured skips
    /// the whole row instead of failing the task.
    pub ignore_unhandled_null: bool,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            mode: BindMode::ByName,
            ignore_unhandled_null: false,
        }
    }
}

/// Bad-record tolerance thresholds for the task driver.
///
/// Intended to excuse very rare corrupt or unmaterializable rows while still
/// failing fast on systematic problems. A row-level materialize error is
/// excused while `errors < min_errors` or the running error rate stays at or
/// below `max_error_rate`; once both limits are exceeded the task fails with
/// the triggering error. `max_error_rate <= 0.0` tolerates no errors at all.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ToleranceConfig {
    /// Maximum tolerated fraction of errored rows over rows seen so far.
    pub max_error_rate: f64,
    /// Errors are always excused until this many have been seen.
    pub min_errors: u64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            max_error_rate: 0.0001,
            min_errors: 2,
        }
    }
}
