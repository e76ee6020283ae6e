//! Canonical column names and the fixed column-matching rule tables.
//!
//! Input schemas are not fixed; columns are matched by the naming
//! conventions below after headers are upper-cased on load. All matching
//! is table-driven: an ordered scan over these arrays, no dynamic
//! dispatch.

/// Canonical calendar-date column on the flight side (join key, left).
pub const FL_DATE: &str = "FL_DATE";
/// Canonical calendar-date column on the weather side (join key, right).
pub const DATE: &str = "DATE";

pub const YEAR: &str = "YEAR";
pub const MONTH: &str = "MONTH";
pub const DAY: &str = "DAY";

/// Optional pre-existing datetime column carried through when present.
pub const TIME_HOUR: &str = "TIME_HOUR";

pub const AIRLINE: &str = "AIRLINE";
pub const ORIGIN: &str = "ORIGIN";
pub const STATION: &str = "STATION";

pub const DEP_DELAY: &str = "DEP_DELAY";
pub const DEP_DELAY_MIN: &str = "DEP_DELAY_MIN";
pub const CANCELLED_FLAG: &str = "CANCELLED_FLAG";
pub const YEAR_MONTH: &str = "YEAR_MONTH";
pub const LONG_DELAY_FLAG: &str = "LONG_DELAY_FLAG";

pub const SCHED_DEP_DATETIME: &str = "SCHED_DEP_DATETIME";
pub const ACTUAL_DEP_DATETIME: &str = "ACTUAL_DEP_DATETIME";
pub const SCHED_ARR_DATETIME: &str = "SCHED_ARR_DATETIME";
pub const ACTUAL_ARR_DATETIME: &str = "ACTUAL_ARR_DATETIME";

/// Raw HHMM time-of-day columns and the derived timestamp each produces.
pub const TIME_COLUMN_MAP: &[(&str, &str)] = &[
    ("CRS_DEP_TIME", SCHED_DEP_DATETIME),
    ("DEP_TIME", ACTUAL_DEP_DATETIME),
    ("CRS_ARR_TIME", SCHED_ARR_DATETIME),
    ("ARR_TIME", ACTUAL_ARR_DATETIME),
];

/// Carrier columns renamed to [`AIRLINE`], in priority order; first match
/// wins and later candidates are ignored.
pub const AIRLINE_PRIORITY: &[&str] = &["CARRIER", "OP_CARRIER"];

/// Substring identifying an explicit cancellation column.
pub const CANCEL_MARKER: &str = "CANCEL";

/// Columns kept by the flight normalizer's final projection, when present.
pub const FLIGHT_KEEP_COLUMNS: &[&str] = &[
    FL_DATE,
    AIRLINE,
    "TAIL_NUM",
    "FL_NUM",
    ORIGIN,
    "DEST",
    DEP_DELAY_MIN,
    "ARR_DELAY",
    "DISTANCE",
    CANCELLED_FLAG,
    SCHED_DEP_DATETIME,
    ACTUAL_DEP_DATETIME,
];

/// Substrings marking a temperature-like column for the scatter chart.
pub const TEMP_CANDIDATES: &[&str] = &["TEMP", "TEMPERATURE", "TMAX", "TMIN"];

/// Suffix applied to weather-side columns on name collision during merge.
pub const WEATHER_SUFFIX: &str = "_WX";
