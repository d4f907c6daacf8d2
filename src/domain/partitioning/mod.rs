//! Datetime partitioning: backtest and holdout window reconciliation.
//!
//! A backtest window can be described two ways:
//!
//! - **durations**: `gap_duration`, `validation_start_date`,
//!   `validation_duration`
//! - **dates**: `primary_training_start_date`, `primary_training_end_date`,
//!   `validation_start_date`, `validation_end_date`
//!
//! Exactly one complete description must be supplied. Partial descriptions,
//! or a complete one mixed with fields that only belong to the other, are
//! rejected locally rather than sent to the server.

#[cfg(feature = "http")]
pub mod client;
pub mod convert;
pub mod request;
pub mod wire;

pub use request::{DatetimePartitioningSpecification, Periodicity};
pub use wire::{Backtest, DatetimePartitioning};

use crate::error::InvalidUsageError;
use crate::shared::{Native, NativeMap};
use chrono::{DateTime, Utc};

const DURATION_FIELDS: [&str; 3] = ["gap_duration", "validation_start_date", "validation_duration"];
const DATE_FIELDS: [&str; 4] = [
    "primary_training_start_date",
    "primary_training_end_date",
    "validation_start_date",
    "validation_end_date",
];

/// Fields that must carry real date/datetime values.
const TIMESTAMP_FIELDS: [&str; 4] = [
    "primary_training_start_date",
    "primary_training_end_date",
    "validation_start_date",
    "validation_end_date",
];

/// Fields that must carry ISO-8601 duration strings.
const DURATION_STRING_FIELDS: [&str; 2] = ["gap_duration", "validation_duration"];

// ─── BacktestWindow ──────────────────────────────────────────────────────────

/// One backtest's validation window, in exactly one representation.
#[derive(Debug, Clone, PartialEq)]
pub enum BacktestWindow {
    Durations {
        gap_duration: String,
        validation_start_date: DateTime<Utc>,
        validation_duration: String,
    },
    Dates {
        primary_training_start_date: DateTime<Utc>,
        primary_training_end_date: DateTime<Utc>,
        validation_start_date: DateTime<Utc>,
        validation_end_date: DateTime<Utc>,
    },
}

impl BacktestWindow {
    pub fn validation_start_date(&self) -> DateTime<Utc> {
        match self {
            BacktestWindow::Durations {
                validation_start_date,
                ..
            }
            | BacktestWindow::Dates {
                validation_start_date,
                ..
            } => *validation_start_date,
        }
    }

    pub fn is_start_end(&self) -> bool {
        matches!(self, BacktestWindow::Dates { .. })
    }

    fn insert_into(&self, map: &mut NativeMap) {
        match self {
            BacktestWindow::Durations {
                gap_duration,
                validation_start_date,
                validation_duration,
            } => {
                map.insert("gap_duration".into(), gap_duration.clone().into());
                map.insert("validation_start_date".into(), (*validation_start_date).into());
                map.insert("validation_duration".into(), validation_duration.clone().into());
            }
            BacktestWindow::Dates {
                primary_training_start_date,
                primary_training_end_date,
                validation_start_date,
                validation_end_date,
            } => {
                map.insert(
                    "primary_training_start_date".into(),
                    (*primary_training_start_date).into(),
                );
                map.insert(
                    "primary_training_end_date".into(),
                    (*primary_training_end_date).into(),
                );
                map.insert("validation_start_date".into(), (*validation_start_date).into());
                map.insert("validation_end_date".into(), (*validation_end_date).into());
            }
        }
    }
}

/// Pick the representation described by `fields`.
///
/// `fields` may also carry an integer `index`, used only in error messages.
/// Null values count as absent.
pub fn resolve_backtest(fields: &NativeMap) -> Result<BacktestWindow, InvalidUsageError> {
    let index = backtest_index(fields);
    let present = |name: &str| fields.get(name).is_some_and(|v| !v.is_null());

    for name in TIMESTAMP_FIELDS.iter().filter(|n| present(n)) {
        timestamp(name, &fields[*name])?;
    }
    for name in DURATION_STRING_FIELDS.iter().filter(|n| present(n)) {
        duration(name, &fields[*name])?;
    }

    let has_durations = DURATION_FIELDS.iter().all(|n| present(n));
    let has_dates = DATE_FIELDS.iter().all(|n| present(n));
    let durations_only = DURATION_FIELDS
        .iter()
        .any(|n| !DATE_FIELDS.contains(n) && present(n));
    let dates_only = DATE_FIELDS
        .iter()
        .any(|n| !DURATION_FIELDS.contains(n) && present(n));

    let supplied: Vec<String> = DATE_FIELDS
        .iter()
        .chain(DURATION_FIELDS.iter().filter(|n| !DATE_FIELDS.contains(*n)))
        .filter(|n| present(n))
        .map(|n| n.to_string())
        .collect();

    if has_durations && !dates_only {
        return Ok(BacktestWindow::Durations {
            gap_duration: duration("gap_duration", &fields["gap_duration"])?,
            validation_start_date: timestamp(
                "validation_start_date",
                &fields["validation_start_date"],
            )?,
            validation_duration: duration("validation_duration", &fields["validation_duration"])?,
        });
    }
    if has_dates && !durations_only {
        return Ok(BacktestWindow::Dates {
            primary_training_start_date: timestamp(
                "primary_training_start_date",
                &fields["primary_training_start_date"],
            )?,
            primary_training_end_date: timestamp(
                "primary_training_end_date",
                &fields["primary_training_end_date"],
            )?,
            validation_start_date: timestamp(
                "validation_start_date",
                &fields["validation_start_date"],
            )?,
            validation_end_date: timestamp("validation_end_date", &fields["validation_end_date"])?,
        });
    }
    if has_durations || has_dates {
        return Err(InvalidUsageError::AmbiguousBacktest {
            index,
            fields: supplied,
        });
    }
    Err(InvalidUsageError::IncompleteBacktest {
        index,
        present: supplied,
    })
}

fn backtest_index(fields: &NativeMap) -> u32 {
    match fields.get("index") {
        Some(Native::Int(i)) => u32::try_from(*i).unwrap_or(0),
        _ => 0,
    }
}

/// Dates are taken as midnight UTC.
fn timestamp(field: &str, value: &Native) -> Result<DateTime<Utc>, InvalidUsageError> {
    match value {
        Native::DateTime(dt) => Ok(*dt),
        Native::Date(d) => Ok(d.and_time(chrono::NaiveTime::MIN).and_utc()),
        other => Err(InvalidUsageError::WrongType {
            field: field.to_string(),
            expected: "date or datetime",
            found: other.type_name(),
        }),
    }
}

fn duration(field: &str, value: &Native) -> Result<String, InvalidUsageError> {
    match value {
        Native::String(s) => Ok(s.clone()),
        other => Err(InvalidUsageError::WrongType {
            field: field.to_string(),
            expected: "duration string",
            found: other.type_name(),
        }),
    }
}

// ─── BacktestSpecification ───────────────────────────────────────────────────

/// A single user-configured backtest.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSpecification {
    pub index: u32,
    pub window: BacktestWindow,
}

impl BacktestSpecification {
    pub fn durations(
        index: u32,
        gap_duration: &str,
        validation_start_date: DateTime<Utc>,
        validation_duration: &str,
    ) -> Self {
        Self {
            index,
            window: BacktestWindow::Durations {
                gap_duration: gap_duration.to_string(),
                validation_start_date,
                validation_duration: validation_duration.to_string(),
            },
        }
    }

    pub fn dates(
        index: u32,
        primary_training_start_date: DateTime<Utc>,
        primary_training_end_date: DateTime<Utc>,
        validation_start_date: DateTime<Utc>,
        validation_end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            index,
            window: BacktestWindow::Dates {
                primary_training_start_date,
                primary_training_end_date,
                validation_start_date,
                validation_end_date,
            },
        }
    }

    /// Build from loosely-typed fields, e.g. user input. `index` is required.
    pub fn from_fields(fields: &NativeMap) -> Result<Self, InvalidUsageError> {
        let index = match fields.get("index") {
            Some(Native::Int(i)) => u32::try_from(*i).map_err(|_| InvalidUsageError::WrongType {
                field: "index".to_string(),
                expected: "non-negative integer",
                found: "int",
            })?,
            Some(other) => {
                return Err(InvalidUsageError::WrongType {
                    field: "index".to_string(),
                    expected: "non-negative integer",
                    found: other.type_name(),
                })
            }
            None => return Err(InvalidUsageError::MissingField("index".to_string())),
        };
        Ok(Self {
            index,
            window: resolve_backtest(fields)?,
        })
    }

    pub fn to_native(&self) -> Native {
        let mut map = NativeMap::new();
        map.insert("index".into(), self.index.into());
        self.window.insert_into(&mut map);
        Native::Map(map)
    }
}

// ─── Holdout ─────────────────────────────────────────────────────────────────

/// How the holdout partition is requested.
#[derive(Debug, Clone, PartialEq)]
pub enum Holdout {
    /// Let the server choose.
    Default,
    Disabled,
    StartDuration {
        start: DateTime<Utc>,
        duration: String,
    },
    StartEnd {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Reconcile the four holdout knobs into one [`Holdout`].
///
/// The holdout is given as start + duration or as start + end, never both,
/// and no holdout field may accompany `disable_holdout`.
pub fn resolve_holdout(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    duration: Option<&str>,
    disable: bool,
) -> Result<Holdout, InvalidUsageError> {
    if disable {
        if start.is_some() || end.is_some() || duration.is_some() {
            return Err(InvalidUsageError::ConflictingFields(
                "disable_holdout cannot be combined with holdout_start_date, \
                 holdout_end_date or holdout_duration"
                    .to_string(),
            ));
        }
        return Ok(Holdout::Disabled);
    }

    match (start, end, duration) {
        (None, None, None) => Ok(Holdout::Default),
        (_, Some(_), Some(_)) => Err(InvalidUsageError::ConflictingFields(
            "holdout_end_date and holdout_duration are mutually exclusive".to_string(),
        )),
        (Some(start), None, Some(duration)) => Ok(Holdout::StartDuration {
            start,
            duration: duration.to_string(),
        }),
        (Some(start), Some(end), None) => Ok(Holdout::StartEnd { start, end }),
        (None, _, _) => Err(InvalidUsageError::MissingField(
            "holdout_start_date".to_string(),
        )),
        (Some(_), None, None) => Err(InvalidUsageError::MissingField(
            "holdout_end_date or holdout_duration".to_string(),
        )),
    }
}

// ─── Durations ───────────────────────────────────────────────────────────────

/// Build an ISO-8601 duration such as `P1Y2M3DT4H5M6S`.
///
/// Zero components are omitted; an all-zero duration is `PT0S`.
pub fn construct_duration_string(
    years: u32,
    months: u32,
    days: u32,
    hours: u32,
    minutes: u32,
    seconds: u32,
) -> String {
    let mut out = String::from("P");
    for (value, unit) in [(years, 'Y'), (months, 'M'), (days, 'D')] {
        if value > 0 {
            out.push_str(&format!("{}{}", value, unit));
        }
    }
    if hours > 0 || minutes > 0 || seconds > 0 {
        out.push('T');
        for (value, unit) in [(hours, 'H'), (minutes, 'M'), (seconds, 'S')] {
            if value > 0 {
                out.push_str(&format!("{}{}", value, unit));
            }
        }
    }
    if out == "P" {
        out.push_str("T0S");
    }
    out
}
