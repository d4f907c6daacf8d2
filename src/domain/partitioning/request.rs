//! Request body for generating a datetime partitioning.

use super::{resolve_holdout, BacktestSpecification, Holdout};
use crate::error::InvalidUsageError;
use crate::mapping::{to_api, KeepNulls};
use crate::shared::{Native, NativeMap};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;

/// A periodicity hint for time series projects, e.g. 7 `DAY` steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Periodicity {
    pub time_steps: u32,
    pub time_unit: String,
}

impl Periodicity {
    pub fn new(time_steps: u32, time_unit: &str) -> Self {
        Self {
            time_steps,
            time_unit: time_unit.to_string(),
        }
    }
}

/// User-configured datetime partitioning, sent when generating or setting
/// the partitioning of a project.
///
/// Unset options are left out of the request so the server applies its own
/// defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatetimePartitioningSpecification {
    pub datetime_partition_column: String,
    /// `duration`, `rowCount` or `selectedRowCount`.
    pub autopilot_data_selection_method: Option<String>,
    pub validation_duration: Option<String>,
    pub holdout_start_date: Option<DateTime<Utc>>,
    pub holdout_end_date: Option<DateTime<Utc>>,
    pub holdout_duration: Option<String>,
    pub disable_holdout: bool,
    pub gap_duration: Option<String>,
    pub number_of_backtests: Option<u32>,
    pub backtests: Vec<BacktestSpecification>,

    // Time series options.
    pub use_time_series: bool,
    pub default_to_known_in_advance: bool,
    pub feature_derivation_window_start: Option<i64>,
    pub feature_derivation_window_end: Option<i64>,
    pub forecast_window_start: Option<i64>,
    pub forecast_window_end: Option<i64>,
    pub windows_basis_unit: Option<String>,
    pub treat_as_exponential: Option<String>,
    pub differencing_method: Option<String>,
    pub periodicities: Vec<Periodicity>,
    pub multiseries_id_columns: Vec<String>,
    pub use_cross_series_features: Option<bool>,
    pub aggregation_type: Option<String>,
    pub calendar_id: Option<String>,
    pub model_split: Option<u32>,
}

impl DatetimePartitioningSpecification {
    pub fn new(datetime_partition_column: &str) -> Self {
        Self {
            datetime_partition_column: datetime_partition_column.to_string(),
            ..Self::default()
        }
    }

    pub fn holdout(&self) -> Result<Holdout, InvalidUsageError> {
        resolve_holdout(
            self.holdout_start_date,
            self.holdout_end_date,
            self.holdout_duration.as_deref(),
            self.disable_holdout,
        )
    }

    /// Validate and render the request body.
    pub fn collect_payload(&self) -> Result<Value, InvalidUsageError> {
        if self.datetime_partition_column.is_empty() {
            return Err(InvalidUsageError::MissingField(
                "datetime_partition_column".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for backtest in &self.backtests {
            if !seen.insert(backtest.index) {
                return Err(InvalidUsageError::ConflictingFields(format!(
                    "backtest index {} given more than once",
                    backtest.index
                )));
            }
        }

        let mut body = NativeMap::new();
        let mut put = |key: &str, value: Native| {
            body.insert(key.to_string(), value);
        };

        put("datetime_partition_column", self.datetime_partition_column.clone().into());
        put("autopilot_data_selection_method", self.autopilot_data_selection_method.clone().into());
        put("validation_duration", self.validation_duration.clone().into());
        put("gap_duration", self.gap_duration.clone().into());
        put("number_of_backtests", self.number_of_backtests.into());

        match self.holdout()? {
            Holdout::Default => {}
            Holdout::Disabled => put("disable_holdout", true.into()),
            Holdout::StartDuration { start, duration } => {
                put("holdout_start_date", start.into());
                put("holdout_duration", duration.into());
            }
            Holdout::StartEnd { start, end } => {
                put("holdout_start_date", start.into());
                put("holdout_end_date", end.into());
            }
        }

        if !self.backtests.is_empty() {
            put(
                "backtests",
                Native::List(self.backtests.iter().map(BacktestSpecification::to_native).collect()),
            );
        }

        put("use_time_series", self.use_time_series.into());
        put("default_to_known_in_advance", self.default_to_known_in_advance.into());
        put("feature_derivation_window_start", self.feature_derivation_window_start.into());
        put("feature_derivation_window_end", self.feature_derivation_window_end.into());
        put("forecast_window_start", self.forecast_window_start.into());
        put("forecast_window_end", self.forecast_window_end.into());
        put("windows_basis_unit", self.windows_basis_unit.clone().into());
        put("treat_as_exponential", self.treat_as_exponential.clone().into());
        put("differencing_method", self.differencing_method.clone().into());
        if !self.periodicities.is_empty() {
            put(
                "periodicities",
                Native::List(
                    self.periodicities
                        .iter()
                        .map(|p| {
                            Native::map([
                                ("time_steps", Native::from(p.time_steps)),
                                ("time_unit", Native::from(p.time_unit.as_str())),
                            ])
                        })
                        .collect(),
                ),
            );
        }
        if !self.multiseries_id_columns.is_empty() {
            put("multiseries_id_columns", self.multiseries_id_columns.clone().into());
        }
        put("use_cross_series_features", self.use_cross_series_features.into());
        put("aggregation_type", self.aggregation_type.clone().into());
        put("calendar_id", self.calendar_id.clone().into());
        put("model_split", self.model_split.into());

        Ok(to_api(&Native::Map(body), &KeepNulls::None))
    }
}
