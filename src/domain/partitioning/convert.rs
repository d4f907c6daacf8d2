//! Response → specification conversion.
//!
//! A computed partitioning reports every window both ways (dates and
//! durations). Turning it back into a specification means picking one
//! representation per window, which the caller chooses.

use super::request::{DatetimePartitioningSpecification, Periodicity};
use super::wire::{Backtest, DatetimePartitioning};
use super::BacktestSpecification;
use crate::error::InvalidUsageError;
use chrono::{DateTime, Utc};

fn required<T: Clone>(
    value: &Option<T>,
    path: impl FnOnce() -> String,
) -> Result<T, InvalidUsageError> {
    value
        .clone()
        .ok_or_else(|| InvalidUsageError::MissingField(path()))
}

impl Backtest {
    /// Describe this backtest by start/end dates or by gap/validation durations.
    pub fn to_specification(
        &self,
        use_start_end_format: bool,
    ) -> Result<BacktestSpecification, InvalidUsageError> {
        let field = |name: &str| format!("backtests[{}].{}", self.index, name);
        let validation_start: DateTime<Utc> =
            required(&self.validation_start_date, || field("validation_start_date"))?;

        if use_start_end_format {
            Ok(BacktestSpecification::dates(
                self.index,
                required(&self.primary_training_start_date, || {
                    field("primary_training_start_date")
                })?,
                required(&self.primary_training_end_date, || field("primary_training_end_date"))?,
                validation_start,
                required(&self.validation_end_date, || field("validation_end_date"))?,
            ))
        } else {
            Ok(BacktestSpecification::durations(
                self.index,
                &required(&self.gap_duration, || field("gap_duration"))?,
                validation_start,
                &required(&self.validation_duration, || field("validation_duration"))?,
            ))
        }
    }
}

impl DatetimePartitioning {
    /// Rebuild the specification that would reproduce this partitioning.
    ///
    /// `use_holdout_start_end_format` sends the holdout as start + end instead
    /// of start + duration; `use_backtest_start_end_format` does the same for
    /// every backtest.
    pub fn to_specification(
        &self,
        use_holdout_start_end_format: bool,
        use_backtest_start_end_format: bool,
    ) -> Result<DatetimePartitioningSpecification, InvalidUsageError> {
        let mut spec = DatetimePartitioningSpecification::new(&self.datetime_partition_column);
        spec.autopilot_data_selection_method = self.autopilot_data_selection_method.clone();
        spec.validation_duration = self.validation_duration.clone();
        spec.gap_duration = self.gap_duration.clone();
        spec.number_of_backtests = Some(self.number_of_backtests);
        spec.disable_holdout = self.disable_holdout;

        if !self.disable_holdout && self.holdout_start_date.is_some() {
            spec.holdout_start_date = self.holdout_start_date;
            if use_holdout_start_end_format {
                spec.holdout_end_date =
                    Some(required(&self.holdout_end_date, || "holdout_end_date".to_string())?);
            } else {
                spec.holdout_duration =
                    Some(required(&self.holdout_duration, || "holdout_duration".to_string())?);
            }
        }

        spec.backtests = self
            .backtests
            .iter()
            .map(|b| b.to_specification(use_backtest_start_end_format))
            .collect::<Result<_, _>>()?;

        spec.use_time_series = self.use_time_series;
        spec.default_to_known_in_advance = self.default_to_known_in_advance;
        spec.feature_derivation_window_start = self.feature_derivation_window_start;
        spec.feature_derivation_window_end = self.feature_derivation_window_end;
        spec.forecast_window_start = self.forecast_window_start;
        spec.forecast_window_end = self.forecast_window_end;
        spec.windows_basis_unit = self.windows_basis_unit.clone();
        spec.treat_as_exponential = self.treat_as_exponential.clone();
        spec.differencing_method = self.differencing_method.clone();
        spec.periodicities = self
            .periodicities
            .iter()
            .flatten()
            .map(|p| Periodicity::new(p.time_steps, &p.time_unit))
            .collect();
        spec.multiseries_id_columns = self.multiseries_id_columns.clone();
        spec.use_cross_series_features = self.use_cross_series_features;
        spec.aggregation_type = self.aggregation_type.clone();
        spec.calendar_id = self.calendar_id.clone();
        spec.model_split = self.model_split;

        Ok(spec)
    }
}
