//! Datetime partitioning responses and their schemas.

use crate::mapping::ApiObject;
use crate::schema::{Field, FieldType, Schema};
use crate::shared::ProjectId;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

fn build(fields: Vec<Field>) -> Schema {
    fields
        .into_iter()
        .fold(Schema::builder(), |builder, field| builder.field(field))
        .build()
        .expect("static schema")
}

fn opt(key: &str, ty: FieldType) -> Field {
    Field::optional(key, ty)
}

lazy_static! {
    /// Start/duration/row-count/end quadruple shared by every partition.
    static ref WINDOW_FIELDS: Vec<(&'static str, FieldType)> = vec![
        ("start_date", FieldType::DateTime),
        ("duration", FieldType::String),
        ("row_count", FieldType::Int),
        ("end_date", FieldType::DateTime),
    ];

    static ref BACKTEST_SCHEMA: Schema = {
        let mut fields = vec![Field::required("index", FieldType::Int)];
        for partition in ["available_training", "primary_training", "gap", "validation"] {
            for (suffix, ty) in WINDOW_FIELDS.iter() {
                fields.push(opt(&format!("{}_{}", partition, suffix), ty.clone()));
            }
        }
        fields.push(opt("total_row_count", FieldType::Int));
        build(fields)
    };

    static ref TIME_SERIES_SCHEMA: Schema = build(vec![
        Field::with_default("use_time_series", FieldType::Bool, json!(false)),
        Field::with_default("default_to_known_in_advance", FieldType::Bool, json!(false)),
        opt("feature_derivation_window_start", FieldType::Int),
        opt("feature_derivation_window_end", FieldType::Int),
        opt("forecast_window_start", FieldType::Int),
        opt("forecast_window_end", FieldType::Int),
        opt("windows_basis_unit", FieldType::String),
        opt("treat_as_exponential", FieldType::String),
        opt("differencing_method", FieldType::String),
        opt("periodicities", FieldType::list(FieldType::object(build(vec![
            Field::required("time_steps", FieldType::Int),
            Field::required("time_unit", FieldType::String),
        ])))),
        Field::with_default(
            "multiseries_id_columns",
            FieldType::list(FieldType::String),
            json!([]),
        ),
        opt("number_of_known_in_advance_features", FieldType::Int),
        opt("number_of_do_not_derive_features", FieldType::Int),
        opt("use_cross_series_features", FieldType::Bool),
        opt("aggregation_type", FieldType::String),
        opt("calendar_id", FieldType::String),
        opt("calendar_name", FieldType::String),
    ]);

    static ref PARTITIONING_SCHEMA: Schema = {
        let mut fields = vec![
            Field::required("project_id", FieldType::String),
            Field::required("datetime_partition_column", FieldType::String),
            opt("date_format", FieldType::String),
            opt(
                "autopilot_data_selection_method",
                FieldType::enumeration(&["duration", "rowCount", "selectedRowCount"]),
            ),
            opt("validation_duration", FieldType::String),
        ];
        for partition in ["available_training", "primary_training", "gap", "holdout"] {
            for (suffix, ty) in WINDOW_FIELDS.iter() {
                fields.push(opt(&format!("{}_{}", partition, suffix), ty.clone()));
            }
        }
        fields.extend([
            Field::with_default("disable_holdout", FieldType::Bool, json!(false)),
            Field::required("number_of_backtests", FieldType::Int),
            Field::with_default(
                "backtests",
                FieldType::list(FieldType::object(BACKTEST_SCHEMA.clone())),
                json!([]),
            ),
            opt("total_row_count", FieldType::Int),
            opt("model_split", FieldType::Int),
            Field::with_default(
                "partitioning_warnings",
                FieldType::list(FieldType::map_of(FieldType::Any)),
                json!([]),
            ),
        ]);
        build(fields).extend(&TIME_SERIES_SCHEMA)
    };
}

// ─── Backtest ────────────────────────────────────────────────────────────────

/// A backtest as computed by the server: every partition carries both its
/// dates and its duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backtest {
    pub index: u32,
    pub available_training_start_date: Option<DateTime<Utc>>,
    pub available_training_duration: Option<String>,
    pub available_training_row_count: Option<i64>,
    pub available_training_end_date: Option<DateTime<Utc>>,
    pub primary_training_start_date: Option<DateTime<Utc>>,
    pub primary_training_duration: Option<String>,
    pub primary_training_row_count: Option<i64>,
    pub primary_training_end_date: Option<DateTime<Utc>>,
    pub gap_start_date: Option<DateTime<Utc>>,
    pub gap_duration: Option<String>,
    pub gap_row_count: Option<i64>,
    pub gap_end_date: Option<DateTime<Utc>>,
    pub validation_start_date: Option<DateTime<Utc>>,
    pub validation_duration: Option<String>,
    pub validation_row_count: Option<i64>,
    pub validation_end_date: Option<DateTime<Utc>>,
    pub total_row_count: Option<i64>,
}

impl ApiObject for Backtest {
    const FIELDS: &'static [&'static str] = &[
        "index",
        "available_training_start_date",
        "available_training_duration",
        "available_training_row_count",
        "available_training_end_date",
        "primary_training_start_date",
        "primary_training_duration",
        "primary_training_row_count",
        "primary_training_end_date",
        "gap_start_date",
        "gap_duration",
        "gap_row_count",
        "gap_end_date",
        "validation_start_date",
        "validation_duration",
        "validation_row_count",
        "validation_end_date",
        "total_row_count",
    ];

    fn schema() -> &'static Schema {
        &BACKTEST_SCHEMA
    }
}

// ─── DatetimePartitioning ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicityResponse {
    pub time_steps: u32,
    pub time_unit: String,
}

/// Full partitioning of a project, as generated or stored by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatetimePartitioning {
    pub project_id: ProjectId,
    pub datetime_partition_column: String,
    pub date_format: Option<String>,
    pub autopilot_data_selection_method: Option<String>,
    pub validation_duration: Option<String>,

    pub available_training_start_date: Option<DateTime<Utc>>,
    pub available_training_duration: Option<String>,
    pub available_training_row_count: Option<i64>,
    pub available_training_end_date: Option<DateTime<Utc>>,
    pub primary_training_start_date: Option<DateTime<Utc>>,
    pub primary_training_duration: Option<String>,
    pub primary_training_row_count: Option<i64>,
    pub primary_training_end_date: Option<DateTime<Utc>>,
    pub gap_start_date: Option<DateTime<Utc>>,
    pub gap_duration: Option<String>,
    pub gap_row_count: Option<i64>,
    pub gap_end_date: Option<DateTime<Utc>>,
    pub holdout_start_date: Option<DateTime<Utc>>,
    pub holdout_duration: Option<String>,
    pub holdout_row_count: Option<i64>,
    pub holdout_end_date: Option<DateTime<Utc>>,
    pub disable_holdout: bool,

    pub number_of_backtests: u32,
    pub backtests: Vec<Backtest>,
    pub total_row_count: Option<i64>,
    pub model_split: Option<u32>,
    pub partitioning_warnings: Vec<Value>,

    pub use_time_series: bool,
    pub default_to_known_in_advance: bool,
    pub feature_derivation_window_start: Option<i64>,
    pub feature_derivation_window_end: Option<i64>,
    pub forecast_window_start: Option<i64>,
    pub forecast_window_end: Option<i64>,
    pub windows_basis_unit: Option<String>,
    pub treat_as_exponential: Option<String>,
    pub differencing_method: Option<String>,
    pub periodicities: Option<Vec<PeriodicityResponse>>,
    pub multiseries_id_columns: Vec<String>,
    pub number_of_known_in_advance_features: Option<i64>,
    pub use_cross_series_features: Option<bool>,
    pub aggregation_type: Option<String>,
    pub calendar_id: Option<String>,
    pub calendar_name: Option<String>,
}

impl ApiObject for DatetimePartitioning {
    // `number_of_do_not_derive_features` is validated but not kept.
    const FIELDS: &'static [&'static str] = &[
        "project_id",
        "datetime_partition_column",
        "date_format",
        "autopilot_data_selection_method",
        "validation_duration",
        "available_training_start_date",
        "available_training_duration",
        "available_training_row_count",
        "available_training_end_date",
        "primary_training_start_date",
        "primary_training_duration",
        "primary_training_row_count",
        "primary_training_end_date",
        "gap_start_date",
        "gap_duration",
        "gap_row_count",
        "gap_end_date",
        "holdout_start_date",
        "holdout_duration",
        "holdout_row_count",
        "holdout_end_date",
        "disable_holdout",
        "number_of_backtests",
        "backtests",
        "total_row_count",
        "model_split",
        "partitioning_warnings",
        "use_time_series",
        "default_to_known_in_advance",
        "feature_derivation_window_start",
        "feature_derivation_window_end",
        "forecast_window_start",
        "forecast_window_end",
        "windows_basis_unit",
        "treat_as_exponential",
        "differencing_method",
        "periodicities",
        "multiseries_id_columns",
        "number_of_known_in_advance_features",
        "use_cross_series_features",
        "aggregation_type",
        "calendar_id",
        "calendar_name",
    ];

    fn schema() -> &'static Schema {
        &PARTITIONING_SCHEMA
    }
}
