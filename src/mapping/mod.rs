//! Object mapping between server JSON and typed domain objects.
//!
//! Inbound: `from_api` (case normalisation + null filtering) → schema
//! validation → constructor-field filtering → `serde` construction.
//! Outbound: a [`crate::shared::Native`] tree → `to_api` → JSON body.

mod inbound;
mod outbound;

pub use inbound::{from_api, KeepNulls};
pub use outbound::{to_api, to_api_value};

use crate::error::SdkError;
use crate::schema::{Record, Schema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A domain object built from a schema-validated server payload.
///
/// `FIELDS` lists the canonical-record keys the type is constructed from.
/// Anything the schema validates beyond that set is discarded before
/// construction, which lets a schema accept fields a newer server adds
/// without breaking the type.
pub trait ApiObject: DeserializeOwned {
    const FIELDS: &'static [&'static str];

    fn schema() -> &'static Schema;

    /// Build from an already-normalised record.
    fn from_record(record: Record) -> Result<Self, SdkError> {
        let filtered = record.retain_only(Self::FIELDS);
        Ok(serde_json::from_value(filtered.into_value())?)
    }

    /// Validate snake_case data and build the object.
    fn from_data(data: &Value) -> Result<Self, SdkError> {
        let record = Self::schema().validate(data)?;
        Self::from_record(record)
    }

    /// Normalise raw server JSON, then validate and build.
    ///
    /// `keep` applies to both steps, so a kept null reaches the constructor
    /// as `null` rather than as an absent or defaulted field.
    fn from_server_data(data: &Value, keep: &KeepNulls) -> Result<Self, SdkError> {
        let record = Self::schema().validate_with(&from_api(data, keep), keep)?;
        Self::from_record(record)
    }
}

/// Constructor fields of `T` that its schema never produces.
///
/// Empty when the declarations agree; used in tests to catch drift between a
/// type and its schema.
pub fn undeclared_fields<T: ApiObject>() -> Vec<&'static str> {
    let schema = T::schema();
    T::FIELDS
        .iter()
        .copied()
        .filter(|name| schema.field(name).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaErrorKind;
    use crate::schema::{ExtraPolicy, Field, FieldType};
    use lazy_static::lazy_static;
    use serde::Deserialize;
    use serde_json::json;

    lazy_static! {
        static ref FEATURE_SCHEMA: Schema = Schema::builder()
            .field(Field::required("id", FieldType::Int))
            .field(Field::required("name", FieldType::String))
            .field(Field::optional("feature_type", FieldType::String))
            .field(Field::optional("target_leakage", FieldType::nullable(FieldType::String)))
            .field(Field::optional("importance", FieldType::Float))
            .extra(ExtraPolicy::Passthrough)
            .build()
            .expect("feature schema");

        static ref WINDOW_SCHEMA: Schema = Schema::builder()
            .field(Field::required("id", FieldType::Int))
            .field(Field::optional("holdout_end_date", FieldType::DateTime))
            .field(Field::with_default("tags", FieldType::list(FieldType::String), json!([])))
            .field(Field::optional(
                "settings",
                FieldType::object(
                    Schema::builder()
                        .field(Field::optional("calendar_id", FieldType::String))
                        .build()
                        .expect("settings schema"),
                ),
            ))
            .build()
            .expect("window schema");
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Window {
        id: i64,
        holdout_end_date: Option<String>,
        tags: Option<Vec<String>>,
    }

    impl ApiObject for Window {
        const FIELDS: &'static [&'static str] = &["id", "holdout_end_date", "tags"];

        fn schema() -> &'static Schema {
            &WINDOW_SCHEMA
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct Feature {
        id: i64,
        name: String,
        feature_type: Option<String>,
        target_leakage: Option<String>,
    }

    impl ApiObject for Feature {
        const FIELDS: &'static [&'static str] = &["id", "name", "feature_type", "target_leakage"];

        fn schema() -> &'static Schema {
            &FEATURE_SCHEMA
        }
    }

    #[test]
    fn test_from_server_data_builds_object() {
        let feature = Feature::from_server_data(
            &json!({"id": 7, "name": "age", "featureType": "Numeric", "targetLeakage": null}),
            &KeepNulls::None,
        )
        .unwrap();
        assert_eq!(
            feature,
            Feature {
                id: 7,
                name: "age".into(),
                feature_type: Some("Numeric".into()),
                target_leakage: None,
            }
        );
    }

    #[test]
    fn test_unconsumed_fields_discarded() {
        // `importance` is validated and `newServerField` passes through, but
        // neither is a constructor field; deny_unknown_fields would reject them.
        let feature = Feature::from_server_data(
            &json!({"id": 1, "name": "x", "importance": 0.3, "newServerField": true}),
            &KeepNulls::None,
        )
        .unwrap();
        assert_eq!(feature.id, 1);
    }

    #[test]
    fn test_schema_error_propagates() {
        let err = Feature::from_server_data(&json!({"name": "x"}), &KeepNulls::None).unwrap_err();
        match err {
            SdkError::Schema(e) => assert_eq!(e.kind, SchemaErrorKind::MissingField),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_kept_nulls_survive_validation() {
        let wire = json!({
            "id": 1,
            "holdoutEndDate": null,
            "tags": null,
            "settings": {"calendarId": null},
        });
        let keep = KeepNulls::paths(["holdout_end_date", "tags", "settings.calendar_id"]);

        let record = WINDOW_SCHEMA.validate_with(&from_api(&wire, &keep), &keep).unwrap();
        assert_eq!(
            record.into_value(),
            json!({
                "id": 1,
                "holdout_end_date": null,
                "tags": null,
                "settings": {"calendar_id": null},
            })
        );

        let record = WINDOW_SCHEMA.validate(&from_api(&wire, &KeepNulls::All)).unwrap();
        assert_eq!(record.into_value(), json!({"id": 1, "tags": [], "settings": {}}));
    }

    #[test]
    fn test_from_server_data_honours_keep_list() {
        let wire = json!({"id": 1, "holdoutEndDate": null, "tags": null});

        let kept =
            Window::from_server_data(&wire, &KeepNulls::paths(["holdout_end_date", "tags"]))
                .unwrap();
        assert_eq!(kept.tags, None);
        assert_eq!(kept.holdout_end_date, None);

        let dropped = Window::from_server_data(&wire, &KeepNulls::None).unwrap();
        assert_eq!(dropped.tags, Some(vec![]));
    }

    #[test]
    fn test_fields_match_schema() {
        assert!(undeclared_fields::<Feature>().is_empty());
        assert!(undeclared_fields::<Window>().is_empty());
    }
}
