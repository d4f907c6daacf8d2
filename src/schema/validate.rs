//! Payload validation against a [`Schema`].

use super::{ExtraPolicy, FieldType, Presence, Record, Schema};
use crate::error::{SchemaErrorKind, SchemaValidationError};
use crate::mapping::KeepNulls;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;

pub(super) fn validate_object(
    schema: &Schema,
    raw: &Value,
    path: &str,
    keep: &KeepNulls,
) -> Result<Record, SchemaValidationError> {
    let Value::Object(obj) = raw else {
        return Err(wrong_type(path, "object", raw));
    };

    let mut record = Record::default();

    for field in schema.fields() {
        let field_path = join_key(path, &field.source);
        match obj.get(&field.source) {
            // A kept null is stored as is, whatever the declared type.
            Some(Value::Null) if keep.keeps(&field.source) => {
                record.insert(field.target.clone(), Value::Null);
            }
            // Any other null on a field that cannot hold one counts as
            // absent, unless the field is required.
            Some(Value::Null) if !field.ty.accepts_null() => match &field.presence {
                Presence::Required => {
                    return Err(wrong_type(&field_path, &field.ty.describe(), &Value::Null))
                }
                Presence::Default(default) => record.insert(field.target.clone(), default.clone()),
                Presence::Optional => {}
            },
            Some(value) => {
                let nested = keep.descend(&field.source);
                let checked = validate_value(&field.ty, value, &field_path, &nested)?;
                record.insert(field.target.clone(), checked);
            }
            None => match &field.presence {
                Presence::Required => {
                    return Err(SchemaValidationError::new(
                        field_path,
                        SchemaErrorKind::MissingField,
                    ))
                }
                Presence::Default(default) => record.insert(field.target.clone(), default.clone()),
                Presence::Optional => {}
            },
        }
    }

    if schema.extra_policy() != ExtraPolicy::Ignore {
        let declared: HashSet<&str> =
            schema.fields().iter().map(|f| f.source.as_str()).collect();
        for (key, value) in obj {
            if declared.contains(key.as_str()) {
                continue;
            }
            match schema.extra_policy() {
                ExtraPolicy::Reject => {
                    return Err(SchemaValidationError::new(
                        join_key(path, key),
                        SchemaErrorKind::UnexpectedField,
                    ))
                }
                ExtraPolicy::Passthrough => {
                    if !record.contains_key(key) {
                        record.insert(key.clone(), value.clone());
                    }
                }
                ExtraPolicy::Ignore => {}
            }
        }
    }

    Ok(record)
}

pub(super) fn validate_value(
    ty: &FieldType,
    value: &Value,
    path: &str,
    keep: &KeepNulls,
) -> Result<Value, SchemaValidationError> {
    match ty {
        FieldType::Any => Ok(value.clone()),
        FieldType::Bool => match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => Err(wrong_type(path, "bool", value)),
        },
        FieldType::Int => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            _ => Err(wrong_type(path, "int", value)),
        },
        FieldType::Float => match value.as_f64() {
            Some(f) if value.is_number() => Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| wrong_type(path, "float", value)),
            _ => Err(wrong_type(path, "float", value)),
        },
        FieldType::String => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(wrong_type(path, "string", value)),
        },
        FieldType::Date => value
            .as_str()
            .and_then(parse_date)
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .ok_or_else(|| wrong_type(path, "date", value)),
        FieldType::DateTime => value
            .as_str()
            .and_then(parse_datetime)
            .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
            .ok_or_else(|| wrong_type(path, "datetime", value)),
        FieldType::Enum(allowed) => match value {
            Value::String(s) if allowed.iter().any(|a| a == s) => Ok(value.clone()),
            Value::String(s) => Err(SchemaValidationError::new(
                path,
                SchemaErrorKind::InvalidEnumValue {
                    value: s.clone(),
                    allowed: allowed.clone(),
                },
            )),
            _ => Err(wrong_type(path, "string", value)),
        },
        FieldType::List(inner) => {
            let Value::Array(items) = value else {
                return Err(wrong_type(path, &ty.describe(), value));
            };
            items
                .iter()
                .enumerate()
                .map(|(i, item)| validate_value(inner, item, &format!("{}[{}]", path, i), keep))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        FieldType::Map(inner) => {
            let Value::Object(obj) = value else {
                return Err(wrong_type(path, &ty.describe(), value));
            };
            let mut out = Map::new();
            for (k, v) in obj {
                let checked = if v.is_null() && keep.keeps(k) {
                    Value::Null
                } else {
                    validate_value(inner, v, &join_key(path, k), &keep.descend(k))?
                };
                out.insert(k.clone(), checked);
            }
            Ok(Value::Object(out))
        }
        FieldType::Object(schema) => validate_object(schema, value, path, keep).map(Value::from),
        FieldType::Union(members) => {
            for member in members {
                if let Ok(v) = validate_value(member, value, path, keep) {
                    return Ok(v);
                }
            }
            Err(wrong_type(path, &ty.describe(), value))
        }
        FieldType::Nullable(inner) => match value {
            Value::Null => Ok(Value::Null),
            _ => validate_value(inner, value, path, keep),
        },
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(s).map(|dt| dt.date_naive()))
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn wrong_type(path: &str, expected: &str, found: &Value) -> SchemaValidationError {
    SchemaValidationError::new(
        path,
        SchemaErrorKind::WrongType {
            expected: expected.to_string(),
            found: json_type_name(found),
        },
    )
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
