//! Declarative payload schemas.
//!
//! A [`Schema`] is plain data: an ordered list of [`Field`] descriptors plus an
//! [`ExtraPolicy`] for undeclared keys. Schemas are built once (usually inside
//! `lazy_static!`) and shared by every object of the type they describe.
//! Composition goes through [`Schema::extend`], never through a type
//! hierarchy.
//!
//! Source keys are matched *after* case normalization, so they are written in
//! snake_case.

mod validate;

use crate::error::{SchemaErrorKind, SchemaValidationError};
use crate::mapping::KeepNulls;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

// ─── FieldType ───────────────────────────────────────────────────────────────

/// Expected shape of a single value.
#[derive(Debug, Clone)]
pub enum FieldType {
    Any,
    Bool,
    /// JSON integers only; booleans and floats are rejected.
    Int,
    /// Any JSON number; integers are widened.
    Float,
    String,
    /// `YYYY-MM-DD`, or an RFC 3339 timestamp truncated to its date.
    Date,
    /// RFC 3339 (or naive ISO-8601, read as UTC); normalised to UTC.
    DateTime,
    Enum(Vec<String>),
    List(Box<FieldType>),
    /// String-keyed object whose values share one type.
    Map(Box<FieldType>),
    Object(Arc<Schema>),
    /// Members are tried left to right; the first one that accepts the value
    /// wins. The order is part of the contract: `Int | Float | String` keeps
    /// `1` an integer and only falls through to `String` for text.
    Union(Vec<FieldType>),
    Nullable(Box<FieldType>),
}

impl FieldType {
    pub fn list(inner: FieldType) -> Self {
        FieldType::List(Box::new(inner))
    }

    pub fn map_of(inner: FieldType) -> Self {
        FieldType::Map(Box::new(inner))
    }

    pub fn nullable(inner: FieldType) -> Self {
        FieldType::Nullable(Box::new(inner))
    }

    pub fn object(schema: Schema) -> Self {
        FieldType::Object(Arc::new(schema))
    }

    pub fn union(members: impl IntoIterator<Item = FieldType>) -> Self {
        FieldType::Union(members.into_iter().collect())
    }

    pub fn enumeration(allowed: &[&str]) -> Self {
        FieldType::Enum(allowed.iter().map(|s| s.to_string()).collect())
    }

    /// Whether an explicit `null` is a legal value.
    pub fn accepts_null(&self) -> bool {
        match self {
            FieldType::Any | FieldType::Nullable(_) => true,
            FieldType::Union(members) => members.iter().any(FieldType::accepts_null),
            _ => false,
        }
    }

    /// Human-readable description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            FieldType::Any => "any".to_string(),
            FieldType::Bool => "bool".to_string(),
            FieldType::Int => "int".to_string(),
            FieldType::Float => "float".to_string(),
            FieldType::String => "string".to_string(),
            FieldType::Date => "date".to_string(),
            FieldType::DateTime => "datetime".to_string(),
            FieldType::Enum(allowed) => format!("one of {:?}", allowed),
            FieldType::List(inner) => format!("list of {}", inner.describe()),
            FieldType::Map(inner) => format!("map of {}", inner.describe()),
            FieldType::Object(_) => "object".to_string(),
            FieldType::Union(members) => members
                .iter()
                .map(FieldType::describe)
                .collect::<Vec<_>>()
                .join(" | "),
            FieldType::Nullable(inner) => format!("{} or null", inner.describe()),
        }
    }
}

// ─── Field ───────────────────────────────────────────────────────────────────

/// What happens when a field's source key is absent.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Required,
    /// Filled with the given value.
    Default(Value),
    /// Left out of the record.
    Optional,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub source: String,
    pub target: String,
    pub ty: FieldType,
    pub presence: Presence,
}

impl Field {
    pub fn required(key: &str, ty: FieldType) -> Self {
        Self::new(key, ty, Presence::Required)
    }

    pub fn optional(key: &str, ty: FieldType) -> Self {
        Self::new(key, ty, Presence::Optional)
    }

    pub fn with_default(key: &str, ty: FieldType, default: Value) -> Self {
        Self::new(key, ty, Presence::Default(default))
    }

    /// Store the value under a different attribute name.
    pub fn rename(mut self, target: &str) -> Self {
        self.target = target.to_string();
        self
    }

    fn new(key: &str, ty: FieldType, presence: Presence) -> Self {
        Self {
            source: key.to_string(),
            target: key.to_string(),
            ty,
            presence,
        }
    }
}

// ─── Schema ──────────────────────────────────────────────────────────────────

/// Policy for keys the schema does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtraPolicy {
    /// Fail on the first undeclared key.
    Reject,
    /// Drop undeclared keys silently.
    #[default]
    Ignore,
    /// Keep undeclared keys and values exactly as received.
    Passthrough,
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<Field>,
    extra: ExtraPolicy,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn extra_policy(&self) -> ExtraPolicy {
        self.extra
    }

    pub fn field(&self, target: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.target == target)
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.target.as_str())
    }

    /// A new schema with `other`'s fields added. A field whose target key is
    /// already present replaces the existing descriptor in place. The extra
    /// policy of `self` is kept.
    pub fn extend(&self, other: &Schema) -> Schema {
        let mut fields = self.fields.clone();
        for field in &other.fields {
            match fields.iter_mut().find(|f| f.target == field.target) {
                Some(existing) => *existing = field.clone(),
                None => fields.push(field.clone()),
            }
        }
        Schema {
            fields,
            extra: self.extra,
        }
    }

    /// Copy of this schema with a different extra-key policy.
    pub fn with_extra_policy(&self, extra: ExtraPolicy) -> Schema {
        Schema {
            fields: self.fields.clone(),
            extra,
        }
    }

    /// Validate a raw payload into a canonical [`Record`].
    ///
    /// Nulls on fields that cannot hold one are treated as absent.
    pub fn validate(&self, raw: &Value) -> Result<Record, SchemaValidationError> {
        self.validate_with(raw, &KeepNulls::None)
    }

    /// [`Schema::validate`], but nulls covered by `keep` are stored as `null`
    /// instead of being dropped or replaced by the field default. `keep`
    /// descends through nested objects the same way [`crate::mapping::from_api`]
    /// does.
    pub fn validate_with(
        &self,
        raw: &Value,
        keep: &KeepNulls,
    ) -> Result<Record, SchemaValidationError> {
        validate::validate_object(self, raw, "", keep)
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<Field>,
    extra: ExtraPolicy,
}

impl SchemaBuilder {
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn extra(mut self, extra: ExtraPolicy) -> Self {
        self.extra = extra;
        self
    }

    /// Fails if two fields share a target key.
    pub fn build(self) -> Result<Schema, SchemaValidationError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.target.as_str()) {
                return Err(SchemaValidationError::new(
                    field.target.clone(),
                    SchemaErrorKind::DuplicateTarget,
                ));
            }
        }
        Ok(Schema {
            fields: self.fields,
            extra: self.extra,
        })
    }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// Schema-validated, case-normalised attribute map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keep only the listed keys.
    pub fn retain_only(mut self, keys: &[&str]) -> Record {
        self.0.retain(|k, _| keys.contains(&k.as_str()));
        self
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub(crate) fn insert(&mut self, key: String, value: Value) {
        self.0.insert(key, value);
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        record.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_rejects_duplicate_targets() {
        let err = Schema::builder()
            .field(Field::required("id", FieldType::String))
            .field(Field::optional("project_id", FieldType::String).rename("id"))
            .build()
            .unwrap_err();
        assert_eq!(err.kind, SchemaErrorKind::DuplicateTarget);
        assert_eq!(err.path, "id");
    }

    #[test]
    fn test_extend_appends_and_replaces() {
        let base = Schema::builder()
            .field(Field::required("id", FieldType::String))
            .field(Field::optional("name", FieldType::String))
            .build()
            .unwrap();
        let more = Schema::builder()
            .field(Field::required("name", FieldType::String))
            .field(Field::optional("created", FieldType::DateTime))
            .build()
            .unwrap();

        let merged = base.extend(&more);
        let targets: Vec<_> = merged.targets().collect();
        assert_eq!(targets, ["id", "name", "created"]);
        assert_eq!(merged.field("name").unwrap().presence, Presence::Required);
        // The originals are untouched.
        assert_eq!(base.fields().len(), 2);
    }

    #[test]
    fn test_accepts_null() {
        assert!(FieldType::nullable(FieldType::Int).accepts_null());
        assert!(FieldType::union([FieldType::Int, FieldType::nullable(FieldType::String)])
            .accepts_null());
        assert!(!FieldType::Int.accepts_null());
    }

    #[test]
    fn test_record_retain_only() {
        let schema = Schema::builder()
            .field(Field::required("a", FieldType::Int))
            .field(Field::required("b", FieldType::Int))
            .build()
            .unwrap();
        let record = schema.validate(&json!({"a": 1, "b": 2})).unwrap();
        let kept = record.retain_only(&["a"]);
        assert_eq!(kept.into_value(), json!({"a": 1}));
    }

    #[test]
    fn test_describe_union() {
        let ty = FieldType::union([FieldType::Int, FieldType::Float, FieldType::String]);
        assert_eq!(ty.describe(), "int | float | string");
    }
}
