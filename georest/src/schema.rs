//! Field schema registry and record values.
//!
//! A [`Schema`] describes the fields of a record type once, at startup. Every field has an
//! explicit [`FieldKind`]; validation and serialization dispatch on that kind.

use std::sync::Arc;

use ahash::AHashMap;
use geo_types::Geometry;
use serde_json::Value as JsonValue;

use crate::error::ConfigError;
use crate::geometry::{GeometryField, GeometryKind};

/// Value computed from a record for a read-only property.
pub type ComputedFn = fn(&Record) -> JsonValue;

/// Geometry computed from a record for a read-only geometry field.
pub type ComputedGeometryFn = fn(&Record) -> Option<Geometry<f64>>;

/// Kind of a field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// 64-bit integer.
    Integer,
    /// Floating point number.
    Float,
    /// String.
    Text,
    /// Boolean.
    Boolean,
    /// Any JSON value.
    Json,
    /// Stored geometry of the given kind.
    Geometry(GeometryKind),
    /// Read-only property computed from the record.
    Computed(ComputedFn),
    /// Read-only geometry computed from the record.
    ComputedGeometry(ComputedGeometryFn),
}

impl FieldKind {
    /// Returns true for stored and computed geometry fields.
    pub fn is_geometry(&self) -> bool {
        matches!(self, FieldKind::Geometry(_) | FieldKind::ComputedGeometry(_))
    }

    /// Returns true for computed fields.
    pub fn is_computed(&self) -> bool {
        matches!(self, FieldKind::Computed(_) | FieldKind::ComputedGeometry(_))
    }

    fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Float => "number",
            FieldKind::Text => "string",
            FieldKind::Boolean => "boolean",
            FieldKind::Json => "JSON value",
            FieldKind::Geometry(_) | FieldKind::ComputedGeometry(_) => "geometry",
            FieldKind::Computed(_) => "value",
        }
    }
}

/// Value of a single record field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// No value.
    #[default]
    Null,
    /// Native geometry.
    Geometry(Geometry<f64>),
    /// Any other value.
    Json(JsonValue),
}

impl FieldValue {
    /// Returns true for [`FieldValue::Null`] and JSON `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null | FieldValue::Json(JsonValue::Null))
    }

    /// Geometry stored in the value.
    pub fn as_geometry(&self) -> Option<&Geometry<f64>> {
        match self {
            FieldValue::Geometry(geometry) => Some(geometry),
            _ => None,
        }
    }

    /// JSON value stored in the value.
    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            FieldValue::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Integer stored in the value.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_json().and_then(JsonValue::as_i64)
    }

    /// String stored in the value.
    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(JsonValue::as_str)
    }
}

impl From<Geometry<f64>> for FieldValue {
    fn from(value: Geometry<f64>) -> Self {
        Self::Geometry(value)
    }
}

impl From<geo_types::Point<f64>> for FieldValue {
    fn from(value: geo_types::Point<f64>) -> Self {
        Self::Geometry(value.into())
    }
}

impl From<geo_types::Polygon<f64>> for FieldValue {
    fn from(value: geo_types::Polygon<f64>) -> Self {
        Self::Geometry(value.into())
    }
}

impl From<geo_types::LineString<f64>> for FieldValue {
    fn from(value: geo_types::LineString<f64>) -> Self {
        Self::Geometry(value.into())
    }
}

impl From<JsonValue> for FieldValue {
    fn from(value: JsonValue) -> Self {
        Self::Json(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Json(value.into())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Json(value.into())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Json(value.into())
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Json(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Json(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Json(value.into())
    }
}

/// Flat set of field values of one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: AHashMap<String, FieldValue>,
}

impl Record {
    /// Empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the field value and returns the record.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    /// Sets the field value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(field.into(), value.into());
    }

    /// Value of the field, if set.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// Geometry stored in the field.
    pub fn geometry(&self, field: &str) -> Option<&Geometry<f64>> {
        self.get(field).and_then(FieldValue::as_geometry)
    }

    /// Returns true if the field has a value (including `Null`).
    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Overwrites fields of `self` with the fields set in `other`.
    pub fn merge(&mut self, other: Record) {
        self.values.extend(other.values);
    }

    /// Number of fields set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over set fields in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Description of a single field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field name.
    pub name: String,
    /// Field kind.
    pub kind: FieldKind,
    /// Value must be present on create and full update.
    pub required: bool,
    /// Field is serialized but never written from input.
    pub read_only: bool,
    /// Field is accepted from input but never serialized.
    pub write_only: bool,
    /// `null` is an acceptable input value.
    pub nullable: bool,
}

impl FieldSpec {
    /// Optional, writable, non-nullable field.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let read_only = kind.is_computed();
        Self {
            name: name.into(),
            kind,
            required: false,
            read_only,
            write_only: false,
            nullable: false,
        }
    }

    /// Marks the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field as read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Marks the field as write-only.
    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    /// Allows `null` input.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Returns true if the field accepts input.
    pub fn is_writable(&self) -> bool {
        !self.read_only && !self.kind.is_computed()
    }

    /// Validates and converts one input value.
    pub fn to_internal_value(&self, value: &JsonValue) -> Result<FieldValue, String> {
        let is_blank = matches!(value, JsonValue::String(s) if s.is_empty());
        if is_blank && (self.required || matches!(self.kind, FieldKind::Geometry(_))) {
            return if self.required {
                Err(REQUIRED.into())
            } else {
                Ok(FieldValue::Null)
            };
        }

        if value.is_null() {
            return if self.nullable {
                Ok(FieldValue::Null)
            } else if self.required {
                Err(REQUIRED.into())
            } else {
                Err("This field may not be null.".into())
            };
        }

        let invalid = || format!("A valid {} is required.", self.kind.type_name());

        match self.kind {
            FieldKind::Integer => match value {
                JsonValue::Number(n) => n.as_i64().map(FieldValue::from).ok_or_else(invalid),
                JsonValue::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(FieldValue::from)
                    .map_err(|_| invalid()),
                _ => Err(invalid()),
            },
            FieldKind::Float => match value {
                JsonValue::Number(n) => n.as_f64().map(FieldValue::from).ok_or_else(invalid),
                JsonValue::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(FieldValue::from)
                    .ok_or_else(invalid),
                _ => Err(invalid()),
            },
            FieldKind::Text => match value {
                JsonValue::String(s) => Ok(FieldValue::from(s.as_str())),
                JsonValue::Number(n) => Ok(FieldValue::from(n.to_string())),
                _ => Err(invalid()),
            },
            FieldKind::Boolean => match value {
                JsonValue::Bool(b) => Ok(FieldValue::from(*b)),
                JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "yes" | "on" => Ok(FieldValue::from(true)),
                    "false" | "0" | "no" | "off" => Ok(FieldValue::from(false)),
                    _ => Err(invalid()),
                },
                _ => Err(invalid()),
            },
            FieldKind::Json => Ok(FieldValue::Json(value.clone())),
            FieldKind::Geometry(kind) => match GeometryField::new(kind).decode(value) {
                Ok(Some(geometry)) => Ok(FieldValue::Geometry(geometry)),
                Ok(None) if self.required => Err(REQUIRED.into()),
                Ok(None) => Ok(FieldValue::Null),
                Err(err) => Err(err.to_string()),
            },
            FieldKind::Computed(_) | FieldKind::ComputedGeometry(_) => Ok(FieldValue::Null),
        }
    }
}

/// Message for a missing required value.
pub const REQUIRED: &str = "This field is required.";

/// Ordered set of fields of a record type.
#[derive(Debug, Clone)]
pub struct Schema {
    primary_key: String,
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Creates a schema with an integer read-only primary key field.
    pub fn new(primary_key: impl Into<String>) -> Self {
        let primary_key = primary_key.into();
        Self {
            fields: vec![FieldSpec::new(primary_key.clone(), FieldKind::Integer).read_only()],
            primary_key,
        }
    }

    /// Adds a field. A field with the same name is replaced.
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Wraps the schema into an `Arc` to share it between serializers and stores.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Name of the primary key field.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Field with the given name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the field if it is declared with a geometry kind.
    pub fn geometry_field(&self, name: &str) -> Result<&FieldSpec, ConfigError> {
        let field = self
            .field(name)
            .ok_or_else(|| ConfigError::UnknownField(name.to_string()))?;
        if !field.kind.is_geometry() {
            return Err(ConfigError::NotAGeometryField(name.to_string()));
        }

        Ok(field)
    }
}
