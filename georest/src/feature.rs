//! GeoJSON `Feature` and `FeatureCollection` serialization of records.

use std::sync::Arc;

use georest_types::Rect;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{ConfigError, ValidationErrors, NON_FIELD_ERRORS};
use crate::geometry::{encode_geometry, geometry_extent, parse_geometry, GeometryField, GeometryKind};
use crate::schema::{FieldKind, FieldValue, Record, Schema, REQUIRED};

/// Which field is written into the `id` member of a feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdField {
    /// Primary key of the schema, unless it is excluded from the serialized fields.
    #[default]
    Default,
    /// The named field.
    Named(String),
    /// Features have no `id` member.
    None,
}

/// Configuration of a [`FeatureSerializer`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureOptions {
    /// Field serialized as the feature `geometry`. Mandatory.
    pub geo_field: Option<String>,
    /// Field serialized as the feature `id`.
    pub id_field: IdField,
    /// Geometry field whose extent is serialized as the feature `bbox`.
    pub bbox_field: Option<String>,
    /// Serialize the extent of the `geo_field` as the feature `bbox`.
    pub auto_bbox: bool,
    /// Number of decimal places kept in geometry coordinates.
    pub precision: Option<u32>,
    /// Remove consecutive duplicate points from the geometry.
    pub remove_duplicates: bool,
    /// Serialized fields. `None` means all fields of the schema.
    pub fields: Option<Vec<String>>,
    /// Fields that are never serialized nor accepted.
    pub exclude: Vec<String>,
}

impl FeatureOptions {
    /// Options with the given geometry field and defaults for everything else.
    pub fn new(geo_field: impl Into<String>) -> Self {
        Self {
            geo_field: Some(geo_field.into()),
            ..Default::default()
        }
    }

    /// Sets the id field.
    pub fn with_id_field(mut self, id_field: IdField) -> Self {
        self.id_field = id_field;
        self
    }

    /// Sets the bbox field.
    pub fn with_bbox_field(mut self, bbox_field: impl Into<String>) -> Self {
        self.bbox_field = Some(bbox_field.into());
        self
    }

    /// Enables automatic bbox calculation.
    pub fn with_auto_bbox(mut self, auto_bbox: bool) -> Self {
        self.auto_bbox = auto_bbox;
        self
    }

    /// Sets coordinate precision.
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Enables removal of duplicate points.
    pub fn with_remove_duplicates(mut self, remove_duplicates: bool) -> Self {
        self.remove_duplicates = remove_duplicates;
        self
    }

    /// Limits serialized fields to the given list.
    pub fn with_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Excludes the given fields.
    pub fn with_exclude<S: Into<String>>(mut self, exclude: impl IntoIterator<Item = S>) -> Self {
        self.exclude = exclude.into_iter().map(Into::into).collect();
        self
    }

    fn is_active(&self, name: &str) -> bool {
        !self.exclude.iter().any(|f| f == name)
            && self
                .fields
                .as_ref()
                .map_or(true, |fields| fields.iter().any(|f| f == name))
    }
}

/// Converts records into GeoJSON features and features into records.
#[derive(Debug, Clone)]
pub struct FeatureSerializer {
    schema: Arc<Schema>,
    geo_field: String,
    id_field: Option<String>,
    bbox_field: Option<String>,
    auto_bbox: bool,
    geometry: GeometryField,
    fields: Vec<String>,
}

impl FeatureSerializer {
    /// Validates the options against the schema and creates the serializer.
    pub fn new(schema: Arc<Schema>, options: FeatureOptions) -> Result<Self, ConfigError> {
        let geo_field = options
            .geo_field
            .clone()
            .ok_or(ConfigError::MissingGeoField)?;

        if options.bbox_field.is_some() && options.auto_bbox {
            return Err(ConfigError::ConflictingBbox);
        }

        if !options.is_active(&geo_field) {
            return Err(ConfigError::GeoFieldExcluded(geo_field));
        }

        for name in options.fields.iter().flatten().chain(&options.exclude) {
            if schema.field(name).is_none() {
                return Err(ConfigError::UnknownField(name.clone()));
            }
        }

        let geometry_kind = match schema.geometry_field(&geo_field)?.kind {
            FieldKind::Geometry(kind) => kind,
            _ => GeometryKind::Geometry,
        };

        if let Some(bbox_field) = &options.bbox_field {
            schema.geometry_field(bbox_field)?;
        }

        let id_field = match &options.id_field {
            IdField::Default => {
                let primary_key = schema.primary_key();
                options
                    .is_active(primary_key)
                    .then(|| primary_key.to_string())
            }
            IdField::Named(name) => {
                if schema.field(name).is_none() {
                    return Err(ConfigError::UnknownField(name.clone()));
                }
                Some(name.clone())
            }
            IdField::None => None,
        };

        let fields = schema
            .fields()
            .iter()
            .filter(|f| options.is_active(&f.name))
            .map(|f| f.name.clone())
            .collect();

        let geometry = GeometryField::new(geometry_kind)
            .with_precision(options.precision)
            .with_remove_duplicates(options.remove_duplicates);

        Ok(Self {
            schema,
            geo_field,
            id_field,
            bbox_field: options.bbox_field,
            auto_bbox: options.auto_bbox,
            geometry,
            fields,
        })
    }

    /// Schema of serialized records.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Name of the geometry field.
    pub fn geo_field(&self) -> &str {
        &self.geo_field
    }

    /// Name of the field serialized as the feature id.
    pub fn id_field(&self) -> Option<&str> {
        self.id_field.as_deref()
    }

    /// Serializes a record as a GeoJSON `Feature`.
    ///
    /// Members are written in the order `id`, `type`, `geometry`, `bbox`, `properties`. `id` is
    /// omitted when no id field is configured and `bbox` when neither bbox mode is enabled.
    pub fn to_representation(&self, record: &Record) -> JsonValue {
        let mut feature = Map::new();

        if let Some(id_field) = &self.id_field {
            let id = self.field_value(id_field, record);
            feature.insert("id".into(), value_to_json(&id));
        }

        feature.insert("type".into(), "Feature".into());

        let geometry = self.field_value(&self.geo_field, record);
        let encoded = match &geometry {
            FieldValue::Geometry(g) => self.geometry.encode(g),
            FieldValue::Json(value) => value.clone(),
            FieldValue::Null => JsonValue::Null,
        };
        feature.insert("geometry".into(), encoded);

        if self.auto_bbox {
            feature.insert("bbox".into(), extent_to_json(&geometry));
        } else if let Some(bbox_field) = &self.bbox_field {
            let value = self.field_value(bbox_field, record);
            feature.insert("bbox".into(), extent_to_json(&value));
        }

        let mut properties = Map::new();
        for name in &self.fields {
            if self.is_envelope_field(name) {
                continue;
            }
            let Some(spec) = self.schema.field(name) else {
                continue;
            };
            if spec.write_only {
                continue;
            }

            let value = self.field_value(name, record);
            properties.insert(name.clone(), value_to_json(&value));
        }
        feature.insert("properties".into(), JsonValue::Object(properties));

        JsonValue::Object(feature)
    }

    /// Serializes records as a GeoJSON `FeatureCollection`.
    pub fn to_collection<'a>(&self, records: impl IntoIterator<Item = &'a Record>) -> JsonValue {
        feature_collection(records.into_iter().map(|r| self.to_representation(r)).collect())
    }

    /// Converts a `Feature` (or an already flat object) into a validated record.
    ///
    /// With `partial` set, missing required fields are not reported.
    pub fn to_internal_value(
        &self,
        data: &JsonValue,
        partial: bool,
    ) -> Result<Record, ValidationErrors> {
        let JsonValue::Object(map) = data else {
            return Err(ValidationErrors::single(
                NON_FIELD_ERRORS,
                format!(
                    "Invalid data. Expected a dictionary, but got {}.",
                    json_type_name(data)
                ),
            ));
        };

        let flat = if map.contains_key("properties") {
            self.flatten_feature(map)?
        } else if map.contains_key("features") {
            return Err(ValidationErrors::single(
                NON_FIELD_ERRORS,
                "Expected a Feature, got a FeatureCollection.",
            ));
        } else {
            map.clone()
        };

        self.validate(&flat, partial)
    }

    /// Converts every feature of a `FeatureCollection` (or a JSON array of features) into a
    /// record. Errors of the item `i` are reported under `features.<i>.<field>`.
    pub fn to_internal_values(
        &self,
        data: &JsonValue,
        partial: bool,
    ) -> Result<Vec<Record>, ValidationErrors> {
        let items = match data {
            JsonValue::Object(map) => match map.get("features") {
                Some(JsonValue::Array(items)) => items,
                _ => {
                    return Err(ValidationErrors::single(
                        NON_FIELD_ERRORS,
                        "Expected a FeatureCollection.",
                    ))
                }
            },
            JsonValue::Array(items) => items,
            other => {
                return Err(ValidationErrors::single(
                    NON_FIELD_ERRORS,
                    format!(
                        "Expected a list of items but got type {}.",
                        json_type_name(other)
                    ),
                ))
            }
        };

        let mut records = Vec::with_capacity(items.len());
        let mut errors = ValidationErrors::new();
        for (index, item) in items.iter().enumerate() {
            match self.to_internal_value(item, partial) {
                Ok(record) => records.push(record),
                Err(item_errors) => errors.extend_prefixed(&format!("features.{index}"), item_errors),
            }
        }

        errors.into_result().map(|_| records)
    }

    fn is_envelope_field(&self, name: &str) -> bool {
        self.id_field.as_deref() == Some(name)
            || self.geo_field == name
            || self.bbox_field.as_deref() == Some(name)
    }

    fn field_value(&self, name: &str, record: &Record) -> FieldValue {
        match self.schema.field(name).map(|f| f.kind) {
            Some(FieldKind::Computed(compute)) => FieldValue::Json(compute(record)),
            Some(FieldKind::ComputedGeometry(compute)) => {
                compute(record).map_or(FieldValue::Null, FieldValue::Geometry)
            }
            _ => record.get(name).cloned().unwrap_or_default(),
        }
    }

    fn flatten_feature(&self, feature: &Map<String, JsonValue>) -> Result<Map<String, JsonValue>, ValidationErrors> {
        let mut flat = match feature.get("properties") {
            Some(JsonValue::Object(properties)) => properties.clone(),
            Some(JsonValue::Null) | None => Map::new(),
            Some(_) => {
                return Err(ValidationErrors::single(
                    "properties",
                    "Expected a dictionary of properties.",
                ))
            }
        };

        if let Some(geometry) = feature.get("geometry") {
            flat.insert(self.geo_field.clone(), geometry.clone());
        }

        if let (Some(bbox_field), Some(bbox)) = (&self.bbox_field, feature.get("bbox")) {
            let value = match bbox {
                JsonValue::Null => JsonValue::Null,
                other => {
                    let rect = parse_bbox(other).ok_or_else(|| {
                        ValidationErrors::single(
                            bbox_field.clone(),
                            "Invalid bbox, expected [minx, miny, maxx, maxy].",
                        )
                    })?;
                    let polygon = geo_types::Geometry::Polygon(rect.to_polygon());
                    encode_geometry(&polygon, &Default::default(), false)
                }
            };
            flat.insert(bbox_field.clone(), value);
        }

        if let (Some(id_field), Some(id)) = (&self.id_field, feature.get("id")) {
            flat.insert(id_field.clone(), id.clone());
        }

        Ok(flat)
    }

    fn validate(
        &self,
        flat: &Map<String, JsonValue>,
        partial: bool,
    ) -> Result<Record, ValidationErrors> {
        let mut record = Record::new();
        let mut errors = ValidationErrors::new();

        for name in &self.fields {
            let Some(spec) = self.schema.field(name) else {
                continue;
            };
            if !spec.is_writable() {
                continue;
            }

            match flat.get(name) {
                None => {
                    if spec.required && !partial {
                        errors.add(name.clone(), REQUIRED);
                    }
                }
                Some(value) => match spec.to_internal_value(value) {
                    Ok(value) => record.set(name.clone(), value),
                    Err(message) => errors.add(name.clone(), message),
                },
            }
        }

        errors.into_result().map(|_| record)
    }
}

/// Wraps serialized features into a `FeatureCollection`.
pub fn feature_collection(features: Vec<JsonValue>) -> JsonValue {
    let mut collection = Map::new();
    collection.insert("type".into(), "FeatureCollection".into());
    collection.insert("features".into(), JsonValue::Array(features));
    JsonValue::Object(collection)
}

fn value_to_json(value: &FieldValue) -> JsonValue {
    match value {
        FieldValue::Null => JsonValue::Null,
        FieldValue::Geometry(geometry) => encode_geometry(geometry, &Default::default(), false),
        FieldValue::Json(value) => value.clone(),
    }
}

fn extent_to_json(value: &FieldValue) -> JsonValue {
    let extent = match value {
        FieldValue::Geometry(geometry) => geometry_extent(geometry),
        FieldValue::Json(value) => parse_geometry(value)
            .ok()
            .flatten()
            .and_then(|g| geometry_extent(&g)),
        FieldValue::Null => None,
    };

    extent.map_or(JsonValue::Null, |rect| {
        JsonValue::from(rect.to_array().to_vec())
    })
}

fn parse_bbox(value: &JsonValue) -> Option<Rect> {
    let values = value
        .as_array()?
        .iter()
        .map(JsonValue::as_f64)
        .collect::<Option<Vec<_>>>()?;
    match values.as_slice() {
        [x_min, y_min, x_max, y_max] => Some(Rect::new(*x_min, *y_min, *x_max, *y_max)),
        _ => None,
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "str",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use assert_matches::assert_matches;
    use geo_types::{line_string, point, polygon, Geometry};
    use serde_json::json;

    fn location_schema() -> Arc<Schema> {
        Schema::new("id")
            .with_field(FieldSpec::new("name", FieldKind::Text).required())
            .with_field(FieldSpec::new("slug", FieldKind::Text))
            .with_field(FieldSpec::new("timestamp", FieldKind::Text).nullable())
            .with_field(FieldSpec::new("secret", FieldKind::Text).write_only())
            .with_field(
                FieldSpec::new("geometry", FieldKind::Geometry(GeometryKind::Geometry)).required(),
            )
            .with_field(
                FieldSpec::new("bbox_geometry", FieldKind::Geometry(GeometryKind::Polygon))
                    .nullable(),
            )
            .into_shared()
    }

    fn location() -> Record {
        Record::new()
            .with("id", 1)
            .with("name", "geojson test")
            .with("slug", "geojson-test")
            .with("secret", "hidden")
            .with("geometry", point!(x: 135.0, y: 45.0))
    }

    fn serializer(options: FeatureOptions) -> FeatureSerializer {
        FeatureSerializer::new(location_schema(), options).unwrap()
    }

    #[test]
    fn configuration_errors() {
        let schema = location_schema();
        assert_matches!(
            FeatureSerializer::new(schema.clone(), FeatureOptions::default()),
            Err(ConfigError::MissingGeoField)
        );
        assert_matches!(
            FeatureSerializer::new(
                schema.clone(),
                FeatureOptions::new("geometry").with_exclude(["geometry"])
            ),
            Err(ConfigError::GeoFieldExcluded(_))
        );
        assert_matches!(
            FeatureSerializer::new(
                schema.clone(),
                FeatureOptions::new("geometry").with_fields(["name"])
            ),
            Err(ConfigError::GeoFieldExcluded(_))
        );
        assert_matches!(
            FeatureSerializer::new(
                schema.clone(),
                FeatureOptions::new("geometry")
                    .with_bbox_field("bbox_geometry")
                    .with_auto_bbox(true)
            ),
            Err(ConfigError::ConflictingBbox)
        );
        assert_matches!(
            FeatureSerializer::new(schema.clone(), FeatureOptions::new("name")),
            Err(ConfigError::NotAGeometryField(_))
        );
        assert_matches!(
            FeatureSerializer::new(schema, FeatureOptions::new("location")),
            Err(ConfigError::UnknownField(_))
        );
    }

    #[test]
    fn feature_format() {
        let feature = serializer(FeatureOptions::new("geometry")).to_representation(&location());
        assert_eq!(
            feature,
            json!({
                "id": 1,
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [135.0, 45.0]},
                "properties": {
                    "name": "geojson test",
                    "slug": "geojson-test",
                    "timestamp": null,
                    "bbox_geometry": null,
                },
            })
        );

        let keys: Vec<_> = feature.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["id", "type", "geometry", "properties"]);
    }

    #[test]
    fn id_variants() {
        let named = serializer(FeatureOptions::new("geometry").with_id_field(IdField::Named("slug".into())));
        let feature = named.to_representation(&location());
        assert_eq!(feature["id"], "geojson-test");
        assert!(feature["properties"].get("slug").is_none());
        assert_eq!(feature["properties"]["name"], "geojson test");

        let none = serializer(FeatureOptions::new("geometry").with_id_field(IdField::None));
        let feature = none.to_representation(&location());
        assert!(feature.get("id").is_none());
        assert_eq!(feature["properties"]["name"], "geojson test");

        let excluded = serializer(FeatureOptions::new("geometry").with_exclude(["id"]));
        assert!(excluded.to_representation(&location()).get("id").is_none());
    }

    #[test]
    fn auto_bbox() {
        let serializer = serializer(FeatureOptions::new("geometry").with_auto_bbox(true));
        let record = location().with(
            "geometry",
            polygon![(x: 0.0, y: 0.0), (x: 0.0, y: 2.0), (x: 3.0, y: 2.0), (x: 0.0, y: 0.0)],
        );
        let feature = serializer.to_representation(&record);
        assert_eq!(feature["bbox"], json!([0.0, 0.0, 3.0, 2.0]));
        assert!(feature["geometry"].get("bbox").is_none());

        let keys: Vec<_> = feature.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["id", "type", "geometry", "bbox", "properties"]);
    }

    #[test]
    fn bbox_field() {
        let serializer = serializer(FeatureOptions::new("geometry").with_bbox_field("bbox_geometry"));
        let feature = serializer.to_representation(&location());
        assert_eq!(feature["bbox"], JsonValue::Null);
        assert!(feature["properties"].get("bbox_geometry").is_none());

        let record = location().with(
            "bbox_geometry",
            georest_types::Rect::new(1.0, 2.0, 3.0, 4.0).to_polygon(),
        );
        let feature = serializer.to_representation(&record);
        assert_eq!(feature["bbox"], json!([1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn precision_and_dedupe() {
        let serializer = serializer(
            FeatureOptions::new("geometry")
                .with_precision(2)
                .with_remove_duplicates(true),
        );
        let record = location().with(
            "geometry",
            geo_types::line_string![
                (x: 1.001, y: 1.0),
                (x: 1.002, y: 1.0),
                (x: 1.003, y: 1.0),
                (x: 1.0, y: 1.004),
            ],
        );
        let feature = serializer.to_representation(&record);
        assert_eq!(
            feature["geometry"],
            json!({"type": "LineString", "coordinates": [[1.0, 1.0], [1.0, 1.0]]})
        );
    }

    #[test]
    fn computed_geometry() {
        fn masked(record: &Record) -> Option<Geometry<f64>> {
            match record.get("name").and_then(FieldValue::as_str) {
                Some("hidden geometry") => Some(point!(x: 0.0, y: 0.0).into()),
                Some("None value") => None,
                _ => record.geometry("geometry").cloned(),
            }
        }

        let schema = Schema::new("id")
            .with_field(FieldSpec::new("name", FieldKind::Text))
            .with_field(FieldSpec::new("geometry", FieldKind::Geometry(GeometryKind::Point)))
            .with_field(FieldSpec::new("masked", FieldKind::ComputedGeometry(masked)))
            .into_shared();
        let serializer = FeatureSerializer::new(
            schema,
            FeatureOptions::new("masked").with_exclude(["geometry"]),
        )
        .unwrap();

        let hidden = Record::new()
            .with("id", 1)
            .with("name", "hidden geometry")
            .with("geometry", point!(x: 12.0, y: 41.0));
        let feature = serializer.to_representation(&hidden);
        assert_eq!(feature["geometry"], json!({"type": "Point", "coordinates": [0.0, 0.0]}));
        assert_eq!(feature["properties"], json!({"name": "hidden geometry"}));

        let none = Record::new().with("id", 2).with("name", "None value");
        assert_eq!(serializer.to_representation(&none)["geometry"], JsonValue::Null);
    }

    #[test]
    fn computed_property() {
        fn fancy_name(record: &Record) -> JsonValue {
            record
                .get("name")
                .and_then(FieldValue::as_str)
                .map(|name| format!("Kool {name}"))
                .into()
        }

        let schema = Schema::new("id")
            .with_field(FieldSpec::new("name", FieldKind::Text))
            .with_field(FieldSpec::new("fancy_name", FieldKind::Computed(fancy_name)))
            .with_field(FieldSpec::new("geometry", FieldKind::Geometry(GeometryKind::Point)))
            .into_shared();
        let serializer = FeatureSerializer::new(schema, FeatureOptions::new("geometry")).unwrap();
        let record = Record::new().with("id", 1).with("name", "geojson test");
        let feature = serializer.to_representation(&record);
        assert_eq!(feature["properties"]["fancy_name"], "Kool geojson test");
        assert_eq!(feature["geometry"], JsonValue::Null);

        let input = json!({"properties": {"name": "x", "fancy_name": "ignored"}});
        let record = serializer.to_internal_value(&input, false).unwrap();
        assert!(!record.contains("fancy_name"));
    }

    #[test]
    fn feature_input_is_flattened() {
        let serializer = serializer(FeatureOptions::new("geometry"));
        let input = json!({
            "type": "Feature",
            "id": 42,
            "geometry": {"type": "Point", "coordinates": [10.1, 10.1]},
            "properties": {"name": "point?", "details": "http://spoofed/"},
            "details": "http://spoofed/",
        });
        let record = serializer.to_internal_value(&input, false).unwrap();

        assert_eq!(record.get("name"), Some(&FieldValue::from("point?")));
        assert_eq!(
            record.geometry("geometry"),
            Some(&Geometry::Point(point!(x: 10.1, y: 10.1)))
        );
        assert!(!record.contains("details"));
        assert!(!record.contains("id"));
    }

    #[test]
    fn flat_input_passes_through() {
        let serializer = serializer(FeatureOptions::new("geometry"));
        let input = json!({"name": "WKT input", "geometry": "POINT (12.49 41.89)"});
        let record = serializer.to_internal_value(&input, false).unwrap();
        assert_matches!(record.geometry("geometry"), Some(Geometry::Point(_)));
    }

    #[test]
    fn bbox_input() {
        let serializer = serializer(FeatureOptions::new("geometry").with_bbox_field("bbox_geometry"));
        let input = json!({
            "type": "Feature",
            "bbox": [0.0, 0.0, 1.0, 2.0],
            "geometry": "POINT (0.5 0.5)",
            "properties": {"name": "boxed"},
        });
        let record = serializer.to_internal_value(&input, false).unwrap();
        let expected: Geometry<f64> = georest_types::Rect::new(0.0, 0.0, 1.0, 2.0).to_polygon().into();
        assert_eq!(record.geometry("bbox_geometry"), Some(&expected));

        let input = json!({"bbox": [0.0, 0.0], "properties": {"name": "boxed"}});
        let errors = serializer.to_internal_value(&input, true).unwrap_err();
        assert!(errors.get("bbox_geometry").is_some());
    }

    #[test]
    fn validation_messages() {
        let serializer = serializer(FeatureOptions::new("geometry"));

        let errors = serializer
            .to_internal_value(&json!({"properties": {"name": "empty input test"}}), false)
            .unwrap_err();
        assert_eq!(errors.get("geometry"), Some(&[REQUIRED.to_string()][..]));

        let errors = serializer
            .to_internal_value(&json!({"name": "empty", "geometry": ""}), false)
            .unwrap_err();
        assert_eq!(errors.get("geometry"), Some(&[REQUIRED.to_string()][..]));

        let errors = serializer
            .to_internal_value(&json!({"geometry": "POINT (1 1)"}), false)
            .unwrap_err();
        assert_eq!(errors.get("name"), Some(&[REQUIRED.to_string()][..]));

        let errors = serializer.to_internal_value(&json!([1, 2]), false).unwrap_err();
        assert!(errors.get(NON_FIELD_ERRORS).is_some());
    }

    #[test]
    fn partial_input_skips_required() {
        let serializer = serializer(FeatureOptions::new("geometry"));
        let record = serializer
            .to_internal_value(&json!({"properties": {"slug": "patched"}}), true)
            .unwrap();
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn collections() {
        let serializer = serializer(FeatureOptions::new("geometry"));
        let records = vec![location(), location().with("id", 2)];
        let collection = serializer.to_collection(&records);
        assert_eq!(collection["type"], "FeatureCollection");
        assert_eq!(collection["features"].as_array().map(Vec::len), Some(2));
        assert_eq!(collection["features"][1]["id"], 2);

        let input = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": "POINT (1 1)", "properties": {"name": "a"}},
                {"type": "Feature", "geometry": "POINT (2 2)", "properties": {}},
            ],
        });
        let errors = serializer.to_internal_values(&input, false).unwrap_err();
        assert!(errors.get("features.1.name").is_some());
        assert!(errors.get("features.0.name").is_none());
    }
}
