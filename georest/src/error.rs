//! Error types used by the crate.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Key used for errors that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Invalid serializer, filter or endpoint configuration. Raised when the configuration is built,
/// never while handling a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No geometry field was configured for a feature serializer.
    #[error("geo_field must be specified for a feature serializer")]
    MissingGeoField,
    /// The geometry field is excluded from the serialized fields.
    #[error("geo_field {0:?} must not be excluded from the serialized fields")]
    GeoFieldExcluded(String),
    /// Field is not declared in the schema.
    #[error("field {0:?} is not declared in the schema")]
    UnknownField(String),
    /// Field is used as a geometry but is not declared with a geometry kind.
    #[error("field {0:?} is not a geometry field")]
    NotAGeometryField(String),
    /// Both an explicit bbox field and automatic bbox calculation were requested.
    #[error("bbox_field and auto_bbox cannot be used at the same time")]
    ConflictingBbox,
    /// Distance ordering was requested over a store that cannot order by distance.
    #[error("the store does not support ordering by distance")]
    DistanceOrderingUnsupported,
}

/// Malformed query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Parameter value could not be parsed.
    #[error("{0}")]
    Parse(String),
}

/// Per-field validation messages, serialized as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Empty error set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Error set with a single message for `field`.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Adds a message for the field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Adds all messages of `other`, prefixing field names with `prefix.`.
    pub fn extend_prefixed(&mut self, prefix: &str, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors
                .entry(format!("{prefix}.{field}"))
                .or_default()
                .extend(messages);
        }
    }

    /// Returns true if there are no messages.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Messages for the field.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    /// Iterates over fields with errors and their messages.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `Ok(())` if empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Error returned by endpoint operations.
#[derive(Debug, Error)]
pub enum GeoRestError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Malformed query parameter.
    #[error(transparent)]
    Filter(#[from] FilterError),
    /// Request body failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    /// Record or page does not exist.
    #[error("{0}")]
    NotFound(String),
}

impl GeoRestError {
    /// Error for a missing record.
    pub fn not_found() -> Self {
        Self::NotFound("Not found.".into())
    }

    /// HTTP status the error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GeoRestError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GeoRestError::Filter(_) => StatusCode::BAD_REQUEST,
            GeoRestError::Validation(_) => StatusCode::BAD_REQUEST,
            GeoRestError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_serialize_as_map() {
        let mut errors = ValidationErrors::new();
        errors.add("geometry", "This field is required.");
        errors.add("name", "A valid string is required.");

        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({
                "geometry": ["This field is required."],
                "name": ["A valid string is required."],
            })
        );
        assert_eq!(
            errors.to_string(),
            "geometry: This field is required.; name: A valid string is required."
        );
    }

    #[test]
    fn prefixed_errors() {
        let mut errors = ValidationErrors::new();
        errors.extend_prefixed("features.1", ValidationErrors::single("name", "bad"));
        assert_eq!(errors.get("features.1.name"), Some(&["bad".to_string()][..]));
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            GeoRestError::from(FilterError::Parse("x".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(GeoRestError::not_found().status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            GeoRestError::from(ValidationErrors::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GeoRestError::from(ConfigError::ConflictingBbox).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
