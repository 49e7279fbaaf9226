//! Endpoint composing a store, filter backends, the feature serializer and pagination.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::{ConfigError, GeoRestError};
use crate::feature::{feature_collection, FeatureOptions, FeatureSerializer};
use crate::filter::{FilterBackend, FilterConfig};
use crate::pagination::GeoJsonPagination;
use crate::params::QueryParams;
use crate::query::SpatialQuery;
use crate::store::RecordStore;

/// GeoJSON resource backed by a [`RecordStore`].
///
/// Operations return the response body; the HTTP layer maps errors with
/// [`GeoRestError::status_code`].
#[derive(Debug)]
pub struct GeoEndpoint<S: RecordStore> {
    store: Arc<S>,
    serializer: FeatureSerializer,
    filter_config: FilterConfig,
    filters: Vec<Box<dyn FilterBackend<S::Query>>>,
    pagination: Option<GeoJsonPagination>,
}

impl<S: RecordStore> GeoEndpoint<S> {
    /// Starts building an endpoint over the store.
    pub fn builder(store: Arc<S>, options: FeatureOptions) -> GeoEndpointBuilder<S> {
        GeoEndpointBuilder::new(store, options)
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The feature serializer.
    pub fn serializer(&self) -> &FeatureSerializer {
        &self.serializer
    }

    /// Lists records matching the filter parameters as a `FeatureCollection`.
    ///
    /// `url` is the request URL without the query string, used for pagination links.
    pub fn list(&self, params: &QueryParams, url: &str) -> Result<JsonValue, GeoRestError> {
        let query = self
            .filters
            .iter()
            .try_fold(self.store.query(), |query, backend| {
                backend.filter_query(params, query, &self.filter_config)
            })?;
        let records = query.fetch();

        if let Some(pagination) = &self.pagination {
            if let Some(page) = pagination.paginate(&records, params, url)? {
                let page = page.map(|record| self.serializer.to_representation(record));
                return Ok(pagination.paginated_response(page));
            }
        }

        Ok(self.serializer.to_collection(&records))
    }

    /// Single record as a `Feature`.
    pub fn retrieve(&self, id: i64) -> Result<JsonValue, GeoRestError> {
        let record = self.store.get(id).ok_or_else(GeoRestError::not_found)?;
        Ok(self.serializer.to_representation(&record))
    }

    /// Creates records from a `Feature`, a flat object or a `FeatureCollection`.
    ///
    /// A collection is validated as a whole: nothing is stored if any feature is invalid.
    pub fn create(&self, body: &JsonValue) -> Result<JsonValue, GeoRestError> {
        if is_collection(body) {
            let records = self.serializer.to_internal_values(body, false)?;
            let features = records
                .into_iter()
                .map(|record| self.serializer.to_representation(&self.store.insert(record)))
                .collect();
            return Ok(feature_collection(features));
        }

        let record = self.serializer.to_internal_value(body, false)?;
        let created = self.store.insert(record);
        Ok(self.serializer.to_representation(&created))
    }

    /// Updates a record. With `partial` only the given fields are validated and changed.
    pub fn update(&self, id: i64, body: &JsonValue, partial: bool) -> Result<JsonValue, GeoRestError> {
        if self.store.get(id).is_none() {
            return Err(GeoRestError::not_found());
        }

        let changes = self.serializer.to_internal_value(body, partial)?;
        let updated = self
            .store
            .update(id, changes)
            .ok_or_else(GeoRestError::not_found)?;
        Ok(self.serializer.to_representation(&updated))
    }

    /// Deletes a record.
    pub fn destroy(&self, id: i64) -> Result<(), GeoRestError> {
        if self.store.remove(id) {
            Ok(())
        } else {
            Err(GeoRestError::not_found())
        }
    }
}

fn is_collection(body: &JsonValue) -> bool {
    match body {
        JsonValue::Array(_) => true,
        JsonValue::Object(map) => !map.contains_key("properties") && map.contains_key("features"),
        _ => false,
    }
}

/// Builder of [`GeoEndpoint`]. All configuration is validated by [`build`](Self::build).
pub struct GeoEndpointBuilder<S: RecordStore> {
    store: Arc<S>,
    options: FeatureOptions,
    filter_config: FilterConfig,
    filters: Vec<Box<dyn FilterBackend<S::Query>>>,
    pagination: Option<GeoJsonPagination>,
}

impl<S: RecordStore> GeoEndpointBuilder<S> {
    /// New builder with no filters and no pagination.
    pub fn new(store: Arc<S>, options: FeatureOptions) -> Self {
        Self {
            store,
            options,
            filter_config: FilterConfig::default(),
            filters: Vec::new(),
            pagination: None,
        }
    }

    /// Sets the fields the filter backends work on.
    pub fn with_filter_config(mut self, filter_config: FilterConfig) -> Self {
        self.filter_config = filter_config;
        self
    }

    /// Appends a filter backend. Backends are applied in the order they were added.
    pub fn with_filter(mut self, backend: impl FilterBackend<S::Query> + 'static) -> Self {
        self.filters.push(Box::new(backend));
        self
    }

    /// Enables pagination of the list operation.
    pub fn with_pagination(mut self, pagination: GeoJsonPagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Validates the configuration and creates the endpoint.
    pub fn build(self) -> Result<GeoEndpoint<S>, ConfigError> {
        let schema = self.store.schema().clone();
        let serializer = FeatureSerializer::new(schema.clone(), self.options)?;

        for field in self.filter_config.fields() {
            schema.geometry_field(field)?;
        }

        let needs_ordering = self.filters.iter().any(|f| f.requires_distance_ordering());
        if needs_ordering && !self.store.query().supports_distance_ordering() {
            return Err(ConfigError::DistanceOrderingUnsupported);
        }

        Ok(GeoEndpoint {
            store: self.store,
            serializer,
            filter_config: self.filter_config,
            filters: self.filters,
            pagination: self.pagination,
        })
    }
}
