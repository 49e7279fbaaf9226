//! Record stores.

use std::cmp::Ordering;
use std::sync::Arc;

use ahash::AHashMap;
use geo::{BoundingRect, EuclideanDistance, Relate};
use geo_types::{Geometry, Point};
use georest_types::Rect;
use parking_lot::RwLock;

use crate::geometry::is_empty_geometry;
use crate::query::{GeometryLookup, Order, SpatialLookup, SpatialQuery};
use crate::schema::{FieldValue, Record, Schema};

/// Storage of records addressed by an integer primary key.
pub trait RecordStore: Send + Sync {
    /// Query type produced by the store.
    type Query: SpatialQuery;

    /// Schema of stored records.
    fn schema(&self) -> &Arc<Schema>;

    /// Query over all records, ordered by primary key.
    fn query(&self) -> Self::Query;

    /// Record with the given primary key.
    fn get(&self, id: i64) -> Option<Record>;

    /// Stores a new record, assigning it a primary key. Returns the stored record.
    fn insert(&self, record: Record) -> Record;

    /// Overwrites fields of an existing record with the fields set in `changes`. Returns the
    /// updated record, or `None` if there is no such record.
    fn update(&self, id: i64, changes: Record) -> Option<Record>;

    /// Deletes the record. Returns false if it did not exist.
    fn remove(&self, id: i64) -> bool;
}

#[derive(Debug, Default)]
struct StoreInner {
    records: AHashMap<i64, Record>,
    next_id: i64,
}

/// Thread-safe in-memory store with auto-incremented primary keys.
#[derive(Debug)]
pub struct MemoryStore {
    schema: Arc<Schema>,
    inner: RwLock<StoreInner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            inner: RwLock::new(StoreInner {
                records: AHashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryStore {
    type Query = MemoryQuery;

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn query(&self) -> MemoryQuery {
        let inner = self.inner.read();
        let mut ids: Vec<_> = inner.records.keys().copied().collect();
        ids.sort_unstable();

        MemoryQuery {
            records: ids
                .into_iter()
                .filter_map(|id| inner.records.get(&id).cloned())
                .collect(),
        }
    }

    fn get(&self, id: i64) -> Option<Record> {
        self.inner.read().records.get(&id).cloned()
    }

    fn insert(&self, mut record: Record) -> Record {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;

        for field in self.schema.fields() {
            if !record.contains(&field.name) && !field.kind.is_computed() {
                record.set(field.name.clone(), FieldValue::Null);
            }
        }
        record.set(self.schema.primary_key(), id);

        inner.records.insert(id, record.clone());
        log::debug!("Inserted record {id}");

        record
    }

    fn update(&self, id: i64, mut changes: Record) -> Option<Record> {
        let mut inner = self.inner.write();
        let record = inner.records.get_mut(&id)?;

        changes.set(self.schema.primary_key(), id);
        record.merge(changes);
        log::debug!("Updated record {id}");

        Some(record.clone())
    }

    fn remove(&self, id: i64) -> bool {
        let removed = self.inner.write().records.remove(&id).is_some();
        if removed {
            log::debug!("Removed record {id}");
        }
        removed
    }
}

/// Snapshot of [`MemoryStore`] records narrowed by spatial lookups.
#[derive(Debug, Clone)]
pub struct MemoryQuery {
    records: Vec<Record>,
}

impl MemoryQuery {
    /// Query over the given records.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl SpatialQuery for MemoryQuery {
    fn filter(mut self, field: &str, lookup: SpatialLookup) -> Self {
        self.records
            .retain(|record| record.geometry(field).is_some_and(|g| matches(g, &lookup)));
        self
    }

    /// Records without a geometry, or with an empty one, go last in both directions.
    fn order_by_distance(mut self, field: &str, point: Point<f64>, order: Order) -> Self {
        let distance = |record: &Record| {
            record
                .geometry(field)
                .filter(|g| !is_empty_geometry(g))
                .map(|g| point.euclidean_distance(g))
        };

        self.records.sort_by(|a, b| match (distance(a), distance(b)) {
            (Some(a), Some(b)) => {
                let ordering = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
                match order {
                    Order::Asc => ordering,
                    Order::Desc => ordering.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        self
    }

    fn supports_distance_ordering(&self) -> bool {
        true
    }

    fn fetch(self) -> Vec<Record> {
        self.records
    }
}

fn matches(geometry: &Geometry<f64>, lookup: &SpatialLookup) -> bool {
    // An empty geometry is disjoint from everything and lies in no area.
    if is_empty_geometry(geometry) {
        return matches!(lookup, SpatialLookup::Relate(GeometryLookup::Disjoint, _));
    }

    match lookup {
        SpatialLookup::Contained(rect) => bbox(geometry).is_some_and(|b| rect.contains_rect(&b)),
        SpatialLookup::BbOverlaps(rect) => bbox(geometry).is_some_and(|b| rect.intersects(&b)),
        SpatialLookup::DWithin(point, distance) => point.euclidean_distance(geometry) <= *distance,
        SpatialLookup::Relate(relation, other) if is_empty_geometry(other) => {
            *relation == GeometryLookup::Disjoint
        }
        SpatialLookup::Relate(relation, other) => {
            let matrix = geometry.relate(other);
            match relation {
                GeometryLookup::Contains => matrix.is_contains(),
                GeometryLookup::Within => matrix.is_within(),
                GeometryLookup::Intersects => matrix.is_intersects(),
                GeometryLookup::Disjoint => matrix.is_disjoint(),
            }
        }
    }
}

fn bbox(geometry: &Geometry<f64>) -> Option<Rect> {
    geometry.bounding_rect().map(Rect::from)
}
