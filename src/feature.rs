use std::cmp::Ordering;
use std::collections::BTreeMap;

use geo::Rect;
use serde::{Deserialize, Serialize};

use crate::geometry::{expand_rect, Geometry};

/// Total order on doubles for comparators: IEEE total ordering, except the
/// two signed zeros compare equal. Endpoint grouping and value equality
/// mean exact real-number equality, and `-0.0 == 0.0` on the reals.
pub(crate) fn float_cmp(a: f64, b: f64) -> Ordering {
    let fold = |v: f64| if v == 0.0 { 0.0 } else { v };
    fold(a).total_cmp(&fold(b))
}

/// An attribute value carried by a feature.
///
/// `Null` is the deletion protocol: the tile encoder skips null-valued
/// keys when serializing, so writing `Null` drops the attribute from the
/// wire payload without touching the in-memory map.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    #[inline] pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Int(_) => 1,
            Value::Float(_) => 2,
            Value::Bool(_) => 3,
            Value::Str(_) => 4,
        }
    }
}

/// Total order over values: variant rank first, then payload. Floats use
/// IEEE total ordering (signed zeros folded together) so sorting never
/// panics on odd inputs. This is the ordering the candidate comparator
/// uses for match-tag values.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => float_cmp(*a, *b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl From<i64> for Value {
    fn from(v: i64) -> Self { Value::Int(v) }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self { Value::Float(v) }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self { Value::Bool(v) }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self { Value::Str(v.to_string()) }
}

impl From<String> for Value {
    fn from(v: String) -> Self { Value::Str(v) }
}

/// A decoded tile feature: numeric id, ordered geometry list and a
/// string-keyed attribute map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    id: u64,
    #[serde(default)]
    geometries: Vec<Geometry>,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

impl Feature {
    pub fn new(id: u64) -> Self {
        Self { id, geometries: Vec::new(), attributes: BTreeMap::new() }
    }

    /// Builder-style geometry append, for fixtures and datasource loading.
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometries.push(geometry);
        self
    }

    /// Builder-style attribute insert.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    #[inline] pub fn id(&self) -> u64 { self.id }

    #[inline] pub fn geometries(&self) -> &[Geometry] { &self.geometries }

    #[inline] pub fn geometries_mut(&mut self) -> &mut Vec<Geometry> { &mut self.geometries }

    #[inline] pub fn num_geometries(&self) -> usize { self.geometries.len() }

    #[inline] pub fn has(&self, key: &str) -> bool { self.attributes.contains_key(key) }

    #[inline] pub fn get(&self, key: &str) -> Option<&Value> { self.attributes.get(key) }

    /// Insert or replace an attribute.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Insert an attribute the feature does not have yet.
    pub fn put_new(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        debug_assert!(!self.attributes.contains_key(&key), "put_new over existing key {key}");
        self.attributes.insert(key, value.into());
    }

    /// Iterate attribute entries in key order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Bounding rectangle over all geometries, `None` for an empty feature.
    pub fn envelope(&self) -> Option<Rect<f64>> {
        self.geometries
            .iter()
            .filter_map(Geometry::envelope)
            .reduce(expand_rect)
    }
}
