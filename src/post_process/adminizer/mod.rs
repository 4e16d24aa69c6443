//! Applies administrative attribution to features from an auxiliary
//! polygon datasource: each feature receives the configured parameter of
//! the lowest-indexed polygon it intersects.

mod lift;

use std::sync::Arc;

use geo::{BoundingRect, Intersects, Polygon, Rect};
use log::debug;
use rstar::{RStarInsertionStrategy, RTree, RTreeObject, RTreeParams, AABB};
use serde::Deserialize;

use crate::datasource::{open_datasource, Datasource};
use crate::error::{Error, Result};
use crate::feature::{Feature, Value};
use crate::geometry::Geometry;
use crate::layer::{Layer, MapContext};
use crate::post_process::PostProcess;

/// Adminizer configuration: the attribute to stamp and the auxiliary
/// datasource to take it from.
#[derive(Clone, Debug, Deserialize)]
pub struct AdminizerConfig {
    pub param_name: String,
    /// Opaque parameters handed to the datasource factory.
    #[serde(default)]
    pub datasource: serde_json::Value,
}

/// An auxiliary polygon lifted for intersection testing, with the
/// attribute value it donates and its position in datasource iteration
/// order. Lower index wins.
struct Entry {
    polygon: Polygon<f64>,
    value: Value,
    index: usize,
}

/// Bounding box of one entry, addressed by index into the entry vector.
struct EntryBounds {
    idx: usize,
    bbox: Rect<f64>,
}

impl RTreeObject for EntryBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Node capacity 16, matching the quadratic split the entry counts here
/// are tuned for.
struct IndexParams;

impl RTreeParams for IndexParams {
    const MIN_SIZE: usize = 4;
    const MAX_SIZE: usize = 16;
    const REINSERTION_COUNT: usize = 2;
    type DefaultInsertionStrategy = RStarInsertionStrategy;
}

type EntryIndex = RTree<EntryBounds, IndexParams>;

/// Tracks the best (lowest-index) intersecting entry seen for one feature.
/// Index 0 cannot be beaten, so it finishes the feature early.
struct ParamUpdater {
    index: usize,
    value: Option<Value>,
    finished: bool,
}

impl ParamUpdater {
    fn new() -> Self {
        Self { index: usize::MAX, value: None, finished: false }
    }

    fn apply(&mut self, entry: &Entry) {
        if entry.index < self.index {
            self.value = Some(entry.value.clone());
            self.finished = entry.index == 0;
            self.index = entry.index;
        }
    }
}

/// Query the index by the lifted geometry's envelope and feed every entry
/// that precisely intersects it to the updater. The index only proves that
/// bounding boxes touch.
fn try_update<G>(geom: &G, index: &EntryIndex, entries: &[Entry], updater: &mut ParamUpdater)
where
    G: BoundingRect<f64, Output = Option<Rect<f64>>> + Intersects<Polygon<f64>>,
{
    let Some(bbox) = geom.bounding_rect() else { return };
    let envelope = AABB::from_corners(bbox.min().into(), bbox.max().into());
    for hit in index.locate_in_envelope_intersecting(&envelope) {
        let entry = &entries[hit.idx];
        if geom.intersects(&entry.polygon) {
            updater.apply(entry);
        }
    }
}

/// Post-processor that stamps features with a parameter taken from the
/// auxiliary polygons they intersect.
#[derive(Debug)]
pub struct Adminizer {
    param_name: String,
    datasource: Arc<dyn Datasource>,
}

impl Adminizer {
    pub fn new(param_name: impl Into<String>, datasource: Arc<dyn Datasource>) -> Result<Self> {
        let param_name = param_name.into();
        if param_name.is_empty() {
            return Err(Error::Config("adminizer requires a non-empty param_name".to_string()));
        }
        Ok(Self { param_name, datasource })
    }

    pub fn from_value(config: &serde_json::Value) -> Result<Self> {
        let config: AdminizerConfig = serde_json::from_value(config.clone())
            .map_err(|e| Error::Config(format!("bad adminizer configuration: {e}")))?;
        let datasource = open_datasource(&config.datasource)?;
        Self::new(config.param_name, datasource)
    }

    /// Pull auxiliary features intersecting `env` and lift every polygon
    /// geometry into an entry, in iteration order. Other geometry types
    /// are skipped.
    fn make_entries(&self, env: Rect<f64>) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        let mut index = 0;

        for feature in self.datasource.features(&env)? {
            let value = feature.get(&self.param_name).cloned().unwrap_or(Value::Null);
            for geom in feature.geometries() {
                if matches!(geom, Geometry::Polygon { .. }) {
                    entries.push(Entry {
                        polygon: lift::to_polygon(geom),
                        value: value.clone(),
                        index,
                    });
                    index += 1;
                }
            }
        }

        Ok(entries)
    }

    /// Entry envelopes are collected up-front so the bulk load can pack
    /// nodes for better query distribution.
    fn make_index(entries: &[Entry]) -> EntryIndex {
        let bounds = entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| {
                e.polygon
                    .bounding_rect()
                    .map(|bbox| EntryBounds { idx: i, bbox })
            })
            .collect();
        EntryIndex::bulk_load_with_params(bounds)
    }

    fn adminize_feature(&self, feature: &mut Feature, index: &EntryIndex, entries: &[Entry]) {
        let mut updater = ParamUpdater::new();

        for geom in feature.geometries() {
            match geom {
                Geometry::Point(_) => {
                    try_update(&lift::to_multi_point(geom), index, entries, &mut updater);
                }
                Geometry::LineString(_) => {
                    try_update(&lift::to_multi_line_string(geom), index, entries, &mut updater);
                }
                Geometry::Polygon { .. } => {
                    try_update(&lift::to_polygon(geom), index, entries, &mut updater);
                }
            }

            // Quick exit when index 0 has already matched.
            if updater.finished {
                break;
            }
        }

        if let Some(value) = updater.value {
            feature.put(self.param_name.clone(), value);
        }
    }
}

impl PostProcess for Adminizer {
    fn process(&self, layer: &mut Layer, _ctx: &MapContext) -> Result<()> {
        let Some(env) = layer.envelope() else {
            return Ok(());
        };

        let entries = self.make_entries(env)?;
        debug!("adminizer: {} polygon entries under the layer envelope", entries.len());
        let index = Self::make_index(&entries);

        for feature in layer.features_mut() {
            self.adminize_feature(feature, &index, &entries);
        }
        Ok(())
    }
}
