//! Merges features whose attribution matches and whose linestrings meet at
//! a shared endpoint.
//!
//! Each iteration gathers every joinable endpoint into a sorted candidate
//! list, scores the compatible pairs inside each adjacency group, then
//! splices pairs best-first — touching each feature at most once per
//! iteration — until a fixed point or the iteration cap is reached.

mod approx;
mod candidate;
mod score;

pub use score::Heuristic;

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::str::FromStr;

use geo::Coord;
use log::{debug, trace};
use serde::Deserialize;

use self::candidate::{Candidate, End};
use crate::error::{Error, Result};
use crate::feature::{Feature, Value};
use crate::geometry::Geometry;
use crate::layer::{Layer, MapContext};
use crate::post_process::PostProcess;

/// What the merged feature keeps of the two attribute sets: only the keys
/// both agreed on (`Intersect`), or additionally the keys only one side
/// carried (`Accumulate`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TagStrategy {
    #[default]
    Intersect,
    Accumulate,
}

impl FromStr for TagStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "intersect" => Ok(TagStrategy::Intersect),
            "accumulate" => Ok(TagStrategy::Accumulate),
            other => Err(Error::Config(format!(
                "`{other}' is not a tag strategy, try `intersect' or `accumulate'"
            ))),
        }
    }
}

fn default_heuristic() -> String {
    "greedy".to_string()
}

fn default_strategy() -> String {
    "intersect".to_string()
}

fn default_max_iterations() -> usize {
    usize::MAX
}

fn default_sample_ratio() -> f64 {
    0.1
}

/// Unionizer configuration, string-keyed the way layer pipelines are
/// written. Values are validated by [`Unionizer::new`], not by serde.
#[derive(Clone, Debug, Deserialize)]
pub struct UnionizerConfig {
    #[serde(default = "default_heuristic")]
    pub union_heuristic: String,
    #[serde(default = "default_strategy")]
    pub tag_strategy: String,
    /// Reserved: accepted and stored, but merged features keep no id trail.
    #[serde(default)]
    pub keep_ids_tag: Option<String>,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default)]
    pub match_tags: Vec<String>,
    #[serde(default)]
    pub preserve_direction_tags: Vec<String>,
    #[serde(default = "default_sample_ratio")]
    pub angle_union_sample_ratio: f64,
}

impl Default for UnionizerConfig {
    fn default() -> Self {
        Self {
            union_heuristic: default_heuristic(),
            tag_strategy: default_strategy(),
            keep_ids_tag: None,
            max_iterations: default_max_iterations(),
            match_tags: Vec::new(),
            preserve_direction_tags: Vec::new(),
            angle_union_sample_ratio: default_sample_ratio(),
        }
    }
}

/// Post-processor that joins linestrings with matching attribution at
/// shared endpoints.
#[derive(Debug)]
pub struct Unionizer {
    heuristic: Heuristic,
    strategy: TagStrategy,
    keep_ids_tag: Option<String>,
    max_iterations: usize,
    match_tags: BTreeSet<String>,
    preserve_direction_tags: BTreeSet<String>,
    sample_ratio: f64,
}

impl Unionizer {
    pub fn new(config: UnionizerConfig) -> Result<Self> {
        let heuristic = config.union_heuristic.parse()?;
        let strategy = config.tag_strategy.parse()?;

        let ratio = config.angle_union_sample_ratio;
        if !(ratio > 0.0 && ratio <= 0.5) {
            return Err(Error::Config(format!(
                "angle_union_sample_ratio must lie in (0, 0.5], got {ratio}"
            )));
        }

        Ok(Self {
            heuristic,
            strategy,
            keep_ids_tag: config.keep_ids_tag,
            max_iterations: config.max_iterations,
            match_tags: config.match_tags.into_iter().collect(),
            preserve_direction_tags: config.preserve_direction_tags.into_iter().collect(),
            sample_ratio: ratio,
        })
    }

    pub fn from_value(config: &serde_json::Value) -> Result<Self> {
        let config: UnionizerConfig = serde_json::from_value(config.clone())
            .map_err(|e| Error::Config(format!("bad unionizer configuration: {e}")))?;
        Self::new(config)
    }

    /// The reserved `keep_ids_tag` option, if configured.
    pub fn keep_ids_tag(&self) -> Option<&str> {
        self.keep_ids_tag.as_deref()
    }

    /// Splice the scored pairs best-first, touching each feature at most
    /// once. Returns the number of merges performed.
    fn splice_pairs(&self, layer: &mut Layer, pairs: Vec<ScoredPair>) -> usize {
        let mut touched: HashSet<u64> = HashSet::new();
        let mut merges = 0;

        for pair in pairs {
            let a_id = layer.features()[pair.a.feature].id();
            let b_id = layer.features()[pair.b.feature].id();
            // The bookkeeping to merge a feature twice in one iteration is
            // not worth it; the next iteration picks the leftovers up.
            if touched.contains(&a_id) || touched.contains(&b_id) {
                continue;
            }

            trace!("splicing features {a_id} and {b_id} (score {})", pair.score);
            let (dst, src) = splice(layer.features_mut(), pair.a, pair.b);
            reconcile_tags(layer.features_mut(), dst, src, self.strategy);

            touched.insert(a_id);
            touched.insert(b_id);
            merges += 1;
        }

        merges
    }
}

impl PostProcess for Unionizer {
    fn process(&self, layer: &mut Layer, ctx: &MapContext) -> Result<()> {
        // Angular heuristics sample this far along each curve, per axis.
        let budget = (
            ctx.extent_width() * self.sample_ratio,
            ctx.extent_height() * self.sample_ratio,
        );

        for iteration in 0..self.max_iterations {
            let candidates = candidate::collect(
                layer,
                &self.match_tags,
                &self.preserve_direction_tags,
                self.heuristic,
                budget,
            );
            let pairs = score_pairs(&candidates, layer, &self.match_tags, self.heuristic);
            let merges = self.splice_pairs(layer, pairs);
            debug!("unionizer iteration {iteration}: {merges} merges");
            if merges == 0 {
                break;
            }
        }

        cull(layer);
        Ok(())
    }
}

/// A compatible candidate pair and its score.
struct ScoredPair {
    score: u8,
    a: Candidate,
    b: Candidate,
}

/// Score every compatible pair inside each adjacency group, ordered best
/// first. Equal scores keep candidate order (the sort is stable), so
/// processing order is deterministic.
fn score_pairs(
    candidates: &[Candidate],
    layer: &Layer,
    match_tags: &BTreeSet<String>,
    heuristic: Heuristic,
) -> Vec<ScoredPair> {
    let mut pairs = Vec::new();

    let mut group_start = 0;
    while group_start < candidates.len() {
        let mut group_end = group_start + 1;
        while group_end < candidates.len()
            && candidate::order(
                &candidates[group_start],
                &candidates[group_end],
                layer,
                match_tags,
            ) == Ordering::Equal
        {
            group_end += 1;
        }

        for i in group_start..group_end {
            for j in (i + 1)..group_end {
                let (a, b) = (candidates[i], candidates[j]);
                if score::compatible(&a, &b) {
                    pairs.push(ScoredPair { score: score::score(heuristic, &a, &b), a, b });
                }
            }
        }

        group_start = group_end;
    }

    pairs.sort_by_key(|pair| pair.score);
    pairs
}

fn line_coords(feature: &Feature, geometry: usize) -> Vec<Coord<f64>> {
    match &feature.geometries()[geometry] {
        Geometry::LineString(line) => line.clone(),
        other => unreachable!("union candidate refers to a non-linestring: {other:?}"),
    }
}

/// Join the two candidate linestrings. The merged geometry always lands in
/// the first candidate's feature; returns `(destination, consumed)` feature
/// indices. When both candidates share a feature, removals run in
/// descending geometry-index order so the second removal stays valid.
fn splice(features: &mut [Feature], mut a: Candidate, mut b: Candidate) -> (usize, usize) {
    if a.end != b.end {
        // Normalize so the Back side receives the vertices.
        if b.end == End::Back {
            std::mem::swap(&mut a, &mut b);
        }
        let src = line_coords(&features[b.feature], b.geometry);
        match &mut features[a.feature].geometries_mut()[a.geometry] {
            Geometry::LineString(dst) => dst.extend_from_slice(&src[1..]),
            other => unreachable!("union candidate refers to a non-linestring: {other:?}"),
        }
        features[b.feature].geometries_mut().remove(b.geometry);
    } else if a.end == End::Back {
        // Back to back: append the other line in reverse, skipping the
        // shared endpoint.
        let src = line_coords(&features[b.feature], b.geometry);
        match &mut features[a.feature].geometries_mut()[a.geometry] {
            Geometry::LineString(dst) => {
                dst.extend(src[..src.len() - 1].iter().rev().copied());
            }
            other => unreachable!("union candidate refers to a non-linestring: {other:?}"),
        }
        features[b.feature].geometries_mut().remove(b.geometry);
    } else {
        // Front to front: no front insertion, so build a fresh linestring
        // from the first line reversed followed by the second's tail.
        let first = line_coords(&features[a.feature], a.geometry);
        let second = line_coords(&features[b.feature], b.geometry);

        let mut joined = Vec::with_capacity(first.len() + second.len() - 1);
        joined.extend(first.iter().rev().copied());
        joined.extend_from_slice(&second[1..]);

        if a.feature == b.feature {
            let (hi, lo) = if a.geometry > b.geometry {
                (a.geometry, b.geometry)
            } else {
                (b.geometry, a.geometry)
            };
            let geoms = features[a.feature].geometries_mut();
            geoms.remove(hi);
            geoms.remove(lo);
        } else {
            features[a.feature].geometries_mut().remove(a.geometry);
            features[b.feature].geometries_mut().remove(b.geometry);
        }
        features[a.feature]
            .geometries_mut()
            .push(Geometry::LineString(joined));
    }

    (a.feature, b.feature)
}

/// Settle what the destination feature keeps of the two attribute sets.
/// Keys the consumed feature lacks or disagrees on become null (the encoder
/// skips nulls); under `Accumulate` its extra keys are copied over.
fn reconcile_tags(features: &mut [Feature], dst: usize, src: usize, strategy: TagStrategy) {
    // A feature merged with itself already agrees on every key.
    if dst == src {
        return;
    }

    let src_attrs: BTreeMap<String, Value> = features[src]
        .attributes()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    let dst = &mut features[dst];

    let dropped: Vec<String> = dst
        .attributes()
        .filter(|(key, value)| src_attrs.get(*key) != Some(*value))
        .map(|(key, _)| key.to_string())
        .collect();
    for key in dropped {
        dst.put(key, Value::Null);
    }

    if strategy == TagStrategy::Accumulate {
        for (key, value) in src_attrs {
            if !dst.has(&key) {
                dst.put_new(key, value);
            }
        }
    }
}

/// Throw out features that no longer have any geometry.
fn cull(layer: &mut Layer) {
    layer.features_mut().retain(|f| f.num_geometries() > 0);
}
