use geo::Rect;

use crate::feature::Feature;
use crate::geometry::expand_rect;

/// A named, ordered sequence of features sharing a schema. Post-processors
/// rewrite it in place.
#[derive(Clone, Debug, Default)]
pub struct Layer {
    name: String,
    features: Vec<Feature>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), features: Vec::new() }
    }

    /// Builder-style feature append, for fixtures and decoders.
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    #[inline] pub fn name(&self) -> &str { &self.name }

    #[inline] pub fn features(&self) -> &[Feature] { &self.features }

    #[inline] pub fn features_mut(&mut self) -> &mut Vec<Feature> { &mut self.features }

    #[inline] pub fn len(&self) -> usize { self.features.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.features.is_empty() }

    /// Union of all feature envelopes, `None` for a layer with no vertices.
    pub fn envelope(&self) -> Option<Rect<f64>> {
        self.features
            .iter()
            .filter_map(Feature::envelope)
            .reduce(expand_rect)
    }
}

/// Map-level context handed to post-processors: the current extent in
/// projection units. Angular heuristics derive their sample budgets from it.
#[derive(Clone, Copy, Debug)]
pub struct MapContext {
    extent: Rect<f64>,
}

impl MapContext {
    pub fn new(extent: Rect<f64>) -> Self {
        Self { extent }
    }

    #[inline] pub fn extent(&self) -> Rect<f64> { self.extent }

    #[inline] pub fn extent_width(&self) -> f64 { self.extent.width() }

    #[inline] pub fn extent_height(&self) -> f64 { self.extent.height() }
}
