use std::sync::Arc;

use geo::{Intersects, Rect};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::feature::Feature;

/// Source of auxiliary features, queried by envelope.
///
/// Implementations may be shared across `process` calls and must be safe
/// for concurrent reads; every query returns a fresh featureset.
pub trait Datasource: Send + Sync + std::fmt::Debug {
    fn features(&self, query: &Rect<f64>) -> Result<Vec<Feature>>;
}

/// In-memory datasource over a fixed feature list. Queries return clones of
/// every feature whose envelope intersects the query rectangle, in input
/// order.
#[derive(Clone, Debug, Default)]
pub struct MemoryDatasource {
    features: Vec<Feature>,
}

impl MemoryDatasource {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }
}

impl Datasource for MemoryDatasource {
    fn features(&self, query: &Rect<f64>) -> Result<Vec<Feature>> {
        Ok(self
            .features
            .iter()
            .filter(|f| f.envelope().is_some_and(|env| env.intersects(query)))
            .cloned()
            .collect())
    }
}

#[derive(Deserialize)]
struct MemoryParams {
    #[serde(default)]
    features: Vec<Feature>,
}

/// Open a datasource from opaque key-value parameters. Dispatches on the
/// `type` parameter; the remaining keys belong to the chosen backend.
pub fn open_datasource(params: &serde_json::Value) -> Result<Arc<dyn Datasource>> {
    let ty = params
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| Error::Datasource("datasource parameters missing `type`".to_string()))?;

    match ty {
        "memory" => {
            let params: MemoryParams = serde_json::from_value(params.clone())
                .map_err(|e| Error::Datasource(format!("bad memory datasource parameters: {e}")))?;
            Ok(Arc::new(MemoryDatasource::new(params.features)))
        }
        other => Err(Error::Datasource(format!(
            "no datasource backend named `{other}', try `memory'"
        ))),
    }
}
