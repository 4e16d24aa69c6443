//! Post-processing pipeline over decoded tile layers.
//!
//! A post-processor rewrites one layer in place: it builds whatever
//! ephemeral index it needs, scans the layer emitting mutations, drops
//! emptied features and returns. Processors are composable; the caller
//! picks the order.

mod adminizer;
mod unionizer;

pub use adminizer::{Adminizer, AdminizerConfig};
pub use unionizer::{Heuristic, TagStrategy, Unionizer, UnionizerConfig};

use crate::error::{Error, Result};
use crate::layer::{Layer, MapContext};

/// An in-place layer transform.
pub trait PostProcess: std::fmt::Debug {
    fn process(&self, layer: &mut Layer, ctx: &MapContext) -> Result<()>;
}

/// Build a post-processor by name from a configuration tree.
pub fn create_post_processor(
    name: &str,
    config: &serde_json::Value,
) -> Result<Box<dyn PostProcess>> {
    match name {
        "unionizer" => Ok(Box::new(Unionizer::from_value(config)?)),
        "adminizer" => Ok(Box::new(Adminizer::from_value(config)?)),
        other => Err(Error::Config(format!(
            "no post-processor named `{other}', try `unionizer' or `adminizer'"
        ))),
    }
}

/// An ordered list of post-processors applied to one layer. Stops at the
/// first stage error, leaving the layer in the state that stage reached.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn PostProcess>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages.len())
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: Box<dyn PostProcess>) {
        self.stages.push(stage);
    }

    #[inline] pub fn len(&self) -> usize { self.stages.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.stages.is_empty() }

    /// Build a pipeline from a configuration array; each element is an
    /// object with a `type` key naming the processor, the remaining keys
    /// being that processor's configuration.
    pub fn from_value(config: &serde_json::Value) -> Result<Self> {
        let stages = config
            .as_array()
            .ok_or_else(|| Error::Config("pipeline configuration must be an array".to_string()))?;

        let mut pipeline = Self::new();
        for stage in stages {
            let name = stage
                .get("type")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| {
                    Error::Config("pipeline stage missing `type` key".to_string())
                })?;
            pipeline.push(create_post_processor(name, stage)?);
        }
        Ok(pipeline)
    }
}

impl PostProcess for Pipeline {
    fn process(&self, layer: &mut Layer, ctx: &MapContext) -> Result<()> {
        for stage in &self.stages {
            stage.process(layer, ctx)?;
        }
        Ok(())
    }
}
