//! Geometry-aware post-processing for vector tile layers.
//!
//! A decoded tile layer is an ordered list of features — geometries plus
//! key-value attribution. This crate rewrites such layers in place before
//! encoding: the [`Unionizer`] merges linestrings with matching attribution
//! that meet at shared endpoints, and the [`Adminizer`] stamps features
//! with a parameter taken from an auxiliary polygon dataset.
//!
//! Processors implement [`PostProcess`] and compose into a [`Pipeline`];
//! both can be built programmatically or from string-keyed configuration
//! trees via [`create_post_processor`].

mod datasource;
mod error;
mod feature;
mod geometry;
mod layer;
mod post_process;

#[doc(inline)]
pub use datasource::{open_datasource, Datasource, MemoryDatasource};

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use feature::{Feature, Value};

#[doc(inline)]
pub use geometry::{Geometry, PathCommand, PathIter};

#[doc(inline)]
pub use layer::{Layer, MapContext};

#[doc(inline)]
pub use post_process::{
    create_post_processor, Adminizer, AdminizerConfig, Heuristic, Pipeline, PostProcess,
    TagStrategy, Unionizer, UnionizerConfig,
};
