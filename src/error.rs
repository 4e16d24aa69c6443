use thiserror::Error;

/// Errors surfaced by post-processor construction and processing.
///
/// Construction never yields a partially-built processor: a bad
/// configuration value fails before any state is allocated. Inside
/// `process` the only fallible collaborator is the auxiliary datasource;
/// geometry-shape mismatches are skipped, not reported.
#[derive(Debug, Error)]
pub enum Error {
    /// Unrecognized or out-of-range configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Auxiliary datasource could not be opened or queried.
    #[error("datasource error: {0}")]
    Datasource(String),
}

pub type Result<T> = std::result::Result<T, Error>;
