//! Error taxonomy.
//!
//! Nothing in this crate is fatal to the host: a failed dataset load keeps
//! the previously loaded data usable, a record that fails validation is
//! dropped and counted, and a query with no matches is simply an empty
//! session. Only dataset loading produces a `Result` at all.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    /// The raw payload was not a record array (nor an object wrapping one
    /// under `data` or `rows`). The previous dataset, if any, is kept.
    #[error("dataset `{dataset}`: payload is not a record array")]
    NotAnArray { dataset: String },

    /// The raw payload string was not valid JSON.
    #[error("dataset payload is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
