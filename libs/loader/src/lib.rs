//! Coda table loader: paginated fetch, lookup expansion with a
//! load-scoped cache, value normalization and string sanitizing.

pub mod config;
pub mod error;
pub mod expand;
pub mod fetch;
pub mod loader;
pub mod normalize;
pub mod sanitize;
pub mod schema;
pub mod session;

#[cfg(test)]
mod testing;

pub use config::{LoaderOptions, LoaderSettings, QueryFilter};
pub use error::LoaderError;
pub use expand::Expander;
pub use fetch::TableFetcher;
pub use loader::{CodaLoader, LoadSummary};
pub use normalize::{ColumnTypes, normalize, normalize_value};
pub use sanitize::{sanitize, sanitize_str, sanitize_values};
pub use schema::{infer_field, infer_schema};
pub use session::Session;
