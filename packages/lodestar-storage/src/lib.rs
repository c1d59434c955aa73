pub mod chroma;
pub mod db;
pub mod models;
pub mod records;
pub mod registry;
pub mod schema;
pub mod vector;

mod error;

pub use error::Error;

use std::{future::Future, pin::Pin};

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Flat map of scalar values attached to an indexed document. The vector
/// backend stores no nested structures, so values must stay primitive.
pub type Metadata = serde_json::Map<String, serde_json::Value>;
