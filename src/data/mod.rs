//! Data module - CSV loading, schema discovery and coercion

pub mod loader;
pub mod model;
pub mod processor;
pub mod schema;

pub use loader::{PopulationTable, ReadError, TableCache};
pub use model::{AgeDistribution, AgeGroupSeries, BySex, Sex, TrendSeries};
pub use processor::{CoercionError, DataProcessor, MalformedCell, ProcessorError};
pub use schema::SchemaError;
