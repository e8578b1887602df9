//! Field mapping
//!
//! Raw parcels carry heterogeneous, export-specific attribute keys. The
//! mapping table names, for each canonical field, the source path it is read
//! from; [`FieldMapper`] applies the table as a pure function.
//!
//! ```rust,ignore
//! let table = FieldMappingTable::from_settings(&settings.field_mapping, &settings.validation);
//! let record = FieldMapper::new(table).map(&input)?;
//! ```

pub mod convert;
mod error;
mod mapper;
mod types;

pub use error::{MappingError, MappingResult};
pub use mapper::{FieldMapper, MapInput};
pub use types::{FieldMapping, FieldMappingTable, SourcePath};
