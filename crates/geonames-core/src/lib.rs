//! geonames-core
//! =============
//!
//! Identify countries, first-level administrative divisions ("provinces")
//! and populated places ("cities") mentioned in short free-text queries
//! such as `"San Jose, CA"` or `"Paris France"`.
//!
//! The crate has two halves:
//!
//! - An index built once from the public GeoNames tab-separated dump
//!   ([`build_index`]) and then memory-mapped for zero-copy lookups
//!   ([`MappedStore`]).
//! - A query parser ([`GeoStore::parse`]) that tokenizes a query,
//!   generates candidate-name hypotheses, probes the hashed indices,
//!   disambiguates by administrative hierarchy and ranks the surviving
//!   interpretations.
//!
//! ```no_run
//! use geonames_core::{GeoStore, MappedStore, ParserSettings};
//!
//! # fn main() -> geonames_core::Result<()> {
//! let store = MappedStore::open("geonames.idx")?;
//! for res in store.parse("San Jose, CA", &ParserSettings::default()) {
//!     if let Some(city) = &res.city {
//!         println!("{} ({:.2}, {:.2})", city.entity.name, city.entity.latitude, city.entity.longitude);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod geo;
pub mod model;
pub mod parser;
pub mod store;
pub mod text;
pub mod types;

// Re-exports for convenience
pub use crate::error::{GeoError, Result};
pub use crate::geo::haversine_km;
pub use crate::model::Entity;
pub use crate::parser::{ParseResult, ParsedObject, ParserSettings, DEFAULT_DELIMITERS};
pub use crate::store::{build_index, BuildStats, GeoStore, IndexBuilder, MappedStore};
pub use crate::types::GeoType;
