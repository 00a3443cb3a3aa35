//! geonames-cli
//! ============
//!
//! Command-line interface for the `geonames-core` geographic query
//! parser.
//!
//! This crate primarily provides a binary (`geonames`). We include a
//! small library target so that docs.rs renders a documentation page and
//! shows this overview.
//!
//! Quick start
//! -----------
//!
//! ```text
//! geonames --help
//! geonames -b geonames.idx allCountries.txt
//! geonames -q "San Jose, CA" geonames.idx
//! ```
//!
//! For programmatic access to the index and parser, use the
//! `geonames-core` crate directly.

// This library target intentionally exposes no API; the binary is the
// primary deliverable.
