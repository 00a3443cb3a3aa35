//! Index storage.
//!
//! Two backends expose the same lookup contract: [`IndexBuilder`] owns the
//! data while a dump is being ingested, [`MappedStore`] serves zero-copy
//! views over a persisted index file. The query parser is written against
//! the [`GeoStore`] trait so both can answer parses.

pub mod builder;
pub(crate) mod layout;
pub mod mapped;

pub use builder::{build_index, BuildStats, IndexBuilder};
pub use mapped::MappedStore;

use crate::model::Entity;
use crate::parser::{ParseResult, ParserSettings};

/// Read contract over a built index: the object table, the two hashed name
/// indices, and the two code tables.
pub trait GeoStore {
    /// Resolves an entity by id. Entities returned borrow from the store
    /// and must not outlive it.
    fn entity(&self, id: u32) -> Option<Entity<'_>>;

    /// Ids of entities whose lowercased primary name has this hash.
    fn ids_by_name_hash(&self, hash: u64) -> IdList<'_>;

    /// Ids of entities indexed under this alternate-name hash.
    fn ids_by_alt_hash(&self, hash: u64) -> IdList<'_>;

    /// Id of the country entity with this ISO-3166 alpha-2 code.
    fn country_by_code(&self, code: &str) -> Option<u32>;

    /// Id of the province entity with this `country || admin1` composite
    /// code.
    fn province_by_code(&self, code: &str) -> Option<u32>;

    /// Parses a free-text query against this store.
    ///
    /// Returns every top-scored interpretation; an empty list means the
    /// query matched nothing (or that a unique-only parse was ambiguous).
    fn parse(&self, query: &str, settings: &ParserSettings) -> Vec<ParseResult<'_>>
    where
        Self: Sized,
    {
        crate::parser::parse(self, query, settings)
    }
}

/// Iterator over an id postings list, regardless of backing storage.
pub struct IdList<'a> {
    inner: IdListInner<'a>,
}

enum IdListInner<'a> {
    Owned(std::slice::Iter<'a, u32>),
    Raw(std::slice::ChunksExact<'a, u8>),
    Empty,
}

impl<'a> IdList<'a> {
    pub(crate) fn owned(ids: &'a [u32]) -> IdList<'a> {
        IdList { inner: IdListInner::Owned(ids.iter()) }
    }

    /// Little-endian u32 postings as stored in the mapped heap.
    pub(crate) fn raw(bytes: &'a [u8]) -> IdList<'a> {
        IdList { inner: IdListInner::Raw(bytes.chunks_exact(4)) }
    }

    pub(crate) fn empty() -> IdList<'a> {
        IdList { inner: IdListInner::Empty }
    }
}

impl Iterator for IdList<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        match &mut self.inner {
            IdListInner::Owned(ids) => ids.next().copied(),
            IdListInner::Raw(chunks) => {
                chunks.next().map(|b| u32::from_le_bytes(b.try_into().unwrap()))
            }
            IdListInner::Empty => None,
        }
    }
}
