//! Borrowed entity views.
//!
//! A single value type serves both storage backends: the builder hands out
//! entities borrowing from its owned rows, the mapped store hands out
//! entities borrowing from the mapped region. Either way the handle is a
//! cheap `Copy` whose lifetime is bound to its store.

use crate::geo::haversine_km;
use crate::model::raw::RawEntity;
use crate::types::GeoType;

/// A geographic entity resolved from a store.
#[derive(Debug, Clone, Copy)]
pub struct Entity<'s> {
    pub id: u32,
    pub kind: GeoType,
    pub latitude: f64,
    pub longitude: f64,
    pub population: u64,
    pub name: &'s str,
    pub ascii_name: &'s str,
    pub country_code: &'s str,
    pub province_code: &'s str,
    pub(crate) alt: AltHashes<'s>,
}

impl<'s> Entity<'s> {
    pub(crate) fn from_raw(raw: &'s RawEntity) -> Entity<'s> {
        Entity {
            id: raw.id,
            kind: raw.kind,
            latitude: raw.latitude,
            longitude: raw.longitude,
            population: raw.population,
            name: &raw.name,
            ascii_name: &raw.ascii_name,
            country_code: &raw.country_code,
            province_code: &raw.province_code,
            alt: AltHashes::Owned(&raw.alt_hashes),
        }
    }

    /// Hashes of the lowercased alternate names this entity was indexed
    /// under.
    pub fn alt_hashes(&self) -> AltHashIter<'s> {
        AltHashIter { alt: self.alt, next: 0 }
    }

    pub fn is_country(&self) -> bool {
        self.kind.is_country()
    }

    pub fn is_province(&self) -> bool {
        self.kind.is_province()
    }

    pub fn is_city(&self) -> bool {
        self.kind.is_city()
    }

    pub fn has_country_code(&self) -> bool {
        !self.country_code.is_empty()
    }

    pub fn has_province_code(&self) -> bool {
        !self.province_code.is_empty()
    }

    /// Great-circle distance to another entity, in kilometers.
    pub fn distance_km(&self, other: &Entity<'_>) -> f64 {
        haversine_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Alt-hash storage: an owned slice in the builder, raw little-endian
/// bytes in the mapped file.
#[derive(Debug, Clone, Copy)]
pub(crate) enum AltHashes<'s> {
    Owned(&'s [u64]),
    Raw(&'s [u8]),
}

impl AltHashes<'_> {
    fn len(&self) -> usize {
        match self {
            AltHashes::Owned(hashes) => hashes.len(),
            AltHashes::Raw(bytes) => bytes.len() / 8,
        }
    }

    fn get(&self, idx: usize) -> u64 {
        match self {
            AltHashes::Owned(hashes) => hashes[idx],
            AltHashes::Raw(bytes) => {
                let start = idx * 8;
                u64::from_le_bytes(bytes[start..start + 8].try_into().unwrap())
            }
        }
    }
}

pub struct AltHashIter<'s> {
    alt: AltHashes<'s>,
    next: usize,
}

impl Iterator for AltHashIter<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.next >= self.alt.len() {
            return None;
        }
        let hash = self.alt.get(self.next);
        self.next += 1;
        Some(hash)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.alt.len() - self.next;
        (left, Some(left))
    }
}
