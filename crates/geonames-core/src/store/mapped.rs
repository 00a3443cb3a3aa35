//! Read-only store over a memory-mapped index file.

use std::cmp::Ordering;
use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;

use crate::error::{GeoError, Result};
use crate::model::entity::AltHashes;
use crate::model::Entity;
use crate::store::layout::{
    object, read_f64, read_ref, read_u32, read_u64, Root, Section, CODE_ENTRY_LEN, HASH_ENTRY_LEN,
    OBJECT_RECORD_LEN, ROOT_LEN, TRAILER_LEN,
};
use crate::store::{GeoStore, IdList};
use crate::types::GeoType;

/// A persisted index mapped into memory.
///
/// All lookups are pure reads over the mapping, so any number of parses
/// may run against the same store concurrently. Entities handed out
/// borrow from the mapping and must not outlive the store.
#[derive(Debug)]
pub struct MappedStore {
    mmap: Mmap,
    root: Root,
}

impl MappedStore {
    /// Maps an index file and validates its framing.
    ///
    /// The last 8 bytes locate the root header; the header in turn
    /// locates the five lookup tables. Any inconsistency (truncation, bad
    /// root offset, wrong magic, table past the end of the file) fails
    /// with [`GeoError::BadFile`].
    pub fn open(path: impl AsRef<Path>) -> Result<MappedStore> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            GeoError::NotFound(format!("unable to open index file {}: {e}", path.display()))
        })?;
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| GeoError::BadFile(format!("mmap of {} failed: {e}", path.display())))?;

        if mmap.len() < TRAILER_LEN + ROOT_LEN {
            return Err(GeoError::BadFile(format!("{} is too small", path.display())));
        }
        let data_len = mmap.len() - TRAILER_LEN;
        let root_offset = read_u64(&mmap, data_len) as usize;
        if root_offset >= data_len || data_len - root_offset < ROOT_LEN {
            return Err(GeoError::BadFile(format!(
                "invalid root offset in {}",
                path.display()
            )));
        }
        let root = Root::decode(&mmap[root_offset..root_offset + ROOT_LEN]).ok_or_else(|| {
            GeoError::BadFile(format!("unrecognized index header in {}", path.display()))
        })?;

        for (section, entry_len) in [
            (root.objects, OBJECT_RECORD_LEN),
            (root.names, HASH_ENTRY_LEN),
            (root.alts, HASH_ENTRY_LEN),
            (root.countries, CODE_ENTRY_LEN),
            (root.provinces, CODE_ENTRY_LEN),
        ] {
            let end = section
                .count
                .checked_mul(entry_len as u64)
                .and_then(|bytes| section.offset.checked_add(bytes));
            if !matches!(end, Some(end) if end <= root_offset as u64) {
                return Err(GeoError::BadFile(format!(
                    "table out of bounds in {}",
                    path.display()
                )));
            }
        }

        let store = MappedStore { mmap, root };
        if tracing::enabled!(tracing::Level::DEBUG) {
            store.log_coverage();
        }
        Ok(store)
    }

    /// Number of entities in the index.
    pub fn len(&self) -> usize {
        self.root.objects.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates all entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = Entity<'_>> {
        (0..self.len()).filter_map(move |idx| self.decode_record(self.record_at(idx)))
    }

    /// Counts entities whose country or province code does not resolve
    /// through the code tables; a non-empty dump usually has a few.
    fn log_coverage(&self) {
        let mut incomplete = 0usize;
        for e in self.entities() {
            if self.country_by_code(e.country_code).is_none() {
                incomplete += 1;
                continue;
            }
            let composite = format!("{}{}", e.country_code, e.province_code);
            if self.province_by_code(&composite).is_none() {
                incomplete += 1;
            }
        }
        if incomplete > 0 {
            debug!(incomplete, "objects without resolvable country or province code");
        }
    }

    fn record_at(&self, idx: usize) -> &[u8] {
        let start = self.root.objects.offset as usize + idx * OBJECT_RECORD_LEN;
        &self.mmap[start..start + OBJECT_RECORD_LEN]
    }

    fn heap(&self, off: u64, len: usize) -> Option<&[u8]> {
        let start = usize::try_from(off).ok()?;
        let end = start.checked_add(len)?;
        self.mmap.get(start..end)
    }

    fn str_at(&self, off: u64, len: u32) -> Option<&str> {
        std::str::from_utf8(self.heap(off, len as usize)?).ok()
    }

    fn decode_record<'s>(&'s self, rec: &'s [u8]) -> Option<Entity<'s>> {
        let (name_off, name_len) = read_ref(rec, object::NAME);
        let (ascii_off, ascii_len) = read_ref(rec, object::ASCII_NAME);
        let (cc_off, cc_len) = read_ref(rec, object::COUNTRY_CODE);
        let (pc_off, pc_len) = read_ref(rec, object::PROVINCE_CODE);
        let (alt_off, alt_count) = read_ref(rec, object::ALT_HASHES);

        Some(Entity {
            id: read_u32(rec, object::ID),
            kind: GeoType::from_u32(read_u32(rec, object::KIND)),
            latitude: read_f64(rec, object::LATITUDE),
            longitude: read_f64(rec, object::LONGITUDE),
            population: read_u64(rec, object::POPULATION),
            name: self.str_at(name_off, name_len)?,
            ascii_name: self.str_at(ascii_off, ascii_len)?,
            country_code: self.str_at(cc_off, cc_len)?,
            province_code: self.str_at(pc_off, pc_len)?,
            alt: AltHashes::Raw(self.heap(alt_off, alt_count as usize * 8)?),
        })
    }

    fn hash_lookup(&self, section: Section, hash: u64) -> IdList<'_> {
        let base = section.offset as usize;
        let mut lo = 0usize;
        let mut hi = section.count as usize;
        while lo < hi {
            let mid = (lo + hi) / 2;
            let entry = &self.mmap[base + mid * HASH_ENTRY_LEN..base + (mid + 1) * HASH_ENTRY_LEN];
            match read_u64(entry, 0).cmp(&hash) {
                Ordering::Equal => {
                    let (off, count) = read_ref(entry, 8);
                    return match self.heap(off, count as usize * 4) {
                        Some(bytes) => IdList::raw(bytes),
                        None => IdList::empty(),
                    };
                }
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
            }
        }
        IdList::empty()
    }

    fn code_lookup(&self, section: Section, code: &str) -> Option<u32> {
        let base = section.offset as usize;
        let mut lo = 0usize;
        let mut hi = section.count as usize;
        while lo < hi {
            let mid = (lo + hi) / 2;
            let entry = &self.mmap[base + mid * CODE_ENTRY_LEN..base + (mid + 1) * CODE_ENTRY_LEN];
            let (key_off, key_len) = read_ref(entry, 0);
            let key = self.heap(key_off, key_len as usize)?;
            match key.cmp(code.as_bytes()) {
                Ordering::Equal => return Some(read_u32(entry, 12)),
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
            }
        }
        None
    }
}

impl GeoStore for MappedStore {
    fn entity(&self, id: u32) -> Option<Entity<'_>> {
        let mut lo = 0usize;
        let mut hi = self.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            let rec = self.record_at(mid);
            match read_u32(rec, object::ID).cmp(&id) {
                Ordering::Equal => return self.decode_record(rec),
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
            }
        }
        None
    }

    fn ids_by_name_hash(&self, hash: u64) -> IdList<'_> {
        self.hash_lookup(self.root.names, hash)
    }

    fn ids_by_alt_hash(&self, hash: u64) -> IdList<'_> {
        self.hash_lookup(self.root.alts, hash)
    }

    fn country_by_code(&self, code: &str) -> Option<u32> {
        self.code_lookup(self.root.countries, code)
    }

    fn province_by_code(&self, code: &str) -> Option<u32> {
        self.code_lookup(self.root.provinces, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn open_missing_file_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = MappedStore::open(dir.path().join("nope.idx")).unwrap_err();
        assert!(matches!(err, GeoError::NotFound(_)));
    }

    #[test]
    fn open_rejects_tiny_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.idx");
        std::fs::write(&path, b"short").unwrap();
        let err = MappedStore::open(&path).unwrap_err();
        assert!(matches!(err, GeoError::BadFile(_)));
    }

    #[test]
    fn open_rejects_garbage_root_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.idx");
        let mut file = File::create(&path).unwrap();
        file.write_all(&[0u8; 256]).unwrap();
        file.write_all(&u64::MAX.to_le_bytes()).unwrap();
        drop(file);
        let err = MappedStore::open(&path).unwrap_err();
        assert!(matches!(err, GeoError::BadFile(_)));
    }

    #[test]
    fn open_rejects_wrong_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("magic.idx");
        let mut file = File::create(&path).unwrap();
        // A plausible frame whose header bytes are not ours.
        file.write_all(&[0xAAu8; ROOT_LEN]).unwrap();
        file.write_all(&0u64.to_le_bytes()).unwrap();
        drop(file);
        let err = MappedStore::open(&path).unwrap_err();
        assert!(matches!(err, GeoError::BadFile(_)));
    }
}
