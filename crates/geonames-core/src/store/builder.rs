//! Dump ingestion and index persistence.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::error::{GeoError, Result};
use crate::model::{Entity, RawEntity};
use crate::store::layout::{self, push_ref, Root, Section, OBJECT_RECORD_LEN};
use crate::store::{GeoStore, IdList};

/// Counters reported by a successful build.
#[derive(Debug, Clone, Copy)]
pub struct BuildStats {
    pub objects: usize,
    pub countries: usize,
    pub provinces: usize,
    pub cities: usize,
    /// Lines that were comments, blank, malformed, or filtered out.
    pub skipped: usize,
}

/// Build-time store: owns every surviving entity and the lookup maps that
/// will be persisted.
#[derive(Default)]
pub struct IndexBuilder {
    objects: HashMap<u32, RawEntity>,
    ids_by_name_hash: HashMap<u64, Vec<u32>>,
    ids_by_alt_hash: HashMap<u64, Vec<u32>>,
    country_by_code: HashMap<String, u32>,
    province_by_code: HashMap<String, u32>,
    skipped: usize,
}

impl IndexBuilder {
    pub fn new() -> IndexBuilder {
        IndexBuilder::default()
    }

    /// Ingests one dump line.
    ///
    /// Rows sharing an id are merged rather than re-indexed: the first
    /// occurrence keeps its names and hashes, adopting a later population
    /// only when its own is zero.
    pub fn add_line(&mut self, line: &str) {
        let Some(entity) = RawEntity::parse_line(line) else {
            if !line.is_empty() && !line.starts_with('#') {
                debug!(line, "skipping row");
            }
            self.skipped += 1;
            return;
        };

        if let Some(existing) = self.objects.get_mut(&entity.id) {
            existing.merge(&entity);
            return;
        }

        self.ids_by_name_hash
            .entry(entity.name_hash())
            .or_default()
            .push(entity.id);
        for &hash in &entity.alt_hashes {
            self.ids_by_alt_hash.entry(hash).or_default().push(entity.id);
        }
        if entity.kind.is_country() {
            self.country_by_code
                .entry(entity.country_code.clone())
                .or_insert(entity.id);
        }
        if entity.kind.is_province() {
            let key = format!("{}{}", entity.country_code, entity.province_code);
            self.province_by_code.entry(key).or_insert(entity.id);
        }
        self.objects.insert(entity.id, entity);
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn stats(&self) -> BuildStats {
        BuildStats {
            objects: self.objects.len(),
            countries: self.country_by_code.len(),
            provinces: self.province_by_code.len(),
            cities: self.objects.values().filter(|o| o.kind.is_city()).count(),
            skipped: self.skipped,
        }
    }

    /// Iterates all surviving entities, in no particular order.
    pub fn entities(&self) -> impl Iterator<Item = Entity<'_>> {
        self.objects.values().map(Entity::from_raw)
    }

    /// Serializes the index to `path` in the mapped-file layout.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        if self.objects.is_empty() {
            return Err(GeoError::EmptyInput);
        }
        let path = path.as_ref();

        let mut ids: Vec<u32> = self.objects.keys().copied().collect();
        ids.sort_unstable();

        // The heap is the first section, so heap offsets are file offsets.
        let mut heap: Vec<u8> = Vec::new();
        let mut records: Vec<u8> = Vec::with_capacity(ids.len() * OBJECT_RECORD_LEN);

        for id in &ids {
            let obj = &self.objects[id];
            records.extend_from_slice(&obj.id.to_le_bytes());
            records.extend_from_slice(&(obj.kind as u32).to_le_bytes());
            records.extend_from_slice(&obj.latitude.to_le_bytes());
            records.extend_from_slice(&obj.longitude.to_le_bytes());
            records.extend_from_slice(&obj.population.to_le_bytes());
            for text in [&obj.name, &obj.ascii_name, &obj.country_code, &obj.province_code] {
                let (off, len) = intern(&mut heap, text.as_bytes());
                push_ref(&mut records, off, len);
            }
            let alt_off = heap.len() as u64;
            for hash in &obj.alt_hashes {
                heap.extend_from_slice(&hash.to_le_bytes());
            }
            push_ref(&mut records, alt_off, obj.alt_hashes.len() as u32);
        }

        let names = encode_hash_table(&mut heap, &self.ids_by_name_hash);
        let alts = encode_hash_table(&mut heap, &self.ids_by_alt_hash);
        let countries = encode_code_table(&mut heap, &self.country_by_code);
        let provinces = encode_code_table(&mut heap, &self.province_by_code);

        let mut offset = heap.len() as u64;
        let mut place = |bytes: &[u8], count: usize| {
            let section = Section { offset, count: count as u64 };
            offset += bytes.len() as u64;
            section
        };
        let root = Root {
            objects: place(&records, ids.len()),
            names: place(&names, self.ids_by_name_hash.len()),
            alts: place(&alts, self.ids_by_alt_hash.len()),
            countries: place(&countries, self.country_by_code.len()),
            provinces: place(&provinces, self.province_by_code.len()),
        };
        let root_offset = offset;

        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(&heap)?;
        out.write_all(&records)?;
        out.write_all(&names)?;
        out.write_all(&alts)?;
        out.write_all(&countries)?;
        out.write_all(&provinces)?;
        out.write_all(&root.encode())?;
        out.write_all(&root_offset.to_le_bytes())?;
        out.flush()?;

        info!(path = %path.display(), objects = ids.len(), "index written");
        Ok(())
    }
}

fn intern(heap: &mut Vec<u8>, bytes: &[u8]) -> (u64, u32) {
    let off = heap.len() as u64;
    heap.extend_from_slice(bytes);
    (off, bytes.len() as u32)
}

/// Sorted `(hash, postings_off, count)` entries; postings go to the heap.
fn encode_hash_table(heap: &mut Vec<u8>, map: &HashMap<u64, Vec<u32>>) -> Vec<u8> {
    let mut hashes: Vec<u64> = map.keys().copied().collect();
    hashes.sort_unstable();

    let mut table = Vec::with_capacity(hashes.len() * layout::HASH_ENTRY_LEN);
    for hash in hashes {
        let ids = &map[&hash];
        let off = heap.len() as u64;
        for id in ids {
            heap.extend_from_slice(&id.to_le_bytes());
        }
        table.extend_from_slice(&hash.to_le_bytes());
        push_ref(&mut table, off, ids.len() as u32);
    }
    table
}

/// Sorted `(key_off, key_len, id)` entries; key bytes go to the heap.
fn encode_code_table(heap: &mut Vec<u8>, map: &HashMap<String, u32>) -> Vec<u8> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort_unstable();

    let mut table = Vec::with_capacity(keys.len() * layout::CODE_ENTRY_LEN);
    for key in keys {
        let (off, len) = intern(heap, key.as_bytes());
        push_ref(&mut table, off, len);
        table.extend_from_slice(&map[key].to_le_bytes());
    }
    table
}

impl GeoStore for IndexBuilder {
    fn entity(&self, id: u32) -> Option<Entity<'_>> {
        self.objects.get(&id).map(Entity::from_raw)
    }

    fn ids_by_name_hash(&self, hash: u64) -> IdList<'_> {
        match self.ids_by_name_hash.get(&hash) {
            Some(ids) => IdList::owned(ids),
            None => IdList::empty(),
        }
    }

    fn ids_by_alt_hash(&self, hash: u64) -> IdList<'_> {
        match self.ids_by_alt_hash.get(&hash) {
            Some(ids) => IdList::owned(ids),
            None => IdList::empty(),
        }
    }

    fn country_by_code(&self, code: &str) -> Option<u32> {
        self.country_by_code.get(code).copied()
    }

    fn province_by_code(&self, code: &str) -> Option<u32> {
        self.province_by_code.get(code).copied()
    }
}

/// Builds an index file from a GeoNames dump.
///
/// Reads `raw_path` line by line (gzip-compressed dumps are detected by
/// their `.gz` extension), indexes every surviving row and serializes the
/// result to `map_path`. Fails with [`GeoError::EmptyInput`] when nothing
/// survives the filters.
pub fn build_index(map_path: impl AsRef<Path>, raw_path: impl AsRef<Path>) -> Result<BuildStats> {
    let reader = open_dump(raw_path.as_ref())?;

    let mut builder = IndexBuilder::new();
    for line in reader.lines() {
        builder.add_line(&line?);
    }
    if builder.is_empty() {
        return Err(GeoError::EmptyInput);
    }

    builder.persist(map_path)?;
    let stats = builder.stats();
    info!(
        objects = stats.objects,
        countries = stats.countries,
        provinces = stats.provinces,
        cities = stats.cities,
        skipped = stats.skipped,
        "dump ingested"
    );
    Ok(stats)
}

fn open_dump(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let file = File::open(path).map_err(|e| {
        GeoError::NotFound(format!("unable to open input file {}: {e}", path.display()))
    })?;

    let stream: Box<dyn Read> = if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(BufReader::new(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::name_hash;
    use crate::types::GeoType;

    fn row(id: u32, name: &str, alts: &str, code: &str, cc: &str, adm1: &str, pop: &str) -> String {
        format!(
            "{id}\t{name}\t{name}\t{alts}\t10.0\t20.0\tA\t{code}\t{cc}\t\t{adm1}\t\t\t\t{pop}\t\t\t\t"
        )
    }

    #[test]
    fn indexes_names_codes_and_alt_hashes() {
        let mut b = IndexBuilder::new();
        b.add_line(&row(1, "Utopia", "Nowhere,Erewhon", "PCLI", "UT", "00", "1000"));
        b.add_line(&row(2, "Utopia Major", "", "ADM1", "UT", "UM", "0"));
        b.add_line(&row(3, "Utopia City", "", "PPLC", "UT", "UM", "42"));

        assert_eq!(b.stats().objects, 3);
        assert_eq!(b.stats().countries, 1);
        assert_eq!(b.stats().provinces, 1);
        assert_eq!(b.stats().cities, 1);

        // Hash completeness over names and alternate names.
        for e in b.entities() {
            let hits: Vec<u32> = b.ids_by_name_hash(name_hash(e.name)).collect();
            assert!(hits.contains(&e.id), "name hash miss for {}", e.name);
            for hash in e.alt_hashes() {
                let hits: Vec<u32> = b.ids_by_alt_hash(hash).collect();
                assert!(hits.contains(&e.id));
            }
        }

        assert_eq!(b.country_by_code("UT"), Some(1));
        assert_eq!(b.province_by_code("UTUM"), Some(2));
        assert_eq!(b.country_by_code("XX"), None);
    }

    #[test]
    fn duplicate_ids_merge_population() {
        let mut b = IndexBuilder::new();
        b.add_line(&row(7, "Twice", "", "PPL", "UT", "UM", "0"));
        b.add_line(&row(7, "Twice", "", "PPL", "UT", "UM", "123"));

        assert_eq!(b.stats().objects, 1);
        assert_eq!(b.entity(7).unwrap().population, 123);
        // The duplicate must not double the postings list.
        let hits: Vec<u32> = b.ids_by_name_hash(name_hash("Twice")).collect();
        assert_eq!(hits, vec![7]);
    }

    #[test]
    fn first_code_registration_wins() {
        let mut b = IndexBuilder::new();
        b.add_line(&row(1, "First", "", "PCLI", "ZZ", "00", "0"));
        b.add_line(&row(2, "Second", "", "PCLI", "ZZ", "00", "0"));
        assert_eq!(b.country_by_code("ZZ"), Some(1));
    }

    #[test]
    fn comments_and_filtered_rows_are_skipped() {
        let mut b = IndexBuilder::new();
        b.add_line("# header");
        b.add_line("");
        b.add_line(&row(9, "Old Realm", "", "PCLH", "ZZ", "00", "0"));
        assert!(b.is_empty());
        assert_eq!(b.stats().skipped, 3);
    }

    #[test]
    fn persisting_an_empty_index_fails() {
        let b = IndexBuilder::new();
        let dir = tempfile::tempdir().unwrap();
        let err = b.persist(dir.path().join("empty.idx")).unwrap_err();
        assert!(matches!(err, GeoError::EmptyInput));
    }

    #[test]
    fn entities_expose_geo_kinds() {
        let mut b = IndexBuilder::new();
        b.add_line(&row(1, "Utopia", "", "PCLI", "UT", "00", "0"));
        let e = b.entity(1).unwrap();
        assert_eq!(e.kind, GeoType::PolitIndep);
        assert!(e.is_country());
        assert!(!e.is_city());
    }
}
