//! Decoding of one tab-separated dump record into an owned entity.
//!
//! The GeoNames dump (<https://download.geonames.org/export/dump/>) carries
//! nineteen columns per line; only a subset is consumed:
//!
//! | column | field           | handling                                   |
//! |--------|-----------------|--------------------------------------------|
//! | 0      | geonameid       | u32, row skipped if unparseable            |
//! | 1      | name            | canonical unicode name                     |
//! | 2      | asciiname       | ASCII fallback                             |
//! | 3      | alternatenames  | comma-separated, hashed then discarded     |
//! | 4, 5   | latitude, longitude | f64 degrees, row skipped if unparseable |
//! | 7      | feature code    | mapped to [`GeoType`]                      |
//! | 8      | country code    | ISO-3166 alpha-2                           |
//! | 10     | admin1 code     | province code                              |
//! | 14     | population      | u64, unparseable becomes 0                 |
//!
//! Raw alternate names are not retained: the query path only ever probes by
//! equality, so their stable hashes are enough and keep the index small.

use crate::text::name_hash;
use crate::types::GeoType;

/// An owned entity as decoded from one dump line, before indexing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntity {
    pub id: u32,
    pub kind: GeoType,
    pub latitude: f64,
    pub longitude: f64,
    pub population: u64,
    pub name: String,
    pub ascii_name: String,
    pub country_code: String,
    pub province_code: String,
    pub alt_hashes: Vec<u64>,
}

impl RawEntity {
    /// Decodes one dump line.
    ///
    /// Returns `None` for comments, empty lines, rows with unparseable
    /// id/coordinates, and rows whose feature code is unknown or belongs
    /// to the secondary (odd-valued) feature set.
    pub fn parse_line(line: &str) -> Option<RawEntity> {
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let mut entity = RawEntity {
            id: 0,
            kind: GeoType::Undef,
            latitude: 0.0,
            longitude: 0.0,
            population: 0,
            name: String::new(),
            ascii_name: String::new(),
            country_code: String::new(),
            province_code: String::new(),
            alt_hashes: Vec::new(),
        };

        for (idx, column) in line.split('\t').enumerate() {
            match idx {
                0 => entity.id = column.parse().ok()?,
                1 => entity.name = column.to_string(),
                2 => entity.ascii_name = column.to_string(),
                3 => {
                    for alt in column.split(',').filter(|alt| !alt.is_empty()) {
                        entity.alt_hashes.push(name_hash(alt));
                    }
                }
                4 => entity.latitude = column.parse().ok()?,
                5 => entity.longitude = column.parse().ok()?,
                7 => entity.kind = GeoType::from_code(column),
                8 => entity.country_code = column.to_string(),
                10 => entity.province_code = column.to_string(),
                14 => entity.population = column.parse().unwrap_or(0),
                _ => {}
            }
        }

        if entity.kind == GeoType::Undef || entity.kind.is_extra() {
            return None;
        }
        Some(entity)
    }

    /// Stable hash of the lowercased canonical name.
    pub fn name_hash(&self) -> u64 {
        name_hash(&self.name)
    }

    /// Adopts the other row's population when this one has none; the rest
    /// of the first-seen row wins.
    pub fn merge(&mut self, other: &RawEntity) {
        debug_assert_eq!(self.id, other.id);
        if self.population == 0 {
            self.population = other.population;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(fields: &[(usize, &str)]) -> String {
        let mut columns = vec![String::new(); 19];
        for &(idx, value) in fields {
            columns[idx] = value.to_string();
        }
        columns.join("\t")
    }

    #[test]
    fn parses_a_city_row() {
        let row = line(&[
            (0, "5392171"),
            (1, "San Jose"),
            (2, "San Jose"),
            (3, "San José,SJ"),
            (4, "37.33939"),
            (5, "-121.89496"),
            (6, "P"),
            (7, "PPLA2"),
            (8, "US"),
            (10, "CA"),
            (14, "945942"),
        ]);
        let e = RawEntity::parse_line(&row).unwrap();
        assert_eq!(e.id, 5392171);
        assert_eq!(e.kind, GeoType::PopulAdm2);
        assert_eq!(e.name, "San Jose");
        assert_eq!(e.country_code, "US");
        assert_eq!(e.province_code, "CA");
        assert_eq!(e.population, 945942);
        assert_eq!(e.alt_hashes.len(), 2);
        assert_eq!(e.alt_hashes[1], name_hash("sj"));
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        assert!(RawEntity::parse_line("").is_none());
        assert!(RawEntity::parse_line("# geonameid\tname").is_none());
    }

    #[test]
    fn skips_unknown_and_extra_feature_codes() {
        let unknown = line(&[(0, "1"), (1, "X"), (4, "0"), (5, "0"), (7, "STM")]);
        assert!(RawEntity::parse_line(&unknown).is_none());

        let historical = line(&[(0, "2"), (1, "Y"), (4, "0"), (5, "0"), (7, "PCLH")]);
        assert!(RawEntity::parse_line(&historical).is_none());
    }

    #[test]
    fn skips_rows_with_malformed_id_or_coordinates() {
        let bad_id = line(&[(0, "abc"), (1, "X"), (4, "0"), (5, "0"), (7, "PPL")]);
        assert!(RawEntity::parse_line(&bad_id).is_none());

        let bad_lat = line(&[(0, "1"), (1, "X"), (4, "north"), (5, "0"), (7, "PPL")]);
        assert!(RawEntity::parse_line(&bad_lat).is_none());
    }

    #[test]
    fn malformed_population_becomes_zero() {
        let row = line(&[(0, "1"), (1, "X"), (4, "0"), (5, "0"), (7, "PPL"), (14, "n/a")]);
        assert_eq!(RawEntity::parse_line(&row).unwrap().population, 0);
    }

    #[test]
    fn merge_adopts_population_only_when_missing() {
        let a = line(&[(0, "1"), (1, "X"), (4, "0"), (5, "0"), (7, "PPL"), (14, "0")]);
        let b = line(&[(0, "1"), (1, "X"), (4, "0"), (5, "0"), (7, "PPL"), (14, "100")]);
        let mut first = RawEntity::parse_line(&a).unwrap();
        let second = RawEntity::parse_line(&b).unwrap();
        first.merge(&second);
        assert_eq!(first.population, 100);

        let mut kept = RawEntity::parse_line(&b).unwrap();
        let other = RawEntity::parse_line(&a).unwrap();
        kept.merge(&other);
        assert_eq!(kept.population, 100);
    }
}
