//! Index probing and match collection.
//!
//! Hypothesis names are probed against the hashed name indices and the
//! two code tables, and every hit lands in a per-role bucket: countries
//! keyed by country code, provinces by the `country || admin1` composite,
//! cities by entity id. A bucket accepts updates only while they agree on
//! the entity; conflicting ids poison it for the rest of the parse.

use std::collections::{HashMap, HashSet};

use crate::model::Entity;
use crate::parser::tokenize::Hypothesis;
use crate::parser::{ParseResult, ParsedObject};
use crate::store::GeoStore;
use crate::text::name_hash_chars;

/// A bucket accumulating evidence for one entity.
#[derive(Debug, Default)]
pub(crate) struct MatchedObject<'s> {
    entity: Option<Entity<'s>>,
    tokens: Vec<String>,
    by_name: bool,
    ambiguous: bool,
}

impl<'s> MatchedObject<'s> {
    /// Records a hit.
    ///
    /// Tokens are deduplicated by substring: a token already covered by a
    /// stored token is dropped, and a token covering a stored one replaces
    /// it, so a place hit by both a short and a long variant of its name
    /// is not counted twice.
    pub(crate) fn update(&mut self, entity: Entity<'s>, token: String, by_name: bool) {
        if self.ambiguous {
            return;
        }
        match self.entity {
            None => {
                self.entity = Some(entity);
                self.tokens.push(token);
                self.by_name = by_name;
            }
            Some(existing) if existing.id != entity.id => {
                self.entity = None;
                self.tokens.clear();
                self.by_name = false;
                self.ambiguous = true;
            }
            Some(_) => {
                let mut covered = false;
                for stored in self.tokens.iter_mut() {
                    if stored.contains(token.as_str()) {
                        covered = true;
                        break;
                    }
                    if token.contains(stored.as_str()) {
                        stored.clone_from(&token);
                        covered = true;
                        break;
                    }
                }
                if !covered {
                    self.tokens.push(token);
                }
                self.by_name |= by_name;
            }
        }
    }

    fn to_parsed(&self) -> Option<ParsedObject<'s>> {
        self.entity.map(|entity| ParsedObject {
            entity,
            tokens: self.tokens.clone(),
            by_name: self.by_name,
        })
    }
}

#[derive(Debug, Default)]
pub(crate) struct Buckets<'s> {
    countries: HashMap<String, MatchedObject<'s>>,
    provinces: HashMap<String, MatchedObject<'s>>,
    cities: HashMap<u32, MatchedObject<'s>>,
}

impl Buckets<'_> {
    fn is_empty(&self) -> bool {
        self.countries.is_empty() && self.provinces.is_empty() && self.cities.is_empty()
    }
}

/// Probes every hypothesis in order and fills the role buckets.
pub(crate) fn collect<'s, S: GeoStore>(
    store: &'s S,
    query: &[char],
    hypotheses: &[Hypothesis],
) -> Buckets<'s> {
    let mut buckets = Buckets::default();

    for hypo in hypotheses {
        for name in &hypo.names {
            let hash = name_hash_chars(name.iter().copied());
            for id in store.ids_by_name_hash(hash) {
                add_object(store, &mut buckets, id, name, true);
            }
        }
        for name in &hypo.names {
            let hash = name_hash_chars(name.iter().copied());
            for id in store.ids_by_alt_hash(hash) {
                add_object(store, &mut buckets, id, name, false);
            }
        }

        let first = &hypo.names[0];
        if first.len() == 2 {
            let code: String = first.iter().collect();
            // Two ASCII characters: try it as an ISO country code, and as
            // a US state abbreviation.
            if code.len() == 2 {
                let code = code.to_ascii_uppercase();
                if let Some(id) = store.country_by_code(&code) {
                    add_object(store, &mut buckets, id, first, true);
                }
                if let Some(id) = store.province_by_code(&format!("US{code}")) {
                    add_object(store, &mut buckets, id, first, true);
                }
            }
        }

        // A whole-query hit beats token-window guesses: stop expanding.
        if first.as_slice() == query && !buckets.is_empty() {
            break;
        }
    }
    buckets
}

fn add_object<'s, S: GeoStore>(
    store: &'s S,
    buckets: &mut Buckets<'s>,
    id: u32,
    token: &[char],
    by_name: bool,
) {
    let Some(entity) = store.entity(id) else {
        debug_assert!(false, "index references unknown id {id}");
        return;
    };
    let token: String = token.iter().collect();

    if entity.is_country() {
        buckets
            .countries
            .entry(entity.country_code.to_string())
            .or_default()
            .update(entity, token, by_name);
    } else if entity.is_province() {
        let key = format!("{}{}", entity.country_code, entity.province_code);
        buckets.provinces.entry(key).or_default().update(entity, token, by_name);
    } else if entity.is_city() {
        buckets.cities.entry(entity.id).or_default().update(entity, token, by_name);
    }
}

/// Stitches buckets into country/province/city triples.
///
/// Cities claim their country and province buckets first; provinces not
/// claimed by any city then claim their country; countries left over
/// stand alone. Ambiguous buckets are skipped everywhere.
pub(crate) fn assemble<'s>(buckets: &Buckets<'s>) -> Vec<ParseResult<'s>> {
    let mut results = Vec::new();
    let mut used: HashSet<String> = HashSet::new();

    for matched in buckets.cities.values() {
        let Some(city) = matched.to_parsed() else { continue };
        let country_code = city.entity.country_code;
        let composite = format!("{}{}", country_code, city.entity.province_code);

        let mut res = ParseResult { country: None, province: None, city: Some(city), score: 0.0 };
        attach(&buckets.countries, country_code, &mut res.country, &mut used);
        attach(&buckets.provinces, &composite, &mut res.province, &mut used);
        results.push(res);
    }

    for (key, matched) in &buckets.provinces {
        if used.contains(key) {
            continue;
        }
        let Some(province) = matched.to_parsed() else { continue };
        let country_code = province.entity.country_code;

        let mut res =
            ParseResult { country: None, province: Some(province), city: None, score: 0.0 };
        attach(&buckets.countries, country_code, &mut res.country, &mut used);
        results.push(res);
    }

    for (key, matched) in &buckets.countries {
        if used.contains(key) {
            continue;
        }
        let Some(country) = matched.to_parsed() else { continue };
        results.push(ParseResult { country: Some(country), province: None, city: None, score: 0.0 });
    }

    results
}

fn attach<'s>(
    map: &HashMap<String, MatchedObject<'s>>,
    code: &str,
    slot: &mut Option<ParsedObject<'s>>,
    used: &mut HashSet<String>,
) {
    if code.is_empty() {
        return;
    }
    if let Some(matched) = map.get(code) {
        if let Some(parsed) = matched.to_parsed() {
            *slot = Some(parsed);
            used.insert(code.to_string());
        }
    }
}
