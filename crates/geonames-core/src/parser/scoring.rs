//! Result scoring, selection, near-duplicate merging and completion.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::model::Entity;
use crate::parser::{ParseResult, ParsedObject, ParserSettings};
use crate::store::GeoStore;
use crate::types::GeoType;

/// Scores every assembled result and keeps the ones tied at the top.
///
/// Kept results are completed: a missing country (or, for cities, a
/// missing province) is attached from the code tables so callers always
/// see the full hierarchy when it is resolvable.
pub(crate) fn select<'s, S: GeoStore>(
    store: &'s S,
    mut matched: Vec<ParseResult<'s>>,
    query: &[char],
    settings: &ParserSettings,
    area_token: bool,
) -> Vec<ParseResult<'s>> {
    if matched.is_empty() {
        return matched;
    }

    let default_code = default_country_code(store, settings);
    for res in &mut matched {
        res.score = calc_score(res, query.len(), &default_code, area_token);
    }

    // Track the running maximum; among tied city candidates, suppress
    // later arrivals that share (country, province, ascii name) with an
    // earlier one and sit within merge_near kilometers of it.
    let mut max_score = 0.0_f64;
    let mut top_cities: HashMap<String, Entity<'s>> = HashMap::new();
    let mut merged: HashSet<u32> = HashSet::new();
    for res in &matched {
        if max_score < res.score {
            max_score = res.score;
            top_cities.clear();
            note_city(&mut top_cities, &mut merged, res, settings.merge_near);
        } else if max_score == res.score {
            note_city(&mut top_cities, &mut merged, res, settings.merge_near);
        }
    }

    let mut results = Vec::new();
    for res in matched {
        if res.score != max_score {
            continue;
        }
        if let Some(city) = &res.city {
            if merged.contains(&city.entity.id) {
                continue;
            }
        }
        results.push(complete(store, res));
    }
    results
}

/// Resolves the configured default country to a country code by parsing
/// it as its own unique query.
fn default_country_code<S: GeoStore>(store: &S, settings: &ParserSettings) -> String {
    if settings.default_country.is_empty() {
        return String::new();
    }
    let unique = ParserSettings { unique_only: true, ..ParserSettings::default() };
    crate::parser::parse(store, &settings.default_country, &unique)
        .first()
        .and_then(|res| res.country.as_ref())
        .map(|country| country.entity.country_code.to_string())
        .unwrap_or_default()
}

fn calc_score(
    res: &ParseResult<'_>,
    query_len: usize,
    default_code: &str,
    area_token: bool,
) -> f64 {
    const ROLE_WEIGHTS: [f64; 3] = [3.0, 2.0, 1.0];

    let mut score = 0.0;
    let mut token_score = 1.0;
    let mut default_met = false;

    let roles = [res.country.as_ref(), res.province.as_ref(), res.city.as_ref()];
    for (role, weight) in roles.into_iter().zip(ROLE_WEIGHTS) {
        let Some(obj) = role else { continue };
        score += weight;
        if obj.by_name {
            score += 1.0;
        }
        if !default_met && !default_code.is_empty() && default_code == obj.entity.country_code {
            score += 3.0;
            default_met = true;
        }
        for token in &obj.tokens {
            token_score *= token.chars().count() as f64 / query_len as f64;
        }
    }

    // "San Francisco Bay Area" style queries: prefer the US state-level
    // populated place when the query says "area".
    if area_token {
        if let Some(city) = &res.city {
            if city.entity.country_code == "US" && city.entity.kind == GeoType::PopulAdm1 {
                score += 3.0;
            }
        }
    }

    score * (1.0 + token_score)
}

fn note_city<'s>(
    top_cities: &mut HashMap<String, Entity<'s>>,
    merged: &mut HashSet<u32>,
    res: &ParseResult<'s>,
    merge_near: f64,
) {
    let Some(city) = &res.city else { return };
    let entity = city.entity;
    let key = format!("{}{}{}", entity.country_code, entity.province_code, entity.ascii_name);
    match top_cities.entry(key) {
        Entry::Occupied(first) => {
            if first.get().distance_km(&entity) < merge_near {
                merged.insert(entity.id);
            }
        }
        Entry::Vacant(slot) => {
            slot.insert(entity);
        }
    }
}

fn complete<'s, S: GeoStore>(store: &'s S, mut res: ParseResult<'s>) -> ParseResult<'s> {
    let resolve = |id: Option<u32>| {
        id.and_then(|id| store.entity(id))
            .map(|entity| ParsedObject { entity, tokens: Vec::new(), by_name: false })
    };

    if res.country.is_none() {
        let code = res
            .city
            .as_ref()
            .map(|city| city.entity.country_code)
            .or_else(|| res.province.as_ref().map(|province| province.entity.country_code));
        if let Some(code) = code {
            if let Some(country) = resolve(store.country_by_code(code)) {
                res.country = Some(country);
            }
        }
    }
    if res.province.is_none() {
        if let Some(city) = &res.city {
            let composite = format!("{}{}", city.entity.country_code, city.entity.province_code);
            if let Some(province) = resolve(store.province_by_code(&composite)) {
                res.province = Some(province);
            }
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawEntity;

    fn raw(id: u32, name: &str, code: &str, cc: &str, adm1: &str) -> RawEntity {
        RawEntity::parse_line(&format!(
            "{id}\t{name}\t{name}\t\t0.0\t0.0\tX\t{code}\t{cc}\t\t{adm1}\t\t\t\t0\t\t\t\t"
        ))
        .unwrap()
    }

    fn parsed<'s>(raw: &'s RawEntity, tokens: &[&str], by_name: bool) -> ParsedObject<'s> {
        ParsedObject {
            entity: Entity::from_raw(raw),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            by_name,
        }
    }

    #[test]
    fn role_weights_and_by_name_bonus() {
        let fr = raw(1, "France", "PCLI", "FR", "00");
        let res = ParseResult {
            country: Some(parsed(&fr, &["France"], true)),
            province: None,
            city: None,
            score: 0.0,
        };
        // Country weight 3 + by-name 1, token covers 6 of 12 code points.
        let score = calc_score(&res, 12, "", false);
        assert!((score - 4.0 * 1.5).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn alt_matches_skip_the_by_name_bonus() {
        let fr = raw(1, "France", "PCLI", "FR", "00");
        let res = ParseResult {
            country: Some(parsed(&fr, &["France"], false)),
            province: None,
            city: None,
            score: 0.0,
        };
        let score = calc_score(&res, 12, "", false);
        assert!((score - 3.0 * 1.5).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn token_coverage_multiplies_across_roles() {
        let fr = raw(1, "France", "PCLI", "FR", "00");
        let paris = raw(2, "Paris", "PPLC", "FR", "11");
        let res = ParseResult {
            country: Some(parsed(&fr, &["France"], true)),
            province: None,
            city: Some(parsed(&paris, &["Paris"], true)),
            score: 0.0,
        };
        // "Paris France" is 12 code points: 6/12 * 5/12.
        let expected = 6.0 * (1.0 + (6.0 / 12.0) * (5.0 / 12.0));
        let score = calc_score(&res, 12, "", false);
        assert!((score - expected).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn default_country_bonus_applies_once() {
        let fr = raw(1, "France", "PCLI", "FR", "00");
        let paris = raw(2, "Paris", "PPLC", "FR", "11");
        let res = ParseResult {
            country: Some(parsed(&fr, &["France"], true)),
            province: None,
            city: Some(parsed(&paris, &["Paris"], true)),
            score: 0.0,
        };
        let plain = calc_score(&res, 12, "", false);
        let biased = calc_score(&res, 12, "FR", false);
        let token_score = 1.0 + (6.0 / 12.0) * (5.0 / 12.0);
        assert!((biased - plain - 3.0 * token_score).abs() < 1e-9);
    }

    #[test]
    fn area_bonus_requires_a_us_state_level_place() {
        let sf = raw(1, "San Francisco", "PPLA", "US", "CA");
        let sj = raw(2, "San Jose", "PPLA2", "US", "CA");

        let res_sf = ParseResult {
            country: None,
            province: None,
            city: Some(parsed(&sf, &["San Francisco"], true)),
            score: 0.0,
        };
        let res_sj = ParseResult {
            country: None,
            province: None,
            city: Some(parsed(&sj, &["San Jose"], true)),
            score: 0.0,
        };
        assert!(calc_score(&res_sf, 22, "", true) > calc_score(&res_sf, 22, "", false));
        assert_eq!(calc_score(&res_sj, 22, "", true), calc_score(&res_sj, 22, "", false));
    }
}
