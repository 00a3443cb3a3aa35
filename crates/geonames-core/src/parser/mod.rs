//! Free-text query parsing.
//!
//! A parse runs in four stages: tokenize the query and generate candidate
//! name hypotheses, probe the store's indices and collect matches into
//! per-role buckets, assemble country/province/city triples, then score
//! and keep the best interpretations. Everything is read-only against the
//! store; all per-query state lives here.

mod matcher;
mod scoring;
mod tokenize;

use crate::model::Entity;
use crate::store::GeoStore;

/// Default token delimiters: whitespace, common punctuation and the
/// en-dash seen in scraped location strings.
pub const DEFAULT_DELIMITERS: &str = "\t .;,/&()–";

/// Per-parse configuration.
#[derive(Debug, Clone)]
pub struct ParserSettings {
    /// Characters that split the query into tokens.
    pub delimiters: String,
    /// Free-text country preference; parsed on demand and worth a scoring
    /// bonus to results from the same country.
    pub default_country: String,
    /// Reject the parse entirely when more than one result ties at the
    /// top score.
    pub unique_only: bool,
    /// Distance in kilometers under which same-named sibling cities
    /// collapse into one result; 0 never merges.
    pub merge_near: f64,
}

impl Default for ParserSettings {
    fn default() -> ParserSettings {
        ParserSettings {
            delimiters: DEFAULT_DELIMITERS.to_string(),
            default_country: String::new(),
            unique_only: false,
            merge_near: 0.0,
        }
    }
}

/// One matched role of a result: the entity, the surface tokens that led
/// to it, and whether any of them matched the primary name (as opposed to
/// an alternate-name hash).
#[derive(Debug, Clone)]
pub struct ParsedObject<'s> {
    pub entity: Entity<'s>,
    pub tokens: Vec<String>,
    pub by_name: bool,
}

/// One interpretation of the query. At least one role is present.
#[derive(Debug, Clone)]
pub struct ParseResult<'s> {
    pub country: Option<ParsedObject<'s>>,
    pub province: Option<ParsedObject<'s>>,
    pub city: Option<ParsedObject<'s>>,
    pub score: f64,
}

/// Parses a query against a store.
///
/// Returns every interpretation tied at the top score, or an empty list
/// when nothing matched or a unique-only parse found the tie ambiguous.
/// Ill-formed input never fails: a query that hits nothing simply yields
/// no results.
pub fn parse<'s, S: GeoStore>(
    store: &'s S,
    query: &str,
    settings: &ParserSettings,
) -> Vec<ParseResult<'s>> {
    let query: Vec<char> = query.chars().collect();
    let tokenized = tokenize::tokenize(&query, &settings.delimiters);
    let hypotheses = tokenize::hypotheses(&query, &tokenized);

    let buckets = matcher::collect(store, &query, &hypotheses);
    let matched = matcher::assemble(&buckets);
    let results = scoring::select(store, matched, &query, settings, tokenized.area_token);

    if settings.unique_only && results.len() > 1 {
        return Vec::new();
    }
    results
}
