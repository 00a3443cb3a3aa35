//! Query tokenization and hypothesis generation.
//!
//! Queries are noisy: `"San Jose, CA"`, `"Paris/France"`, `"Foster City –
//! CA"`. The tokenizer splits on a configurable delimiter set while
//! remembering the delimiter run between every pair of tokens, and the
//! hypothesis generator then proposes candidate names: the whole query,
//! then windows of up to three consecutive tokens joined as typed, joined
//! with single spaces when the original delimiters were unusual, and
//! glued without separator when the pair was only space-separated.

/// Token/delimiter split of a query.
///
/// `delims` is parallel to `tokens`: `delims[i]` is the delimiter run
/// between token `i` and `i + 1`, and the final entry is whatever trailed
/// the last token (possibly empty). Leading delimiters are dropped.
pub(crate) struct Tokenized {
    pub(crate) tokens: Vec<Vec<char>>,
    pub(crate) delims: Vec<Vec<char>>,
    /// Set when some token is the literal word `area`, consumed by
    /// scoring.
    pub(crate) area_token: bool,
}

pub(crate) fn tokenize(query: &[char], delimiters: &str) -> Tokenized {
    let delim_set: Vec<char> = delimiters.chars().collect();
    let is_delim = |c: char| delim_set.contains(&c);

    let mut tokens: Vec<Vec<char>> = Vec::new();
    let mut delims: Vec<Vec<char>> = Vec::new();
    let mut delim: Vec<char> = Vec::new();
    let mut area_token = false;

    let mut pos = 0;
    while pos < query.len() {
        while pos < query.len() && is_delim(query[pos]) {
            delim.push(query[pos]);
            pos += 1;
        }
        if pos == query.len() {
            break;
        }
        if tokens.is_empty() {
            delim.clear();
        } else {
            delims.push(std::mem::take(&mut delim));
        }

        let start = pos;
        while pos < query.len() && !is_delim(query[pos]) {
            pos += 1;
        }
        let token = query[start..pos].to_vec();
        if token.iter().map(|c| c.to_ascii_lowercase()).eq("area".chars()) {
            area_token = true;
        }
        tokens.push(token);
    }
    if !tokens.is_empty() {
        delims.push(delim);
    }

    Tokenized { tokens, delims, area_token }
}

/// Candidate names derived from one token window, probed in order.
pub(crate) struct Hypothesis {
    pub(crate) names: Vec<Vec<char>>,
}

/// Builds the hypothesis list: the full query first, then one hypothesis
/// per starting token.
pub(crate) fn hypotheses(query: &[char], t: &Tokenized) -> Vec<Hypothesis> {
    let mut out = vec![Hypothesis { names: vec![query.to_vec()] }];

    for idx in 0..t.tokens.len() {
        let end = (idx + 3).min(t.tokens.len());
        let mut names: Vec<Vec<char>> = Vec::new();

        let mut combined: Vec<char> = Vec::new();
        let mut unusual_delim = false;
        for extra in idx..end {
            combined.extend(&t.tokens[extra]);
            names.push(combined.clone());
            combined.extend(&t.delims[extra]);
            if t.delims[extra].iter().any(|&c| c != ' ') {
                unusual_delim = true;
            }
        }

        if unusual_delim {
            let mut combined: Vec<char> = Vec::new();
            for extra in idx..end {
                combined.extend(&t.tokens[extra]);
                names.push(combined.clone());
                combined.push(' ');
            }
        }

        if idx + 1 < t.tokens.len() && t.delims[idx].iter().all(|&c| c == '\t' || c == ' ') {
            let mut glued = t.tokens[idx].clone();
            glued.extend(&t.tokens[idx + 1]);
            names.push(glued);
        }

        out.push(Hypothesis { names });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DEFAULT_DELIMITERS;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn split(query: &str) -> Tokenized {
        tokenize(&chars(query), DEFAULT_DELIMITERS)
    }

    fn strings(names: &[Vec<char>]) -> Vec<String> {
        names.iter().map(|n| n.iter().collect()).collect()
    }

    #[test]
    fn splits_tokens_and_keeps_delimiter_runs() {
        let t = split("San Jose, CA");
        assert_eq!(strings(&t.tokens), ["San", "Jose", "CA"]);
        assert_eq!(strings(&t.delims), [" ", ", ", ""]);
        assert!(!t.area_token);
    }

    #[test]
    fn drops_leading_delimiters_and_keeps_trailing() {
        let t = split("  Paris; ");
        assert_eq!(strings(&t.tokens), ["Paris"]);
        assert_eq!(strings(&t.delims), ["; "]);
    }

    #[test]
    fn empty_and_delimiter_only_queries_yield_nothing() {
        assert!(split("").tokens.is_empty());
        let t = split(" ,.; ");
        assert!(t.tokens.is_empty());
        assert!(t.delims.is_empty());
    }

    #[test]
    fn detects_the_area_token() {
        assert!(split("SF Bay Area").area_token);
        assert!(split("bay AREA").area_token);
        assert!(!split("Area51").area_token);
    }

    #[test]
    fn extra_delimiters_extend_the_set() {
        let t = tokenize(&chars("a|b"), &format!("{DEFAULT_DELIMITERS}|"));
        assert_eq!(strings(&t.tokens), ["a", "b"]);
    }

    #[test]
    fn full_query_is_the_first_hypothesis() {
        let query = chars("San Jose, CA");
        let t = split("San Jose, CA");
        let hypos = hypotheses(&query, &t);
        assert_eq!(hypos.len(), 1 + t.tokens.len());
        assert_eq!(strings(&hypos[0].names), ["San Jose, CA"]);
    }

    #[test]
    fn windows_grow_as_typed_and_space_normalized() {
        let query = chars("San Jose, CA");
        let hypos = hypotheses(&query, &split("San Jose, CA"));
        // Window starting at "San": as-typed prefixes, then the
        // space-normalized variants (the window crosses ", "), then the
        // glued pair ("San" and "Jose" are space-separated).
        assert_eq!(
            strings(&hypos[1].names),
            [
                "San",
                "San Jose",
                "San Jose, CA",
                "San",
                "San Jose",
                "San Jose CA",
                "SanJose",
            ]
        );
    }

    #[test]
    fn normalization_only_when_a_delimiter_is_not_a_space() {
        let query = chars("New York City");
        let hypos = hypotheses(&query, &split("New York City"));
        assert_eq!(
            strings(&hypos[1].names),
            ["New", "New York", "New York City", "NewYork"]
        );
    }

    #[test]
    fn no_glued_pair_across_punctuation() {
        let query = chars("Paris/France");
        let hypos = hypotheses(&query, &split("Paris/France"));
        let names = strings(&hypos[1].names);
        assert!(names.contains(&"Paris France".to_string()));
        assert!(!names.contains(&"ParisFrance".to_string()));
    }

    #[test]
    fn window_is_capped_at_three_tokens() {
        let query = chars("a b c d");
        let hypos = hypotheses(&query, &split("a b c d"));
        let names = strings(&hypos[1].names);
        assert!(names.contains(&"a b c".to_string()));
        assert!(!names.iter().any(|n| n.contains('d')));
    }
}
