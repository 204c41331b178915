//! Keyword matching against rule tables.
//!
//! Two rules apply to every lookup:
//!
//! - keywords made only of ASCII letters and digits match on token
//!   boundaries (`CS` does not match inside `CSV`); all other keywords match
//!   as plain substrings, which is what Korean compounds need;
//! - an occurrence lying inside an occurrence of an allow-listed compound
//!   word is not a match (`불량` inside `접촉불량`).

use std::ops::Range;

/// Byte ranges of every occurrence of `keyword` in `text`.
pub fn occurrences(text: &str, keyword: &str) -> Vec<Range<usize>> {
    if keyword.is_empty() {
        return Vec::new();
    }
    let bounded = keyword.chars().all(|c| c.is_ascii_alphanumeric());
    text.match_indices(keyword)
        .map(|(start, found)| start..start + found.len())
        .filter(|range| !bounded || on_token_boundary(text, range))
        .collect()
}

fn on_token_boundary(text: &str, range: &Range<usize>) -> bool {
    let before = text[..range.start].chars().next_back();
    let after = text[range.end..].chars().next();
    !before.is_some_and(|c| c.is_ascii_alphanumeric())
        && !after.is_some_and(|c| c.is_ascii_alphanumeric())
}

pub fn contains_keyword(text: &str, keyword: &str) -> bool {
    !occurrences(text, keyword).is_empty()
}

/// Keywords from `keywords` present in `text`, in table order.
pub fn find_keywords<'k>(text: &str, keywords: &'k [String]) -> Vec<&'k str> {
    keywords
        .iter()
        .filter(|keyword| contains_keyword(text, keyword))
        .map(String::as_str)
        .collect()
}

/// Precomputed allow-listed spans of one text.
#[derive(Debug, Clone, Default)]
pub struct Exemptions {
    spans: Vec<Range<usize>>,
}

impl Exemptions {
    pub fn scan(text: &str, allowlist: &[String]) -> Self {
        let spans = allowlist
            .iter()
            .flat_map(|term| occurrences(text, term))
            .collect();
        Self { spans }
    }

    fn covers(&self, range: &Range<usize>) -> bool {
        self.spans
            .iter()
            .any(|span| span.start <= range.start && range.end <= span.end)
    }

    /// Keywords with at least one occurrence outside every exempt span.
    pub fn find_unexempted<'k>(&self, text: &str, keywords: &'k [String]) -> Vec<&'k str> {
        keywords
            .iter()
            .filter(|keyword| {
                occurrences(text, keyword)
                    .iter()
                    .any(|range| !self.covers(range))
            })
            .map(String::as_str)
            .collect()
    }
}
