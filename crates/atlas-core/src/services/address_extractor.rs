//! Three-word address extraction from recognized text
//!
//! Several loose patterns run over the OCR output, each tolerant of a
//! different kind of damage. Their matches are normalized, merged and then
//! validated once by `CandidateAddress::parse`.

use atlas_types::{CandidateAddress, ADDRESS_PREFIX};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Characters OCR commonly produces in place of the dot separator
const SEPARATOR_LOOKALIKES: [char; 4] = ['·', '•', '∙', '‧'];

/// One to three slashes in front of a dot-joined run of words
static PREFIXED_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/{1,3}\s?\p{Alphabetic}+(?:\.\p{Alphabetic}+)+")
        .expect("Failed to compile prefixed address regex")
});

/// Dot-joined run of words without any prefix
static BARE_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\p{Alphabetic}+(?:\.\p{Alphabetic}+)+")
        .expect("Failed to compile bare address regex")
});

/// Words joined by any of the separator look-alikes
static INTERPUNCT_RUN: Lazy<Regex> = Lazy::new(|| {
    let separators: String = SEPARATOR_LOOKALIKES.iter().collect();
    Regex::new(&format!(
        r"\p{{Alphabetic}}+(?:[ ]?[{}][ ]?\p{{Alphabetic}}+)+",
        separators
    ))
    .expect("Failed to compile interpunct address regex")
});

/// A raw substring found by one of the matchers
#[derive(Debug, Clone, PartialEq)]
pub struct RawMatch<'a> {
    pub matcher: &'static str,
    pub start: usize,
    pub text: &'a str,
}

pub struct AddressExtractor {
    matchers: Vec<(&'static str, &'static Regex)>,
}

impl AddressExtractor {
    pub fn new() -> Self {
        Self {
            matchers: vec![
                ("prefixed", Lazy::force(&PREFIXED_RUN)),
                ("bare", Lazy::force(&BARE_RUN)),
                ("interpunct", Lazy::force(&INTERPUNCT_RUN)),
            ],
        }
    }

    /// Run every matcher over the text, in matcher order
    pub fn raw_matches<'a>(&self, text: &'a str) -> Vec<RawMatch<'a>> {
        let mut matches = Vec::new();

        for &(name, regex) in &self.matchers {
            let before = matches.len();
            matches.extend(regex.find_iter(text).map(|m| RawMatch {
                matcher: name,
                start: m.start(),
                text: m.as_str(),
            }));
            log::debug!("Matcher '{}' produced {} raw matches", name, matches.len() - before);
        }

        matches
    }

    /// Extract all distinct valid addresses, ordered by where they first
    /// appear in the text (leftmost first)
    pub fn extract(&self, text: &str) -> Vec<CandidateAddress> {
        let mut first_seen: HashMap<String, usize> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for raw in self.raw_matches(text) {
            let normalized = normalize(raw.text);
            match first_seen.get_mut(&normalized) {
                Some(start) => *start = (*start).min(raw.start),
                None => {
                    first_seen.insert(normalized.clone(), raw.start);
                    order.push(normalized);
                }
            }
        }

        let mut candidates: Vec<(usize, CandidateAddress)> = order
            .into_iter()
            .filter_map(|normalized| {
                let start = first_seen[&normalized];
                match CandidateAddress::parse(&normalized) {
                    Ok(address) => Some((start, address)),
                    Err(e) => {
                        log::debug!("Dropping candidate: {}", e);
                        None
                    }
                }
            })
            .collect();

        // Stable: equal offsets keep matcher order
        candidates.sort_by_key(|(start, _)| *start);

        candidates.into_iter().map(|(_, address)| address).collect()
    }

    /// The deterministic pick among the extracted addresses
    pub fn first_candidate(&self, text: &str) -> Option<CandidateAddress> {
        self.extract(text).into_iter().next()
    }
}

impl Default for AddressExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip any prefix, unify separators, lower-case and prepend `///`
fn normalize(raw: &str) -> String {
    let body: String = raw
        .trim_start_matches(|c: char| c == '/' || c.is_whitespace())
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if SEPARATOR_LOOKALIKES.contains(&c) { '.' } else { c })
        .collect();

    format!("{}{}", ADDRESS_PREFIX, body.to_lowercase())
}

/// Truncated raw text for the operator to correct by hand
pub fn preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }

    let truncated: String = collapsed.chars().take(max_chars).collect();
    format!("{}...", truncated)
}
