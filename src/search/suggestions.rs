//! Autocomplete suggestion ranking

use std::collections::HashSet;

use crate::domain::search::{Suggestion, SuggestionKind};

/// Queries shorter than this (after trimming) get no suggestions
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchRank {
    Exact,
    Prefix,
    Substring,
}

fn rank(text_lower: &str, query_lower: &str) -> Option<MatchRank> {
    if text_lower == query_lower {
        Some(MatchRank::Exact)
    } else if text_lower.starts_with(query_lower) {
        Some(MatchRank::Prefix)
    } else if text_lower.contains(query_lower) {
        Some(MatchRank::Substring)
    } else {
        None
    }
}

/// Rank candidates against `query`: exact before prefix before substring,
/// ties alphabetical. Duplicates (same kind, same text ignoring case) are
/// collapsed and non-matching candidates dropped.
pub fn rank_suggestions<I>(
    query: &str,
    candidates: I,
    kind: Option<SuggestionKind>,
    limit: usize,
) -> Vec<Suggestion>
where
    I: IntoIterator<Item = Suggestion>,
{
    let query = query.trim().to_lowercase();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut ranked: Vec<(MatchRank, String, Suggestion)> = candidates
        .into_iter()
        .filter(|s| kind.map_or(true, |k| s.kind == k))
        .filter_map(|s| {
            let text = s.text.trim().to_string();
            let lower = text.to_lowercase();
            let r = rank(&lower, &query)?;
            if !seen.insert((s.kind, lower.clone())) {
                return None;
            }
            Some((r, lower, Suggestion { kind: s.kind, text }))
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.kind.cmp(&b.2.kind))
    });

    ranked.into_iter().take(limit).map(|(_, _, s)| s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(kind: SuggestionKind, text: &str) -> Suggestion {
        Suggestion { kind, text: text.to_string() }
    }

    fn texts(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn short_queries_return_nothing() {
        let candidates = vec![s(SuggestionKind::Location, "Madrid")];
        assert!(rank_suggestions("m", candidates.clone(), None, 10).is_empty());
        assert!(rank_suggestions(" m ", candidates, None, 10).is_empty());
    }

    #[test]
    fn exact_then_prefix_then_substring() {
        let candidates = vec![
            s(SuggestionKind::Specialty, "Fotografía de moda"),
            s(SuggestionKind::Specialty, "moda"),
            s(SuggestionKind::Specialty, "Moda urbana"),
            s(SuggestionKind::Specialty, "Alta moda"),
            s(SuggestionKind::Specialty, "bodas"),
        ];
        let result = rank_suggestions("Moda", candidates, None, 10);
        assert_eq!(
            texts(&result),
            vec!["moda", "Moda urbana", "Alta moda", "Fotografía de moda"]
        );
    }

    #[test]
    fn deduplicates_and_limits() {
        let candidates = vec![
            s(SuggestionKind::Location, "Madrid"),
            s(SuggestionKind::Location, "madrid"),
            s(SuggestionKind::Location, "Madrid Centro"),
            s(SuggestionKind::Profile, "Madrid Models"),
        ];
        let result = rank_suggestions("madrid", candidates.clone(), None, 10);
        assert_eq!(result.len(), 3);

        let limited = rank_suggestions("madrid", candidates.clone(), None, 1);
        assert_eq!(texts(&limited), vec!["Madrid"]);

        let only_profiles = rank_suggestions("madrid", candidates, Some(SuggestionKind::Profile), 10);
        assert_eq!(texts(&only_profiles), vec!["Madrid Models"]);
    }
}
