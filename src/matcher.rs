use crate::term::Term;

/// Punctuation accepted on either side of a match, in addition to whitespace
/// and the text edges.
const BOUNDARY_PUNCT: &[char] = &[
    ',', '.', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '"', '\'', '-', '/',
];

/// A located, boundary-validated occurrence of a term's source phrase.
///
/// `start`/`end` are half-open byte offsets into the source text; both always
/// fall on char boundaries, so `&text[start..end]` is valid. `original` is
/// the as-typed casing captured from the source for faithful display.
#[derive(Debug, Clone, PartialEq)]
pub struct TermMatch<'a> {
    pub start: usize,
    pub end: usize,
    pub term: &'a Term,
    pub original: &'a str,
}

/// Finds all non-overlapping, boundary-respecting occurrences of dictionary
/// terms in `text`, longest term first, sorted by start offset.
///
/// Terms are ranked by `en` length descending (ties broken lexicographically
/// on the lowercased phrase, so equal-length terms resolve deterministically)
/// and each is scanned case-insensitively left to right. The scan advances a
/// single character past each found index rather than the full match length,
/// so overlapping literal repeats of the same term are all considered before
/// boundary filtering. A candidate is dropped when its span overlaps any
/// previously accepted match; since longer terms claim spans first, this
/// realizes longest-match-wins as a global greedy policy.
///
/// Empty text or an empty dictionary yields an empty result; the matcher
/// never fails.
pub fn match_terms<'a>(text: &'a str, dictionary: &'a [Term]) -> Vec<TermMatch<'a>> {
    if text.is_empty() || dictionary.is_empty() {
        return Vec::new();
    }
    // ASCII folding keeps byte offsets identical between the folded and
    // original text, which the span math below relies on.
    let lower = text.to_ascii_lowercase();

    let mut ranked: Vec<&Term> = dictionary.iter().filter(|t| !t.en.is_empty()).collect();
    ranked.sort_by(|a, b| {
        b.en.len()
            .cmp(&a.en.len())
            .then_with(|| a.en.to_ascii_lowercase().cmp(&b.en.to_ascii_lowercase()))
    });

    let mut matches: Vec<TermMatch<'a>> = Vec::new();
    for term in ranked {
        let needle = term.en.to_ascii_lowercase();
        let mut from = 0;
        while from < lower.len() {
            let Some(found) = lower[from..].find(&needle) else {
                break;
            };
            let start = from + found;
            let end = start + needle.len();
            let accepted = boundary_before(text, start)
                && boundary_after(text, end)
                && !matches.iter().any(|m| start < m.end && m.start < end);
            if accepted {
                matches.push(TermMatch {
                    start,
                    end,
                    term,
                    original: &text[start..end],
                });
            }
            // One character forward, not the match length, so a repeat
            // starting inside this occurrence is still found.
            from = start + char_width(&lower, start);
        }
    }
    matches.sort_by_key(|m| m.start);
    matches
}

/// Deduplicates matched terms by lowercased `en`, preserving first-occurrence
/// order. Drives the detected-count display and the compact summary list.
pub fn summarize<'a>(matches: &[TermMatch<'a>]) -> Vec<&'a Term> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();
    for m in matches {
        if seen.insert(m.term.en.to_ascii_lowercase()) {
            unique.push(m.term);
        }
    }
    unique
}

fn is_boundary_char(ch: char) -> bool {
    ch.is_whitespace() || BOUNDARY_PUNCT.contains(&ch)
}

fn boundary_before(text: &str, idx: usize) -> bool {
    match text[..idx].chars().next_back() {
        None => true,
        Some(ch) => is_boundary_char(ch),
    }
}

fn boundary_after(text: &str, idx: usize) -> bool {
    match text[idx..].chars().next() {
        None => true,
        Some(ch) => is_boundary_char(ch),
    }
}

fn char_width(text: &str, idx: usize) -> usize {
    text[idx..].chars().next().map_or(1, char::len_utf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(en: &str, ja: &str) -> Term {
        Term {
            id: None,
            en: en.to_string(),
            ja: ja.to_string(),
            category: "concept".to_string(),
            note: String::new(),
            reference: String::new(),
        }
    }

    fn spans(matches: &[TermMatch<'_>]) -> Vec<(usize, usize, String)> {
        matches
            .iter()
            .map(|m| (m.start, m.end, m.term.en.clone()))
            .collect()
    }

    #[test]
    fn empty_inputs_yield_empty_results() {
        let dict = vec![term("state", "国家")];
        assert!(match_terms("", &dict).is_empty());
        assert!(match_terms("The state acted.", &[]).is_empty());
    }

    #[test]
    fn longest_term_wins_over_its_sub_phrase() {
        let dict = vec![term("state", "国家"), term("nation state", "国民国家")];
        let matches = match_terms("The nation state is central.", &dict);
        assert_eq!(
            spans(&matches),
            vec![(4, 16, "nation state".to_string())]
        );
    }

    #[test]
    fn boundary_check_rejects_embedded_occurrences() {
        let dict = vec![term("state", "国家")];
        assert!(match_terms("statesman", &dict).is_empty());
        assert!(match_terms("the statesman spoke", &dict).is_empty());
        assert!(match_terms("understate", &dict).is_empty());
    }

    #[test]
    fn punctuation_and_edges_count_as_boundaries() {
        let dict = vec![term("power", "権力")];
        let matches = match_terms("balance of power, and power.", &dict);
        assert_eq!(
            spans(&matches),
            vec![
                (11, 16, "power".to_string()),
                (22, 27, "power".to_string())
            ]
        );
        // Hyphen and slash sit in the boundary set.
        assert_eq!(match_terms("soft-power/hard", &dict).len(), 1);
    }

    #[test]
    fn matching_is_case_insensitive_and_preserves_original_casing() {
        let dict = vec![term("security dilemma", "安全保障のジレンマ")];
        let matches = match_terms("The Security Dilemma persists.", &dict);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].original, "Security Dilemma");
    }

    #[test]
    fn results_are_sorted_and_pairwise_non_overlapping() {
        let dict = vec![
            term("balance of power", "勢力均衡"),
            term("power", "権力"),
            term("balance", "均衡"),
            term("state", "国家"),
        ];
        let text = "A balance of power between state and state; the balance held, power shifted.";
        let matches = match_terms(text, &dict);
        for pair in matches.windows(2) {
            assert!(pair[0].start < pair[1].start, "unsorted output");
            assert!(pair[0].end <= pair[1].start, "overlapping spans");
        }
        // The long phrase claimed its span; bare "power"/"balance" inside it
        // were suppressed, the free-standing ones were not.
        assert_eq!(
            matches
                .iter()
                .map(|m| m.term.en.as_str())
                .collect::<Vec<_>>(),
            vec!["balance of power", "state", "state", "balance", "power"]
        );
    }

    #[test]
    fn surrounding_characters_are_boundaries_for_every_match() {
        let dict = vec![term("norm", "規範"), term("regime", "レジーム")];
        let text = "Norms? No: a norm, a regime (and \"norm\").";
        for m in match_terms(text, &dict) {
            assert!(boundary_before(text, m.start));
            assert!(boundary_after(text, m.end));
        }
    }

    #[test]
    fn overlapping_repeats_of_the_same_term_are_considered() {
        // "power power power" has occurrences at 0, 6, 12; each is found
        // because the scan steps one character, not one match length.
        let dict = vec![term("power", "権力")];
        let matches = match_terms("power power power", &dict);
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn equal_length_terms_resolve_lexicographically() {
        let dict = vec![term("zzzzz", "あ"), term("aaaaa", "い")];
        // Both could never overlap in this text; the tie-break only fixes the
        // acceptance order, which shows when they compete for one span.
        let matches = match_terms("aaaaa zzzzz", &dict);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].term.en, "aaaaa");
    }

    #[test]
    fn summary_is_unique_by_lowercased_en_in_first_seen_order() {
        let dict = vec![term("power", "権力"), term("state", "国家")];
        let matches = match_terms("Power, state, POWER, state.", &dict);
        let unique = summarize(&matches);
        assert_eq!(
            unique.iter().map(|t| t.en.as_str()).collect::<Vec<_>>(),
            vec!["power", "state"]
        );
    }

    #[test]
    fn multibyte_text_around_matches_is_handled() {
        let dict = vec![term("sovereignty", "主権")];
        let text = "主権とは sovereignty のことです。";
        let matches = match_terms(text, &dict);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].original, "sovereignty");
        assert_eq!(&text[matches[0].start..matches[0].end], "sovereignty");
    }
}
