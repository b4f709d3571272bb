//! Identity resolution: reconcile a free-text assignee hint with the roster.
//!
//! Each identity contributes up to three matchable names (display name,
//! login, e-mail local part). Exact matches win outright; otherwise the best
//! fuzzy match at or above [`FUZZY_MATCH_THRESHOLD`] is taken. Ties between
//! distinct identities are reported as ambiguous, never guessed.

use std::collections::BTreeMap;

use triage_state::Identity;

use crate::domain::MatchResult;

/// Minimum similarity for a fuzzy match.
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.85;

/// Hints that explicitly mean "nobody".
const SENTINELS: &[&str] = &["unassigned", "none", "null", "no_assignee_found"];

/// True for empty hints and the "nobody" sentinels.
pub fn is_sentinel(hint: &str) -> bool {
    let hint = hint.trim();
    hint.is_empty() || SENTINELS.iter().any(|s| s.eq_ignore_ascii_case(hint))
}

/// Canonical form for name comparison.
///
/// Lower-case, `-`/`_` become spaces, anything else that is not an ASCII
/// letter, digit or space is removed, whitespace is collapsed.
pub fn normalize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Similarity ratio in `[0, 1]`; 1.0 only for identical strings.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Best match found for one identity.
#[derive(Debug)]
struct Candidate<'a> {
    display_name: &'a str,
    score: f64,
    exact: bool,
}

/// Resolve `hint` against `roster`.
pub fn resolve(hint: &str, roster: &[Identity]) -> MatchResult {
    if is_sentinel(hint) {
        return MatchResult::no_assignee();
    }
    let wanted = normalize_name(hint);
    if wanted.is_empty() {
        return MatchResult::no_assignee();
    }

    // Keyed by identity id so two names of one identity never look ambiguous.
    let mut best: BTreeMap<&str, Candidate<'_>> = BTreeMap::new();

    for identity in roster {
        let names = [
            Some(identity.display_name.as_str()),
            Some(identity.login.as_str()),
            identity.email_local_part(),
        ];

        for name in names.into_iter().flatten() {
            let candidate = normalize_name(name);
            if candidate.is_empty() {
                continue;
            }

            let found = if candidate == wanted {
                Some(Candidate {
                    display_name: &identity.display_name,
                    score: 1.0,
                    exact: true,
                })
            } else {
                let score = similarity(&wanted, &candidate);
                (score >= FUZZY_MATCH_THRESHOLD).then_some(Candidate {
                    display_name: &identity.display_name,
                    score,
                    exact: false,
                })
            };

            if let Some(found) = found {
                let exact = found.exact;
                let improves = best
                    .get(identity.id.as_str())
                    .map_or(true, |cur| found.score > cur.score);
                if improves {
                    best.insert(identity.id.as_str(), found);
                }
                if exact {
                    break;
                }
            }
        }
    }

    pick(best.into_values().collect())
}

fn pick(matches: Vec<Candidate<'_>>) -> MatchResult {
    let exact: Vec<&Candidate<'_>> = matches.iter().filter(|m| m.exact).collect();
    match exact.as_slice() {
        [only] => return MatchResult::exact(only.display_name),
        [_, _, ..] => return MatchResult::ambiguous(1.0),
        [] => {}
    }

    let Some(top) = matches.iter().map(|m| m.score).reduce(f64::max) else {
        return MatchResult::no_assignee();
    };
    let leaders: Vec<&Candidate<'_>> = matches.iter().filter(|m| m.score == top).collect();
    match leaders.as_slice() {
        [only] => MatchResult::fuzzy(only.display_name, top),
        _ => MatchResult::ambiguous(top),
    }
}
