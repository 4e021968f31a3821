//! Name reconciliation for schedules imported from outside the system
//!
//! Imported rows only carry display names. This is the one place where names
//! are turned into ids; the rest of the engine works on ids only. A fuzzy
//! candidate must contain every word of the query as a word prefix.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::Serialize;

use crate::model::{Client, ClientId, Therapist, TherapistId};

/// Outcome of matching one imported name against the roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NameMatch<Id> {
    /// Same name once case, spacing and accents are ignored
    Exact(Id),
    /// Single best fuzzy hit
    Fuzzy { id: Id, score: i64 },
    /// Several candidates fit equally well
    Ambiguous(Vec<Id>),
    NoMatch,
}

impl<Id> NameMatch<Id> {
    /// The matched id when the match is unambiguous
    pub fn id(&self) -> Option<&Id> {
        match self {
            NameMatch::Exact(id) | NameMatch::Fuzzy { id, .. } => Some(id),
            NameMatch::Ambiguous(_) | NameMatch::NoMatch => None,
        }
    }
}

/// Lowercase, strip Spanish accents and collapse whitespace
pub fn normalize_name(name: &str) -> String {
    let folded: String = name
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Match `name` against `(id, display name)` candidates
pub fn reconcile_name<Id: Clone>(name: &str, candidates: &[(Id, &str)]) -> NameMatch<Id> {
    let wanted = normalize_name(name);
    if wanted.is_empty() {
        return NameMatch::NoMatch;
    }

    let normalized: Vec<(&Id, String)> = candidates.iter().map(|(id, n)| (id, normalize_name(n))).collect();

    let exact: Vec<Id> = normalized
        .iter()
        .filter(|(_, n)| *n == wanted)
        .map(|(id, _)| (*id).clone())
        .collect();
    match exact.len() {
        0 => {}
        1 => return NameMatch::Exact(exact[0].clone()),
        _ => return NameMatch::Ambiguous(exact),
    }

    let matcher = SkimMatcherV2::default();
    let scored: Vec<(Id, i64)> = normalized
        .iter()
        .filter(|(_, n)| covers_words(n, &wanted))
        .filter_map(|(id, n)| matcher.fuzzy_match(n, &wanted).map(|score| ((*id).clone(), score)))
        .collect();

    best_fuzzy(scored)
}

/// Every word of `wanted` starts some word of `candidate` (both normalized)
///
/// Keeps a subsequence hit such as "mario" in "maria lopez" from counting.
fn covers_words(candidate: &str, wanted: &str) -> bool {
    wanted
        .split(' ')
        .all(|word| candidate.split(' ').any(|c| c.starts_with(word)))
}

/// Pick the single highest score; ties are ambiguous
fn best_fuzzy<Id>(scored: Vec<(Id, i64)>) -> NameMatch<Id> {
    let Some(top) = scored.iter().map(|(_, s)| *s).max() else {
        return NameMatch::NoMatch;
    };

    let mut best: Vec<Id> = scored.into_iter().filter(|(_, s)| *s == top).map(|(id, _)| id).collect();
    if best.len() == 1 {
        let id = best.remove(0);
        NameMatch::Fuzzy { id, score: top }
    } else {
        NameMatch::Ambiguous(best)
    }
}

/// Match a client name against the roster
pub fn match_client(name: &str, clients: &[Client]) -> NameMatch<ClientId> {
    let candidates: Vec<(ClientId, &str)> = clients.iter().map(|c| (c.id.clone(), c.name.as_str())).collect();
    reconcile_name(name, &candidates)
}

/// Match a therapist name against the roster
pub fn match_therapist(name: &str, therapists: &[Therapist]) -> NameMatch<TherapistId> {
    let candidates: Vec<(TherapistId, &str)> = therapists.iter().map(|t| (t.id.clone(), t.name.as_str())).collect();
    reconcile_name(name, &candidates)
}
