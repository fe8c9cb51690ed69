//! Best-match selection
//!
//! Scores eligible candidates with the same trigram similarity used by the
//! catalog index and keeps the highest. Equal scores go to the lowest segment
//! id, so the outcome never depends on candidate order.

use crate::query::{Candidate, Resolution};
use crate::trigram::{set_similarity, trigrams};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;

/// Pick the best candidate for `query_street` (already normalized).
/// Returns `None` when `eligible` is empty.
pub fn select_best<I>(eligible: I, query_street: &str) -> Option<Resolution>
where
    I: IntoIterator<Item = Candidate>,
{
    let query_grams = trigrams(query_street);

    eligible
        .into_iter()
        .map(|candidate| {
            let score = set_similarity(&query_grams, &trigrams(&candidate.segment.street_name));
            (candidate, score)
        })
        .max_by_key(|(candidate, score)| (OrderedFloat(*score), Reverse(candidate.segment.id)))
        .map(|(candidate, score)| Resolution::from_candidate(candidate, score))
}
