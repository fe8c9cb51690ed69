// Trigram similarity and inverted trigram index for street names
//
// Trigrams are extracted the way PostgreSQL's pg_trgm does it: lowercase,
// split into alphanumeric words, pad each word with two leading spaces and
// one trailing space, keep the distinct 3-character windows.
use ahash::{AHashMap, AHashSet};
use std::collections::BTreeSet;

pub type Trigram = [char; 3];

/// Extract the set of distinct trigrams of a string
pub fn trigrams(text: &str) -> AHashSet<Trigram> {
    let mut set = AHashSet::new();
    let mut padded: Vec<char> = Vec::new();

    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        padded.clear();
        padded.push(' ');
        padded.push(' ');
        padded.extend(word.chars().flat_map(char::to_lowercase));
        padded.push(' ');

        for w in padded.windows(3) {
            set.insert([w[0], w[1], w[2]]);
        }
    }

    set
}

/// Similarity from a shared-trigram count and the two set sizes.
///
/// `shared / (a + b - shared)`; zero when either side has no trigrams.
#[inline]
pub fn similarity_from_counts(shared: usize, a_len: usize, b_len: usize) -> f32 {
    if a_len == 0 || b_len == 0 {
        return 0.0;
    }
    let union = a_len + b_len - shared;
    shared as f32 / union as f32
}

#[inline]
pub fn set_similarity(a: &AHashSet<Trigram>, b: &AHashSet<Trigram>) -> f32 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let shared = small.iter().filter(|t| large.contains(*t)).count();
    similarity_from_counts(shared, a.len(), b.len())
}

/// Trigram similarity of two strings, in [0.0, 1.0]
pub fn similarity(a: &str, b: &str) -> f32 {
    set_similarity(&trigrams(a), &trigrams(b))
}

/// Inverted index from trigram to the ids of the documents containing it.
#[derive(Debug, Clone, Default)]
pub struct TrigramIndex {
    postings: AHashMap<Trigram, AHashSet<u64>>,
    docs: AHashMap<u64, AHashSet<Trigram>>,
}

impl TrigramIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `text` under `id`, replacing any previous text for that id
    pub fn insert(&mut self, id: u64, text: &str) {
        self.remove(id);

        let grams = trigrams(text);
        for gram in &grams {
            self.postings.entry(*gram).or_default().insert(id);
        }
        self.docs.insert(id, grams);
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let Some(grams) = self.docs.remove(&id) else {
            return false;
        };

        for gram in grams {
            if let Some(ids) = self.postings.get_mut(&gram) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.postings.remove(&gram);
                }
            }
        }
        true
    }

    /// Documents whose similarity to `query` is strictly above `threshold`.
    ///
    /// Shared-trigram counts are accumulated from the posting lists, so
    /// documents without a single trigram in common with the query are never
    /// visited. Results are in ascending id order.
    pub fn search(&self, query: &str, threshold: f32) -> Vec<(u64, f32)> {
        let query_grams = trigrams(query);
        if query_grams.is_empty() {
            return Vec::new();
        }

        let mut shared: AHashMap<u64, usize> = AHashMap::new();
        for gram in &query_grams {
            if let Some(ids) = self.postings.get(gram) {
                for &id in ids {
                    *shared.entry(id).or_insert(0) += 1;
                }
            }
        }

        let hits: BTreeSet<(u64, usize)> = shared.into_iter().collect();
        hits.into_iter()
            .filter_map(|(id, count)| {
                let doc_len = self.docs.get(&id).map(|g| g.len()).unwrap_or(0);
                let score = similarity_from_counts(count, query_grams.len(), doc_len);
                (score > threshold).then_some((id, score))
            })
            .collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
