//! TF-IDF vectors and cosine ranking for description search.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"));

/// Sparse vector as `(term index, weight)` pairs sorted by index.
pub type SparseVector = Vec<(usize, f64)>;

/// Lowercased word tokens of at least two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

/// Lowercase and drop ASCII punctuation and digits.
pub fn clean_query_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation() && !c.is_ascii_digit())
        .collect::<String>()
        .trim()
        .to_string()
}

#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn the vocabulary and smoothed inverse document frequencies.
    pub fn fit<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tokenized: Vec<BTreeSet<String>> = documents
            .into_iter()
            .map(|d| tokenize(d).into_iter().collect())
            .collect();
        let n_docs = tokenized.len() as f64;

        let terms: BTreeSet<&String> = tokenized.iter().flatten().collect();
        let vocabulary: HashMap<String, usize> = terms
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();

        let mut document_frequency = vec![0usize; vocabulary.len()];
        for doc in &tokenized {
            for term in doc {
                if let Some(&idx) = vocabulary.get(term) {
                    document_frequency[idx] += 1;
                }
            }
        }

        let idf = document_frequency
            .into_iter()
            .map(|df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        Self { vocabulary, idf }
    }

    pub fn fit_transform<'a, I>(documents: I) -> (Self, Vec<SparseVector>)
    where
        I: IntoIterator<Item = &'a str> + Clone,
    {
        let vectorizer = Self::fit(documents.clone());
        let vectors = documents.into_iter().map(|d| vectorizer.transform(d)).collect();
        (vectorizer, vectors)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// L2-normalised TF-IDF vector; unknown terms are ignored.
    pub fn transform(&self, document: &str) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokenize(document) {
            if let Some(&idx) = self.vocabulary.get(&token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();
        vector.sort_by_key(|(idx, _)| *idx);

        let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in vector.iter_mut() {
                *w /= norm;
            }
        }
        vector
    }
}

/// Dot product of two index-sorted sparse vectors; the cosine similarity
/// when both are normalised.
pub fn cosine(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

/// Indices of the `k` highest scores, best first. Ties keep index order.
pub fn top_k(scores: &[f64], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then_with(|| a.cmp(&b)));
    indices.truncate(k);
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_single_characters() {
        assert_eq!(tokenize("A Rogue-like, 2D game!"), vec!["rogue", "like", "2d", "game"]);
    }

    #[test]
    fn test_clean_query_text() {
        assert_eq!(clean_query_text("  A 2D Rogue-like, with 100% cats! "), "a d roguelike with  cats");
    }

    #[test]
    fn test_vectors_are_normalised() {
        let docs = vec!["space shooter with lasers", "farming life sim", "space farming"];
        let (_, vectors) = TfidfVectorizer::fit_transform(docs.iter().copied());
        for v in &vectors {
            let norm: f64 = v.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
        assert!((cosine(&vectors[0], &vectors[0]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_smooth_idf_weights_rare_terms_higher() {
        let docs = ["cats dogs", "cats birds", "cats"];
        let vectorizer = TfidfVectorizer::fit(docs.iter().copied());
        assert_eq!(vectorizer.vocabulary_len(), 3);

        let v = vectorizer.transform("cats dogs");
        let cats = v.iter().find(|(i, _)| *i == vectorizer.vocabulary["cats"]).unwrap().1;
        let dogs = v.iter().find(|(i, _)| *i == vectorizer.vocabulary["dogs"]).unwrap().1;
        assert!(dogs > cats);

        // idf(cats) = ln(4/4) + 1 = 1, idf(dogs) = ln(4/2) + 1
        let expected_ratio = (2.0f64).ln() + 1.0;
        assert!((dogs / cats - expected_ratio).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_terms_give_zero_vector() {
        let vectorizer = TfidfVectorizer::fit(["alpha beta"].iter().copied());
        let v = vectorizer.transform("gamma delta");
        assert!(v.is_empty());
        assert_eq!(cosine(&v, &vectorizer.transform("alpha")), 0.0);
    }

    #[test]
    fn test_ranking_prefers_overlap() {
        let docs = ["space shooter lasers", "farming sim cows", "space farming sim"];
        let (vectorizer, vectors) = TfidfVectorizer::fit_transform(docs.iter().copied());
        let query = vectorizer.transform("lasers in space");
        let scores: Vec<f64> = vectors.iter().map(|v| cosine(&query, v)).collect();
        assert_eq!(top_k(&scores, 2), vec![0, 2]);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn test_top_k_ties_and_short_input() {
        assert_eq!(top_k(&[0.5, 0.9, 0.5], 5), vec![1, 0, 2]);
        assert!(top_k(&[], 3).is_empty());
    }
}
