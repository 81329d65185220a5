use std::collections::HashMap;

use super::bag::LetterBag;
use super::probability::{rank_words, tie_group};
use super::util::alphagram;

/// Probability order of one word across the whole lexicon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbabilityRank {
    pub order: u32,
    /// First rank of the word's tie group
    pub min_order: u32,
    /// Last rank of the word's tie group
    pub max_order: u32,
}

/// Statistics derived from the lexicon at import time. Rebuilt as a whole
/// after every import and swapped in at once, never patched in place.
#[derive(Debug, Clone, Default)]
pub struct LexiconIndex {
    anagram_counts: HashMap<String, u32>,
    ranks: HashMap<String, ProbabilityRank>,
}

impl LexiconIndex {
    pub fn build(words: Vec<String>, bag: &LetterBag) -> Self {
        let mut anagram_counts = HashMap::new();
        for word in words.iter() {
            *anagram_counts.entry(alphagram(word)).or_insert(0) += 1;
        }

        let ranked = rank_words(words, bag, false);
        let mut ranks = HashMap::with_capacity(ranked.len());
        let mut idx = 0;
        while idx < ranked.len() {
            let (start, end) = tie_group(&ranked, idx);
            for (i, r) in ranked.iter().enumerate().take(end + 1).skip(start) {
                ranks.insert(
                    r.word.clone(),
                    ProbabilityRank {
                        order: i as u32 + 1,
                        min_order: start as u32 + 1,
                        max_order: end as u32 + 1,
                    },
                );
            }
            idx = end + 1;
        }

        log::debug!(
            "built lexicon index: {} words, {} alphagrams",
            ranks.len(),
            anagram_counts.len()
        );
        Self {
            anagram_counts,
            ranks,
        }
    }

    /// Number of lexicon words sharing the word's alphagram
    pub fn num_anagrams(&self, word: &str) -> u32 {
        self.anagram_counts
            .get(&alphagram(&word.to_uppercase()))
            .copied()
            .unwrap_or(0)
    }

    pub fn rank(&self, word: &str) -> Option<&ProbabilityRank> {
        self.ranks.get(&word.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}
