use rayon::prelude::*;

use super::bag::LetterBag;
use super::search_spec::{Condition, SearchCondition};
use super::util::alphagram;

/// A word with its combination count, in probability order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedWord {
    pub word: String,
    pub combinations: u128,
}

/// Sorts words by ascending combination count. Ties are broken by the
/// upper-cased word in legacy mode, otherwise by alphagram then word.
pub fn rank_words(words: Vec<String>, bag: &LetterBag, legacy: bool) -> Vec<RankedWord> {
    let mut keyed = words
        .into_par_iter()
        .map(|word| {
            let upper = word.to_uppercase();
            let combinations = bag.get_num_combinations(&upper);
            let agram = if legacy { String::new() } else { alphagram(&upper) };
            (combinations, agram, upper, word)
        })
        .collect::<Vec<_>>();
    keyed.par_sort_by(|a, b| (a.0, &a.1, &a.2).cmp(&(b.0, &b.1, &b.2)));
    keyed
        .into_iter()
        .map(|(combinations, _, _, word)| RankedWord { word, combinations })
        .collect()
}

/// Start and end index of the tie group around `idx`
pub fn tie_group(ranked: &[RankedWord], idx: usize) -> (usize, usize) {
    let combinations = ranked[idx].combinations;
    let mut start = idx;
    while start > 0 && ranked[start - 1].combinations == combinations {
        start -= 1;
    }
    let mut end = idx;
    while end + 1 < ranked.len() && ranked[end + 1].combinations == combinations {
        end += 1;
    }
    (start, end)
}

const UNBOUNDED: u32 = 999_999;

/// The combined effect of every LimitByProbabilityOrder condition.
///
/// Ranks are 1-based and inclusive. Strict windows are hard limits; lax
/// windows are widened so they never cut a tie group in two, but the
/// widening stops at the strict limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbabilityWindow {
    strict_min: u32,
    strict_max: u32,
    lax_min: u32,
    lax_max: u32,
    legacy: bool,
}

impl ProbabilityWindow {
    pub fn from_conditions(conditions: &[SearchCondition]) -> Option<Self> {
        let mut window = ProbabilityWindow {
            strict_min: 0,
            strict_max: UNBOUNDED,
            lax_min: 0,
            lax_max: UNBOUNDED,
            legacy: false,
        };
        let mut found = false;
        for c in conditions {
            if let Condition::LimitByProbabilityOrder { range, lax } = c.condition {
                found = true;
                if lax {
                    window.lax_min = window.lax_min.max(range.min);
                    window.lax_max = window.lax_max.min(range.max);
                } else {
                    window.strict_min = window.strict_min.max(range.min);
                    window.strict_max = window.strict_max.min(range.max);
                }
            }
        }
        // Any legacy flag in the query switches the tie-break order
        window.legacy = conditions.iter().any(|c| c.legacy);
        if found {
            Some(window)
        } else {
            None
        }
    }

    /// Ranks the candidates and returns the slice the window covers, in
    /// probability order.
    pub fn apply(&self, words: Vec<String>, bag: &LetterBag) -> Vec<String> {
        let n = words.len() as i64;
        if n == 0 || self.strict_min as i64 > n || self.lax_min as i64 > n {
            return Vec::new();
        }

        // 0-based, clamped to the candidates
        let strict_min = (self.strict_min as i64 - 1).max(0);
        let strict_max = (self.strict_max as i64 - 1).min(n - 1);
        let lax_min = (self.lax_min as i64 - 1).max(0);
        let lax_max = (self.lax_max as i64 - 1).min(n - 1);

        let mut min = strict_min.max(lax_min);
        let mut max = strict_max.min(lax_max);
        if min > max {
            return Vec::new();
        }

        let ranked = rank_words(words, bag, self.legacy);
        let same = |a: i64, b: i64| ranked[a as usize].combinations == ranked[b as usize].combinations;

        while min > 0 && min > strict_min && same(min - 1, min) {
            min -= 1;
        }
        while max < n - 1 && max < strict_max && same(max + 1, max) {
            max += 1;
        }

        log::debug!("probability window resolved to ranks {}..={}", min + 1, max + 1);
        ranked
            .into_iter()
            .skip(min as usize)
            .take((max - min + 1) as usize)
            .map(|r| r.word)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::search_spec::Range;

    fn window(min: u32, max: u32, lax: bool) -> SearchCondition {
        SearchCondition::new(Condition::LimitByProbabilityOrder {
            range: Range::new(min, max),
            lax,
        })
    }

    fn words(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    // Q:1 X:1, A:2 B:2 C:3: QX=1, AB=4, AC=6, BC=6, CC=3
    fn bag() -> LetterBag {
        LetterBag::from_spec("A:2 B:2 C:3 Q:1 X:1").unwrap()
    }

    #[test]
    fn test_rank_ascending_with_alphagram_ties() {
        let ranked = rank_words(words(&["BC", "AC", "QX", "CC", "AB"]), &bag(), false);
        let order = ranked.iter().map(|r| r.word.as_str()).collect::<Vec<_>>();
        assert_eq!(order, vec!["QX", "CC", "AB", "AC", "BC"]);
        assert_eq!(tie_group(&ranked, 4), (3, 4));
        assert_eq!(tie_group(&ranked, 0), (0, 0));
    }

    #[test]
    fn test_legacy_tie_break_uses_word() {
        let bag = LetterBag::from_spec("A:1 B:1 C:1 D:1").unwrap();
        let ranked = rank_words(words(&["DA", "BC"]), &bag, true);
        assert_eq!(ranked[0].word, "BC");
        let ranked = rank_words(words(&["DA", "CB"]), &bag, false);
        // alphagrams AD < BC
        assert_eq!(ranked[0].word, "DA");
    }

    #[test]
    fn test_lax_window_keeps_tie_group_whole() {
        let candidates = words(&["BC", "AC", "QX", "CC", "AB"]);
        // raw window ends at rank 4, inside the AC/BC tie
        let w = ProbabilityWindow::from_conditions(&[window(1, 4, true)]).unwrap();
        assert_eq!(w.apply(candidates.clone(), &bag()), words(&["QX", "CC", "AB", "AC", "BC"]));

        // raw window starts at rank 5, inside the same tie
        let w = ProbabilityWindow::from_conditions(&[window(5, 5, true)]).unwrap();
        assert_eq!(w.apply(candidates, &bag()), words(&["AC", "BC"]));
    }

    #[test]
    fn test_strict_window_bounds_widening() {
        let candidates = words(&["BC", "AC", "QX", "CC", "AB"]);
        let w = ProbabilityWindow::from_conditions(&[window(1, 4, true), window(1, 4, false)]).unwrap();
        assert_eq!(w.apply(candidates.clone(), &bag()), words(&["QX", "CC", "AB", "AC"]));

        let w = ProbabilityWindow::from_conditions(&[window(2, 3, false)]).unwrap();
        assert_eq!(w.apply(candidates, &bag()), words(&["CC", "AB"]));
    }

    #[test]
    fn test_window_beyond_candidates_is_empty() {
        let candidates = words(&["AB", "CC"]);
        let w = ProbabilityWindow::from_conditions(&[window(3, 10, false)]).unwrap();
        assert!(w.apply(candidates.clone(), &bag()).is_empty());
        let w = ProbabilityWindow::from_conditions(&[window(1, 1, true), window(2, 2, true)]).unwrap();
        assert!(w.apply(candidates, &bag()).is_empty());
    }

    #[test]
    fn test_no_window_conditions() {
        assert!(ProbabilityWindow::from_conditions(&[]).is_none());
    }
}
