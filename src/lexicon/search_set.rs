use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io;
use std::str::FromStr;

use super::bag::LetterBag;
use super::util::alphagram;
use super::word_graph::WordGraph;

/// Letters whose sevens and eights count as "type two" for study lists
const TYPE_TWO_CHARS: &str = "AAADEEEEGIIILNNOORRSSTTU";
/// Type three words are at least as likely as these
const TYPE_THREE_SEVEN: &str = "HUNTERS";
const TYPE_THREE_EIGHT: &str = "NOTIFIED";

/// Named derived sets that BelongToGroup conditions refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchSet {
    HookWords,
    FrontHooks,
    BackHooks,
    TypeOneSevens,
    TypeOneEights,
    TypeTwoSevens,
    TypeTwoEights,
    TypeThreeSevens,
    TypeThreeEights,
    EightsFromSevenLetterStems,
}

const ALL_SETS: [SearchSet; 10] = [
    SearchSet::HookWords,
    SearchSet::FrontHooks,
    SearchSet::BackHooks,
    SearchSet::TypeOneSevens,
    SearchSet::TypeOneEights,
    SearchSet::TypeTwoSevens,
    SearchSet::TypeTwoEights,
    SearchSet::TypeThreeSevens,
    SearchSet::TypeThreeEights,
    SearchSet::EightsFromSevenLetterStems,
];

impl SearchSet {
    pub fn name(&self) -> &'static str {
        match self {
            SearchSet::HookWords => "Hook Words",
            SearchSet::FrontHooks => "Front Hooks",
            SearchSet::BackHooks => "Back Hooks",
            SearchSet::TypeOneSevens => "Type I Sevens",
            SearchSet::TypeOneEights => "Type I Eights",
            SearchSet::TypeTwoSevens => "Type II Sevens",
            SearchSet::TypeTwoEights => "Type II Eights",
            SearchSet::TypeThreeSevens => "Type III Sevens",
            SearchSet::TypeThreeEights => "Type III Eights",
            SearchSet::EightsFromSevenLetterStems => "Eights From Seven-Letter Stems",
        }
    }
}

impl fmt::Display for SearchSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn squash(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl FromStr for SearchSet {
    type Err = String;

    /// Accepts the display name or any spelling of it that differs only in
    /// case, spaces or punctuation (`type-i-sevens`, `HookWords`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = squash(s);
        ALL_SETS
            .iter()
            .find(|set| squash(set.name()) == wanted || squash(&format!("{:?}", set)) == wanted)
            .copied()
            .ok_or_else(|| format!("unknown search set '{}'", s))
    }
}

/// Fixed-length stems used by the type I sets, grouped by stem length
#[derive(Debug, Clone, Default)]
pub struct Stems {
    by_length: BTreeMap<usize, StemList>,
}

#[derive(Debug, Clone, Default)]
struct StemList {
    stems: Vec<String>,
    alphagrams: BTreeSet<String>,
}

impl Stems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Imports one stem file. The first stem fixes the length; stems of any
    /// other length are dropped. Returns the number of stems kept.
    pub fn import<I>(&mut self, lines: I) -> io::Result<usize>
    where
        I: IntoIterator<Item = io::Result<String>>,
    {
        let mut length = 0;
        let mut imported = StemList::default();
        for line in lines {
            let line = line?;
            let Some(stem) = line.split_whitespace().next() else {
                continue;
            };
            let stem = stem.to_uppercase();
            let len = stem.chars().count();
            if length == 0 {
                length = len;
            }
            if len != length {
                continue;
            }
            imported.alphagrams.insert(alphagram(&stem));
            imported.stems.push(stem);
        }

        let count = imported.stems.len();
        if count > 0 {
            let list = self.by_length.entry(length).or_default();
            list.stems.extend(imported.stems);
            list.alphagrams.extend(imported.alphagrams);
        }
        Ok(count)
    }

    pub fn stems(&self, length: usize) -> &[String] {
        self.by_length
            .get(&length)
            .map(|l| l.stems.as_slice())
            .unwrap_or(&[])
    }

    pub fn alphagrams(&self, length: usize) -> Option<&BTreeSet<String>> {
        self.by_length.get(&length).map(|l| &l.alphagrams)
    }
}

/// True if every letter of `small` (sorted) appears in `big` (sorted)
fn is_sub_multiset(small: &str, big: &str) -> bool {
    let mut big = big.chars();
    'outer: for c in small.chars() {
        for b in big.by_ref() {
            if b == c {
                continue 'outer;
            }
            if b > c {
                return false;
            }
        }
        return false;
    }
    true
}

fn without_first(word: &str) -> String {
    word.chars().skip(1).collect()
}

fn without_last(word: &str) -> String {
    let mut chars = word.chars();
    chars.next_back();
    chars.collect()
}

/// Everything set membership needs to know about the loaded lexicon
pub struct SetContext<'a> {
    pub graph: &'a WordGraph,
    pub bag: &'a LetterBag,
    pub stems: &'a Stems,
}

impl<'a> SetContext<'a> {
    /// Whether an acceptable word belongs to the set
    pub fn is_member(&self, word: &str, set: SearchSet) -> bool {
        let word = word.to_uppercase();
        let len = word.chars().count();
        if len == 0 {
            return false;
        }
        match set {
            SearchSet::HookWords => {
                self.graph.contains_word(&without_last(&word))
                    || self.graph.contains_word(&without_first(&word))
            }
            SearchSet::FrontHooks => self.graph.contains_word(&without_first(&word)),
            SearchSet::BackHooks => self.graph.contains_word(&without_last(&word)),
            SearchSet::TypeOneSevens => len == 7 && self.drops_to_stem(&word, 1),
            SearchSet::TypeOneEights => len == 8 && self.drops_to_stem(&word, 2),
            SearchSet::EightsFromSevenLetterStems => len == 8 && self.drops_to_stem(&word, 1),
            SearchSet::TypeTwoSevens => {
                len == 7
                    && is_sub_multiset(&alphagram(&word), TYPE_TWO_CHARS)
                    && !self.is_member(&word, SearchSet::TypeOneSevens)
            }
            SearchSet::TypeTwoEights => {
                len == 8
                    && is_sub_multiset(&alphagram(&word), TYPE_TWO_CHARS)
                    && !self.is_member(&word, SearchSet::TypeOneEights)
            }
            SearchSet::TypeThreeSevens => {
                len == 7
                    && self.bag.get_num_combinations(&word)
                        >= self.bag.get_num_combinations(TYPE_THREE_SEVEN)
                    && !self.is_member(&word, SearchSet::TypeOneSevens)
                    && !self.is_member(&word, SearchSet::TypeTwoSevens)
            }
            SearchSet::TypeThreeEights => {
                len == 8
                    && self.bag.get_num_combinations(&word)
                        >= self.bag.get_num_combinations(TYPE_THREE_EIGHT)
                    && !self.is_member(&word, SearchSet::TypeOneEights)
                    && !self.is_member(&word, SearchSet::TypeTwoEights)
            }
        }
    }

    /// Whether removing `extra` letters from the word leaves a stem
    fn drops_to_stem(&self, word: &str, extra: usize) -> bool {
        let len = word.chars().count();
        let Some(stems) = self.stems.alphagrams(len.saturating_sub(extra)) else {
            return false;
        };
        let agram = alphagram(word);
        if extra == 1 {
            let chars = agram.chars().collect::<Vec<_>>();
            (0..chars.len()).any(|i| {
                let candidate: String = chars[..i].iter().chain(chars[i + 1..].iter()).collect();
                stems.contains(&candidate)
            })
        } else {
            stems.iter().any(|stem| is_sub_multiset(stem, &agram))
        }
    }
}
