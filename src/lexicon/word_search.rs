use fst::Automaton;

use super::letter_set::LetterSet;
use super::rack::Rack;
use super::util::MAX_WORD_LEN;

/*
    Automata driven over the word graph by the fst crate. Each one walks the
    graph edge by edge and prunes a branch as soon as its state dies, so the
    cost of a search follows the branches that can still match rather than
    the size of the lexicon.
*/

/// Inclusive bounds on the length of a matched word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    pub min: u32,
    pub max: u32,
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self {
            min: 1,
            max: MAX_WORD_LEN as u32,
        }
    }
}

impl LengthBounds {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min: min.max(1), max }
    }

    pub fn contains(&self, len: u32) -> bool {
        len >= self.min && len <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternToken {
    /// Exactly one letter from the class (`?` is the full class)
    Class(LetterSet),
    /// Any run of letters, possibly empty
    Star,
}

/// Parses `?`, `*`, `[ABC]`, `[^ABC]` and plain letters.
pub fn parse_pattern(pattern: &str) -> Vec<PatternToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '?' | '.' => tokens.push(PatternToken::Class(LetterSet::any())),
            '*' => {
                // consecutive stars are one star
                if tokens.last() != Some(&PatternToken::Star) {
                    tokens.push(PatternToken::Star)
                }
            }
            '[' => {
                let mut body = String::new();
                for c in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                    body.push(c);
                }
                tokens.push(PatternToken::Class(LetterSet::from_class(&body)));
            }
            c if c.is_ascii_alphabetic() => {
                tokens.push(PatternToken::Class(
                    std::iter::once(c.to_ascii_uppercase()).collect(),
                ))
            }
            _ => {}
        }
    }
    tokens
}

/// Number of letters a pattern matches, or None if it contains `*`.
pub fn fixed_pattern_length(pattern: &str) -> Option<u32> {
    let tokens = parse_pattern(pattern);
    if tokens.iter().any(|t| *t == PatternToken::Star) {
        None
    } else {
        Some(tokens.len() as u32)
    }
}

/// Bit set of pattern positions that are live after the letters seen so
/// far. Patterns are limited to 127 tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternState {
    positions: u128,
    depth: u32,
}

#[derive(Debug, Clone)]
pub struct PatternSearcher {
    tokens: Vec<PatternToken>,
    bounds: LengthBounds,
}

impl PatternSearcher {
    pub fn new(pattern: &str, bounds: LengthBounds) -> Self {
        Self::from_tokens(parse_pattern(pattern), bounds)
    }

    pub fn from_tokens(mut tokens: Vec<PatternToken>, bounds: LengthBounds) -> Self {
        tokens.truncate(127);
        Self { tokens, bounds }
    }

    /// The same pattern read right to left, for searching a reversed graph
    pub fn reversed(&self) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.reverse();
        Self {
            tokens,
            bounds: self.bounds,
        }
    }

    /// Opens with `*` or `?` but ends in a fixed letter or class, so the
    /// walk is narrower from the end of the word.
    pub fn is_suffix_anchored(&self) -> bool {
        let wild = |token: Option<&PatternToken>| match token {
            Some(PatternToken::Star) => true,
            Some(PatternToken::Class(set)) => set.is_any(),
            None => false,
        };
        wild(self.tokens.first()) && !wild(self.tokens.last())
    }

    fn closure(&self, mut positions: u128) -> u128 {
        for (i, token) in self.tokens.iter().enumerate() {
            if positions & (1u128 << i) != 0 && *token == PatternToken::Star {
                positions |= 1u128 << (i + 1);
            }
        }
        positions
    }
}

impl Automaton for PatternSearcher {
    type State = Option<PatternState>;

    fn start(&self) -> Self::State {
        Some(PatternState {
            positions: self.closure(1),
            depth: 0,
        })
    }

    fn is_match(&self, state: &Self::State) -> bool {
        match state {
            Some(state) => {
                state.positions & (1u128 << self.tokens.len()) != 0
                    && self.bounds.contains(state.depth)
            }
            None => false,
        }
    }

    fn can_match(&self, state: &Self::State) -> bool {
        state.is_some()
    }

    fn accept(&self, state: &Self::State, byte: u8) -> Self::State {
        let state = state.as_ref()?;
        if state.depth >= self.bounds.max {
            return None;
        }
        let mut next = 0u128;
        for (i, token) in self.tokens.iter().enumerate() {
            if state.positions & (1u128 << i) == 0 {
                continue;
            }
            match token {
                PatternToken::Star => next |= 1u128 << i,
                PatternToken::Class(set) => {
                    if set.contains_byte(byte) {
                        next |= 1u128 << (i + 1);
                    }
                }
            }
        }
        let next = self.closure(next);
        if next == 0 {
            None
        } else {
            Some(PatternState {
                positions: next,
                depth: state.depth + 1,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RackMode {
    /// Every tile must be used
    Anagram,
    /// Any subset of the tiles, blanks included
    Subanagram,
    /// Any subset of the literal letters
    ConsistOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RackState {
    pub rack: Rack,
    pub depth: u32,
}

/// Walks the graph while drawing letters from a rack. A letter missing from
/// the rack uses up a blank if one is left.
#[derive(Debug, Clone)]
pub struct RackSearcher {
    rack: Rack,
    mode: RackMode,
    bounds: LengthBounds,
}

impl RackSearcher {
    pub fn new(query: &str, mode: RackMode, bounds: LengthBounds) -> Self {
        let rack = match mode {
            RackMode::ConsistOf => Rack::parse_literal(query),
            _ => Rack::parse(query),
        };
        Self { rack, mode, bounds }
    }

    /// Length every anagram of this query has, when the query has no `*`.
    pub fn fixed_length(&self) -> Option<u32> {
        if self.rack.open {
            None
        } else {
            Some(self.rack.len())
        }
    }
}

impl Automaton for RackSearcher {
    type State = Option<RackState>;

    fn start(&self) -> Self::State {
        Some(RackState {
            rack: self.rack,
            depth: 0,
        })
    }

    fn is_match(&self, state: &Self::State) -> bool {
        match state {
            Some(state) => {
                if !self.bounds.contains(state.depth) {
                    return false;
                }
                match self.mode {
                    RackMode::Anagram => state.rack.is_empty(),
                    RackMode::Subanagram | RackMode::ConsistOf => true,
                }
            }
            None => false,
        }
    }

    fn can_match(&self, state: &Self::State) -> bool {
        match state {
            Some(state) => match self.mode {
                RackMode::Anagram => state.depth + state.rack.len() <= self.bounds.max,
                _ => true,
            },
            None => false,
        }
    }

    fn accept(&self, state: &Self::State, byte: u8) -> Self::State {
        let state = state.as_ref()?;
        if state.depth >= self.bounds.max {
            return None;
        }
        let letter = byte as char;
        let rack = match state.rack.take(letter) {
            Some(rack) => rack,
            // Open racks take extra letters for free
            None if state.rack.open => state.rack,
            None => return None,
        };
        Some(RackState {
            rack,
            depth: state.depth + 1,
        })
    }
}

/// Runs an automaton over a single word, outside of any graph.
pub fn accepts<A: Automaton>(automaton: &A, word: &[u8]) -> bool {
    let mut state = automaton.start();
    for &b in word {
        if !automaton.can_match(&state) {
            return false;
        }
        state = automaton.accept(&state, b);
    }
    automaton.is_match(&state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(p: &str, w: &str) -> bool {
        accepts(&PatternSearcher::new(p, LengthBounds::default()), w.as_bytes())
    }

    fn rack(q: &str, mode: RackMode, w: &str) -> bool {
        accepts(&RackSearcher::new(q, mode, LengthBounds::default()), w.as_bytes())
    }

    #[test]
    fn test_pattern_wildcards() {
        assert!(pattern("C?T", "CAT"));
        assert!(!pattern("C?T", "CART"));
        assert!(pattern("*ING", "SING"));
        assert!(pattern("*ING", "ING"));
        assert!(pattern("RE*", "REDO"));
        assert!(pattern("R*D", "RED"));
        assert!(pattern("R*D", "RD"));
        assert!(!pattern("R*D", "REDS"));
        assert!(pattern("[AEIOU]?", "AT"));
        assert!(!pattern("[^AEIOU]?", "AT"));
    }

    #[test]
    fn test_fixed_length() {
        assert_eq!(fixed_pattern_length("C?T"), Some(3));
        assert_eq!(fixed_pattern_length("[AB]X"), Some(2));
        assert_eq!(fixed_pattern_length("C*"), None);
        assert_eq!(
            RackSearcher::new("CA?", RackMode::Anagram, LengthBounds::default()).fixed_length(),
            Some(3)
        );
    }

    #[test]
    fn test_reversed_pattern() {
        let p = PatternSearcher::new("*ING", LengthBounds::default());
        assert!(p.is_suffix_anchored());
        assert!(accepts(&p.reversed(), b"GNIS"));
        for (front, anchored) in [("?AT", true), ("[^AEIOU]AT", false), ("C?T", false), ("RE*", false), ("?A?", false)] {
            assert_eq!(
                PatternSearcher::new(front, LengthBounds::default()).is_suffix_anchored(),
                anchored,
                "{}",
                front
            );
        }
    }

    #[test]
    fn test_anagram_modes() {
        assert!(rack("CAT", RackMode::Anagram, "ACT"));
        assert!(!rack("CAT", RackMode::Anagram, "AT"));
        assert!(rack("CA?", RackMode::Anagram, "CAB"));
        assert!(!rack("CA?", RackMode::Anagram, "CABS"));
        assert!(rack("CA*", RackMode::Anagram, "CAPS"));
        assert!(rack("CAT", RackMode::Subanagram, "AT"));
        assert!(rack("CA?", RackMode::Subanagram, "AX"));
        assert!(!rack("CAT", RackMode::Subanagram, "TAT"));
        assert!(rack("CAT?", RackMode::ConsistOf, "TA"));
        assert!(!rack("CAT?", RackMode::ConsistOf, "TAX"));
    }

    #[test]
    fn test_length_bounds_prune() {
        let p = PatternSearcher::new("*", LengthBounds::new(2, 3));
        assert!(!accepts(&p, b"A"));
        assert!(accepts(&p, b"AB"));
        assert!(!accepts(&p, b"ABCD"));
    }
}
