use super::util::Letter;

/// Multiset of letters remaining to be placed while walking the word graph
/// for anagram-style searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rack {
    /// Histogram count of each letter A-Z in the rack
    pub letters: [u32; 26],
    /// Number of blanks in the rack
    pub n_blanks: u32,
    /// The total number of remaining letters+wildcards to play
    pub n_total: u32,
    /// Whether any number of extra letters may be added (`*` in a query)
    pub open: bool,
}

impl Rack {
    pub fn new(letters: [u32; 26], n_blanks: u32) -> Self {
        let n_total = letters.iter().sum::<u32>() + n_blanks;
        Self {
            letters,
            n_blanks,
            n_total,
            open: false,
        }
    }

    pub fn empty() -> Self {
        Self::new([0; 26], 0)
    }

    /// Parses an anagram query: letters, `?` for blanks and `*` for any
    /// number of extra letters. Other characters are ignored.
    pub fn parse(query: &str) -> Self {
        let mut rack = Rack::empty();
        for c in query.chars() {
            match c {
                '*' => rack.open = true,
                c => {
                    if let Some(i) = Letter::from(c).as_index() {
                        if i == 26 {
                            rack.n_blanks += 1;
                        } else {
                            rack.letters[i] += 1;
                        }
                        rack.n_total += 1;
                    }
                }
            }
        }
        rack
    }

    /// Parses a query as plain letters; wildcard characters are dropped.
    pub fn parse_literal(query: &str) -> Self {
        query
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect()
    }

    /// Number of tiles, blanks included, that a word built from this rack
    /// must use when the rack is not open.
    pub fn len(&self) -> u32 {
        self.n_total
    }

    pub fn is_empty(&self) -> bool {
        self.n_total == 0
    }

    /// Used for automaton state searching
    pub fn remove(&self, letter: char) -> Option<Self> {
        let i = letter_index(letter)?;
        if self.letters[i] > 0 {
            let mut tmp = *self;
            tmp.letters[i] -= 1;
            tmp.n_total -= 1;
            Some(tmp)
        } else {
            None
        }
    }

    /// Used for automaton state searching
    pub fn remove_wildcard(&self) -> Option<Self> {
        if self.n_blanks > 0 {
            let mut tmp = *self;
            tmp.n_blanks -= 1;
            tmp.n_total -= 1;
            Some(tmp)
        } else {
            None
        }
    }

    /// Consumes `letter` from the rack, falling back to a blank.
    pub fn take(&self, letter: char) -> Option<Self> {
        self.remove(letter).or_else(|| self.remove_wildcard())
    }
}

fn letter_index(letter: char) -> Option<usize> {
    match Letter::from(letter) {
        Letter::Blank => None,
        l => l.as_index(),
    }
}

impl std::iter::FromIterator<char> for Rack {
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        let mut chars = [0; 26];
        let mut n_blanks = 0;
        iter.into_iter().for_each(|x| match Letter::from(x) {
            Letter::Blank => n_blanks += 1,
            l => {
                if let Some(i) = l.as_index() {
                    chars[i] += 1
                }
            }
        });
        Self::new(chars, n_blanks)
    }
}
