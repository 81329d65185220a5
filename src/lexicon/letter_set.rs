use std::fmt;

/// A set of the letters A-Z, used for single-position classes such as
/// `[AEIOU]` or `[^QZ]` in patterns.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct LetterSet {
    // bit is one if letter is in it
    accepted: u32,
}

const ALL_LETTERS: u32 = (1 << 26) - 1;

impl LetterSet {
    pub fn empty() -> Self {
        Self { accepted: 0 }
    }
    pub fn any() -> Self {
        Self {
            accepted: ALL_LETTERS,
        }
    }
    pub fn contains(&self, letter: char) -> bool {
        match bit(letter) {
            Some(b) => self.accepted & b != 0,
            None => false,
        }
    }
    pub fn contains_byte(&self, byte: u8) -> bool {
        self.contains(byte as char)
    }
    pub fn insert(&mut self, letter: char) {
        if let Some(b) = bit(letter) {
            self.accepted |= b;
        }
    }
    pub fn complement(&self) -> Self {
        Self {
            accepted: !self.accepted & ALL_LETTERS,
        }
    }
    pub fn is_empty(&self) -> bool {
        self.accepted == 0
    }
    pub fn is_any(&self) -> bool {
        self.accepted == ALL_LETTERS
    }

    /// Parses the body of a bracketed class, e.g. `AEIOU` or `^QZ`.
    pub fn from_class(body: &str) -> Self {
        match body.strip_prefix('^') {
            Some(rest) => rest.chars().collect::<LetterSet>().complement(),
            None => body.chars().collect(),
        }
    }
}

fn bit(letter: char) -> Option<u32> {
    let upper = letter.to_ascii_uppercase();
    if upper.is_ascii_uppercase() {
        Some(1 << (upper as u32 - 'A' as u32))
    } else {
        None
    }
}

impl Default for LetterSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::iter::FromIterator<char> for LetterSet {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = char>,
    {
        let mut tmp = Self::default();
        iter.into_iter().for_each(|l| tmp.insert(l));
        tmp
    }
}

impl fmt::Debug for LetterSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_any() {
            write!(f, "?")
        } else {
            write!(f, "[")?;
            for l in 'A'..='Z' {
                if self.contains(l) {
                    write!(f, "{}", l)?;
                }
            }
            write!(f, "]")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LetterSet;

    #[test]
    fn test_class_parsing() {
        let vowels = LetterSet::from_class("AEIOU");
        assert!(vowels.contains('E'));
        assert!(vowels.contains('e'));
        assert!(!vowels.contains('T'));

        let consonants = LetterSet::from_class("^AEIOU");
        assert!(consonants.contains('T'));
        assert!(!consonants.contains('A'));
        assert_eq!(consonants.complement(), vowels);
    }

    #[test]
    fn test_any_and_empty() {
        assert!(LetterSet::any().is_any());
        assert!(LetterSet::empty().is_empty());
        assert!(!LetterSet::any().contains('?'));
        assert_eq!(format!("{:?}", LetterSet::from_class("BA")), "[AB]");
    }
}
