use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{LexiconError, Result};

/// Longest word the engine is expected to handle
pub const MAX_WORD_LEN: usize = 15;

const VOWELS: &[char] = &['A', 'E', 'I', 'O', 'U'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Letter {
    Blank,
    Letter(char),
}

impl Letter {
    /// Index into per-letter tables: 0..26 for A-Z, 26 for the blank
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Blank => Some(26),
            Self::Letter(l) if l.is_ascii_uppercase() => Some(*l as usize - 'A' as usize),
            Self::Letter(_) => None,
        }
    }

    pub fn from_index(i: usize) -> Option<Letter> {
        match i {
            0..=25 => Some(Letter::Letter((b'A' + i as u8) as char)),
            26 => Some(Letter::Blank),
            _ => None,
        }
    }
}

impl From<char> for Letter {
    fn from(c: char) -> Self {
        match c {
            '_' | '?' => Letter::Blank,
            c => Letter::Letter(c.to_ascii_uppercase()),
        }
    }
}

/// The letters of a word in ascending order.
pub fn alphagram(word: &str) -> String {
    let mut chars = word.chars().collect::<Vec<_>>();
    chars.sort_unstable();
    chars.into_iter().collect()
}

pub fn num_vowels(word: &str) -> u32 {
    word.chars()
        .filter(|c| VOWELS.contains(&c.to_ascii_uppercase()))
        .count() as u32
}

pub fn num_unique_letters(word: &str) -> u32 {
    let mut seen = [false; 256];
    let mut count = 0;
    for b in word.bytes() {
        let b = b.to_ascii_uppercase() as usize;
        if !seen[b] {
            seen[b] = true;
            count += 1;
        }
    }
    count
}

/// Number of letters in a word (the engine only stores ASCII words)
pub fn word_length(word: &str) -> u32 {
    word.chars().count() as u32
}

/// Collapses runs of whitespace and trims both ends.
pub fn simplified(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lines of a lexicon-style text source. Blank lines and `#` comments are
/// skipped and whitespace is simplified.
pub struct EntryLines<R> {
    inner: Lines<R>,
}

impl<R: BufRead> Iterator for EntryLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.inner.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            let line = simplified(&line);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            return Some(Ok(line));
        }
    }
}

pub fn entry_lines<R: BufRead>(reader: R) -> EntryLines<R> {
    EntryLines {
        inner: reader.lines(),
    }
}

/// A text file that can be walked line by line as many times as needed.
#[derive(Debug, Clone)]
pub struct LineSource {
    path: PathBuf,
}

impl LineSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Starts a fresh pass over the file.
    pub fn lines(&self) -> Result<EntryLines<BufReader<File>>> {
        let file = File::open(&self.path).map_err(|e| LexiconError::import_io(&self.path, e))?;
        Ok(entry_lines(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphagram_is_permutation_invariant() {
        assert_eq!(alphagram("CAT"), "ACT");
        assert_eq!(alphagram("TAC"), alphagram("ACT"));
        assert_eq!(alphagram("RETAINS"), alphagram("NASTIER"));
        assert_eq!(alphagram(""), "");
    }

    #[test]
    fn test_letter_counts() {
        assert_eq!(num_vowels("QUEUE"), 4);
        assert_eq!(num_vowels("RHYTHM"), 0);
        assert_eq!(num_unique_letters("QUEUE"), 3);
        assert_eq!(num_unique_letters("ABC"), 3);
    }

    #[test]
    fn test_entry_lines_skip_comments() {
        let text = "# header\n\n  CAT   a  small feline \nDOG\n   \n#tail\n";
        let lines = entry_lines(text.as_bytes())
            .collect::<io::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(lines, vec!["CAT a small feline", "DOG"]);
    }

    #[test]
    fn test_letter_index() {
        assert_eq!(Letter::from('a').as_index(), Some(0));
        assert_eq!(Letter::from('?').as_index(), Some(26));
        assert_eq!(Letter::from_index(25), Some(Letter::Letter('Z')));
        assert_eq!(Letter::from_index(27), None);
    }

    #[test]
    fn test_missing_source_is_import_error() {
        let source = LineSource::new("/definitely/not/here.txt");
        assert!(matches!(source.lines(), Err(LexiconError::ImportIo { .. })));
    }
}
