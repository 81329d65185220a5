use rand::prelude::SliceRandom;
use rand::Rng;

use super::error::{LexiconError, Result};
use super::util::Letter;

/// Standard English tile distribution
pub const DEFAULT_DISTRIBUTION: &str = "A:9 B:2 C:2 D:4 E:12 F:2 G:3 H:2 I:9 J:1 \
     K:1 L:4 M:2 N:6 O:8 P:2 Q:1 R:6 S:4 T:6 U:4 V:2 W:2 X:1 Y:2 Z:1 _:2";

/// Standard English tile values
pub const DEFAULT_VALUES: &str = "A:1 B:3 C:3 D:2 E:1 F:4 G:2 H:4 I:1 J:8 \
     K:5 L:1 M:3 N:1 O:1 P:3 Q:10 R:1 S:1 T:1 U:1 V:4 W:4 X:8 Y:4 Z:10 _:0";

/// Fixed supply of tiles. Immutable once built; drawing a rack works on a
/// copy of the supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterBag {
    /// Number of tiles for A-Z, then blanks at index 26
    amts: [u32; 27],
    /// Point value of each tile
    values: [u32; 27],
}

impl Default for LetterBag {
    fn default() -> Self {
        // Both constants are well formed
        Self {
            amts: parse_table(DEFAULT_DISTRIBUTION).unwrap_or([0; 27]),
            values: parse_table(DEFAULT_VALUES).unwrap_or([0; 27]),
        }
    }
}

impl LetterBag {
    /// Builds a bag from a distribution such as `"A:9 B:2 ... _:2"`.
    /// Letters that are not mentioned have no tiles.
    pub fn from_spec(distribution: &str) -> Result<Self> {
        Ok(Self {
            amts: parse_table(distribution)?,
            values: parse_table(DEFAULT_VALUES)?,
        })
    }

    pub fn with_values(mut self, values: &str) -> Result<Self> {
        self.values = parse_table(values)?;
        Ok(self)
    }

    pub fn num_blanks(&self) -> u32 {
        self.amts[26]
    }

    pub fn score(&self, letter: Letter) -> u32 {
        letter.as_index().map(|i| self.values[i]).unwrap_or(0)
    }

    /// Sum of the tile values of a word's letters
    pub fn point_value(&self, word: &str) -> u32 {
        word.chars().map(|c| self.score(Letter::Letter(c.to_ascii_uppercase()))).sum()
    }

    /// Number of distinct ways to draw the letters of `word` from the bag,
    /// with blanks standing in for letters the supply cannot cover.
    ///
    /// Counts are exact, so words with equal counts compare equal.
    pub fn get_num_combinations(&self, word: &str) -> u128 {
        let mut needed = [0u32; 26];
        let mut unsupplied = 0u32;
        for c in word.chars() {
            match Letter::Letter(c.to_ascii_uppercase()).as_index() {
                Some(i) if i < 26 => needed[i] += 1,
                _ => unsupplied += 1,
            }
        }

        // Letters foreign to the bag can only ever be blanks
        let blanks = self.num_blanks();
        if unsupplied > blanks {
            return 0;
        }

        let letters = needed
            .iter()
            .enumerate()
            .filter(|(_, &n)| n > 0)
            .map(|(i, &n)| (self.amts[i], n))
            .collect::<Vec<_>>();

        let mut total = 0u128;
        sum_blank_assignments(&letters, 0, unsupplied, blanks, 1, &mut total);
        total
    }

    /// Draws `n` tiles without replacement. Blanks are written as `?`.
    pub fn draw_rack<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> String {
        let mut distribution = Vec::new();
        for (i, &amt) in self.amts.iter().enumerate() {
            if let Some(letter) = Letter::from_index(i) {
                for _ in 0..amt {
                    distribution.push(letter);
                }
            }
        }
        let mut tiles = distribution
            .choose_multiple(rng, n)
            .map(|l| match l {
                Letter::Blank => '?',
                Letter::Letter(c) => *c,
            })
            .collect::<Vec<_>>();
        tiles.sort_unstable();
        tiles.into_iter().collect()
    }
}

/// Walks every way of covering the letters with real tiles or blanks.
/// Each assignment is a distinct draw, so the terms simply add up.
fn sum_blank_assignments(
    letters: &[(u32, u32)],
    idx: usize,
    blanks_used: u32,
    blanks: u32,
    product: u128,
    total: &mut u128,
) {
    if product == 0 {
        return;
    }
    if idx == letters.len() {
        let term = product.saturating_mul(choose(blanks, blanks_used));
        *total = total.saturating_add(term);
        return;
    }
    let (supply, need) = letters[idx];
    for k in 0..=need {
        if blanks_used + k > blanks {
            break;
        }
        let ways = choose(supply, need - k);
        sum_blank_assignments(
            letters,
            idx + 1,
            blanks_used + k,
            blanks,
            product.saturating_mul(ways),
            total,
        );
    }
}

/// Binomial coefficient, exact for the small values a tile bag produces
pub fn choose(n: u32, k: u32) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result = 1u128;
    for i in 0..k {
        result = result * (n - i) as u128 / (i + 1) as u128;
    }
    result
}

fn parse_table(spec: &str) -> Result<[u32; 27]> {
    let mut table = [0u32; 27];
    for entry in spec.split_whitespace() {
        let (letter, amount) = entry
            .split_once(':')
            .ok_or_else(|| LexiconError::config(format!("bad letter entry '{}'", entry)))?;
        let mut chars = letter.chars();
        let idx = match (chars.next(), chars.next()) {
            (Some(c), None) => Letter::from(c).as_index(),
            _ => None,
        }
        .ok_or_else(|| LexiconError::config(format!("bad letter '{}'", letter)))?;
        table[idx] = amount
            .parse()
            .map_err(|_| LexiconError::config(format!("bad count in '{}'", entry)))?;
    }
    Ok(table)
}
