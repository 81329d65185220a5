use std::collections::HashMap;

/// Default bound on how many links one definition may expand
pub const MAX_DEFINITION_LINKS: usize = 3;

/// Separator between senses in a definition line
pub const SENSE_SEPARATOR: &str = " / ";

/// One sense of a definition, e.g. `a small feline [n CATS]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sense {
    pub part_of_speech: String,
    pub text: String,
}

/// Definitions loaded alongside a plain-text lexicon
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    entries: HashMap<String, Vec<Sense>>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a definition line, split into its senses. A later line for
    /// the same word replaces the earlier one.
    pub fn add(&mut self, word: &str, definition: &str) {
        if word.is_empty() || definition.is_empty() {
            return;
        }
        let senses = definition
            .split(SENSE_SEPARATOR)
            .map(|text| Sense {
                part_of_speech: part_of_speech(text).unwrap_or_default().to_string(),
                text: text.to_string(),
            })
            .collect();
        self.entries.insert(word.to_uppercase(), senses);
    }

    pub fn senses(&self, word: &str) -> Option<&[Sense]> {
        self.entries.get(&word.to_uppercase()).map(|s| s.as_slice())
    }

    /// The full definition line, senses joined back together
    pub fn text(&self, word: &str) -> Option<String> {
        self.senses(word).map(|senses| {
            senses
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(SENSE_SEPARATOR)
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Tag of the first `[tag` in a sense, e.g. `n` in `a feline [n CATS]`
pub fn part_of_speech(sense: &str) -> Option<&str> {
    let start = sense.find('[')? + 1;
    let rest = &sense[start..];
    let end = rest
        .find(|c: char| !is_word_char(c))
        .unwrap_or(rest.len());
    if end == 0 {
        None
    } else {
        Some(&rest[..end])
    }
}

/// Text of the first sense of `definition` tagged with `pos`, without its
/// bracketed inflections.
pub fn sub_definition(definition: &str, pos: &str) -> Option<String> {
    definition
        .split(SENSE_SEPARATOR)
        .filter(|sense| part_of_speech(sense) == Some(pos))
        .map(|sense| {
            let end = sense.find('[').unwrap_or(sense.len());
            super::util::simplified(&sense[..end])
        })
        .find(|text| !text.is_empty())
}

/// Where the resolver looks up the definitions that links point at
pub trait DefinitionSource {
    /// Full definition line of a word, if it has one
    fn definition_text(&self, word: &str) -> Option<String>;

    fn sub_definition(&self, word: &str, pos: &str) -> Option<String> {
        self.definition_text(word)
            .and_then(|text| sub_definition(&text, pos))
    }
}

impl DefinitionSource for Definitions {
    fn definition_text(&self, word: &str) -> Option<String> {
        self.text(word)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkStyle {
    /// `{word=pos}`: keep the word and add its definition in parentheses
    Follow,
    /// `<word=pos>`: swap in the upper-cased word and its definition
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Link<'a> {
    start: usize,
    end: usize,
    word: &'a str,
    pos: &'a str,
    style: LinkStyle,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn word_run(text: &str, from: usize) -> usize {
    text[from..]
        .find(|c: char| !is_word_char(c))
        .map(|i| from + i)
        .unwrap_or(text.len())
}

/// First well-formed `open word=pos close` link in the text
fn find_link(text: &str, open: char, close: char, style: LinkStyle) -> Option<Link<'_>> {
    for (start, _) in text.match_indices(open) {
        let word_start = start + 1;
        let word_end = word_run(text, word_start);
        if word_end == word_start || !text[word_end..].starts_with('=') {
            continue;
        }
        let pos_start = word_end + 1;
        let pos_end = word_run(text, pos_start);
        if pos_end == pos_start || !text[pos_end..].starts_with(close) {
            continue;
        }
        return Some(Link {
            start,
            end: pos_end + 1,
            word: &text[word_start..word_end],
            pos: &text[pos_start..pos_end],
            style,
        });
    }
    None
}

/// Expands the links in a definition, following at most `max_depth` of
/// them. Each step replaces one link; follow links win over replace links.
pub fn resolve_links<S: DefinitionSource + ?Sized>(definition: &str, max_depth: usize, source: &S) -> String {
    resolve(definition.to_string(), max_depth, false, source)
}

fn resolve<S: DefinitionSource + ?Sized>(definition: String, depth: usize, use_follow: bool, source: &S) -> String {
    let link = find_link(&definition, '{', '}', LinkStyle::Follow)
        .or_else(|| find_link(&definition, '<', '>', LinkStyle::Replace));
    let Some(link) = link else {
        return definition;
    };

    // Once a follow link shows up, the rest of the chain is formatted the same way
    let use_follow = use_follow || link.style == LinkStyle::Follow;
    let upper = link.word.to_uppercase();

    let replacement = if depth == 0 {
        upper
    } else {
        match source.sub_definition(&upper, link.pos) {
            None if use_follow => link.word.to_string(),
            None => upper,
            Some(sub) if use_follow => format!("{} ({})", link.word, sub),
            Some(sub) => format!("{}, {}", upper, sub),
        }
    };

    let modified = format!(
        "{}{}{}",
        &definition[..link.start],
        replacement,
        &definition[link.end..]
    );
    if depth == 0 {
        modified
    } else {
        resolve(modified, depth - 1, use_follow, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs() -> Definitions {
        let mut d = Definitions::new();
        d.add("CAT", "a small feline [n CATS] / to vomit [v CATTED, CATTING, CATS]");
        d.add("KITTEN", "a young {cat=n} [n KITTENS]");
        d.add("MOGGY", "<cat=n> [n MOGGIES]");
        d.add("OUROBOROS", "see {ouroboros=n} [n OUROBOROSES]");
        d
    }

    #[test]
    fn test_senses_and_parts_of_speech() {
        let d = defs();
        let senses = d.senses("cat").unwrap();
        assert_eq!(senses.len(), 2);
        assert_eq!(senses[0].part_of_speech, "n");
        assert_eq!(senses[1].part_of_speech, "v");
        assert_eq!(d.sub_definition("CAT", "v").as_deref(), Some("to vomit"));
        assert_eq!(d.sub_definition("CAT", "adj"), None);
        assert_eq!(part_of_speech("no tag here"), None);
    }

    #[test]
    fn test_follow_link() {
        let d = defs();
        assert_eq!(
            resolve_links("a young {cat=n} [n KITTENS]", MAX_DEFINITION_LINKS, &d),
            "a young cat (a small feline) [n KITTENS]"
        );
    }

    #[test]
    fn test_replace_link() {
        let d = defs();
        assert_eq!(resolve_links("<cat=n> [n MOGGIES]", 3, &d), "CAT, a small feline [n MOGGIES]");
        assert_eq!(resolve_links("<dog=n>", 3, &d), "DOG");
        assert_eq!(resolve_links("{dog=n}", 3, &d), "dog");
    }

    #[test]
    fn test_depth_zero_uses_upper_word() {
        let d = defs();
        assert_eq!(resolve_links("a young {cat=n}", 0, &d), "a young CAT");
    }

    #[test]
    fn test_follow_style_sticks_to_chain() {
        let mut d = Definitions::new();
        d.add("PUSS", "{cat=n} [n PUSSES]");
        d.add("CAT", "a feline [n CATS]");
        let resolved = resolve_links("{puss=n} and <cat=n>", 3, &d);
        assert_eq!(resolved, "puss (cat (a feline)) and cat (a feline)");
    }

    #[test]
    fn test_self_reference_terminates() {
        let d = defs();
        let resolved = resolve_links("see {ouroboros=n}", MAX_DEFINITION_LINKS, &d);
        assert!(resolved.contains("OUROBOROS"));
        assert!(!resolved.contains('{'));
    }

    #[test]
    fn test_malformed_links_are_left_alone() {
        let d = defs();
        assert_eq!(resolve_links("{cat} <=n> {cat=}", 3, &d), "{cat} <=n> {cat=}");
    }
}
