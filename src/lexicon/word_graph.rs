use fst::{Automaton, IntoStreamer, Set, SetBuilder, Streamer};

use std::collections::BTreeSet;

use super::error::{LexiconError, Result};
use super::search_spec::{Condition, SearchCondition, SearchSpec};
use super::word_search::{accepts, LengthBounds, PatternSearcher, PatternToken, RackMode, RackSearcher};
use crate::utils::serialization::{self, CompiledGraph};

/// Directed acyclic word graph over the lexicon, backed by an fst set.
/// The fst shares both prefixes and suffixes, so a walk only visits the
/// states a query can still reach. A second graph over the reversed words
/// answers suffix-anchored patterns from the other end.
pub struct WordGraph {
    dict: Set<Vec<u8>>,
    reversed: Option<Set<Vec<u8>>>,
}

impl Default for WordGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WordGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("WordGraph")
            .field("words", &self.dict.len())
            .field("reversed", &self.reversed.is_some())
            .finish()
    }
}

fn build_set<I: IntoIterator<Item = Vec<u8>>>(sorted: I) -> Set<Vec<u8>> {
    let mut build = SetBuilder::memory();
    for entry in sorted {
        // Keys come from an ordered set, so insertion cannot be out of order
        if build.insert(&entry).is_err() {
            log::error!("skipping out of order graph entry");
        }
    }
    build.into_set()
}

fn normalize(word: &str) -> Option<Vec<u8>> {
    let word = word.trim().to_uppercase();
    if word.is_empty() {
        None
    } else {
        Some(word.into_bytes())
    }
}

fn reverse_entries(set: &Set<Vec<u8>>) -> BTreeSet<Vec<u8>> {
    let mut entries = BTreeSet::new();
    let mut stream = set.stream();
    while let Some(key) = stream.next() {
        entries.insert(key.iter().rev().cloned().collect());
    }
    entries
}

impl WordGraph {
    pub fn new() -> Self {
        Self {
            dict: build_set(Vec::new()),
            reversed: None,
        }
    }

    /// Builds the graph in one pass over a word list.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries: BTreeSet<Vec<u8>> = words
            .into_iter()
            .filter_map(|w| normalize(w.as_ref()))
            .collect();
        Self {
            dict: build_set(entries),
            reversed: None,
        }
    }

    /// Inserts a single word. Meant for the import phase only: the graph is
    /// rebuilt, so it must not race with queries.
    pub fn add_word(&mut self, word: &str) -> Result<bool> {
        let Some(entry) = normalize(word) else {
            return Ok(false);
        };
        if self.dict.contains(&entry) {
            return Ok(false);
        }
        self.dict = Self::union_with(&self.dict, &entry)?;
        if let Some(reversed) = &self.reversed {
            let rev = entry.iter().rev().cloned().collect::<Vec<u8>>();
            self.reversed = Some(Self::union_with(reversed, &rev)?);
        }
        Ok(true)
    }

    fn union_with(set: &Set<Vec<u8>>, entry: &[u8]) -> Result<Set<Vec<u8>>> {
        let single = Set::from_iter(std::iter::once(entry))?;
        let mut build = SetBuilder::memory();
        build.extend_stream(set.op().add(&single).union())?;
        Ok(build.into_set())
    }

    pub fn contains_word(&self, word: &str) -> bool {
        match normalize(word) {
            Some(entry) => self.dict.contains(entry),
            None => false,
        }
    }

    pub fn num_words(&self) -> usize {
        self.dict.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }

    pub fn has_reversed(&self) -> bool {
        self.reversed.is_some()
    }

    /// Every word in the graph, in byte order
    pub fn words(&self) -> Vec<String> {
        self.search_fst(PatternSearcher::from_tokens(
            vec![PatternToken::Star],
            LengthBounds::new(1, u32::MAX),
        ))
    }

    /// Builds the reversed graph from the forward one.
    pub fn build_reversed(&mut self) {
        self.reversed = Some(build_set(reverse_entries(&self.dict)));
    }

    /// Searches the graph with the provided automaton
    pub fn search_fst<A>(&self, matcher: A) -> Vec<String>
    where
        A: Automaton,
        A::State: Clone,
    {
        collect_keys(&self.dict, matcher, false)
    }

    /// Runs the automaton over the reversed graph and turns the results back
    /// into words. Falls back to the forward graph when no reversed graph
    /// is attached.
    pub fn search_reversed<A>(&self, matcher: A, forward: A) -> Vec<String>
    where
        A: Automaton,
        A::State: Clone,
    {
        match &self.reversed {
            Some(reversed) => {
                let mut words = collect_keys(reversed, matcher, true);
                words.sort_unstable();
                words
            }
            None => collect_keys(&self.dict, forward, false),
        }
    }

    /// Evaluates the graph-amenable conditions of a spec. Length conditions
    /// bound the walk; every other condition kind is ignored here.
    pub fn search(&self, spec: &SearchSpec) -> Vec<String> {
        let bounds = spec.length_bounds();
        if bounds.min > bounds.max {
            return Vec::new();
        }

        let matchers = spec
            .conditions
            .iter()
            .filter(|c| c.kind().is_graph())
            .filter_map(|c| GraphMatcher::new(c, bounds))
            .collect::<Vec<_>>();
        let (positive, negative): (Vec<_>, Vec<_>) = matchers.into_iter().partition(|m| !m.negated);

        if spec.conjunction {
            let base = match positive.first() {
                Some(m) => m.stream(self),
                None => self.all_words(bounds),
            };
            base.into_iter()
                .filter(|w| positive.iter().skip(1).all(|m| m.matches(w)))
                .filter(|w| negative.iter().all(|m| !m.matches(w)))
                .collect()
        } else {
            if positive.is_empty() && negative.is_empty() {
                return self.all_words(bounds);
            }
            let mut found = BTreeSet::new();
            for m in positive.iter() {
                found.extend(m.stream(self));
            }
            if !negative.is_empty() {
                found.extend(
                    self.all_words(bounds)
                        .into_iter()
                        .filter(|w| negative.iter().any(|m| !m.matches(w))),
                );
            }
            found.into_iter().collect()
        }
    }

    fn all_words(&self, bounds: LengthBounds) -> Vec<String> {
        self.search_fst(PatternSearcher::from_tokens(vec![PatternToken::Star], bounds))
    }

    /// The forward or reversed automaton wrapped with its checksum
    pub fn compiled(&self, reversed: bool) -> Option<CompiledGraph> {
        let set = if reversed { self.reversed.as_ref()? } else { &self.dict };
        Some(CompiledGraph::new(set.as_fst().as_bytes().to_vec(), reversed))
    }

    /// Serializes the forward graph with its checksum.
    pub fn to_compiled(&self) -> Result<Vec<u8>> {
        let graph = CompiledGraph::new(self.dict.as_fst().as_bytes().to_vec(), false);
        serialization::serialize_bytes(&graph)
    }

    /// Serializes the reversed graph, if one is attached.
    pub fn reversed_to_compiled(&self) -> Result<Option<Vec<u8>>> {
        self.compiled(true)
            .map(|graph| serialization::serialize_bytes(&graph))
            .transpose()
    }

    fn decode(graph: CompiledGraph, reversed: bool, expected_checksum: Option<u32>) -> Result<Set<Vec<u8>>> {
        graph.verify(reversed, expected_checksum)?;
        Set::new(graph.fst).map_err(|e| LexiconError::corrupt(e.to_string()))
    }

    /// Builds a graph from a compiled blob.
    pub fn from_compiled(bytes: &[u8], expected_checksum: Option<u32>) -> Result<Self> {
        Self::from_compiled_graph(serialization::deserialize_bytes(bytes)?, expected_checksum)
    }

    pub fn from_compiled_graph(graph: CompiledGraph, expected_checksum: Option<u32>) -> Result<Self> {
        Ok(Self {
            dict: Self::decode(graph, false, expected_checksum)?,
            reversed: None,
        })
    }

    /// Replaces the forward or reversed graph with a compiled blob. The
    /// current graph is left untouched on any failure.
    pub fn import_compiled(&mut self, bytes: &[u8], reversed: bool, expected_checksum: Option<u32>) -> Result<()> {
        let graph = serialization::deserialize_bytes(bytes)?;
        self.import_compiled_graph(graph, reversed, expected_checksum)
    }

    pub fn import_compiled_graph(
        &mut self,
        graph: CompiledGraph,
        reversed: bool,
        expected_checksum: Option<u32>,
    ) -> Result<()> {
        let set = Self::decode(graph, reversed, expected_checksum)?;
        if reversed {
            self.reversed = Some(set);
        } else {
            self.dict = set;
        }
        Ok(())
    }

    /// Attaches a compiled reversed graph used for suffix-anchored patterns.
    pub fn attach_reversed(&mut self, bytes: &[u8], expected_checksum: Option<u32>) -> Result<()> {
        self.import_compiled(bytes, true, expected_checksum)
    }
}

fn collect_keys<A>(set: &Set<Vec<u8>>, matcher: A, reverse: bool) -> Vec<String>
where
    A: Automaton,
    A::State: Clone,
{
    let mut stream = set.search(matcher).into_stream();
    let mut words = Vec::new();
    while let Some(key) = stream.next() {
        let word = if reverse {
            String::from_utf8(key.iter().rev().cloned().collect())
        } else {
            String::from_utf8(key.to_vec())
        };
        match word {
            Ok(word) => words.push(word),
            Err(e) => log::warn!("skipping non UTF-8 graph key: {}", e),
        }
    }
    words
}

enum MatcherKind {
    Pattern(PatternSearcher),
    Rack(RackSearcher),
}

/// One graph-amenable condition compiled into its automaton
struct GraphMatcher {
    kind: MatcherKind,
    negated: bool,
}

impl GraphMatcher {
    fn new(condition: &SearchCondition, bounds: LengthBounds) -> Option<Self> {
        let kind = match &condition.condition {
            Condition::PatternMatch(p) => MatcherKind::Pattern(PatternSearcher::new(p, bounds)),
            Condition::AnagramMatch(q) => MatcherKind::Rack(RackSearcher::new(q, RackMode::Anagram, bounds)),
            Condition::SubanagramMatch(q) => {
                MatcherKind::Rack(RackSearcher::new(q, RackMode::Subanagram, bounds))
            }
            Condition::ConsistOf(q) => MatcherKind::Rack(RackSearcher::new(q, RackMode::ConsistOf, bounds)),
            _ => return None,
        };
        Some(Self {
            kind,
            negated: condition.negated,
        })
    }

    fn stream(&self, graph: &WordGraph) -> Vec<String> {
        match &self.kind {
            MatcherKind::Pattern(p) if p.is_suffix_anchored() => {
                graph.search_reversed(p.reversed(), p.clone())
            }
            MatcherKind::Pattern(p) => graph.search_fst(p.clone()),
            MatcherKind::Rack(r) => graph.search_fst(r.clone()),
        }
    }

    fn matches(&self, word: &str) -> bool {
        match &self.kind {
            MatcherKind::Pattern(p) => accepts(p, word.as_bytes()),
            MatcherKind::Rack(r) => accepts(r, word.as_bytes()),
        }
    }
}
