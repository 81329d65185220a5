use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::{self, BufRead};
use std::path::Path;

use super::bag::LetterBag;
use super::definition::{resolve_links, DefinitionSource, Definitions, SENSE_SEPARATOR};
use super::error::{LexiconError, Result};
use super::index::LexiconIndex;
use super::probability::ProbabilityWindow;
use super::search_set::{SearchSet, SetContext, Stems};
use super::search_spec::{Condition, ConditionKind, SearchCondition, SearchSpec};
use super::store::{SqliteStore, StatsStore, WordInfo};
use super::util::{self, entry_lines, LineSource};
use super::word_graph::WordGraph;
use crate::config::EngineConfig;
use crate::utils::serialization::{self, CompiledGraph};

/// How one optimized spec is split between the graph, the statistics store
/// and the post-filter.
#[derive(Debug, Default)]
struct QueryPlan {
    graph: usize,
    store: Vec<SearchCondition>,
    post: usize,
}

impl QueryPlan {
    fn classify(spec: &SearchSpec) -> Self {
        let mut plan = QueryPlan::default();
        for c in spec.conditions.iter() {
            let kind = c.kind();
            if kind.is_graph() {
                plan.graph += 1;
            } else if kind.is_store() {
                plan.store.push(c.clone());
            } else if kind.is_post() {
                plan.post += 1;
            }
        }
        // The graph walk already enforces positive length bounds
        let only_lengths = plan
            .store
            .iter()
            .all(|c| c.kind() == ConditionKind::Length && !c.negated);
        if plan.graph > 0 && only_lengths {
            plan.store.clear();
        }
        plan
    }
}

/// Same-kind ranges of a disjunctive spec. The optimizer folds each group
/// into one covering range, so results are checked against the originals.
fn disjunctive_ranges(spec: &SearchSpec) -> Vec<Vec<&SearchCondition>> {
    if spec.conjunction {
        return Vec::new();
    }
    let mut groups: Vec<(_, Vec<&SearchCondition>)> = Vec::new();
    for c in spec.conditions.iter().filter(|c| c.kind().is_store()) {
        let Some(key) = c.merge_key() else {
            continue;
        };
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, group)) => group.push(c),
            None => groups.push((key, vec![c])),
        }
    }
    groups
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .map(|(_, group)| group)
        .collect()
}

/// The lexicon engine: owns the word graph and everything derived from an
/// import, and answers searches and per-word lookups.
///
/// Searches take `&mut self` because each one replaces the result cache.
/// The graph itself is read-only between imports and can be shared across
/// threads through [`WordEngine::graph`].
pub struct WordEngine {
    config: EngineConfig,
    bag: LetterBag,
    graph: WordGraph,
    index: LexiconIndex,
    definitions: Definitions,
    stems: Stems,
    store: Option<Box<dyn StatsStore>>,
    cache: HashMap<String, WordInfo>,
    lexicon_name: String,
}

impl std::fmt::Debug for WordEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("WordEngine")
            .field("lexicon_name", &self.lexicon_name)
            .field("graph", &self.graph)
            .field("definitions", &self.definitions.len())
            .field("store", &self.store.is_some())
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl WordEngine {
    /// Creates an empty engine. A configured database that cannot be opened
    /// is logged and the engine starts on its in-memory fallback.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let bag = config.letter_bag()?;
        let mut engine = Self {
            bag,
            graph: WordGraph::new(),
            index: LexiconIndex::default(),
            definitions: Definitions::new(),
            stems: Stems::new(),
            store: None,
            cache: HashMap::new(),
            lexicon_name: config.lexicon_name.clone(),
            config,
        };
        if let Some(path) = engine.config.database.clone() {
            if let Err(e) = engine.open_database(&path) {
                log::warn!("statistics store unavailable, using in-memory data: {}", e);
            }
        }
        Ok(engine)
    }

    // ------------------------------------------------------------------
    // Import

    /// Imports a plain-text lexicon, one word per line with an optional
    /// definition after it. The new lexicon replaces the current one only
    /// once the whole source has been read. Returns the number of entries.
    pub fn import_text<R: BufRead>(&mut self, reader: R, lexicon_name: &str, load_definitions: bool) -> Result<usize> {
        self.import_lines(entry_lines(reader), lexicon_name, load_definitions)
    }

    pub fn import_text_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        lexicon_name: &str,
        load_definitions: bool,
    ) -> Result<usize> {
        let source = LineSource::new(path);
        let lines = source.lines()?;
        self.import_lines(lines, lexicon_name, load_definitions)
            .map_err(|e| match e {
                LexiconError::Io(io) => LexiconError::import_io(source.path(), io),
                other => other,
            })
    }

    fn import_lines<I>(&mut self, lines: I, lexicon_name: &str, load_definitions: bool) -> Result<usize>
    where
        I: Iterator<Item = io::Result<String>>,
    {
        let mut words = BTreeSet::new();
        let mut definitions = Definitions::new();
        let mut imported = 0;
        for line in lines {
            let line = line?;
            let (word, definition) = match line.split_once(' ') {
                Some((word, definition)) => (word, Some(definition)),
                None => (line.as_str(), None),
            };
            let word = word.to_uppercase();
            if load_definitions {
                if let Some(definition) = definition {
                    definitions.add(&word, definition);
                }
            }
            words.insert(word);
            imported += 1;
        }

        let mut graph = WordGraph::from_words(words.iter());
        graph.build_reversed();
        self.index = LexiconIndex::build(words.into_iter().collect(), &self.bag);
        self.graph = graph;
        self.definitions = definitions;
        self.lexicon_name = lexicon_name.to_string();
        self.cache.clear();
        log::info!(
            "imported {} entries into lexicon '{}' ({} words, {} definitions)",
            imported,
            self.lexicon_name,
            self.graph.num_words(),
            self.definitions.len()
        );
        Ok(imported)
    }

    /// Imports a compiled graph. A forward graph replaces the lexicon; a
    /// reversed one is only attached and keeps the lexicon name. Nothing
    /// changes when the blob fails validation.
    pub fn import_compiled_graph(
        &mut self,
        bytes: &[u8],
        lexicon_name: &str,
        reversed: bool,
        expected_checksum: Option<u32>,
    ) -> Result<()> {
        let graph = serialization::deserialize_bytes(bytes)?;
        self.install_compiled(graph, lexicon_name, reversed, expected_checksum)
    }

    pub fn import_compiled_graph_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        lexicon_name: &str,
        reversed: bool,
        expected_checksum: Option<u32>,
    ) -> Result<()> {
        let graph: CompiledGraph = serialization::load_from_disk(path)?;
        self.install_compiled(graph, lexicon_name, reversed, expected_checksum)
    }

    fn install_compiled(
        &mut self,
        compiled: CompiledGraph,
        lexicon_name: &str,
        reversed: bool,
        expected_checksum: Option<u32>,
    ) -> Result<()> {
        if reversed {
            self.graph.import_compiled_graph(compiled, true, expected_checksum)?;
            log::info!("attached reversed graph to lexicon '{}'", self.lexicon_name);
            return Ok(());
        }
        let graph = WordGraph::from_compiled_graph(compiled, expected_checksum)?;
        self.index = LexiconIndex::build(graph.words(), &self.bag);
        self.graph = graph;
        self.definitions = Definitions::new();
        self.lexicon_name = lexicon_name.to_string();
        self.cache.clear();
        log::info!(
            "imported compiled lexicon '{}' ({} words)",
            self.lexicon_name,
            self.graph.num_words()
        );
        Ok(())
    }

    /// Writes the forward or reversed graph in compiled form.
    pub fn save_compiled_graph<P: AsRef<Path>>(&self, path: P, reversed: bool) -> Result<()> {
        let graph = self
            .graph
            .compiled(reversed)
            .ok_or_else(|| LexiconError::corrupt("no reversed graph attached"))?;
        serialization::save_to_disk(&graph, path)
    }

    /// Imports a stem list for the stem-based search sets. Returns the
    /// number of stems kept.
    pub fn import_stems<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let source = LineSource::new(path);
        let imported = self
            .stems
            .import(source.lines()?)
            .map_err(|e| LexiconError::import_io(source.path(), e))?;
        log::info!("imported {} stems from {}", imported, source.path().display());
        Ok(imported)
    }

    pub fn import_stems_from<R: BufRead>(&mut self, reader: R) -> Result<usize> {
        Ok(self.stems.import(entry_lines(reader))?)
    }

    // ------------------------------------------------------------------
    // Statistics store

    pub fn open_database<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let store = SqliteStore::open(path)?;
        self.attach_store(Box::new(store));
        Ok(())
    }

    /// Writes a statistics store for the current lexicon and switches to it.
    pub fn create_database<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let store = SqliteStore::create(path, self)?;
        self.attach_store(Box::new(store));
        Ok(())
    }

    pub fn attach_store(&mut self, store: Box<dyn StatsStore>) {
        self.store = Some(store);
        self.cache.clear();
    }

    pub fn detach_store(&mut self) {
        self.store = None;
        self.cache.clear();
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    // ------------------------------------------------------------------
    // Search

    /// Runs a search. Never fails: an empty spec gives no words and store
    /// errors fall back to the in-memory data.
    pub fn search(&mut self, spec: &SearchSpec) -> Vec<String> {
        self.cache.clear();
        if spec.is_empty() {
            return Vec::new();
        }
        let optimized = spec.optimize();
        let plan = QueryPlan::classify(&optimized);
        log::debug!(
            "search plan: {} graph, {} store, {} post conditions",
            plan.graph,
            plan.store.len(),
            plan.post
        );

        let mut results = None;
        if plan.graph > 0 || plan.store.is_empty() {
            let found = self.graph.search(&optimized);
            // A disjunction may still pick up words from its word lists
            if found.is_empty() && (optimized.conjunction || plan.store.is_empty()) {
                return found;
            }
            results = Some(found);
        }

        if !plan.store.is_empty() {
            let within = if plan.graph > 0 { results.as_deref() } else { None };
            let found = self.store_search(&plan.store, optimized.conjunction, within);
            results = Some(found);
        }

        let mut results = results.unwrap_or_default();
        let ranges = disjunctive_ranges(spec);
        if plan.post > 0 || !ranges.is_empty() {
            results.retain(|word| self.matches_post_conditions(word, &optimized.conditions, &ranges));
        }

        if let Some(window) = ProbabilityWindow::from_conditions(&optimized.conditions) {
            results = window.apply(results, &self.bag);
        }

        self.fill_cache(&results);
        results
    }

    fn store_search(&self, conditions: &[SearchCondition], conjunction: bool, within: Option<&[String]>) -> Vec<String> {
        if let Some(store) = &self.store {
            match store.search(conditions, conjunction, within) {
                Ok(words) => return words,
                Err(e) => log::warn!("statistics store failed, searching in memory: {}", e),
            }
        }
        self.memory_search(conditions, conjunction, within)
    }

    /// Evaluates store conditions against the data built at import time.
    fn memory_search(&self, conditions: &[SearchCondition], conjunction: bool, within: Option<&[String]>) -> Vec<String> {
        let mut included = Vec::new();
        let mut excluded = Vec::new();
        for c in conditions {
            if let Condition::InWordList(words) = &c.condition {
                let list = words.iter().map(|w| w.to_uppercase()).collect::<HashSet<_>>();
                if c.negated {
                    excluded.push(list);
                } else {
                    included.push(list);
                }
            }
        }
        let within_set = within.map(|words| words.iter().map(|w| w.as_str()).collect::<HashSet<_>>());

        let universe = match within {
            Some(words) if conjunction || included.is_empty() => words.to_vec(),
            _ => self.graph.words(),
        };
        universe
            .into_iter()
            .filter(|word| {
                let listed = if conjunction || included.is_empty() {
                    included.iter().all(|list| list.contains(word))
                } else {
                    within_set.as_ref().map_or(false, |set| set.contains(word.as_str()))
                        || included.iter().any(|list| list.contains(word))
                };
                listed
                    && excluded.iter().all(|list| !list.contains(word))
                    && conditions
                        .iter()
                        .filter(|c| c.kind() != ConditionKind::InWordList)
                        .all(|c| self.store_condition_holds(word, c))
            })
            .collect()
    }

    fn store_condition_holds(&self, word: &str, c: &SearchCondition) -> bool {
        if let Condition::IncludeLetters(letters) = &c.condition {
            let mut letters = letters.chars().filter(|l| l.is_alphabetic());
            return if c.negated {
                !letters.any(|l| word.contains(l))
            } else {
                letters.all(|l| word.contains(l))
            };
        }
        self.range_holds(word, &c.condition) != c.negated
    }

    fn range_holds(&self, word: &str, condition: &Condition) -> bool {
        match condition {
            Condition::Length(r) => r.contains(util::word_length(word)),
            Condition::NumVowels(r) => r.contains(util::num_vowels(word)),
            Condition::NumUniqueLetters(r) => r.contains(util::num_unique_letters(word)),
            Condition::PointValue(r) => r.contains(self.bag.point_value(word)),
            Condition::NumAnagrams(r) => r.contains(self.index.num_anagrams(word)),
            Condition::ProbabilityOrder { range, lax } => match self.index.rank(word) {
                Some(rank) if *lax => rank.max_order >= range.min && rank.min_order <= range.max,
                Some(rank) => range.contains(rank.order),
                None => false,
            },
            _ => true,
        }
    }

    fn matches_post_conditions(
        &self,
        word: &str,
        conditions: &[SearchCondition],
        ranges: &[Vec<&SearchCondition>],
    ) -> bool {
        for c in conditions {
            let holds = match &c.condition {
                Condition::Prefix(prefix) => self.graph.contains_word(&format!("{}{}", prefix, word)),
                Condition::Suffix(suffix) => self.graph.contains_word(&format!("{}{}", word, suffix)),
                Condition::BelongToGroup(name) => match name.parse::<SearchSet>() {
                    Ok(set) => self.is_set_member(word, set),
                    Err(_) => continue,
                },
                _ => continue,
            };
            if holds == c.negated {
                return false;
            }
        }
        ranges
            .iter()
            .all(|group| group.iter().any(|c| self.range_holds(word, &c.condition)))
    }

    fn fill_cache(&mut self, words: &[String]) {
        let Some(store) = &self.store else {
            return;
        };
        if words.is_empty() {
            return;
        }
        match store.word_infos(words) {
            Ok(infos) => {
                self.cache = infos.into_iter().map(|info| (info.word.clone(), info)).collect();
                log::debug!("cached {} word records", self.cache.len());
            }
            Err(e) => log::warn!("could not cache word records: {}", e),
        }
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    // ------------------------------------------------------------------
    // Per-word lookups

    pub fn is_acceptable(&self, word: &str) -> bool {
        self.graph.contains_word(word)
    }

    pub fn is_set_member(&self, word: &str, set: SearchSet) -> bool {
        let ctx = SetContext {
            graph: &self.graph,
            bag: &self.bag,
            stems: &self.stems,
        };
        ctx.is_member(word, set)
    }

    /// Record from the result cache or the store, if either has one
    fn stored_info(&self, word: &str) -> Option<WordInfo> {
        let upper = word.to_uppercase();
        if let Some(info) = self.cache.get(&upper) {
            log::debug!("cache hit for {}", upper);
            return Some(info.clone());
        }
        let store = self.store.as_ref()?;
        log::debug!("cache miss for {}", upper);
        match store.word_info(&upper) {
            Ok(info) => info,
            Err(e) => {
                log::warn!("statistics store failed, using in-memory data: {}", e);
                None
            }
        }
    }

    /// Statistics of a lexicon word, from the store when it has a row and
    /// derived from the imported data otherwise. `None` for words outside
    /// the lexicon.
    pub fn word_info(&self, word: &str) -> Option<WordInfo> {
        if word.is_empty() {
            return None;
        }
        self.stored_info(word).or_else(|| self.derived_word_info(word))
    }

    /// Statistics computed from the imported data alone
    pub fn derived_word_info(&self, word: &str) -> Option<WordInfo> {
        let upper = word.to_uppercase();
        if !self.graph.contains_word(&upper) {
            return None;
        }
        let rank = *self.index.rank(&upper)?;
        Some(WordInfo {
            probability_order: rank.order,
            min_probability_order: rank.min_order,
            max_probability_order: rank.max_order,
            num_vowels: util::num_vowels(&upper),
            num_unique_letters: util::num_unique_letters(&upper),
            num_anagrams: self.index.num_anagrams(&upper),
            point_value: self.bag.point_value(&upper),
            front_hooks: self.derived_hooks(&upper, true),
            back_hooks: self.derived_hooks(&upper, false),
            definition: self.definitions.text(&upper).unwrap_or_default(),
            word: upper,
        })
    }

    fn derived_hooks(&self, word: &str, front: bool) -> String {
        if word.is_empty() || !word.chars().all(|c| c.is_ascii_alphabetic()) {
            return String::new();
        }
        let pattern = if front {
            format!("?{}", word)
        } else {
            format!("{}?", word)
        };
        let spec = SearchSpec::new().with(Condition::PatternMatch(pattern)).optimize();
        let mut hooks = self
            .graph
            .search(&spec)
            .iter()
            .filter_map(|w| if front { w.chars().next() } else { w.chars().last() })
            .map(|c| c.to_ascii_lowercase())
            .collect::<Vec<_>>();
        hooks.sort_unstable();
        hooks.dedup();
        hooks.into_iter().collect()
    }

    /// Letters that can be put in front of the word, lowercase and sorted
    pub fn front_hooks(&self, word: &str) -> String {
        match self.stored_info(word) {
            Some(info) => info.front_hooks,
            None => self.derived_hooks(&word.to_uppercase(), true),
        }
    }

    /// Letters that can be put after the word, lowercase and sorted
    pub fn back_hooks(&self, word: &str) -> String {
        match self.stored_info(word) {
            Some(info) => info.back_hooks,
            None => self.derived_hooks(&word.to_uppercase(), false),
        }
    }

    pub fn num_anagrams(&self, word: &str) -> u32 {
        match self.stored_info(word) {
            Some(info) => info.num_anagrams,
            None => self.index.num_anagrams(word),
        }
    }

    pub fn probability_order(&self, word: &str) -> Option<u32> {
        match self.stored_info(word) {
            Some(info) => Some(info.probability_order),
            None => self.index.rank(word).map(|r| r.order),
        }
    }

    pub fn min_probability_order(&self, word: &str) -> Option<u32> {
        match self.stored_info(word) {
            Some(info) => Some(info.min_probability_order),
            None => self.index.rank(word).map(|r| r.min_order),
        }
    }

    pub fn max_probability_order(&self, word: &str) -> Option<u32> {
        match self.stored_info(word) {
            Some(info) => Some(info.max_probability_order),
            None => self.index.rank(word).map(|r| r.max_order),
        }
    }

    pub fn num_vowels(&self, word: &str) -> u32 {
        util::num_vowels(&word.to_uppercase())
    }

    pub fn num_unique_letters(&self, word: &str) -> u32 {
        util::num_unique_letters(&word.to_uppercase())
    }

    pub fn point_value(&self, word: &str) -> u32 {
        self.bag.point_value(word)
    }

    /// Distinct alphagrams of the given words, sorted
    pub fn alphagrams<S: AsRef<str>>(&self, words: &[S]) -> Vec<String> {
        words
            .iter()
            .map(|w| util::alphagram(&w.as_ref().to_uppercase()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Definition of a word. Senses are joined with " / ", or expanded and
    /// put one per line when `resolve` is set.
    pub fn get_definition(&self, word: &str, resolve: bool) -> Option<String> {
        let depth = self.config.max_definition_depth;
        let stored = self
            .stored_info(word)
            .map(|info| info.definition)
            .filter(|d| !d.is_empty());
        let senses = match stored {
            Some(definition) => definition
                .split(SENSE_SEPARATOR)
                .map(|s| s.to_string())
                .collect::<Vec<_>>(),
            None => self
                .definitions
                .senses(word)?
                .iter()
                .map(|s| s.text.clone())
                .collect(),
        };
        if resolve {
            Some(
                senses
                    .iter()
                    .map(|s| resolve_links(s, depth, self))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        } else {
            Some(senses.join(SENSE_SEPARATOR))
        }
    }

    // ------------------------------------------------------------------
    // Accessors

    pub fn graph(&self) -> &WordGraph {
        &self.graph
    }

    pub fn bag(&self) -> &LetterBag {
        &self.bag
    }

    pub fn stems(&self) -> &Stems {
        &self.stems
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn lexicon_name(&self) -> &str {
        &self.lexicon_name
    }

    pub fn num_words(&self) -> usize {
        self.graph.num_words()
    }
}

impl DefinitionSource for WordEngine {
    fn definition_text(&self, word: &str) -> Option<String> {
        self.stored_info(word)
            .map(|info| info.definition)
            .filter(|d| !d.is_empty())
            .or_else(|| self.definitions.text(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::search_spec::Range;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Serves fixed rows and counts how often the engine fetches them
    struct CountingStore {
        rows: Vec<WordInfo>,
        fetches: Rc<Cell<usize>>,
    }

    impl StatsStore for CountingStore {
        fn search(&self, _: &[SearchCondition], _: bool, _: Option<&[String]>) -> Result<Vec<String>> {
            Err(LexiconError::store("searches are not served"))
        }

        fn word_infos(&self, words: &[String]) -> Result<Vec<WordInfo>> {
            self.fetches.set(self.fetches.get() + 1);
            Ok(self
                .rows
                .iter()
                .filter(|row| words.contains(&row.word))
                .cloned()
                .collect())
        }

        fn num_words(&self) -> Result<usize> {
            Ok(self.rows.len())
        }
    }

    const LEXICON: &str = "\
# test lexicon
CAT a small feline [n CATS] / to vomit [v CATTED, CATTING, CATS]
ACT to do something [v ACTED]
TAC
CATS
SCAT to leave hastily [v SCATTED]
KITTEN a young {cat=n} [n KITTENS]

QI
DOG
";

    fn engine() -> WordEngine {
        let mut engine = WordEngine::new(EngineConfig::default()).unwrap();
        let count = engine.import_text(LEXICON.as_bytes(), "Test", true).unwrap();
        assert_eq!(count, 8);
        engine
    }

    fn words(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_import_builds_everything() {
        let e = engine();
        assert_eq!(e.lexicon_name(), "Test");
        assert_eq!(e.num_words(), 8);
        assert!(e.is_acceptable("kitten"));
        assert!(!e.is_acceptable("test"));
        assert_eq!(e.num_anagrams("CAT"), 3);
        assert!(e.graph().has_reversed());
    }

    #[test]
    fn test_empty_spec_is_empty() {
        let mut e = engine();
        assert!(e.search(&SearchSpec::new()).is_empty());
    }

    #[test]
    fn test_graph_and_memory_conditions() {
        let mut e = engine();
        let spec = SearchSpec::new()
            .with(Condition::PatternMatch("?A?".into()))
            .with(Condition::IncludeLetters("T".into()));
        assert_eq!(e.search(&spec), words(&["CAT", "TAC"]));

        let spec = SearchSpec::new()
            .with(Condition::NumAnagrams(Range::exactly(3)))
            .with(SearchCondition::new(Condition::InWordList(words(&["act"]))).negated());
        assert_eq!(e.search(&spec), words(&["CAT", "TAC"]));
    }

    #[test]
    fn test_prefix_suffix_and_groups() {
        let mut e = engine();
        let spec = SearchSpec::new()
            .with(Condition::Length(Range::exactly(3)))
            .with(Condition::Suffix("s".into()));
        assert_eq!(e.search(&spec), words(&["CAT"]));

        let spec = SearchSpec::new()
            .with(Condition::PatternMatch("CAT*".into()))
            .with(Condition::Prefix("S".into()));
        assert_eq!(e.search(&spec), words(&["CAT"]));

        let spec = SearchSpec::new()
            .with(Condition::Length(Range::exactly(4)))
            .with(SearchCondition::new(Condition::BelongToGroup("Front Hooks".into())).negated());
        assert_eq!(e.search(&spec), words(&["CATS"]));

        // unknown set names are ignored
        let spec = SearchSpec::new()
            .with(Condition::Length(Range::exactly(2)))
            .with(Condition::BelongToGroup("No Such Set".into()));
        assert_eq!(e.search(&spec), words(&["QI"]));
    }

    #[test]
    fn test_disjunction_rechecks_original_ranges() {
        let mut e = engine();
        let spec = SearchSpec::any_of()
            .with(Condition::Length(Range::exactly(2)))
            .with(Condition::Length(Range::exactly(4)));
        assert_eq!(e.search(&spec), words(&["CATS", "QI", "SCAT"]));
    }

    #[test]
    fn test_disjunction_keeps_caller_length() {
        let mut e = WordEngine::new(EngineConfig::default()).unwrap();
        e.import_text("CAT\nHORSE\n".as_bytes(), "Mixed", false).unwrap();
        let spec = SearchSpec::any_of()
            .with(Condition::Length(Range::exactly(5)))
            .with(Condition::PatternMatch("C?T".into()));
        assert!(e.search(&spec).is_empty());

        let spec = SearchSpec::any_of()
            .with(Condition::Length(Range::new(3, 5)))
            .with(Condition::PatternMatch("C?T".into()));
        assert_eq!(e.search(&spec), words(&["CAT"]));

        let spec = SearchSpec::any_of().with(Condition::Length(Range::exactly(5)));
        assert_eq!(e.search(&spec), words(&["HORSE"]));
    }

    #[test]
    fn test_long_rack_queries() {
        let mut e = engine();
        let spec = SearchSpec::new().with(Condition::AnagramMatch("A".repeat(256)));
        assert!(e.search(&spec).is_empty());

        let query = format!("{}{}", "?".repeat(256), "A".repeat(300));
        let spec = SearchSpec::new().with(Condition::SubanagramMatch(query));
        assert_eq!(
            e.search(&spec),
            words(&["ACT", "CAT", "CATS", "DOG", "KITTEN", "QI", "SCAT", "TAC"])
        );
    }

    #[test]
    fn test_each_search_replaces_the_cache() {
        let mut e = engine();
        let fetches = Rc::new(Cell::new(0));
        let rows = ["CAT", "ACT"]
            .iter()
            .filter_map(|w| e.derived_word_info(w))
            .collect();
        e.attach_store(Box::new(CountingStore {
            rows,
            fetches: fetches.clone(),
        }));

        let hit = SearchSpec::new().with(Condition::PatternMatch("CAT".into()));
        assert_eq!(e.search(&hit), words(&["CAT"]));
        assert_eq!(fetches.get(), 1);
        assert_eq!(e.num_anagrams("CAT"), 3);
        assert_eq!(fetches.get(), 1);

        let miss = SearchSpec::new().with(Condition::PatternMatch("ZZZ".into()));
        assert!(e.search(&miss).is_empty());
        assert_eq!(fetches.get(), 1);

        // CAT is no longer cached, so the store is asked again
        assert_eq!(e.num_anagrams("CAT"), 3);
        assert_eq!(fetches.get(), 2);
    }

    #[test]
    fn test_disjunction_with_word_list() {
        let mut e = engine();
        let spec = SearchSpec::any_of()
            .with(Condition::AnagramMatch("GOD".into()))
            .with(Condition::InWordList(words(&["QI", "ZZZ"])));
        assert_eq!(e.search(&spec), words(&["DOG", "QI"]));
    }

    #[test]
    fn test_probability_window_keeps_anagram_ties() {
        let mut e = engine();
        let spec = SearchSpec::new()
            .with(Condition::AnagramMatch("CAT".into()))
            .with(Condition::LimitByProbabilityOrder {
                range: Range::new(1, 1),
                lax: true,
            });
        let mut found = e.search(&spec);
        found.sort();
        assert_eq!(found, words(&["ACT", "CAT", "TAC"]));
    }

    #[test]
    fn test_word_info_and_hooks() {
        let e = engine();
        let info = e.word_info("cat").unwrap();
        assert_eq!(info.word, "CAT");
        assert_eq!(info.back_hooks, "s");
        assert_eq!(info.front_hooks, "s");
        assert_eq!(info.num_anagrams, 3);
        assert_eq!(
            (info.min_probability_order, info.max_probability_order),
            (e.min_probability_order("TAC").unwrap(), e.max_probability_order("ACT").unwrap())
        );
        assert!(e.word_info("ZZZ").is_none());
        assert!(e.word_info("").is_none());
        assert_eq!(e.front_hooks("AT"), "c");
        assert_eq!(e.alphagrams(&["CAT", "act", "DOG"]), words(&["ACT", "DGO"]));
    }

    #[test]
    fn test_definitions() {
        let e = engine();
        assert_eq!(
            e.get_definition("CAT", false).unwrap(),
            "a small feline [n CATS] / to vomit [v CATTED, CATTING, CATS]"
        );
        assert_eq!(
            e.get_definition("CAT", true).unwrap(),
            "a small feline [n CATS]\nto vomit [v CATTED, CATTING, CATS]"
        );
        assert_eq!(
            e.get_definition("kitten", true).unwrap(),
            "a young cat (a small feline) [n KITTENS]"
        );
        assert!(e.get_definition("TAC", false).is_none());
    }

    #[test]
    fn test_failed_imports_keep_state() {
        let mut e = engine();
        assert!(matches!(
            e.import_text_file("/no/such/lexicon.txt", "Gone", false),
            Err(LexiconError::ImportIo { .. })
        ));
        assert!(matches!(
            e.import_compiled_graph(&[1, 2, 3], "Gone", false, None),
            Err(LexiconError::CorruptData(_))
        ));
        assert_eq!(e.lexicon_name(), "Test");
        assert!(e.is_acceptable("CAT"));
    }

    #[test]
    fn test_compiled_graph_files() {
        let dir = tempfile::tempdir().unwrap();
        let forward = dir.path().join("lexicon.lxg");
        let reversed = dir.path().join("lexicon-rev.lxg");
        let source = engine();
        source.save_compiled_graph(&forward, false).unwrap();
        source.save_compiled_graph(&reversed, true).unwrap();

        let mut e = WordEngine::new(EngineConfig::default()).unwrap();
        e.import_compiled_graph_file(&forward, "Compiled", false, None).unwrap();
        e.import_compiled_graph_file(&reversed, "Ignored", true, None).unwrap();
        assert_eq!(e.lexicon_name(), "Compiled");
        assert_eq!(e.num_anagrams("CAT"), 3);
        let spec = SearchSpec::new().with(Condition::PatternMatch("*AT".into()));
        assert_eq!(e.search(&spec), words(&["CAT", "SCAT"]));
    }

    #[test]
    fn test_stems_feed_search_sets() {
        let mut e = engine();
        assert_eq!(e.import_stems_from("CA\nQI\nDOG\n".as_bytes()).unwrap(), 2);
        assert_eq!(e.stems().stems(2).len(), 2);
        assert!(e.is_set_member("CATS", SearchSet::BackHooks));
    }
}
