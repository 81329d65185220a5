use std::io::Write;

use lexisearch::config::EngineConfig;
use lexisearch::lexicon::bag::LetterBag;
use lexisearch::lexicon::util::alphagram;
use lexisearch::lexicon::{Condition, Range, SearchCondition, SearchSpec, WordEngine};

fn engine_with(text: &str) -> WordEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut engine = WordEngine::new(EngineConfig::default()).unwrap();
    engine.import_text(text.as_bytes(), "Scenario", true).unwrap();
    engine
}

fn sorted(mut words: Vec<String>) -> Vec<String> {
    words.sort();
    words
}

#[test]
fn anagram_search_and_degraded_counts() {
    let mut engine = engine_with("CAT some definition\nACT other definition\nTAC third\n");
    let found = engine.search(&SearchSpec::new().with(Condition::AnagramMatch("CAT".into())));
    assert_eq!(sorted(found), vec!["ACT", "CAT", "TAC"]);
    assert!(!engine.has_store());
    assert_eq!(engine.num_anagrams("CAT"), 3);
}

#[test]
fn pattern_search() {
    let mut engine = engine_with("CAT\nCOT\nCUT\nDOG\n");
    let found = engine.search(&SearchSpec::new().with(Condition::PatternMatch("C?T".into())));
    assert_eq!(found, vec!["CAT", "COT", "CUT"]);
}

#[test]
fn stem_import_keeps_first_length() {
    let mut engine = engine_with("CAT\n");
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "ACE\nBCE\nWXYZ").unwrap();
    assert_eq!(engine.import_stems(file.path()).unwrap(), 2);
    assert_eq!(engine.stems().stems(3), &["ACE".to_string(), "BCE".to_string()]);
    assert!(engine.stems().stems(4).is_empty());
}

#[test]
fn alphagram_ignores_letter_order() {
    for (a, b) in [("LISTEN", "SILENT"), ("ENLIST", "TINSEL"), ("Q", "Q")] {
        assert_eq!(alphagram(a), alphagram(b));
    }
}

#[test]
fn probability_window_never_splits_ties() {
    // AB and BA tie, as do CD and DC; EF is rarest
    let bag = "A:2 B:2 C:3 D:3 E:1 F:1";
    let config = EngineConfig {
        letter_distribution: bag.to_string(),
        ..EngineConfig::default()
    };
    let mut engine = WordEngine::new(config).unwrap();
    engine.import_text("AB\nBA\nCD\nDC\nEF\n".as_bytes(), "Ties", false).unwrap();
    let combinations = LetterBag::from_spec(bag).unwrap();
    assert_eq!(combinations.get_num_combinations("AB"), combinations.get_num_combinations("BA"));

    for (min, max) in [(1, 1), (1, 2), (2, 2), (2, 3), (3, 3), (3, 4), (4, 5), (5, 5)] {
        let spec = SearchSpec::new()
            .with(Condition::Length(Range::exactly(2)))
            .with(Condition::LimitByProbabilityOrder {
                range: Range::new(min, max),
                lax: true,
            });
        let found = engine.search(&spec);
        for pair in [["AB", "BA"], ["CD", "DC"]] {
            let hits = pair.iter().filter(|w| found.iter().any(|f| f == *w)).count();
            assert!(hits == 0 || hits == 2, "window {}..={} split {:?}: {:?}", min, max, pair, found);
        }
    }
}

#[test]
fn legacy_flag_orders_ties_by_word() {
    let config = EngineConfig {
        letter_distribution: "A:1 B:1 C:1 D:1".into(),
        ..EngineConfig::default()
    };
    let mut flat = WordEngine::new(config).unwrap();
    flat.import_text("DA\nBC\n".as_bytes(), "Flat", false).unwrap();
    let window = |legacy: bool| {
        let limit = SearchCondition::new(Condition::LimitByProbabilityOrder {
            range: Range::new(1, 2),
            lax: false,
        });
        SearchSpec::new()
            .with(Condition::Length(Range::exactly(2)))
            .with(if legacy { limit.legacy() } else { limit })
    };
    assert_eq!(flat.search(&window(false)), vec!["DA", "BC"]);
    assert_eq!(flat.search(&window(true)), vec!["BC", "DA"]);
}

#[test]
fn self_referential_definitions_terminate() {
    let engine = engine_with("LOOP see {loop=n} [n LOOPS]\nEVER <ever=n> [n EVERS]\n");
    let looped = engine.get_definition("LOOP", true).unwrap();
    assert!(looped.contains("LOOP"));
    assert!(!looped.contains('{'));
    let ever = engine.get_definition("EVER", true).unwrap();
    assert!(!ever.contains('<'));
}

#[test]
fn store_backed_search_matches_memory() {
    let text = "CAT a small feline [n CATS]\nACT\nTAC\nCATS\nSCAT\nDOG\nQI\nZA\n";
    let mut engine = engine_with(text);
    let specs = vec![
        SearchSpec::new().with(Condition::NumAnagrams(Range::exactly(3))),
        SearchSpec::new()
            .with(Condition::PatternMatch("?A?".into()))
            .with(Condition::PointValue(Range::new(5, 12))),
        SearchSpec::new()
            .with(Condition::Length(Range::new(2, 3)))
            .with(Condition::IncludeLetters("A".into())),
        SearchSpec::new().with(Condition::ProbabilityOrder {
            range: Range::new(1, 3),
            lax: true,
        }),
        SearchSpec::any_of()
            .with(Condition::AnagramMatch("GOD".into()))
            .with(Condition::InWordList(vec!["ZA".into(), "QI".into()])),
    ];
    let in_memory = specs.iter().map(|s| engine.search(s)).collect::<Vec<_>>();

    let dir = tempfile::tempdir().unwrap();
    engine.create_database(dir.path().join("stats.db")).unwrap();
    assert!(engine.has_store());
    for (spec, expected) in specs.iter().zip(in_memory) {
        assert_eq!(engine.search(spec), expected, "{:?}", spec);
    }

    // results of the last search are cached and served from the store
    engine.search(&SearchSpec::new().with(Condition::PatternMatch("CAT".into())));
    let info = engine.word_info("CAT").unwrap();
    assert_eq!(info.definition, "a small feline [n CATS]");
    assert_eq!(info.back_hooks, "s");
    assert_eq!(info.front_hooks, "s");
    assert_eq!(engine.get_definition("cat", false).unwrap(), "a small feline [n CATS]");
}

#[test]
fn broken_database_degrades_to_memory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.db");
    std::fs::write(&path, b"this is not sqlite").unwrap();
    let config = EngineConfig {
        database: Some(path),
        ..EngineConfig::default()
    };
    let mut engine = WordEngine::new(config).unwrap();
    assert!(!engine.has_store());
    engine.import_text("CAT\nACT\n".as_bytes(), "Degraded", false).unwrap();
    let found = engine.search(&SearchSpec::new().with(Condition::NumAnagrams(Range::exactly(2))));
    assert_eq!(found, vec!["ACT", "CAT"]);
}
