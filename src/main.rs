use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
#[macro_use]
extern crate text_io;

use lexisearch::config::EngineConfig;
use lexisearch::lexicon::{Condition, Result, SearchSpec, WordEngine};

/// Interactive word list search
#[derive(Parser, Debug)]
#[command(name = "lexisearch")]
#[command(about = "Search a word list by pattern, anagram and probability")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Engine settings (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Plain-text lexicon, one word per line with an optional definition
    #[arg(short, long)]
    lexicon: Option<PathBuf>,

    /// Name given to the imported lexicon
    #[arg(long)]
    name: Option<String>,

    /// Stem list for the Type I search sets (repeatable)
    #[arg(long)]
    stems: Vec<PathBuf>,

    /// Compiled word graph to load instead of a text lexicon
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Compiled reversed word graph
    #[arg(long)]
    reversed_graph: Option<PathBuf>,

    /// Statistics database to search against
    #[arg(long)]
    database: Option<PathBuf>,

    /// Write a statistics database for the loaded lexicon and use it
    #[arg(long)]
    create_database: Option<PathBuf>,
}

const HELP: &str = "\
commands:
  check WORD        is the word valid
  anagram LETTERS   anagrams, ? is a blank, * allows extra letters
  subanagram LETTERS
  pattern PATTERN   ? any letter, * any run, [AEI] or [^AEI] a class
  consist LETTERS   words made only of these letters
  info WORD         statistics of a word
  define WORD       definition with links expanded
  hooks WORD        front and back hook letters
  rack N            draw N random tiles
  json SPEC         run a full search spec
  quit";

fn single(condition: Condition) -> SearchSpec {
    SearchSpec::new().with(condition)
}

fn print_words(words: Vec<String>) {
    println!("{}", words.join(" "));
    println!("({} words)", words.len());
}

fn load(args: Args) -> Result<WordEngine> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if args.database.is_some() {
        config.database = args.database.clone();
    }
    let mut engine = WordEngine::new(config)?;
    let name = args
        .name
        .clone()
        .unwrap_or_else(|| engine.config().lexicon_name.clone());

    if let Some(path) = &args.lexicon {
        engine.import_text_file(path, &name, true)?;
    }
    if let Some(path) = &args.graph {
        engine.import_compiled_graph_file(path, &name, false, None)?;
    }
    if let Some(path) = &args.reversed_graph {
        engine.import_compiled_graph_file(path, &name, true, None)?;
    }
    for path in args.stems.iter() {
        engine.import_stems(path)?;
    }
    if let Some(path) = &args.create_database {
        engine.create_database(path)?;
    }
    Ok(engine)
}

fn repl(engine: &mut WordEngine) {
    let mut rng = rand::thread_rng();
    println!("{} words loaded from '{}'", engine.num_words(), engine.lexicon_name());
    loop {
        print!("> ");
        io::stdout().flush().ok();
        let line: String = match try_read!("{}\n") {
            Ok(line) => line,
            Err(_) => break,
        };
        let line = line.trim();
        let (command, arg) = match line.split_once(' ') {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        match command {
            "" => continue,
            "quit" | "exit" => break,
            "help" => println!("{}", HELP),
            "check" => {
                let verdict = if engine.is_acceptable(arg) { "valid" } else { "invalid" };
                println!("{} is {}", arg.to_uppercase(), verdict);
            }
            "anagram" => print_words(engine.search(&single(Condition::AnagramMatch(arg.into())))),
            "subanagram" => print_words(engine.search(&single(Condition::SubanagramMatch(arg.into())))),
            "pattern" => print_words(engine.search(&single(Condition::PatternMatch(arg.into())))),
            "consist" => print_words(engine.search(&single(Condition::ConsistOf(arg.into())))),
            "info" => match engine.word_info(arg) {
                Some(info) => match serde_json::to_string_pretty(&info) {
                    Ok(json) => println!("{}", json),
                    Err(e) => println!("{}", e),
                },
                None => println!("{} is not in the lexicon", arg.to_uppercase()),
            },
            "define" => match engine.get_definition(arg, true) {
                Some(definition) => println!("{}", definition),
                None => println!("no definition for {}", arg.to_uppercase()),
            },
            "hooks" => println!(
                "{} {} {}",
                engine.front_hooks(arg),
                arg.to_uppercase(),
                engine.back_hooks(arg)
            ),
            "rack" => {
                let n = arg.parse::<usize>().unwrap_or(7);
                println!("{}", engine.bag().draw_rack(n, &mut rng));
            }
            "json" => match serde_json::from_str::<SearchSpec>(arg) {
                Ok(spec) => print_words(engine.search(&spec)),
                Err(e) => println!("invalid search spec: {}", e),
            },
            other => println!("unknown command '{}', try help", other),
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    match load(args) {
        Ok(mut engine) => repl(&mut engine),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
