pub mod bag;
pub mod definition;
pub mod engine;
pub mod error;
pub mod index;
pub mod letter_set;
pub mod probability;
pub mod rack;
pub mod search_set;
pub mod search_spec;
pub mod store;
pub mod util;
pub mod word_graph;
pub mod word_search;

pub use self::bag::LetterBag;
pub use self::engine::WordEngine;
pub use self::error::{LexiconError, Result};
pub use self::search_set::SearchSet;
pub use self::search_spec::{Condition, Range, SearchCondition, SearchSpec};
pub use self::store::{SqliteStore, StatsStore, WordInfo};
pub use self::word_graph::WordGraph;
