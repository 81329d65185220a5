use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection, QueryBuilder};
use tokio::runtime::Runtime;

use super::engine::WordEngine;
use super::error::{LexiconError, Result};
use super::search_spec::{Condition, SearchCondition};
use super::util::{alphagram, word_length};

/// Words bound per statement when fetching rows by word
const FETCH_CHUNK: usize = 500;

/// Precomputed statistics of one word
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct WordInfo {
    pub word: String,
    pub probability_order: u32,
    pub min_probability_order: u32,
    pub max_probability_order: u32,
    pub num_vowels: u32,
    pub num_unique_letters: u32,
    pub num_anagrams: u32,
    pub point_value: u32,
    pub front_hooks: String,
    pub back_hooks: String,
    pub definition: String,
}

/// Backing store of per-word statistics.
///
/// The engine only ever sees this trait, so a store may be swapped out or
/// missing entirely; any error makes the engine fall back to the in-memory
/// derivations for that call.
pub trait StatsStore {
    /// Words satisfying the store-amenable conditions. When `within` is set,
    /// results are limited to those words (unioned with the InWordList
    /// conditions instead when `conjunction` is false).
    fn search(&self, conditions: &[SearchCondition], conjunction: bool, within: Option<&[String]>) -> Result<Vec<String>>;

    /// Rows for the given words, skipping words the store does not know
    fn word_infos(&self, words: &[String]) -> Result<Vec<WordInfo>>;

    fn word_info(&self, word: &str) -> Result<Option<WordInfo>> {
        let mut infos = self.word_infos(&[word.to_uppercase()])?;
        Ok(infos.pop())
    }

    fn num_words(&self) -> Result<usize>;
}

const SCHEMA: [&str; 5] = [
    "DROP TABLE IF EXISTS words",
    "CREATE TABLE words (word TEXT PRIMARY KEY, length INTEGER NOT NULL, \
     alphagram TEXT NOT NULL, probability_order INTEGER NOT NULL, \
     min_probability_order INTEGER NOT NULL, max_probability_order INTEGER NOT NULL, \
     num_vowels INTEGER NOT NULL, num_unique_letters INTEGER NOT NULL, \
     num_anagrams INTEGER NOT NULL, point_value INTEGER NOT NULL, \
     front_hooks TEXT NOT NULL, back_hooks TEXT NOT NULL, definition TEXT NOT NULL)",
    "CREATE INDEX words_length ON words (length)",
    "CREATE INDEX words_alphagram ON words (alphagram)",
    "CREATE INDEX words_probability_order ON words (probability_order)",
];

/// Statistics store in a SQLite file, reached through sqlx.
///
/// The engine is synchronous, so every operation runs on a private
/// current-thread runtime and opens its own connection, which is closed
/// again before the call returns.
pub struct SqliteStore {
    path: PathBuf,
    runtime: Runtime,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("SqliteStore").field("path", &self.path).finish()
    }
}

fn runtime() -> Result<Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread().enable_all().build()?)
}

fn column(condition: &Condition) -> Option<&'static str> {
    match condition {
        Condition::Length(_) => Some("length"),
        Condition::NumVowels(_) => Some("num_vowels"),
        Condition::NumUniqueLetters(_) => Some("num_unique_letters"),
        Condition::PointValue(_) => Some("point_value"),
        Condition::NumAnagrams(_) => Some("num_anagrams"),
        _ => None,
    }
}

/// Appends the SQL predicate for one store condition
fn push_condition(query: &mut QueryBuilder<'_, Sqlite>, c: &SearchCondition, list_id: Option<i64>) {
    if c.negated {
        query.push("NOT ");
    }
    match &c.condition {
        Condition::ProbabilityOrder { range, lax: true } => {
            query
                .push("(max_probability_order >= ")
                .push_bind(i64::from(range.min))
                .push(" AND min_probability_order <= ")
                .push_bind(i64::from(range.max))
                .push(")");
        }
        Condition::ProbabilityOrder { range, lax: false } => {
            query
                .push("(probability_order BETWEEN ")
                .push_bind(i64::from(range.min))
                .push(" AND ")
                .push_bind(i64::from(range.max))
                .push(")");
        }
        Condition::IncludeLetters(letters) => {
            // Negated means none of the letters, so the positive form is "any"
            let joiner = if c.negated { " OR " } else { " AND " };
            query.push("(");
            let mut first = true;
            for letter in letters.chars().filter(|c| c.is_alphabetic()) {
                if !first {
                    query.push(joiner);
                }
                first = false;
                query.push("instr(word, ").push_bind(letter.to_string()).push(") > 0");
            }
            if first {
                query.push("1");
            }
            query.push(")");
        }
        Condition::InWordList(_) => {
            query
                .push("(word IN (SELECT word FROM query_lists WHERE list = ")
                .push_bind(list_id.unwrap_or_default())
                .push("))");
        }
        other => match (column(other), other.range()) {
            (Some(col), Some(range)) => {
                query
                    .push(format!("({} BETWEEN ", col))
                    .push_bind(i64::from(range.min))
                    .push(" AND ")
                    .push_bind(i64::from(range.max))
                    .push(")");
            }
            _ => {
                query.push("(1)");
            }
        },
    }
}

impl SqliteStore {
    /// Opens an existing statistics file. Fails when the file is missing or
    /// has no words table.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(LexiconError::import_io(
                &path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such database"),
            ));
        }
        let store = Self {
            path,
            runtime: runtime()?,
        };
        let count = store
            .num_words()
            .map_err(|e| LexiconError::store(format!("{} is not a statistics store: {}", store.path.display(), e)))?;
        log::info!("opened statistics store {} ({} words)", store.path.display(), count);
        Ok(store)
    }

    /// Writes the statistics of every word in the engine's lexicon to a new
    /// store at `path`, replacing any existing words table.
    pub fn create<P: AsRef<Path>>(path: P, engine: &WordEngine) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            runtime: runtime()?,
        };
        let infos = engine
            .graph()
            .words()
            .iter()
            .filter_map(|w| engine.derived_word_info(w))
            .collect::<Vec<_>>();

        store.runtime.block_on(async {
            let mut conn = store.connect(true).await?;
            let mut tx = conn.begin().await?;
            for statement in SCHEMA {
                sqlx::query(statement).execute(&mut *tx).await?;
            }
            for info in infos.iter() {
                sqlx::query(
                    "INSERT INTO words (word, length, alphagram, probability_order, \
                     min_probability_order, max_probability_order, num_vowels, \
                     num_unique_letters, num_anagrams, point_value, front_hooks, \
                     back_hooks, definition) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&info.word)
                .bind(i64::from(word_length(&info.word)))
                .bind(alphagram(&info.word))
                .bind(i64::from(info.probability_order))
                .bind(i64::from(info.min_probability_order))
                .bind(i64::from(info.max_probability_order))
                .bind(i64::from(info.num_vowels))
                .bind(i64::from(info.num_unique_letters))
                .bind(i64::from(info.num_anagrams))
                .bind(i64::from(info.point_value))
                .bind(&info.front_hooks)
                .bind(&info.back_hooks)
                .bind(&info.definition)
                .execute(&mut *tx)
                .await?;
            }
            tx.commit().await?;
            conn.close().await?;
            Ok::<_, LexiconError>(())
        })?;

        log::info!("created statistics store {} with {} words", store.path.display(), infos.len());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn connect(&self, create: bool) -> Result<SqliteConnection> {
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(create);
        Ok(options.connect().await?)
    }

    async fn search_async(
        &self,
        conditions: &[SearchCondition],
        conjunction: bool,
        within: Option<&[String]>,
    ) -> Result<Vec<String>> {
        let mut conn = self.connect(false).await?;

        // Word lists go into a temporary table instead of the statement text
        sqlx::query("CREATE TEMP TABLE IF NOT EXISTS query_lists (list INTEGER NOT NULL, word TEXT NOT NULL)")
            .execute(&mut conn)
            .await?;
        let mut lists: Vec<(i64, &[String])> = Vec::new();
        if let Some(words) = within {
            lists.push((0, words));
        }
        for (i, c) in conditions.iter().enumerate() {
            if let Condition::InWordList(words) = &c.condition {
                lists.push((i as i64 + 1, words.as_slice()));
            }
        }
        let mut tx = conn.begin().await?;
        for (id, words) in lists.iter() {
            for word in words.iter() {
                sqlx::query("INSERT INTO query_lists (list, word) VALUES (?, ?)")
                    .bind(*id)
                    .bind(word.to_uppercase())
                    .execute(&mut *tx)
                    .await?;
            }
        }
        tx.commit().await?;

        let mut query = QueryBuilder::<Sqlite>::new("SELECT word FROM words WHERE 1");
        let mut alternatives = Vec::new();
        if within.is_some() {
            alternatives.push(0);
        }
        for (i, c) in conditions.iter().enumerate() {
            let list_id = i as i64 + 1;
            let is_list = matches!(c.condition, Condition::InWordList(_));
            if is_list && !conjunction && !c.negated {
                alternatives.push(list_id);
                continue;
            }
            query.push(" AND ");
            push_condition(&mut query, c, Some(list_id));
        }
        if conjunction {
            if within.is_some() {
                query.push(" AND word IN (SELECT word FROM query_lists WHERE list = 0)");
            }
        } else if !alternatives.is_empty() {
            query.push(" AND word IN (SELECT word FROM query_lists WHERE list IN (");
            let mut ids = query.separated(", ");
            for id in alternatives {
                ids.push_bind(id);
            }
            query.push("))");
        }
        query.push(" ORDER BY word");

        let words: Vec<String> = query.build_query_scalar().fetch_all(&mut conn).await?;
        conn.close().await?;
        Ok(words)
    }

    async fn word_infos_async(&self, words: &[String]) -> Result<Vec<WordInfo>> {
        let mut conn = self.connect(false).await?;
        let mut infos = Vec::with_capacity(words.len());
        for chunk in words.chunks(FETCH_CHUNK) {
            let mut query = QueryBuilder::<Sqlite>::new(
                "SELECT word, probability_order, min_probability_order, max_probability_order, \
                 num_vowels, num_unique_letters, num_anagrams, point_value, front_hooks, \
                 back_hooks, definition FROM words WHERE word IN (",
            );
            let mut bound = query.separated(", ");
            for word in chunk {
                bound.push_bind(word.to_uppercase());
            }
            query.push(")");
            let rows: Vec<WordInfo> = query.build_query_as().fetch_all(&mut conn).await?;
            infos.extend(rows);
        }
        conn.close().await?;
        Ok(infos)
    }
}

impl StatsStore for SqliteStore {
    fn search(&self, conditions: &[SearchCondition], conjunction: bool, within: Option<&[String]>) -> Result<Vec<String>> {
        self.runtime
            .block_on(self.search_async(conditions, conjunction, within))
    }

    fn word_infos(&self, words: &[String]) -> Result<Vec<WordInfo>> {
        if words.is_empty() {
            return Ok(Vec::new());
        }
        self.runtime.block_on(self.word_infos_async(words))
    }

    fn num_words(&self) -> Result<usize> {
        self.runtime.block_on(async {
            let mut conn = self.connect(false).await?;
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM words")
                .fetch_one(&mut conn)
                .await?;
            conn.close().await?;
            Ok::<_, LexiconError>(count.max(0) as usize)
        })
    }
}
