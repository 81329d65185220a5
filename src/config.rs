use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::lexicon::bag::{LetterBag, DEFAULT_DISTRIBUTION};
use crate::lexicon::definition::MAX_DEFINITION_LINKS;
use crate::lexicon::error::{LexiconError, Result};

/// Engine settings, read from a JSON file such as
///
/// ```json
/// { "letter_distribution": "A:9 B:2 ... _:2", "database": "twl.db" }
/// ```
///
/// Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub letter_distribution: String,
    /// Tile values, same format as the distribution
    pub letter_values: Option<String>,
    /// How many definition links are followed before giving up
    pub max_definition_depth: usize,
    /// Statistics store; without one the engine runs on in-memory data
    pub database: Option<PathBuf>,
    pub lexicon_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            letter_distribution: DEFAULT_DISTRIBUTION.to_string(),
            letter_values: None,
            max_definition_depth: MAX_DEFINITION_LINKS,
            database: None,
            lexicon_name: "Custom".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path.as_ref()).map_err(|e| LexiconError::import_io(path.as_ref(), e))?;
        let mut data = String::new();
        file.read_to_string(&mut data)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(data)?;
        if config.max_definition_depth > 16 {
            return Err(LexiconError::config(format!(
                "max_definition_depth {} is too deep",
                config.max_definition_depth
            )));
        }
        Ok(config)
    }

    /// The tile supply the engine ranks words against
    pub fn letter_bag(&self) -> Result<LetterBag> {
        let bag = LetterBag::from_spec(&self.letter_distribution)?;
        match &self.letter_values {
            Some(values) => bag.with_values(values),
            None => Ok(bag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = EngineConfig::from_json(r#"{ "lexicon_name": "TWL06" }"#).unwrap();
        assert_eq!(config.lexicon_name, "TWL06");
        assert_eq!(config.max_definition_depth, 3);
        assert!(config.database.is_none());
        assert_eq!(config.letter_bag().unwrap(), LetterBag::default());
    }

    #[test]
    fn test_custom_bag() {
        let config = EngineConfig::from_json(
            r#"{ "letter_distribution": "A:2 B:1 _:1", "letter_values": "A:1 B:5" }"#,
        )
        .unwrap();
        let bag = config.letter_bag().unwrap();
        assert_eq!(bag.num_blanks(), 1);
        assert_eq!(bag.point_value("AB"), 6);
    }

    #[test]
    fn test_from_file_errors() {
        assert!(matches!(
            EngineConfig::from_file("/no/such/config.json"),
            Err(LexiconError::ImportIo { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(EngineConfig::from_file(file.path()), Err(LexiconError::Json(_))));

        assert!(matches!(
            EngineConfig::from_json(r#"{ "max_definition_depth": 99 }"#),
            Err(LexiconError::Config(_))
        ));
    }
}
