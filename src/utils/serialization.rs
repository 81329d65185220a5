use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use bincode;
use bincode::Options;

use crate::lexicon::error::{LexiconError, Result};

/// Tag at the start of every compiled graph
pub const GRAPH_FORMAT: [u8; 4] = *b"LXG1";

/// On-disk envelope of a compiled word graph: the raw fst bytes plus
/// enough metadata to reject corrupt or mismatched blobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledGraph {
    pub format: [u8; 4],
    pub reversed: bool,
    pub checksum: u32,
    pub fst: Vec<u8>,
}

impl CompiledGraph {
    pub fn new(fst: Vec<u8>, reversed: bool) -> Self {
        Self {
            format: GRAPH_FORMAT,
            reversed,
            checksum: checksum(&fst),
            fst,
        }
    }

    /// Checks the format tag, the reversed flag and both checksums.
    pub fn verify(&self, reversed: bool, expected_checksum: Option<u32>) -> Result<()> {
        if self.format != GRAPH_FORMAT {
            return Err(LexiconError::corrupt("unknown graph format"));
        }
        if self.reversed != reversed {
            return Err(LexiconError::corrupt(format!(
                "graph direction mismatch: expected reversed={}",
                reversed
            )));
        }
        let actual = checksum(&self.fst);
        if actual != self.checksum {
            return Err(LexiconError::corrupt(format!(
                "stored checksum {:08x} does not match data {:08x}",
                self.checksum, actual
            )));
        }
        if let Some(expected) = expected_checksum {
            if expected != actual {
                return Err(LexiconError::corrupt(format!(
                    "checksum {:08x} does not match expected {:08x}",
                    actual, expected
                )));
            }
        }
        Ok(())
    }
}

pub fn checksum(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

fn options() -> impl Options {
    bincode::DefaultOptions::new().with_no_limit()
}

pub fn serialize_bytes<T: Serialize>(data: &T) -> Result<Vec<u8>> {
    Ok(options().serialize(data)?)
}

pub fn deserialize_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(options().deserialize(bytes)?)
}

pub fn save_to_disk<T: Serialize, TPath: AsRef<Path>>(data: &T, path: TPath) -> Result<()> {
    let options = options();
    // Write all bytes to the target file
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    options.serialize_into(writer, data)?;
    Ok(())
}

pub fn load_from_disk<T: DeserializeOwned, TPath: AsRef<Path>>(path: TPath) -> Result<T> {
    // Open the file and read all bytes
    let file = File::open(path.as_ref()).map_err(|e| LexiconError::import_io(path.as_ref(), e))?;
    let reader = BufReader::new(file);
    Ok(options().deserialize_from(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_detects_tampering() {
        let mut graph = CompiledGraph::new(vec![1, 2, 3], false);
        assert!(graph.verify(false, None).is_ok());
        assert!(graph.verify(false, Some(checksum(&[1, 2, 3]))).is_ok());
        assert!(graph.verify(true, None).is_err());
        assert!(graph.verify(false, Some(0xdead)).is_err());

        graph.fst[0] = 9;
        assert!(matches!(
            graph.verify(false, None),
            Err(LexiconError::CorruptData(_))
        ));
    }

    #[test]
    fn test_disk_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        save_to_disk(&CompiledGraph::new(vec![4, 5], true), &path).unwrap();
        let back: CompiledGraph = load_from_disk(&path).unwrap();
        assert!(back.verify(true, None).is_ok());
        assert!(matches!(
            load_from_disk::<CompiledGraph, _>(dir.path().join("missing.bin")),
            Err(LexiconError::ImportIo { .. })
        ));
    }
}
