use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::decoder::DecodedCall;
use crate::methods::MethodSpec;
use crate::utils::strip_hex_prefix;

/// How output files of a method are told apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FileNaming {
    /// `<stem>_<n>.json`, continuing after the highest index already on disk
    Counter,
    /// `<stem>_<transaction hash>.json`, so re-runs overwrite the same file
    TxHash,
}

/// Where decoded calls end up on disk
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    naming: FileNaming,
}

impl OutputLayout {
    /// Layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>, naming: FileNaming) -> Self {
        OutputLayout {
            root: root.into(),
            naming,
        }
    }

    /// How files are named
    pub fn naming(&self) -> FileNaming {
        self.naming
    }

    /// `<root>/<directory>` of `method`
    pub fn method_dir(&self, method: &MethodSpec) -> PathBuf {
        self.root.join(&method.directory)
    }

    /// Output file of one call, keyed by `counter` or `tx_hash` depending on the naming
    pub fn file_path(&self, method: &MethodSpec, counter: u64, tx_hash: &str) -> PathBuf {
        let key = match self.naming {
            FileNaming::Counter => counter.to_string(),
            FileNaming::TxHash => strip_hex_prefix(tx_hash).to_lowercase(),
        };
        self.method_dir(method)
            .join(format!("{}_{}.json", method.file_stem, key))
    }

    /// Highest `<stem>_<n>.json` index in the method's directory, 0 if there is none
    pub fn last_index(&self, method: &MethodSpec) -> io::Result<u64> {
        let entries = match fs::read_dir(self.method_dir(method)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let prefix = format!("{}_", method.file_stem);
        let mut last = 0;
        for entry in entries {
            let file_name = entry?.file_name();
            let index = file_name
                .to_str()
                .and_then(|name| name.strip_prefix(&prefix))
                .and_then(|rest| rest.strip_suffix(".json"))
                .and_then(|index| index.parse::<u64>().ok());
            if let Some(index) = index {
                last = last.max(index);
            }
        }
        Ok(last)
    }
}

/// Writes `call` as pretty printed JSON to `path`, replacing any existing file
///
/// The parent directory has to exist.
pub fn write_decoded(path: &Path, call: &DecodedCall) -> io::Result<()> {
    let json = serde_json::to_string_pretty(&call.to_json())?;
    fs::write(path, json)
}
