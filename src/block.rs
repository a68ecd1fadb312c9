//! Named library of content items (§4.2). Each record is a `(kind, data)`
//! pair keyed by name; the data string is parsed lazily on expansion.

use std::collections::HashMap;
use std::fs;

use camino::Utf8PathBuf;
use color_eyre::Result;
use color_eyre::eyre::Context;
use strum::EnumString;

use crate::parse::tokenize_n;

#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum BlockKind {
    File,
    Playlist,
    Random,
    RandomFile,
    Interleave,
}

#[derive(Debug, Clone)]
pub struct BlockRecord {
    pub kind: BlockKind,
    pub data: String,
}

/// Case-sensitive mapping from block name to record, file-order preserved.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    names: Vec<String>,
    records: HashMap<String, BlockRecord>,
}

impl Catalog {
    pub fn load(path: &Utf8PathBuf) -> Result<Self> {
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("Could not read block file: {path}"))?;
        Ok(Self::parse(&text))
    }

    /// Parses block-file text (§6.2). Unknown kinds and malformed lines are
    /// dropped, the rest of the file still loads. On a duplicate name, the
    /// first occurrence in file order wins and later ones are logged and
    /// dropped (see DESIGN.md Open Question 1).
    pub fn parse(text: &str) -> Self {
        let mut catalog = Catalog::default();
        for (lineno, line) in text.lines().enumerate() {
            let Some(tokens) = tokenize_n(line, 3) else {
                continue;
            };
            let [name, kind, data] = <[String; 3]>::try_from(tokens).unwrap();
            if name.is_empty() {
                continue;
            }
            let Ok(kind) = kind.parse::<BlockKind>() else {
                tracing::warn!(line = lineno + 1, %kind, "unknown block kind, dropping line");
                continue;
            };
            if catalog.records.contains_key(&name) {
                tracing::warn!(line = lineno + 1, %name, "duplicate block name, keeping first occurrence");
                continue;
            }
            catalog.names.push(name.clone());
            catalog.records.insert(name, BlockRecord { kind, data });
        }
        catalog
    }

    pub fn get(&self, name: &str) -> Option<&BlockRecord> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
