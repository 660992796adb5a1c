//! Symbol index reader.
//!
//! The index is written by the build step that compiled the test classpath. It lists every top-level symbol
//! together with the structural facts fingerprints match against. Discovery works from this file alone and never
//! opens compiled code.
//!
//! ## Format
//!
//! ```json
//! {
//!   "symbols": [
//!     { "name": "com.acme.MathSuite", "kind": "module", "parents": ["testrig.interface.Suite"] },
//!     { "name": "bin.smoke", "kind": "function", "annotations": ["testrig.interface.Command"] }
//!   ]
//! }
//! ```
//!
//! `kind` defaults to `type`, `abstract` to `false`, `public` to `true`, lists to empty.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use testrig_interface::{SymbolKind, SymbolShape};
use tracing::debug;

use crate::error::FatalError;

#[derive(Debug, Deserialize)]
struct RawIndex {
    #[serde(default)]
    symbols: Vec<RawSymbol>,
}

#[derive(Debug, Deserialize)]
struct RawSymbol {
    name: String,
    #[serde(default)]
    kind: RawKind,
    #[serde(default, rename = "abstract")]
    is_abstract: bool,
    #[serde(default = "default_public", rename = "public")]
    is_public: bool,
    #[serde(default)]
    parents: Vec<String>,
    #[serde(default)]
    annotations: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawKind {
    #[default]
    Type,
    Module,
    Function,
}

fn default_public() -> bool {
    true
}

impl From<RawSymbol> for SymbolShape {
    fn from(raw: RawSymbol) -> Self {
        let kind = match raw.kind {
            RawKind::Type => SymbolKind::Type,
            RawKind::Module => SymbolKind::Module,
            RawKind::Function => SymbolKind::Function,
        };
        SymbolShape {
            name: raw.name,
            kind,
            is_abstract: raw.is_abstract,
            is_public: raw.is_public,
            parents: raw.parents,
            annotations: raw.annotations,
        }
    }
}

/// The set of top-level symbols, keyed and iterated by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolIndex {
    symbols: BTreeMap<String, SymbolShape>,
}

impl SymbolIndex {
    /// Build an index from shapes. Later shapes replace earlier ones with the same name; empty names are dropped.
    pub fn from_shapes(shapes: impl IntoIterator<Item = SymbolShape>) -> Self {
        let mut symbols = BTreeMap::new();
        for shape in shapes {
            if shape.name.is_empty() {
                debug!("ignoring index entry with an empty name");
                continue;
            }
            if let Some(previous) = symbols.insert(shape.name.clone(), shape) {
                debug!("duplicate index entry for '{}', keeping the last one", previous.name);
            }
        }
        Self { symbols }
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let raw: RawIndex = serde_json::from_slice(bytes)?;
        Ok(Self::from_shapes(raw.symbols.into_iter().map(SymbolShape::from)))
    }

    /// Read and decode the index at `path`.
    ///
    /// ## Errors
    /// Both IO and decoding failures are fatal and carry `path`.
    pub fn read(path: &Path) -> Result<Self, FatalError> {
        let bytes = fs::read(path).map_err(|source| FatalError::IndexRead {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::from_json_slice(&bytes).map_err(|source| FatalError::IndexParse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("read {} symbols from {}", index.len(), path.display());
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Symbol names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }

    pub fn shape(&self, name: &str) -> Option<&SymbolShape> {
        self.symbols.get(name)
    }

    pub fn shapes(&self) -> impl Iterator<Item = &SymbolShape> {
        self.symbols.values()
    }
}
