use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::shared::error::PipelineError;

/// Per-image failure reported by the recognition engine in place of a
/// name list.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecognitionFailure {
    pub error: String,
}

/// What the engine found in one image.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RecognitionEntry {
    /// Recognized names in engine order; empty when nobody was recognized.
    People(Vec<String>),
    Failed(RecognitionFailure),
}

impl RecognitionEntry {
    pub fn people(&self) -> &[String] {
        match self {
            RecognitionEntry::People(names) => names,
            RecognitionEntry::Failed(_) => &[],
        }
    }
}

/// Image identifier (path relative to the processed directory) mapped to
/// its recognition entry. Iteration is ordered by identifier.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InferenceResult {
    entries: BTreeMap<String, RecognitionEntry>,
}

/// A repeated identifier is an error rather than last-one-wins.
impl<'de> Deserialize<'de> for InferenceResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = InferenceResult;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping image paths to name lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = BTreeMap::new();
                while let Some((identifier, entry)) = map.next_entry::<String, RecognitionEntry>()? {
                    match entries.entry(identifier) {
                        Entry::Occupied(seen) => {
                            return Err(de::Error::custom(format!(
                                "duplicate image identifier `{}`",
                                seen.key()
                            )));
                        }
                        Entry::Vacant(slot) => {
                            slot.insert(entry);
                        }
                    }
                }
                Ok(InferenceResult { entries })
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// An entry whose identifier was checked against the processed directory.
#[derive(Debug, PartialEq)]
pub struct ResolvedImage<'a> {
    pub identifier: &'a str,
    pub path: PathBuf,
    pub entry: &'a RecognitionEntry,
}

impl InferenceResult {
    /// Parses engine output. Any shape other than an object of name lists
    /// (or `{"error": ...}` objects) is `MalformedOutput`.
    pub fn parse(text: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(text.trim()).map_err(PipelineError::MalformedOutput)
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, RecognitionEntry)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, identifier: &str) -> Option<&RecognitionEntry> {
        self.entries.get(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecognitionEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolves every identifier under `dir`, failing on the first one that
    /// does not name an existing file inside it.
    pub fn resolve(&self, dir: &Path) -> Result<Vec<ResolvedImage<'_>>, PipelineError> {
        self.iter()
            .map(|(identifier, entry)| {
                Ok(ResolvedImage {
                    identifier,
                    path: resolve_identifier(dir, identifier)?,
                    entry,
                })
            })
            .collect()
    }
}

fn resolve_identifier(dir: &Path, identifier: &str) -> Result<PathBuf, PipelineError> {
    let unresolved = || PipelineError::UnresolvedImage {
        identifier: identifier.to_string(),
        dir: dir.to_path_buf(),
    };

    let relative = Path::new(identifier);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if identifier.is_empty() || escapes {
        return Err(unresolved());
    }

    let path = dir.join(relative);
    if path.is_file() {
        Ok(path)
    } else {
        Err(unresolved())
    }
}
