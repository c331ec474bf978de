use std::fmt;
use std::path::{Path, PathBuf};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::info;

use crate::error::PersistenceError;

pub const SCHEMA_VERSION: &str = "2.0";
const UNKNOWN_INDEX: &str = "unknown";

/// Code points of the digit zero in the decimal-digit blocks accepted in indices.
const DIGIT_ZEROS: &[u32] = &[
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x17E0, 0x1810, 0xFF10,
];

/// String-keyed map that serializes in insertion order. Re-inserting a key replaces its value in place.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: V) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Chapter index as written to output: an integer when every character is a decimal
/// digit (any script) and the value fits in a `u64`, otherwise the original string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChapterIndex {
    Number(u64),
    Label(String),
}

impl ChapterIndex {
    pub fn from_raw(raw: &str) -> Self {
        match parse_decimal(raw) {
            Some(n) => Self::Number(n),
            None => Self::Label(raw.to_string()),
        }
    }
}

fn decimal_digit(c: char) -> Option<u64> {
    let cp = c as u32;
    DIGIT_ZEROS
        .iter()
        .find(|&&zero| (zero..zero + 10).contains(&cp))
        .map(|&zero| u64::from(cp - zero))
}

fn parse_decimal(raw: &str) -> Option<u64> {
    if raw.is_empty() {
        return None;
    }
    raw.chars().try_fold(0u64, |acc, c| {
        acc.checked_mul(10)?.checked_add(decimal_digit(c)?)
    })
}

impl fmt::Display for ChapterIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Label(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

/// Per-verse analysis. Fields left `None` were never computed and are omitted from JSON.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freq_dist: Option<OrderedMap<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub named_entities: Option<Vec<Entity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noun_chunks: Option<Vec<String>>,
    pub themes: Vec<String>,
    pub advanced_analysis_timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerseRecord {
    pub aya_index: Option<String>,
    pub raw_text: String,
    pub clean_text: String,
    pub markers: Vec<String>,
    pub footers: OrderedMap<String>,
    pub analysis: AnalysisRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub processed_timestamp: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterOutput {
    pub qurantafseer: String,
    pub sura_index: Option<ChapterIndex>,
    pub sura_info: OrderedMap<String>,
    pub ayah: Vec<VerseRecord>,
    pub metadata: Metadata,
}

/// Local time, ISO-8601 without offset, microsecond precision.
pub fn timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Writes one `sura_<index>.json` per chapter into a directory.
pub struct JsonPersister {
    dir: PathBuf,
}

impl JsonPersister {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| PersistenceError::CreateDir {
            path: self.dir.clone(),
            source,
        })
    }

    pub fn path_for(&self, index: Option<&ChapterIndex>) -> PathBuf {
        let name = match index {
            Some(i) => format!("sura_{}.json", i),
            None => format!("sura_{}.json", UNKNOWN_INDEX),
        };
        self.dir.join(name)
    }

    /// Serialize as 2-space indented UTF-8 JSON, replacing any previous file.
    pub fn write(&self, chapter: &ChapterOutput) -> Result<PathBuf, PersistenceError> {
        let path = self.path_for(chapter.sura_index.as_ref());
        let body = serde_json::to_vec_pretty(chapter).map_err(|source| {
            PersistenceError::Serialize {
                path: path.clone(),
                source,
            }
        })?;
        std::fs::write(&path, body).map_err(|source| PersistenceError::Write {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), verses = chapter.ayah.len(), "Saved sura analysis");
        Ok(path)
    }
}

// ── Tests ──
