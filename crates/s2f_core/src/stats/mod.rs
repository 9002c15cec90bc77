//! Keyed mean/std statistics
//!
//! A [`StatSet`] holds one [`StatPoint`] per [`Key`], either produced by the
//! statistics tool for the model circuit or read from a biological reference
//! table. Keys are unique within a set.

pub mod table;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub use table::{parse_stat_table, read_stat_table};

/// Row identifier: one categorical label or an ordered label pair.
///
/// Ordering puts all `Single` keys before `Pair` keys and is lexicographic
/// within each kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Single(String),
    Pair(String, String),
}

impl Key {
    pub fn single(label: impl Into<String>) -> Self {
        Key::Single(label.into())
    }

    pub fn pair(from: impl Into<String>, to: impl Into<String>) -> Self {
        Key::Pair(from.into(), to.into())
    }

    /// Labels in column order
    pub fn labels(&self) -> Vec<&str> {
        match self {
            Key::Single(label) => vec![label.as_str()],
            Key::Pair(from, to) => vec![from.as_str(), to.as_str()],
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Key::Single(label) => write!(f, "{}", label),
            Key::Pair(from, to) => write!(f, "{} -> {}", from, to),
        }
    }
}

/// Names of the key columns in a statistics table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyLayout {
    Single { column: String },
    Pair { from: String, to: String },
}

impl KeyLayout {
    /// Per-morphological-type layout (bouton density)
    pub fn mtype() -> Self {
        KeyLayout::Single {
            column: "mtype".to_string(),
        }
    }

    /// Per-pathway layout (synapses per connection)
    pub fn pathway() -> Self {
        KeyLayout::Pair {
            from: "from".to_string(),
            to: "to".to_string(),
        }
    }

    pub fn columns(&self) -> Vec<&str> {
        match self {
            KeyLayout::Single { column } => vec![column.as_str()],
            KeyLayout::Pair { from, to } => vec![from.as_str(), to.as_str()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatPoint {
    pub key: Key,
    pub mean: f64,
    pub std: f64,
}

impl StatPoint {
    pub fn new(key: Key, mean: f64, std: f64) -> Self {
        Self { key, mean, std }
    }
}

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Statistics table has no header line")]
    EmptyTable,

    #[error("Statistics table is missing column '{column}'")]
    MissingColumn { column: String },

    #[error("Line {line}: expected {expected} fields, found {found}")]
    ShortRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: invalid {column} value '{value}'")]
    InvalidNumber {
        line: usize,
        column: String,
        value: String,
    },

    #[error("Duplicate statistics key: {key}")]
    DuplicateKey { key: Key },

    #[error("Failed to read statistics table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Keyed statistics from a single source.
#[derive(Debug, Clone, PartialEq)]
pub struct StatSet {
    layout: KeyLayout,
    points: BTreeMap<Key, StatPoint>,
}

impl StatSet {
    pub fn new(layout: KeyLayout) -> Self {
        Self {
            layout,
            points: BTreeMap::new(),
        }
    }

    /// Build a set, rejecting duplicate keys
    pub fn from_points(
        layout: KeyLayout,
        points: impl IntoIterator<Item = StatPoint>,
    ) -> Result<Self, StatsError> {
        let mut set = Self::new(layout);
        for point in points {
            set.insert(point)?;
        }
        Ok(set)
    }

    pub fn insert(&mut self, point: StatPoint) -> Result<(), StatsError> {
        if self.points.contains_key(&point.key) {
            return Err(StatsError::DuplicateKey { key: point.key });
        }
        self.points.insert(point.key.clone(), point);
        Ok(())
    }

    pub fn get(&self, key: &Key) -> Option<&StatPoint> {
        self.points.get(key)
    }

    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.points.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatPoint> {
        self.points.values()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
