//! Exercise log - per day, per slot records of what was actually done
//!
//! Entries are partial: weight, difficulty and notes arrive independently and
//! are merged field by field. An entry with none of them is removed.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, warn};

use crate::db::BlobStore;
use crate::error::StorageError;

/// Blob key of the serialized log
pub const LOG_KEY: &str = "basement_lab_log";

/// `(global day, exercise slot)` - serialized as `"<day>_<slot>"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogKey {
    pub day: u32,
    pub slot: usize,
}

impl LogKey {
    pub fn new(day: u32, slot: usize) -> Self {
        Self { day, slot }
    }
}

impl fmt::Display for LogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.day, self.slot)
    }
}

impl FromStr for LogKey {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (day, slot) = s
            .split_once('_')
            .ok_or_else(|| format!("Invalid log key: {}", s))?;
        Ok(Self {
            day: day.parse().map_err(|_| format!("Invalid day in log key: {}", s))?,
            slot: slot.parse().map_err(|_| format!("Invalid slot in log key: {}", s))?,
        })
    }
}

impl Serialize for LogKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LogKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Perceived difficulty of an exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Good,
    Hard,
    Failed,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Good => write!(f, "good"),
            Self::Hard => write!(f, "hard"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "good" => Ok(Self::Good),
            "hard" => Ok(Self::Hard),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown difficulty: {}", s)),
        }
    }
}

/// One logged exercise. Only `exercise`, `day` and `timestamp` are always set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub exercise: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_set: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_rep: Option<u32>,
    pub day: u32,
    /// Epoch millis of the last write
    pub timestamp: i64,
}

/// A single field update
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Weight(f64),
    Difficulty(Difficulty),
    Notes(String),
    /// Set and rep where the failure happened (1-based)
    FailedPoint { set: u32, rep: u32 },
}

/// Field selector for removals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogField {
    Weight,
    Difficulty,
    Notes,
    FailedPoint,
}

impl LogEntry {
    fn empty(exercise: &str, day: u32) -> Self {
        Self {
            exercise: exercise.to_string(),
            weight: None,
            difficulty: None,
            notes: None,
            failed_set: None,
            failed_rep: None,
            day,
            timestamp: 0,
        }
    }

    /// True when weight, difficulty or notes is present
    pub fn has_content(&self) -> bool {
        self.weight.is_some() || self.difficulty.is_some() || self.notes.is_some()
    }

    /// Merge one field. The new value wins; untouched fields are kept.
    ///
    /// - a non-failed difficulty drops the failure point
    /// - a failure point forces difficulty to `Failed`
    /// - blank notes count as no notes
    pub fn apply(&mut self, value: FieldValue) {
        match value {
            FieldValue::Weight(w) => self.weight = Some(w),
            FieldValue::Difficulty(d) => {
                self.difficulty = Some(d);
                if d != Difficulty::Failed {
                    self.failed_set = None;
                    self.failed_rep = None;
                }
            }
            FieldValue::Notes(text) => {
                self.notes = if text.trim().is_empty() { None } else { Some(text) };
            }
            FieldValue::FailedPoint { set, rep } => {
                self.difficulty = Some(Difficulty::Failed);
                self.failed_set = Some(set);
                self.failed_rep = Some(rep);
            }
        }
    }

    /// Remove one field plus whatever depends on it
    pub fn clear(&mut self, field: LogField) {
        match field {
            LogField::Weight => self.weight = None,
            LogField::Notes => self.notes = None,
            LogField::Difficulty | LogField::FailedPoint => {
                if field == LogField::Difficulty {
                    self.difficulty = None;
                }
                self.failed_set = None;
                self.failed_rep = None;
            }
        }
    }
}

/// In-memory log mapping, persisted as a single blob
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExerciseLog {
    entries: BTreeMap<LogKey, LogEntry>,
}

impl ExerciseLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the log blob; missing or unreadable data yields an empty log.
    /// Individual malformed entries are skipped, the rest are kept.
    pub fn load<S: BlobStore + ?Sized>(store: &S) -> Self {
        match store.get(LOG_KEY) {
            Ok(Some(blob)) => match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&blob) {
                Ok(raw) => Self::from_raw(raw),
                Err(e) => {
                    warn!("Exercise log is corrupt, starting empty: {}", e);
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("Failed to read exercise log, starting empty: {}", e);
                Self::default()
            }
        }
    }

    fn from_raw(raw: BTreeMap<String, serde_json::Value>) -> Self {
        let mut entries = BTreeMap::new();
        for (key, value) in raw {
            let parsed_key = match key.parse::<LogKey>() {
                Ok(k) => k,
                Err(e) => {
                    warn!("Skipping log entry: {}", e);
                    continue;
                }
            };
            match serde_json::from_value::<LogEntry>(value) {
                Ok(entry) => {
                    entries.insert(parsed_key, entry);
                }
                Err(e) => warn!("Skipping log entry {}: {}", key, e),
            }
        }
        Self { entries }
    }

    pub fn save<S: BlobStore + ?Sized>(&self, store: &mut S) -> Result<(), StorageError> {
        let blob = serde_json::to_string(&self.entries).map_err(|source| StorageError::Encode {
            key: LOG_KEY.to_string(),
            source,
        })?;
        store.set(LOG_KEY, &blob)
    }

    pub fn get(&self, key: LogKey) -> Option<&LogEntry> {
        self.entries.get(&key)
    }

    /// Overlay one field on the entry at `key`, stamping day and `now`
    pub fn upsert(&mut self, key: LogKey, exercise: &str, value: FieldValue, now: i64) {
        debug!("Log {} ({}): set {:?}", key, exercise, value);
        let entry = self
            .entries
            .entry(key)
            .or_insert_with(|| LogEntry::empty(exercise, key.day));
        entry.exercise = exercise.to_string();
        entry.apply(value);
        entry.day = key.day;
        entry.timestamp = now;
        self.prune_if_empty(key);
    }

    /// Remove one field, then drop the entry if nothing meaningful is left
    pub fn clear_field(&mut self, key: LogKey, field: LogField) {
        if let Some(entry) = self.entries.get_mut(&key) {
            debug!("Log {}: clear {:?}", key, field);
            entry.clear(field);
            self.prune_if_empty(key);
        }
    }

    /// Returns true if the entry was removed
    pub fn prune_if_empty(&mut self, key: LogKey) -> bool {
        if self.entries.get(&key).is_some_and(|e| !e.has_content()) {
            self.entries.remove(&key);
            return true;
        }
        false
    }

    /// Full snapshot, ordered by day then slot
    pub fn entries(&self) -> impl Iterator<Item = (&LogKey, &LogEntry)> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
