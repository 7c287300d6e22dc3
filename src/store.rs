use crate::record::{CapabilityRecord, Division};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Directory holding every persisted table
pub const DATABASE_DIR: &str = "database";

const RECORDS_FILE: &str = "records.json";
const FEEDBACK_FILE: &str = "feedback.json";

/// A capability record with its store-assigned identifier
///
/// The identifier is assigned at ingestion time, is unique within the store
/// and monotonically increasing; it is the record's identity for updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Store-assigned row identifier
    pub id: u64,

    /// The record itself
    #[serde(flatten)]
    pub record: CapabilityRecord,
}

/// Partial update to one stored record
///
/// Every editable field is optional; `None` leaves the stored value
/// unchanged. `domain` is absent on purpose: it is assigned at ingestion
/// and only changes through a full re-ingestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordPatch {
    pub competency: Option<String>,
    pub skill: Option<String>,
    pub description: Option<String>,
    pub capability_group: Option<String>,
    pub group_capability: Option<String>,
    pub global_sme: Option<String>,
    pub keywords: Option<String>,
    pub division_smes: Option<BTreeMap<Division, String>>,
}

impl RecordPatch {
    /// Apply this patch to a record, field by field
    pub fn apply(&self, record: &mut CapabilityRecord) {
        if let Some(v) = &self.competency {
            record.competency = v.clone();
        }
        if let Some(v) = &self.skill {
            record.skill = v.clone();
        }
        if let Some(v) = &self.description {
            record.description = v.clone();
        }
        if let Some(v) = &self.capability_group {
            record.capability_group = v.clone();
        }
        if let Some(v) = &self.group_capability {
            record.group_capability = v.clone();
        }
        if let Some(v) = &self.global_sme {
            record.global_sme = v.clone();
        }
        if let Some(v) = &self.keywords {
            record.keywords = v.clone();
        }
        if let Some(v) = &self.division_smes {
            for (division, contact) in v {
                record.division_smes.insert(*division, contact.clone());
            }
        }
    }
}

/// On-disk shape of the records table
#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordsFile {
    next_id: u64,
    records: Vec<StoredRecord>,
}

/// The capability record table
///
/// One JSON file under the database directory. The store owns identifier
/// assignment and write durability; every write replaces the file atomically
/// (write to a temporary file, then rename over the old one).
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Open (and if necessary create) the record table in a database directory
    ///
    /// # Arguments
    /// * `dir` - Database directory; created if missing
    ///
    /// # Returns
    /// * `Result<RecordStore, String>` - The store, or an error message
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, String> {
        let path = init_table(dir.as_ref(), RECORDS_FILE, "{\"next_id\":1,\"records\":[]}")?;
        Ok(RecordStore { path })
    }

    /// Replace the entire record set
    ///
    /// Old records are discarded, not merged: this is the wholesale
    /// replacement performed on every ingestion run. Identifiers are
    /// reassigned from 1 upward in input order.
    ///
    /// # Arguments
    /// * `records` - The new record set, in ingestion order
    ///
    /// # Returns
    /// * `Result<usize, String>` - Number of records stored, or an error
    pub fn replace_all(&self, records: Vec<CapabilityRecord>) -> Result<usize, String> {
        let stored: Vec<StoredRecord> = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| StoredRecord {
                id: i as u64 + 1,
                record,
            })
            .collect();

        let count = stored.len();
        let table = RecordsFile {
            next_id: count as u64 + 1,
            records: stored,
        };

        self.save(&table)?;
        Ok(count)
    }

    /// Read the full record set in insertion order
    pub fn read_all(&self) -> Result<Vec<StoredRecord>, String> {
        Ok(self.load()?.records)
    }

    /// Read one record by identifier
    ///
    /// # Arguments
    /// * `id` - Row identifier
    ///
    /// # Returns
    /// * `Result<Option<StoredRecord>, String>` - The record if it exists
    pub fn get(&self, id: u64) -> Result<Option<StoredRecord>, String> {
        let table = self.load()?;
        Ok(table.records.into_iter().find(|r| r.id == id))
    }

    /// Update one record in place
    ///
    /// Applies a field-level patch to the record with the given identifier;
    /// all other records are untouched.
    ///
    /// # Arguments
    /// * `id` - Row identifier of the record to update
    /// * `patch` - Fields to replace
    ///
    /// # Returns
    /// * `Result<StoredRecord, String>` - The updated record, or an error if
    ///   the identifier is unknown
    pub fn update(&self, id: u64, patch: &RecordPatch) -> Result<StoredRecord, String> {
        let mut table = self.load()?;

        let record = table
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| format!("No record with id {}", id))?;

        patch.apply(&mut record.record);
        let updated = record.clone();

        self.save(&table)?;
        Ok(updated)
    }

    fn load(&self) -> Result<RecordsFile, String> {
        read_table(&self.path)
    }

    fn save(&self, table: &RecordsFile) -> Result<(), String> {
        write_table(&self.path, table)
    }
}

/// One feedback submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    /// Store-assigned identifier
    pub id: u64,

    /// Submitter's name
    pub name: String,

    /// Submitter's email address
    pub email: String,

    /// Rating, 1 (worst) to 5 (best)
    pub rating: u8,

    /// Free-text comments
    pub comments: String,

    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
}

/// On-disk shape of the feedback table
#[derive(Debug, Default, Serialize, Deserialize)]
struct FeedbackFile {
    next_id: u64,
    entries: Vec<FeedbackEntry>,
}

/// The feedback table
///
/// Entirely decoupled from the record store: its own file, its own
/// identifier sequence, append-only.
pub struct FeedbackStore {
    path: PathBuf,
}

impl FeedbackStore {
    /// Open (and if necessary create) the feedback table in a database directory
    ///
    /// # Arguments
    /// * `dir` - Database directory; created if missing
    ///
    /// # Returns
    /// * `Result<FeedbackStore, String>` - The store, or an error message
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, String> {
        let path = init_table(dir.as_ref(), FEEDBACK_FILE, "{\"next_id\":1,\"entries\":[]}")?;
        Ok(FeedbackStore { path })
    }

    /// Record one feedback submission
    ///
    /// # Arguments
    /// * `name` - Submitter's name
    /// * `email` - Submitter's email address
    /// * `rating` - Rating, must be between 1 and 5 inclusive
    /// * `comments` - Free-text comments
    ///
    /// # Returns
    /// * `Result<FeedbackEntry, String>` - The stored entry, or a validation
    ///   message
    ///
    /// # Errors
    /// * The rating is outside the 1–5 range
    pub fn submit(
        &self,
        name: &str,
        email: &str,
        rating: u8,
        comments: &str,
    ) -> Result<FeedbackEntry, String> {
        if !(1..=5).contains(&rating) {
            return Err("Rating must be between 1 and 5".to_string());
        }

        let mut table: FeedbackFile = read_table(&self.path)?;

        let entry = FeedbackEntry {
            id: table.next_id,
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            rating,
            comments: comments.to_string(),
            submitted_at: Utc::now(),
        };

        table.next_id += 1;
        table.entries.push(entry.clone());
        write_table(&self.path, &table)?;

        Ok(entry)
    }

    /// Read every feedback entry in submission order
    pub fn read_all(&self) -> Result<Vec<FeedbackEntry>, String> {
        let table: FeedbackFile = read_table(&self.path)?;
        Ok(table.entries)
    }
}

/// Create a table file with empty content if it does not exist yet
fn init_table(dir: &Path, file: &str, empty: &str) -> Result<PathBuf, String> {
    if !dir.exists() {
        create_dir_all(dir).map_err(|_| "Failed to create database directory".to_string())?;
    }

    let path = dir.join(file);
    if !path.exists() {
        let mut handle =
            File::create(&path).map_err(|_| format!("Failed to create {}", file))?;
        handle
            .write_all(empty.as_bytes())
            .map_err(|_| format!("Failed to initialize {}", file))?;
    }

    Ok(path)
}

/// Read and parse one table file
fn read_table<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return Err(format!("Failed to open {}", path.display())),
    };

    let mut contents = String::new();
    if file.read_to_string(&mut contents).is_err() {
        return Err(format!("Failed to read {}", path.display()));
    }

    match serde_json::from_str(&contents) {
        Ok(table) => Ok(table),
        Err(_) => Err(format!("Failed to parse {}", path.display())),
    }
}

/// Serialize and atomically replace one table file
///
/// The table is written to a temporary file in the same directory and
/// renamed over the existing file, so readers never observe a half-written
/// table.
fn write_table<T: Serialize>(path: &Path, table: &T) -> Result<(), String> {
    let json = match serde_json::to_string_pretty(table) {
        Ok(json) => json,
        Err(_) => return Err("Failed to serialize table".to_string()),
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|_| "Failed to create temporary table file".to_string())?;

    temp.write_all(json.as_bytes())
        .map_err(|_| "Failed to write table data".to_string())?;

    temp.persist(path)
        .map_err(|_| format!("Failed to replace {}", path.display()))?;

    Ok(())
}
