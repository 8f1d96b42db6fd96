//! Version ledger: the persisted mapping of project ids to versions.
//!
//! The on-disk shape is a JSON object keyed by project id:
//!
//! ```json
//! { "project1": { "version": "0.2.0", "description": "Billing service" } }
//! ```
//!
//! Fields other than `version` and `description` are carried through
//! untouched.

pub mod store;

pub use store::{update_ledger, FileLedgerStore, LedgerStore, MemoryLedgerStore, Revision, Snapshot};

use crate::domain::ReleaseVersion;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One project's record in the ledger.
///
/// The JSON object is kept as read, key order included, so rewriting the
/// ledger leaves every field except a bumped `version` byte-for-byte intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct LedgerEntry {
    fields: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for LedgerEntry {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        match fields.get("version") {
            Some(Value::String(_)) => Ok(LedgerEntry { fields }),
            Some(other) => Err(format!("`version` must be a string, found {}", other)),
            None => Err("missing field `version`".to_string()),
        }
    }
}

impl From<LedgerEntry> for Map<String, Value> {
    fn from(entry: LedgerEntry) -> Self {
        entry.fields
    }
}

impl LedgerEntry {
    /// New record; an empty description is left out of the JSON
    pub fn new(version: &ReleaseVersion, description: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("version".to_string(), Value::String(version.to_string()));
        let description = description.into();
        if !description.is_empty() {
            fields.insert("description".to_string(), Value::String(description));
        }
        LedgerEntry { fields }
    }

    /// Stored version text, exactly as written in the ledger
    pub fn version(&self) -> &str {
        self.fields
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Description, empty when absent or not a string
    pub fn description(&self) -> &str {
        self.fields
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Any other field, e.g. `owner`
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Replace the version in place, keeping its position in the object
    pub fn set_version(&mut self, version: &ReleaseVersion) {
        self.fields
            .insert("version".to_string(), Value::String(version.to_string()));
    }

    /// Parse the stored version, failing fast on malformed values
    pub fn release_version(&self) -> Result<ReleaseVersion> {
        ReleaseVersion::parse(self.version())
    }
}

/// Mapping of project id to its ledger entry, in file order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct VersionLedger {
    entries: Vec<(String, LedgerEntry)>,
}

impl TryFrom<Map<String, Value>> for VersionLedger {
    type Error = String;

    fn try_from(map: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        let mut entries = Vec::with_capacity(map.len());
        for (project, value) in map {
            let entry: LedgerEntry = serde_json::from_value(value)
                .map_err(|e| format!("project '{}': {}", project, e))?;
            entries.push((project, entry));
        }
        Ok(VersionLedger { entries })
    }
}

impl From<VersionLedger> for Map<String, Value> {
    fn from(ledger: VersionLedger) -> Self {
        ledger
            .entries
            .into_iter()
            .map(|(project, entry)| (project, Value::Object(entry.fields)))
            .collect()
    }
}

impl VersionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a ledger from its JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize as 2-space pretty JSON with a trailing newline
    pub fn to_json(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Add or replace a project record (used when seeding a ledger)
    pub fn insert(&mut self, project: impl Into<String>, entry: LedgerEntry) {
        let project = project.into();
        match self.entries.iter().position(|(id, _)| *id == project) {
            Some(index) => self.entries[index].1 = entry,
            None => self.entries.push((project, entry)),
        }
    }

    pub fn get(&self, project: &str) -> Option<&LedgerEntry> {
        self.entries
            .iter()
            .find(|(id, _)| id == project)
            .map(|(_, entry)| entry)
    }

    fn get_mut(&mut self, project: &str) -> Option<&mut LedgerEntry> {
        self.entries
            .iter_mut()
            .find(|(id, _)| id == project)
            .map(|(_, entry)| entry)
    }

    pub fn contains(&self, project: &str) -> bool {
        self.get(project).is_some()
    }

    /// Project ids in file order
    pub fn projects(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LedgerEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, project: &str) -> Result<&LedgerEntry> {
        self.get(project).ok_or_else(|| unknown_project(project))
    }

    /// Current version of `project`
    pub fn version_of(&self, project: &str) -> Result<ReleaseVersion> {
        self.entry(project)?.release_version()
    }

    /// Description of `project` (empty when unset)
    pub fn description_of(&self, project: &str) -> Result<&str> {
        Ok(self.entry(project)?.description())
    }
}

fn unknown_project(project: &str) -> LedgerError {
    LedgerError::ledger(format!("Project '{}' is not in the version ledger", project))
}

/// Return a copy of `ledger` with only `project`'s version replaced.
///
/// Entries are created by hand; an unknown project is an error.
pub fn apply_bump(
    ledger: &VersionLedger,
    project: &str,
    new_version: &ReleaseVersion,
) -> Result<VersionLedger> {
    let mut updated = ledger.clone();
    updated
        .get_mut(project)
        .ok_or_else(|| unknown_project(project))?
        .set_version(new_version);
    Ok(updated)
}
