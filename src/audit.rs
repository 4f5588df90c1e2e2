use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::HarvestError;

/// One line of the audit log. Key names are kept stable for existing logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "IArchiveID")]
    pub archive_id: String,
    #[serde(rename = "OCLCNumber")]
    pub accession_number: String,
    #[serde(rename = "OutputDirectory")]
    pub output_directory: String,
}

/// A record that was assigned a directory but produced no audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
    pub title: String,
    pub archive_id: String,
    pub accession_number: String,
    pub output_directory: String,
    pub reason: String,
    pub recorded_at: String,
}

/// Append-only newline-delimited JSON log, opened once per run.
#[derive(Debug)]
pub struct JsonLineLog {
    path: PathBuf,
    file: File,
}

impl JsonLineLog {
    pub fn open(path: &Path) -> Result<Self, HarvestError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| HarvestError::AuditWrite(format!("{}: {err}", parent.display())))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| HarvestError::AuditWrite(format!("open {}: {err}", path.display())))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The line is written in a single call so entries never interleave.
    pub fn append<T: Serialize>(&mut self, entry: &T) -> Result<(), HarvestError> {
        let mut line = serde_json::to_vec(entry)
            .map_err(|err| HarvestError::AuditWrite(err.to_string()))?;
        line.push(b'\n');
        self.file
            .write_all(&line)
            .and_then(|_| self.file.flush())
            .map_err(|err| HarvestError::AuditWrite(format!("{}: {err}", self.path.display())))
    }

    pub fn close(self) -> Result<(), HarvestError> {
        self.file
            .sync_all()
            .map_err(|err| HarvestError::AuditWrite(format!("{}: {err}", self.path.display())))
    }
}

#[derive(Debug)]
pub struct AuditLog(JsonLineLog);

impl AuditLog {
    pub fn open(path: &Path) -> Result<Self, HarvestError> {
        JsonLineLog::open(path).map(Self)
    }

    pub fn append(&mut self, entry: &AuditEntry) -> Result<(), HarvestError> {
        self.0.append(entry)
    }

    pub fn path(&self) -> &Path {
        self.0.path()
    }

    pub fn close(self) -> Result<(), HarvestError> {
        self.0.close()
    }
}

#[derive(Debug)]
pub struct FailureLedger(JsonLineLog);

impl FailureLedger {
    pub fn open(path: &Path) -> Result<Self, HarvestError> {
        JsonLineLog::open(path).map(Self)
    }

    pub fn append(&mut self, entry: &FailureEntry) -> Result<(), HarvestError> {
        self.0.append(entry)
    }

    pub fn close(self) -> Result<(), HarvestError> {
        self.0.close()
    }
}

pub fn read_entries(path: &Path) -> Result<Vec<AuditEntry>, HarvestError> {
    let file = File::open(path).map_err(|_| HarvestError::InputRead(path.to_path_buf()))?;
    let mut entries = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|err| HarvestError::Filesystem(err.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = serde_json::from_str(&line).map_err(|err| {
            HarvestError::InputParse(format!("{} line {}: {err}", path.display(), index + 1))
        })?;
        entries.push(entry);
    }
    Ok(entries)
}
