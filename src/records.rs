use std::fs;
use std::path::Path;

use crate::domain::InputRecord;
use crate::error::HarvestError;

const TITLE_COLUMN: usize = 0;
const ARCHIVE_COLUMN: usize = 9;
const ACCESSION_COLUMN: usize = 24;

/// Parses the tab-delimited catalog export. Quoted fields are unquoted and
/// may span lines. Rows may be ragged; a missing column reads as an empty
/// string.
pub fn from_tab_delimited(text: &str) -> Result<Vec<InputRecord>, HarvestError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|err| HarvestError::InputParse(err.to_string()))?;
        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let column = |index: usize| row.get(index).map(str::trim).unwrap_or_default();
        records.push(InputRecord::new(
            column(TITLE_COLUMN),
            column(ARCHIVE_COLUMN),
            column(ACCESSION_COLUMN),
        ));
    }
    Ok(records)
}

pub struct RecordStore;

impl RecordStore {
    /// Converts a tab-delimited export into the JSON records file consumed by
    /// [`RecordStore::load`]. Returns the number of records written.
    pub fn convert(input: &Path, output: &Path) -> Result<usize, HarvestError> {
        if input.as_os_str().is_empty() {
            return Err(HarvestError::MissingInput);
        }
        if output.as_os_str().is_empty() {
            return Err(HarvestError::MissingOutput);
        }
        let text =
            fs::read_to_string(input).map_err(|_| HarvestError::InputRead(input.to_path_buf()))?;
        let records = from_tab_delimited(&text)?;
        tracing::info!(count = records.len(), "processing records");
        let json = serde_json::to_vec(&records)
            .map_err(|err| HarvestError::InputParse(err.to_string()))?;
        fs::write(output, json).map_err(|err| {
            HarvestError::Filesystem(format!("write {}: {err}", output.display()))
        })?;
        tracing::info!(path = %output.display(), "written to json file");
        Ok(records.len())
    }

    pub fn load(path: &Path) -> Result<Vec<InputRecord>, HarvestError> {
        if path.as_os_str().is_empty() {
            return Err(HarvestError::MissingInput);
        }
        let content =
            fs::read_to_string(path).map_err(|_| HarvestError::InputRead(path.to_path_buf()))?;
        serde_json::from_str(&content).map_err(|err| HarvestError::InputParse(err.to_string()))
    }
}
