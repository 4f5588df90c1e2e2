use std::path::Path;

use crate::audit::{AuditEntry, read_entries};
use crate::error::HarvestError;

fn columns(entry: &AuditEntry) -> [&str; 7] {
    [
        &entry.title,
        &entry.author,
        &entry.date,
        &entry.description,
        &entry.archive_id,
        &entry.accession_number,
        &entry.output_directory,
    ]
}

/// Renders audit entries as tab-delimited rows. Values holding tabs, quotes
/// or line breaks are quoted so the column count stays fixed.
pub fn to_tab_delimited(entries: &[AuditEntry]) -> Result<Vec<u8>, HarvestError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(Vec::new());
    for entry in entries {
        writer
            .write_record(columns(entry))
            .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|err| HarvestError::Filesystem(err.to_string()))
}

/// Regenerates the tab-delimited report from the whole audit log.
/// Returns the number of rows written.
pub fn write_report(audit_log: &Path, report_path: &Path) -> Result<usize, HarvestError> {
    if report_path == audit_log {
        return Err(HarvestError::Filesystem(format!(
            "report would overwrite the audit log {}",
            audit_log.display()
        )));
    }
    let entries = read_entries(audit_log)?;
    let content = to_tab_delimited(&entries)?;
    crate::download::write_artifact(report_path, &content)?;
    tracing::info!(path = %report_path.display(), lines = entries.len(), "report written");
    Ok(entries.len())
}
