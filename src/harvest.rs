use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::archive::{ArchiveClient, MetadataFetcher};
use crate::audit::{AuditEntry, AuditLog, FailureEntry, FailureLedger};
use crate::catalog::CatalogClient;
use crate::config::{Credential, HarvestConfig};
use crate::domain::{ArchiveId, InputRecord, subdirectory_name};
use crate::download::{ConcurrentDownloader, DownloadReport, write_artifact};
use crate::error::HarvestError;
use crate::layout::OutputLayout;
use crate::report;
use crate::resolver::{DataSourceResolver, MetadataDocument};

#[derive(Debug, Clone, Default, Serialize)]
pub struct HarvestOutcome {
    pub records_processed: usize,
    pub records_audited: usize,
    pub records_unavailable: usize,
    pub files_written: usize,
    pub artifacts_failed: usize,
    pub output_root: String,
}

impl fmt::Display for HarvestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Data harvested and written to output directory: {} ({} records, {} unavailable, {} files, {} failed downloads)",
            self.output_root,
            self.records_processed,
            self.records_unavailable,
            self.files_written,
            self.artifacts_failed
        )
    }
}

#[derive(Debug)]
enum RecordOutcome {
    Audited(DownloadReport),
    Unavailable(String),
}

pub struct Harvester<A: ArchiveClient, C: CatalogClient> {
    config: HarvestConfig,
    archive: A,
    catalog: C,
}

impl<A: ArchiveClient, C: CatalogClient> Harvester<A, C> {
    pub fn new(config: HarvestConfig, archive: A, catalog: C) -> Self {
        Self {
            config,
            archive,
            catalog,
        }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Harvests records strictly in order; record N+1 starts only after all
    /// of record N's downloads returned. Local failures abort the run and
    /// leave already-written output in place.
    pub fn run(
        &self,
        records: &[InputRecord],
        output_root: &Path,
        credential: &Credential,
    ) -> Result<HarvestOutcome, HarvestError> {
        let layout = OutputLayout::new(output_root)?;
        layout.ensure_root()?;
        let mut audit = AuditLog::open(&self.config.audit_log)?;
        let mut failures = None;

        let mut outcome = HarvestOutcome {
            output_root: layout.root().to_string(),
            ..HarvestOutcome::default()
        };
        let result = self.harvest_all(
            records,
            &layout,
            credential,
            &mut audit,
            &mut failures,
            &mut outcome,
        );

        let closed = audit
            .close()
            .and(failures.map(FailureLedger::close).unwrap_or(Ok(())));
        result?;
        closed?;

        if self.config.write_report {
            report::write_report(&self.config.audit_log, &self.config.report_path())?;
        }
        tracing::info!(
            records = outcome.records_processed,
            audited = outcome.records_audited,
            files = outcome.files_written,
            "harvest complete"
        );
        Ok(outcome)
    }

    fn harvest_all(
        &self,
        records: &[InputRecord],
        layout: &OutputLayout,
        credential: &Credential,
        audit: &mut AuditLog,
        failures: &mut Option<FailureLedger>,
        outcome: &mut HarvestOutcome,
    ) -> Result<(), HarvestError> {
        for (index, record) in records.iter().enumerate() {
            let sequence = index + 1;
            outcome.records_processed += 1;
            match self.harvest_record(sequence, record, layout, credential, audit)? {
                RecordOutcome::Audited(report) => {
                    outcome.records_audited += 1;
                    outcome.files_written += report.written();
                    outcome.artifacts_failed += report.failed();
                }
                RecordOutcome::Unavailable(reason) => {
                    outcome.records_unavailable += 1;
                    let ledger = match failures {
                        Some(ledger) => ledger,
                        None => failures.insert(FailureLedger::open(&self.config.failure_log)?),
                    };
                    ledger.append(&FailureEntry {
                        title: record.title.clone(),
                        archive_id: record.archive_id.clone(),
                        accession_number: record.accession_number.clone(),
                        output_directory: subdirectory_name(sequence),
                        reason,
                        recorded_at: chrono::Utc::now().to_rfc3339(),
                    })?;
                }
            }
        }
        Ok(())
    }

    fn harvest_record(
        &self,
        sequence: usize,
        record: &InputRecord,
        layout: &OutputLayout,
        credential: &Credential,
        audit: &mut AuditLog,
    ) -> Result<RecordOutcome, HarvestError> {
        let subdir = subdirectory_name(sequence);
        let dir = layout.ensure_record_dir(sequence)?;
        tracing::info!(sequence, title = %record.title, "harvesting record");

        let archive_id: ArchiveId = match record.archive_id.parse() {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(sequence, error = %err, "skipping record");
                return Ok(RecordOutcome::Unavailable(err.to_string()));
            }
        };

        let Some(body) = MetadataFetcher::new(&self.archive).fetch(&archive_id)? else {
            return Ok(RecordOutcome::Unavailable(
                "metadata request failed".to_string(),
            ));
        };
        write_artifact(
            dir.join(&self.config.metadata_file_name).as_std_path(),
            &body,
        )?;

        let document = match MetadataDocument::parse(&body) {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(archive_id = %archive_id, "unable to retrieve metadata");
                return Ok(RecordOutcome::Unavailable(err.to_string()));
            }
        };

        let resolver = DataSourceResolver::new(
            &self.config.archive_formats,
            &self.config.catalog_file_name,
            &self.config.metadata_file_name,
        );
        let artifacts = resolver.resolve(&archive_id, &record.accession_number, &document);

        audit.append(&AuditEntry {
            title: record.title.clone(),
            author: document.metadata.creator.joined(),
            date: document.metadata.date.joined(),
            description: document.metadata.description.joined(),
            archive_id: archive_id.to_string(),
            accession_number: record.accession_number.clone(),
            output_directory: subdir,
        })?;

        let downloader = ConcurrentDownloader::new(
            &self.archive,
            &self.catalog,
            self.config.max_concurrent_downloads,
            self.config.min_accession_len,
        );
        let report = downloader.download_all(&artifacts, dir.as_std_path(), credential)?;
        tracing::info!(
            sequence,
            written = report.written(),
            skipped = report.skipped(),
            failed = report.failed(),
            "record complete"
        );
        Ok(RecordOutcome::Audited(report))
    }
}
