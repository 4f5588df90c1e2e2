//! Fetches all artifacts of one record on a bounded pool of scoped threads.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use serde::Serialize;

use crate::archive::ArchiveClient;
use crate::catalog::CatalogClient;
use crate::config::Credential;
use crate::domain::{ArtifactDescriptor, SourceKind, is_queryable_accession};
use crate::error::HarvestError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ArtifactOutcome {
    Written { file_name: String, bytes: usize },
    Skipped { file_name: String, reason: String },
    Failed { file_name: String, error: String },
}

impl ArtifactOutcome {
    pub fn file_name(&self) -> &str {
        match self {
            ArtifactOutcome::Written { file_name, .. }
            | ArtifactOutcome::Skipped { file_name, .. }
            | ArtifactOutcome::Failed { file_name, .. } => file_name,
        }
    }
}

/// Outcomes in the same order as the descriptors they came from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadReport {
    pub outcomes: Vec<ArtifactOutcome>,
}

impl DownloadReport {
    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, ArtifactOutcome::Written { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ArtifactOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ArtifactOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&ArtifactOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

pub struct ConcurrentDownloader<'a, A: ArchiveClient, C: CatalogClient> {
    archive: &'a A,
    catalog: &'a C,
    max_workers: usize,
    min_accession_len: usize,
}

impl<'a, A: ArchiveClient, C: CatalogClient> ConcurrentDownloader<'a, A, C> {
    pub fn new(
        archive: &'a A,
        catalog: &'a C,
        max_workers: usize,
        min_accession_len: usize,
    ) -> Self {
        Self {
            archive,
            catalog,
            max_workers: max_workers.max(1),
            min_accession_len,
        }
    }

    /// Returns only after every artifact has been written, skipped or has
    /// failed. Remote failures are recorded per artifact; a local write
    /// failure stops new work and is returned once in-flight work is done.
    pub fn download_all(
        &self,
        artifacts: &[ArtifactDescriptor],
        output_dir: &Path,
        credential: &Credential,
    ) -> Result<DownloadReport, HarvestError> {
        fs::create_dir_all(output_dir).map_err(|err| {
            HarvestError::Filesystem(format!("create {}: {err}", output_dir.display()))
        })?;
        if artifacts.is_empty() {
            return Ok(DownloadReport::default());
        }

        let workers = self.max_workers.min(artifacts.len());
        let next = AtomicUsize::new(0);
        let abort = AtomicBool::new(false);
        let (tx, rx) = mpsc::channel();

        let mut slots = thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let (next, abort) = (&next, &abort);
                scope.spawn(move || {
                    while !abort.load(Ordering::Relaxed) {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(artifact) = artifacts.get(index) else {
                            break;
                        };
                        let result = self.download_one(artifact, output_dir, credential);
                        if result.is_err() {
                            abort.store(true, Ordering::Relaxed);
                        }
                        if tx.send((index, result)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(tx);

            let mut slots: Vec<Option<Result<ArtifactOutcome, HarvestError>>> =
                (0..artifacts.len()).map(|_| None).collect();
            // Ends early only if every worker has stopped, i.e. after an abort.
            for (index, result) in rx.iter().take(artifacts.len()) {
                slots[index] = Some(result);
            }
            slots
        });

        let mut outcomes = Vec::with_capacity(slots.len());
        for (slot, artifact) in slots.iter_mut().zip(artifacts) {
            match slot.take() {
                Some(Ok(outcome)) => outcomes.push(outcome),
                Some(Err(err)) => return Err(err),
                None => outcomes.push(ArtifactOutcome::Skipped {
                    file_name: artifact.file_name.clone(),
                    reason: "run aborted".to_string(),
                }),
            }
        }
        Ok(DownloadReport { outcomes })
    }

    fn download_one(
        &self,
        artifact: &ArtifactDescriptor,
        output_dir: &Path,
        credential: &Credential,
    ) -> Result<ArtifactOutcome, HarvestError> {
        let file_name = artifact.file_name.clone();
        let Some(target) = safe_join(output_dir, &file_name) else {
            tracing::warn!(file = %file_name, "refusing file name outside record directory");
            return Ok(ArtifactOutcome::Skipped {
                file_name,
                reason: "unsafe file name".to_string(),
            });
        };

        let fetched = match artifact.source {
            SourceKind::ArchiveFile => {
                let Some(base) = artifact.base_url.as_ref() else {
                    return Ok(ArtifactOutcome::Skipped {
                        file_name,
                        reason: "no archive identifier".to_string(),
                    });
                };
                self.archive.download_file(base, &file_name)
            }
            SourceKind::BibliographicRecord => {
                if !credential.is_configured() {
                    return Ok(ArtifactOutcome::Skipped {
                        file_name,
                        reason: "no catalog credential".to_string(),
                    });
                }
                if !is_queryable_accession(&artifact.accession_number, self.min_accession_len) {
                    return Ok(ArtifactOutcome::Skipped {
                        file_name,
                        reason: "accession number too short".to_string(),
                    });
                }
                self.catalog
                    .fetch_record(&artifact.accession_number, credential)
            }
        };

        match fetched {
            Ok(body) => {
                write_artifact(&target, &body)?;
                tracing::debug!(
                    file = %file_name,
                    bytes = body.len(),
                    source = %artifact.source,
                    "artifact written"
                );
                Ok(ArtifactOutcome::Written {
                    file_name,
                    bytes: body.len(),
                })
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                tracing::warn!(
                    file = %file_name,
                    source = %artifact.source,
                    error = %err,
                    "artifact skipped"
                );
                Ok(ArtifactOutcome::Failed {
                    file_name,
                    error: err.to_string(),
                })
            }
        }
    }
}

/// Joins a remote file name under `dir`, rejecting absolute paths and `..`.
pub fn safe_join(dir: &Path, file_name: &str) -> Option<PathBuf> {
    let relative = Path::new(file_name);
    let mut components = relative.components().peekable();
    components.peek()?;
    if !components.all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(dir.join(relative))
}

/// Writes through a temp file in the same directory, replacing any existing file.
pub fn write_artifact(target: &Path, content: &[u8]) -> Result<(), HarvestError> {
    let parent = target
        .parent()
        .ok_or_else(|| HarvestError::Filesystem("invalid destination path".to_string()))?;
    fs::create_dir_all(parent).map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".artifact")
        .tempfile_in(parent)
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    if target.exists() {
        fs::remove_file(target).map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    }
    temp.persist(target).map_err(|err| {
        HarvestError::Filesystem(format!("write {}: {}", target.display(), err.error))
    })?;
    Ok(())
}
