mod common;

use std::fs;
use std::time::{Duration, Instant};

use assert_matches::assert_matches;

use archive_harvester::config::Credential;
use archive_harvester::domain::{ArchiveId, ArtifactDescriptor};
use archive_harvester::download::{ArtifactOutcome, ConcurrentDownloader};
use archive_harvester::error::HarvestError;

use common::{MockArchive, MockCatalog};

const IA1: &str = "https://x/details/ia1";

fn archive_id() -> ArchiveId {
    IA1.parse().unwrap()
}

fn catalog_artifact(accession: &str) -> ArtifactDescriptor {
    ArtifactDescriptor::bibliographic_record("worldcat.xml", accession)
}

#[test]
fn waits_for_slowest_fetch_before_returning() {
    let temp = tempfile::tempdir().unwrap();
    let slow = Duration::from_millis(300);
    let archive = MockArchive::default()
        .with_slow_file(IA1, "slow.pdf", b"slow", slow)
        .with_file(IA1, "fast1.txt", b"1")
        .with_file(IA1, "fast2.txt", b"2")
        .with_file(IA1, "fast3.txt", b"3");
    let catalog = MockCatalog::default();
    let downloader = ConcurrentDownloader::new(&archive, &catalog, 8, 5);

    let id = archive_id();
    let artifacts = ["slow.pdf", "fast1.txt", "fast2.txt", "fast3.txt"]
        .iter()
        .map(|name| ArtifactDescriptor::archive_file(*name, "1234567", &id))
        .collect::<Vec<_>>();

    let start = Instant::now();
    let report = downloader
        .download_all(&artifacts, temp.path(), &Credential::none())
        .unwrap();
    assert!(start.elapsed() >= slow);

    assert_eq!(report.written(), 4);
    for name in ["slow.pdf", "fast1.txt", "fast2.txt", "fast3.txt"] {
        assert!(temp.path().join(name).is_file(), "{name} missing");
    }
    let names = report
        .outcomes
        .iter()
        .map(|o| o.file_name().to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["slow.pdf", "fast1.txt", "fast2.txt", "fast3.txt"]);
}

#[test]
fn single_worker_still_fetches_everything() {
    let temp = tempfile::tempdir().unwrap();
    let mut archive = MockArchive::default();
    let id = archive_id();
    let mut artifacts = Vec::new();
    for i in 0..20 {
        let name = format!("part{i:02}.txt");
        archive = archive.with_file(IA1, &name, name.as_bytes());
        artifacts.push(ArtifactDescriptor::archive_file(name, "1234567", &id));
    }
    let catalog = MockCatalog::default();
    let downloader = ConcurrentDownloader::new(&archive, &catalog, 1, 5);

    let report = downloader
        .download_all(&artifacts, &temp.path().join("00001"), &Credential::none())
        .unwrap();
    assert_eq!(report.written(), 20);
    assert_eq!(
        fs::read_dir(temp.path().join("00001")).unwrap().count(),
        20
    );
}

#[test]
fn one_failure_does_not_cancel_siblings() {
    let temp = tempfile::tempdir().unwrap();
    let archive = MockArchive::default().with_file(IA1, "ok.pdf", b"ok");
    let catalog = MockCatalog::failing();
    let downloader = ConcurrentDownloader::new(&archive, &catalog, 4, 5);
    let id = archive_id();
    let artifacts = vec![
        ArtifactDescriptor::archive_file("missing.pdf", "1234567", &id),
        ArtifactDescriptor::archive_file("ok.pdf", "1234567", &id),
        catalog_artifact("1234567"),
    ];

    let report = downloader
        .download_all(&artifacts, temp.path(), &Credential::new("k"))
        .unwrap();
    assert_eq!(report.written(), 1);
    assert_eq!(report.failed(), 2);
    assert_matches!(&report.outcomes[0], ArtifactOutcome::Failed { .. });
    assert_matches!(&report.outcomes[1], ArtifactOutcome::Written { bytes: 2, .. });
    assert!(temp.path().join("ok.pdf").is_file());
    assert!(!temp.path().join("worldcat.xml").exists());
}

#[test]
fn catalog_fetch_needs_credential_and_long_accession() {
    let cases = [
        ("", "123456", false),
        ("abc123", "12", false),
        ("abc123", "1234", false),
        ("abc123", "123456", true),
    ];
    for (key, accession, attempted) in cases {
        let temp = tempfile::tempdir().unwrap();
        let archive = MockArchive::default();
        let catalog = MockCatalog::default();
        let calls = catalog.calls();
        let downloader = ConcurrentDownloader::new(&archive, &catalog, 4, 5);

        let report = downloader
            .download_all(
                &[catalog_artifact(accession)],
                temp.path(),
                &Credential::new(key),
            )
            .unwrap();

        assert_eq!(
            !calls.lock().unwrap().is_empty(),
            attempted,
            "key={key:?} accession={accession:?}"
        );
        assert_eq!(temp.path().join("worldcat.xml").exists(), attempted);
        if !attempted {
            assert_matches!(&report.outcomes[0], ArtifactOutcome::Skipped { .. });
        }
    }
}

#[test]
fn existing_files_are_overwritten() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("a.pdf"), b"old contents").unwrap();
    let archive = MockArchive::default().with_file(IA1, "a.pdf", b"new");
    let catalog = MockCatalog::default();
    let downloader = ConcurrentDownloader::new(&archive, &catalog, 2, 5);

    downloader
        .download_all(
            &[ArtifactDescriptor::archive_file("a.pdf", "1", &archive_id())],
            temp.path(),
            &Credential::none(),
        )
        .unwrap();
    assert_eq!(fs::read(temp.path().join("a.pdf")).unwrap(), b"new");
}

#[test]
fn local_write_failure_is_fatal() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("sub"), b"blocks the directory").unwrap();
    let archive = MockArchive::default().with_file(IA1, "sub/a.pdf", b"data");
    let catalog = MockCatalog::default();
    let downloader = ConcurrentDownloader::new(&archive, &catalog, 2, 5);

    let err = downloader
        .download_all(
            &[ArtifactDescriptor::archive_file("sub/a.pdf", "1", &archive_id())],
            temp.path(),
            &Credential::none(),
        )
        .unwrap_err();
    assert_matches!(err, HarvestError::Filesystem(_));
}

#[test]
fn traversal_names_are_skipped() {
    let temp = tempfile::tempdir().unwrap();
    let record_dir = temp.path().join("00001");
    let archive = MockArchive::default().with_file(IA1, "../escape.pdf", b"x");
    let calls = archive.calls();
    let catalog = MockCatalog::default();
    let downloader = ConcurrentDownloader::new(&archive, &catalog, 2, 5);

    let report = downloader
        .download_all(
            &[ArtifactDescriptor::archive_file("../escape.pdf", "1", &archive_id())],
            &record_dir,
            &Credential::none(),
        )
        .unwrap();
    assert_eq!(report.skipped(), 1);
    assert!(calls.lock().unwrap().is_empty());
    assert!(!temp.path().join("escape.pdf").exists());
}

#[test]
fn empty_list_still_creates_directory() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("00007");
    let archive = MockArchive::default();
    let catalog = MockCatalog::default();
    let report = ConcurrentDownloader::new(&archive, &catalog, 4, 5)
        .download_all(&[], &dir, &Credential::none())
        .unwrap();
    assert!(report.outcomes.is_empty());
    assert!(dir.is_dir());
}
