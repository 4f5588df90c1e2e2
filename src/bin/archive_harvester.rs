use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use archive_harvester::archive::ArchiveHttpClient;
use archive_harvester::catalog::CatalogHttpClient;
use archive_harvester::config::{Credential, CredentialLoader, HarvestConfig, report_path_for};
use archive_harvester::error::HarvestError;
use archive_harvester::harvest::Harvester;
use archive_harvester::output::{JsonOutput, OutputMode};
use archive_harvester::records::RecordStore;
use archive_harvester::report;

#[derive(Parser)]
#[command(name = "archive-harvester")]
#[command(about = "Harvest archive metadata, text files and catalog records for a batch of items")]
#[command(version, author)]
struct Cli {
    /// Print results as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Convert (optionally) and harvest a batch of records")]
    Harvest(HarvestArgs),
    #[command(about = "Convert a tab-delimited export into a records file")]
    Convert(ConvertArgs),
    #[command(about = "Write a tab-delimited report from an audit log")]
    Report(ReportArgs),
}

#[derive(Args)]
struct HarvestArgs {
    /// Tab-delimited export; converted into --records before harvesting.
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long, default_value = "theses-data.json")]
    records: PathBuf,
    #[arg(long)]
    output: PathBuf,
    /// JSON file holding the catalog key, e.g. {"Comment": "", "Key": "..."}.
    #[arg(long)]
    credentials: Option<PathBuf>,
    /// JSON settings file; unset fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    audit_log: Option<PathBuf>,
    #[arg(long)]
    workers: Option<usize>,
    #[arg(long)]
    no_report: bool,
}

#[derive(Args)]
struct ConvertArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long, default_value = "theses-data.json")]
    records: PathBuf,
}

#[derive(Args)]
struct ReportArgs {
    #[arg(long, default_value = "audit.log")]
    audit_log: PathBuf,
    /// Defaults to the audit log path with a csv extension.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<HarvestError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &HarvestError) -> u8 {
    match error {
        HarvestError::MissingInput
        | HarvestError::MissingOutput
        | HarvestError::InputRead(_)
        | HarvestError::ConfigRead(_) => 2,
        HarvestError::AuditWrite(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    match cli.command {
        Command::Harvest(args) => run_harvest(args, mode),
        Command::Convert(args) => {
            let count = RecordStore::convert(&args.input, &args.records)?;
            print_count(mode, "convert", count, &args.records)
        }
        Command::Report(args) => {
            let target = args
                .report
                .unwrap_or_else(|| report_path_for(&args.audit_log));
            let count = report::write_report(&args.audit_log, &target)?;
            print_count(mode, "report", count, &target)
        }
    }
}

fn run_harvest(args: HarvestArgs, mode: OutputMode) -> miette::Result<()> {
    let mut config = match &args.config {
        Some(path) => HarvestConfig::load(path)?,
        None => HarvestConfig::default(),
    };
    if let Some(audit_log) = args.audit_log {
        config.failure_log = audit_log.with_file_name(
            config
                .failure_log
                .file_name()
                .unwrap_or_else(|| "audit-failures.log".as_ref()),
        );
        config.audit_log = audit_log;
    }
    if let Some(workers) = args.workers {
        config.max_concurrent_downloads = workers;
    }
    if args.no_report {
        config.write_report = false;
    }

    if let Some(input) = &args.input {
        RecordStore::convert(input, &args.records)?;
    }
    let records = RecordStore::load(&args.records)?;

    let credential = match CredentialLoader::load(args.credentials.as_deref()) {
        Ok(credential) => credential,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring api key file, harvesting archive records only");
            Credential::none()
        }
    };

    let archive = ArchiveHttpClient::new(config.request_timeout())?;
    let catalog = CatalogHttpClient::new(&config.catalog_base_url, config.request_timeout())?;
    let harvester = Harvester::new(config, archive, catalog);
    let outcome = harvester.run(&records, &args.output, &credential)?;

    match mode {
        OutputMode::Json => JsonOutput::print_outcome(&outcome).map_err(miette::Report::msg)?,
        OutputMode::Text => println!("{outcome}"),
    }
    Ok(())
}

fn print_count(
    mode: OutputMode,
    action: &str,
    count: usize,
    path: &std::path::Path,
) -> miette::Result<()> {
    match mode {
        OutputMode::Json => JsonOutput::print_count(action, count).map_err(miette::Report::msg)?,
        OutputMode::Text => println!("{action}: {count} records written to {}", path.display()),
    }
    Ok(())
}
