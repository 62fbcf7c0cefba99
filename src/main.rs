//! gitsnap - export commit attribution snapshots
//!
//! This is the command-line entry point.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gitsnap::export::{
    ExportConfig, ExportSummary, Exporter, FileConfig, SinkConfig, SinkKind, DEFAULT_CONFIG_FILE,
};
use gitsnap::sink::{JsonLinesSink, MemorySink, SnapshotSink, SqliteSink};

#[derive(Parser, Debug)]
#[command(name = "gitsnap", version)]
#[command(about = "Attribute every commit of a repository to a release or branch and snapshot the result")]
struct Cli {
    /// Repository to export (work tree, .git dir or bare repo)
    #[arg(long, short = 'r', env = "GITSNAP_REPO")]
    repo: Option<PathBuf>,

    /// Name recorded with the snapshot (default: repository directory name)
    #[arg(long)]
    name: Option<String>,

    /// Config file (default: ./gitsnap.toml if present)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Write the snapshot to this SQLite database
    #[arg(long, value_name = "PATH", conflicts_with_all = ["jsonl", "dry_run"])]
    sqlite: Option<PathBuf>,

    /// Write the snapshot as JSON lines to PATH, or stdout when no path is given
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "-", conflicts_with = "dry_run")]
    jsonl: Option<PathBuf>,

    /// Run the export without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Regex for release names; group 1 is the component, group 2 the version
    #[arg(long)]
    release_pattern: Option<String>,

    /// Print the run summary as JSON
    #[arg(long)]
    summary_json: bool,

    /// Log every root
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::load_optional(DEFAULT_CONFIG_FILE)?,
    };

    let mut config = ExportConfig::from_file(&file).verbose(cli.verbose);
    if let Some(repo) = &cli.repo {
        config.repo_path = repo.clone();
    }
    if let Some(name) = &cli.name {
        config = config.repo_name(name.clone());
    }
    if let Some(pattern) = &cli.release_pattern {
        config = config.release_pattern(pattern.clone());
    }

    let sink_config = select_sink(&cli, file.sink)?;
    if cli.summary_json && writes_stdout(&sink_config) {
        bail!("--summary-json cannot share stdout with --jsonl; give --jsonl a path");
    }

    let exporter = Exporter::open(config)
        .context("cannot start export")?
        .with_progress(progress_bar(cli.summary_json)?);

    let mut sink = open_sink(&sink_config)?;
    info!(repo = %exporter.repo_name(), sink = ?sink_config.kind, "starting export");
    let summary = exporter.export(sink.as_mut()).context("export failed")?;

    if cli.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if writes_stdout(&sink_config) {
        eprint!("{}", render_summary(&summary));
    } else {
        print!("{}", render_summary(&summary));
    }
    Ok(())
}

/// CLI flags win over the config file.
fn select_sink(cli: &Cli, from_file: Option<SinkConfig>) -> Result<SinkConfig> {
    let config = if cli.dry_run {
        SinkConfig::memory()
    } else if let Some(path) = &cli.sqlite {
        SinkConfig::sqlite(path.clone())
    } else if let Some(path) = &cli.jsonl {
        let path = (path.as_os_str() != "-").then(|| path.clone());
        SinkConfig::jsonl(path)
    } else if let Some(config) = from_file {
        config
    } else {
        bail!("no sink configured: pass --sqlite, --jsonl or --dry-run, or set [sink] in {}", DEFAULT_CONFIG_FILE);
    };
    config.validate()?;
    Ok(config)
}

fn writes_stdout(config: &SinkConfig) -> bool {
    config.kind == SinkKind::Jsonl && config.path.is_none()
}

fn open_sink(config: &SinkConfig) -> Result<Box<dyn SnapshotSink>> {
    Ok(match (config.kind, &config.path) {
        (SinkKind::Memory, _) => Box::new(MemorySink::new()),
        (SinkKind::Jsonl, None) => Box::new(JsonLinesSink::stdout()),
        (SinkKind::Jsonl, Some(path)) => Box::new(
            JsonLinesSink::create(path).with_context(|| format!("cannot create {}", path.display()))?,
        ),
        (SinkKind::Sqlite, Some(path)) => {
            let sink = SqliteSink::open(path)
                .with_context(|| format!("cannot open database {}", path.display()))?;
            sink.ping()?;
            Box::new(sink)
        }
        (SinkKind::Sqlite, None) => bail!("sqlite sink needs a path"),
    })
}

fn progress_bar(quiet: bool) -> Result<ProgressBar> {
    if quiet || !io::stderr().is_terminal() {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} roots {msg}")?
            .progress_chars("█▓▒░  "),
    );
    Ok(bar)
}

fn render_summary(summary: &ExportSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("snapshot {} ({})\n", summary.snapshot_id, summary.repo_name));
    out.push_str(&format!(
        "  releases: {}  branches: {}  ignored refs: {}\n",
        summary.releases, summary.branches, summary.ignored_refs
    ));
    out.push_str(&format!(
        "  commits: {}  skipped roots: {}  anomalies: {}\n",
        summary.commits,
        summary.skipped_roots,
        summary.anomalies.len()
    ));
    for anomaly in &summary.anomalies {
        out.push_str(&format!("    {}\n", anomaly));
    }
    out.push_str(&format!("  elapsed: {} ms\n", summary.elapsed_ms));
    out
}
