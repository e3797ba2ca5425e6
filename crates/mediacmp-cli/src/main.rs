use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mediacmp_core::{CompareOptions, CONFIG_FILENAME};

#[derive(Parser)]
#[command(
    name = "mediacmp",
    version,
    about = "Mark the inferior copy of photos/videos shared by a backup directory and a device directory as read-only"
)]
struct Cli {
    /// Backup/archive directory
    source: Option<PathBuf>,

    /// Device-synced directory
    target: Option<PathBuf>,

    /// TOML config file (default: ./mediacmp.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Relative size tolerance, 0.01 = 1%
    #[arg(long)]
    size_margin: Option<f64>,

    /// Modification time tolerance in seconds
    #[arg(long)]
    time_margin: Option<i64>,

    /// Decide and report without changing any file
    #[arg(long)]
    dry_run: bool,

    /// Evaluate pairs in parallel
    #[arg(long)]
    parallel: bool,

    /// Write a JSON report of every decision
    #[arg(long)]
    report: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Warnings only
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    fn options(&self) -> anyhow::Result<CompareOptions> {
        self.options_with_default_config(Path::new(CONFIG_FILENAME))
    }

    /// Config file values, overridden by whatever was given on the command line.
    /// `default_config` is only read when `--config` is absent and the file exists.
    fn options_with_default_config(&self, default_config: &Path) -> anyhow::Result<CompareOptions> {
        let mut options = match &self.config {
            Some(path) => load_config(path)?,
            None if default_config.exists() => load_config(default_config)?,
            None => CompareOptions::default(),
        };

        if let Some(source) = &self.source {
            options.source_dir = source.clone();
        }
        if let Some(target) = &self.target {
            options.target_dir = target.clone();
        }
        if let Some(margin) = self.size_margin {
            options.size_margin = margin;
        }
        if let Some(secs) = self.time_margin {
            options.time_margin_secs = secs;
        }
        if let Some(report) = &self.report {
            options.report = Some(report.clone());
        }
        options.dry_run |= self.dry_run;
        options.parallel |= self.parallel;

        options.validate()?;
        Ok(options)
    }
}

fn load_config(path: &Path) -> anyhow::Result<CompareOptions> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    CompareOptions::from_toml_str(&contents).with_context(|| format!("parsing config {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level())),
        )
        .init();

    let options = cli.options()?;
    tracing::debug!(?options, "effective options");
    let t_total = std::time::Instant::now();

    let pb = ProgressBar::hidden();
    pb.set_style(ProgressStyle::default_bar().template("[{bar:40}] {pos}/{len} {msg}")?);
    let stage_seen = Mutex::new(String::new());

    let result = mediacmp_core::process(&options, &|stage, current, total, message| {
        let mut seen = stage_seen.lock().unwrap_or_else(|e| e.into_inner());
        if *seen != stage {
            *seen = stage.to_string();
            pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
            pb.reset();
            pb.set_length(total);
        }
        pb.set_position(current + 1);
        pb.set_message(format!("{stage}: {message}"));
    })?;
    pb.finish_and_clear();

    for warning in &result.warnings {
        eprintln!("warning: {warning}");
    }
    eprintln!(
        "Done{}! {} common files, {} evaluated, {} source / {} target marked read-only, {} skipped, {} failed ({:.2}s)",
        if options.dry_run { " (dry run)" } else { "" },
        result.common_files,
        result.pairs_evaluated,
        result.flagged_source,
        result.flagged_target,
        result.skipped_capture_mismatch,
        result.failed,
        t_total.elapsed().as_secs_f64()
    );

    Ok(())
}
