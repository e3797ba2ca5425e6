pub mod authority;
pub mod date;
pub mod error;
pub mod marker;
pub mod media;
pub mod metadata;
pub mod pairing;
pub mod report;
pub mod similarity;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::TimeDelta;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub use error::{Error, Result};
pub use marker::{DryRunMarker, FsMarker, ReadOnlyMarker};
pub use media::{MediaFile, MediaKind, Side};
pub use metadata::{FsMetadata, MetadataSource};
pub use pairing::{Decision, PairOutcome};

use date::filename::{FilenameDatePattern, DEFAULT_FORMAT, DEFAULT_PATTERN};
use media::ExtensionSets;
use pairing::CandidatePair;
use similarity::{Margins, DEFAULT_SIZE_MARGIN, DEFAULT_TIME_MARGIN_SECS};

/// Default config file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "mediacmp.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompareOptions {
    /// Backup/archive directory
    pub source_dir: PathBuf,
    /// Device-synced directory
    pub target_dir: PathBuf,
    pub size_margin: f64,
    pub time_margin_secs: i64,
    pub filename_pattern: String,
    pub filename_format: String,
    pub photo_extensions: Vec<String>,
    pub video_extensions: Vec<String>,
    /// Decide and report, but never touch permissions
    pub dry_run: bool,
    /// Evaluate pairs on the rayon pool
    pub parallel: bool,
    /// Where to write the JSON decision report
    pub report: Option<PathBuf>,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::new(),
            target_dir: PathBuf::new(),
            size_margin: DEFAULT_SIZE_MARGIN,
            time_margin_secs: DEFAULT_TIME_MARGIN_SECS,
            filename_pattern: DEFAULT_PATTERN.to_string(),
            filename_format: DEFAULT_FORMAT.to_string(),
            photo_extensions: vec!["jpg".to_string(), "jpeg".to_string()],
            video_extensions: vec!["mp4".to_string(), "m4v".to_string()],
            dry_run: false,
            parallel: false,
            report: None,
        }
    }
}

impl CompareOptions {
    pub fn new(source_dir: impl Into<PathBuf>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            target_dir: target_dir.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML config; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_dir.as_os_str().is_empty() {
            return Err(Error::Config("source directory is not set".into()));
        }
        if self.target_dir.as_os_str().is_empty() {
            return Err(Error::Config("target directory is not set".into()));
        }
        if !self.size_margin.is_finite() || self.size_margin < 0.0 {
            return Err(Error::Config(format!("size margin must be a non-negative number, got {}", self.size_margin)));
        }
        if self.time_margin_secs < 0 {
            return Err(Error::Config(format!("time margin must be non-negative, got {}s", self.time_margin_secs)));
        }
        if self.filename_format.is_empty() {
            return Err(Error::Config("filename date format is empty".into()));
        }
        regex::Regex::new(&self.filename_pattern)?;
        if self.photo_extensions.is_empty() || self.video_extensions.is_empty() {
            return Err(Error::Config("photo and video extension lists must not be empty".into()));
        }
        let photo: Vec<String> = self.photo_extensions.iter().map(|e| media::normalize_extension(e)).collect();
        let video: Vec<String> = self.video_extensions.iter().map(|e| media::normalize_extension(e)).collect();
        if photo.iter().chain(&video).any(|e| e.is_empty()) {
            return Err(Error::Config("extensions must not be empty".into()));
        }
        if let Some(ext) = video.iter().find(|e| photo.contains(e)) {
            return Err(Error::Config(format!("extension '{ext}' is listed as both photo and video")));
        }
        Ok(())
    }
}

/// Compiled, immutable form of the matching-related options.
#[derive(Debug, Clone, Default)]
pub struct MatchRules {
    pub margins: Margins,
    pub filename_date: FilenameDatePattern,
    pub extensions: ExtensionSets,
}

impl MatchRules {
    pub fn from_options(options: &CompareOptions) -> Result<Self> {
        options.validate()?;
        let time = TimeDelta::try_seconds(options.time_margin_secs)
            .ok_or_else(|| Error::Config(format!("time margin {}s is out of range", options.time_margin_secs)))?;

        Ok(Self {
            margins: Margins {
                size: options.size_margin,
                time,
            },
            filename_date: FilenameDatePattern::new(&options.filename_pattern, &options.filename_format)?,
            extensions: ExtensionSets::new(&options.photo_extensions, &options.video_extensions),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessResult {
    /// Names present in both directories
    pub common_files: u64,
    /// Common names without a photo/video extension
    pub unrecognized: u64,
    pub pairs_evaluated: u64,
    pub skipped_capture_mismatch: u64,
    pub flagged_source: u64,
    pub flagged_target: u64,
    /// Pairs abandoned on a metadata or marking error
    pub failed: u64,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Type alias for progress callback
pub type ProgressCallback<'a> = dyn Fn(&str, u64, u64, &str) + Send + Sync + 'a;

/// Throttled progress reporter, emits at most every 200ms or on completion.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback<'a>,
    last_emit: Mutex<Instant>,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(inner: &'a ProgressCallback<'a>) -> Self {
        Self {
            inner,
            last_emit: Mutex::new(Instant::now() - Duration::from_secs(1)),
        }
    }

    pub fn report(&self, stage: &str, current: u64, total: u64, message: &str) {
        let is_done = current + 1 >= total;
        if !is_done {
            let mut last = self.last_emit.lock().unwrap_or_else(|e| e.into_inner());
            if last.elapsed().as_millis() < 200 {
                return;
            }
            *last = Instant::now();
        }
        (self.inner)(stage, current, total, message);
    }
}

/// Compare the two configured directories on the real filesystem.
pub fn process(options: &CompareOptions, progress_callback: &ProgressCallback<'_>) -> Result<ProcessResult> {
    let marker: &dyn ReadOnlyMarker = if options.dry_run { &DryRunMarker } else { &FsMarker };
    process_with(options, &FsMetadata, marker, progress_callback)
}

/// Run the pipeline with explicit metadata and marker implementations.
pub fn process_with(
    options: &CompareOptions,
    metadata: &dyn MetadataSource,
    marker: &dyn ReadOnlyMarker,
    progress_callback: &ProgressCallback<'_>,
) -> Result<ProcessResult> {
    let rules = MatchRules::from_options(options)?;
    let tp = ThrottledProgress::new(progress_callback);

    // Stage 1: match names
    let names = pairing::common_file_names(&options.source_dir, &options.target_dir)?;
    let (pairs, unrecognized) = pairing::candidate_pairs(&names, &options.source_dir, &options.target_dir, &rules);
    tracing::info!(
        common = names.len(),
        candidates = pairs.len(),
        unrecognized,
        "matched file names"
    );

    let mut result = ProcessResult {
        common_files: names.len() as u64,
        unrecognized: unrecognized as u64,
        ..Default::default()
    };

    // Stage 2: evaluate pairs (pure apart from metadata reads)
    let total = pairs.len() as u64;
    let counter = AtomicU64::new(0);
    let evaluate_one = |pair: &CandidatePair| {
        let outcome = pairing::evaluate_pair(pair, &rules, metadata);
        let current = counter.fetch_add(1, Ordering::Relaxed);
        tp.report("evaluate", current, total, &pair.filename);
        outcome
    };
    let evaluated: Vec<Result<PairOutcome>> = if options.parallel {
        pairs.par_iter().map(evaluate_one).collect()
    } else {
        pairs.iter().map(evaluate_one).collect()
    };

    // Stage 3: mark, in name order
    let mut outcomes = Vec::with_capacity(evaluated.len());
    for (i, evaluation) in evaluated.into_iter().enumerate() {
        tp.report("mark", i as u64, total, "Marking inferior copies");
        let mut outcome = match evaluation {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "skipping pair");
                result.failed += 1;
                result.warnings.push(e.to_string());
                continue;
            }
        };
        result.pairs_evaluated += 1;
        result.warnings.extend(outcome.warnings.iter().cloned());

        outcome.mark_error = match (outcome.decision, outcome.inferior_path()) {
            (Decision::Flag { inferior, rule }, Some(path)) => match marker.mark_read_only(path) {
                Ok(()) => {
                    match inferior {
                        Side::Source => result.flagged_source += 1,
                        Side::Target => result.flagged_target += 1,
                    }
                    tracing::info!(path = %path.display(), ?rule, "marked read-only");
                    None
                }
                Err(source) => {
                    let e = Error::Mark {
                        path: path.to_path_buf(),
                        source,
                    };
                    tracing::warn!(error = %e, "marking failed");
                    result.failed += 1;
                    result.warnings.push(e.to_string());
                    Some(e.to_string())
                }
            },
            _ => {
                tracing::info!(filename = %outcome.filename, "capture dates differ, not the same asset");
                result.skipped_capture_mismatch += 1;
                None
            }
        };
        outcomes.push(outcome);
    }

    if let Some(report_path) = &options.report {
        report::write_report(report_path, &outcomes, &result, options.dry_run)?;
        tracing::info!(path = %report_path.display(), "report written");
    }

    tracing::info!(
        evaluated = result.pairs_evaluated,
        flagged_source = result.flagged_source,
        flagged_target = result.flagged_target,
        skipped = result.skipped_capture_mismatch,
        failed = result.failed,
        "done"
    );
    Ok(result)
}
