use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::authority::select_inferior;
use crate::date::UNKNOWN_DATE;
use crate::error::{Error, Result};
use crate::media::{MediaFile, MediaKind, Side};
use crate::metadata::{load_media_file, MetadataSource};
use crate::similarity::{evaluate, Rule, Verdict};
use crate::MatchRules;

/// Two same-named files, one per directory, with a recognized extension.
#[derive(Debug, Clone)]
pub struct CandidatePair {
    pub filename: String,
    pub kind: MediaKind,
    pub source: PathBuf,
    pub target: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Decision {
    /// Photos whose capture dates disagree: different assets.
    Skip,
    Flag { inferior: Side, rule: Rule },
}

/// Everything learned about one pair.
#[derive(Debug, Clone, Serialize)]
pub struct PairOutcome {
    pub filename: String,
    pub kind: MediaKind,
    pub filename_date: Option<NaiveDateTime>,
    pub source: MediaFile,
    pub target: MediaFile,
    pub decision: Decision,
    /// Non-fatal problems met while loading the pair
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Set when the inferior copy could not be marked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark_error: Option<String>,
}

impl PairOutcome {
    /// Path the marker should be applied to, if any.
    pub fn inferior_path(&self) -> Option<&Path> {
        match self.decision {
            Decision::Skip => None,
            Decision::Flag { inferior: Side::Source, .. } => Some(self.source.path.as_path()),
            Decision::Flag { inferior: Side::Target, .. } => Some(self.target.path.as_path()),
        }
    }

    /// The inferior path, unless marking it failed.
    pub fn flagged_path(&self) -> Option<&Path> {
        match self.mark_error {
            Some(_) => None,
            None => self.inferior_path(),
        }
    }
}

/// Names of the regular files directly inside `dir`, sorted.
pub fn list_file_names(dir: &Path) -> Result<BTreeSet<String>> {
    let wrap = |e: std::io::Error| Error::Directory {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut names = BTreeSet::new();
    for entry in fs::read_dir(dir).map_err(wrap)? {
        let entry = entry.map_err(wrap)?;
        let file_type = entry.file_type().map_err(wrap)?;
        let is_file = file_type.is_file() || (file_type.is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => {
                names.insert(name);
            }
            Err(raw) => tracing::warn!(name = ?raw, dir = %dir.display(), "skipping non UTF-8 file name"),
        }
    }
    Ok(names)
}

/// Exact-name intersection of the two directory listings.
pub fn common_file_names(source_dir: &Path, target_dir: &Path) -> Result<Vec<String>> {
    let source = list_file_names(source_dir)?;
    let target = list_file_names(target_dir)?;
    Ok(source.intersection(&target).cloned().collect())
}

/// Split common names into candidate pairs; returns the pairs and how many
/// names had no recognized extension.
pub fn candidate_pairs(
    names: &[String],
    source_dir: &Path,
    target_dir: &Path,
    rules: &MatchRules,
) -> (Vec<CandidatePair>, usize) {
    let mut pairs = Vec::with_capacity(names.len());
    let mut unrecognized = 0;

    for name in names {
        match rules.extensions.classify(name) {
            Some(kind) => pairs.push(CandidatePair {
                filename: name.clone(),
                kind,
                source: source_dir.join(name),
                target: target_dir.join(name),
            }),
            None => {
                tracing::debug!(filename = %name, "unrecognized extension, ignoring");
                unrecognized += 1;
            }
        }
    }
    (pairs, unrecognized)
}

/// Pure part of the pipeline: ladder verdict, then authority.
pub fn decide(
    kind: MediaKind,
    source: &MediaFile,
    target: &MediaFile,
    filename_date: NaiveDateTime,
    rules: &MatchRules,
) -> Decision {
    match evaluate(kind, source, target, filename_date, &rules.margins) {
        Verdict::CaptureDateMismatch => Decision::Skip,
        Verdict::Same(rule) => Decision::Flag {
            inferior: select_inferior(rule.authority(), source, target),
            rule,
        },
    }
}

/// Load both sides of `pair` and decide it.
pub fn evaluate_pair(pair: &CandidatePair, rules: &MatchRules, metadata: &dyn MetadataSource) -> Result<PairOutcome> {
    let mut warnings = Vec::new();
    let source = load_media_file(metadata, &pair.source, pair.kind, &mut warnings)?;
    let target = load_media_file(metadata, &pair.target, pair.kind, &mut warnings)?;
    let filename_date = rules.filename_date.extract(&pair.filename);

    let decision = decide(
        pair.kind,
        &source,
        &target,
        filename_date.unwrap_or(UNKNOWN_DATE),
        rules,
    );
    tracing::debug!(filename = %pair.filename, ?decision, "pair evaluated");

    Ok(PairOutcome {
        filename: pair.filename.clone(),
        kind: pair.kind,
        filename_date,
        source,
        target,
        decision,
        warnings,
        mark_error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_common_names_single_level_files_only() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        for name in ["a.jpg", "b.mp4", "only_src.jpg", "c.png"] {
            File::create(src.path().join(name)).unwrap();
        }
        for name in ["a.jpg", "b.mp4", "only_dst.jpg", "c.png", "A.JPG"] {
            File::create(dst.path().join(name)).unwrap();
        }
        fs::create_dir(src.path().join("nested")).unwrap();
        fs::create_dir(dst.path().join("nested")).unwrap();
        File::create(src.path().join("nested").join("d.jpg")).unwrap();
        File::create(dst.path().join("nested").join("d.jpg")).unwrap();

        let names = common_file_names(src.path(), dst.path()).unwrap();
        assert_eq!(names, vec!["a.jpg", "b.mp4", "c.png"]);
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let src = tempdir().unwrap();
        let err = common_file_names(src.path(), &src.path().join("missing")).unwrap_err();
        assert!(matches!(err, Error::Directory { .. }));
    }

    #[test]
    fn test_candidate_pairs_classify() {
        let rules = MatchRules::default();
        let names: Vec<String> = ["a.jpg", "b.MP4", "c.png", "notes"].iter().map(|s| s.to_string()).collect();
        let (pairs, unrecognized) = candidate_pairs(&names, Path::new("/src"), Path::new("/dst"), &rules);

        assert_eq!(unrecognized, 2);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].kind, MediaKind::Photo);
        assert_eq!(pairs[0].source, Path::new("/src/a.jpg"));
        assert_eq!(pairs[0].target, Path::new("/dst/a.jpg"));
        assert_eq!(pairs[1].kind, MediaKind::Video);
    }

    #[test]
    fn test_decide_maps_rule_to_side() {
        let rules = MatchRules::default();
        let t = NaiveDateTime::default();
        let small = MediaFile::new("s", 100, t);
        let big = MediaFile::new("b", 200, t);

        assert_eq!(
            decide(MediaKind::Video, &big, &small, t, &rules),
            Decision::Flag { inferior: Side::Source, rule: Rule::BothTimesMatch }
        );
        assert_eq!(
            decide(MediaKind::Video, &small, &big, UNKNOWN_DATE, &rules),
            Decision::Flag { inferior: Side::Target, rule: Rule::Fallback }
        );
    }
}
