use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::pairing::PairOutcome;
use crate::ProcessResult;

#[derive(Serialize)]
struct PairRecord<'a> {
    #[serde(flatten)]
    outcome: &'a PairOutcome,
    /// Only set once the file really is read-only (or would be, on a dry run)
    flagged_path: Option<&'a Path>,
}

#[derive(Serialize)]
struct Report<'a> {
    dry_run: bool,
    summary: &'a ProcessResult,
    pairs: Vec<PairRecord<'a>>,
}

/// Write every pair decision plus the run summary as pretty JSON.
pub fn write_report(path: &Path, outcomes: &[PairOutcome], summary: &ProcessResult, dry_run: bool) -> Result<()> {
    let wrap = |e: std::io::Error| Error::Report {
        path: path.to_path_buf(),
        source: e,
    };

    let report = Report {
        dry_run,
        summary,
        pairs: outcomes
            .iter()
            .map(|outcome| PairRecord {
                outcome,
                flagged_path: outcome.flagged_path(),
            })
            .collect(),
    };

    let mut writer = BufWriter::new(File::create(path).map_err(wrap)?);
    serde_json::to_writer_pretty(&mut writer, &report).map_err(|e| wrap(e.into()))?;
    writer.flush().map_err(wrap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaFile, MediaKind, Side};
    use crate::pairing::Decision;
    use crate::similarity::Rule;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    #[test]
    fn test_report_contents() {
        let dir = tempdir().unwrap();
        let t = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        let outcomes = vec![
            PairOutcome {
                filename: "IMG_20210101_100000.jpg".to_string(),
                kind: MediaKind::Photo,
                filename_date: Some(t),
                source: MediaFile::new("/src/IMG_20210101_100000.jpg", 100, t),
                target: MediaFile::new("/dst/IMG_20210101_100000.jpg", 200, t),
                decision: Decision::Flag {
                    inferior: Side::Target,
                    rule: Rule::BothTimesMatch,
                },
                warnings: Vec::new(),
                mark_error: None,
            },
            PairOutcome {
                filename: "IMG_2.jpg".to_string(),
                kind: MediaKind::Photo,
                filename_date: None,
                source: MediaFile::new("/src/IMG_2.jpg", 100, t),
                target: MediaFile::new("/dst/IMG_2.jpg", 100, t),
                decision: Decision::Skip,
                warnings: Vec::new(),
                mark_error: None,
            },
            PairOutcome {
                filename: "VID_3.mp4".to_string(),
                kind: MediaKind::Video,
                filename_date: None,
                source: MediaFile::new("/src/VID_3.mp4", 100, t),
                target: MediaFile::new("/dst/VID_3.mp4", 100, t),
                decision: Decision::Flag {
                    inferior: Side::Target,
                    rule: Rule::EqualSize,
                },
                warnings: Vec::new(),
                mark_error: Some("cannot mark /dst/VID_3.mp4 read-only: denied".to_string()),
            },
        ];
        let summary = ProcessResult {
            common_files: 3,
            pairs_evaluated: 3,
            failed: 1,
            flagged_target: 1,
            skipped_capture_mismatch: 1,
            ..Default::default()
        };

        let path = dir.path().join("report.json");
        write_report(&path, &outcomes, &summary, true).unwrap();

        let json: serde_json::Value = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["summary"]["flagged_target"], 1);
        assert_eq!(json["pairs"][0]["decision"]["action"], "flag");
        assert_eq!(json["pairs"][0]["decision"]["inferior"], "target");
        assert_eq!(json["pairs"][0]["decision"]["rule"], "both_times_match");
        assert_eq!(json["pairs"][0]["flagged_path"], "/dst/IMG_20210101_100000.jpg");
        assert_eq!(json["pairs"][0]["filename_date"], "2021-01-01T10:00:00");
        assert_eq!(json["pairs"][1]["decision"]["action"], "skip");
        assert!(json["pairs"][1]["flagged_path"].is_null());
        assert!(json["pairs"][0].get("mark_error").is_none());
        assert!(json["pairs"][2]["flagged_path"].is_null());
        assert_eq!(json["pairs"][2]["decision"]["inferior"], "target");
        assert!(json["pairs"][2]["mark_error"].as_str().unwrap().contains("denied"));
    }

    #[test]
    fn test_unwritable_report_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");
        let err = write_report(&path, &[], &ProcessResult::default(), false).unwrap_err();
        assert!(matches!(err, Error::Report { .. }));
    }
}
