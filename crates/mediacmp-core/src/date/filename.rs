use chrono::NaiveDateTime;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Camera-style `YYYYMMDD_HHMMSS`, years 2000-2029.
pub const DEFAULT_PATTERN: &str =
    r"(20[0-2][0-9][01][0-9][0-3][0-9]_[0-2][0-9][0-5][0-9][0-5][0-9])";
pub const DEFAULT_FORMAT: &str = "%Y%m%d_%H%M%S";

static DEFAULT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(DEFAULT_PATTERN).unwrap());

/// Regex locating the timestamp in a file stem plus the chrono format it parses with.
#[derive(Debug, Clone)]
pub struct FilenameDatePattern {
    regex: Regex,
    format: String,
}

impl Default for FilenameDatePattern {
    fn default() -> Self {
        Self {
            regex: DEFAULT_RE.clone(),
            format: DEFAULT_FORMAT.to_string(),
        }
    }
}

impl FilenameDatePattern {
    pub fn new(pattern: &str, format: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            format: format.to_string(),
        })
    }

    /// Parse the first timestamp found in the stem of `filename`.
    ///
    /// Only the first match is considered. A match that does not parse
    /// (month 19, hour 29, ...) counts as no date at all.
    pub fn extract(&self, filename: &str) -> Option<NaiveDateTime> {
        let stem = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename);

        let caps = self.regex.captures(stem)?;
        let matched = caps.get(1).or_else(|| caps.get(0))?.as_str();
        let cleaned = matched.replace("IMG_", "");

        match NaiveDateTime::parse_from_str(&cleaned, &self.format) {
            Ok(dt) => Some(dt),
            Err(e) => {
                tracing::warn!(filename, matched, error = %e, "ignoring unparseable filename timestamp");
                None
            }
        }
    }
}
