use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

/// Which directory a file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Backup/archive directory (left)
    Source,
    /// Device-synced directory (right)
    Target,
}

/// Extension lists deciding which file names take part in matching.
/// Stored lowercase without the leading dot.
#[derive(Debug, Clone)]
pub struct ExtensionSets {
    photo: Vec<String>,
    video: Vec<String>,
}

impl ExtensionSets {
    pub fn new<S: AsRef<str>>(photo: &[S], video: &[S]) -> Self {
        Self {
            photo: photo.iter().map(|e| normalize_extension(e.as_ref())).collect(),
            video: video.iter().map(|e| normalize_extension(e.as_ref())).collect(),
        }
    }

    /// Case-insensitive lookup of the text after the last dot, so a bare
    /// `.jpg` counts as a JPEG.
    pub fn classify(&self, filename: &str) -> Option<MediaKind> {
        let (_, ext) = filename.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        let ext = ext.to_lowercase();
        if self.photo.contains(&ext) {
            Some(MediaKind::Photo)
        } else if self.video.contains(&ext) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

impl Default for ExtensionSets {
    fn default() -> Self {
        Self::new(&["jpg", "jpeg"], &["mp4", "m4v"])
    }
}

pub(crate) fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaFile {
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last write time, local
    pub modified: NaiveDateTime,
    /// EXIF DateTimeDigitized (photos only)
    pub capture_date: Option<NaiveDateTime>,
    /// Container creation time (videos only, informational)
    pub media_created: Option<NaiveDateTime>,
}

impl MediaFile {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: NaiveDateTime) -> Self {
        Self {
            path: path.into(),
            size,
            modified,
            capture_date: None,
            media_created: None,
        }
    }

    pub fn with_capture_date(mut self, date: Option<NaiveDateTime>) -> Self {
        self.capture_date = date;
        self
    }

    pub fn with_media_created(mut self, date: Option<NaiveDateTime>) -> Self {
        self.media_created = date;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let sets = ExtensionSets::default();
        assert_eq!(sets.classify("IMG_1.jpg"), Some(MediaKind::Photo));
        assert_eq!(sets.classify("IMG_1.JPEG"), Some(MediaKind::Photo));
        assert_eq!(sets.classify("VID_1.mp4"), Some(MediaKind::Video));
        assert_eq!(sets.classify("VID_1.M4V"), Some(MediaKind::Video));
        assert_eq!(sets.classify("IMG_1.png"), None);
        assert_eq!(sets.classify("README"), None);
        assert_eq!(sets.classify(".jpg"), Some(MediaKind::Photo));
        assert_eq!(sets.classify("IMG_1."), None);
        assert_eq!(sets.classify("archive.tar.MP4"), Some(MediaKind::Video));
    }

    #[test]
    fn test_extensions_are_normalized() {
        let sets = ExtensionSets::new(&[".HEIC"], &[" .Mov "]);
        assert_eq!(sets.classify("a.heic"), Some(MediaKind::Photo));
        assert_eq!(sets.classify("b.mov"), Some(MediaKind::Video));
        assert_eq!(sets.classify("c.jpg"), None);
    }
}
