use std::fs;
use std::io;
use std::path::Path;

use chrono::NaiveDateTime;
use filetime::FileTime;

use crate::date;
use crate::error::{Error, Result};
use crate::media::{MediaFile, MediaKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub modified: NaiveDateTime,
}

/// Per-file metadata lookups the decision engine depends on.
///
/// "Not there" is `Ok(None)`; `Err` is reserved for I/O that actually failed.
pub trait MetadataSource: Send + Sync {
    fn stat(&self, path: &Path) -> io::Result<FileStat>;

    /// EXIF DateTimeDigitized of a photo.
    fn date_digitized(&self, path: &Path) -> io::Result<Option<NaiveDateTime>>;

    /// Container creation time of a video.
    fn media_created(&self, path: &Path) -> io::Result<Option<NaiveDateTime>>;
}

/// Reads straight from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMetadata;

impl MetadataSource for FsMetadata {
    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let meta = fs::metadata(path)?;
        let mtime = FileTime::from_last_modification_time(&meta);
        let modified = date::local_from_unix(mtime.unix_seconds(), mtime.nanoseconds()).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "modification time out of range")
        })?;
        Ok(FileStat {
            size: meta.len(),
            modified,
        })
    }

    fn date_digitized(&self, path: &Path) -> io::Result<Option<NaiveDateTime>> {
        date::exif::read_date_digitized(path)
    }

    fn media_created(&self, path: &Path) -> io::Result<Option<NaiveDateTime>> {
        date::mp4::read_media_created(path)
    }
}

/// Build the [`MediaFile`] record for one side of a pair.
///
/// Size, mtime and photo capture dates feed the decision, so failing to read
/// them is an error. The video creation time is only reported: a failed read
/// is pushed onto `warnings` and the record carries `None`.
pub fn load_media_file(
    source: &dyn MetadataSource,
    path: &Path,
    kind: MediaKind,
    warnings: &mut Vec<String>,
) -> Result<MediaFile> {
    let wrap = |e: io::Error| Error::Metadata {
        path: path.to_path_buf(),
        source: e,
    };

    let stat = source.stat(path).map_err(wrap)?;
    let file = MediaFile::new(path, stat.size, stat.modified);

    Ok(match kind {
        MediaKind::Photo => file.with_capture_date(source.date_digitized(path).map_err(wrap)?),
        MediaKind::Video => match source.media_created(path) {
            Ok(created) => file.with_media_created(created),
            Err(e) => {
                let e = wrap(e);
                tracing::warn!(error = %e, "video creation time unavailable");
                warnings.push(e.to_string());
                file
            }
        },
    })
}
