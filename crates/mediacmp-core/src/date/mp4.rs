use chrono::NaiveDateTime;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::local_from_unix;

/// Seconds between 1904-01-01 (QuickTime epoch) and 1970-01-01.
const QUICKTIME_EPOCH_OFFSET: u64 = 2_082_844_800;

/// Creation time recorded in the `moov/mvhd` box of an MP4/M4V file.
///
/// Informational: shown in reports, not used to decide anything.
pub fn read_media_created(path: &Path) -> io::Result<Option<NaiveDateTime>> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    media_created_from(&mut BufReader::new(file), len)
}

pub fn media_created_from<R: Read + Seek>(reader: &mut R, len: u64) -> io::Result<Option<NaiveDateTime>> {
    match creation_seconds(reader, len) {
        Ok(Some(secs)) if secs > QUICKTIME_EPOCH_OFFSET => {
            let unix = i64::try_from(secs - QUICKTIME_EPOCH_OFFSET).ok();
            Ok(unix.and_then(|s| local_from_unix(s, 0)))
        }
        Ok(_) => Ok(None),
        // truncated or lying box sizes
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e),
    }
}

fn creation_seconds<R: Read + Seek>(reader: &mut R, len: u64) -> io::Result<Option<u64>> {
    let Some((moov_start, moov_end)) = find_box(reader, 0, len, b"moov")? else {
        return Ok(None);
    };
    let Some((mvhd_start, _)) = find_box(reader, moov_start, moov_end, b"mvhd")? else {
        return Ok(None);
    };

    reader.seek(SeekFrom::Start(mvhd_start))?;
    let mut version_flags = [0u8; 4];
    reader.read_exact(&mut version_flags)?;

    let secs = if version_flags[0] == 1 {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        u64::from_be_bytes(buf)
    } else {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        u32::from_be_bytes(buf) as u64
    };
    Ok(Some(secs))
}

/// Scan sibling boxes in `[start, end)` for `kind`; returns its payload range.
fn find_box<R: Read + Seek>(
    reader: &mut R,
    start: u64,
    end: u64,
    kind: &[u8; 4],
) -> io::Result<Option<(u64, u64)>> {
    let mut pos = start;
    while pos.saturating_add(8) <= end {
        reader.seek(SeekFrom::Start(pos))?;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;

        let size32 = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let (size, header_len) = match size32 {
            0 => (end - pos, 8),
            1 => {
                let mut large = [0u8; 8];
                reader.read_exact(&mut large)?;
                (u64::from_be_bytes(large), 16)
            }
            n => (n as u64, 8),
        };
        if size < header_len {
            return Ok(None);
        }
        if &header[4..8] == kind {
            return Ok(Some((pos + header_len, pos.saturating_add(size).min(end))));
        }
        pos = pos.saturating_add(size);
    }
    Ok(None)
}
