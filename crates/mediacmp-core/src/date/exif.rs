use chrono::NaiveDateTime;
use exif::{In, Reader, Tag};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek};
use std::path::Path;

/// Read the EXIF DateTimeDigitized tag of the image at `path`.
///
/// A file without EXIF, without the tag, or with an unparseable value yields
/// `Ok(None)`. Only real I/O failures are errors.
pub fn read_date_digitized(path: &Path) -> io::Result<Option<NaiveDateTime>> {
    let file = File::open(path)?;
    date_digitized_from(&mut BufReader::new(file))
}

pub fn date_digitized_from<R: BufRead + Seek>(reader: &mut R) -> io::Result<Option<NaiveDateTime>> {
    let data = match Reader::new().read_from_container(reader) {
        Ok(data) => data,
        Err(exif::Error::Io(e)) if e.kind() != io::ErrorKind::UnexpectedEof => return Err(e),
        // Not an image, no APP1 segment, truncated, broken IFDs...
        Err(_) => return Ok(None),
    };

    let Some(field) = data.get_field(Tag::DateTimeDigitized, In::PRIMARY) else {
        return Ok(None);
    };
    Ok(parse_exif_datetime(&field.display_value().to_string()))
}

/// EXIF datetimes have no timezone info - they are local time as-is.
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let cleaned = s
        .trim_matches('"')
        .replace('-', ":")
        .replace('/', ":")
        .replace('.', ":");

    NaiveDateTime::parse_from_str(&cleaned, "%Y:%m:%d %H:%M:%S").ok()
}
