//! Timestamp resolution for segment filenames
//!
//! Producers name segments after their capture instant: the filename starts
//! with a `YYYYMMDD_HHMMSS` token in local civil time. Files that carry the
//! token resolve from the name; anything else falls back to the file's
//! modification time. Resolution never invents a timestamp: a malformed
//! token (month 13, misplaced underscore) is a parse failure, not a clamp.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use std::io;
use std::path::Path;

/// Length of the capture token: 8 date digits, underscore, 6 time digits
const TOKEN_LEN: usize = 15;

/// Parse the leading capture token of a segment filename
///
/// Returns the epoch-millisecond instant the token denotes in local time,
/// or None if the first 15 characters are not a valid token. Trailing
/// characters (extension, producer index suffix) are ignored. On a DST
/// fold the earlier instant wins; a token naming a skipped local time
/// fails the parse.
pub fn parse_stem_timestamp(filename: &str) -> Option<i64> {
    let token = filename.get(..TOKEN_LEN)?;
    let bytes = token.as_bytes();

    if bytes[8] != b'_' {
        return None;
    }
    if !bytes[..8].iter().all(u8::is_ascii_digit) {
        return None;
    }
    if !bytes[9..].iter().all(u8::is_ascii_digit) {
        return None;
    }

    let year: i32 = token[0..4].parse().ok()?;
    let month: u32 = token[4..6].parse().ok()?;
    let day: u32 = token[6..8].parse().ok()?;
    let hour: u32 = token[9..11].parse().ok()?;
    let minute: u32 = token[11..13].parse().ok()?;
    let second: u32 = token[13..15].parse().ok()?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

/// Resolve the capture instant of a segment file
///
/// Filename token first; on parse failure, the file's mtime. Errors only
/// when the fallback needs metadata the filesystem refuses to give, in
/// which case the caller logs and skips the file.
pub fn resolve_timestamp(path: &Path) -> io::Result<i64> {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        if let Some(millis) = parse_stem_timestamp(name) {
            return Ok(millis);
        }
    }

    let modified = std::fs::metadata(path)?.modified()?;
    Ok(DateTime::<Utc>::from(modified).timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn local_millis(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> i64 {
        Local
            .with_ymd_and_hms(y, mo, d, h, mi, s)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn test_parse_canonical_name() {
        assert_eq!(
            parse_stem_timestamp("20240115_143000.mp4"),
            Some(local_millis(2024, 1, 15, 14, 30, 0))
        );
    }

    #[test]
    fn test_parse_ignores_trailing_characters() {
        // Indexed producer names carry the same leading token
        assert_eq!(
            parse_stem_timestamp("20240115_143000_00001.mp4"),
            Some(local_millis(2024, 1, 15, 14, 30, 0))
        );
        assert_eq!(
            parse_stem_timestamp("20240115_143000.wav"),
            Some(local_millis(2024, 1, 15, 14, 30, 0))
        );
    }

    #[test]
    fn test_parse_rejects_malformed_tokens() {
        assert_eq!(parse_stem_timestamp("clip_final.mp4"), None);
        assert_eq!(parse_stem_timestamp("gst_00042.mp4"), None);
        assert_eq!(parse_stem_timestamp(""), None);
        assert_eq!(parse_stem_timestamp("20240115_1430"), None); // too short
        assert_eq!(parse_stem_timestamp("2024011_5143000.mp4"), None); // shifted underscore
        assert_eq!(parse_stem_timestamp("20240115-143000.mp4"), None); // wrong separator
    }

    #[test]
    fn test_parse_rejects_out_of_range_fields() {
        // Out-of-range fields fail instead of clamping
        assert_eq!(parse_stem_timestamp("20241315_143000.mp4"), None); // month 13
        assert_eq!(parse_stem_timestamp("20240132_143000.mp4"), None); // day 32
        assert_eq!(parse_stem_timestamp("20240115_253000.mp4"), None); // hour 25
        assert_eq!(parse_stem_timestamp("20240115_146100.mp4"), None); // minute 61
        assert_eq!(parse_stem_timestamp("20240115_143061.mp4"), None); // second 61
    }

    #[test]
    fn test_resolve_prefers_filename_token() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("20240115_143000.mp4");
        std::fs::write(&path, b"segment data").unwrap();

        // The freshly-written mtime must not leak through
        assert_eq!(
            resolve_timestamp(&path).unwrap(),
            local_millis(2024, 1, 15, 14, 30, 0)
        );
    }

    #[test]
    fn test_resolve_falls_back_to_mtime() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip_final.mp4");
        std::fs::write(&path, b"segment data").unwrap();

        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
        let expected = DateTime::<Utc>::from(modified).timestamp_millis();
        assert_eq!(resolve_timestamp(&path).unwrap(), expected);
    }

    #[test]
    fn test_resolve_missing_file_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.mp4");
        assert!(resolve_timestamp(&path).is_err());
    }
}
