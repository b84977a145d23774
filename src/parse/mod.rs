//! Timestamp extraction from raw access-log lines.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{AnalysisError, Result};

/// Matches `[2024-03-22 18:01:31` and captures the date-time part.
/// Anything after the seconds (e.g. `+04:00]`) is ignored.
const TIMESTAMP_PATTERN: &str = r"\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn timestamp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TIMESTAMP_PATTERN).expect("timestamp pattern is a valid regex"))
}

/// Line accounting for one parse pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub lines: usize,
    pub matched: usize,
    pub skipped: usize,
}

/// Extract the first bracketed timestamp from a single line.
///
/// Returns `None` when the line has no token, or when the token is not a
/// real calendar date-time (e.g. month 13).
pub fn parse_line(line: &str) -> Option<NaiveDateTime> {
    let caps = timestamp_regex().captures(line)?;
    let raw = caps.get(1)?.as_str();
    match NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
        Ok(ts) => Some(ts),
        Err(e) => {
            debug!(token = raw, error = %e, "timestamp token is not a valid date-time");
            None
        }
    }
}

/// Parse every line of `reader`, keeping timestamps in file order.
///
/// A read failure aborts the whole pass; a readable source with no
/// matching line yields `EmptyResult`.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<(Vec<NaiveDateTime>, ParseStats)> {
    parse_lines_with(reader, AnalysisError::unreadable_stream)
}

/// Open `path` and parse it. See [`parse_reader`].
pub fn parse_path(path: &Path) -> Result<(Vec<NaiveDateTime>, ParseStats)> {
    let file = File::open(path).map_err(|source| AnalysisError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "parsing log file");
    parse_lines_with(BufReader::new(file), |source| AnalysisError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_lines_with<R, F>(reader: R, on_io_error: F) -> Result<(Vec<NaiveDateTime>, ParseStats)>
where
    R: BufRead,
    F: Fn(std::io::Error) -> AnalysisError,
{
    let mut stats = ParseStats::default();
    let mut timestamps = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(&on_io_error)?;
        stats.lines += 1;
        match parse_line(&line) {
            Some(ts) => timestamps.push(ts),
            None => stats.skipped += 1,
        }
    }
    stats.matched = timestamps.len();

    if timestamps.is_empty() {
        return Err(AnalysisError::EmptyResult { lines: stats.lines });
    }

    info!(lines = stats.lines, matched = stats.matched, skipped = stats.skipped, "parsed log");
    Ok((timestamps, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 22)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_parse_line_with_timezone_suffix() {
        let line = r#"10.0.0.7 - - [2024-03-22 18:01:31+04:00] "GET /index.html HTTP/1.1" 200 512"#;
        assert_eq!(parse_line(line), Some(at(18, 1, 31)));
    }

    #[test]
    fn test_parse_line_uses_first_match_only() {
        let line = "[2024-03-22 18:01:31] retry of [2024-03-22 17:00:00]";
        assert_eq!(parse_line(line), Some(at(18, 1, 31)));
    }

    #[test]
    fn test_parse_line_without_token() {
        assert_eq!(parse_line("GET /health 200"), None);
        // Different layout: no bracket before the date.
        assert_eq!(parse_line("2024-03-22 18:01:31 GET /"), None);
        // ISO 'T' separator does not match the fixed format.
        assert_eq!(parse_line("[2024-03-22T18:01:31]"), None);
    }

    #[test]
    fn test_parse_line_invalid_calendar_date() {
        assert_eq!(parse_line("[2024-13-45 18:01:31] GET /"), None);
    }

    #[test]
    fn test_parse_reader_skips_noise_and_keeps_file_order() {
        let log = "\
[2024-03-22 18:01:32] b
garbage line
[2024-03-22 18:01:31] a

[2024-03-22 18:01:32] c
";
        let (ts, stats) = parse_reader(Cursor::new(log)).unwrap();
        assert_eq!(ts, vec![at(18, 1, 32), at(18, 1, 31), at(18, 1, 32)]);
        assert_eq!(stats, ParseStats { lines: 5, matched: 3, skipped: 2 });
    }

    #[test]
    fn test_parse_reader_empty_source() {
        let err = parse_reader(Cursor::new("")).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyResult { lines: 0 }));
    }

    #[test]
    fn test_parse_reader_no_matches() {
        let err = parse_reader(Cursor::new("one\ntwo\n")).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyResult { lines: 2 }));
    }

    #[test]
    fn test_parse_path_missing_file() {
        let err = parse_path(Path::new("/nonexistent/logspike/server.log")).unwrap_err();
        assert!(matches!(err, AnalysisError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_parse_reader_invalid_utf8_is_unreadable() {
        let bytes: &[u8] = b"[2024-03-22 18:01:31] ok\n\xff\xfe broken\n";
        let err = parse_reader(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, AnalysisError::SourceUnavailable { .. }));
    }
}
