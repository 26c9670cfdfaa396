//! NDJSON capture to text line conversion

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use tracing::{debug, error, info};

use gnmifmt_common::{DIAGNOSTICS_TARGET, Error as DecodeError, Record};

use crate::config::{OutputSettings, TimeZoneMode};
use crate::error::{ConvertError, Result};
use crate::timestamp::format_timestamp;

/// Counters describing a finished conversion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Input lines read, blank ones included
    pub lines: u64,
    /// Lines decoded into records
    pub records: u64,
    /// Lines that failed to decode
    pub malformed: u64,
    /// Updates dropped because neither prefix nor path was set
    pub skipped_updates: u64,
    /// Output lines written
    pub emitted: u64,
}

/// Streams gNMI NDJSON captures into `[timestamp] path = value` lines
pub struct Converter {
    settings: OutputSettings,
}

impl Converter {
    /// Create a new converter
    pub fn new(settings: OutputSettings) -> Self {
        Self { settings }
    }

    /// Convert the capture at `path`, writing lines to `out`
    pub fn run_file(&self, path: impl AsRef<Path>, out: impl Write) -> Result<Summary> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConvertError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Converting {}", path.display());
        self.run(BufReader::new(file), out)
    }

    /// Convert every line of `reader`, writing lines to `out`
    ///
    /// Lines that are not valid records are reported and skipped. Output for
    /// a record is written before the next line is read.
    pub fn run(&self, mut reader: impl BufRead, mut out: impl Write) -> Result<Summary> {
        let mut summary = Summary::default();
        let mut buf = Vec::new();
        let mut lines = Vec::new();

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| ConvertError::Read {
                    line: summary.lines,
                    source,
                })?;
            if read == 0 {
                break;
            }
            summary.lines += 1;

            let line = buf.trim_ascii();
            if line.is_empty() {
                continue;
            }

            let record = match Record::from_slice(line) {
                Ok(record) => record,
                Err(e) => {
                    summary.malformed += 1;
                    self.report_malformed(summary.lines, line, &e);
                    continue;
                }
            };
            summary.records += 1;

            lines.clear();
            summary.skipped_updates += render_record(&record, self.settings.timezone, &mut lines);

            for text in &lines {
                writeln!(out, "{}", text).map_err(ConvertError::Write)?;
            }
            summary.emitted += lines.len() as u64;
        }

        out.flush().map_err(ConvertError::Write)?;

        debug!(
            lines = summary.lines,
            records = summary.records,
            malformed = summary.malformed,
            skipped_updates = summary.skipped_updates,
            emitted = summary.emitted,
            "Conversion finished"
        );
        Ok(summary)
    }

    fn report_malformed(&self, line_number: u64, line: &[u8], err: &DecodeError) {
        error!(
            target: DIAGNOSTICS_TARGET,
            line = line_number,
            "Malformed record on line {}: {}",
            line_number,
            err
        );
        if let Some(preview) = preview(line, self.settings.preview_chars) {
            error!(target: DIAGNOSTICS_TARGET, line = line_number, "Line preview: {}", preview);
        }
    }
}

/// Format one record as output lines
///
/// One line per value, in update order and then by value key.
pub fn format_record(record: &Record, timezone: TimeZoneMode) -> Vec<String> {
    let mut lines = Vec::new();
    render_record(record, timezone, &mut lines);
    lines
}

/// Append the lines for `record` to `lines`, returning the number of
/// updates skipped for lack of a path.
fn render_record(record: &Record, timezone: TimeZoneMode, lines: &mut Vec<String>) -> u64 {
    if record.updates.is_empty() {
        return 0;
    }

    let timestamp = format_timestamp(record.timestamp, timezone);
    let mut skipped = 0;

    for update in &record.updates {
        let Some(full_path) = record.full_path(update) else {
            if !update.values.is_empty() {
                debug!(
                    "Skipping update without prefix or path ({} values)",
                    update.values.len()
                );
                skipped += 1;
            }
            continue;
        };

        for value in update.values.values() {
            lines.push(format!("[{}] {} = {}", timestamp, full_path, value.render()));
        }
    }

    skipped
}

/// The first `max_chars` characters of `line`, with `...` when cut short
fn preview(line: &[u8], max_chars: usize) -> Option<String> {
    if max_chars == 0 {
        return None;
    }

    let text = String::from_utf8_lossy(line);
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => Some(format!("{}...", &text[..cut])),
        None => Some(text.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};
    use std::sync::{Arc, Mutex};

    use gnmifmt_common::Update;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fn convert(input: &str) -> (String, Summary) {
        let converter = Converter::new(OutputSettings::default());
        let mut out = Vec::new();
        let summary = converter.run(Cursor::new(input), &mut out).unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    #[test]
    fn test_format_record() {
        let record = Record {
            timestamp: 1_700_000_000_000_000_000,
            prefix: "interfaces".to_string(),
            updates: vec![
                Update::new("interface[name=Eth1]/state")
                    .with_value("oper-status", "UP")
                    .with_value("admin-status", "DOWN"),
            ],
            ..Default::default()
        };

        assert_eq!(
            format_record(&record, TimeZoneMode::Utc),
            vec![
                "[2023-11-14T22:13:20Z] interfaces/interface[name=Eth1]/state = DOWN",
                "[2023-11-14T22:13:20Z] interfaces/interface[name=Eth1]/state = UP",
            ]
        );
    }

    #[test]
    fn test_format_record_skips_pathless_update() {
        let record = Record {
            updates: vec![
                Update::new("").with_value("x", 1u64),
                Update::new("system/state").with_value("hostname", "leaf1"),
            ],
            ..Default::default()
        };

        let mut lines = Vec::new();
        let skipped = render_record(&record, TimeZoneMode::Utc, &mut lines);
        assert_eq!(skipped, 1);
        assert_eq!(lines, vec!["[1970-01-01T00:00:00Z] system/state = leaf1"]);
    }

    #[test]
    fn test_run_end_to_end() {
        let (out, summary) = convert(
            r#"{"timestamp":1700000000000000000,"prefix":"interfaces","updates":[{"Path":"interface[name=Eth1]/state","values":{"oper-status":"UP"}}]}"#,
        );

        assert_eq!(
            out,
            "[2023-11-14T22:13:20Z] interfaces/interface[name=Eth1]/state = UP\n"
        );
        assert_eq!(summary.records, 1);
        assert_eq!(summary.emitted, 1);
    }

    #[test]
    fn test_malformed_line_between_valid_lines() {
        let input = concat!(
            r#"{"timestamp":0,"prefix":"a","updates":[{"Path":"b","values":{"v":1}}]}"#,
            "\n",
            "this is not json\n",
            r#"{"timestamp":0,"prefix":"c","updates":[{"Path":"d","values":{"v":2}}]}"#,
            "\n",
        );

        let (out, summary) = convert(input);
        assert_eq!(
            out,
            "[1970-01-01T00:00:00Z] a/b = 1\n[1970-01-01T00:00:00Z] c/d = 2\n"
        );
        assert_eq!(summary.lines, 3);
        assert_eq!(summary.records, 2);
        assert_eq!(summary.malformed, 1);
    }

    #[test]
    fn test_blank_and_crlf_lines() {
        let input = "\n   \r\n{\"prefix\":\"p\",\"updates\":[{\"Path\":\"q\",\"values\":{\"v\":true}}]}\r\n\n";

        let (out, summary) = convert(input);
        assert_eq!(out, "[1970-01-01T00:00:00Z] p/q = true\n");
        assert_eq!(summary.lines, 4);
        assert_eq!(summary.records, 1);
        assert_eq!(summary.malformed, 0);
    }

    #[test]
    fn test_invalid_utf8_is_not_fatal() {
        let mut input = b"{\"prefix\":\"\xff\"}\n".to_vec();
        input.extend_from_slice(b"{\"prefix\":\"ok\",\"updates\":[{\"values\":{\"v\":0.5}}]}\n");

        let converter = Converter::new(OutputSettings::default());
        let mut out = Vec::new();
        let summary = converter.run(Cursor::new(input), &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "[1970-01-01T00:00:00Z] ok = 0.5\n");
        assert_eq!(summary.malformed, 1);
    }

    #[test]
    fn test_capitalized_field_names() {
        let (out, summary) = convert(concat!(
            r#"{"Timestamp":0,"Prefix":"x","Updates":[{"Path":"y","values":{"v":2}}]}"#,
            "\n",
            r#"{"timestamp":0,"prefix":"x","updates":[{"Path":"y","path":"z","values":{"v":3}}]}"#,
            "\n",
        ));
        assert_eq!(
            out,
            "[1970-01-01T00:00:00Z] x/y = 2\n[1970-01-01T00:00:00Z] x/z = 3\n"
        );
        assert_eq!(summary.malformed, 0);
    }

    #[test]
    fn test_empty_path_and_prefix_emit_nothing() {
        let (out, summary) = convert(r#"{"updates":[{"Path":"","values":{"a":1,"b":2}}]}"#);
        assert!(out.is_empty());
        assert_eq!(summary.skipped_updates, 1);
        assert_eq!(summary.emitted, 0);
    }

    #[test]
    fn test_read_error_is_fatal() {
        struct FailingReader;

        impl io::Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("disk on fire"))
            }
        }

        let converter = Converter::new(OutputSettings::default());
        let err = converter
            .run(io::BufReader::new(FailingReader), Vec::<u8>::new())
            .unwrap_err();
        assert!(matches!(err, ConvertError::Read { line: 0, .. }));
    }

    #[test]
    fn test_write_error_is_fatal() {
        struct ClosedPipe;

        impl Write for ClosedPipe {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let converter = Converter::new(OutputSettings::default());
        let err = converter
            .run(
                Cursor::new(r#"{"prefix":"a","updates":[{"values":{"v":1}}]}"#),
                ClosedPipe,
            )
            .unwrap_err();
        assert!(err.is_broken_pipe());
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Run a conversion with logging filtered by `directives`, returning
    /// stdout and the captured log output.
    fn convert_logged(input: &str, settings: OutputSettings, directives: &str) -> (String, String) {
        let logs = SharedBuffer::default();
        let writer = logs.clone();
        let filter = gnmifmt_common::with_diagnostics(EnvFilter::new(directives)).unwrap();
        let subscriber = tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(move || writer.clone()))
            .with(filter);

        let mut out = Vec::new();
        tracing::subscriber::with_default(subscriber, || {
            Converter::new(settings).run(Cursor::new(input), &mut out).unwrap();
        });

        let logs = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        (String::from_utf8(out).unwrap(), logs)
    }

    const GOOD_BAD_GOOD: &str = concat!(
        r#"{"prefix":"a","updates":[{"Path":"b","values":{"v":1}}]}"#,
        "\n",
        "not json at all\n",
        r#"{"prefix":"c","updates":[{"Path":"d","values":{"v":2}}]}"#,
        "\n",
    );

    #[test]
    fn test_malformed_line_is_reported() {
        let settings = OutputSettings {
            preview_chars: 5,
            ..Default::default()
        };
        let (out, logs) = convert_logged(GOOD_BAD_GOOD, settings, "warn");

        assert_eq!(
            out,
            "[1970-01-01T00:00:00Z] a/b = 1\n[1970-01-01T00:00:00Z] c/d = 2\n"
        );
        assert!(logs.contains("Malformed record on line 2:"), "{}", logs);
        assert!(logs.contains("expected ident"), "{}", logs);
        assert!(logs.contains("Line preview: not j..."), "{}", logs);
        assert!(!logs.contains("not json at all"), "{}", logs);
        assert_eq!(logs.matches("Malformed record").count(), 1);
    }

    #[test]
    fn test_malformed_line_report_without_preview() {
        let settings = OutputSettings {
            preview_chars: 0,
            ..Default::default()
        };
        let (_, logs) = convert_logged(GOOD_BAD_GOOD, settings, "warn");

        assert!(logs.contains("Malformed record on line 2:"), "{}", logs);
        assert!(!logs.contains("Line preview"), "{}", logs);
    }

    #[test]
    fn test_malformed_line_reported_when_logging_is_narrowed() {
        for directives in ["hyper=debug", "off", "gnmifmt=off"] {
            let (out, logs) = convert_logged(GOOD_BAD_GOOD, OutputSettings::default(), directives);

            assert_eq!(out.lines().count(), 2);
            assert!(
                logs.contains("Malformed record on line 2:"),
                "report missing with {}: {}",
                directives,
                logs
            );
            assert!(logs.contains("Line preview: not json at all"), "{}", logs);
        }
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview(b"short", 200), Some("short".to_string()));
        assert_eq!(preview(b"abcdef", 3), Some("abc...".to_string()));
        assert_eq!(preview(b"abc", 3), Some("abc".to_string()));
        assert_eq!(preview("ééé".as_bytes(), 2), Some("éé...".to_string()));
        assert_eq!(preview(b"anything", 0), None);
    }
}
