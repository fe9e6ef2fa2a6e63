//! Rendering of comparison results
//!
//! Every reporter walks the diff tree depth first and names each node by its
//! dotted key path (`parent.child.grandchild`). Children are always visited,
//! whether or not the parent itself is printed.

use crate::compare::{ComparisonResult, KeyComparisonResult};
use crate::errors::{DisplayOpt, Result};
use crate::types::Key;
use log::{error, info};
use std::io::Write;

const LINE_SEPARATOR: &str = "-------------------------";
const BORDER: &str = "***";

/// Title of the mismatching keys section
pub const MISMATCHING_KEYS_TITLE: &str = "MISMATCHING KEYS";

/// Something that renders a [`ComparisonResult`]
pub trait Reporter {
    fn generate_report(&mut self, result: &ComparisonResult) -> Result<()>;
}

fn key_path(prefix: &str, key: &Key) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Writes a bordered plain-text section to any byte sink
///
/// By default only nodes carrying an error produce a line.
pub struct WriterReporter<W: Write> {
    writer: W,
    only_with_error: bool,
}

impl<W: Write> WriterReporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            only_with_error: true,
        }
    }

    /// Also print nodes that carry no error
    pub fn include_matching(mut self, include: bool) -> Self {
        self.only_with_error = !include;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn generate_mismatching_keys_report(&mut self, result: &ComparisonResult) -> Result<()> {
        let written = self.write_collection(MISMATCHING_KEYS_TITLE, &result.mismatching_keys);
        let flushed = self.writer.flush();
        written?;
        flushed?;
        Ok(())
    }

    fn write_collection(&mut self, title: &str, collection: &[KeyComparisonResult]) -> Result<()> {
        writeln!(self.writer, "{LINE_SEPARATOR}")?;
        writeln!(self.writer, "{title}")?;
        for item in collection {
            self.write_key_result("", item)?;
        }
        writeln!(self.writer, "{LINE_SEPARATOR}")?;
        Ok(())
    }

    fn write_key_result(&mut self, prefix: &str, result: &KeyComparisonResult) -> Result<()> {
        let path = key_path(prefix, &result.key);
        match &result.error {
            Some(err) => writeln!(self.writer, "- key: {path}, error: {err}")?,
            None if !self.only_with_error => writeln!(self.writer, "- key: {path}")?,
            None => {}
        }
        for child in &result.children {
            self.write_key_result(&path, child)?;
        }
        Ok(())
    }
}

impl<W: Write> Reporter for WriterReporter<W> {
    fn generate_report(&mut self, result: &ComparisonResult) -> Result<()> {
        self.generate_mismatching_keys_report(result)
    }
}

/// Writes the result tree as pretty-printed JSON
pub struct JsonReporter<W: Write> {
    writer: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn generate_report(&mut self, result: &ComparisonResult) -> Result<()> {
        let written = serde_json::to_writer_pretty(&mut self.writer, result);
        let newline = writeln!(self.writer);
        let flushed = self.writer.flush();
        written?;
        newline?;
        flushed?;
        Ok(())
    }
}

/// Line-oriented test log that can be marked as failed
pub trait TestSink {
    fn log(&mut self, line: &str);

    /// Log a line and mark the run as failed
    fn error(&mut self, line: &str);

    fn failed(&self) -> bool;
}

/// Routes lines through the `log` facade
#[derive(Debug, Default)]
pub struct LogSink {
    failed: bool,
}

impl TestSink for LogSink {
    fn log(&mut self, line: &str) {
        info!("{line}");
    }

    fn error(&mut self, line: &str) {
        self.failed = true;
        error!("{line}");
    }

    fn failed(&self) -> bool {
        self.failed
    }
}

/// Keeps every line in memory
#[derive(Debug, Default, Clone)]
pub struct CapturedLog {
    lines: Vec<String>,
    failed: bool,
}

impl CapturedLog {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// All lines joined with newlines
    pub fn output(&self) -> String {
        self.lines.join("\n")
    }
}

impl TestSink for CapturedLog {
    fn log(&mut self, line: &str) {
        self.lines.push(line.to_owned());
    }

    fn error(&mut self, line: &str) {
        self.failed = true;
        self.lines.push(line.to_owned());
    }

    fn failed(&self) -> bool {
        self.failed
    }
}

/// Writes a labeled diagnostic block per mismatching path to a test log
pub struct TestReporter<S: TestSink> {
    sink: S,
}

impl<S: TestSink> TestReporter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn msg(&mut self, text: &str) {
        self.sink.log(&bordered(text));
    }

    fn line_breaker(&mut self) {
        self.sink.log(BORDER);
    }

    fn write_key_result(&mut self, prefix: &str, result: &KeyComparisonResult) {
        let path = key_path(prefix, &result.key);
        match &result.error {
            Some(err) => {
                self.line_breaker();
                self.msg(&format!("     key: {path}"));
                self.msg(&format!("   error: {}", err.kind));
                if err.has_details() {
                    self.msg(&format!("expected: {}", DisplayOpt(&err.expected)));
                    self.msg(&format!("   found: {}", DisplayOpt(&err.found)));
                }
            }
            None => self.msg(&format!("key: \"{path}\"")),
        }
        for child in &result.children {
            self.write_key_result(&path, child);
        }
    }
}

impl<S: TestSink> Reporter for TestReporter<S> {
    fn generate_report(&mut self, result: &ComparisonResult) -> Result<()> {
        self.line_breaker();
        if result.is_empty() {
            self.msg("-- PASS: Maps are equal.");
            return Ok(());
        }
        self.sink.error(&bordered(
            "-- ERROR: maps are not equal, there are mismatching fields:",
        ));
        for item in &result.mismatching_keys {
            self.write_key_result("", item);
        }
        Ok(())
    }
}

fn bordered(text: &str) -> String {
    if text.is_empty() {
        BORDER.to_owned()
    } else {
        format!("{BORDER} {text}")
    }
}

/// Render a result with [`WriterReporter`] into a string
pub fn render(result: &ComparisonResult) -> Result<String> {
    let mut reporter = WriterReporter::new(Vec::new());
    reporter.generate_report(result)?;
    Ok(String::from_utf8_lossy(&reporter.into_inner()).into_owned())
}

/// Panic with the rendered report if the result holds any mismatch
#[track_caller]
pub fn assert_no_mismatches(result: &ComparisonResult) {
    if result.is_empty() {
        return;
    }
    match render(result) {
        Ok(report) => panic!("maps are not equal:\n{report}"),
        Err(err) => panic!("maps are not equal ({} mismatching keys): {err}", result.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{Mismatch, MismatchKind};
    use crate::value::Value;
    use std::io;

    fn record_result() -> ComparisonResult {
        let count = KeyComparisonResult::with_error(
            Key::Field("Count".into()),
            Mismatch::values(MismatchKind::ValueMismatch, Value::int(1), Value::int(2)),
        );
        let mut rec = KeyComparisonResult::with_error(
            Key::from("rec"),
            MismatchKind::InnerKeyMismatch,
        );
        rec.children.push(count);
        ComparisonResult {
            mismatching_keys: vec![rec],
        }
    }

    #[test]
    fn test_writer_report() {
        let text = render(&record_result()).unwrap();
        assert_eq!(
            text,
            "-------------------------\n\
             MISMATCHING KEYS\n\
             - key: rec, error: inner key mismatch\n\
             - key: rec.Count, error: value mismatch, expected: 1, found: 2\n\
             -------------------------\n"
        );
    }

    #[test]
    fn test_writer_report_empty_result() {
        let text = render(&ComparisonResult::default()).unwrap();
        assert_eq!(text, "-------------------------\nMISMATCHING KEYS\n-------------------------\n");
    }

    #[test]
    fn test_writer_visits_children_of_clean_nodes() {
        let mut parent = KeyComparisonResult::new(Key::from("p"));
        parent
            .children
            .push(KeyComparisonResult::with_error(Key::from("c"), MismatchKind::ExtraKey));
        let result = ComparisonResult {
            mismatching_keys: vec![parent],
        };

        let text = render(&result).unwrap();
        assert!(!text.contains("- key: p\n"));
        assert!(text.contains("- key: p.c, error: this key doesn't exist"));

        let mut reporter = WriterReporter::new(Vec::new()).include_matching(true);
        reporter.generate_report(&result).unwrap();
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(text.contains("- key: p\n"));
    }

    #[test]
    fn test_idempotent_rendering() {
        let result = record_result();
        let mut first = Vec::new();
        let mut second = Vec::new();
        WriterReporter::new(&mut first).generate_report(&result).unwrap();
        WriterReporter::new(&mut second).generate_report(&result).unwrap();
        assert_eq!(first, second);
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writer_errors_propagate() {
        let err = WriterReporter::new(FailingWriter)
            .generate_report(&record_result())
            .unwrap_err();
        assert!(err.to_string().contains("closed"));
    }

    #[test]
    fn test_test_reporter_mismatch_block() {
        let mut reporter = TestReporter::new(CapturedLog::default());
        reporter.generate_report(&record_result()).unwrap();
        let sink = reporter.into_sink();
        assert!(sink.failed());
        assert_eq!(
            sink.lines(),
            [
                "***",
                "*** -- ERROR: maps are not equal, there are mismatching fields:",
                "***",
                "***      key: rec",
                "***    error: inner key mismatch",
                "***",
                "***      key: rec.Count",
                "***    error: value mismatch",
                "*** expected: 1",
                "***    found: 2",
            ]
        );
    }

    #[test]
    fn test_test_reporter_clean_result() {
        let mut reporter = TestReporter::new(CapturedLog::default());
        reporter.generate_report(&ComparisonResult::default()).unwrap();
        assert!(!reporter.sink().failed());
        assert_eq!(reporter.sink().output(), "***\n*** -- PASS: Maps are equal.");
    }

    #[test]
    fn test_log_sink_marks_failure() {
        let mut reporter = TestReporter::new(LogSink::default());
        reporter.generate_report(&record_result()).unwrap();
        assert!(reporter.sink().failed());
    }

    #[test]
    fn test_json_report() {
        let mut reporter = JsonReporter::new(Vec::new());
        reporter.generate_report(&record_result()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&reporter.writer).unwrap();
        assert_eq!(json["mismatching_keys"][0]["key"], "rec");
        assert_eq!(
            json["mismatching_keys"][0]["children"][0]["error"]["found"],
            2
        );
    }

    #[test]
    fn test_assert_no_mismatches_passes_on_clean_result() {
        assert_no_mismatches(&ComparisonResult::default());
    }

    #[test]
    #[should_panic(expected = "rec.Count")]
    fn test_assert_no_mismatches_panics_with_report() {
        assert_no_mismatches(&record_result());
    }
}
