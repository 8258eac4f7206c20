//! TAP-style result stream
//!
//! ```text
//! 1..3
//! ok 1 - setup, {}
//! ok 2 - basics, {"primary":"test_suite_db1"}
//! not ok 3 - basics, {"primary":"http://localhost:5984/test_suite_db1"}
//! # suite basics failed: ...
//! Result: FAIL
//! ```
//!
//! On success the stream ends with `# ran N assertions` and `Result: PASS`.

use super::{FailureReason, RunSummary};
use std::io::Write;
use tapmatrix_plan::ExecutionDescriptor;

/// Receives run events as they happen
pub trait Reporter: Send {
    /// Number of descriptors about to run
    fn plan(&mut self, count: usize);

    /// Descriptor `number` (1-based) passed
    fn ok(&mut self, number: usize, descriptor: &ExecutionDescriptor);

    /// Descriptor `number` (1-based) failed; the run halts
    fn not_ok(&mut self, number: usize, descriptor: &ExecutionDescriptor, reason: &FailureReason);

    /// Run finished, passed or halted
    fn finish(&mut self, summary: &RunSummary);
}

/// Writes TAP lines, flushing after each one
#[derive(Debug)]
pub struct TapReporter<W: Write> {
    out: W,
}

impl<W: Write> TapReporter<W> {
    /// Report into `out`
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        let written = writeln!(self.out, "{text}").and_then(|()| self.out.flush());
        if let Err(e) = written {
            tracing::warn!("Failed to write report line: {}", e);
        }
    }
}

impl TapReporter<std::io::Stdout> {
    /// Report to standard output
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> Reporter for TapReporter<W> {
    fn plan(&mut self, count: usize) {
        self.line(format_args!("1..{count}"));
    }

    fn ok(&mut self, number: usize, descriptor: &ExecutionDescriptor) {
        self.line(format_args!("ok {number} - {descriptor}"));
    }

    fn not_ok(&mut self, number: usize, descriptor: &ExecutionDescriptor, reason: &FailureReason) {
        self.line(format_args!("not ok {number} - {descriptor}"));
        self.line(format_args!("# {reason}"));
    }

    fn finish(&mut self, summary: &RunSummary) {
        if summary.passed() {
            self.line(format_args!("# ran {} assertions", summary.assertions));
            self.line(format_args!("Result: PASS"));
        } else {
            self.line(format_args!("Result: FAIL"));
        }
    }
}
