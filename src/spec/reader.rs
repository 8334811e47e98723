//! Line reader for spec input.
//!
//! Produces a lazy sequence of (line number, text) pairs from any buffered
//! source, skipping comment lines and lines that are blank after trimming.
//! Line numbers are 1-based and count every physical line, including the
//! skipped ones, so diagnostics match what an editor shows.

use std::io::BufRead;

/// One entry-bearing spec line with its 1-based line number.
///
/// Ephemeral: the engine drops it as soon as the line has been parsed or
/// reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecLine {
    pub number: u64,
    pub text: String,
}

/// Reads spec lines from a buffered source.
///
/// Single pass only; re-reading a spec means reopening the source.
pub struct SpecReader<R> {
    input: R,
    lineno: u64,
}

impl<R: BufRead> SpecReader<R> {
    pub fn new(input: R) -> Self {
        Self { input, lineno: 0 }
    }

    /// Return the next entry-bearing line, or `None` at end of input.
    pub fn next_line(&mut self) -> std::io::Result<Option<SpecLine>> {
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.input.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            self.lineno += 1;

            if buf.starts_with('#') {
                continue;
            }

            let text = buf.trim_end_matches(['\n', '\r']);
            if text.trim().is_empty() {
                continue;
            }

            return Ok(Some(SpecLine {
                number: self.lineno,
                text: text.to_string(),
            }));
        }
    }
}
