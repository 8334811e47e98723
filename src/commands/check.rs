//! `fsbuild check` - parse and validate a spec without touching a target.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::spec::{resolve_path, Entry, ParseOptions, SpecReader};

use super::open_spec;

/// Outcome of a validation pass.
#[derive(Debug, Default, Serialize)]
pub struct CheckReport {
    pub entries: Vec<Entry>,
    pub errors: Vec<CheckError>,
}

#[derive(Debug, Serialize)]
pub struct CheckError {
    pub line: u64,
    pub error: String,
}

impl CheckReport {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn cmd_check(
    spec: Option<&Path>,
    parse: ParseOptions,
    json: bool,
    verbosity: u8,
) -> Result<CheckReport> {
    let input = open_spec(spec)?;
    let mut reader = SpecReader::new(input);
    let mut report = CheckReport::default();

    while let Some(line) = reader.next_line().context("reading spec input")? {
        // Validation runs the same decode path a build would: grammar
        // first, then path normalization.
        let checked = Entry::parse_with(&line.text, parse).and_then(|entry| {
            resolve_path(entry.name())?;
            Ok(entry)
        });

        match checked {
            Ok(entry) => {
                if verbosity > 0 && !json {
                    println!("  {}", entry);
                }
                report.entries.push(entry);
            }
            Err(err) => {
                if !json {
                    eprintln!("line {}: {}", line.number, err);
                }
                report.errors.push(CheckError {
                    line: line.number,
                    error: err.to_string(),
                });
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "  {} entries OK, {} invalid",
            report.entries.len(),
            report.errors.len()
        );
    }

    Ok(report)
}
