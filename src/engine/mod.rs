//! Build engine: applies parsed entries to a backend in spec order.
//!
//! Strictly sequential: each line is fully processed (parse, resolve,
//! dispatch, chown, classify) before the next is read. Nothing is
//! reordered and no dependencies are inferred, so parent directories must
//! appear before their children in the spec.
//!
//! Error tolerance is the engine's one piece of policy. `AlreadyExists`
//! from directory, symlink, and device creation is an acceptable outcome:
//! those entries have ensure-present semantics and re-running a spec must
//! not fail on them. Regular files are the exception; they are truncated
//! and rewritten every time. Everything else fails the line, and the
//! strictness setting decides whether the run continues.

pub mod copy;

use std::io::BufRead;
use std::path::Path;

use anyhow::Context;
use thiserror::Error;

use crate::backend::{Backend, BackendError};
use crate::spec::{resolve_path, Entry, ParseError, ParseOptions, SpecLine, SpecReader};

use copy::CopyError;

/// Error-tolerance policy for a build run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Report failing lines and keep going (default).
    #[default]
    Lenient,
    /// Stop at the first failing line.
    Strict,
}

/// What went wrong on one spec line.
#[derive(Debug, Error)]
pub enum LineError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Copy(#[from] CopyError),
}

/// One failing line, with its 1-based position in the spec.
#[derive(Debug)]
pub struct Failure {
    pub line: u64,
    pub error: LineError,
}

/// Outcome of a build run.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Entries constructed or overwritten.
    pub applied: usize,
    /// Creations tolerated because the entry was already present.
    pub existing: usize,
    /// Lines that failed.
    pub failures: Vec<Failure>,
    /// True when a strict-mode failure stopped the run before end of input.
    pub aborted: bool,
}

impl BuildReport {
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn print(&self) {
        println!(
            "  {} entries applied ({} already present)",
            self.applied, self.existing
        );
        if !self.failures.is_empty() {
            println!(
                "  {} line(s) failed{}",
                self.failures.len(),
                if self.aborted { ", build aborted" } else { "" }
            );
        }
    }
}

/// How a single entry landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Created,
    /// Creation tolerated: the entry was already there.
    Existing,
}

/// Options for a build run.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    pub strictness: Strictness,
    pub parse: ParseOptions,
    pub verbosity: u8,
}

/// Sequential entry-construction engine.
///
/// Owns the backend (and with it the target root) for the duration of the
/// run.
pub struct BuildEngine<B> {
    backend: B,
    opts: BuildOptions,
}

impl<B: Backend> BuildEngine<B> {
    pub fn new(backend: B, opts: BuildOptions) -> Self {
        Self { backend, opts }
    }

    /// Pull spec lines from `input` until end of input or a strict-mode
    /// failure, applying each against the backend.
    ///
    /// Per-line failures land in the report, one diagnostic line each on
    /// stderr; only an input read error fails the run itself.
    pub fn run<R: BufRead>(mut self, input: R) -> anyhow::Result<BuildReport> {
        let mut reader = SpecReader::new(input);
        let mut report = BuildReport::default();

        while let Some(line) = reader.next_line().context("reading spec input")? {
            match self.apply_line(&line) {
                Ok(Applied::Created) => report.applied += 1,
                Ok(Applied::Existing) => {
                    report.applied += 1;
                    report.existing += 1;
                }
                Err(error) => {
                    eprintln!("line {}: {}", line.number, error);
                    report.failures.push(Failure {
                        line: line.number,
                        error,
                    });
                    if self.opts.strictness == Strictness::Strict {
                        report.aborted = true;
                        break;
                    }
                }
            }
        }

        Ok(report)
    }

    fn apply_line(&mut self, line: &SpecLine) -> Result<Applied, LineError> {
        let entry = Entry::parse_with(&line.text, self.opts.parse)?;
        if self.opts.verbosity > 0 {
            println!("  {}", entry);
        }
        self.apply(&entry)
    }

    /// Apply one parsed entry against the backend.
    ///
    /// Ownership is a second, non-atomic step after creation, and it runs
    /// even when creation was tolerated as already-present, so re-applying
    /// a spec still converges ownership.
    pub fn apply(&mut self, entry: &Entry) -> Result<Applied, LineError> {
        match entry {
            Entry::Dir {
                name,
                mode,
                uid,
                gid,
            } => {
                let rel = resolve_path(name)?;
                let existed = tolerate_existing(self.backend.mkdir(rel, *mode))?;
                self.backend.chown(rel, *uid, *gid, true)?;
                Ok(outcome(existed))
            }

            Entry::Symlink {
                name,
                target,
                uid,
                gid,
            } => {
                let rel = resolve_path(name)?;
                let existed = tolerate_existing(self.backend.symlink(rel, target))?;
                // Re-own the link itself, not whatever it points at.
                self.backend.chown(rel, *uid, *gid, false)?;
                Ok(outcome(existed))
            }

            Entry::Node {
                name,
                mode,
                uid,
                gid,
                kind,
                major,
                minor,
            } => {
                let rel = resolve_path(name)?;
                let existed =
                    tolerate_existing(self.backend.mknod(rel, *kind, *mode, *major, *minor))?;
                self.backend.chown(rel, *uid, *gid, true)?;
                Ok(outcome(existed))
            }

            Entry::File {
                name,
                source,
                mode,
                uid,
                gid,
            } => {
                let rel = resolve_path(name)?;
                let mut dest = self.backend.create(rel, *mode)?;
                let written = copy::copy_file(Path::new(source), &mut *dest)?;
                dest.chown(*uid, *gid)?;
                if self.opts.verbosity > 0 {
                    println!("  copied {} bytes from {} to {}", written, source, name);
                }
                Ok(Applied::Created)
            }
        }
    }
}

/// Downgrade AlreadyExists to a tolerated outcome; pass everything else on.
fn tolerate_existing(res: Result<(), BackendError>) -> Result<bool, BackendError> {
    match res {
        Ok(()) => Ok(false),
        Err(e) if e.is_already_exists() => Ok(true),
        Err(e) => Err(e),
    }
}

fn outcome(existed: bool) -> Applied {
    if existed {
        Applied::Existing
    } else {
        Applied::Created
    }
}
