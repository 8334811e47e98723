//! Entry grammar: decoding a spec line into a typed entry.
//!
//! Each line is `<type> <args>` with a fixed positional grammar per type:
//!
//! ```text
//! dir   <name> <mode> <uid> <gid>
//! slink <name> <target> <uid> <gid>
//! file  <name> <source> <mode> <uid> <gid>
//! nod   <name> <mode> <uid> <gid> <devtype> <major> <minor>
//! pipe  <name> <mode> <uid> <gid>
//! sock  <name> <mode> <uid> <gid>
//! ```
//!
//! Modes are octal, uid/gid are base-10, and `devtype` is one of `b` `c`
//! `p` `s` `r`. `pipe` and `sock` are shorthand for `nod` with devtype
//! `p`/`s` and major/minor 0.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Valid permission bits for an entry mode (including setuid/setgid/sticky).
pub const MODE_BITS: u32 = 0o7777;

/// Why a spec line failed to decode.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected separator between type and arguments")]
    MalformedLine,
    #[error("malformed {kind} spec: {reason}")]
    MalformedArgs { kind: &'static str, reason: String },
    #[error("unrecognized type: {0}")]
    UnknownEntryType(String),
    #[error("path is {len} bytes, exceeds the {max} byte maximum")]
    PathTooLong { len: usize, max: usize },
}

/// Special-file flavor for `nod` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Block,
    Char,
    Fifo,
    Socket,
    Regular,
}

impl DeviceKind {
    /// Decode a single-character devtype tag.
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'b' => Some(DeviceKind::Block),
            'c' => Some(DeviceKind::Char),
            'p' => Some(DeviceKind::Fifo),
            's' => Some(DeviceKind::Socket),
            'r' => Some(DeviceKind::Regular),
            _ => None,
        }
    }

    pub fn tag(self) -> char {
        match self {
            DeviceKind::Block => 'b',
            DeviceKind::Char => 'c',
            DeviceKind::Fifo => 'p',
            DeviceKind::Socket => 's',
            DeviceKind::Regular => 'r',
        }
    }
}

/// Parser options.
///
/// `legacy_slink_mode` accepts the historical 5-field slink form
/// (`name target mode uid gid`); the mode field is validated and then
/// discarded, since symlinks carry no independent permission bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub legacy_slink_mode: bool,
}

/// One decoded spec entry.
///
/// Immutable once parsed; the engine consumes each entry exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entry {
    Dir {
        name: String,
        mode: u32,
        uid: u32,
        gid: u32,
    },
    #[serde(rename = "slink")]
    Symlink {
        name: String,
        target: String,
        uid: u32,
        gid: u32,
    },
    File {
        name: String,
        source: String,
        mode: u32,
        uid: u32,
        gid: u32,
    },
    #[serde(rename = "nod")]
    Node {
        name: String,
        mode: u32,
        uid: u32,
        gid: u32,
        kind: DeviceKind,
        major: u32,
        minor: u32,
    },
}

impl Entry {
    /// Parse one non-comment, non-blank spec line with default options.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        Self::parse_with(line, ParseOptions::default())
    }

    /// Parse one non-comment, non-blank spec line.
    pub fn parse_with(line: &str, opts: ParseOptions) -> Result<Self, ParseError> {
        let (ty, args) = split_type(line)?;
        match ty {
            "dir" => parse_dir(args),
            "slink" => parse_slink(args, opts),
            "file" => parse_file(args),
            "nod" => parse_nod(args),
            "pipe" => parse_short_nod("pipe", DeviceKind::Fifo, args),
            "sock" => parse_short_nod("sock", DeviceKind::Socket, args),
            other => Err(ParseError::UnknownEntryType(other.to_string())),
        }
    }

    /// The entry's target path as written in the spec.
    pub fn name(&self) -> &str {
        match self {
            Entry::Dir { name, .. }
            | Entry::Symlink { name, .. }
            | Entry::File { name, .. }
            | Entry::Node { name, .. } => name,
        }
    }
}

/// Entries render back to their canonical spec-line form, so a parsed spec
/// can be echoed for inspection and a render re-parses to an equal entry.
impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Dir {
                name,
                mode,
                uid,
                gid,
            } => write!(f, "dir {} {:04o} {} {}", name, mode, uid, gid),
            Entry::Symlink {
                name,
                target,
                uid,
                gid,
            } => write!(f, "slink {} {} {} {}", name, target, uid, gid),
            Entry::File {
                name,
                source,
                mode,
                uid,
                gid,
            } => write!(f, "file {} {} {:04o} {} {}", name, source, mode, uid, gid),
            Entry::Node {
                name,
                mode,
                uid,
                gid,
                kind: DeviceKind::Fifo,
                major: 0,
                minor: 0,
            } => write!(f, "pipe {} {:04o} {} {}", name, mode, uid, gid),
            Entry::Node {
                name,
                mode,
                uid,
                gid,
                kind: DeviceKind::Socket,
                major: 0,
                minor: 0,
            } => write!(f, "sock {} {:04o} {} {}", name, mode, uid, gid),
            Entry::Node {
                name,
                mode,
                uid,
                gid,
                kind,
                major,
                minor,
            } => write!(
                f,
                "nod {} {:04o} {} {} {} {} {}",
                name,
                mode,
                uid,
                gid,
                kind.tag(),
                major,
                minor
            ),
        }
    }
}

/// Split a line on its first run of whitespace into (type, args).
fn split_type(line: &str) -> Result<(&str, &str), ParseError> {
    let mut parts = line.splitn(2, |c: char| c.is_ascii_whitespace());
    let ty = parts.next().unwrap_or("");
    let args = parts.next().ok_or(ParseError::MalformedLine)?;
    Ok((ty, args.trim_start()))
}

fn malformed(kind: &'static str, reason: impl Into<String>) -> ParseError {
    ParseError::MalformedArgs {
        kind,
        reason: reason.into(),
    }
}

/// Positional field cursor over an argument string.
struct Fields<'a> {
    kind: &'static str,
    iter: std::str::SplitAsciiWhitespace<'a>,
}

impl<'a> Fields<'a> {
    fn new(kind: &'static str, args: &'a str) -> Self {
        Self {
            kind,
            iter: args.split_ascii_whitespace(),
        }
    }

    fn next_str(&mut self, what: &str) -> Result<&'a str, ParseError> {
        self.iter
            .next()
            .ok_or_else(|| malformed(self.kind, format!("missing {}", what)))
    }

    fn next_mode(&mut self) -> Result<u32, ParseError> {
        let raw = self.next_str("mode")?;
        let mode = u32::from_str_radix(raw, 8)
            .map_err(|_| malformed(self.kind, format!("invalid octal mode '{}'", raw)))?;
        if mode & !MODE_BITS != 0 {
            return Err(malformed(
                self.kind,
                format!("mode {:o} outside permission-bit range", mode),
            ));
        }
        Ok(mode)
    }

    fn next_u32(&mut self, what: &str) -> Result<u32, ParseError> {
        let raw = self.next_str(what)?;
        raw.parse::<u32>()
            .map_err(|_| malformed(self.kind, format!("invalid {} '{}'", what, raw)))
    }

    fn next_tag(&mut self) -> Result<DeviceKind, ParseError> {
        let raw = self.next_str("devtype")?;
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(tag), None) => DeviceKind::from_tag(tag)
                .ok_or_else(|| malformed(self.kind, format!("unknown devtype '{}'", tag))),
            _ => Err(malformed(self.kind, format!("invalid devtype '{}'", raw))),
        }
    }

    /// All fields must be consumed; extra fields are an error.
    fn finish(mut self) -> Result<(), ParseError> {
        match self.iter.next() {
            None => Ok(()),
            Some(extra) => Err(malformed(
                self.kind,
                format!("unexpected trailing field '{}'", extra),
            )),
        }
    }
}

fn parse_dir(args: &str) -> Result<Entry, ParseError> {
    let mut fields = Fields::new("dir", args);
    let name = fields.next_str("name")?.to_string();
    let mode = fields.next_mode()?;
    let uid = fields.next_u32("uid")?;
    let gid = fields.next_u32("gid")?;
    fields.finish()?;
    Ok(Entry::Dir {
        name,
        mode,
        uid,
        gid,
    })
}

fn parse_slink(args: &str, opts: ParseOptions) -> Result<Entry, ParseError> {
    let mut fields = Fields::new("slink", args);
    let name = fields.next_str("name")?.to_string();
    let target = fields.next_str("target")?.to_string();
    if opts.legacy_slink_mode {
        // Historical form carried a mode between target and uid. Validate
        // it, then drop it: symlink permission bits are meaningless.
        fields.next_mode()?;
    }
    let uid = fields.next_u32("uid")?;
    let gid = fields.next_u32("gid")?;
    fields.finish()?;
    Ok(Entry::Symlink {
        name,
        target,
        uid,
        gid,
    })
}

fn parse_file(args: &str) -> Result<Entry, ParseError> {
    let mut fields = Fields::new("file", args);
    let name = fields.next_str("name")?.to_string();
    let source = fields.next_str("source")?.to_string();
    let mode = fields.next_mode()?;
    let uid = fields.next_u32("uid")?;
    let gid = fields.next_u32("gid")?;
    fields.finish()?;
    Ok(Entry::File {
        name,
        source,
        mode,
        uid,
        gid,
    })
}

fn parse_nod(args: &str) -> Result<Entry, ParseError> {
    let mut fields = Fields::new("nod", args);
    let name = fields.next_str("name")?.to_string();
    let mode = fields.next_mode()?;
    let uid = fields.next_u32("uid")?;
    let gid = fields.next_u32("gid")?;
    let kind = fields.next_tag()?;
    let major = fields.next_u32("major")?;
    let minor = fields.next_u32("minor")?;
    fields.finish()?;
    Ok(Entry::Node {
        name,
        mode,
        uid,
        gid,
        kind,
        major,
        minor,
    })
}

fn parse_short_nod(kind_name: &'static str, kind: DeviceKind, args: &str) -> Result<Entry, ParseError> {
    let mut fields = Fields::new(kind_name, args);
    let name = fields.next_str("name")?.to_string();
    let mode = fields.next_mode()?;
    let uid = fields.next_u32("uid")?;
    let gid = fields.next_u32("gid")?;
    fields.finish()?;
    Ok(Entry::Node {
        name,
        mode,
        uid,
        gid,
        kind,
        major: 0,
        minor: 0,
    })
}
