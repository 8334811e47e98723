//! Spec parsing: line reader, entry grammar, path normalization.
//!
//! A spec is line-oriented UTF-8 text, one entry per line. `#`-prefixed
//! lines are comments and blank lines are ignored; everything else is
//! `<type> <args>` where the argument grammar is fixed per type (see
//! [`entry::Entry`]).

pub mod entry;
pub mod path;
pub mod reader;

pub use entry::{DeviceKind, Entry, ParseError, ParseOptions};
pub use path::{resolve_path, PATH_MAX};
pub use reader::{SpecLine, SpecReader};
