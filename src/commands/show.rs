//! `fsbuild show` - display information.

use std::path::Path;

use anyhow::{bail, Result};
use walkdir::WalkDir;

use crate::config::Config;

pub enum ShowTarget<'a> {
    /// Supported entry types and their grammars.
    Types,
    /// Summary of a constructed target tree.
    Tree(&'a Path),
    /// Current configuration.
    Config,
}

pub fn cmd_show(what: ShowTarget<'_>, config: &Config, verbosity: u8) -> Result<()> {
    match what {
        ShowTarget::Types => show_types(),
        ShowTarget::Tree(path) => show_tree(path, verbosity)?,
        ShowTarget::Config => config.print(),
    }
    Ok(())
}

fn show_types() {
    println!("Entry types (one per line, '#' starts a comment):");
    println!();
    println!("  dir   <name> <mode> <uid> <gid>");
    println!("  slink <name> <target> <uid> <gid>");
    println!("  file  <name> <source> <mode> <uid> <gid>");
    println!("  nod   <name> <mode> <uid> <gid> <devtype> <major> <minor>");
    println!("  pipe  <name> <mode> <uid> <gid>");
    println!("  sock  <name> <mode> <uid> <gid>");
    println!();
    println!("  <mode> is octal (e.g. 0755); <uid>/<gid> are decimal.");
    println!("  <devtype> is one of: b (block), c (char), p (pipe),");
    println!("  s (socket), r (regular). <major>/<minor> matter for b and c.");
    println!("  <source> is a host path; <name> is relative to the target root.");
}

fn show_tree(root: &Path, verbosity: u8) -> Result<()> {
    if !root.is_dir() {
        bail!("not a directory: {}", root.display());
    }

    let mut dirs = 0usize;
    let mut files = 0usize;
    let mut symlinks = 0usize;
    let mut specials = 0usize;
    let mut bytes = 0u64;

    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry?;
        let ftype = entry.file_type();

        if ftype.is_symlink() {
            symlinks += 1;
        } else if ftype.is_dir() {
            dirs += 1;
        } else if ftype.is_file() {
            files += 1;
            bytes += entry.metadata()?.len();
        } else {
            specials += 1;
        }

        if verbosity > 0 {
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            println!("  {}", rel.display());
        }
    }

    println!("{}:", root.display());
    println!("  {} directories", dirs);
    println!("  {} files ({} bytes)", files, bytes);
    println!("  {} symlinks", symlinks);
    println!("  {} special files", specials);

    Ok(())
}
