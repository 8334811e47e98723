//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `build` - Apply a spec to a directory root
//! - `image` - Mount a disk image and apply a spec to it
//! - `check` - Parse and validate a spec without a target
//! - `show` - Display information
//! - `preflight` - Check host tools for image builds

pub mod build;
pub mod check;
pub mod image;
pub mod preflight;
pub mod show;

pub use build::cmd_build;
pub use check::cmd_check;
pub use image::cmd_image;
pub use preflight::cmd_preflight;
pub use show::cmd_show;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

/// Open the spec source: a file path, or standard input when the path is
/// absent or `-`.
pub fn open_spec(spec: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match spec {
        None => Ok(Box::new(BufReader::new(io::stdin()))),
        Some(path) if path.as_os_str() == "-" => Ok(Box::new(BufReader::new(io::stdin()))),
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening spec file {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
    }
}
