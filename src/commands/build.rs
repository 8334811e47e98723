//! `fsbuild build` - apply a spec to a directory root.

use std::path::Path;

use anyhow::{bail, Result};

use crate::backend::DirBackend;
use crate::engine::{BuildEngine, BuildOptions, BuildReport};

use super::open_spec;

pub fn cmd_build(target: &Path, spec: Option<&Path>, opts: BuildOptions) -> Result<BuildReport> {
    if !target.is_dir() {
        bail!("target root is not a directory: {}", target.display());
    }

    println!("=== Building filesystem tree ===");
    println!("  Target: {}", target.display());

    let input = open_spec(spec)?;
    let engine = BuildEngine::new(DirBackend::new(target), opts);
    let report = engine.run(input)?;

    report.print();
    Ok(report)
}
