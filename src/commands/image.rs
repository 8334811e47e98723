//! `fsbuild image` - mount a disk image and apply a spec to it.

use std::path::Path;

use anyhow::{Context, Result};

use crate::backend::DirBackend;
use crate::config::Config;
use crate::engine::{BuildEngine, BuildOptions, BuildReport};
use crate::mount::{FsType, MountedImage};
use crate::preflight;

use super::open_spec;

pub fn cmd_image(
    image: &Path,
    fstype: FsType,
    part: u32,
    spec: Option<&Path>,
    opts: BuildOptions,
    config: &Config,
) -> Result<BuildReport> {
    preflight::run_preflight_or_fail()?;

    println!("=== Building image ===");
    println!("  Image: {} ({}, partition {})", image.display(), fstype, part);

    // Open the spec before mounting so a bad path fails without touching
    // the image.
    let input = open_spec(spec)?;

    let mounted = MountedImage::attach(image, fstype, part, &config.mount_dir)?;
    if opts.verbosity > 0 {
        println!("  Mounted at {}", mounted.root().display());
    }

    let mut backend = DirBackend::new(mounted.root());
    if !fstype.symlinks_supported() {
        backend = backend.without_symlinks();
    }

    // Capture the engine result before teardown so the mount is released
    // on the failure path too (Drop would catch it, but silently).
    let run = BuildEngine::new(backend, opts).run(input);
    let released = mounted.release();

    let report = run?;
    released.context("releasing image mount")?;

    report.print();
    Ok(report)
}
