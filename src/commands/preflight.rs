//! `fsbuild preflight` - check host tools for image builds.

use anyhow::{bail, Result};

use crate::preflight::run_preflight;

pub fn cmd_preflight(strict: bool) -> Result<()> {
    println!("Running preflight checks...\n");

    let report = run_preflight();
    report.print();
    println!();

    if report.all_passed() {
        println!("All preflight checks passed!");
    } else if strict {
        bail!("preflight failed: {} check(s) failed", report.fail_count());
    } else {
        println!(
            "{} check(s) failed; image builds will not work until they pass.",
            report.fail_count()
        );
    }

    Ok(())
}
