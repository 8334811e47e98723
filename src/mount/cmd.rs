//! Checked execution of the host mount tooling.
//!
//! The mount lifecycle needs exactly two call styles: "run and fail
//! loudly with captured stderr" and "best effort during teardown".

use std::process::Command;

use anyhow::{bail, Context, Result};

/// Run a host command and return its trimmed stdout, failing with the
/// command's stderr on non-zero exit.
pub fn run(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to execute '{}'. Is it installed?", program))?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            bail!("'{}' failed (exit code {})", program, code);
        }
        bail!("'{}' failed (exit code {}): {}", program, code, stderr);
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Teardown variant: failures are swallowed, success is reported.
pub fn run_tolerant(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}
