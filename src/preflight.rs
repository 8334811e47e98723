//! Preflight checks for image builds.
//!
//! Image mode shells out to the host's loop-device and mount tooling and
//! needs root to use it; check all of that up front instead of failing
//! halfway into an attach.

use anyhow::{bail, Result};

/// Tools an image build shells out to, with what each one is for.
const REQUIRED_TOOLS: &[(&str, &str)] = &[
    ("losetup", "attaches the image to a loop device"),
    ("mount", "mounts the image filesystem"),
    ("umount", "releases the image filesystem"),
];

/// One preflight check result.
#[derive(Debug)]
pub struct Check {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

/// All preflight check results.
#[derive(Debug)]
pub struct PreflightReport {
    pub checks: Vec<Check>,
}

impl PreflightReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn fail_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn print(&self) {
        for check in &self.checks {
            let status = if check.passed { " ok " } else { "FAIL" };
            println!("  [{}] {:<12} {}", status, check.name, check.detail);
        }
    }
}

/// Run all preflight checks.
pub fn run_preflight() -> PreflightReport {
    let mut checks = Vec::new();

    for (tool, purpose) in REQUIRED_TOOLS {
        let check = match which::which(tool) {
            Ok(path) => Check {
                name: tool.to_string(),
                passed: true,
                detail: path.display().to_string(),
            },
            Err(_) => Check {
                name: tool.to_string(),
                passed: false,
                detail: format!("not found in PATH ({})", purpose),
            },
        };
        checks.push(check);
    }

    let euid = unsafe { libc::geteuid() };
    checks.push(Check {
        name: "privileges".to_string(),
        passed: euid == 0,
        detail: if euid == 0 {
            "running as root".to_string()
        } else {
            format!("euid {} (loop mounts need root)", euid)
        },
    });

    PreflightReport { checks }
}

/// Run preflight and bail if any checks fail.
pub fn run_preflight_or_fail() -> Result<()> {
    let report = run_preflight();
    if !report.all_passed() {
        report.print();
        bail!(
            "preflight failed: {} check(s) failed. Fix the issues above before an image build.",
            report.fail_count()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_failures() {
        let report = PreflightReport {
            checks: vec![
                Check {
                    name: "a".to_string(),
                    passed: true,
                    detail: String::new(),
                },
                Check {
                    name: "b".to_string(),
                    passed: false,
                    detail: String::new(),
                },
            ],
        };
        assert!(!report.all_passed());
        assert_eq!(report.fail_count(), 1);
    }

    #[test]
    fn preflight_checks_every_tool() {
        let report = run_preflight();
        for (tool, _) in REQUIRED_TOOLS {
            assert!(report.checks.iter().any(|c| c.name == *tool));
        }
        assert!(report.checks.iter().any(|c| c.name == "privileges"));
    }
}
