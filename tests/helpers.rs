//! Shared test utilities for fsbuild tests.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test environment with temporary directories for the build target and
/// host-side source files.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Build destination root
    pub target: PathBuf,
    /// Host directory holding `file` entry sources
    pub host: PathBuf,
}

impl TestEnv {
    /// Create a new test environment with temporary directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();

        let target = base.join("target");
        let host = base.join("host");

        fs::create_dir_all(&target).expect("Failed to create target dir");
        fs::create_dir_all(&host).expect("Failed to create host dir");

        Self {
            _temp_dir: temp_dir,
            target,
            host,
        }
    }
}

/// Write a host-side source file and return its path.
pub fn host_file(env: &TestEnv, name: &str, contents: &[u8]) -> PathBuf {
    let path = env.host.join(name);
    fs::write(&path, contents).expect("Failed to write host file");
    path
}

/// The ids of the user running the tests; chown to these always succeeds.
pub fn current_ids() -> (u32, u32) {
    unsafe { (libc::getuid(), libc::getgid()) }
}

/// Assert that a directory exists.
pub fn assert_dir_exists(path: &Path) {
    assert!(
        path.is_dir(),
        "Expected directory to exist: {}",
        path.display()
    );
}

/// Assert that a file exists.
pub fn assert_file_exists(path: &Path) {
    assert!(path.exists(), "Expected file to exist: {}", path.display());
}

/// Assert that a symlink exists and points to the expected target.
pub fn assert_symlink(path: &Path, expected_target: &str) {
    assert!(
        path.is_symlink(),
        "Expected symlink at {}, but it's not a symlink",
        path.display()
    );

    let target = fs::read_link(path).expect("Failed to read symlink");
    assert_eq!(
        target.to_string_lossy(),
        expected_target,
        "Symlink {} points to {:?}, expected {}",
        path.display(),
        target,
        expected_target
    );
}

/// Assert the permission bits of an entry (not following symlinks).
pub fn assert_mode(path: &Path, expected: u32) {
    let meta = fs::symlink_metadata(path)
        .unwrap_or_else(|e| panic!("Failed to stat {}: {}", path.display(), e));
    let mode = meta.permissions().mode() & 0o7777;
    assert_eq!(
        mode,
        expected,
        "Mode of {} is {:04o}, expected {:04o}",
        path.display(),
        mode,
        expected
    );
}
