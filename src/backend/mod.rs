//! Filesystem backend: the mutating operations a build performs.
//!
//! The engine talks to the target through the [`Backend`] trait so the
//! construction logic stays independent of where the tree lives (a staging
//! directory, the mountpoint of an attached image). All paths are
//! root-relative; resolving them is the caller's job.

pub mod dir;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::spec::DeviceKind;

pub use dir::DirBackend;

/// A failed backend operation, classified by kind.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{}: already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("{}: no such file or directory", .0.display())]
    NotFound(PathBuf),
    #[error("{}: permission denied", .0.display())]
    PermissionDenied(PathBuf),
    #[error("{op} is unsupported on this filesystem")]
    Unsupported { op: &'static str },
    #[error("{} {}: {}", .op, .path.display(), .source)]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BackendError {
    /// Classify an io::Error for the operation that produced it.
    pub(crate) fn from_io(op: &'static str, path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::AlreadyExists => BackendError::AlreadyExists(path.to_path_buf()),
            io::ErrorKind::NotFound => BackendError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => BackendError::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::Unsupported => BackendError::Unsupported { op },
            _ => BackendError::Io {
                op,
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// True for the tolerated "entry is already present" outcome.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, BackendError::AlreadyExists(_))
    }
}

/// Writable handle to a backend-created regular file.
///
/// Closing happens on drop; ownership changes go through the open handle so
/// they land on the file that was just written.
pub trait FileHandle: Write {
    fn chown(&mut self, uid: u32, gid: u32) -> Result<(), BackendError>;
}

/// The mutating operations the engine dispatches to.
pub trait Backend {
    /// Create a directory with the given permission bits.
    fn mkdir(&mut self, rel: &str, mode: u32) -> Result<(), BackendError>;

    /// Create a symlink at `rel` pointing at `target` (stored verbatim).
    fn symlink(&mut self, rel: &str, target: &str) -> Result<(), BackendError>;

    /// Create a special file. `major`/`minor` only matter for block and
    /// character devices.
    fn mknod(
        &mut self,
        rel: &str,
        kind: DeviceKind,
        mode: u32,
        major: u32,
        minor: u32,
    ) -> Result<(), BackendError>;

    /// Change ownership. `follow` is false for symlinks, so the link itself
    /// is re-owned rather than its target.
    fn chown(&mut self, rel: &str, uid: u32, gid: u32, follow: bool) -> Result<(), BackendError>;

    /// Open a regular file for writing, creating it or truncating existing
    /// content.
    fn create(&mut self, rel: &str, mode: u32) -> Result<Box<dyn FileHandle>, BackendError>;
}
