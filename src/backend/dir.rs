//! Host-directory backend.
//!
//! Roots every operation at an existing directory: a rootfs staging area,
//! or the mountpoint of an attached image. Plain std::fs covers
//! directories, symlinks, and regular files; device nodes and ownership go
//! through libc, which has no std equivalent.

use std::ffi::CString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::AsRawFd;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use crate::spec::DeviceKind;

use super::{Backend, BackendError, FileHandle};

/// Backend writing into a host directory tree.
pub struct DirBackend {
    root: PathBuf,
    /// False when the target filesystem cannot represent symlinks (FAT
    /// family). Symlink entries then fail up front instead of producing a
    /// confusing kernel error.
    symlinks_supported: bool,
}

impl DirBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            symlinks_supported: true,
        }
    }

    /// Mark the target as unable to hold symlinks.
    pub fn without_symlinks(mut self) -> Self {
        self.symlinks_supported = false;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }
}

fn cstring(path: &Path) -> Result<CString, BackendError> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| BackendError::Io {
        op: "encode",
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL byte"),
    })
}

fn type_flag(kind: DeviceKind) -> libc::mode_t {
    match kind {
        DeviceKind::Block => libc::S_IFBLK,
        DeviceKind::Char => libc::S_IFCHR,
        DeviceKind::Fifo => libc::S_IFIFO,
        DeviceKind::Socket => libc::S_IFSOCK,
        DeviceKind::Regular => libc::S_IFREG,
    }
}

impl Backend for DirBackend {
    fn mkdir(&mut self, rel: &str, mode: u32) -> Result<(), BackendError> {
        let path = self.full(rel);
        fs::DirBuilder::new()
            .mode(mode)
            .create(&path)
            .map_err(|e| BackendError::from_io("mkdir", &path, e))?;
        // The creation mode is subject to the process umask; force the
        // exact bits the spec asked for.
        fs::set_permissions(&path, fs::Permissions::from_mode(mode))
            .map_err(|e| BackendError::from_io("chmod", &path, e))
    }

    fn symlink(&mut self, rel: &str, target: &str) -> Result<(), BackendError> {
        if !self.symlinks_supported {
            return Err(BackendError::Unsupported { op: "symlink" });
        }
        let path = self.full(rel);
        std::os::unix::fs::symlink(target, &path)
            .map_err(|e| BackendError::from_io("symlink", &path, e))
    }

    fn mknod(
        &mut self,
        rel: &str,
        kind: DeviceKind,
        mode: u32,
        major: u32,
        minor: u32,
    ) -> Result<(), BackendError> {
        let path = self.full(rel);
        let cpath = cstring(&path)?;
        let dev = libc::makedev(major, minor);
        let ret = unsafe {
            libc::mknod(
                cpath.as_ptr(),
                type_flag(kind) | mode as libc::mode_t,
                dev,
            )
        };
        if ret != 0 {
            return Err(BackendError::from_io(
                "mknod",
                &path,
                io::Error::last_os_error(),
            ));
        }
        Ok(())
    }

    fn chown(&mut self, rel: &str, uid: u32, gid: u32, follow: bool) -> Result<(), BackendError> {
        let path = self.full(rel);
        let cpath = cstring(&path)?;
        let ret = unsafe {
            if follow {
                libc::chown(cpath.as_ptr(), uid, gid)
            } else {
                libc::lchown(cpath.as_ptr(), uid, gid)
            }
        };
        if ret != 0 {
            return Err(BackendError::from_io(
                "chown",
                &path,
                io::Error::last_os_error(),
            ));
        }
        Ok(())
    }

    fn create(&mut self, rel: &str, mode: u32) -> Result<Box<dyn FileHandle>, BackendError> {
        let path = self.full(rel);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(mode)
            .open(&path)
            .map_err(|e| BackendError::from_io("open", &path, e))?;
        // As with mkdir: the open mode only applies to newly created files
        // and is umask-filtered; pin the exact bits either way.
        fs::set_permissions(&path, fs::Permissions::from_mode(mode))
            .map_err(|e| BackendError::from_io("chmod", &path, e))?;
        Ok(Box::new(DirFile { file, path }))
    }
}

/// Open destination file inside the target tree.
struct DirFile {
    file: File,
    path: PathBuf,
}

impl Write for DirFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl FileHandle for DirFile {
    fn chown(&mut self, uid: u32, gid: u32) -> Result<(), BackendError> {
        let ret = unsafe { libc::fchown(self.file.as_raw_fd(), uid, gid) };
        if ret != 0 {
            return Err(BackendError::from_io(
                "fchown",
                &self.path,
                io::Error::last_os_error(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn backend() -> (TempDir, DirBackend) {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let backend = DirBackend::new(tmp.path());
        (tmp, backend)
    }

    #[test]
    fn mkdir_sets_exact_mode() {
        let (tmp, mut b) = backend();
        b.mkdir("tmp", 0o1777).unwrap();

        let meta = fs::metadata(tmp.path().join("tmp")).unwrap();
        assert!(meta.is_dir());
        assert_eq!(meta.permissions().mode() & 0o7777, 0o1777);
    }

    #[test]
    fn mkdir_existing_reports_already_exists() {
        let (_tmp, mut b) = backend();
        b.mkdir("a", 0o755).unwrap();
        let err = b.mkdir("a", 0o755).unwrap_err();
        assert!(err.is_already_exists());
    }

    #[test]
    fn mkdir_missing_parent_reports_not_found() {
        let (_tmp, mut b) = backend();
        let err = b.mkdir("missing/child", 0o755).unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[test]
    fn mkdir_empty_path_is_the_root() {
        // `dir / 0755 0 0` resolves to the empty relative path; the root
        // itself always exists, so this must classify as AlreadyExists.
        let (_tmp, mut b) = backend();
        let err = b.mkdir("", 0o755).unwrap_err();
        assert!(err.is_already_exists());
    }

    #[test]
    fn symlink_stores_target_verbatim() {
        let (tmp, mut b) = backend();
        b.symlink("sbin", "/bin").unwrap();

        let link = tmp.path().join("sbin");
        assert!(link.is_symlink());
        assert_eq!(fs::read_link(&link).unwrap().to_string_lossy(), "/bin");
    }

    #[test]
    fn symlink_refused_without_support() {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let mut b = DirBackend::new(tmp.path()).without_symlinks();
        let err = b.symlink("sbin", "/bin").unwrap_err();
        assert!(matches!(err, BackendError::Unsupported { op: "symlink" }));
    }

    #[test]
    fn create_truncates_existing_content() {
        let (tmp, mut b) = backend();

        let mut f = b.create("data", 0o644).unwrap();
        f.write_all(b"first version, longer").unwrap();
        drop(f);

        let mut f = b.create("data", 0o644).unwrap();
        f.write_all(b"second").unwrap();
        drop(f);

        assert_eq!(fs::read(tmp.path().join("data")).unwrap(), b"second");
    }

    #[test]
    fn create_sets_exact_mode() {
        let (tmp, mut b) = backend();
        let f = b.create("script", 0o755).unwrap();
        drop(f);

        let meta = fs::metadata(tmp.path().join("script")).unwrap();
        assert_eq!(meta.permissions().mode() & 0o7777, 0o755);
    }

    #[test]
    fn mknod_fifo_creates_named_pipe() {
        use std::os::unix::fs::FileTypeExt;

        let (tmp, mut b) = backend();
        b.mknod("initctl", DeviceKind::Fifo, 0o600, 0, 0).unwrap();

        let meta = fs::metadata(tmp.path().join("initctl")).unwrap();
        assert!(meta.file_type().is_fifo());
        assert_eq!(meta.permissions().mode() & 0o7777, 0o600);
    }

    #[test]
    fn mknod_socket_creates_socket_file() {
        use std::os::unix::fs::FileTypeExt;

        let (tmp, mut b) = backend();
        b.mknod("notify", DeviceKind::Socket, 0o600, 0, 0).unwrap();

        let meta = fs::metadata(tmp.path().join("notify")).unwrap();
        assert!(meta.file_type().is_socket());
    }

    #[test]
    fn mknod_existing_reports_already_exists() {
        let (_tmp, mut b) = backend();
        b.mknod("fifo", DeviceKind::Fifo, 0o600, 0, 0).unwrap();
        let err = b.mknod("fifo", DeviceKind::Fifo, 0o600, 0, 0).unwrap_err();
        assert!(err.is_already_exists());
    }

    #[test]
    fn chown_to_own_ids_succeeds() {
        let (_tmp, mut b) = backend();
        b.mkdir("owned", 0o755).unwrap();

        let uid = unsafe { libc::getuid() };
        let gid = unsafe { libc::getgid() };
        b.chown("owned", uid, gid, true).unwrap();
    }

    #[test]
    fn chown_nofollow_works_on_dangling_symlink() {
        let (_tmp, mut b) = backend();
        b.symlink("dangling", "/nowhere").unwrap();

        let uid = unsafe { libc::getuid() };
        let gid = unsafe { libc::getgid() };
        // Re-owning the link itself must not try to resolve the target.
        b.chown("dangling", uid, gid, false).unwrap();
    }
}
