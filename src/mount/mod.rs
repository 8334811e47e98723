//! Disk image attach/mount lifecycle.
//!
//! The engine only ever sees a mounted root directory; this module
//! produces one from a raw image file by loop-attaching it with the host's
//! `losetup` and mounting the requested partition, and it guarantees
//! teardown on every exit path via Drop. Filesystem types are
//! allow-listed; anything else is refused before touching the image.

mod cmd;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Filesystem types an image build may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsType {
    Ext2,
    Ext3,
    Ext4,
    Btrfs,
    Vfat,
    Xfs,
}

impl FsType {
    pub const ALL: &'static [FsType] = &[
        FsType::Ext2,
        FsType::Ext3,
        FsType::Ext4,
        FsType::Btrfs,
        FsType::Vfat,
        FsType::Xfs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FsType::Ext2 => "ext2",
            FsType::Ext3 => "ext3",
            FsType::Ext4 => "ext4",
            FsType::Btrfs => "btrfs",
            FsType::Vfat => "vfat",
            FsType::Xfs => "xfs",
        }
    }

    /// True when the filesystem can represent symlinks.
    pub fn symlinks_supported(self) -> bool {
        !matches!(self, FsType::Vfat)
    }
}

impl FromStr for FsType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        FsType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = FsType::ALL.iter().map(|t| t.as_str()).collect();
                anyhow::anyhow!("unknown fstype: {} (expected one of {})", s, known.join(", "))
            })
    }
}

impl fmt::Display for FsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Highest partition number an image build may address. 0 means the image
/// is unpartitioned and the whole device is mounted.
pub const PART_MAX: u32 = 128;

/// A loop-attached, mounted image.
///
/// Unmounts, detaches, and removes the mountpoint on drop; call
/// [`MountedImage::release`] instead when teardown failures should be
/// reported.
#[derive(Debug)]
pub struct MountedImage {
    loop_dev: String,
    mountpoint: PathBuf,
    released: bool,
}

impl MountedImage {
    /// Attach `image` and mount partition `part` (0 = whole device) at a
    /// fresh mountpoint under `mount_base`.
    pub fn attach(image: &Path, fstype: FsType, part: u32, mount_base: &Path) -> Result<Self> {
        if part > PART_MAX {
            bail!("partition must be in range [0, {}], got {}", PART_MAX, part);
        }
        if !image.exists() {
            bail!("image file not found: {}", image.display());
        }

        let image_arg = image.display().to_string();
        let loop_dev = cmd::run(
            "losetup",
            &["--find", "--show", "--partscan", image_arg.as_str()],
        )
        .context("attaching image to a loop device")?;
        if loop_dev.is_empty() {
            bail!("losetup reported no device for {}", image.display());
        }

        let device = if part == 0 {
            loop_dev.clone()
        } else {
            format!("{}p{}", loop_dev, part)
        };

        let mountpoint = mount_base.join(format!("fsbuild-{}", std::process::id()));
        if let Err(err) = fs::create_dir_all(&mountpoint) {
            cmd::run_tolerant("losetup", &["--detach", loop_dev.as_str()]);
            return Err(err).with_context(|| {
                format!("creating mountpoint {}", mountpoint.display())
            });
        }

        let mountpoint_arg = mountpoint.display().to_string();
        if let Err(err) = cmd::run(
            "mount",
            &["-t", fstype.as_str(), device.as_str(), mountpoint_arg.as_str()],
        ) {
            cmd::run_tolerant("losetup", &["--detach", loop_dev.as_str()]);
            let _ = fs::remove_dir(&mountpoint);
            return Err(err)
                .with_context(|| format!("mounting {} as {}", device, fstype));
        }

        Ok(Self {
            loop_dev,
            mountpoint,
            released: false,
        })
    }

    /// The mounted root all entry paths resolve against.
    pub fn root(&self) -> &Path {
        &self.mountpoint
    }

    /// Unmount and detach, reporting failures. After this the Drop
    /// handler is a no-op, successful or not, so a failed unmount is not
    /// retried silently.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        let mountpoint_arg = self.mountpoint.display().to_string();
        cmd::run("umount", &[mountpoint_arg.as_str()])
            .with_context(|| format!("unmounting {}", self.mountpoint.display()))?;
        cmd::run("losetup", &["--detach", self.loop_dev.as_str()])
            .with_context(|| format!("detaching {}", self.loop_dev))?;
        let _ = fs::remove_dir(&self.mountpoint);
        Ok(())
    }
}

impl Drop for MountedImage {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let mountpoint_arg = self.mountpoint.display().to_string();
        cmd::run_tolerant("umount", &[mountpoint_arg.as_str()]);
        cmd::run_tolerant("losetup", &["--detach", self.loop_dev.as_str()]);
        let _ = fs::remove_dir(&self.mountpoint);
    }
}
