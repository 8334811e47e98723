//! Streaming file copy into a backend-created destination.
//!
//! Bytes move through a fixed-size buffer; the whole file is never held in
//! memory. The byte count is checked against the source size captured at
//! open time, so a source that shrinks mid-copy (or an input stream that
//! ends early) is reported rather than silently producing a truncated
//! entry.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::path::Path;

use thiserror::Error;

/// Copy buffer size. Small enough to stay cache-resident, large enough to
/// amortize syscall overhead.
const COPY_BUF: usize = 8192;

#[derive(Debug, Error)]
pub enum CopyError {
    #[error("wrote {written} of {expected} bytes")]
    SizeMismatch { written: u64, expected: u64 },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Copy a host file into `dest`, returning the byte count on success.
pub fn copy_file<W: Write + ?Sized>(source: &Path, dest: &mut W) -> Result<u64, CopyError> {
    let mut input = File::open(source)?;
    let expected = input.metadata()?.len();

    // Tell the kernel we will read the source once, front to back. Purely
    // advisory; a failure changes nothing about the copy.
    let _ = unsafe { libc::posix_fadvise(input.as_raw_fd(), 0, 0, libc::POSIX_FADV_SEQUENTIAL) };

    copy_stream(&mut input, expected, dest)
}

/// Stream `input` into `dest` and require exactly `expected` bytes.
pub fn copy_stream<R, W>(input: &mut R, expected: u64, dest: &mut W) -> Result<u64, CopyError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = [0u8; COPY_BUF];
    let mut written: u64 = 0;

    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        dest.write_all(&buf[..n])?;
        written += n as u64;
    }

    if written != expected {
        return Err(CopyError::SizeMismatch { written, expected });
    }
    Ok(written)
}
