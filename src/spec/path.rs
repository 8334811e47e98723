//! Target path normalization.
//!
//! Entry names are interpreted relative to the build root: leading path
//! separators are stripped so `/bin/init` and `bin/init` address the same
//! target entry, and an absolute-looking name cannot escape the root
//! through backend path semantics. No further canonicalization happens
//! here; in particular `..` segments are passed through to the backend
//! untouched.

use super::entry::ParseError;

/// Maximum length in bytes for a normalized target path.
pub const PATH_MAX: usize = 4096;

/// Normalize an entry name to a root-relative path.
///
/// Idempotent: resolving an already-resolved path is a no-op. A name that
/// is nothing but separators resolves to the empty path, which addresses
/// the root itself (`dir / 0755 0 0` is legal and tolerated as existing).
pub fn resolve_path(name: &str) -> Result<&str, ParseError> {
    let rel = name.trim_start_matches('/');
    if rel.len() > PATH_MAX {
        return Err(ParseError::PathTooLong {
            len: rel.len(),
            max: PATH_MAX,
        });
    }
    Ok(rel)
}
