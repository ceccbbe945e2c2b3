//! Path Helpers
//!
//! Splitting and validation of path components for proc entry lookup.

use super::inode::{FsError, FsResult};

/// Maximum length of a single path component
pub const MAX_COMPONENT_LEN: usize = 255;

/// Split a path into parent directory and filename
///
/// # Returns
/// (parent_path, filename)
pub fn split_path(path: &str) -> (&str, &str) {
    if let Some(pos) = path.rfind('/') {
        let parent = if pos == 0 { "/" } else { &path[..pos] };
        let name = &path[pos + 1..];
        (parent, name)
    } else {
        (".", path)
    }
}

/// Validate a filename
///
/// Returns an error if the name is invalid:
/// - Empty
/// - Contains '/' or null bytes
/// - Too long (> 255 bytes)
pub fn validate_filename(name: &str) -> FsResult<()> {
    if name.is_empty() {
        return Err(FsError::InvalidArgument);
    }

    if name.len() > MAX_COMPONENT_LEN {
        return Err(FsError::NameTooLong);
    }

    if name.contains('/') || name.contains('\0') {
        return Err(FsError::InvalidArgument);
    }

    if name == "." || name == ".." {
        return Err(FsError::InvalidArgument);
    }

    Ok(())
}
