//! Native codec library location and file association.
//!
//! The codec library is found through a filesystem location injected at
//! build time via the `BRAW_LIBRARIES` environment variable. The location
//! names the library file; the factory is created from the directory that
//! contains it.

use std::path::{Path, PathBuf};

use crate::error::BrawError;

/// Library location captured when the crate was compiled.
pub const BUILD_LIBRARY_LOCATION: Option<&str> = option_env!("BRAW_LIBRARIES");

/// Format name reported to hosts.
pub const FORMAT_NAME: &str = "braw";

/// File extensions routed to this reader.
pub const EXTENSIONS: &[&str] = &["braw"];

/// Returns `true` if `path` has an extension this reader handles.
pub fn supports_extension<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(extension))
        })
}

/// Resolve the directory the codec factory is created from.
///
/// An explicit location wins over the build-time one.
///
/// # Errors
///
/// Returns [`BrawError::LibraryLocationMissing`] if neither is set.
pub(crate) fn resolve_library_dir(explicit: Option<&Path>) -> Result<PathBuf, BrawError> {
    let location = match explicit {
        Some(path) => path.to_path_buf(),
        None => match BUILD_LIBRARY_LOCATION {
            Some(value) if !value.trim().is_empty() => PathBuf::from(value),
            _ => return Err(BrawError::LibraryLocationMissing),
        },
    };

    let directory = match location.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => location,
    };
    Ok(directory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_match_ignores_case() {
        assert!(supports_extension("clip.braw"));
        assert!(supports_extension("/media/A001_C002.BRAW"));
        assert!(!supports_extension("clip.mov"));
        assert!(!supports_extension("braw"));
    }

    #[test]
    fn explicit_location_resolves_to_parent_directory() {
        let directory =
            resolve_library_dir(Some(Path::new("/opt/braw/lib/libBlackmagicRawAPI.so"))).unwrap();
        assert_eq!(directory, PathBuf::from("/opt/braw/lib"));
    }

    #[test]
    fn bare_file_name_resolves_to_itself() {
        let directory = resolve_library_dir(Some(Path::new("libBlackmagicRawAPI.so"))).unwrap();
        assert_eq!(directory, PathBuf::from("libBlackmagicRawAPI.so"));
    }
}
