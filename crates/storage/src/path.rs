//! Path validation for store-relative paths.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Normalizes a store-relative path and rejects anything that would resolve
/// outside the store root.
///
/// `.` segments, repeated separators and a leading `/` are dropped; `..` is
/// resolved against the segments seen so far and fails once it would climb
/// above the root. Null bytes and Windows path prefixes are rejected, as is
/// a path that normalizes to nothing.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use podshelf_storage::validate_path;
///
/// assert!(validate_path("covers/abc-1400.jpg").is_ok());
/// assert!(validate_path("../abc-1400.jpg").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(
///     validate_path("/tmp/.././abc-1400.jpg").unwrap(),
///     Path::new("abc-1400.jpg")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let mut segments = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(segment) => {
                // Null bytes survive Path::components() on Unix but truncate
                // in the underlying syscalls.
                if segment.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
                segments.push(segment);
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(original.to_path_buf())),
            Component::ParentDir => {
                if segments.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
            },
        }
    }
    if segments.is_empty() {
        exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
    }
    Ok(segments.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("abc-1400.jpg", "abc-1400.jpg")]
    #[case("covers//abc-1400.jpg", "covers/abc-1400.jpg")]
    #[case("./covers/./abc-1400.jpg", "covers/abc-1400.jpg")]
    #[case("/abc-1400.jpg", "abc-1400.jpg")]
    #[case("covers/old/../abc-1400.jpg", "covers/abc-1400.jpg")]
    #[case("covers/", "covers")]
    fn test_normalizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate(input).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case("../abc-1400.jpg")]
    #[case("covers/../../abc-1400.jpg")]
    #[case("..")]
    #[case("")]
    #[case(".")]
    #[case("//")]
    #[case("abc\0.jpg")]
    fn test_rejects(#[case] input: &str) {
        let err = validate(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }
}
