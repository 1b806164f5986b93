//! Path helpers.
//!
//! Turns a watched source directory into a flat, filesystem-safe name that
//! keys its hash store document, and pulls base names out of candidate paths.

use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Encodes a source directory path into a name usable as a single file name
/// component.
///
/// Drive separators (`:`) are dropped, both `/` and `\` become `_`, and any
/// leading or trailing `_` is trimmed. The transformation is pure and
/// deterministic, which is all the hash store needs to find its document
/// again after a restart.
///
/// > **Note:** This is **not** injective. Two source paths that only differ
/// >           in the replaced characters (`/data/in_box` and `/data/in/box`)
/// >           share an encoded name, and therefore a hash store document.
///
/// # Examples
///
/// ```
/// use ferry_storage::encode_source;
/// assert_eq!(encode_source("/srv/incoming/scans"), "srv_incoming_scans");
/// assert_eq!(encode_source(r"C:\Users\scanner\Out\"), "C_Users_scanner_Out");
/// ```
pub fn encode_source(source: impl AsRef<Path>) -> String {
    source
        .as_ref()
        .to_string_lossy()
        .replace(':', "")
        .replace(['\\', '/'], "_")
        .trim_matches('_')
        .to_string()
}

/// Returns the final component of `path` as an owned string.
///
/// Non-UTF8 names are converted lossily; they are only ever used as map keys
/// and log fields.
pub fn basename(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    match path.file_name() {
        Some(name) => Ok(name.to_string_lossy().into_owned()),
        None => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
    }
}

/// Where a file named like `source` lands inside `destination`.
pub fn destination_for(source: impl AsRef<Path>, destination: impl AsRef<Path>) -> Result<PathBuf> {
    let source = source.as_ref();
    match source.file_name() {
        Some(name) => Ok(destination.as_ref().join(name)),
        None => exn::bail!(ErrorKind::InvalidPath(source.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/srv/incoming", "srv_incoming")]
    #[case("/srv/incoming/", "srv_incoming")]
    #[case("relative/dir", "relative_dir")]
    #[case(r"D:\Digitalizacoes\Entrada", "D_Digitalizacoes_Entrada")]
    #[case(r"\\nas\share\drop", "nas_share_drop")]
    #[case("plain", "plain")]
    fn test_encode_source(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(encode_source(source), expected);
    }

    #[test]
    fn test_encode_source_is_deterministic() {
        assert_eq!(encode_source("/a/b/c"), encode_source("/a/b/c"));
    }

    #[test]
    fn test_encode_source_collisions_are_possible() {
        // Accepted: the encoding is lossy and these two share a document.
        assert_eq!(encode_source("/data/in_box"), encode_source("/data/in/box"));
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("/srv/incoming/report.PDF").unwrap(), "report.PDF");
        assert_eq!(basename("report.pdf").unwrap(), "report.pdf");
        assert!(basename("/").is_err());
        assert!(basename("").is_err());
    }

    #[test]
    fn test_destination_for() {
        assert_eq!(
            destination_for("/srv/in/scan-001.tif", "/mnt/archive").unwrap(),
            PathBuf::from("/mnt/archive/scan-001.tif")
        );
        assert!(destination_for("/", "/mnt/archive").is_err());
    }
}
