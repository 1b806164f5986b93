//! Content digests.

use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Read block size used while hashing.
const BLOCK_SIZE: usize = 64 * 1024;

/// Computes the BLAKE3 digest of a file's contents as lowercase hex.
///
/// The file is streamed in fixed-size blocks, so memory use does not grow
/// with file size. Returns [`NotFound`](ErrorKind::NotFound) or
/// [`PermissionDenied`](ErrorKind::PermissionDenied) if the file vanished or
/// is locked away from us.
#[instrument(level = "trace", skip(path), fields(path = %path.as_ref().display()))]
pub async fn hash_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mut file = File::open(path).await.map_err(|e| ErrorKind::from_io(e, path))?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; BLOCK_SIZE];
    loop {
        let read = file.read(&mut buffer).await.map_err(|e| ErrorKind::from_io(e, path))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}
