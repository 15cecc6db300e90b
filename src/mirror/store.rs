//! Writing artifacts into the mirror without exposing partial files.
//!
//! Bytes go to a hidden `.<name>.part` sibling first and are renamed onto the
//! final name only after the stream finished and was flushed, so a reader of
//! the mirror never observes a truncated artifact.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use super::source::ByteStream;
use crate::transport::TransferError;

/// Suffix of in-progress download files.
pub const PART_SUFFIX: &str = ".part";

/// Returns the temporary path used while downloading `target`.
#[must_use]
pub fn part_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}{PART_SUFFIX}"))
}

/// Returns true for leftover in-progress files.
#[must_use]
pub fn is_part_file(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(PART_SUFFIX)
}

/// Streams `stream` to `target`, returning the number of bytes written.
///
/// # Errors
///
/// Returns [`TransferError::Io`] if the temporary file cannot be written or
/// renamed, or the stream's own error if the transfer breaks off. In both
/// cases the temporary file is removed and `target` is left untouched.
pub async fn write_atomically(target: &Path, stream: ByteStream) -> Result<u64, TransferError> {
    let temp = part_path(target);
    let result = stream_to_file(&temp, stream).await;

    match result {
        Ok(bytes) => {
            tokio::fs::rename(&temp, target)
                .await
                .map_err(|e| TransferError::io(target, e))?;
            Ok(bytes)
        }
        Err(e) => {
            debug!(path = %temp.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(&temp).await;
            Err(e)
        }
    }
}

async fn stream_to_file(path: &Path, mut stream: ByteStream) -> Result<u64, TransferError> {
    let file = File::create(path)
        .await
        .map_err(|e| TransferError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| TransferError::io(path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| TransferError::io(path, e))?;
    writer
        .get_ref()
        .sync_all()
        .await
        .map_err(|e| TransferError::io(path, e))?;

    Ok(bytes_written)
}
