//! # Capture Log
//!
//! Append-only file of raw bus frames.
//!
//! ## Format
//! ```text
//! --------\n<frame 0 bytes>--------\n<frame 1 bytes>...
//! ```
//! No index, no length field, no checksum. Readers recover record boundaries by
//! scanning for the delimiter from the start of the file, so a frame that itself
//! contains the delimiter will be split in two when read back. That ambiguity is
//! accepted; the writer never escapes payload bytes.
//!
//! Every record is flushed and synced before `append` returns. The process has no
//! shutdown hook it can rely on, so anything already appended must survive a kill.

use bytes::{BufMut, Bytes, BytesMut};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, instrument};

use crate::error::constants::ERR_LOG_OPEN;
use crate::error::{ProxyError, Result};

/// Separator written in front of every record
pub const DELIMITER: &[u8] = b"--------\n";

/// Owner of the capture log file handle. The handle is closed when this is dropped.
#[derive(Debug)]
pub struct CaptureLog {
    file: File,
    path: PathBuf,
    records_written: u64,
}

impl CaptureLog {
    /// Open (or create) `path` for appending.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|source| {
                error!(error = %source, "{ERR_LOG_OPEN}");
                ProxyError::LogOpen {
                    path: path.clone(),
                    source,
                }
            })?;

        info!("Capture log opened");
        Ok(Self {
            file,
            path,
            records_written: 0,
        })
    }

    /// Write one delimiter-prefixed record and push it to stable storage.
    pub async fn append(&mut self, frame: &[u8]) -> Result<()> {
        let mut record = BytesMut::with_capacity(DELIMITER.len() + frame.len());
        record.put_slice(DELIMITER);
        record.put_slice(frame);

        self.file.write_all(&record).await?;
        self.file.flush().await?;
        match self.file.sync_data().await {
            Ok(()) => {}
            // Not a regular file (fifo, character device); nothing to sync.
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => {}
            Err(e) => return Err(e.into()),
        }

        self.records_written += 1;
        debug!(bytes = frame.len(), records = self.records_written, "Record appended");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records appended through this handle (not counting earlier runs).
    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}

/// Split raw log contents into records.
///
/// Bytes before the first delimiter are not part of any record and are skipped.
pub fn split_records(data: Bytes) -> Vec<Bytes> {
    let width = DELIMITER.len();
    let mut starts = Vec::new();
    let mut i = 0;
    while i + width <= data.len() {
        if &data[i..i + width] == DELIMITER {
            starts.push(i);
            i += width;
        } else {
            i += 1;
        }
    }

    starts
        .iter()
        .enumerate()
        .map(|(k, &start)| {
            let end = starts.get(k + 1).copied().unwrap_or(data.len());
            data.slice(start + width..end)
        })
        .collect()
}

/// Read a capture log back into its records.
pub async fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<Bytes>> {
    let data = tokio::fs::read(path).await?;
    Ok(split_records(Bytes::from(data)))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[tokio::test]
    async fn appends_delimited_records_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.log");

        let mut log = CaptureLog::open(&path).await.unwrap();
        log.append(&[1, 2, 3, 4, 5]).await.unwrap();
        log.append(b"second frame").await.unwrap();
        assert_eq!(log.records_written(), 2);
        drop(log);

        let raw = std::fs::read(&path).unwrap();
        let mut expected = Vec::new();
        expected.extend_from_slice(DELIMITER);
        expected.extend_from_slice(&[1, 2, 3, 4, 5]);
        expected.extend_from_slice(DELIMITER);
        expected.extend_from_slice(b"second frame");
        assert_eq!(raw, expected);
    }

    #[tokio::test]
    async fn reopening_appends_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.log");

        CaptureLog::open(&path).await.unwrap().append(b"first").await.unwrap();
        CaptureLog::open(&path).await.unwrap().append(b"again").await.unwrap();

        let records = read_records(&path).await.unwrap();
        assert_eq!(records, vec![Bytes::from_static(b"first"), Bytes::from_static(b"again")]);
    }

    #[tokio::test]
    async fn open_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("capture.log");
        let err = CaptureLog::open(&path).await.unwrap_err();
        assert!(matches!(err, ProxyError::LogOpen { .. }));
    }

    #[test]
    fn embedded_delimiter_splits_the_record() {
        let mut data = Vec::new();
        data.extend_from_slice(DELIMITER);
        data.extend_from_slice(b"ab");
        data.extend_from_slice(DELIMITER);
        data.extend_from_slice(b"cd");

        let records = split_records(Bytes::from(data));
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][..], b"ab");
        assert_eq!(&records[1][..], b"cd");
    }

    #[test]
    fn leading_garbage_is_skipped() {
        let mut data = b"junk".to_vec();
        data.extend_from_slice(DELIMITER);
        data.extend_from_slice(b"frame");
        let records = split_records(Bytes::from(data));
        assert_eq!(records, vec![Bytes::from_static(b"frame")]);
    }
}
