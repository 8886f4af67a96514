//! Incremental session log tailer.
//!
//! Reads only the bytes appended since the last pass. A trailing fragment
//! with no newline yet (a producer caught mid-write) is buffered and
//! prepended to the next read, so lines are never emitted torn and bytes
//! are never read twice.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::error::WatcherError;

/// Per-file tail state: byte offset of consumed data plus any buffered
/// incomplete trailing line.
#[derive(Debug)]
pub struct FileTailer {
    path: PathBuf,
    offset: u64,
    fragment: Vec<u8>,
}

impl FileTailer {
    /// Create a tailer starting at the beginning of the file, forcing a
    /// full read on the first pass.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            offset: 0,
            fragment: Vec::new(),
        }
    }

    /// Byte offset of consumed data. Monotonically non-decreasing while the
    /// file only grows.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read newly appended bytes and return the complete lines they form,
    /// in file order. An incomplete trailing line is retained for the next
    /// call rather than emitted or discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read; the tail
    /// state is left unchanged so the pass can be retried.
    pub async fn read_new_lines(&mut self) -> Result<Vec<String>, WatcherError> {
        let mut file = File::open(&self.path).await?;
        let len = file.metadata().await?.len();

        if len < self.offset {
            tracing::warn!(
                path = %self.path.display(),
                offset = self.offset,
                len,
                "File shrank below consumed offset, re-reading from start"
            );
            self.offset = 0;
            self.fragment.clear();
        }

        if len == self.offset {
            return Ok(Vec::new());
        }

        file.seek(std::io::SeekFrom::Start(self.offset)).await?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await?;

        self.offset += buf.len() as u64;
        self.fragment.extend_from_slice(&buf);

        Ok(self.drain_complete_lines())
    }

    /// Split complete lines off the front of the fragment buffer.
    fn drain_complete_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.fragment.iter().rposition(|&byte| byte == b'\n') else {
            return Vec::new();
        };

        let complete: Vec<u8> = self.fragment.drain(..=last_newline).collect();
        complete
            .split(|&byte| byte == b'\n')
            .map(|raw| raw.strip_suffix(b"\r").unwrap_or(raw))
            .filter(|raw| !raw.is_empty())
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
            .collect()
    }
}
