//! Line assembly over a file that is reopened for every chunk read.
//!
//! Reopening per read keeps the reader working when a rotation replaces the
//! file in place, at the price of one open per chunk. File identity (inode)
//! is deliberately not tracked.

use crate::config::{HarvestConfig, StartAt};
use crate::error::Result;
use crate::opener::{self, Position, Source};
use crate::watcher::ChangeWatcher;
use std::fs::Metadata;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader, Stdin};
use tracing::debug;

/// A complete line taken off the partial-line buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Line {
    /// Line contents without the terminator.
    pub text: String,
    /// Bytes consumed from the file, terminator included.
    pub consumed: u64,
}

/// Result of one `next_line` call.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ReadOutcome {
    Line(Line),
    /// The file is smaller than at the previous read.
    Truncated,
    /// No complete line showed up within the end-of-file budget.
    Eof,
}

enum Segment {
    Bytes(Vec<u8>),
    Truncated,
}

/// Reads complete lines from one path, tracking the resume offset.
pub(crate) struct LineReader {
    path: PathBuf,
    position: Position,
    start_at: StartAt,
    open_retry_interval: Duration,
    eof_timeout: Duration,
    eof_poll_interval: Duration,
    last_observed_size: u64,
    metadata: Option<Metadata>,
    buffer: Vec<u8>,
    stdin: Option<BufReader<Stdin>>,
    watcher: Option<ChangeWatcher>,
}

impl LineReader {
    pub(crate) fn new(path: &Path, config: &HarvestConfig) -> Self {
        let watcher = if config.watch_changes && !opener::is_stdin(path) {
            match ChangeWatcher::new(path) {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "change notifications unavailable; polling only");
                    None
                }
            }
        } else {
            None
        };

        Self {
            path: path.to_path_buf(),
            position: Position::untracked(),
            start_at: config.start_at,
            open_retry_interval: config.open_retry_interval,
            eof_timeout: config.eof_timeout,
            eof_poll_interval: config.eof_poll_interval,
            last_observed_size: 0,
            metadata: None,
            buffer: Vec::new(),
            stdin: None,
            watcher,
        }
    }

    /// Continue from a known offset instead of applying the start policy.
    ///
    /// The offset doubles as the last observed size, so a file that shrank
    /// below it while nobody was watching is reported as truncated.
    pub(crate) fn resume_at(&mut self, offset: u64) {
        self.position = Position::tracked(offset);
        self.last_observed_size = offset;
    }

    /// Offset right after the last line handed out and advanced past.
    pub(crate) fn offset(&self) -> u64 {
        self.position.offset
    }

    pub(crate) fn is_tracked(&self) -> bool {
        self.position.tracked
    }

    pub(crate) fn advance(&mut self, consumed: u64) {
        self.position.offset += consumed;
    }

    /// Start over from the first byte, dropping any partial line.
    pub(crate) fn rewind(&mut self) {
        self.position.offset = 0;
        self.buffer.clear();
    }

    /// Metadata captured by the most recent file read.
    pub(crate) fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Read until a complete line is available, the file shrinks, or the
    /// end-of-file budget runs out.
    ///
    /// Partial bytes stay buffered across an `Eof` outcome and are appended to
    /// on the next call. Any I/O error is returned as is.
    pub(crate) async fn next_line(&mut self) -> Result<ReadOutcome> {
        let started = Instant::now();

        loop {
            match self.read_segment().await? {
                Segment::Truncated => {
                    self.buffer.clear();
                    return Ok(ReadOutcome::Truncated);
                }
                Segment::Bytes(segment) => {
                    self.buffer.extend_from_slice(&segment);
                    if let Some(line) = take_line(&mut self.buffer) {
                        return Ok(ReadOutcome::Line(line));
                    }
                }
            }

            self.wait_for_data().await;
            if started.elapsed() > self.eof_timeout {
                return Ok(ReadOutcome::Eof);
            }
        }
    }

    async fn read_segment(&mut self) -> Result<Segment> {
        let source = opener::open(
            &self.path,
            &mut self.position,
            self.start_at,
            self.open_retry_interval,
        )
        .await?;

        match source {
            Source::Stdin => self.read_stdin().await.map(Segment::Bytes),
            Source::File(file) => self.read_file(file).await,
        }
    }

    async fn read_file(&mut self, mut file: File) -> Result<Segment> {
        let metadata = file.metadata().await?;
        let size = metadata.len();
        let previous_size = std::mem::replace(&mut self.last_observed_size, size);
        self.metadata = Some(metadata);

        if detect_file_truncation(size, previous_size) {
            return Ok(Segment::Truncated);
        }

        // The opener left us at the tracked offset; skip what is already buffered.
        file.seek(SeekFrom::Current(self.buffer.len() as i64)).await?;

        let mut segment = Vec::new();
        BufReader::new(file).read_until(b'\n', &mut segment).await?;
        Ok(Segment::Bytes(segment))
    }

    async fn read_stdin(&mut self) -> Result<Vec<u8>> {
        let stdin = self
            .stdin
            .get_or_insert_with(|| BufReader::new(tokio::io::stdin()));

        let mut segment = Vec::new();
        stdin.read_until(b'\n', &mut segment).await?;
        Ok(segment)
    }

    async fn wait_for_data(&mut self) {
        match self.watcher.as_mut() {
            Some(watcher) => watcher.wait_for_change(self.eof_poll_interval).await,
            None => tokio::time::sleep(self.eof_poll_interval).await,
        }
    }
}

/// Detect if the file was truncated by comparing current size with the last observed one
fn detect_file_truncation(current_size: u64, last_observed_size: u64) -> bool {
    current_size < last_observed_size
}

/// Length of the LF or CRLF terminator ending `bytes`, if any.
fn terminator_len(bytes: &[u8]) -> Option<usize> {
    match bytes {
        [.., b'\r', b'\n'] => Some(2),
        [.., b'\n'] => Some(1),
        _ => None,
    }
}

/// Split a complete line off the buffer, leaving it empty.
fn take_line(buffer: &mut Vec<u8>) -> Option<Line> {
    let terminator = terminator_len(buffer)?;
    let consumed = buffer.len();
    let text = String::from_utf8_lossy(&buffer[..consumed - terminator]).into_owned();
    buffer.clear();

    Some(Line {
        text,
        consumed: consumed as u64,
    })
}
