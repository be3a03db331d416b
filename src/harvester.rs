//! The per-file harvesting loop.

use crate::config::{HarvestConfig, StartAt};
use crate::error::{Error, Result};
use crate::event::FileEvent;
use crate::reader::{LineReader, ReadOutcome};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

/// Harvests lines from a single file until it goes quiet or fails.
pub struct Harvester {
    path: PathBuf,
    config: HarvestConfig,
    fields: Arc<BTreeMap<String, String>>,
    reader: LineReader,
    finish: Option<oneshot::Sender<u64>>,
}

impl Harvester {
    /// Creates a harvester that has no offset yet; its config decides where to start.
    pub fn new<P: AsRef<Path>>(path: P, config: HarvestConfig) -> Self {
        let path = path.as_ref().to_path_buf();
        let reader = LineReader::new(&path, &config);
        let fields = Arc::new(config.fields.clone());

        Self {
            path,
            config,
            fields,
            reader,
            finish: None,
        }
    }

    /// Resume reading at `offset`, typically the value a previous harvester
    /// reported on exit.
    pub fn resume_at(mut self, offset: u64) -> Self {
        self.reader.resume_at(offset);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Offset right after the last line delivered to the sink.
    pub fn offset(&self) -> u64 {
        self.reader.offset()
    }

    pub fn is_tracked(&self) -> bool {
        self.reader.is_tracked()
    }

    /// Run the harvesting loop, pushing one event per line into `output`.
    ///
    /// Returns `Ok(())` once the file has been quiet for longer than the
    /// configured dead time. Read errors, a non-regular target and a closed
    /// sink end the loop with an error. Whatever the exit path, including
    /// cancellation of the future, the final offset is sent on `finish`
    /// exactly once.
    pub async fn harvest(
        mut self,
        output: mpsc::Sender<FileEvent>,
        finish: oneshot::Sender<u64>,
    ) -> Result<()> {
        self.finish = Some(finish);
        self.announce();

        let mut line = 0u64;
        let mut last_read_time = Instant::now();

        loop {
            match self.reader.next_line().await {
                Ok(ReadOutcome::Line(read)) => {
                    last_read_time = Instant::now();
                    line += 1;

                    let event = FileEvent {
                        source: self.path.clone(),
                        offset: self.reader.offset(),
                        line,
                        text: read.text,
                        fields: Arc::clone(&self.fields),
                        metadata: self.reader.metadata().cloned(),
                    };

                    if output.send(event).await.is_err() {
                        warn!(path = %self.path.display(), offset = self.reader.offset(), "event sink closed; stopping harvest");
                        return Err(Error::StreamClosed);
                    }
                    self.reader.advance(read.consumed);
                }
                Ok(ReadOutcome::Truncated) => {
                    info!(path = %self.path.display(), "file truncated, seeking to beginning");
                    self.reader.rewind();
                }
                Ok(ReadOutcome::Eof) => {
                    let idle = last_read_time.elapsed();
                    if idle > self.config.dead_time {
                        info!(path = %self.path.display(), idle = ?idle, "stopping harvest; file has been idle");
                        return Ok(());
                    }
                }
                Err(e) => {
                    error!(path = %self.path.display(), error = %e, fatal = e.is_fatal(), "stopping harvest after read failure");
                    return Err(e);
                }
            }
        }
    }

    fn announce(&self) {
        let path = self.path.display();
        if self.reader.is_tracked() {
            info!(path = %path, position = self.reader.offset(), "harvest started");
        } else if self.config.start_at == StartAt::End {
            info!(path = %path, "harvest started (tailing)");
        } else {
            info!(path = %path, "harvest started");
        }
    }
}

impl Drop for Harvester {
    fn drop(&mut self) {
        // Every exit from `harvest` drops the harvester, so this is the single
        // place the final offset is reported.
        if let Some(finish) = self.finish.take() {
            let _ = finish.send(self.reader.offset());
        }
    }
}
