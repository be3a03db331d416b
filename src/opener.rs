//! Resolves the watched path to a readable, correctly positioned handle.

use crate::config::StartAt;
use crate::error::{Error, Result};
use std::fs::Metadata;
use std::io::SeekFrom;
use std::path::Path;
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::AsyncSeekExt;
use tracing::warn;

/// Path that selects standard input instead of a file.
pub(crate) const STDIN_PATH: &str = "-";

/// Byte offset of the next unread line and whether it has been decided yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Position {
    pub offset: u64,
    pub tracked: bool,
}

impl Position {
    /// No offset known; the first open applies the `StartAt` policy.
    pub(crate) fn untracked() -> Self {
        Self {
            offset: 0,
            tracked: false,
        }
    }

    /// Resume at a known offset.
    pub(crate) fn tracked(offset: u64) -> Self {
        Self {
            offset,
            tracked: true,
        }
    }
}

/// An opened source of bytes.
pub(crate) enum Source {
    Stdin,
    File(File),
}

pub(crate) fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == STDIN_PATH
}

/// Open `path` and seek to where reading should continue.
///
/// Open failures are retried forever with `retry_interval` between attempts.
/// The first open of an untracked position resolves it according to `start_at`
/// and marks it tracked, so later opens seek to the stored offset.
pub(crate) async fn open(
    path: &Path,
    position: &mut Position,
    start_at: StartAt,
    retry_interval: Duration,
) -> Result<Source> {
    if is_stdin(path) {
        return Ok(Source::Stdin);
    }

    let mut file = open_with_retry(path, retry_interval).await?;
    seek_to_position(&mut file, position, start_at).await?;
    Ok(Source::File(file))
}

async fn open_with_retry(path: &Path, retry_interval: Duration) -> Result<File> {
    loop {
        // Opening a FIFO blocks until a writer appears, so reject by path first.
        if let Ok(metadata) = fs::metadata(path).await {
            ensure_regular_file(&metadata, path)?;
        }

        match File::open(path).await {
            Ok(file) => {
                let metadata = file.metadata().await?;
                ensure_regular_file(&metadata, path)?;
                return Ok(file);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed opening file; retrying");
                tokio::time::sleep(retry_interval).await;
            }
        }
    }
}

fn ensure_regular_file(metadata: &Metadata, path: &Path) -> Result<()> {
    if metadata.is_file() {
        Ok(())
    } else {
        Err(Error::NotRegularFile {
            path: path.display().to_string(),
        })
    }
}

async fn seek_to_position(file: &mut File, position: &mut Position, start_at: StartAt) -> Result<()> {
    if position.tracked {
        file.seek(SeekFrom::Start(position.offset)).await?;
        return Ok(());
    }

    position.offset = match start_at {
        StartAt::End => file.seek(SeekFrom::End(0)).await?,
        StartAt::Beginning => file.seek(SeekFrom::Start(0)).await?,
    };
    position.tracked = true;
    Ok(())
}
