//! A log harvester library that tails a growing file and emits one event per line.
//!
//! A harvester survives slow writers, copy-truncate rotation and process
//! restarts: it only ever reports complete lines, and when it stops it hands
//! back the byte offset to resume from.
//!
//! # Example
//!
//! ```rust,no_run
//! use log_harvester::{HarvestConfig, harvest};
//! use tokio_stream::StreamExt;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut stream = harvest("app.log", HarvestConfig::default());
//!
//!     while let Some(event) = stream.next().await {
//!         println!("{}:{} {}", event.source.display(), event.line, event.text);
//!     }
//!
//!     let finished = stream.finish().await;
//!     println!("resume from offset {}", finished.offset);
//! }
//! ```

// Internal modules - not part of public API
mod config;
mod error;
mod event;
mod harvester;
mod opener;
mod reader;
mod stream;
mod watcher;

#[cfg(test)]
mod test_helpers;

// Public API exports
pub use config::{HarvestConfig, StartAt};
pub use error::{Error, Result};
pub use event::FileEvent;
pub use harvester::Harvester;
pub use stream::{DEFAULT_CAPACITY, Finished, HarvestStream};

use std::path::Path;

/// Starts harvesting `path` from the position its config selects.
///
/// Passing `"-"` reads standard input. Must be called within a tokio runtime.
pub fn harvest<P: AsRef<Path>>(path: P, config: HarvestConfig) -> HarvestStream {
    HarvestStream::spawn(Harvester::new(path, config), DEFAULT_CAPACITY)
}

/// Resumes harvesting `path` at `offset`, as reported by an earlier run.
///
/// # Example
///
/// ```rust,no_run
/// use log_harvester::{HarvestConfig, resume};
/// use tokio_stream::StreamExt;
///
/// #[tokio::main]
/// async fn main() {
///     let mut stream = resume("app.log", HarvestConfig::default(), 4096);
///
///     while let Some(event) = stream.next().await {
///         println!("{}", event.text);
///     }
/// }
/// ```
pub fn resume<P: AsRef<Path>>(path: P, config: HarvestConfig, offset: u64) -> HarvestStream {
    HarvestStream::spawn(Harvester::new(path, config).resume_at(offset), DEFAULT_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{TempLogFile, fast_config};
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_harvest_then_resume() {
        let log = TempLogFile::with_content("one\ntwo\n").unwrap();

        let mut stream = harvest(log.path(), fast_config());
        assert_eq!(stream.next().await.unwrap().text, "one");
        assert_eq!(stream.next().await.unwrap().text, "two");
        assert!(stream.next().await.is_none());
        let offset = stream.finish().await.offset;

        log.append_line("three").unwrap();

        let events: Vec<FileEvent> = resume(log.path(), fast_config(), offset).collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].text, "three");
        assert_eq!(events[0].line, 1);
        assert_eq!(events[0].offset, 8);
    }
}
