//! Test utilities for creating temporary log files and harvester settings.

use crate::config::HarvestConfig;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct TempLogFile {
    pub path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl TempLogFile {
    /// Create a new, empty temporary log file
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("test.log");

        File::create(&path)?;

        Ok(Self {
            path,
            _temp_dir: temp_dir,
        })
    }

    /// Create a temporary log file holding exactly `content`
    pub fn with_content(content: &str) -> std::io::Result<Self> {
        let temp_file = Self::new()?;
        temp_file.append(content)?;
        Ok(temp_file)
    }

    /// Append raw bytes, without adding a terminator
    pub fn append(&self, content: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(content.as_bytes())?;
        file.flush()
    }

    /// Append `content` followed by a newline
    pub fn append_line(&self, content: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(file, "{}", content)?;
        file.flush()
    }

    /// Truncate the file in place and write `content` (copy-truncate rotation)
    pub fn rotate(&self, content: &str) -> std::io::Result<()> {
        File::create(&self.path)?;
        self.append(content)
    }

    /// Get the path to the temporary file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Settings that keep every wait in the millisecond range.
pub fn fast_config() -> HarvestConfig {
    HarvestConfig::default()
        .with_dead_time(Duration::from_millis(150))
        .with_eof_timeout(Duration::from_millis(40))
        .with_eof_poll_interval(Duration::from_millis(10))
        .with_open_retry_interval(Duration::from_millis(10))
        .with_watch_changes(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_log_file_creation() {
        let temp_file = TempLogFile::new().unwrap();
        assert!(temp_file.path().exists());
        assert_eq!(std::fs::metadata(temp_file.path()).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_with_content_is_verbatim() {
        let temp_file = TempLogFile::with_content("a\r\nb").unwrap();

        let file_content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(file_content, "a\r\nb");
    }

    #[tokio::test]
    async fn test_append_line() {
        let temp_file = TempLogFile::new().unwrap();
        temp_file.append_line("line 1").unwrap();
        temp_file.append_line("line 2").unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(content, "line 1\nline 2\n");
    }

    #[tokio::test]
    async fn test_rotate() {
        let temp_file = TempLogFile::with_content("initial content\n").unwrap();
        temp_file.rotate("new\n").unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(content, "new\n");
    }
}
