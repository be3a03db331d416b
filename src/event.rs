//! Line events emitted by a harvester.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::Metadata;
use std::path::PathBuf;
use std::sync::Arc;

/// One complete line read from a watched file.
#[derive(Debug, Clone, Serialize)]
pub struct FileEvent {
    /// Path the line was read from.
    pub source: PathBuf,
    /// Byte offset of the line's first byte.
    pub offset: u64,
    /// 1-based line number within this harvester's session.
    pub line: u64,
    /// Line contents with the LF or CRLF terminator stripped.
    pub text: String,
    /// Static tags from the harvester configuration.
    pub fields: Arc<BTreeMap<String, String>>,
    /// File metadata as of the read that produced this line.
    #[serde(skip)]
    pub metadata: Option<Metadata>,
}

impl FileEvent {
    /// File size observed when the line was read, if the source has one.
    pub fn file_size(&self) -> Option<u64> {
        self.metadata.as_ref().map(Metadata::len)
    }
}
