//! Read-only access to ZIP archives.
//!
//! - [`structures`]: fixed records of the format (end records, entry metadata)
//! - [`parser`]: central directory parsing over a [`ReadAt`] source
//! - [`stream`]: sequential, incrementally inflated reads of one entry
//!
//! Supported: PKZIP APPNOTE 6.3 archives, ZIP64, STORED and DEFLATE entries.
//! Not supported: encryption, multi-disk archives, other compression methods.

mod parser;
mod stream;
mod structures;

pub use parser::ZipParser;
pub use stream::EntryReader;
pub use structures::*;

use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Result, bail};

/// A ZIP archive opened over a [`ReadAt`] source
pub struct ZipArchive<R: ReadAt> {
    parser: ZipParser<R>,
    entries: Vec<ZipEntry>,
}

impl<R: ReadAt> ZipArchive<R> {
    /// Parse the central directory of `reader`
    pub async fn open(reader: Arc<R>) -> Result<Self> {
        let parser = ZipParser::new(reader);
        let entries = parser.list_entries().await?;
        Ok(Self { parser, entries })
    }

    /// Entries in central directory order
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// The first listed entry, which holds the log for single-file archives
    pub fn first_entry(&self) -> Result<&ZipEntry> {
        match self.entries.first() {
            Some(entry) => Ok(entry),
            None => bail!("Archive contains no entries"),
        }
    }

    /// Open `entry` for sequential reading
    pub async fn open_entry(&self, entry: &ZipEntry) -> Result<EntryReader<R>> {
        let data_offset = self.parser.data_offset(entry).await?;
        log::debug!(
            "entry {}: {}, {} -> {} bytes, modified {}, data at {}",
            entry.name,
            entry.method,
            entry.compressed_size,
            entry.uncompressed_size,
            entry.modified(),
            data_offset
        );
        EntryReader::new(self.parser.reader().clone(), entry, data_offset)
    }
}
