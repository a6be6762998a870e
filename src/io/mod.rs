mod local;

pub use local::{ArchiveNotFound, LocalFileReader};

use anyhow::{Result, bail};
use async_trait::async_trait;

/// Random access to an archive's bytes
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer, returning the
    /// number of bytes read (may be short)
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Total size of the data source
    fn size(&self) -> u64;

    /// Fill `buf` completely from `offset`, failing if the source ends first
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self
                .read_at(offset + filled as u64, &mut buf[filled..])
                .await?;
            if n == 0 {
                bail!(
                    "Unexpected end of archive at offset {} ({} of {} bytes read)",
                    offset + filled as u64,
                    filled,
                    buf.len()
                );
            }
            filled += n;
        }
        Ok(())
    }
}
