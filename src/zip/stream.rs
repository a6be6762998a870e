use flate2::{Decompress, FlushDecompress, Status};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::structures::{CompressionMethod, ZipEntry};

/// Compressed bytes fetched from the archive per refill.
const INPUT_BUFFER_SIZE: usize = 64 * 1024;

enum Decoder {
    Stored,
    Deflate {
        inflater: Decompress,
        input: Vec<u8>,
        pos: usize,
        len: usize,
        finished: bool,
    },
}

/// Sequential reader over one entry's uncompressed bytes.
///
/// Compressed data is pulled from the archive in bounded slices and inflated
/// incrementally, so memory use does not depend on the entry size.
pub struct EntryReader<R: ReadAt> {
    reader: Arc<R>,
    name: String,
    /// Archive offset of the next compressed byte to fetch
    offset: u64,
    /// Compressed bytes not yet fetched
    remaining: u64,
    decoder: Decoder,
}

impl<R: ReadAt> EntryReader<R> {
    pub(super) fn new(reader: Arc<R>, entry: &ZipEntry, data_offset: u64) -> Result<Self> {
        let decoder = match entry.method {
            CompressionMethod::Stored => Decoder::Stored,
            CompressionMethod::Deflate => Decoder::Deflate {
                // entries hold raw deflate data without a zlib header
                inflater: Decompress::new(false),
                input: vec![0u8; INPUT_BUFFER_SIZE],
                pos: 0,
                len: 0,
                finished: false,
            },
            CompressionMethod::Unknown(method) => bail!(
                "Unsupported compression method {} for {} (only stored and deflate are supported)",
                method,
                entry.name
            ),
        };

        let fits = data_offset
            .checked_add(entry.compressed_size)
            .is_some_and(|end| end <= reader.size());
        if !fits {
            bail!(
                "Entry {} ({} bytes at {}) extends past the end of the archive",
                entry.name,
                entry.compressed_size,
                data_offset
            );
        }

        Ok(Self {
            reader,
            name: entry.name.clone(),
            offset: data_offset,
            remaining: entry.compressed_size,
            decoder,
        })
    }

    /// Read some uncompressed bytes into `buf`; `Ok(0)` means the entry is
    /// exhausted.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        match &mut self.decoder {
            Decoder::Stored => {
                let n = (buf.len() as u64).min(self.remaining) as usize;
                if n == 0 {
                    return Ok(0);
                }
                self.reader.read_exact_at(self.offset, &mut buf[..n]).await?;
                self.offset += n as u64;
                self.remaining -= n as u64;
                Ok(n)
            }
            Decoder::Deflate {
                inflater,
                input,
                pos,
                len,
                finished,
            } => loop {
                if *finished {
                    return Ok(0);
                }

                if *pos == *len && self.remaining > 0 {
                    let n = (input.len() as u64).min(self.remaining) as usize;
                    self.reader.read_exact_at(self.offset, &mut input[..n]).await?;
                    self.offset += n as u64;
                    self.remaining -= n as u64;
                    *pos = 0;
                    *len = n;
                }

                let flush = if self.remaining == 0 {
                    FlushDecompress::Finish
                } else {
                    FlushDecompress::None
                };
                let (before_in, before_out) = (inflater.total_in(), inflater.total_out());
                let status = inflater.decompress(&input[*pos..*len], buf, flush)?;
                let consumed = (inflater.total_in() - before_in) as usize;
                let produced = (inflater.total_out() - before_out) as usize;
                *pos += consumed;

                if status == Status::StreamEnd {
                    *finished = true;
                }
                if produced > 0 {
                    return Ok(produced);
                }
                if *finished {
                    return Ok(0);
                }
                if consumed == 0 && *pos == *len && self.remaining == 0 {
                    bail!("Deflate stream of {} is truncated", self.name);
                }
            },
        }
    }

    /// Fill `buf` as far as the entry allows. Only the last chunk of an entry
    /// comes back short; `Ok(0)` means nothing was left.
    pub async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }
}
