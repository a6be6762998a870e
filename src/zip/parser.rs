//! Central directory parsing.
//!
//! ZIP archives are read from the end: the End of Central Directory record
//! (optionally followed by a comment) points at the central directory, and
//! each central directory header points at the entry's local header, after
//! which the entry data starts. ZIP64 archives keep the real offsets in a
//! separate record found through a locator.

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};

use super::structures::*;

/// Largest comment the format can carry after the End of Central Directory.
const MAX_COMMENT_SIZE: u64 = u16::MAX as u64;

/// Extra field tag holding 64-bit sizes and offsets.
const ZIP64_EXTRA_TAG: u16 = 0x0001;

/// Reads archive metadata from any [`ReadAt`] source.
pub struct ZipParser<R: ReadAt> {
    reader: Arc<R>,
    size: u64,
}

/// Where the central directory lives and how many headers it holds.
struct DirectoryLocation {
    offset: u64,
    size: u64,
    entries: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }

    /// Find the End of Central Directory record and its offset.
    ///
    /// Most archives carry no comment, so the record is tried at the very
    /// end first; otherwise the tail is searched backwards for a signature
    /// whose comment length reaches exactly to the end of the file.
    pub async fn find_end_record(&self) -> Result<(EndRecord, u64)> {
        if self.size < EndRecord::SIZE as u64 {
            bail!("Not a valid ZIP file (only {} bytes)", self.size);
        }

        let offset = self.size - EndRecord::SIZE as u64;
        let mut buf = vec![0u8; EndRecord::SIZE];
        self.reader.read_exact_at(offset, &mut buf).await?;
        if &buf[0..4] == EndRecord::SIGNATURE && buf[20..22] == [0, 0] {
            return Ok((EndRecord::parse(&buf)?, offset));
        }

        let search_size = (MAX_COMMENT_SIZE + EndRecord::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;
        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf).await?;

        for i in (0..=buf.len() - EndRecord::SIZE).rev() {
            if &buf[i..i + 4] != EndRecord::SIGNATURE {
                continue;
            }
            let comment_len = LittleEndian::read_u16(&buf[i + 20..i + 22]) as usize;
            if comment_len == buf.len() - i - EndRecord::SIZE {
                let record = EndRecord::parse(&buf[i..i + EndRecord::SIZE])?;
                return Ok((record, search_start + i as u64));
            }
        }

        bail!("Not a valid ZIP file")
    }

    async fn read_zip64_end_record(&self, end_offset: u64) -> Result<Zip64EndRecord> {
        let locator_offset = end_offset
            .checked_sub(Zip64Locator::SIZE as u64)
            .context("Invalid ZIP64 format: no room for locator")?;
        let mut buf = vec![0u8; Zip64Locator::SIZE];
        self.reader.read_exact_at(locator_offset, &mut buf).await?;
        let locator = Zip64Locator::parse(&buf)?;

        let mut buf = vec![0u8; Zip64EndRecord::MIN_SIZE];
        self.reader
            .read_exact_at(locator.record_offset, &mut buf)
            .await?;
        Zip64EndRecord::parse(&buf)
    }

    async fn locate_directory(&self) -> Result<DirectoryLocation> {
        let (record, offset) = self.find_end_record().await?;

        if record.needs_zip64() {
            let record = self.read_zip64_end_record(offset).await?;
            log::debug!("archive uses ZIP64 ({} entries)", record.entries);
            return Ok(DirectoryLocation {
                offset: record.cd_offset,
                size: record.cd_size,
                entries: record.entries,
            });
        }

        Ok(DirectoryLocation {
            offset: record.cd_offset as u64,
            size: record.cd_size as u64,
            entries: record.entries as u64,
        })
    }

    /// List the entries in central directory order.
    pub async fn list_entries(&self) -> Result<Vec<ZipEntry>> {
        let location = self.locate_directory().await?;
        let fits = location
            .offset
            .checked_add(location.size)
            .is_some_and(|end| end <= self.size);
        if !fits {
            bail!(
                "Central directory ({} bytes at {}) lies outside the archive",
                location.size,
                location.offset
            );
        }

        let mut data = vec![0u8; location.size as usize];
        self.reader.read_exact_at(location.offset, &mut data).await?;

        // entry count comes from the file; don't trust it for allocation
        let mut entries = Vec::with_capacity(location.entries.min(1024) as usize);
        let mut cursor = Cursor::new(data.as_slice());
        for index in 0..location.entries {
            let entry = parse_central_header(&mut cursor)
                .with_context(|| format!("Malformed central directory entry #{}", index))?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Offset of the first data byte of `entry`, past its local header.
    ///
    /// The local header's name and extra field lengths may differ from the
    /// central directory copy, so they are read again here.
    pub async fn data_offset(&self, entry: &ZipEntry) -> Result<u64> {
        let mut buf = vec![0u8; LOCAL_HEADER_SIZE];
        self.reader
            .read_exact_at(entry.header_offset, &mut buf)
            .await?;

        if &buf[0..4] != LOCAL_HEADER_SIGNATURE {
            bail!("Invalid Local File Header for {}", entry.name);
        }

        let name_len = LittleEndian::read_u16(&buf[26..28]) as u64;
        let extra_len = LittleEndian::read_u16(&buf[28..30]) as u64;

        entry
            .header_offset
            .checked_add(LOCAL_HEADER_SIZE as u64 + name_len + extra_len)
            .with_context(|| format!("Local header offset of {} is out of range", entry.name))
    }
}

fn parse_central_header(cursor: &mut Cursor<&[u8]>) -> Result<ZipEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CENTRAL_HEADER_SIGNATURE {
        bail!("Invalid Central Directory File Header");
    }

    // version made by, version needed, flags
    cursor.set_position(cursor.position() + 6);
    let method = cursor.read_u16::<LittleEndian>()?;
    let modified_time = cursor.read_u16::<LittleEndian>()?;
    let modified_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let name_len = cursor.read_u16::<LittleEndian>()?;
    let extra_len = cursor.read_u16::<LittleEndian>()?;
    let comment_len = cursor.read_u16::<LittleEndian>()?;
    // disk number start, internal and external attributes
    cursor.set_position(cursor.position() + 8);
    let mut header_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut name = vec![0u8; name_len as usize];
    cursor.read_exact(&mut name)?;
    let name = String::from_utf8_lossy(&name).into_owned();

    let extra_end = cursor.position() + extra_len as u64;
    while cursor.position() + 4 <= extra_end {
        let tag = cursor.read_u16::<LittleEndian>()?;
        let field_len = cursor.read_u16::<LittleEndian>()? as u64;
        let field_end = cursor.position() + field_len;

        if tag == ZIP64_EXTRA_TAG {
            // only the saturated header fields are present, in this order
            if uncompressed_size == u32::MAX as u64 && cursor.position() + 8 <= field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == u32::MAX as u64 && cursor.position() + 8 <= field_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if header_offset == u32::MAX as u64 && cursor.position() + 8 <= field_end {
                header_offset = cursor.read_u64::<LittleEndian>()?;
            }
        }
        cursor.set_position(field_end);
    }
    cursor.set_position(extra_end + comment_len as u64);

    Ok(ZipEntry {
        name,
        method: CompressionMethod::from(method),
        compressed_size,
        uncompressed_size,
        crc32,
        header_offset,
        modified_time,
        modified_date,
    })
}
