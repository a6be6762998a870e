use byteorder::{ByteOrder, LittleEndian};

use anyhow::{Result, bail};

/// Entry compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl From<u16> for CompressionMethod {
    fn from(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            other => CompressionMethod::Unknown(other),
        }
    }
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionMethod::Stored => f.write_str("stored"),
            CompressionMethod::Deflate => f.write_str("deflate"),
            CompressionMethod::Unknown(v) => write!(f, "method {}", v),
        }
    }
}

/// Fixed part of the End of Central Directory record
#[derive(Debug)]
pub struct EndRecord {
    pub entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndRecord {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid End of Central Directory");
        }

        Ok(Self {
            entries: LittleEndian::read_u16(&data[10..12]),
            cd_size: LittleEndian::read_u32(&data[12..16]),
            cd_offset: LittleEndian::read_u32(&data[16..20]),
            comment_len: LittleEndian::read_u16(&data[20..22]),
        })
    }

    /// Saturated fields mean the real values live in the ZIP64 record
    pub fn needs_zip64(&self) -> bool {
        self.entries == u16::MAX || self.cd_size == u32::MAX || self.cd_offset == u32::MAX
    }
}

/// ZIP64 locator, stored immediately before the End of Central Directory
#[derive(Debug)]
pub struct Zip64Locator {
    pub record_offset: u64,
}

impl Zip64Locator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 locator");
        }

        Ok(Self {
            record_offset: LittleEndian::read_u64(&data[8..16]),
        })
    }
}

/// Fields of the ZIP64 End of Central Directory record that locate the
/// central directory
#[derive(Debug)]
pub struct Zip64EndRecord {
    pub entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EndRecord {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 End of Central Directory");
        }

        Ok(Self {
            entries: LittleEndian::read_u64(&data[32..40]),
            cd_size: LittleEndian::read_u64(&data[40..48]),
            cd_offset: LittleEndian::read_u64(&data[48..56]),
        })
    }
}

/// Central directory header signature; the fixed part is 46 bytes
pub const CENTRAL_HEADER_SIGNATURE: &[u8] = b"PK\x01\x02";

/// Local header signature; the fixed part is 30 bytes
pub const LOCAL_HEADER_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LOCAL_HEADER_SIZE: usize = 30;

/// One entry of the archive as listed by the central directory
#[derive(Debug, Clone)]
pub struct ZipEntry {
    pub name: String,
    pub method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub header_offset: u64,
    pub modified_time: u16,
    pub modified_date: u16,
}

impl ZipEntry {
    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }

    /// DOS timestamp as `YYYY-MM-DD HH:MM:SS`
    pub fn modified(&self) -> String {
        let (date, time) = (self.modified_date, self.modified_time);
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            ((date >> 9) & 0x7F) + 1980,
            (date >> 5) & 0x0F,
            date & 0x1F,
            (time >> 11) & 0x1F,
            (time >> 5) & 0x3F,
            (time & 0x1F) * 2
        )
    }
}
