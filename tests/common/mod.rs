//! Test fixtures: in-memory ZIP archives and a scripted downloader.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;

use logextract::{Config, Downloader, Reporter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Stored,
    Deflate,
}

/// Build a ZIP archive holding `entries` in order.
pub fn build_zip(entries: &[(&str, &[u8])], method: Method) -> Vec<u8> {
    build_zip_with(entries, method, None)
}

/// Like [`build_zip`], but the central directory moves every entry's sizes
/// into a ZIP64 extra field and claims `compressed_size` for it.
pub fn build_zip_claiming(entries: &[(&str, &[u8])], method: Method, compressed_size: u64) -> Vec<u8> {
    build_zip_with(entries, method, Some(compressed_size))
}

fn build_zip_with(entries: &[(&str, &[u8])], method: Method, zip64_compressed: Option<u64>) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();

    for (name, data) in entries {
        let mut crc = flate2::Crc::new();
        crc.update(data);
        let payload = match method {
            Method::Stored => data.to_vec(),
            Method::Deflate => {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data).unwrap();
                encoder.finish().unwrap()
            }
        };
        let method_id: u16 = match method {
            Method::Stored => 0,
            Method::Deflate => 8,
        };
        let offset = out.len() as u32;

        out.extend_from_slice(b"PK\x03\x04");
        out.write_u16::<LittleEndian>(20).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(method_id).unwrap();
        out.write_u16::<LittleEndian>(0x6000).unwrap();
        out.write_u16::<LittleEndian>(0x5821).unwrap();
        out.write_u32::<LittleEndian>(crc.sum()).unwrap();
        out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
        out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&payload);

        central.extend_from_slice(b"PK\x01\x02");
        central.write_u16::<LittleEndian>(20).unwrap();
        central.write_u16::<LittleEndian>(20).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(method_id).unwrap();
        central.write_u16::<LittleEndian>(0x6000).unwrap();
        central.write_u16::<LittleEndian>(0x5821).unwrap();
        central.write_u32::<LittleEndian>(crc.sum()).unwrap();
        let extra_len: u16 = if zip64_compressed.is_some() { 20 } else { 0 };
        if zip64_compressed.is_some() {
            central.write_u32::<LittleEndian>(u32::MAX).unwrap();
            central.write_u32::<LittleEndian>(u32::MAX).unwrap();
        } else {
            central.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            central.write_u32::<LittleEndian>(data.len() as u32).unwrap();
        }
        central.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        central.write_u16::<LittleEndian>(extra_len).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u32::<LittleEndian>(0).unwrap();
        central.write_u32::<LittleEndian>(offset).unwrap();
        central.extend_from_slice(name.as_bytes());
        if let Some(compressed_size) = zip64_compressed {
            // ZIP64 extra field: uncompressed size, then compressed size
            central.write_u16::<LittleEndian>(0x0001).unwrap();
            central.write_u16::<LittleEndian>(16).unwrap();
            central.write_u64::<LittleEndian>(data.len() as u64).unwrap();
            central.write_u64::<LittleEndian>(compressed_size).unwrap();
        }
    }

    let cd_offset = out.len() as u32;
    out.extend_from_slice(&central);
    out.extend_from_slice(b"PK\x05\x06");
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    out.write_u32::<LittleEndian>(central.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(cd_offset).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out
}

/// What the scripted downloader does when called
pub enum Script {
    /// Write these bytes to the destination
    Archive(Vec<u8>),
    /// Report success without writing anything
    Nothing,
    Fail,
}

pub struct ScriptedDownloader {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedDownloader {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Downloader for ScriptedDownloader {
    async fn download(
        &self,
        _file_id: &str,
        destination: &Path,
        _reporter: &Reporter,
    ) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Archive(bytes) => {
                tokio::fs::write(destination, bytes).await?;
                Ok(bytes.len() as u64)
            }
            Script::Nothing => Ok(0),
            Script::Fail => bail!("HTTP request failed with status: 404 Not Found"),
        }
    }
}

pub fn config(output_dir: PathBuf, date: &str) -> Config {
    Config {
        date: date.to_string(),
        output_dir,
        file_id: "fixture".to_string(),
        base_url: "http://127.0.0.1:9".to_string(),
        chunk_size: logextract::filter::DEFAULT_CHUNK_SIZE,
        quiet: true,
    }
}
