//! # logextract
//!
//! Pull one day of logs out of a large zipped log file.
//!
//! The archive is downloaded from a file-sharing host on first use and kept
//! next to the results. Its first entry is then streamed in fixed-size
//! chunks, inflated on the fly, and every line starting with the requested
//! `YYYY-MM-DD` date is written to `output_<date>.txt`.
//!
//! ## Example
//!
//! ```no_run
//! use logextract::{Config, HttpDownloader, extract_logs};
//! use logextract::config::{DEFAULT_BASE_URL, DEFAULT_FILE_ID, default_output_dir};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config {
//!         date: "2024-01-01".to_string(),
//!         output_dir: default_output_dir(),
//!         file_id: DEFAULT_FILE_ID.to_string(),
//!         base_url: DEFAULT_BASE_URL.to_string(),
//!         chunk_size: logextract::filter::DEFAULT_CHUNK_SIZE,
//!         quiet: false,
//!     };
//!     let downloader = HttpDownloader::new(&config.base_url)?;
//!     extract_logs(&config, &downloader).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod fetch;
pub mod filter;
pub mod io;
pub mod pipeline;
pub mod report;
pub mod zip;

pub use cli::Cli;
pub use config::Config;
pub use fetch::{Downloader, FetchOutcome, HttpDownloader, ensure_archive};
pub use filter::{DateFilter, FilterStats, filter_archive};
pub use io::{ArchiveNotFound, LocalFileReader, ReadAt};
pub use pipeline::{RunOutcome, extract_logs};
pub use report::Reporter;
pub use zip::{EntryReader, ZipArchive, ZipEntry};
