//! Fetching the log archive.
//!
//! The archive is downloaded once and reused by later runs: an existing file
//! at the destination is trusted as-is.

mod http;

pub use http::{HttpDownloader, confirmation_url};

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;

use crate::report::{Reporter, format_size};

/// Source of the archive bytes
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download the file identified by `file_id` to `destination`,
    /// returning the number of bytes written. Progress goes to `reporter`.
    async fn download(
        &self,
        file_id: &str,
        destination: &Path,
        reporter: &Reporter,
    ) -> Result<u64>;
}

/// What [`ensure_archive`] had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A file already existed at the destination
    Cached,
    Downloaded { bytes: u64 },
}

/// URL of a shared file on a Drive-style host.
pub fn download_url(base_url: &str, file_id: &str) -> String {
    format!("{}/uc?id={}", base_url.trim_end_matches('/'), file_id)
}

/// Make sure `destination` holds the archive, downloading it if missing.
///
/// # Arguments
///
/// * `downloader` - Source used when the archive is not on disk yet
/// * `file_id` - Identifier of the shared archive on the host
/// * `destination` - Where the archive is kept between runs
/// * `reporter` - Receives status and download progress lines
///
/// # Returns
///
/// [`FetchOutcome::Cached`] if a file already existed (its content is not
/// checked), otherwise the number of bytes downloaded.
///
/// # Errors
///
/// Download failures are returned to the caller untouched.
pub async fn ensure_archive<D: Downloader + ?Sized>(
    downloader: &D,
    file_id: &str,
    destination: &Path,
    reporter: &Reporter,
) -> Result<FetchOutcome> {
    let exists = fs::try_exists(destination)
        .await
        .with_context(|| format!("Failed to check for archive: {}", destination.display()))?;
    if exists {
        reporter.status(format_args!(
            "Zip file already exists at {}",
            destination.display()
        ));
        return Ok(FetchOutcome::Cached);
    }

    reporter.status("Downloading log file from Google Drive...");
    let bytes = downloader.download(file_id, destination, reporter).await?;
    reporter.status(format_args!("Download complete! ({})", format_size(bytes)));

    Ok(FetchOutcome::Downloaded { bytes })
}
