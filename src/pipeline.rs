//! Fetch, filter, report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs;

use crate::config::Config;
use crate::fetch::{Downloader, ensure_archive};
use crate::filter::filter_archive;
use crate::io::ArchiveNotFound;
use crate::report::Reporter;

/// How a run ended once the archive was in place
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Extracted { matches: u64, output: PathBuf },
    NoMatches,
    /// The archive vanished between fetching and filtering
    ArchiveMissing,
    /// Filtering failed; the message has already been printed
    Failed(String),
}

/// Extract the lines of `config.date` into the output directory.
///
/// Creating the output directory and fetching the archive fail the call.
/// Filtering errors are printed and reported through [`RunOutcome`] instead,
/// so the process still exits successfully.
pub async fn extract_logs<D: Downloader + ?Sized>(
    config: &Config,
    downloader: &D,
) -> Result<RunOutcome> {
    let reporter = Reporter::new(config.quiet);

    fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                config.output_dir.display()
            )
        })?;

    let archive = config.archive_path();
    ensure_archive(downloader, &config.file_id, &archive, &reporter).await?;

    let output = config.output_path();
    let result = filter_archive(
        &archive,
        &config.date,
        &output,
        config.chunk_size,
        &reporter,
    )
    .await;

    let outcome = match result {
        Ok(stats) if stats.matches_found > 0 => {
            println!(
                "Logs for {} extracted successfully to {}",
                config.date,
                output.display()
            );
            RunOutcome::Extracted {
                matches: stats.matches_found,
                output,
            }
        }
        Ok(_) => {
            println!("No logs found for date {}", config.date);
            RunOutcome::NoMatches
        }
        Err(e) if e.downcast_ref::<ArchiveNotFound>().is_some() => {
            log::debug!("{:#}", e);
            println!("Error: Zip file not found.");
            RunOutcome::ArchiveMissing
        }
        Err(e) => {
            let message = format!("{:#}", e);
            println!("Unexpected error: {}", message);
            RunOutcome::Failed(message)
        }
    };

    Ok(outcome)
}
