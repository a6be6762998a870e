//! Streaming date filter over the first entry of a log archive.
//!
//! The entry is read in fixed-size chunks, decoded, and split into records on
//! `\n`. The text after the last newline of the buffer is held back until the
//! next chunk completes it, so records spanning chunk boundaries are matched
//! as a whole.

mod decode;

pub use decode::LossyDecoder;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::io::LocalFileReader;
use crate::report::{Reporter, format_count};
use crate::zip::ZipArchive;

/// Default number of uncompressed bytes read per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// A progress line is printed whenever this many records have been processed.
pub const PROGRESS_INTERVAL: u64 = 1_000_000;

/// Counters of one filtering run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Complete (newline-terminated) records seen
    pub lines_processed: u64,
    pub matches_found: u64,
}

/// Line splitter and prefix matcher writing matches to `out`.
pub struct DateFilter<W> {
    target: String,
    /// Partial record after the last newline seen
    carry: String,
    stats: FilterStats,
    out: W,
}

impl<W: AsyncWrite + Unpin> DateFilter<W> {
    pub fn new(target: impl Into<String>, out: W) -> Self {
        Self {
            target: target.into(),
            carry: String::new(),
            stats: FilterStats::default(),
            out,
        }
    }

    pub fn stats(&self) -> FilterStats {
        self.stats
    }

    /// Feed decoded text; every record completed by it is matched.
    pub async fn push(&mut self, text: &str, reporter: &Reporter) -> Result<()> {
        self.carry.push_str(text);
        let Some(last_newline) = self.carry.rfind('\n') else {
            return Ok(());
        };

        let tail = self.carry.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.carry, tail);

        for record in complete[..last_newline].split('\n') {
            self.stats.lines_processed += 1;
            if record.starts_with(self.target.as_str()) {
                self.out.write_all(record.as_bytes()).await?;
                self.out.write_all(b"\n").await?;
                self.stats.matches_found += 1;
            }

            if self.stats.lines_processed % PROGRESS_INTERVAL == 0 {
                reporter.progress(&self.stats);
            }
        }

        Ok(())
    }

    /// Match the unterminated last record, flush, and hand back the counters.
    ///
    /// The last record is written without a newline and is counted as a
    /// match but not as a processed line.
    pub async fn finish(mut self) -> Result<(FilterStats, W)> {
        if !self.carry.is_empty() && self.carry.starts_with(self.target.as_str()) {
            self.out.write_all(self.carry.as_bytes()).await?;
            self.stats.matches_found += 1;
        }
        self.out.flush().await?;
        Ok((self.stats, self.out))
    }
}

/// Write every record of the archive's first entry that starts with `target`
/// to `output`, truncating it first.
///
/// The archive is opened before the output file, so a missing archive leaves
/// `output` untouched.
///
/// # Arguments
///
/// * `archive` - Path of the local ZIP archive
/// * `target` - Prefix a record must start with, usually `YYYY-MM-DD`
/// * `output` - File receiving the matching records
/// * `chunk_size` - Uncompressed bytes read per iteration
/// * `reporter` - Receives the start, progress and summary lines
///
/// # Returns
///
/// The final [`FilterStats`]. An unterminated last record that matches is
/// counted in `matches_found` but not in `lines_processed`.
///
/// # Errors
///
/// [`ArchiveNotFound`](crate::io::ArchiveNotFound) when `archive` does not
/// exist; any other error for unreadable or malformed archives and output
/// write failures.
pub async fn filter_archive(
    archive: &Path,
    target: &str,
    output: &Path,
    chunk_size: usize,
    reporter: &Reporter,
) -> Result<FilterStats> {
    reporter.status(format_args!("Processing logs for {}...", target));

    let reader = Arc::new(LocalFileReader::open(archive)?);
    let zip = ZipArchive::open(reader).await?;
    let entry = zip.first_entry()?;
    log::info!(
        "reading {} (first of {} entries)",
        entry.name,
        zip.entries().len()
    );
    let mut entry_reader = zip.open_entry(entry).await?;

    let file = File::create(output)
        .await
        .with_context(|| format!("Failed to create output file: {}", output.display()))?;
    let mut filter = DateFilter::new(target, BufWriter::new(file));
    let mut decoder = LossyDecoder::default();
    let mut chunk = vec![0u8; chunk_size];
    let mut text = String::with_capacity(chunk_size);

    loop {
        let n = entry_reader.read_chunk(&mut chunk).await?;
        if n == 0 {
            break;
        }
        text.clear();
        decoder.decode(&chunk[..n], &mut text);
        filter.push(&text, reporter).await?;
    }

    if decoder.pending() > 0 {
        log::warn!(
            "dropping {} bytes of an unfinished UTF-8 sequence at end of {}",
            decoder.pending(),
            entry.name
        );
    }

    let (stats, _) = filter.finish().await?;
    reporter.status(format_args!(
        "Completed! Processed {} lines and found {} matches",
        format_count(stats.lines_processed),
        format_count(stats.matches_found)
    ));

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(chunks: &[&str], target: &str) -> (FilterStats, String) {
        let reporter = Reporter::new(true);
        let mut filter = DateFilter::new(target, Vec::new());
        for chunk in chunks {
            filter.push(chunk, &reporter).await.unwrap();
        }
        let (stats, out) = filter.finish().await.unwrap();
        (stats, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_matches_complete_records() {
        let (stats, out) = run(
            &["2024-01-01 A\n2024-01-02 B\n2024-01-01 C\n"],
            "2024-01-01",
        )
        .await;
        assert_eq!(out, "2024-01-01 A\n2024-01-01 C\n");
        assert_eq!(stats.lines_processed, 3);
        assert_eq!(stats.matches_found, 2);
    }

    #[tokio::test]
    async fn test_record_split_across_pushes() {
        let (stats, out) = run(&["x\n2024-0", "1-01 split", " record\ny\n"], "2024-01-01").await;
        assert_eq!(out, "2024-01-01 split record\n");
        assert_eq!(stats.lines_processed, 3);
        assert_eq!(stats.matches_found, 1);
    }

    #[tokio::test]
    async fn test_unterminated_last_record() {
        let (stats, out) = run(&["2024-01-01 A\n2024-01-01 tail"], "2024-01-01").await;
        assert_eq!(out, "2024-01-01 A\n2024-01-01 tail");
        // the tail counts as a match only
        assert_eq!(stats.lines_processed, 1);
        assert_eq!(stats.matches_found, 2);

        let (stats, out) = run(&["2024-01-01 A\nother tail"], "2024-01-01").await;
        assert_eq!(out, "2024-01-01 A\n");
        assert_eq!(stats.matches_found, 1);
    }

    #[tokio::test]
    async fn test_prefix_only_and_blank_lines() {
        let (stats, out) = run(&["\n x 2024-01-01\n2024-01-01\r\n\n"], "2024-01-01").await;
        assert_eq!(out, "2024-01-01\r\n");
        assert_eq!(stats.lines_processed, 4);
        assert_eq!(stats.matches_found, 1);
    }

    #[tokio::test]
    async fn test_progress_at_interval_multiples() {
        let reporter = Reporter::capturing();
        let mut filter = DateFilter::new("2024-01-01", Vec::new());

        // 2,000,001 records, every other one matching; pushed in uneven pieces
        let mut text = "2024-01-01\nx\n".repeat(PROGRESS_INTERVAL as usize);
        text.push_str("x\n");
        for piece in [&text[..7], &text[7..1_234_567], &text[1_234_567..]] {
            filter.push(piece, &reporter).await.unwrap();
        }

        assert_eq!(
            reporter.captured(),
            vec![
                "Processed 1,000,000 lines... Found 500,000 matches".to_string(),
                "Processed 2,000,000 lines... Found 1,000,000 matches".to_string(),
            ]
        );
        let (stats, _) = filter.finish().await.unwrap();
        assert_eq!(stats.lines_processed, 2 * PROGRESS_INTERVAL + 1);
        assert_eq!(stats.matches_found, PROGRESS_INTERVAL);
    }

    #[tokio::test]
    async fn test_no_progress_below_interval() {
        let reporter = Reporter::capturing();
        let mut filter = DateFilter::new("2024-01-01", Vec::new());
        let text = "x\n".repeat(PROGRESS_INTERVAL as usize - 1);
        filter.push(&text, &reporter).await.unwrap();
        assert!(reporter.captured().is_empty());

        filter.push("x\n", &reporter).await.unwrap();
        assert_eq!(reporter.captured().len(), 1);
    }

    #[tokio::test]
    async fn test_no_input() {
        let (stats, out) = run(&[], "2024-01-01").await;
        assert!(out.is_empty());
        assert_eq!(stats, FilterStats::default());
    }
}
