//! Console reporting.

use std::fmt::Display;
use std::sync::Mutex;

use crate::filter::FilterStats;

/// Prints status and progress lines to stdout unless quiet.
#[derive(Debug, Default)]
pub struct Reporter {
    quiet: bool,
    /// Lines kept in memory instead of printed
    captured: Option<Mutex<Vec<String>>>,
}

impl Reporter {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            captured: None,
        }
    }

    /// A reporter that records its lines for later inspection
    pub fn capturing() -> Self {
        Self {
            quiet: false,
            captured: Some(Mutex::new(Vec::new())),
        }
    }

    /// Lines recorded so far by a [`Reporter::capturing`] reporter
    pub fn captured(&self) -> Vec<String> {
        self.captured
            .as_ref()
            .and_then(|lines| lines.lock().ok().map(|lines| lines.clone()))
            .unwrap_or_default()
    }

    /// Intermediate status line, suppressed in quiet mode
    pub fn status(&self, message: impl Display) {
        if self.quiet {
            return;
        }
        match &self.captured {
            Some(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(message.to_string());
                }
            }
            None => println!("{}", message),
        }
    }

    /// Running counters, printed every [`crate::filter::PROGRESS_INTERVAL`] records
    pub fn progress(&self, stats: &FilterStats) {
        self.status(format_args!(
            "Processed {} lines... Found {} matches",
            format_count(stats.lines_processed),
            format_count(stats.matches_found)
        ));
    }
}

/// Format a count with thousands separators.
///
/// ```ignore
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(digit);
    }
    formatted
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
