//! Run configuration resolved from the command line and environment.

use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Shared archive holding the application logs
pub const DEFAULT_FILE_ID: &str = "1kQPeECKHD4_x_1f9qKjzCSo0MKvxik_2";

pub const DEFAULT_BASE_URL: &str = "https://drive.google.com";

/// `output/` under the crate root, the same directory on every run
pub fn default_output_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("output")
}

#[derive(Debug, Clone)]
pub struct Config {
    pub date: String,
    pub output_dir: PathBuf,
    pub file_id: String,
    pub base_url: String,
    pub chunk_size: usize,
    pub quiet: bool,
}

impl Config {
    /// Downloaded archive, kept across runs
    pub fn archive_path(&self) -> PathBuf {
        self.output_dir.join("logs.zip")
    }

    /// Per-date result file, overwritten on each run
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!("output_{}.txt", self.date))
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            date: cli.date,
            output_dir: cli.output_dir.unwrap_or_else(default_output_dir),
            file_id: cli.file_id,
            base_url: cli.base_url,
            chunk_size: cli.chunk_size,
            quiet: cli.quiet,
        }
    }
}
