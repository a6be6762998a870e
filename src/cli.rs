use clap::Parser;
use clap::error::ErrorKind;
use std::path::PathBuf;

use crate::config::{DEFAULT_BASE_URL, DEFAULT_FILE_ID};
use crate::filter::DEFAULT_CHUNK_SIZE;

/// Printed to stdout when the date argument is missing or repeated
pub const USAGE: &str = "Usage: logextract <YYYY-MM-DD>";

#[derive(Parser, Debug)]
#[command(name = "logextract")]
#[command(version)]
#[command(about = "Extract one day of logs from a zipped log archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  logextract 2024-01-01                       write output/output_2024-01-01.txt\n  \
  logextract --output-dir /tmp/logs 2024-01-01\n  \
  RUST_LOG=debug logextract 2024-01-01        show archive and download details")]
pub struct Cli {
    /// Date prefix of the lines to keep
    #[arg(value_name = "YYYY-MM-DD")]
    pub date: String,

    /// Directory holding logs.zip and the extracted output
    #[arg(long, value_name = "DIR", env = "LOGEXTRACT_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Identifier of the shared archive
    #[arg(long, value_name = "ID", env = "LOGEXTRACT_FILE_ID", default_value = DEFAULT_FILE_ID)]
    pub file_id: String,

    /// Base URL of the file host
    #[arg(long, value_name = "URL", env = "LOGEXTRACT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Bytes of log text read per chunk
    #[arg(
        long,
        value_name = "BYTES",
        env = "LOGEXTRACT_CHUNK_SIZE",
        default_value_t = DEFAULT_CHUNK_SIZE,
        value_parser = parse_chunk_size
    )]
    pub chunk_size: usize,

    /// Quiet mode, no progress messages
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

fn parse_chunk_size(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("chunk size must be greater than zero".to_string()),
        Ok(size) => Ok(size),
        Err(e) => Err(e.to_string()),
    }
}

/// Whether a parse error is about how many positional arguments were given,
/// as opposed to a malformed option value
pub fn is_argument_count_error(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::MissingRequiredArgument | ErrorKind::UnknownArgument | ErrorKind::TooManyValues
    )
}
