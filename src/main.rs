//! Command-line entry point: `logextract <YYYY-MM-DD>`.

use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;

use logextract::cli::{USAGE, is_argument_count_error};
use logextract::{Cli, Config, HttpDownloader, extract_logs};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => usage_exit(err),
    };

    let config = Config::from(cli);
    log::debug!("{:?}", config);

    // download errors propagate and fail the process; filtering errors are
    // reported by extract_logs itself
    let downloader = HttpDownloader::new(&config.base_url)?;
    extract_logs(&config, &downloader).await?;

    Ok(())
}

/// Exit before touching the filesystem when the arguments are unusable.
fn usage_exit(err: clap::Error) -> ! {
    if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        err.exit();
    }

    if !is_argument_count_error(&err) {
        eprint!("{}", err);
    }
    println!("{}", USAGE);
    std::process::exit(1);
}
