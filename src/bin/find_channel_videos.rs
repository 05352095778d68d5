#![forbid(unsafe_code)]

//! Command-line helper that lists every video a YouTube channel published
//! within a date range and prints one watch link per line.

use anyhow::{Context, Result};
use channel_videos_finder::config::{ConfigOverrides, resolve_config};
use channel_videos_finder::logging::{self, Verbosity};
use channel_videos_finder::run::{exit_status, find_and_write};
use channel_videos_finder::youtube::YouTubeClient;
use chrono::Utc;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "find_channel_videos",
    version,
    about = "Finds all videos in a given YouTube channel"
)]
#[command(group(ArgGroup::new("target").required(true).args(["channel", "channel_id"])))]
#[command(group(ArgGroup::new("detail").args(["quiet", "verbose", "debug"])))]
struct FinderArgs {
    /// Google Data API key. Falls back to YOUTUBE_API_KEY or the .env file.
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// Channel username to get videos from.
    #[arg(short = 'c', long)]
    channel: Option<String>,

    /// Channel id to get videos from, skipping the username lookup.
    #[arg(long)]
    channel_id: Option<String>,

    /// File to write the links to, replaced on every run. Stdout otherwise.
    #[arg(short = 'o', long)]
    output_file_path: Option<PathBuf>,

    /// Videos published after this date are not retrieved. Defaults to now.
    #[arg(short = 'x', long, value_name = "YYYY-MM-DD")]
    date_from: Option<String>,

    /// Videos published before this date are not retrieved. Defaults to four
    /// weeks before --date-from.
    #[arg(short = 'y', long, value_name = "YYYY-MM-DD")]
    date_to: Option<String>,

    /// Longest period, in days, searched with a single query. The API stops
    /// at 500 results per query, so keep it small for busy channels.
    #[arg(short = 'i', long, value_name = "DAYS")]
    interval: Option<i64>,

    /// Only print results or fatal errors.
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Print progress for every time interval.
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Print every request.
    #[arg(short = 'd', long)]
    debug: bool,

    /// File to write the logs to, replaced on every run. Stderr otherwise.
    #[arg(short = 'l', long)]
    log_file_path: Option<PathBuf>,

    /// Pages fetched per time interval before giving up on it.
    #[arg(long, value_name = "PAGES")]
    max_pages: Option<usize>,

    /// Drop repeated video ids (videos published exactly on an interval
    /// boundary may be reported twice otherwise).
    #[arg(long)]
    dedupe: bool,

    /// Alternative API root, e.g. a local mock server.
    #[arg(long, value_name = "URL")]
    api_base_url: Option<String>,

    /// Env file holding YOUTUBE_API_KEY / YOUTUBE_API_BASE_URL.
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,
}

impl FinderArgs {
    fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose, self.debug)
    }

    fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            api_key: self.api_key,
            api_base_url: self.api_base_url,
            channel_name: self.channel,
            channel_id: self.channel_id,
            output_path: self.output_file_path,
            date_from: self.date_from,
            date_to: self.date_to,
            interval_days: self.interval,
            max_pages: self.max_pages,
            dedupe: self.dedupe,
            env_path: self.env_file,
        }
    }
}

fn main() -> ExitCode {
    let args = FinderArgs::parse();
    let logs_to_file = args.log_file_path.is_some();

    let result = run(args);
    if let Err(err) = &result {
        if logs_to_file {
            tracing::error!("{err:#}");
        }
        eprintln!("Error: {err:#}");
    }
    ExitCode::from(exit_status(&result))
}

fn run(args: FinderArgs) -> Result<()> {
    logging::init(args.verbosity(), args.log_file_path.as_deref())?;

    let config = resolve_config(args.into_overrides(), Utc::now())?;
    let client = YouTubeClient::with_base_url(&config.api_key, &config.api_base_url);

    find_and_write(&client, |name| client.resolve_channel_id(name), &config)
        .context("Searching channel videos")?;
    Ok(())
}
