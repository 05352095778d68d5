#![forbid(unsafe_code)]

//! One full run: resolve the channel, search every window, write the links.

use crate::collector::PageFetcher;
use crate::config::{ChannelRef, FinderConfig};
use crate::error::FinderError;
use crate::finder::{Finder, FinderReport};
use crate::output::{video_urls, write_links};

/// Process status for runs that failed before results could be reported.
pub const FATAL_EXIT_CODE: u8 = 2;

pub fn exit_status<T, E>(result: &Result<T, E>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => FATAL_EXIT_CODE,
    }
}

/// Runs a search described by `config`. `resolve` is only called for
/// channels given by name; a failing lookup aborts before any search request
/// and before the output is touched. Finding no video is not an error: the
/// output file is still replaced, so it ends up empty.
pub fn find_and_write<F, R>(
    fetcher: F,
    resolve: R,
    config: &FinderConfig,
) -> Result<FinderReport, FinderError>
where
    F: PageFetcher,
    R: FnOnce(&str) -> Result<String, FinderError>,
{
    let channel_id = match &config.channel {
        ChannelRef::Id(id) => id.clone(),
        ChannelRef::Name(name) => resolve(name)?,
    };

    let report = Finder::new(fetcher)
        .with_max_pages(config.max_pages)
        .with_dedupe(config.dedupe)
        .find(&channel_id, &config.plan)?;

    if report.videos.is_empty() {
        tracing::info!(
            "No video found for that channel! Either there's none or a problem occurred. Enable verbose or debug logging for more details"
        );
    }

    tracing::info!("Generating links for found videos");
    let links = video_urls(&report.videos);
    write_links(config.output_path.as_deref(), &links)?;
    tracing::info!("Done!");
    Ok(report)
}
