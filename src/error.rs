#![forbid(unsafe_code)]

//! Error types shared by the library. `FinderError` aborts a run;
//! `PageFetchError` only ends the pagination of a single window.

use chrono::{DateTime, TimeDelta, Utc};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FinderError {
    #[error("the date to start from ({start}) cannot be before the date to go back to ({end})")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("the interval must be a positive duration, got {0}")]
    InvalidInterval(TimeDelta),
    #[error("channel {0:?} could not be found; make sure the channel name is correct")]
    ChannelNotFound(String),
    #[error("looking up channel {channel:?} failed: {source}")]
    ChannelLookup {
        channel: String,
        #[source]
        source: PageFetchError,
    },
    #[error("could not write links to {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while fetching or decoding one page of search results.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageFetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("remote service answered with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("gave up after {limit} pages while the service still reported more")]
    PageLimitExceeded { limit: usize },
}
