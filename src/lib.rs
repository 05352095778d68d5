#![forbid(unsafe_code)]

//! Lists every video a YouTube channel published within a date range.
//!
//! The search endpoint caps how many results a single query may return, so
//! the range is cut into windows ([`window`]), each window is paginated to
//! exhaustion ([`collector`]) and the windows are stitched together most
//! recent first ([`finder`]).

pub mod collector;
pub mod config;
pub mod error;
pub mod finder;
pub mod logging;
pub mod output;
pub mod run;
pub mod window;
pub mod youtube;

pub use collector::{Collected, Page, PageFetcher, PaginatedCollector, VideoRecord};
pub use error::{FinderError, PageFetchError};
pub use finder::{Finder, FinderReport, SearchPlan};
pub use window::{DateRange, Windows, walk};
