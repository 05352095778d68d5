#![forbid(unsafe_code)]

//! Drives the collector across every window of a date range.

use crate::collector::{PageFetcher, PaginatedCollector, VideoRecord};
use crate::error::FinderError;
use crate::window::walk;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashSet;

/// The range to search and how to slice it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPlan {
    /// Most recent bound.
    pub start: DateTime<Utc>,
    /// Oldest bound.
    pub end: DateTime<Utc>,
    pub interval: TimeDelta,
}

impl SearchPlan {
    /// Validates the range and interval so a bad plan fails before the
    /// channel lookup or any search request.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: TimeDelta,
    ) -> Result<Self, FinderError> {
        walk(start, end, interval)?;
        Ok(Self {
            start,
            end,
            interval,
        })
    }

    pub fn span(&self) -> TimeDelta {
        self.start - self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinderReport {
    pub videos: Vec<VideoRecord>,
    pub windows: usize,
    pub incomplete_windows: usize,
}

pub struct Finder<F> {
    collector: PaginatedCollector<F>,
    dedupe: bool,
}

impl<F: PageFetcher> Finder<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            collector: PaginatedCollector::new(fetcher),
            dedupe: false,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.collector = self.collector.with_max_pages(max_pages);
        self
    }

    /// Drops repeated ids once collection is over. Off by default, so videos
    /// published exactly on a window boundary can show up twice.
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    /// Collects every window of `plan`, most recent first. Only an invalid
    /// plan is an error; failing windows contribute what they gathered.
    pub fn find(&self, channel_id: &str, plan: &SearchPlan) -> Result<FinderReport, FinderError> {
        tracing::info!(
            "Searching for videos published in channel between {} and {}",
            plan.start,
            plan.end
        );
        let windows = walk(plan.start, plan.end, plan.interval)?;

        let mut report = FinderReport::default();
        for window in windows {
            let collected = self.collector.collect(channel_id, &window);
            report.windows += 1;
            if let Some(error) = collected.error() {
                report.incomplete_windows += 1;
                tracing::debug!(
                    %window,
                    %error,
                    kept = collected.items().len(),
                    "time interval stopped early, keeping what was found"
                );
            }
            report.videos.extend(collected.into_items());
            tracing::debug!("Total video(s) found so far: {}", report.videos.len());
        }

        if self.dedupe {
            let before = report.videos.len();
            dedupe_by_id(&mut report.videos);
            tracing::debug!(
                removed = before - report.videos.len(),
                "dropped repeated video ids"
            );
        }

        if report.incomplete_windows > 0 {
            tracing::warn!(
                "{} of {} time interval(s) stopped early, results may be incomplete",
                report.incomplete_windows,
                report.windows
            );
        }
        tracing::info!("Found {} video(s) in total", report.videos.len());
        Ok(report)
    }
}

/// Keeps the first occurrence of each video id, preserving order.
pub fn dedupe_by_id(videos: &mut Vec<VideoRecord>) {
    let mut seen = HashSet::new();
    videos.retain(|video| seen.insert(video.video_id.clone()));
}
