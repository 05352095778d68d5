#![forbid(unsafe_code)]

use crate::collector::VideoRecord;
use crate::error::FinderError;
use crate::youtube::video_url;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub fn video_urls(videos: &[VideoRecord]) -> Vec<String> {
    videos
        .iter()
        .map(|video| {
            let url = video_url(&video.video_id);
            tracing::debug!("Video URL: {url}");
            url
        })
        .collect()
}

/// Writes one link per line.
pub fn write_lines<W: Write>(mut writer: W, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()
}

/// Sends the links to `path`, replacing its content, or to stdout when no
/// path was configured.
pub fn write_links(path: Option<&Path>, links: &[String]) -> Result<(), FinderError> {
    let Some(path) = path else {
        let stdout = io::stdout();
        return write_lines(stdout.lock(), links).map_err(|source| FinderError::OutputWrite {
            path: "<stdout>".into(),
            source,
        });
    };

    tracing::info!("Links will be written to {}", path.display());
    let output_failed = |source: io::Error| FinderError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(output_failed)?;
    write_lines(BufWriter::new(file), links).map_err(output_failed)
}
