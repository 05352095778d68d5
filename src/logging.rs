#![forbid(unsafe_code)]

//! Installs the tracing subscriber used by the binary.

use anyhow::{Context, Result, anyhow};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Results and fatal errors only.
    Quiet,
    #[default]
    Normal,
    /// Progress per window, channel lookups.
    Verbose,
    /// Every request and page.
    Debug,
}

impl Verbosity {
    pub fn from_flags(quiet: bool, verbose: bool, debug: bool) -> Self {
        if debug {
            Verbosity::Debug
        } else if verbose {
            Verbosity::Verbose
        } else if quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }

    pub fn level(self) -> Level {
        match self {
            Verbosity::Quiet => Level::ERROR,
            Verbosity::Normal => Level::WARN,
            Verbosity::Verbose => Level::INFO,
            Verbosity::Debug => Level::DEBUG,
        }
    }
}

/// `RUST_LOG` wins over the verbosity flags when it is set.
fn filter_for(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.level().as_str().to_ascii_lowercase()))
}

/// Logs go to `log_file` (truncated) when given, stderr otherwise, so stdout
/// only ever carries links.
pub fn init(verbosity: Verbosity, log_file: Option<&Path>) -> Result<()> {
    let (writer, ansi) = match log_file {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("Creating {}", path.display()))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbosity))
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("installing log subscriber: {err}"))
}
