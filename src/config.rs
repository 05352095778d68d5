#![forbid(unsafe_code)]

use crate::collector::DEFAULT_MAX_PAGES;
use crate::finder::SearchPlan;
use crate::youtube::DEFAULT_API_BASE_URL;
use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const API_KEY_VAR: &str = "YOUTUBE_API_KEY";
pub const API_BASE_URL_VAR: &str = "YOUTUBE_API_BASE_URL";
pub const DEFAULT_LOOKBACK_WEEKS: i64 = 4;
pub const DEFAULT_INTERVAL_DAYS: i64 = 28;
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// Legacy username, resolved through the channels endpoint.
    Name(String),
    Id(String),
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct FinderConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub channel: ChannelRef,
    pub output_path: Option<PathBuf>,
    pub plan: SearchPlan,
    pub max_pages: usize,
    pub dedupe: bool,
}

/// Values given on the command line. Anything left empty falls back to the
/// environment, then to the `.env` file, then to a default.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub channel_name: Option<String>,
    pub channel_id: Option<String>,
    pub output_path: Option<PathBuf>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub interval_days: Option<i64>,
    pub max_pages: Option<usize>,
    pub dedupe: bool,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_config(overrides: ConfigOverrides, now: DateTime<Utc>) -> Result<FinderConfig> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    build_config(&file_vars, env_var_string, overrides, now)
}

fn build_config(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: ConfigOverrides,
    now: DateTime<Utc>,
) -> Result<FinderConfig> {
    let api_key = non_blank(overrides.api_key)
        .or_else(|| lookup_value(API_KEY_VAR, file_vars, &env_lookup))
        .ok_or_else(|| anyhow!("API key not set; pass --api-key or set {API_KEY_VAR}"))?;
    let api_base_url = non_blank(overrides.api_base_url)
        .or_else(|| lookup_value(API_BASE_URL_VAR, file_vars, &env_lookup))
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

    let channel = match (
        non_blank(overrides.channel_name),
        non_blank(overrides.channel_id),
    ) {
        (Some(_), Some(_)) => bail!("cannot provide both a channel name and a channel id"),
        (Some(name), None) => ChannelRef::Name(name),
        (None, Some(id)) => ChannelRef::Id(id),
        (None, None) => bail!("a channel name or channel id is required"),
    };

    let start = match overrides.date_from.as_deref() {
        Some(value) => parse_date(value).context("Parsing --date-from")?,
        None => now,
    };
    let end = match overrides.date_to.as_deref() {
        Some(value) => parse_date(value).context("Parsing --date-to")?,
        None => start - TimeDelta::weeks(DEFAULT_LOOKBACK_WEEKS),
    };
    let interval_days = overrides.interval_days.unwrap_or(DEFAULT_INTERVAL_DAYS);
    let interval = TimeDelta::try_days(interval_days)
        .ok_or_else(|| anyhow!("interval of {interval_days} days is out of range"))?;
    let plan = SearchPlan::new(start, end, interval)?;

    tracing::info!("Date to start from: {}", plan.start);
    tracing::info!("Date to go back to: {}", plan.end);
    tracing::info!("Total period of time to find videos for: {}", plan.span());
    tracing::info!("Time interval: {}", plan.interval);

    Ok(FinderConfig {
        api_key,
        api_base_url,
        channel,
        output_path: overrides.output_path.filter(|path| !path.as_os_str().is_empty()),
        plan,
        max_pages: overrides.max_pages.unwrap_or(DEFAULT_MAX_PAGES),
        dedupe: overrides.dedupe,
    })
}

/// Parses a `YYYY-MM-DD` date as midnight UTC.
pub fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .with_context(|| format!("expected a YYYY-MM-DD date, got {value:?}"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("no midnight on {date}"))?;
    Ok(midnight.and_utc())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_var_string(key: &str) -> Option<String> {
    non_blank(env::var(key).ok())
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key).or_else(|| non_blank(file_vars.get(key).cloned()))
}

/// Reads `KEY=value` pairs, tolerating `export` prefixes, quotes, comments
/// and a missing file.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    if !path.exists() {
        return Ok(vars);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, raw)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), unquote(raw.trim()).to_string());
    }
    Ok(vars)
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .into_iter()
        .find_map(|quote| {
            value
                .strip_prefix(quote)
                .and_then(|inner| inner.strip_suffix(quote))
        })
        .unwrap_or(value)
}
