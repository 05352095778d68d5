#![forbid(unsafe_code)]

//! Blocking client for the two YouTube Data API v3 endpoints the finder
//! needs: `channels` to turn a username into a channel id and `search` to
//! list a channel's uploads inside a window.

use crate::collector::{Page, PageFetcher, VideoRecord};
use crate::error::{FinderError, PageFetchError};
use crate::window::DateRange;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SEARCH_PAGE_SIZE: &str = "50";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelListResponse {
    #[serde(default)]
    page_info: Option<PageInfo>,
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    total_results: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
}

/// Only `items[].id.videoId` and `nextPageToken` are read from a search
/// response. `items` is required; a response without it is malformed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    items: Vec<SearchItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

/// Formats an instant the way the search endpoint expects it, always in UTC.
pub fn rfc3339_utc(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn video_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

pub struct YouTubeClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_API_BASE_URL)
    }

    /// Points the client at another deployment of the API, such as a local
    /// mock server.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Looks up the channel id registered for `channel_name`. Zero matches is
    /// fatal; several matches keep the first one.
    pub fn resolve_channel_id(&self, channel_name: &str) -> Result<String, FinderError> {
        tracing::info!("Searching channel id for channel: {channel_name}");
        let lookup_failed = |source: PageFetchError| FinderError::ChannelLookup {
            channel: channel_name.to_string(),
            source,
        };

        let url = format!("{}/channels", self.base_url);
        tracing::debug!(%url, for_username = channel_name, "sending channel lookup");
        let request = self
            .agent
            .get(&url)
            .query("key", &self.api_key)
            .query("forUsername", channel_name)
            .query("part", "id");
        let response: ChannelListResponse = send(request).map_err(lookup_failed)?;

        let total = response
            .page_info
            .as_ref()
            .and_then(|info| info.total_results)
            .unwrap_or(response.items.len() as u64);
        if total > 1 || response.items.len() > 1 {
            tracing::warn!(
                "{} channels matched {channel_name:?}, using the first one",
                total.max(response.items.len() as u64)
            );
        }

        let channel = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| FinderError::ChannelNotFound(channel_name.to_string()))?;
        tracing::info!("Channel id found: {}", channel.id);
        Ok(channel.id)
    }
}

impl PageFetcher for YouTubeClient {
    fn fetch_page(
        &self,
        channel_id: &str,
        window: &DateRange,
        token: &str,
    ) -> Result<Page, PageFetchError> {
        let url = format!("{}/search", self.base_url);
        let published_before = rfc3339_utc(window.start());
        let published_after = rfc3339_utc(window.end());
        tracing::debug!(
            %url,
            channel_id,
            %published_before,
            %published_after,
            page_token = token,
            "sending search request"
        );
        let request = self
            .agent
            .get(&url)
            .query("key", &self.api_key)
            .query("channelId", channel_id)
            .query("part", "id")
            .query("order", "date")
            .query("type", "video")
            .query("publishedBefore", &published_before)
            .query("publishedAfter", &published_after)
            .query("pageToken", token)
            .query("maxResults", SEARCH_PAGE_SIZE);
        let response: SearchResponse = send(request)?;
        search_page(response)
    }
}

fn send<T: for<'de> Deserialize<'de>>(request: ureq::Request) -> Result<T, PageFetchError> {
    let response = request.call().map_err(|err| match err {
        ureq::Error::Status(status, response) => PageFetchError::Status {
            status,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => PageFetchError::Transport(transport.to_string()),
    })?;
    response
        .into_json()
        .map_err(|err| PageFetchError::Malformed(err.to_string()))
}

fn search_page(response: SearchResponse) -> Result<Page, PageFetchError> {
    let items = response
        .items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            item.id.video_id.map(VideoRecord::new).ok_or_else(|| {
                PageFetchError::Malformed(format!("search item {index} has no id.videoId"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page {
        items,
        next_token: response.next_page_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio::runtime::Runtime;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn decode(body: &str) -> Result<Page, PageFetchError> {
        let response: SearchResponse =
            serde_json::from_str(body).map_err(|err| PageFetchError::Malformed(err.to_string()))?;
        search_page(response)
    }

    /// The mock server answers from its own thread, so the blocking client is
    /// called outside of `block_on`.
    fn mock_api(mocks: Vec<Mock>) -> (Runtime, MockServer) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let server = runtime.block_on(async {
            let server = MockServer::start().await;
            for mock in mocks {
                mock.mount(&server).await;
            }
            server
        });
        (runtime, server)
    }

    fn json(status: u16, body: &str) -> ResponseTemplate {
        ResponseTemplate::new(status).set_body_raw(body.to_string(), "application/json")
    }

    fn window() -> DateRange {
        DateRange::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn rfc3339_utc_uses_zulu_suffix() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).unwrap();
        assert_eq!(rfc3339_utc(instant), "2024-01-15T08:30:00Z");
    }

    #[test]
    fn video_url_points_to_watch_page() {
        assert_eq!(video_url("abc123"), "https://www.youtube.com/watch?v=abc123");
    }

    #[test]
    fn search_page_reads_ids_and_token() {
        let page = decode(
            r#"{
                "kind": "youtube#searchListResponse",
                "nextPageToken": "CDIQAA",
                "items": [
                    {"kind": "youtube#searchResult", "id": {"kind": "youtube#video", "videoId": "v1"}},
                    {"kind": "youtube#searchResult", "id": {"kind": "youtube#video", "videoId": "v2"}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(page.items, vec![VideoRecord::new("v1"), VideoRecord::new("v2")]);
        assert_eq!(page.next_token.as_deref(), Some("CDIQAA"));
    }

    #[test]
    fn search_page_without_token_is_last() {
        let page = decode(r#"{"items": []}"#).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_token.is_none());
    }

    #[test]
    fn search_page_without_items_is_malformed() {
        let err = decode(r#"{"error": {"code": 403}}"#).unwrap_err();
        assert!(matches!(err, PageFetchError::Malformed(_)));
    }

    #[test]
    fn search_page_item_without_video_id_is_malformed() {
        let err = decode(r#"{"items": [{"id": {"kind": "youtube#channel"}}]}"#).unwrap_err();
        assert!(matches!(err, PageFetchError::Malformed(message) if message.contains("item 0")));
    }

    #[test]
    fn fetch_page_sends_window_and_token() {
        let (_runtime, server) = mock_api(vec![
            Mock::given(method("GET"))
                .and(path("/search"))
                .and(query_param("key", "secret"))
                .and(query_param("channelId", "UC123"))
                .and(query_param("part", "id"))
                .and(query_param("order", "date"))
                .and(query_param("type", "video"))
                .and(query_param("publishedBefore", "2024-01-15T00:00:00Z"))
                .and(query_param("publishedAfter", "2024-01-01T00:00:00Z"))
                .and(query_param("pageToken", "TOKEN"))
                .and(query_param("maxResults", "50"))
                .respond_with(json(
                    200,
                    r#"{"items": [{"id": {"videoId": "v9"}}], "nextPageToken": "NEXT"}"#,
                )),
        ]);
        let client = YouTubeClient::with_base_url("secret", server.uri());
        let page = client.fetch_page("UC123", &window(), "TOKEN").unwrap();
        assert_eq!(page.items, vec![VideoRecord::new("v9")]);
        assert_eq!(page.next_token.as_deref(), Some("NEXT"));
    }

    #[test]
    fn fetch_page_maps_error_status() {
        let (_runtime, server) = mock_api(vec![
            Mock::given(method("GET"))
                .and(path("/search"))
                .respond_with(json(403, r#"{"error": "quota"}"#)),
        ]);
        let client = YouTubeClient::with_base_url("secret", server.uri());
        let err = client.fetch_page("UC123", &window(), "").unwrap_err();
        assert!(matches!(err, PageFetchError::Status { status: 403, body } if body.contains("quota")));
    }

    #[test]
    fn fetch_page_maps_non_json_body_to_malformed() {
        let (_runtime, server) = mock_api(vec![
            Mock::given(method("GET"))
                .and(path("/search"))
                .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>")),
        ]);
        let client = YouTubeClient::with_base_url("secret", server.uri());
        let err = client.fetch_page("UC123", &window(), "").unwrap_err();
        assert!(matches!(err, PageFetchError::Malformed(_)));
    }

    #[test]
    fn resolve_channel_id_takes_first_match() {
        let (_runtime, server) = mock_api(vec![
            Mock::given(method("GET"))
                .and(path("/channels"))
                .and(query_param("key", "secret"))
                .and(query_param("forUsername", "someone"))
                .and(query_param("part", "id"))
                .respond_with(json(
                    200,
                    r#"{"pageInfo": {"totalResults": 2}, "items": [{"id": "UCfirst"}, {"id": "UCsecond"}]}"#,
                )),
        ]);
        let client = YouTubeClient::with_base_url("secret", server.uri());
        assert_eq!(client.resolve_channel_id("someone").unwrap(), "UCfirst");
    }

    #[test]
    fn resolve_channel_id_reports_missing_channel() {
        let (_runtime, server) = mock_api(vec![
            Mock::given(method("GET"))
                .and(path("/channels"))
                .and(query_param("forUsername", "nobody"))
                .respond_with(json(200, r#"{"pageInfo": {"totalResults": 0}, "items": []}"#)),
        ]);
        let client = YouTubeClient::with_base_url("secret", server.uri());
        let err = client.resolve_channel_id("nobody").unwrap_err();
        assert!(matches!(err, FinderError::ChannelNotFound(name) if name == "nobody"));
    }

    #[test]
    fn resolve_channel_id_wraps_transport_failures() {
        let (_runtime, server) = mock_api(vec![
            Mock::given(method("GET"))
                .and(path("/channels"))
                .respond_with(json(500, r#"{"error": "backend"}"#)),
        ]);
        let client = YouTubeClient::with_base_url("secret", server.uri());
        let err = client.resolve_channel_id("someone").unwrap_err();
        assert!(matches!(
            err,
            FinderError::ChannelLookup {
                source: PageFetchError::Status { status: 500, .. },
                ..
            }
        ));
    }
}
