//! Jikan (MyAnimeList) API client

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::config::{AppConfig, DEFAULT_USER_AGENT};
use crate::error::{CatalogError, Result};
use crate::models::{CatalogItem, CatalogPage, PageMeta, Trailer};

/// Source of catalog pages. One call is one request: no retry, no cache.
pub trait CatalogGateway: Send + Sync {
    /// Top-ranked ("trending") list
    fn top(&self, page: u32) -> Result<CatalogPage>;

    /// Free-text search. Blank queries and page 0 never reach the network.
    fn search(&self, query: &str, page: u32) -> Result<CatalogPage>;
}

/// Trimmed query, or the reason it cannot be searched
pub fn validate_search(query: &str, page: u32) -> Result<&str> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CatalogError::EmptyQuery);
    }
    if page == 0 {
        return Err(CatalogError::PageOutOfRange { page, total: 0 });
    }
    Ok(query)
}

// Wire format. Optional fields go through `lenient` so a wrong type reads as absent.

#[derive(Debug, Clone, Deserialize)]
struct ApiResponse {
    data: Vec<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pagination: Option<PaginationRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnimeRecord {
    mal_id: u64,
    title: String,
    #[serde(default, deserialize_with = "lenient")]
    title_english: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    images: Option<ImageSet>,
    #[serde(default, deserialize_with = "lenient")]
    score: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    trailer: Option<TrailerRecord>,
    #[serde(default, deserialize_with = "lenient")]
    synopsis: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    episodes: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    aired: Option<AiredRecord>,
    #[serde(default, deserialize_with = "lenient")]
    genres: Option<Vec<NamedRecord>>,
    #[serde(default, deserialize_with = "lenient")]
    studios: Option<Vec<NamedRecord>>,
    #[serde(default, deserialize_with = "lenient")]
    year: Option<i32>,
    #[serde(default, deserialize_with = "lenient")]
    rating: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    duration: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ImageSet {
    #[serde(default, deserialize_with = "lenient")]
    jpg: Option<ImageUrls>,
}

#[derive(Debug, Clone, Deserialize)]
struct ImageUrls {
    #[serde(default, deserialize_with = "lenient")]
    large_image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TrailerRecord {
    #[serde(default, deserialize_with = "lenient")]
    youtube_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AiredRecord {
    #[serde(default, deserialize_with = "lenient")]
    string: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct NamedRecord {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PaginationRecord {
    #[serde(default)]
    last_visible_page: u32,
    #[serde(default)]
    has_next_page: bool,
    #[serde(default)]
    current_page: u32,
    #[serde(default)]
    items: PaginationItems,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PaginationItems {
    #[serde(default)]
    count: u32,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    per_page: u32,
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn names(records: Option<Vec<NamedRecord>>) -> Vec<String> {
    records
        .unwrap_or_default()
        .into_iter()
        .filter_map(|r| non_empty(r.name))
        .collect()
}

impl From<AnimeRecord> for CatalogItem {
    fn from(record: AnimeRecord) -> Self {
        let image_url = record
            .images
            .and_then(|set| set.jpg)
            .and_then(|jpg| non_empty(jpg.large_image_url).or_else(|| non_empty(jpg.image_url)));

        let trailer = record.trailer.and_then(|t| {
            let trailer = Trailer {
                youtube_id: non_empty(t.youtube_id),
                url: non_empty(t.url),
            };
            (trailer.youtube_id.is_some() || trailer.url.is_some()).then_some(trailer)
        });

        CatalogItem {
            id: record.mal_id,
            title: record.title,
            title_english: non_empty(record.title_english),
            image_url,
            score: record.score.filter(|s| s.is_finite()),
            trailer,
            synopsis: non_empty(record.synopsis),
            episodes: record.episodes,
            status: non_empty(record.status),
            aired: non_empty(record.aired.and_then(|a| a.string)),
            genres: names(record.genres),
            studios: names(record.studios),
            year: record.year,
            rating: non_empty(record.rating),
            duration: non_empty(record.duration),
        }
    }
}

/// Decode a list response. Records without an id or title are skipped.
pub fn parse_catalog_page(body: &str) -> Result<CatalogPage> {
    let response: ApiResponse = serde_json::from_str(body)?;

    let mut items = Vec::with_capacity(response.data.len());
    for value in response.data {
        match serde_json::from_value::<AnimeRecord>(value) {
            Ok(record) => items.push(CatalogItem::from(record)),
            Err(e) => tracing::warn!(error = %e, "skipping malformed catalog record"),
        }
    }

    let meta = match response.pagination {
        Some(p) => PageMeta {
            last_visible_page: p.last_visible_page,
            has_next_page: p.has_next_page,
            current_page: p.current_page,
            count: p.items.count,
            total: p.items.total,
            per_page: p.items.per_page,
        },
        None => PageMeta {
            last_visible_page: 1,
            has_next_page: false,
            current_page: 1,
            count: items.len() as u32,
            total: items.len() as u64,
            per_page: items.len() as u32,
        },
    };

    Ok(CatalogPage { items, meta })
}

/// Percent-encode like JavaScript's `encodeURIComponent`
pub fn encode_query_component(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')' => {
                result.push(byte as char);
            }
            _ => result.push_str(&format!("%{:02X}", byte)),
        }
    }
    result
}

pub struct JikanClient {
    base_url: String,
    user_agent: String,
    page_size: u32,
    agent: ureq::Agent,
}

impl JikanClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_size: 20,
            agent: build_agent(Duration::from_secs(30)),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.api_base_url)
            .with_user_agent(&config.user_agent)
            .with_page_size(config.page_size)
            .with_timeout(config.timeout())
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    pub fn top_url(&self, page: u32) -> String {
        if page <= 1 {
            format!("{}/top/anime?limit={}", self.base_url, self.page_size)
        } else {
            format!(
                "{}/top/anime?page={}&limit={}",
                self.base_url, page, self.page_size
            )
        }
    }

    pub fn search_url(&self, query: &str, page: u32) -> String {
        format!(
            "{}/anime?q={}&page={}&limit={}",
            self.base_url,
            encode_query_component(query),
            page,
            self.page_size
        )
    }

    fn make_request(&self, url: &str) -> Result<String> {
        tracing::debug!(%url, "GET");
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .call()?;
        Ok(response.body_mut().read_to_string()?)
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

impl CatalogGateway for JikanClient {
    fn top(&self, page: u32) -> Result<CatalogPage> {
        if page == 0 {
            return Err(CatalogError::PageOutOfRange { page, total: 0 });
        }
        let body = self.make_request(&self.top_url(page))?;
        parse_catalog_page(&body)
    }

    fn search(&self, query: &str, page: u32) -> Result<CatalogPage> {
        let query = validate_search(query, page)?;
        let body = self.make_request(&self.search_url(query, page))?;
        parse_catalog_page(&body)
    }
}
