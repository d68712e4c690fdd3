//! Data models for Anime Nexus

pub const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// UI Tab selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tab {
    Browse,
    Console,
}

/// Trailer reference attached to a catalog item
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trailer {
    pub youtube_id: Option<String>,
    pub url: Option<String>,
}

/// One anime record from the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: u64,
    pub title: String,
    pub title_english: Option<String>,
    pub image_url: Option<String>,
    pub score: Option<f64>,
    pub trailer: Option<Trailer>,
    pub synopsis: Option<String>,
    pub episodes: Option<u32>,
    pub status: Option<String>,
    pub aired: Option<String>,
    pub genres: Vec<String>,
    pub studios: Vec<String>,
    pub year: Option<i32>,
    pub rating: Option<String>,
    pub duration: Option<String>,
}

impl CatalogItem {
    pub fn new(id: u64, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            title_english: None,
            image_url: None,
            score: None,
            trailer: None,
            synopsis: None,
            episodes: None,
            status: None,
            aired: None,
            genres: Vec::new(),
            studios: Vec::new(),
            year: None,
            rating: None,
            duration: None,
        }
    }

    pub fn score_label(&self) -> String {
        match self.score {
            Some(score) => format!("{:.1}", score),
            None => "N/A".to_string(),
        }
    }

    /// Zero episodes means the count is not known yet
    pub fn episodes_label(&self) -> String {
        match self.episodes {
            Some(n) if n > 0 => n.to_string(),
            _ => "N/A".to_string(),
        }
    }

    /// English title, only when it adds something over the main title
    pub fn english_subtitle(&self) -> Option<&str> {
        self.title_english
            .as_deref()
            .filter(|english| *english != self.title)
    }

    pub fn trailer_youtube_id(&self) -> Option<&str> {
        self.trailer.as_ref()?.youtube_id.as_deref()
    }

    pub fn has_trailer(&self) -> bool {
        self.trailer_youtube_id().is_some()
    }

    pub fn trailer_watch_url(&self) -> Option<String> {
        self.trailer_youtube_id()
            .map(|id| format!("{}{}", YOUTUBE_WATCH_URL, id))
    }
}

/// Pagination block of a catalog response
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageMeta {
    pub last_visible_page: u32,
    pub has_next_page: bool,
    pub current_page: u32,
    pub count: u32,
    pub total: u64,
    pub per_page: u32,
}

/// Items and the pagination they came with. Always replaced together.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    pub meta: PageMeta,
}

impl CatalogPage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_pages(&self) -> u32 {
        self.meta.last_visible_page
    }
}
