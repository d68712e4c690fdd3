//! Search view state: query, results, pagination and the detail overlay.
//!
//! `SearchView` never performs I/O. Operations that need data return a
//! [`FetchRequest`]; the caller runs it (on a worker thread in the app, inline
//! in tests) and feeds the [`FetchOutcome`] back through [`SearchView::apply`].
//!
//! Every request carries a token. Only the outcome for the most recently
//! issued token is applied, so a slow earlier response can never overwrite a
//! newer one.

use std::fmt;

use crate::api::CatalogGateway;
use crate::error::CatalogError;
use crate::models::{CatalogItem, CatalogPage, PageMeta};

/// Max page buttons in the pagination bar
pub const PAGE_WINDOW: u32 = 5;

pub const TRENDING_FAILED: &str = "Failed to load featured anime.";
pub const SEARCH_FAILED: &str = "Failed to fetch anime data. Please try again.";

/// What to fetch
#[derive(Debug, Clone, PartialEq)]
pub enum FetchKind {
    Trending { page: u32 },
    Search { query: String, page: u32 },
}

impl FetchKind {
    pub fn page(&self) -> u32 {
        match self {
            FetchKind::Trending { page } | FetchKind::Search { page, .. } => *page,
        }
    }

    pub fn failure(&self) -> FetchFailure {
        match self {
            FetchKind::Trending { .. } => FetchFailure::Trending,
            FetchKind::Search { .. } => FetchFailure::Search,
        }
    }

    fn showing(&self) -> Showing {
        match self {
            FetchKind::Trending { .. } => Showing::Trending,
            FetchKind::Search { .. } => Showing::Search,
        }
    }
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchKind::Trending { page } => write!(f, "trending page {}", page),
            FetchKind::Search { query, page } => write!(f, "search \"{}\" page {}", query, page),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub token: u64,
    pub kind: FetchKind,
}

impl FetchRequest {
    /// Run against a gateway. Exactly one gateway call.
    pub fn execute(self, gateway: &dyn CatalogGateway) -> FetchOutcome {
        let result = match &self.kind {
            FetchKind::Trending { page } => gateway.top(*page),
            FetchKind::Search { query, page } => gateway.search(query, *page),
        };
        FetchOutcome {
            token: self.token,
            kind: self.kind,
            result,
        }
    }
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub token: u64,
    pub kind: FetchKind,
    pub result: Result<CatalogPage, CatalogError>,
}

/// User-facing failure. Deliberately coarse: the detail goes to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    Trending,
    Search,
}

impl FetchFailure {
    pub fn message(&self) -> &'static str {
        match self {
            FetchFailure::Trending => TRENDING_FAILED,
            FetchFailure::Search => SEARCH_FAILED,
        }
    }
}

/// Which source the result list belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Showing {
    Trending,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Loading { token: u64 },
    Failed(FetchFailure),
}

/// What the main area shows. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Default,
    Searching,
    NoResults,
    Error,
    Loading,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    /// Bound to the search field
    pub text: String,
    /// Page most recently requested
    pub page: u32,
}

impl Default for QueryState {
    fn default() -> Self {
        Self { text: String::new(), page: 1 }
    }
}

/// What is on screen. Only ever replaced as a whole by `SearchView::apply`,
/// so source, page number and items always describe each other.
#[derive(Debug, Clone, PartialEq)]
struct ResultState {
    page: CatalogPage,
    page_number: u32,
    showing: Showing,
    searched_query: String,
}

impl Default for ResultState {
    fn default() -> Self {
        Self {
            page: CatalogPage::default(),
            page_number: 1,
            showing: Showing::Trending,
            searched_query: String::new(),
        }
    }
}

impl ResultState {
    fn for_kind(kind: FetchKind, page: CatalogPage) -> Self {
        let page_number = kind.page();
        let showing = kind.showing();
        let searched_query = match kind {
            FetchKind::Search { query, .. } => query,
            FetchKind::Trending { .. } => String::new(),
        };
        Self {
            page,
            page_number,
            showing,
            searched_query,
        }
    }
}

/// Result of feeding an outcome back into the view
#[derive(Debug)]
pub enum Applied {
    Loaded { count: usize },
    Failed { failure: FetchFailure, error: CatalogError },
    /// Superseded by a newer request; state untouched
    Stale { token: u64 },
}

/// A present field of the selected item, in display order
#[derive(Debug, Clone, PartialEq)]
pub enum DetailSection<'a> {
    Status(&'a str),
    Aired(&'a str),
    Studios(&'a [String]),
    Genres(&'a [String]),
    Year(i32),
    Rating(&'a str),
    Duration(&'a str),
    Synopsis(&'a str),
}

#[derive(Debug, Default)]
pub struct DetailOverlay {
    selected: Option<CatalogItem>,
}

impl DetailOverlay {
    /// Replaces whatever was open
    pub fn open(&mut self, item: CatalogItem) {
        self.selected = Some(item);
    }

    pub fn close(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&CatalogItem> {
        self.selected.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    pub fn sections(item: &CatalogItem) -> Vec<DetailSection<'_>> {
        let mut sections = Vec::new();
        if let Some(status) = &item.status {
            sections.push(DetailSection::Status(status));
        }
        if let Some(aired) = &item.aired {
            sections.push(DetailSection::Aired(aired));
        }
        if !item.studios.is_empty() {
            sections.push(DetailSection::Studios(&item.studios));
        }
        if !item.genres.is_empty() {
            sections.push(DetailSection::Genres(&item.genres));
        }
        if let Some(year) = item.year {
            sections.push(DetailSection::Year(year));
        }
        if let Some(rating) = &item.rating {
            sections.push(DetailSection::Rating(rating));
        }
        if let Some(duration) = &item.duration {
            sections.push(DetailSection::Duration(duration));
        }
        if let Some(synopsis) = &item.synopsis {
            sections.push(DetailSection::Synopsis(synopsis));
        }
        sections
    }
}

/// Page numbers for the pagination bar: at most `PAGE_WINDOW`, centred on
/// `current`, never outside `1..=total`.
pub fn page_window(current: u32, total: u32) -> Vec<u32> {
    if total == 0 {
        return Vec::new();
    }
    let len = total.min(PAGE_WINDOW);
    let current = current.clamp(1, total);
    let start = current
        .saturating_sub(PAGE_WINDOW / 2)
        .clamp(1, total - len + 1);
    (start..start + len).collect()
}

#[derive(Debug)]
pub struct SearchView {
    pub query: QueryState,
    pub detail: DetailOverlay,
    results: ResultState,
    phase: Phase,
    next_token: u64,
    initial_load_issued: bool,
    scroll_to_top: bool,
}

impl Default for SearchView {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchView {
    pub fn new() -> Self {
        Self {
            query: QueryState::default(),
            detail: DetailOverlay::default(),
            results: ResultState::default(),
            phase: Phase::Idle,
            next_token: 0,
            initial_load_issued: false,
            scroll_to_top: false,
        }
    }

    fn begin(&mut self, kind: FetchKind) -> FetchRequest {
        self.next_token += 1;
        let token = self.next_token;
        self.phase = Phase::Loading { token };
        self.query.page = kind.page();
        FetchRequest { token, kind }
    }

    /// Trending fetch on first frame. Returns `None` on every later call.
    pub fn initial_load(&mut self) -> Option<FetchRequest> {
        if self.initial_load_issued {
            return None;
        }
        self.initial_load_issued = true;
        Some(self.begin(FetchKind::Trending { page: 1 }))
    }

    /// Search for the current query text from page 1. Blank text is a no-op.
    pub fn submit(&mut self) -> Option<FetchRequest> {
        let query = self.query.text.trim().to_string();
        if query.is_empty() {
            return None;
        }
        Some(self.begin(FetchKind::Search { query, page: 1 }))
    }

    /// Jump to `page` of whatever is currently shown.
    pub fn change_page(&mut self, page: u32) -> Option<FetchRequest> {
        if page < 1 || page > self.total_pages() {
            return None;
        }
        let kind = match self.results.showing {
            Showing::Search if self.results.searched_query.is_empty() => return None,
            Showing::Search => FetchKind::Search {
                query: self.results.searched_query.clone(),
                page,
            },
            Showing::Trending => FetchKind::Trending { page },
        };
        self.scroll_to_top = true;
        Some(self.begin(kind))
    }

    /// Clears the search field and refetches trending page 1. The search
    /// results stay current until the trending page arrives.
    pub fn back_to_trending(&mut self) -> FetchRequest {
        self.query.text.clear();
        self.begin(FetchKind::Trending { page: 1 })
    }

    pub fn apply(&mut self, outcome: FetchOutcome) -> Applied {
        if self.phase != (Phase::Loading { token: outcome.token }) {
            return Applied::Stale { token: outcome.token };
        }

        match outcome.result {
            Ok(page) => {
                let count = page.items.len();
                self.results = ResultState::for_kind(outcome.kind, page);
                self.phase = Phase::Idle;
                Applied::Loaded { count }
            }
            Err(error) => {
                let failure = outcome.kind.failure();
                // A failed trending load keeps what was on screen
                if failure == FetchFailure::Search {
                    self.results = ResultState::for_kind(outcome.kind, CatalogPage::default());
                }
                self.phase = Phase::Failed(failure);
                Applied::Failed { failure, error }
            }
        }
    }

    pub fn mode(&self) -> ViewMode {
        match self.phase {
            Phase::Loading { .. } => ViewMode::Loading,
            Phase::Failed(_) => ViewMode::Error,
            Phase::Idle => match self.results.showing {
                Showing::Trending => ViewMode::Default,
                Showing::Search if self.results.page.is_empty() => ViewMode::NoResults,
                Showing::Search => ViewMode::Searching,
            },
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    pub fn error_message(&self) -> Option<&'static str> {
        match self.phase {
            Phase::Failed(failure) => Some(failure.message()),
            _ => None,
        }
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.results.page.items
    }

    /// Cards to draw. Nothing while a request is in flight.
    pub fn visible_items(&self) -> &[CatalogItem] {
        if self.is_loading() {
            &[]
        } else {
            self.items()
        }
    }

    pub fn meta(&self) -> &PageMeta {
        &self.results.page.meta
    }

    pub fn showing(&self) -> Showing {
        self.results.showing
    }

    /// Page of the results on screen
    pub fn current_page(&self) -> u32 {
        self.results.page_number
    }

    pub fn total_pages(&self) -> u32 {
        self.results.page.total_pages()
    }

    pub fn total_results(&self) -> u64 {
        self.results.page.meta.total
    }

    /// Query the current results were searched with
    pub fn searched_query(&self) -> &str {
        &self.results.searched_query
    }

    pub fn can_submit(&self) -> bool {
        !self.is_loading() && !self.query.text.trim().is_empty()
    }

    pub fn can_go_back(&self) -> bool {
        self.results.showing == Showing::Search
    }

    pub fn show_pagination(&self) -> bool {
        self.total_pages() > 1 && !self.visible_items().is_empty()
    }

    pub fn page_buttons(&self) -> Vec<u32> {
        page_window(self.current_page(), self.total_pages())
    }

    pub fn has_prev_page(&self) -> bool {
        self.current_page() > 1
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page() < self.total_pages()
    }

    /// One-shot flag set by a page change
    pub fn take_scroll_to_top(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_top)
    }

    pub fn select(&mut self, item: CatalogItem) {
        self.detail.open(item);
    }

    pub fn close_detail(&mut self) {
        self.detail.close();
    }
}
