//! Tests for the search view state machine driven by a fake gateway

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crate::api::{validate_search, CatalogGateway};
    use crate::error::{CatalogError, Result};
    use crate::models::{CatalogItem, CatalogPage, PageMeta, Trailer};
    use crate::state::*;

    /// Records every call; answers with a page per query or a failure
    struct FakeGateway {
        calls: Mutex<Vec<String>>,
        total_pages: u32,
        per_page: usize,
        fail_top: bool,
        fail_search: bool,
    }

    impl FakeGateway {
        fn new(total_pages: u32, per_page: usize) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                total_pages,
                per_page,
                fail_top: false,
                fail_search: false,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn page(&self, prefix: &str, page: u32, count: usize) -> CatalogPage {
            let items = (0..count)
                .map(|i| CatalogItem::new(page as u64 * 1000 + i as u64, &format!("{} {}", prefix, i)))
                .collect();
            CatalogPage {
                items,
                meta: PageMeta {
                    last_visible_page: self.total_pages,
                    has_next_page: page < self.total_pages,
                    current_page: page,
                    count: count as u32,
                    total: self.total_pages as u64 * self.per_page as u64,
                    per_page: self.per_page as u32,
                },
            }
        }
    }

    impl CatalogGateway for FakeGateway {
        fn top(&self, page: u32) -> Result<CatalogPage> {
            self.calls.lock().unwrap().push(format!("top:{}", page));
            if self.fail_top {
                return Err(CatalogError::Status(503));
            }
            Ok(self.page("Top", page, self.per_page))
        }

        fn search(&self, query: &str, page: u32) -> Result<CatalogPage> {
            let query = validate_search(query, page)?;
            self.calls.lock().unwrap().push(format!("search:{}:{}", query, page));
            if self.fail_search {
                return Err(CatalogError::Transport("connection reset".into()));
            }
            if query.starts_with("zzzzz") {
                let mut empty = self.page(query, page, 0);
                empty.meta.last_visible_page = 1;
                empty.meta.total = 0;
                return Ok(empty);
            }
            Ok(self.page(query, page, self.per_page))
        }
    }

    fn run(view: &mut SearchView, gateway: &FakeGateway, request: Option<FetchRequest>) -> Option<Applied> {
        request.map(|r| view.apply(r.execute(gateway)))
    }

    fn search(view: &mut SearchView, gateway: &FakeGateway, query: &str) -> Option<Applied> {
        view.query.text = query.to_string();
        let request = view.submit();
        run(view, gateway, request)
    }

    #[test]
    fn test_initial_load_once() {
        let gateway = FakeGateway::new(10, 20);
        let mut view = SearchView::new();

        let request = view.initial_load();
        assert_eq!(view.mode(), ViewMode::Loading);
        run(&mut view, &gateway, request);
        assert!(view.initial_load().is_none());

        assert_eq!(gateway.calls(), vec!["top:1"]);
        assert_eq!(view.mode(), ViewMode::Default);
        assert_eq!(view.visible_items().len(), 20);
        assert_eq!(view.current_page(), 1);
        assert!(!view.can_go_back());
    }

    #[test]
    fn test_blank_submit_issues_nothing() {
        let gateway = FakeGateway::new(5, 20);
        let mut view = SearchView::new();

        for blank in ["", "   ", "\t\n"] {
            assert!(search(&mut view, &gateway, blank).is_none());
        }
        assert!(gateway.calls().is_empty());
        assert!(!view.can_submit());
        assert_eq!(view.mode(), ViewMode::Default);
    }

    #[test]
    fn test_naruto_scenario() {
        let gateway = FakeGateway::new(5, 20);
        let mut view = SearchView::new();

        let applied = search(&mut view, &gateway, "Naruto");
        assert!(matches!(applied, Some(Applied::Loaded { count: 20 })));
        assert_eq!(gateway.calls(), vec!["search:Naruto:1"]);
        assert_eq!(view.mode(), ViewMode::Searching);
        assert_eq!(view.visible_items().len(), 20);
        assert_eq!(view.total_pages(), 5);
        assert_eq!(view.total_results(), 100);
        assert_eq!(view.page_buttons(), vec![1, 2, 3, 4, 5]);
        assert_eq!(view.current_page(), 1);
        assert!(view.show_pagination());
        assert!(!view.has_prev_page());
        assert!(view.has_next_page());
    }

    #[test]
    fn test_submit_trims_query() {
        let gateway = FakeGateway::new(5, 20);
        let mut view = SearchView::new();
        search(&mut view, &gateway, "  Bleach  ");
        assert_eq!(gateway.calls(), vec!["search:Bleach:1"]);
        assert_eq!(view.searched_query(), "Bleach");
    }

    #[test]
    fn test_no_results_scenario() {
        let gateway = FakeGateway::new(5, 20);
        let mut view = SearchView::new();

        search(&mut view, &gateway, "zzzzznonexistent");
        assert_eq!(view.mode(), ViewMode::NoResults);
        assert!(view.visible_items().is_empty());
        assert!(!view.show_pagination());
        assert_eq!(view.error_message(), None);
        assert_eq!(view.searched_query(), "zzzzznonexistent");
    }

    #[test]
    fn test_change_page_every_valid_page() {
        let gateway = FakeGateway::new(8, 20);
        let mut view = SearchView::new();
        search(&mut view, &gateway, "Gundam");

        for n in [8, 1, 4, 5, 2, 7, 3, 6] {
            let request = view.change_page(n);
            assert!(request.is_some(), "page {} should be valid", n);
            assert!(view.take_scroll_to_top());
            run(&mut view, &gateway, request);
            assert_eq!(view.current_page(), n);
            assert_eq!(view.mode(), ViewMode::Searching);
            assert!(view.page_buttons().contains(&n));
        }
        assert!(!view.take_scroll_to_top());
        assert_eq!(gateway.calls().last().map(String::as_str), Some("search:Gundam:6"));
    }

    #[test]
    fn test_change_page_out_of_range() {
        let gateway = FakeGateway::new(3, 20);
        let mut view = SearchView::new();
        search(&mut view, &gateway, "Gundam");
        let calls = gateway.calls().len();

        assert!(view.change_page(0).is_none());
        assert!(view.change_page(4).is_none());
        assert_eq!(gateway.calls().len(), calls);
        assert_eq!(view.mode(), ViewMode::Searching);
    }

    #[test]
    fn test_change_page_uses_submitted_query() {
        let gateway = FakeGateway::new(3, 20);
        let mut view = SearchView::new();
        search(&mut view, &gateway, "Monster");

        // Editing the field does not change what is being paged
        view.query.text = "Something else".into();
        let request = view.change_page(2);
        run(&mut view, &gateway, request);
        assert_eq!(gateway.calls().last().map(String::as_str), Some("search:Monster:2"));
    }

    #[test]
    fn test_trending_pagination() {
        let gateway = FakeGateway::new(40, 20);
        let mut view = SearchView::new();
        let request = view.initial_load();
        run(&mut view, &gateway, request);

        let request = view.change_page(3);
        run(&mut view, &gateway, request);
        assert_eq!(gateway.calls(), vec!["top:1", "top:3"]);
        assert_eq!(view.mode(), ViewMode::Default);
        assert_eq!(view.current_page(), 3);
        assert_eq!(view.page_buttons(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_failed_search_clears_results() {
        let mut gateway = FakeGateway::new(5, 20);
        let mut view = SearchView::new();
        search(&mut view, &gateway, "Naruto");
        assert_eq!(view.items().len(), 20);

        gateway.fail_search = true;
        let applied = search(&mut view, &gateway, "Bleach");
        assert!(matches!(
            applied,
            Some(Applied::Failed { failure: FetchFailure::Search, .. })
        ));
        assert_eq!(view.mode(), ViewMode::Error);
        assert!(view.items().is_empty());
        assert_eq!(view.total_pages(), 0);
        assert_eq!(view.error_message(), Some(SEARCH_FAILED));
        assert!(view.can_go_back());
        assert!(view.change_page(1).is_none());
    }

    #[test]
    fn test_failed_trending_keeps_items() {
        let mut gateway = FakeGateway::new(5, 20);
        let mut view = SearchView::new();
        let request = view.initial_load();
        run(&mut view, &gateway, request);

        gateway.fail_top = true;
        let request = view.change_page(2);
        let applied = run(&mut view, &gateway, request);
        assert!(matches!(
            applied,
            Some(Applied::Failed { failure: FetchFailure::Trending, .. })
        ));
        assert_eq!(view.mode(), ViewMode::Error);
        assert_eq!(view.error_message(), Some(TRENDING_FAILED));
        assert_eq!(view.visible_items().len(), 20);
        assert_eq!(view.current_page(), 1);
    }

    #[test]
    fn test_error_cleared_by_next_fetch() {
        let mut gateway = FakeGateway::new(5, 20);
        gateway.fail_search = true;
        let mut view = SearchView::new();
        search(&mut view, &gateway, "Naruto");
        assert_eq!(view.mode(), ViewMode::Error);

        gateway.fail_search = false;
        view.query.text = "Naruto".into();
        let request = view.submit();
        assert_eq!(view.mode(), ViewMode::Loading);
        assert_eq!(view.error_message(), None);
        run(&mut view, &gateway, request);
        assert_eq!(view.mode(), ViewMode::Searching);
    }

    #[test]
    fn test_stale_outcome_discarded() {
        let gateway = FakeGateway::new(5, 20);
        let mut view = SearchView::new();

        view.query.text = "Slow".into();
        let slow = view.submit().unwrap();
        view.query.text = "Fast".into();
        let fast = view.submit().unwrap();
        assert!(fast.token > slow.token);

        let fast_outcome = fast.execute(&gateway);
        let slow_outcome = slow.execute(&gateway);

        assert!(matches!(view.apply(fast_outcome), Applied::Loaded { .. }));
        assert!(matches!(view.apply(slow_outcome), Applied::Stale { .. }));
        assert_eq!(view.items()[0].title, "Fast 0");
        assert_eq!(view.searched_query(), "Fast");
    }

    #[test]
    fn test_stale_outcome_before_latest_keeps_loading() {
        let gateway = FakeGateway::new(5, 20);
        let mut view = SearchView::new();

        view.query.text = "First".into();
        let first = view.submit().unwrap();
        view.query.text = "Second".into();
        let second = view.submit().unwrap();

        assert!(matches!(view.apply(first.execute(&gateway)), Applied::Stale { .. }));
        assert_eq!(view.mode(), ViewMode::Loading);
        assert!(view.visible_items().is_empty());

        view.apply(second.execute(&gateway));
        assert_eq!(view.items()[0].title, "Second 0");
    }

    #[test]
    fn test_back_to_trending() {
        let gateway = FakeGateway::new(5, 20);
        let mut view = SearchView::new();
        let request = view.initial_load();
        run(&mut view, &gateway, request);
        search(&mut view, &gateway, "Naruto");
        let request = view.change_page(3);
        run(&mut view, &gateway, request);
        assert!(view.can_go_back());

        let request = view.back_to_trending();
        assert!(view.query.text.is_empty());
        assert_eq!(view.query.page, 1);
        assert_eq!(view.current_page(), 3);
        view.apply(request.execute(&gateway));

        assert_eq!(gateway.calls().last().map(String::as_str), Some("top:1"));
        assert_eq!(view.mode(), ViewMode::Default);
        assert_eq!(view.showing(), Showing::Trending);
        assert_eq!(view.current_page(), 1);
        assert_eq!(view.searched_query(), "");
        assert!(!view.can_go_back());
        assert_eq!(view.items()[0].title, "Top 0");
    }

    #[test]
    fn test_failed_back_to_trending_keeps_search_results() {
        let mut gateway = FakeGateway::new(5, 20);
        let mut view = SearchView::new();
        search(&mut view, &gateway, "Naruto");
        let request = view.change_page(3);
        run(&mut view, &gateway, request);

        gateway.fail_top = true;
        let request = view.back_to_trending();
        let applied = view.apply(request.execute(&gateway));
        assert!(matches!(applied, Applied::Failed { failure: FetchFailure::Trending, .. }));

        assert_eq!(view.error_message(), Some(TRENDING_FAILED));
        assert_eq!(view.showing(), Showing::Search);
        assert_eq!(view.items()[0].title, "Naruto 0");
        assert_eq!(view.current_page(), 3);
        assert_eq!(view.meta().current_page, view.current_page());
        assert_eq!(view.searched_query(), "Naruto");
        assert!(view.can_go_back());
        assert!(view.show_pagination());

        let request = view.change_page(2);
        assert_eq!(
            request.map(|r| r.kind),
            Some(FetchKind::Search { query: "Naruto".into(), page: 2 })
        );
    }

    #[test]
    fn test_superseded_search_failing_trending_keeps_previous_page() {
        let mut gateway = FakeGateway::new(5, 20);
        let mut view = SearchView::new();
        let request = view.initial_load();
        run(&mut view, &gateway, request);
        let request = view.change_page(4);
        run(&mut view, &gateway, request);

        view.query.text = "Naruto".into();
        let pending = view.submit().unwrap();
        assert_eq!(view.query.page, 1);
        gateway.fail_top = true;
        let request = view.back_to_trending();
        view.apply(request.execute(&gateway));
        assert!(matches!(view.apply(pending.execute(&gateway)), Applied::Stale { .. }));

        assert_eq!(view.showing(), Showing::Trending);
        assert_eq!(view.current_page(), 4);
        assert_eq!(view.meta().current_page, 4);
        assert!(!view.can_go_back());
    }

    #[test]
    fn test_cannot_submit_while_loading() {
        let mut view = SearchView::new();
        view.query.text = "Naruto".into();
        assert!(view.can_submit());
        let _pending = view.submit();
        assert!(!view.can_submit());
    }

    #[test]
    fn test_items_and_meta_move_together() {
        let gateway = FakeGateway::new(5, 20);
        let mut view = SearchView::new();
        search(&mut view, &gateway, "Naruto");
        let request = view.change_page(4);
        run(&mut view, &gateway, request);

        assert_eq!(view.meta().current_page, 4);
        assert_eq!(view.meta().count as usize, view.items().len());
        assert!(view.items().iter().all(|i| i.id / 1000 == 4));
    }

    #[test]
    fn test_trailer_in_detail() {
        let mut view = SearchView::new();
        let mut item = CatalogItem::new(1, "With trailer");
        item.trailer = Some(Trailer { youtube_id: Some("abc123".into()), url: None });
        view.select(item);

        let selected = view.detail.selected().unwrap();
        assert_eq!(
            selected.trailer_watch_url().as_deref(),
            Some("https://www.youtube.com/watch?v=abc123")
        );

        view.select(CatalogItem::new(2, "Other"));
        assert_eq!(view.detail.selected().map(|i| i.id), Some(2));
        view.close_detail();
        assert!(view.detail.selected().is_none());
    }
}
