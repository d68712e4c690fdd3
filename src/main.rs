//! Anime Nexus - Rust Edition
//! A desktop anime catalog browser backed by the Jikan API

// Hide console window on Windows release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use eframe::egui;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

mod api;
mod config;
mod error;
mod logging;
mod models;
mod state;

#[cfg(test)]
mod state_tests;

use api::{CatalogGateway, JikanClient};
use config::AppConfig;
use error::CatalogError;
use logging::{ConsoleLog, LogLevel};
use models::*;
use state::*;

const JIKAN_URL: &str = "https://jikan.moe/";
const MYANIMELIST_URL: &str = "https://myanimelist.net/";

const ACCENT: egui::Color32 = egui::Color32::from_rgb(239, 68, 68);
const ACCENT_SOFT: egui::Color32 = egui::Color32::from_rgb(248, 113, 113);
const SCORE_COLOR: egui::Color32 = egui::Color32::from_rgb(250, 204, 21);

const SEARCH_FIELD_ID: &str = "search_field";

const CARD_WIDTH: f32 = 180.0;
const POSTER_SIZE: egui::Vec2 = egui::vec2(CARD_WIDTH, 250.0);
const DETAIL_POSTER_SIZE: egui::Vec2 = egui::vec2(240.0, 340.0);

/// Application icon: red-to-pink rounded square with a white play mark
fn load_icon() -> egui::IconData {
    let size: usize = 64;
    let mut rgba = vec![0u8; size * size * 4];

    for y in 0..size {
        for x in 0..size {
            let idx = (y * size + x) * 4;
            let nx = x as f32 / size as f32;
            let ny = y as f32 / size as f32;

            let corner_radius = 0.2;
            let dx = (corner_radius - nx).max(nx - (1.0 - corner_radius)).max(0.0);
            let dy = (corner_radius - ny).max(ny - (1.0 - corner_radius)).max(0.0);
            if dx * dx + dy * dy > corner_radius * corner_radius {
                continue;
            }

            // #ef4444 -> #ec4899
            let t = nx * 0.5 + ny * 0.5;
            let mut pixel = [
                (239.0 + (236.0 - 239.0) * t) as u8,
                (68.0 + (72.0 - 68.0) * t) as u8,
                (68.0 + (153.0 - 68.0) * t) as u8,
                255,
            ];

            let px = nx - 0.38;
            let py = ny - 0.5;
            if (0.0..=0.32).contains(&px) && py.abs() <= (0.32 - px) * 0.7 {
                pixel = [255, 255, 255, 255];
            }

            rgba[idx..idx + 4].copy_from_slice(&pixel);
        }
    }

    egui::IconData {
        rgba,
        width: size as u32,
        height: size as u32,
    }
}

fn main() -> Result<(), eframe::Error> {
    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    logging::init_tracing(&config.log_level);
    if let Some(e) = &config_error {
        tracing::warn!(error = %e, path = %AppConfig::config_path().display(), "using default configuration");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([720.0, 520.0])
            .with_icon(load_icon()),
        vsync: true,
        ..Default::default()
    };

    eframe::run_native(
        "Anime Nexus",
        options,
        Box::new(move |cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            cc.egui_ctx.set_visuals(if config.dark_mode {
                egui::Visuals::dark()
            } else {
                egui::Visuals::light()
            });

            let gateway: Arc<dyn CatalogGateway> = Arc::new(JikanClient::from_config(&config));
            Ok(Box::new(AnimeApp::new(config, gateway, config_error)))
        }),
    )
}

struct AnimeApp {
    gateway: Arc<dyn CatalogGateway>,
    view: SearchView,

    current_tab: Tab,
    dark_mode: bool,
    status_message: String,
    console: ConsoleLog,
    /// Search field had keyboard focus at the end of the last frame
    search_focused: bool,

    // Background fetch results
    task_receiver: Receiver<FetchOutcome>,
    task_sender: Sender<FetchOutcome>,
}

impl AnimeApp {
    fn new(config: AppConfig, gateway: Arc<dyn CatalogGateway>, config_error: Option<CatalogError>) -> Self {
        let (task_sender, task_receiver) = channel();

        let mut console = ConsoleLog::new();
        console.info("Anime Nexus started");
        console.info(&format!("Catalog API: {}", config.api_base_url));
        if let Some(e) = config_error {
            console.warn(&format!("Config ignored, using defaults: {}", e));
        }

        Self {
            dark_mode: config.dark_mode,
            gateway,
            view: SearchView::new(),
            current_tab: Tab::Browse,
            status_message: "Ready".to_string(),
            console,
            search_focused: false,
            task_receiver,
            task_sender,
        }
    }

    /// Run a request on a worker thread; the outcome comes back through the channel
    fn dispatch(&mut self, request: Option<FetchRequest>) {
        let Some(request) = request else {
            return;
        };

        self.console.info(&format!("Fetching {} (#{})", request.kind, request.token));
        self.status_message = "Scanning the anime database...".to_string();

        let gateway = Arc::clone(&self.gateway);
        let sender = self.task_sender.clone();
        thread::spawn(move || {
            let outcome = request.execute(gateway.as_ref());
            let _ = sender.send(outcome);
        });
    }

    fn handle_outcome(&mut self, outcome: FetchOutcome) {
        let kind = outcome.kind.clone();
        match self.view.apply(outcome) {
            Applied::Loaded { count } => {
                self.console.info(&format!(
                    "Loaded {} anime for {} ({} total, {} pages)",
                    count,
                    kind,
                    self.view.total_results(),
                    self.view.total_pages()
                ));
                self.status_message = format!("Loaded {} anime", count);
            }
            Applied::Failed { failure, error } => {
                if error.is_local() {
                    self.console.warn(&format!("{} rejected: {}", kind, error));
                } else {
                    self.console.error(&format!("{} failed: {}", kind, error));
                }
                self.status_message = failure.message().to_string();
            }
            Applied::Stale { token } => {
                tracing::debug!(token, %kind, "discarding superseded response");
            }
        }
    }

    fn open_link(&mut self, url: &str) {
        match open::that(url) {
            Ok(()) => self.console.info(&format!("Opened {}", url)),
            Err(e) => self.console.error(&format!("Failed to open {}: {}", url, e)),
        }
    }
}

impl eframe::App for AnimeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.render(ctx);
    }
}

impl AnimeApp {
    fn render(&mut self, ctx: &egui::Context) {
        // Process background task results (non-blocking)
        while let Ok(outcome) = self.task_receiver.try_recv() {
            self.handle_outcome(outcome);
        }

        let initial = self.view.initial_load();
        self.dispatch(initial);

        if self.view.is_loading() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        // egui drops focus on Escape before the frame starts, so this has to
        // come from the previous frame. Escape in the search field stays there.
        let search_was_focused = std::mem::take(&mut self.search_focused);
        let escape_closes_detail = ctx.input(|i| i.key_pressed(egui::Key::Escape)) && !search_was_focused;

        if self.dark_mode {
            ctx.set_visuals(egui::Visuals::dark());
        } else {
            ctx.set_visuals(egui::Visuals::light());
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(5.0);
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.current_tab, Tab::Browse, "🔎 Browse");
                let console_label = format!("🖥 Console ({})", self.console.len());
                ui.selectable_value(&mut self.current_tab, Tab::Console, console_label);

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let icon = if self.dark_mode { "☀" } else { "🌙" };
                    if ui.button(icon).on_hover_text("Toggle light/dark theme").clicked() {
                        self.dark_mode = !self.dark_mode;
                    }
                });
            });
            ui.add_space(5.0);
        });

        let mut footer_link: Option<&str> = None;
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status_message);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.link("MyAnimeList").clicked() {
                        footer_link = Some(MYANIMELIST_URL);
                    }
                    ui.label("•");
                    if ui.link("Jikan API").clicked() {
                        footer_link = Some(JIKAN_URL);
                    }
                    ui.label("Powered by");
                });
            });
        });
        if let Some(url) = footer_link {
            self.open_link(url);
        }

        egui::CentralPanel::default().show(ctx, |ui| match self.current_tab {
            Tab::Browse => self.show_browse_tab(ui),
            Tab::Console => self.show_console_tab(ui),
        });

        self.show_detail_window(ctx, escape_closes_detail);
    }
}

impl AnimeApp {
    fn show_browse_tab(&mut self, ui: &mut egui::Ui) {
        let mut area = egui::ScrollArea::vertical()
            .id_salt("browse_scroll")
            .auto_shrink([false, false]);
        if self.view.take_scroll_to_top() {
            area = area.vertical_scroll_offset(0.0);
        }

        area.show(ui, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.label(egui::RichText::new("ANIME NEXUS").size(48.0).strong().color(ACCENT));
                ui.label(
                    egui::RichText::new("Discover legendary anime in the digital realm")
                        .size(16.0)
                        .color(egui::Color32::GRAY),
                );
                ui.add_space(20.0);
                self.show_search_bar(ui);
                ui.add_space(12.0);

                if self.view.can_go_back() && ui.button("← Back to Trending").clicked() {
                    let request = self.view.back_to_trending();
                    self.dispatch(Some(request));
                }

                self.show_results_info(ui);

                if let Some(message) = self.view.error_message() {
                    ui.add_space(8.0);
                    egui::Frame::new()
                        .fill(egui::Color32::from_rgba_unmultiplied(127, 29, 29, 60))
                        .stroke(egui::Stroke::new(1.0, ACCENT))
                        .corner_radius(egui::CornerRadius::same(6))
                        .inner_margin(egui::Margin::symmetric(16, 10))
                        .show(ui, |ui| {
                            ui.label(egui::RichText::new(message).color(ACCENT_SOFT));
                        });
                    ui.add_space(8.0);
                }

                match self.view.mode() {
                    ViewMode::Loading => {
                        ui.add_space(48.0);
                        ui.add(egui::Spinner::new().size(40.0).color(ACCENT));
                        ui.add_space(12.0);
                        ui.label(
                            egui::RichText::new("Scanning the anime database...")
                                .size(16.0)
                                .color(egui::Color32::GRAY),
                        );
                    }
                    ViewMode::NoResults => {
                        ui.add_space(48.0);
                        ui.label(
                            egui::RichText::new(format!(
                                "No anime found in the nexus for \"{}\"",
                                self.view.searched_query()
                            ))
                            .size(18.0)
                            .color(egui::Color32::GRAY),
                        );
                        ui.label(
                            egui::RichText::new("Try expanding your search parameters")
                                .color(egui::Color32::DARK_GRAY),
                        );
                    }
                    ViewMode::Default | ViewMode::Searching | ViewMode::Error => {}
                }
            });

            ui.add_space(16.0);
            self.show_results_grid(ui);
            self.show_pagination(ui);
            ui.add_space(24.0);
        });
    }

    fn show_search_bar(&mut self, ui: &mut egui::Ui) {
        let mut submit = false;

        ui.horizontal(|ui| {
            let field_width = (ui.available_width() * 0.5).clamp(240.0, 560.0);
            ui.add_space((ui.available_width() - field_width - 120.0).max(0.0) / 2.0);

            let response = ui.add(
                egui::TextEdit::singleline(&mut self.view.query.text)
                    .id(egui::Id::new(SEARCH_FIELD_ID))
                    .hint_text("Search the anime multiverse...")
                    .font(egui::TextStyle::Heading)
                    .desired_width(field_width),
            );
            self.search_focused = response.has_focus();
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                submit = true;
            }

            let label = if self.view.is_loading() { "SCANNING..." } else { "SEARCH" };
            let button = egui::Button::new(egui::RichText::new(label).strong().color(egui::Color32::WHITE))
                .fill(ACCENT)
                .min_size(egui::vec2(110.0, 32.0));
            if ui.add_enabled(self.view.can_submit(), button).clicked() {
                submit = true;
            }
        });

        if submit {
            let request = self.view.submit();
            self.dispatch(request);
        }
    }

    fn show_results_info(&self, ui: &mut egui::Ui) {
        if self.view.visible_items().is_empty() {
            return;
        }

        ui.add_space(8.0);
        match self.view.showing() {
            Showing::Trending => {
                ui.label(egui::RichText::new("🔥 TRENDING ANIME").size(22.0).strong().color(ACCENT_SOFT));
                ui.label(format!(
                    "Discover the most popular anime • {} total",
                    self.view.total_results()
                ));
            }
            Showing::Search => {
                ui.label(format!(
                    "Found {} anime • Page {} of {}",
                    self.view.total_results(),
                    self.view.current_page(),
                    self.view.total_pages()
                ));
            }
        }
    }

    fn show_results_grid(&mut self, ui: &mut egui::Ui) {
        let mut clicked: Option<CatalogItem> = None;

        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing = egui::vec2(16.0, 16.0);
            for item in self.view.visible_items() {
                if show_card(ui, item).clicked() {
                    clicked = Some(item.clone());
                }
            }
        });

        if let Some(item) = clicked {
            self.console.info(&format!("Opened details for {} (#{})", item.title, item.id));
            self.view.select(item);
        }
    }

    fn show_pagination(&mut self, ui: &mut egui::Ui) {
        if !self.view.show_pagination() {
            return;
        }

        let current = self.view.current_page();
        let mut target: Option<u32> = None;

        ui.add_space(16.0);
        ui.vertical_centered(|ui| {
            ui.horizontal(|ui| {
                let buttons = self.view.page_buttons();
                let row_width = 90.0 * 2.0 + 40.0 * buttons.len() as f32;
                ui.add_space((ui.available_width() - row_width).max(0.0) / 2.0);

                if ui.add_enabled(self.view.has_prev_page(), egui::Button::new("⏴ PREV")).clicked() {
                    target = Some(current - 1);
                }
                for page in buttons {
                    let button = egui::Button::new(page.to_string())
                        .selected(page == current)
                        .min_size(egui::vec2(32.0, 0.0));
                    if ui.add(button).clicked() {
                        target = Some(page);
                    }
                }
                if ui.add_enabled(self.view.has_next_page(), egui::Button::new("NEXT ⏵")).clicked() {
                    target = Some(current + 1);
                }
            });
        });

        if let Some(page) = target {
            let request = self.view.change_page(page);
            self.dispatch(request);
        }
    }

    fn show_detail_window(&mut self, ctx: &egui::Context, escape_pressed: bool) {
        let Some(item) = self.view.detail.selected().cloned() else {
            return;
        };

        let mut open = !escape_pressed;
        let mut trailer_link: Option<String> = None;

        egui::Window::new(egui::RichText::new(&item.title).size(22.0).strong().color(ACCENT_SOFT))
            .id(egui::Id::new("detail_window"))
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .default_width(780.0)
            .vscroll(true)
            .show(ctx, |ui| {
                if let Some(english) = item.english_subtitle() {
                    ui.label(egui::RichText::new(english).size(16.0).color(egui::Color32::GRAY));
                }
                ui.separator();

                ui.horizontal_top(|ui| {
                    poster(ui, item.image_url.as_deref(), DETAIL_POSTER_SIZE);
                    ui.add_space(12.0);

                    ui.vertical(|ui| {
                        ui.horizontal(|ui| {
                            stat_box(ui, "★ Score", &item.score_label(), SCORE_COLOR);
                            stat_box(ui, "📺 Episodes", &item.episodes_label(), ACCENT_SOFT);
                        });
                        ui.add_space(8.0);

                        let sections = DetailOverlay::sections(&item);
                        for section in &sections {
                            if !matches!(section, DetailSection::Synopsis(_)) {
                                detail_section(ui, section);
                            }
                        }

                        if let Some(url) = item.trailer_watch_url() {
                            ui.add_space(8.0);
                            let button = egui::Button::new(
                                egui::RichText::new("▶ WATCH TRAILER ↗").strong().color(egui::Color32::WHITE),
                            )
                            .fill(ACCENT)
                            .min_size(egui::vec2(ui.available_width(), 34.0));
                            if ui.add(button).on_hover_text(url.as_str()).clicked() {
                                trailer_link = Some(url);
                            }
                        }

                        for section in &sections {
                            if matches!(section, DetailSection::Synopsis(_)) {
                                detail_section(ui, section);
                            }
                        }
                    });
                });
            });

        if let Some(url) = trailer_link {
            self.open_link(&url);
        }
        if !open {
            self.view.close_detail();
        }
    }

    fn show_console_tab(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Console Log");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("🗑 Clear").clicked() {
                    self.console.clear();
                    self.console.info("Console cleared");
                }
            });
        });
        ui.separator();

        egui::ScrollArea::vertical()
            .id_salt("console_scroll")
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                if self.console.is_empty() {
                    ui.label(egui::RichText::new("No log entries").italics().color(egui::Color32::GRAY));
                }
                for line in self.console.lines() {
                    let color = match line.level {
                        LogLevel::Error => egui::Color32::RED,
                        LogLevel::Warn => egui::Color32::YELLOW,
                        LogLevel::Info => egui::Color32::LIGHT_BLUE,
                    };
                    ui.label(egui::RichText::new(&line.text).monospace().color(color));
                }
            });
    }
}

/// Result card. The whole frame is the click target.
fn show_card(ui: &mut egui::Ui, item: &CatalogItem) -> egui::Response {
    let response = egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::same(6))
        .show(ui, |ui| {
            ui.set_width(CARD_WIDTH);
            ui.vertical(|ui| {
                poster(ui, item.image_url.as_deref(), POSTER_SIZE);
                ui.add_space(6.0);
                ui.add(
                    egui::Label::new(egui::RichText::new(&item.title).strong())
                        .wrap()
                        .selectable(false),
                );
                ui.horizontal(|ui| {
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new(format!("★ {}", item.score_label())).color(SCORE_COLOR),
                        )
                        .selectable(false),
                    );
                    if item.has_trailer() {
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.add(
                                egui::Label::new(egui::RichText::new("▶ TRAILER").small().color(ACCENT_SOFT))
                                    .selectable(false),
                            );
                        });
                    }
                });
            });
        })
        .response;

    response
        .interact(egui::Sense::click())
        .on_hover_cursor(egui::CursorIcon::PointingHand)
}

fn poster(ui: &mut egui::Ui, url: Option<&str>, size: egui::Vec2) {
    match url {
        Some(url) => {
            ui.add(
                egui::Image::from_uri(url.to_string())
                    .fit_to_exact_size(size)
                    .show_loading_spinner(true),
            );
        }
        None => {
            let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
            ui.painter().rect_filled(rect, egui::CornerRadius::same(4), egui::Color32::from_gray(40));
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "No image",
                egui::FontId::proportional(14.0),
                egui::Color32::GRAY,
            );
        }
    }
}

fn stat_box(ui: &mut egui::Ui, label: &str, value: &str, color: egui::Color32) {
    egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::same(10))
        .show(ui, |ui| {
            ui.set_min_width(140.0);
            ui.vertical(|ui| {
                ui.label(egui::RichText::new(label).color(egui::Color32::GRAY));
                ui.label(egui::RichText::new(value).size(24.0).strong().color(color));
            });
        });
}

fn badge(ui: &mut egui::Ui, text: &str, color: egui::Color32) {
    egui::Frame::new()
        .stroke(egui::Stroke::new(1.0, color))
        .corner_radius(egui::CornerRadius::same(8))
        .inner_margin(egui::Margin::symmetric(6, 2))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(text).small().color(color));
        });
}

fn section_heading(ui: &mut egui::Ui, title: &str) {
    ui.add_space(6.0);
    ui.label(egui::RichText::new(title).strong().color(ACCENT_SOFT));
}

fn detail_section(ui: &mut egui::Ui, section: &DetailSection<'_>) {
    match section {
        DetailSection::Status(status) => {
            section_heading(ui, "Status");
            badge(ui, status, ACCENT_SOFT);
        }
        DetailSection::Aired(aired) => {
            section_heading(ui, "📅 Aired");
            ui.label(*aired);
        }
        DetailSection::Studios(studios) => {
            section_heading(ui, "👥 Studios");
            ui.horizontal_wrapped(|ui| {
                for studio in studios.iter() {
                    badge(ui, studio, egui::Color32::GRAY);
                }
            });
        }
        DetailSection::Genres(genres) => {
            section_heading(ui, "🏷 Genres");
            ui.horizontal_wrapped(|ui| {
                for genre in genres.iter() {
                    badge(ui, genre, ACCENT_SOFT);
                }
            });
        }
        DetailSection::Year(year) => {
            section_heading(ui, "Year");
            ui.label(year.to_string());
        }
        DetailSection::Rating(rating) => {
            section_heading(ui, "Rating");
            ui.label(*rating);
        }
        DetailSection::Duration(duration) => {
            section_heading(ui, "Duration");
            ui.label(*duration);
        }
        DetailSection::Synopsis(synopsis) => {
            section_heading(ui, "Synopsis");
            egui::Frame::group(ui.style())
                .inner_margin(egui::Margin::same(10))
                .show(ui, |ui| {
                    ui.add(egui::Label::new(*synopsis).wrap());
                });
        }
    }
}
