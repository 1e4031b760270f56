use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use eframe::egui::{self, Context, TextureHandle};
use uuid::Uuid;

use innovest_api::models::{ConnectionStatus, NewPost, ProfileSetup};
use innovest_api::{Client, User};

mod messages;
mod state;
mod tasks;
mod ui;

use messages::AppMessage;
use state::{
    AuthMode, AuthState, ChatState, ChatsState, FeedState, InvestmentState, LoadedImage,
    NewPostState, NotificationsState, OnboardingState, ProfileState, SearchState, ViewState,
};
use ui::navbar::NavTab;

const MAX_CONCURRENT_DOWNLOADS: usize = 4;

pub struct InnovestApp {
    api: Client,
    tx: Sender<AppMessage>,
    rx: Receiver<AppMessage>,
    view: ViewState,
    /// Navigation requested while the view was borrowed for rendering.
    pending_view: Option<ViewState>,
    current_user: Option<User>,
    session_checked: bool,
    info_banner: Option<String>,
    image_textures: HashMap<String, TextureHandle>,
    image_loading: HashSet<String>,
    image_pending: HashMap<String, LoadedImage>,
    image_errors: HashMap<String, String>,
    download_queue: VecDeque<String>,
    active_downloads: usize,
}

impl InnovestApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, api: Client) -> Self {
        let (tx, rx) = mpsc::channel();
        let app = Self {
            api,
            tx,
            rx,
            view: ViewState::Auth(AuthState::default()),
            pending_view: None,
            current_user: None,
            session_checked: false,
            info_banner: None,
            image_textures: HashMap::new(),
            image_loading: HashSet::new(),
            image_pending: HashMap::new(),
            image_errors: HashMap::new(),
            download_queue: VecDeque::new(),
            active_downloads: 0,
        };
        tasks::restore_session(app.api.clone(), app.tx.clone());
        app
    }

    fn user_id(&self) -> Option<Uuid> {
        self.current_user.as_ref().map(|user| user.id)
    }

    /// Defers the switch until after the current frame's view borrow ends.
    fn navigate(&mut self, view: ViewState) {
        self.pending_view = Some(view);
    }

    fn apply_pending_view(&mut self) {
        if let Some(view) = self.pending_view.take() {
            self.view = view;
        }
    }

    fn open_feed(&mut self) {
        self.navigate(ViewState::Feed(FeedState { loading: true, ..Default::default() }));
        tasks::load_feed(self.api.clone(), self.tx.clone());
    }

    fn open_search(&mut self) {
        // The search screen fetches immediately, like the feed it replaces.
        let state = SearchState { searching: true, ..Default::default() };
        tasks::search_posts(self.api.clone(), self.tx.clone(), String::new(), None);
        self.navigate(ViewState::Search(state));
    }

    fn open_profile(&mut self, profile_id: Uuid) {
        let is_own = self.user_id() == Some(profile_id);
        self.navigate(ViewState::Profile(ProfileState::for_user(profile_id, is_own)));
        tasks::load_profile(self.api.clone(), self.tx.clone(), profile_id);
    }

    fn open_own_profile(&mut self) {
        if let Some(id) = self.user_id() {
            self.open_profile(id);
        }
    }

    fn open_new_post(&mut self) {
        self.navigate(ViewState::NewPost(NewPostState::default()));
    }

    fn open_notifications(&mut self) {
        let state = NotificationsState { loading: true, ..Default::default() };
        self.navigate(ViewState::Notifications(state));
        tasks::load_notifications(self.api.clone(), self.tx.clone());
        tasks::subscribe_notifications(self.api.clone(), self.tx.clone());
    }

    fn open_chats(&mut self) {
        let state = ChatsState { loading: true, ..Default::default() };
        self.navigate(ViewState::Chats(state));
        tasks::load_chats(self.api.clone(), self.tx.clone());
    }

    fn open_chat(&mut self, chat_id: Uuid) {
        self.navigate(ViewState::Chat(ChatState::for_chat(chat_id)));
        tasks::load_chat(self.api.clone(), self.tx.clone(), chat_id);
        tasks::subscribe_chat(self.api.clone(), self.tx.clone(), chat_id);
    }

    fn open_investment(&mut self, investment_id: Uuid) {
        self.navigate(ViewState::Investment(InvestmentState::for_investment(investment_id)));
        tasks::load_investment(self.api.clone(), self.tx.clone(), investment_id);
    }

    /// Refetches whichever post list is on screen after a like toggle, so
    /// the server-maintained counters come back fresh.
    fn reload_posts_view(&mut self) {
        match &mut self.view {
            ViewState::Feed(state) => {
                state.loading = true;
                tasks::load_feed(self.api.clone(), self.tx.clone());
            }
            ViewState::Search(state) => {
                state.searching = true;
                tasks::search_posts(
                    self.api.clone(),
                    self.tx.clone(),
                    state.query.clone(),
                    state.category.clone(),
                );
            }
            ViewState::Profile(state) => {
                state.loading = true;
                tasks::load_profile(self.api.clone(), self.tx.clone(), state.profile_id);
            }
            _ => {}
        }
    }

    fn spawn_submit_auth(&mut self, state: &mut AuthState) {
        let email = state.email.trim().to_string();
        let password = state.password.clone();
        if email.is_empty() || password.is_empty() {
            state.error = Some("Email and password are required".to_string());
            return;
        }
        state.submitting = true;
        state.error = None;
        state.notice = None;
        match state.mode {
            AuthMode::SignIn => tasks::sign_in(self.api.clone(), self.tx.clone(), email, password),
            AuthMode::SignUp => tasks::sign_up(self.api.clone(), self.tx.clone(), email, password),
        }
    }

    fn spawn_save_onboarding(&mut self, state: &mut OnboardingState) {
        if state.interests.is_empty() {
            state.error = Some("Please select at least one interest".to_string());
            return;
        }
        state.submitting = true;
        state.error = None;
        let setup = ProfileSetup { role: state.role, interests: state.interests.clone() };
        tasks::save_onboarding(self.api.clone(), self.tx.clone(), setup);
    }

    fn spawn_search(&mut self, state: &mut SearchState) {
        state.searching = true;
        state.error = None;
        tasks::search_posts(
            self.api.clone(),
            self.tx.clone(),
            state.query.clone(),
            state.category.clone(),
        );
    }

    fn spawn_toggle_like(&mut self, post_id: Uuid, currently_liked: bool) {
        tasks::toggle_like(self.api.clone(), self.tx.clone(), post_id, currently_liked);
    }

    fn spawn_request_connection(&mut self, state: &mut ProfileState) {
        state.action_in_flight = true;
        tasks::request_connection(self.api.clone(), self.tx.clone(), state.profile_id);
    }

    fn spawn_respond_connection(&mut self, state: &mut ProfileState, status: ConnectionStatus) {
        let Some(connection) = state.connection.as_ref() else { return };
        state.action_in_flight = true;
        tasks::respond_connection(
            self.api.clone(),
            self.tx.clone(),
            state.profile_id,
            connection.id,
            status,
        );
    }

    fn spawn_remove_connection(&mut self, state: &mut ProfileState) {
        let Some(connection) = state.connection.as_ref() else { return };
        state.action_in_flight = true;
        tasks::remove_connection(
            self.api.clone(),
            self.tx.clone(),
            state.profile_id,
            connection.id,
        );
    }

    fn spawn_open_chat_with(&mut self, state: &mut ProfileState) {
        state.opening_chat = true;
        tasks::open_chat_with(self.api.clone(), self.tx.clone(), state.profile_id);
    }

    fn spawn_sign_out(&mut self, state: &mut ProfileState) {
        state.signing_out = true;
        tasks::sign_out(self.api.clone(), self.tx.clone());
    }

    fn spawn_send_message(&mut self, state: &mut ChatState) {
        let content = state.input.trim().to_string();
        if content.is_empty() || state.sending {
            return;
        }
        state.sending = true;
        state.send_error = None;
        tasks::send_message(self.api.clone(), self.tx.clone(), state.chat_id, content);
    }

    fn spawn_publish_post(&mut self, state: &mut NewPostState) {
        let title = state.title.trim().to_string();
        if title.is_empty() {
            state.error = Some("A title is required".to_string());
            return;
        }
        let Some(category) = state.category.clone() else {
            state.error = Some("Please pick a category".to_string());
            return;
        };
        let Some(user_id) = self.user_id() else { return };
        state.submitting = true;
        state.error = None;
        let draft = NewPost {
            user_id,
            post_type: state.post_type,
            title,
            description: state.description.trim().to_string(),
            category,
            visibility: state.visibility,
            tags: state.tags.clone(),
        };
        tasks::publish_post(self.api.clone(), self.tx.clone(), draft);
    }

    fn spawn_mark_notification_read(&mut self, state: &mut NotificationsState, id: Uuid) {
        if state.marking.contains(&id) {
            return;
        }
        state.marking.insert(id);
        tasks::mark_notification_read(self.api.clone(), self.tx.clone(), id);
    }

    fn spawn_load_image(&mut self, url: &str) {
        if self.image_loading.contains(url) {
            return;
        }
        self.image_loading.insert(url.to_string());
        self.download_queue.push_back(url.to_string());
        self.process_download_queue();
    }

    fn process_download_queue(&mut self) {
        while self.active_downloads < MAX_CONCURRENT_DOWNLOADS {
            if let Some(url) = self.download_queue.pop_front() {
                self.active_downloads += 1;
                tasks::download_image(self.tx.clone(), url);
            } else {
                break;
            }
        }
    }

    fn on_download_complete(&mut self) {
        if self.active_downloads > 0 {
            self.active_downloads -= 1;
        }
        self.process_download_queue();
    }

    /// Round avatar for a remote image, falling back to an initial badge
    /// when there is no URL or the download failed.
    fn avatar(&mut self, ui: &mut egui::Ui, url: Option<&str>, name: &str, size: f32) {
        let initial = name
            .chars()
            .next()
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_else(|| "?".to_string());
        let Some(url) = url.filter(|u| !u.is_empty()) else {
            initial_badge(ui, &initial, size);
            return;
        };
        if let Some(texture) = self.image_textures.get(url) {
            ui.add(
                egui::Image::from_texture(texture)
                    .fit_to_exact_size(egui::vec2(size, size))
                    .rounding(size / 2.0),
            );
        } else if let Some(pending) = self.image_pending.remove(url) {
            let color = egui::ColorImage::from_rgba_unmultiplied(pending.size, &pending.pixels);
            let texture = ui.ctx().load_texture(url, color, egui::TextureOptions::default());
            ui.add(
                egui::Image::from_texture(&texture)
                    .fit_to_exact_size(egui::vec2(size, size))
                    .rounding(size / 2.0),
            );
            self.image_textures.insert(url.to_string(), texture);
        } else if self.image_errors.contains_key(url) {
            initial_badge(ui, &initial, size);
        } else {
            self.spawn_load_image(url);
            ui.add(egui::Spinner::new().size(size * 0.6));
        }
    }

    /// Full-width post illustration, scaled down to the available width.
    fn post_image(&mut self, ui: &mut egui::Ui, url: &str) {
        if let Some(texture) = self.image_textures.get(url) {
            let size = texture.size_vec2();
            let max_width = ui.available_width();
            let scale = if size.x > max_width { max_width / size.x } else { 1.0 };
            ui.add(egui::Image::from_texture(texture).fit_to_exact_size(size * scale));
        } else if let Some(pending) = self.image_pending.remove(url) {
            let color = egui::ColorImage::from_rgba_unmultiplied(pending.size, &pending.pixels);
            let texture = ui.ctx().load_texture(url, color, egui::TextureOptions::default());
            let size = texture.size_vec2();
            let max_width = ui.available_width();
            let scale = if size.x > max_width { max_width / size.x } else { 1.0 };
            ui.add(egui::Image::from_texture(&texture).fit_to_exact_size(size * scale));
            self.image_textures.insert(url.to_string(), texture);
        } else if let Some(err) = self.image_errors.get(url) {
            ui.colored_label(egui::Color32::LIGHT_RED, format!("Image failed: {err}"));
        } else {
            self.spawn_load_image(url);
            ui.spinner();
        }
    }

    /// Drains pushed row-change events into whichever view holds a live
    /// subscription.
    fn poll_subscriptions(&mut self) {
        match &mut self.view {
            ViewState::Chat(state) => {
                let mut events = Vec::new();
                if let Some(subscription) = &state.subscription {
                    while let Some(event) = subscription.try_recv() {
                        events.push(event);
                    }
                }
                for event in events {
                    state.apply_change(&event);
                }
            }
            ViewState::Notifications(state) => {
                let mut events = Vec::new();
                if let Some(subscription) = &state.subscription {
                    while let Some(event) = subscription.try_recv() {
                        events.push(event);
                    }
                }
                for event in events {
                    state.apply_change(&event);
                }
            }
            _ => {}
        }
    }

    fn has_live_subscription(&self) -> bool {
        match &self.view {
            ViewState::Chat(state) => state.subscription.is_some(),
            ViewState::Notifications(state) => state.subscription.is_some(),
            _ => false,
        }
    }

    fn active_nav_tab(&self) -> Option<NavTab> {
        match &self.view {
            ViewState::Feed(_) => Some(NavTab::Home),
            ViewState::Profile(state) if state.is_own => Some(NavTab::Profile),
            ViewState::NewPost(_) => Some(NavTab::Post),
            ViewState::Notifications(_) => Some(NavTab::Notifications),
            ViewState::Chats(_) | ViewState::Chat(_) => Some(NavTab::Chats),
            _ => None,
        }
    }

    fn navigate_tab(&mut self, tab: NavTab) {
        match tab {
            NavTab::Home => self.open_feed(),
            NavTab::Profile => self.open_own_profile(),
            NavTab::Post => self.open_new_post(),
            NavTab::Notifications => self.open_notifications(),
            NavTab::Chats => self.open_chats(),
        }
    }
}

impl eframe::App for InnovestApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.process_messages();
        self.apply_pending_view();
        self.poll_subscriptions();

        if let Some(message) = self.info_banner.clone() {
            let mut dismiss = false;
            egui::TopBottomPanel::top("info_banner").show(ctx, |ui| {
                egui::Frame::group(ui.style())
                    .fill(ui.visuals().extreme_bg_color)
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.label(message.as_str());
                            if ui.button("Dismiss").clicked() {
                                dismiss = true;
                            }
                        });
                    });
            });
            if dismiss {
                self.info_banner = None;
            }
        }

        if !self.session_checked {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    ui.add(egui::Spinner::new().size(32.0));
                });
            });
            return;
        }

        let signed_in = self.current_user.is_some();
        if !signed_in && !matches!(self.view, ViewState::Auth(_)) {
            // Session gone while away from the sign-in form, e.g. expired.
            self.view = ViewState::Auth(AuthState::default());
        }
        let show_nav =
            signed_in && !matches!(self.view, ViewState::Auth(_) | ViewState::Onboarding(_));
        if show_nav {
            if let Some(tab) = ui::navbar::render(ctx, self.active_nav_tab()) {
                self.navigate_tab(tab);
            }
        }

        // The view moves out of self so render functions can borrow the app
        // and the view state independently.
        let mut view = std::mem::take(&mut self.view);
        egui::CentralPanel::default().show(ctx, |ui| match &mut view {
            ViewState::Auth(state) => ui::auth::render(self, ui, state),
            ViewState::Onboarding(state) => ui::onboarding::render(self, ui, state),
            ViewState::Feed(state) => ui::feed::render(self, ui, state),
            ViewState::Search(state) => ui::search::render(self, ui, state),
            ViewState::Profile(state) => ui::profile::render(self, ui, state),
            ViewState::NewPost(state) => ui::new_post::render(self, ui, state),
            ViewState::Notifications(state) => ui::notifications::render(self, ui, state),
            ViewState::Chats(state) => ui::chats::render(self, ui, state),
            ViewState::Chat(state) => ui::chat::render(self, ui, state),
            ViewState::Investment(state) => ui::investment::render(self, ui, state),
        });
        self.view = view;
        self.apply_pending_view();

        if self.has_live_subscription() || self.active_downloads > 0 {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}

fn initial_badge(ui: &mut egui::Ui, initial: &str, size: f32) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(size, size), egui::Sense::hover());
    ui.painter()
        .circle_filled(rect.center(), size / 2.0, ui.visuals().faint_bg_color);
    ui.painter().text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        initial,
        egui::FontId::proportional(size * 0.5),
        ui.visuals().strong_text_color(),
    );
}

/// "just now" through "3d ago", then a plain date.
fn format_relative_time(timestamp: Option<DateTime<Utc>>) -> String {
    let Some(timestamp) = timestamp else {
        return "some time ago".to_string();
    };
    let elapsed = Utc::now().signed_duration_since(timestamp);
    if elapsed.num_seconds() < 60 {
        "just now".to_string()
    } else if elapsed.num_minutes() < 60 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{}d ago", elapsed.num_days())
    } else {
        timestamp.with_timezone(&Local).format("%b %e, %Y").to_string()
    }
}

fn format_clock_time(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp
        .map(|ts| ts.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_default()
}

fn format_date(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp
        .map(|ts| ts.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Dollar amount with thousands separators, rounded to whole dollars.
fn format_usd(amount: f64) -> String {
    let negative = amount < 0.0;
    let digits = (amount.abs().round() as i64).to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn relative_times_step_through_units() {
        let now = Utc::now();
        assert_eq!(format_relative_time(Some(now)), "just now");
        assert_eq!(
            format_relative_time(Some(now - chrono::Duration::minutes(5))),
            "5m ago"
        );
        assert_eq!(
            format_relative_time(Some(now - chrono::Duration::hours(3))),
            "3h ago"
        );
        assert_eq!(
            format_relative_time(Some(now - chrono::Duration::days(2))),
            "2d ago"
        );
        assert_eq!(format_relative_time(None), "some time ago");
    }

    #[test]
    fn usd_amounts_group_thousands() {
        assert_eq!(format_usd(0.0), "$0");
        assert_eq!(format_usd(950.0), "$950");
        assert_eq!(format_usd(1000.0), "$1,000");
        assert_eq!(format_usd(1234567.89), "$1,234,568");
        assert_eq!(format_usd(-2500.0), "-$2,500");
    }
}
