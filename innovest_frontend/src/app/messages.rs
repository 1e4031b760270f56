use std::collections::HashSet;

use uuid::Uuid;

use innovest_api::models::{
    Chat, Connection, Investment, InvestmentUpdate, Message, Notification, Post, Profile,
};
use innovest_api::{ApiError, Session, Subscription, User};

use super::state::{
    filter_by_interests, sort_posts, top_reacted, AuthMode, AuthState, LoadedImage,
    OnboardingState, ViewState,
};
use super::InnovestApp;

const TOP_POSTS: usize = 5;

/// Results posted back by worker threads, drained once per frame.
pub enum AppMessage {
    SessionRestored(Result<Option<User>, anyhow::Error>),
    SignedIn(Result<Session, anyhow::Error>),
    SignedUp(Result<Session, anyhow::Error>),
    SignedOut(Result<(), anyhow::Error>),
    OnboardingSaved(Result<(), anyhow::Error>),
    FeedLoaded(Result<FeedData, anyhow::Error>),
    SearchFinished {
        query: String,
        result: Result<Vec<Post>, anyhow::Error>,
    },
    ProfileLoaded {
        profile_id: Uuid,
        result: Result<ProfileData, anyhow::Error>,
    },
    ConnectionChanged {
        profile_id: Uuid,
        result: Result<Option<Connection>, anyhow::Error>,
    },
    ChatOpened(Result<Chat, anyhow::Error>),
    ChatLoaded {
        chat_id: Uuid,
        result: Result<ChatData, anyhow::Error>,
    },
    ChatSubscribed {
        chat_id: Uuid,
        result: Result<Subscription, anyhow::Error>,
    },
    MessageSent {
        chat_id: Uuid,
        result: Result<Message, anyhow::Error>,
    },
    ChatsLoaded(Result<Vec<Chat>, anyhow::Error>),
    PostPublished(Result<(), anyhow::Error>),
    LikeToggled {
        post_id: Uuid,
        now_liked: bool,
        result: Result<(), anyhow::Error>,
    },
    NotificationsLoaded(Result<Vec<Notification>, anyhow::Error>),
    NotificationsSubscribed(Result<Subscription, anyhow::Error>),
    NotificationMarkedRead {
        id: Uuid,
        result: Result<(), anyhow::Error>,
    },
    InvestmentLoaded {
        investment_id: Uuid,
        result: Result<InvestmentData, anyhow::Error>,
    },
    ImageLoaded {
        url: String,
        result: Result<LoadedImage, String>,
    },
}

pub struct FeedData {
    pub posts: Vec<Post>,
    pub interests: Vec<String>,
}

pub struct ProfileData {
    pub profile: Profile,
    pub posts: Vec<Post>,
    pub connection: Option<Connection>,
    pub investments: Vec<Investment>,
}

pub struct ChatData {
    pub chat: Chat,
    pub messages: Vec<Message>,
}

pub struct InvestmentData {
    pub investment: Investment,
    pub updates: Vec<InvestmentUpdate>,
}

impl InnovestApp {
    /// Applies every queued worker result to the current view. Results that
    /// arrive after the user navigated elsewhere are dropped by matching on
    /// the view and its identifying id.
    pub(super) fn process_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            match message {
                AppMessage::SessionRestored(result) => {
                    self.session_checked = true;
                    match result {
                        Ok(Some(user)) => {
                            self.current_user = Some(user);
                            self.open_feed();
                        }
                        Ok(None) => {}
                        Err(err) => {
                            self.info_banner =
                                Some(format!("Could not restore the saved session: {err}"));
                        }
                    }
                }
                AppMessage::SignedIn(result) => {
                    let mut signed_in = false;
                    if let ViewState::Auth(state) = &mut self.view {
                        state.submitting = false;
                        match result {
                            Ok(session) => {
                                self.current_user = Some(session.user);
                                signed_in = true;
                            }
                            Err(err) => state.error = Some(err.to_string()),
                        }
                    }
                    if signed_in {
                        self.navigate(ViewState::Onboarding(OnboardingState::default()));
                    }
                }
                AppMessage::SignedUp(result) => {
                    let mut signed_up = false;
                    if let ViewState::Auth(state) = &mut self.view {
                        state.submitting = false;
                        match result {
                            Ok(session) => {
                                self.current_user = Some(session.user);
                                signed_up = true;
                            }
                            Err(err) => {
                                if matches!(
                                    err.downcast_ref::<ApiError>(),
                                    Some(ApiError::ConfirmationRequired)
                                ) {
                                    state.mode = AuthMode::SignIn;
                                    state.password.clear();
                                    state.notice = Some(err.to_string());
                                } else {
                                    state.error = Some(err.to_string());
                                }
                            }
                        }
                    }
                    if signed_up {
                        self.navigate(ViewState::Onboarding(OnboardingState::default()));
                    }
                }
                AppMessage::SignedOut(result) => match result {
                    Ok(()) => {
                        self.current_user = None;
                        self.navigate(ViewState::Auth(AuthState::default()));
                    }
                    Err(err) => {
                        if let ViewState::Profile(state) = &mut self.view {
                            state.signing_out = false;
                        }
                        self.info_banner = Some(format!("Sign out failed: {err}"));
                    }
                },
                AppMessage::OnboardingSaved(result) => {
                    let mut saved = false;
                    if let ViewState::Onboarding(state) = &mut self.view {
                        state.submitting = false;
                        match result {
                            Ok(()) => saved = true,
                            Err(err) => state.error = Some(err.to_string()),
                        }
                    }
                    if saved {
                        self.info_banner = Some("Welcome to Innovest".to_string());
                        self.open_feed();
                    }
                }
                AppMessage::FeedLoaded(result) => {
                    if let ViewState::Feed(state) = &mut self.view {
                        state.loading = false;
                        match result {
                            Ok(data) => {
                                state.top_posts = top_reacted(&data.posts, TOP_POSTS);
                                state.posts = filter_by_interests(&data.posts, &data.interests);
                                state.error = None;
                            }
                            Err(err) => state.error = Some(err.to_string()),
                        }
                    }
                }
                AppMessage::SearchFinished { query, result } => {
                    if let ViewState::Search(state) = &mut self.view {
                        if state.query == query {
                            state.searching = false;
                            state.searched = true;
                            match result {
                                Ok(mut posts) => {
                                    sort_posts(&mut posts, state.sort);
                                    state.posts = posts;
                                    state.error = None;
                                }
                                Err(err) => state.error = Some(err.to_string()),
                            }
                        }
                    }
                }
                AppMessage::ProfileLoaded { profile_id, result } => {
                    if let ViewState::Profile(state) = &mut self.view {
                        if state.profile_id == profile_id {
                            state.loading = false;
                            match result {
                                Ok(data) => {
                                    state.profile = Some(data.profile);
                                    state.posts = data.posts;
                                    state.connection = data.connection;
                                    state.investments = data.investments;
                                    state.error = None;
                                }
                                Err(err) => state.error = Some(err.to_string()),
                            }
                        }
                    }
                }
                AppMessage::ConnectionChanged { profile_id, result } => {
                    if let ViewState::Profile(state) = &mut self.view {
                        if state.profile_id == profile_id {
                            state.action_in_flight = false;
                            match result {
                                Ok(connection) => state.connection = connection,
                                Err(err) => {
                                    self.info_banner =
                                        Some(format!("Connection update failed: {err}"));
                                }
                            }
                        }
                    }
                }
                AppMessage::ChatOpened(result) => {
                    if let ViewState::Profile(state) = &mut self.view {
                        state.opening_chat = false;
                    }
                    match result {
                        Ok(chat) => self.open_chat(chat.id),
                        Err(err) => {
                            self.info_banner = Some(format!("Could not open chat: {err}"));
                        }
                    }
                }
                AppMessage::ChatLoaded { chat_id, result } => {
                    let viewer = self.user_id();
                    let mut missing = false;
                    if let ViewState::Chat(state) = &mut self.view {
                        if state.chat_id == chat_id {
                            state.loading = false;
                            match result {
                                Ok(data) => {
                                    state.other_user = viewer
                                        .and_then(|viewer| data.chat.other_user(viewer))
                                        .cloned();
                                    state.chat = Some(data.chat);
                                    state.messages = data.messages;
                                    state.error = None;
                                }
                                Err(err) => {
                                    if matches!(
                                        err.downcast_ref::<ApiError>(),
                                        Some(ApiError::RowNotFound)
                                    ) {
                                        missing = true;
                                    } else {
                                        state.error = Some(err.to_string());
                                    }
                                }
                            }
                        }
                    }
                    if missing {
                        self.info_banner = Some("Chat not found".to_string());
                        self.open_chats();
                    }
                }
                AppMessage::ChatSubscribed { chat_id, result } => {
                    if let ViewState::Chat(state) = &mut self.view {
                        if state.chat_id == chat_id {
                            match result {
                                Ok(subscription) => state.subscription = Some(subscription),
                                Err(err) => {
                                    self.info_banner = Some(format!(
                                        "Live updates unavailable for this chat: {err}"
                                    ));
                                }
                            }
                        }
                    }
                }
                AppMessage::MessageSent { chat_id, result } => {
                    if let ViewState::Chat(state) = &mut self.view {
                        if state.chat_id == chat_id {
                            state.sending = false;
                            match result {
                                Ok(message) => state.apply_sent(message),
                                Err(err) => state.send_error = Some(err.to_string()),
                            }
                        }
                    }
                }
                AppMessage::ChatsLoaded(result) => {
                    if let ViewState::Chats(state) = &mut self.view {
                        state.loading = false;
                        match result {
                            Ok(chats) => {
                                state.chats = chats;
                                state.error = None;
                            }
                            Err(err) => state.error = Some(err.to_string()),
                        }
                    }
                }
                AppMessage::PostPublished(result) => {
                    let mut published = false;
                    if let ViewState::NewPost(state) = &mut self.view {
                        state.submitting = false;
                        match result {
                            Ok(()) => published = true,
                            Err(err) => state.error = Some(err.to_string()),
                        }
                    }
                    if published {
                        self.info_banner = Some("Post created".to_string());
                        self.open_feed();
                    }
                }
                AppMessage::LikeToggled { post_id, now_liked, result } => {
                    let succeeded = result.is_ok();
                    if let Err(err) = result {
                        self.info_banner = Some(format!("Failed to update like: {err}"));
                    }
                    match &mut self.view {
                        ViewState::Feed(state) => finish_like(
                            &mut state.liked,
                            &mut state.like_in_flight,
                            post_id,
                            now_liked,
                            succeeded,
                        ),
                        ViewState::Search(state) => finish_like(
                            &mut state.liked,
                            &mut state.like_in_flight,
                            post_id,
                            now_liked,
                            succeeded,
                        ),
                        ViewState::Profile(state) => finish_like(
                            &mut state.liked,
                            &mut state.like_in_flight,
                            post_id,
                            now_liked,
                            succeeded,
                        ),
                        _ => {}
                    }
                    if succeeded {
                        self.reload_posts_view();
                    }
                }
                AppMessage::NotificationsLoaded(result) => {
                    if let ViewState::Notifications(state) = &mut self.view {
                        state.loading = false;
                        match result {
                            Ok(notifications) => {
                                state.notifications = notifications;
                                state.error = None;
                            }
                            Err(err) => state.error = Some(err.to_string()),
                        }
                    }
                }
                AppMessage::NotificationsSubscribed(result) => {
                    if let ViewState::Notifications(state) = &mut self.view {
                        match result {
                            Ok(subscription) => state.subscription = Some(subscription),
                            Err(err) => {
                                self.info_banner =
                                    Some(format!("Live notifications unavailable: {err}"));
                            }
                        }
                    }
                }
                AppMessage::NotificationMarkedRead { id, result } => {
                    if let ViewState::Notifications(state) = &mut self.view {
                        state.marking.remove(&id);
                        match result {
                            Ok(()) => state.mark_read_local(id),
                            Err(err) => {
                                self.info_banner =
                                    Some(format!("Failed to mark notification read: {err}"));
                            }
                        }
                    }
                }
                AppMessage::InvestmentLoaded { investment_id, result } => {
                    if let ViewState::Investment(state) = &mut self.view {
                        if state.investment_id == investment_id {
                            state.loading = false;
                            match result {
                                Ok(data) => {
                                    state.investment = Some(data.investment);
                                    state.updates = data.updates;
                                    state.error = None;
                                }
                                Err(err) => state.error = Some(err.to_string()),
                            }
                        }
                    }
                }
                AppMessage::ImageLoaded { url, result } => {
                    self.image_loading.remove(&url);
                    match result {
                        Ok(image) => {
                            self.image_pending.insert(url, image);
                        }
                        Err(err) => {
                            self.image_errors.insert(url, err);
                        }
                    }
                    self.on_download_complete();
                }
            }
        }
    }
}

fn finish_like(
    liked: &mut HashSet<Uuid>,
    in_flight: &mut HashSet<Uuid>,
    post_id: Uuid,
    now_liked: bool,
    succeeded: bool,
) {
    in_flight.remove(&post_id);
    if succeeded {
        if now_liked {
            liked.insert(post_id);
        } else {
            liked.remove(&post_id);
        }
    }
}
