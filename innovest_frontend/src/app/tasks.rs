use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use anyhow::Context as _;
use lazy_static::lazy_static;
use log::{error, warn};
use uuid::Uuid;

use innovest_api::models::{
    Chat, Connection, ConnectionStatus, Investment, InvestmentUpdate, Message, NewChat,
    NewConnection, NewLike, NewMessage, NewPost, Notification, Post, Profile, ProfileSetup,
};
use innovest_api::Client;

use super::messages::{AppMessage, ChatData, FeedData, InvestmentData, ProfileData};
use super::state::LoadedImage;

/// Embed clauses shared by every post select.
const POST_COLUMNS: &str = "*, profiles(full_name, avatar_url)";
const MESSAGE_COLUMNS: &str = "*, sender:sender_id(full_name, avatar_url)";
const CHAT_COLUMNS: &str =
    "*, user1:user1_id(id, full_name, avatar_url), user2:user2_id(id, full_name, avatar_url)";
const CHAT_LIST_COLUMNS: &str = "*, user1:user1_id(id, full_name, avatar_url), \
     user2:user2_id(id, full_name, avatar_url), messages(content, created_at)";
const INVESTMENT_COLUMNS: &str = "*, investor:investor_id(full_name, avatar_url), \
     innovator:innovator_id(full_name, avatar_url), post:post_id(title, description)";

const FEED_LIMIT: usize = 50;

lazy_static! {
    static ref DOWNLOAD_CLIENT: reqwest::blocking::Client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| reqwest::blocking::Client::new());
}

fn send(tx: &Sender<AppMessage>, message: AppMessage, name: &str) {
    if tx.send(message).is_err() {
        error!("failed to send {name} message");
    }
}

pub fn restore_session(client: Client, tx: Sender<AppMessage>) {
    thread::spawn(move || {
        let result = client.restore_session().map_err(anyhow::Error::from);
        send(&tx, AppMessage::SessionRestored(result), "SessionRestored");
    });
}

pub fn sign_in(client: Client, tx: Sender<AppMessage>, email: String, password: String) {
    thread::spawn(move || {
        let result = client.sign_in(&email, &password).map_err(anyhow::Error::from);
        send(&tx, AppMessage::SignedIn(result), "SignedIn");
    });
}

pub fn sign_up(client: Client, tx: Sender<AppMessage>, email: String, password: String) {
    thread::spawn(move || {
        let result = client.sign_up(&email, &password).map_err(anyhow::Error::from);
        send(&tx, AppMessage::SignedUp(result), "SignedUp");
    });
}

pub fn sign_out(client: Client, tx: Sender<AppMessage>) {
    thread::spawn(move || {
        let result = client.sign_out().map_err(anyhow::Error::from);
        send(&tx, AppMessage::SignedOut(result), "SignedOut");
    });
}

pub fn save_onboarding(client: Client, tx: Sender<AppMessage>, setup: ProfileSetup) {
    thread::spawn(move || {
        let result = (|| -> anyhow::Result<()> {
            let user_id = client.user_id()?;
            client
                .from("profiles")
                .eq("id", user_id)
                .update(&setup)
                .context("failed to save profile")?;
            Ok(())
        })();
        send(&tx, AppMessage::OnboardingSaved(result), "OnboardingSaved");
    });
}

pub fn load_feed(client: Client, tx: Sender<AppMessage>) {
    thread::spawn(move || {
        let result = (|| -> anyhow::Result<FeedData> {
            let user_id = client.user_id()?;
            let profile: Profile = client
                .from("profiles")
                .select("*")
                .eq("id", user_id)
                .fetch_one()
                .context("failed to load your profile")?;
            let posts: Vec<Post> = client
                .from("posts")
                .select(POST_COLUMNS)
                .eq("visibility", "public")
                .order_desc("created_at")
                .limit(FEED_LIMIT)
                .fetch()
                .context("failed to load posts")?;
            Ok(FeedData { posts, interests: profile.interests })
        })();
        send(&tx, AppMessage::FeedLoaded(result), "FeedLoaded");
    });
}

pub fn search_posts(
    client: Client,
    tx: Sender<AppMessage>,
    query: String,
    category: Option<String>,
) {
    thread::spawn(move || {
        let result = (|| -> anyhow::Result<Vec<Post>> {
            let mut request = client
                .from("posts")
                .select(POST_COLUMNS)
                .eq("visibility", "public");
            let needle = query.trim();
            if !needle.is_empty() {
                request =
                    request.or(&format!("title.ilike.%{needle}%,description.ilike.%{needle}%"));
            }
            if let Some(category) = &category {
                request = request.eq("category", category);
            }
            request.fetch().context("search failed")
        })();
        send(&tx, AppMessage::SearchFinished { query, result }, "SearchFinished");
    });
}

pub fn load_profile(client: Client, tx: Sender<AppMessage>, profile_id: Uuid) {
    thread::spawn(move || {
        let result = (|| -> anyhow::Result<ProfileData> {
            let viewer = client.user_id()?;
            let profile: Profile = client
                .from("profiles")
                .select("*")
                .eq("id", profile_id)
                .fetch_one()
                .context("failed to load profile")?;
            let posts: Vec<Post> = client
                .from("posts")
                .select(POST_COLUMNS)
                .eq("user_id", profile_id)
                .order_desc("created_at")
                .fetch()
                .context("failed to load posts")?;
            let connection = if viewer == profile_id {
                None
            } else {
                fetch_connection(&client, viewer, profile_id)?
            };
            let investments: Vec<Investment> = if viewer == profile_id {
                client
                    .from("investments")
                    .select(INVESTMENT_COLUMNS)
                    .or(&format!("investor_id.eq.{viewer},innovator_id.eq.{viewer}"))
                    .order_desc("created_at")
                    .fetch()
                    .context("failed to load investments")?
            } else {
                Vec::new()
            };
            Ok(ProfileData { profile, posts, connection, investments })
        })();
        send(&tx, AppMessage::ProfileLoaded { profile_id, result }, "ProfileLoaded");
    });
}

/// The single row shared by an unordered user pair, in either direction.
fn fetch_connection(
    client: &Client,
    viewer: Uuid,
    other: Uuid,
) -> anyhow::Result<Option<Connection>> {
    let pair = format!(
        "and(requester_id.eq.{viewer},addressee_id.eq.{other}),\
         and(requester_id.eq.{other},addressee_id.eq.{viewer})"
    );
    client
        .from("connections")
        .select("*")
        .or(&pair)
        .fetch_optional()
        .context("failed to load connection")
}

pub fn request_connection(client: Client, tx: Sender<AppMessage>, profile_id: Uuid) {
    thread::spawn(move || {
        let result = (|| -> anyhow::Result<Option<Connection>> {
            let viewer = client.user_id()?;
            let row = NewConnection {
                requester_id: viewer,
                addressee_id: profile_id,
                status: ConnectionStatus::Pending,
            };
            let stored: Connection = client
                .from("connections")
                .select("*")
                .insert(&row)
                .context("failed to send connection request")?;
            Ok(Some(stored))
        })();
        send(&tx, AppMessage::ConnectionChanged { profile_id, result }, "ConnectionChanged");
    });
}

pub fn respond_connection(
    client: Client,
    tx: Sender<AppMessage>,
    profile_id: Uuid,
    connection_id: Uuid,
    status: ConnectionStatus,
) {
    thread::spawn(move || {
        let result = (|| -> anyhow::Result<Option<Connection>> {
            client
                .from("connections")
                .eq("id", connection_id)
                .update(&serde_json::json!({ "status": status }))
                .context("failed to update connection")?;
            let viewer = client.user_id()?;
            fetch_connection(&client, viewer, profile_id)
        })();
        send(&tx, AppMessage::ConnectionChanged { profile_id, result }, "ConnectionChanged");
    });
}

pub fn remove_connection(
    client: Client,
    tx: Sender<AppMessage>,
    profile_id: Uuid,
    connection_id: Uuid,
) {
    thread::spawn(move || {
        let result = (|| -> anyhow::Result<Option<Connection>> {
            client
                .from("connections")
                .eq("id", connection_id)
                .delete()
                .context("failed to remove connection")?;
            Ok(None)
        })();
        send(&tx, AppMessage::ConnectionChanged { profile_id, result }, "ConnectionChanged");
    });
}

/// Reuses the pair's chat when one exists, creating it otherwise.
pub fn open_chat_with(client: Client, tx: Sender<AppMessage>, other_id: Uuid) {
    thread::spawn(move || {
        let result = (|| -> anyhow::Result<Chat> {
            let viewer = client.user_id()?;
            let pair = format!(
                "and(user1_id.eq.{viewer},user2_id.eq.{other_id}),\
                 and(user1_id.eq.{other_id},user2_id.eq.{viewer})"
            );
            let existing: Option<Chat> = client
                .from("chats")
                .select(CHAT_COLUMNS)
                .or(&pair)
                .fetch_optional()
                .context("failed to look up chat")?;
            if let Some(chat) = existing {
                return Ok(chat);
            }
            let row = NewChat { user1_id: viewer, user2_id: other_id };
            client
                .from("chats")
                .select(CHAT_COLUMNS)
                .insert(&row)
                .context("failed to create chat")
        })();
        send(&tx, AppMessage::ChatOpened(result), "ChatOpened");
    });
}

pub fn load_chat(client: Client, tx: Sender<AppMessage>, chat_id: Uuid) {
    thread::spawn(move || {
        let result = (|| -> anyhow::Result<ChatData> {
            let viewer = client.user_id()?;
            let chat: Chat = client
                .from("chats")
                .select(CHAT_COLUMNS)
                .eq("id", chat_id)
                .fetch_one()
                .context("failed to load chat")?;
            let messages: Vec<Message> = client
                .from("messages")
                .select(MESSAGE_COLUMNS)
                .eq("chat_id", chat_id)
                .order_asc("created_at")
                .fetch()
                .context("failed to load messages")?;
            // Opening the chat counts as reading the other side's messages.
            if let Err(err) = client
                .from("messages")
                .eq("chat_id", chat_id)
                .neq("sender_id", viewer)
                .update(&serde_json::json!({ "read": true }))
            {
                warn!("failed to mark chat {chat_id} messages read: {err}");
            }
            Ok(ChatData { chat, messages })
        })();
        send(&tx, AppMessage::ChatLoaded { chat_id, result }, "ChatLoaded");
    });
}

pub fn subscribe_chat(client: Client, tx: Sender<AppMessage>, chat_id: Uuid) {
    thread::spawn(move || {
        let filter = format!("chat_id=eq.{chat_id}");
        let result = client
            .subscribe("messages", Some(&filter))
            .map_err(anyhow::Error::from);
        send(&tx, AppMessage::ChatSubscribed { chat_id, result }, "ChatSubscribed");
    });
}

pub fn send_message(client: Client, tx: Sender<AppMessage>, chat_id: Uuid, content: String) {
    thread::spawn(move || {
        let result = (|| -> anyhow::Result<Message> {
            let viewer = client.user_id()?;
            let row = NewMessage { chat_id, sender_id: viewer, content };
            client
                .from("messages")
                .select(MESSAGE_COLUMNS)
                .insert(&row)
                .context("failed to send message")
        })();
        send(&tx, AppMessage::MessageSent { chat_id, result }, "MessageSent");
    });
}

pub fn load_chats(client: Client, tx: Sender<AppMessage>) {
    thread::spawn(move || {
        let result = (|| -> anyhow::Result<Vec<Chat>> {
            let viewer = client.user_id()?;
            client
                .from("chats")
                .select(CHAT_LIST_COLUMNS)
                .or(&format!("user1_id.eq.{viewer},user2_id.eq.{viewer}"))
                .order_desc("created_at")
                .order_foreign_desc("messages", "created_at")
                .limit_foreign("messages", 1)
                .fetch()
                .context("failed to load chats")
        })();
        send(&tx, AppMessage::ChatsLoaded(result), "ChatsLoaded");
    });
}

pub fn publish_post(client: Client, tx: Sender<AppMessage>, draft: NewPost) {
    thread::spawn(move || {
        let result = (|| -> anyhow::Result<()> {
            client
                .from("posts")
                .insert_only(&draft)
                .context("failed to publish post")?;
            Ok(())
        })();
        send(&tx, AppMessage::PostPublished(result), "PostPublished");
    });
}

pub fn toggle_like(client: Client, tx: Sender<AppMessage>, post_id: Uuid, currently_liked: bool) {
    thread::spawn(move || {
        let result = (|| -> anyhow::Result<()> {
            let viewer = client.user_id()?;
            if currently_liked {
                client
                    .from("likes")
                    .eq("user_id", viewer)
                    .eq("post_id", post_id)
                    .delete()
                    .context("failed to remove like")?;
            } else {
                let row = NewLike { user_id: viewer, post_id };
                client
                    .from("likes")
                    .insert_only(&row)
                    .context("failed to add like")?;
            }
            Ok(())
        })();
        let message = AppMessage::LikeToggled { post_id, now_liked: !currently_liked, result };
        send(&tx, message, "LikeToggled");
    });
}

pub fn load_notifications(client: Client, tx: Sender<AppMessage>) {
    thread::spawn(move || {
        let result = (|| -> anyhow::Result<Vec<Notification>> {
            let viewer = client.user_id()?;
            client
                .from("notifications")
                .select("*")
                .eq("user_id", viewer)
                .order_desc("created_at")
                .fetch()
                .context("failed to load notifications")
        })();
        send(&tx, AppMessage::NotificationsLoaded(result), "NotificationsLoaded");
    });
}

pub fn subscribe_notifications(client: Client, tx: Sender<AppMessage>) {
    thread::spawn(move || {
        let result = client
            .subscribe("notifications", None)
            .map_err(anyhow::Error::from);
        send(&tx, AppMessage::NotificationsSubscribed(result), "NotificationsSubscribed");
    });
}

pub fn mark_notification_read(client: Client, tx: Sender<AppMessage>, id: Uuid) {
    thread::spawn(move || {
        let result = (|| -> anyhow::Result<()> {
            client
                .from("notifications")
                .eq("id", id)
                .update(&serde_json::json!({ "read": true }))
                .context("failed to mark notification read")?;
            Ok(())
        })();
        send(&tx, AppMessage::NotificationMarkedRead { id, result }, "NotificationMarkedRead");
    });
}

pub fn load_investment(client: Client, tx: Sender<AppMessage>, investment_id: Uuid) {
    thread::spawn(move || {
        let result = (|| -> anyhow::Result<InvestmentData> {
            let investment: Investment = client
                .from("investments")
                .select(INVESTMENT_COLUMNS)
                .eq("id", investment_id)
                .fetch_one()
                .context("failed to load investment")?;
            let updates: Vec<InvestmentUpdate> = client
                .from("investment_updates")
                .select("*")
                .eq("investment_id", investment_id)
                .order_desc("created_at")
                .fetch()
                .context("failed to load funding updates")?;
            Ok(InvestmentData { investment, updates })
        })();
        send(&tx, AppMessage::InvestmentLoaded { investment_id, result }, "InvestmentLoaded");
    });
}

pub fn download_image(tx: Sender<AppMessage>, url: String) {
    thread::spawn(move || {
        let result = (|| {
            let response = DOWNLOAD_CLIENT
                .get(&url)
                .send()
                .map_err(|err| format!("request error: {err}"))?;
            if !response.status().is_success() {
                return Err(format!("http status {}", response.status()));
            }
            let bytes = response
                .bytes()
                .map_err(|err| format!("download error: {err}"))?;
            let image = image::load_from_memory(&bytes)
                .map_err(|err| format!("decode error: {err}"))?;
            let size = [image.width() as usize, image.height() as usize];
            let rgba = image.to_rgba8();
            Ok(LoadedImage { size, pixels: rgba.as_flat_samples().as_slice().to_vec() })
        })();
        send(&tx, AppMessage::ImageLoaded { url, result }, "ImageLoaded");
    });
}
