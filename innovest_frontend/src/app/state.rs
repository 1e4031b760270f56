use std::collections::HashSet;

use uuid::Uuid;

use innovest_api::models::{
    Chat, Connection, ConnectionStatus, Investment, InvestmentUpdate, Message, Notification,
    PeerRef, Post, PostType, Profile, Role, Visibility,
};
use innovest_api::realtime::{ChangeEvent, ChangeKind};
use innovest_api::Subscription;

/// Which screen owns the central panel. Each variant carries that screen's
/// transient state, so navigating away drops it wholesale.
pub enum ViewState {
    Auth(AuthState),
    Onboarding(OnboardingState),
    Feed(FeedState),
    Search(SearchState),
    Profile(ProfileState),
    NewPost(NewPostState),
    Notifications(NotificationsState),
    Chats(ChatsState),
    Chat(ChatState),
    Investment(InvestmentState),
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::Auth(AuthState::default())
    }
}

#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
}

#[derive(Default)]
pub struct AuthState {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub submitting: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Default)]
pub struct OnboardingState {
    pub role: Role,
    pub interests: Vec<String>,
    pub submitting: bool,
    pub error: Option<String>,
}

impl OnboardingState {
    pub fn toggle_interest(&mut self, interest: &str) {
        if let Some(pos) = self.interests.iter().position(|i| i == interest) {
            self.interests.remove(pos);
        } else {
            self.interests.push(interest.to_string());
        }
    }
}

#[derive(Default)]
pub struct FeedState {
    pub posts: Vec<Post>,
    pub top_posts: Vec<Post>,
    pub loading: bool,
    pub error: Option<String>,
    pub liked: HashSet<Uuid>,
    pub like_in_flight: HashSet<Uuid>,
}

#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub enum SearchSort {
    #[default]
    Reactions,
    Recent,
}

impl SearchSort {
    pub fn label(self) -> &'static str {
        match self {
            SearchSort::Reactions => "Top Reacted",
            SearchSort::Recent => "Most Recent",
        }
    }
}

#[derive(Default)]
pub struct SearchState {
    pub query: String,
    pub category: Option<String>,
    pub sort: SearchSort,
    pub posts: Vec<Post>,
    pub searching: bool,
    pub searched: bool,
    pub error: Option<String>,
    pub liked: HashSet<Uuid>,
    pub like_in_flight: HashSet<Uuid>,
}

/// Where the viewer stands with the profile's owner, derived from the one
/// connection row shared by the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipState {
    NotConnected,
    PendingOutgoing,
    PendingIncoming,
    Connected,
    Declined,
}

impl RelationshipState {
    /// Chat is only available once both sides have agreed.
    pub fn can_chat(self) -> bool {
        matches!(self, RelationshipState::Connected)
    }
}

pub fn relationship_between(viewer: Uuid, connection: Option<&Connection>) -> RelationshipState {
    match connection {
        None => RelationshipState::NotConnected,
        Some(row) => match row.status {
            ConnectionStatus::Pending if row.requester_id == viewer => {
                RelationshipState::PendingOutgoing
            }
            ConnectionStatus::Pending => RelationshipState::PendingIncoming,
            ConnectionStatus::Accepted => RelationshipState::Connected,
            ConnectionStatus::Rejected => RelationshipState::Declined,
        },
    }
}

pub struct ProfileState {
    pub profile_id: Uuid,
    pub is_own: bool,
    pub profile: Option<Profile>,
    pub posts: Vec<Post>,
    pub connection: Option<Connection>,
    pub investments: Vec<Investment>,
    pub loading: bool,
    pub error: Option<String>,
    pub action_in_flight: bool,
    pub opening_chat: bool,
    pub signing_out: bool,
    pub liked: HashSet<Uuid>,
    pub like_in_flight: HashSet<Uuid>,
}

impl ProfileState {
    pub fn for_user(profile_id: Uuid, is_own: bool) -> Self {
        Self {
            profile_id,
            is_own,
            profile: None,
            posts: Vec::new(),
            connection: None,
            investments: Vec::new(),
            loading: true,
            error: None,
            action_in_flight: false,
            opening_chat: false,
            signing_out: false,
            liked: HashSet::new(),
            like_in_flight: HashSet::new(),
        }
    }

    pub fn relationship(&self, viewer: Uuid) -> RelationshipState {
        relationship_between(viewer, self.connection.as_ref())
    }
}

pub struct NewPostState {
    pub post_type: PostType,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub visibility: Visibility,
    pub tags: Vec<String>,
    pub tag_input: String,
    pub submitting: bool,
    pub error: Option<String>,
}

impl Default for NewPostState {
    fn default() -> Self {
        Self {
            post_type: PostType::Idea,
            title: String::new(),
            description: String::new(),
            category: None,
            visibility: Visibility::Public,
            tags: Vec::new(),
            tag_input: String::new(),
            submitting: false,
            error: None,
        }
    }
}

impl NewPostState {
    /// Moves the tag input into the list. Blanks and repeats leave the
    /// input untouched.
    pub fn add_tag(&mut self) {
        let tag = self.tag_input.trim().to_string();
        if !tag.is_empty() && !self.tags.contains(&tag) {
            self.tags.push(tag);
            self.tag_input.clear();
        }
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|existing| existing != tag);
    }
}

#[derive(Default)]
pub struct NotificationsState {
    pub notifications: Vec<Notification>,
    pub loading: bool,
    pub error: Option<String>,
    pub marking: HashSet<Uuid>,
    pub subscription: Option<Subscription>,
}

impl NotificationsState {
    /// Pushed inserts land on top, matching the newest-first fetch order.
    pub fn apply_change(&mut self, event: &ChangeEvent) {
        if event.kind != ChangeKind::Insert {
            return;
        }
        match event.decode_record::<Notification>() {
            Ok(notification) => self.notifications.insert(0, notification),
            Err(err) => log::warn!("ignoring undecodable notification event: {err}"),
        }
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn mark_read_local(&mut self, id: Uuid) {
        if let Some(notification) = self.notifications.iter_mut().find(|n| n.id == id) {
            notification.read = true;
        }
    }
}

#[derive(Default)]
pub struct ChatsState {
    pub chats: Vec<Chat>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct ChatState {
    pub chat_id: Uuid,
    pub chat: Option<Chat>,
    pub other_user: Option<PeerRef>,
    pub messages: Vec<Message>,
    pub loading: bool,
    pub error: Option<String>,
    pub input: String,
    pub sending: bool,
    pub send_error: Option<String>,
    pub subscription: Option<Subscription>,
}

impl ChatState {
    pub fn for_chat(chat_id: Uuid) -> Self {
        Self {
            chat_id,
            chat: None,
            other_user: None,
            messages: Vec::new(),
            loading: true,
            error: None,
            input: String::new(),
            sending: false,
            send_error: None,
            subscription: None,
        }
    }

    /// A completed send appends the stored row and clears the input.
    pub fn apply_sent(&mut self, message: Message) {
        self.messages.push(message);
        self.input.clear();
        self.send_error = None;
    }

    /// Pushed inserts are appended in arrival order. Rows for another chat
    /// are dropped.
    pub fn apply_change(&mut self, event: &ChangeEvent) {
        if event.kind != ChangeKind::Insert {
            return;
        }
        match event.decode_record::<Message>() {
            Ok(message) if message.chat_id == self.chat_id => self.messages.push(message),
            Ok(_) => {}
            Err(err) => log::warn!("ignoring undecodable message event: {err}"),
        }
    }
}

pub struct InvestmentState {
    pub investment_id: Uuid,
    pub investment: Option<Investment>,
    pub updates: Vec<InvestmentUpdate>,
    pub loading: bool,
    pub error: Option<String>,
}

impl InvestmentState {
    pub fn for_investment(investment_id: Uuid) -> Self {
        Self {
            investment_id,
            investment: None,
            updates: Vec::new(),
            loading: true,
            error: None,
        }
    }

    pub fn total_used(&self) -> f64 {
        self.updates.iter().filter_map(|update| update.amount_used).sum()
    }

    pub fn usage_percentage(&self) -> f64 {
        let amount = self.investment.as_ref().map(|i| i.amount).unwrap_or(0.0);
        fund_usage_percentage(amount, &self.updates)
    }
}

/// Pixels decoded off-thread, waiting to be uploaded as a texture.
#[derive(Clone)]
pub struct LoadedImage {
    pub size: [usize; 2],
    pub pixels: Vec<u8>,
}

/// Keeps posts whose category contains one of the viewer's interests,
/// case-insensitively. An empty interest list disables filtering.
pub fn filter_by_interests(posts: &[Post], interests: &[String]) -> Vec<Post> {
    if interests.is_empty() {
        return posts.to_vec();
    }
    posts
        .iter()
        .filter(|post| {
            let category = post
                .category
                .as_deref()
                .unwrap_or_default()
                .to_lowercase();
            interests
                .iter()
                .any(|interest| category.contains(&interest.to_lowercase()))
        })
        .cloned()
        .collect()
}

/// The `count` posts with the highest combined likes+comments, descending.
/// The sort is stable, so ties keep their fetch order.
pub fn top_reacted(posts: &[Post], count: usize) -> Vec<Post> {
    let mut ranked = posts.to_vec();
    ranked.sort_by_key(|post| std::cmp::Reverse(post.reactions()));
    ranked.truncate(count);
    ranked
}

/// Client-side ordering of search results.
pub fn sort_posts(posts: &mut [Post], sort: SearchSort) {
    match sort {
        SearchSort::Reactions => {
            posts.sort_by_key(|post| std::cmp::Reverse(post.reactions()));
        }
        SearchSort::Recent => {
            posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
    }
}

/// Spent fraction of an investment as a display percentage, clamped to 100.
/// Updates without an amount count as zero.
pub fn fund_usage_percentage(amount: f64, updates: &[InvestmentUpdate]) -> f64 {
    if amount <= 0.0 {
        return 0.0;
    }
    let used: f64 = updates.iter().filter_map(|update| update.amount_used).sum();
    ((used / amount) * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use chrono::{Duration, Utc};
    use serde_json::json;

    fn post(title: &str, category: &str, likes: i64, comments: i64) -> Post {
        Post {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            post_type: PostType::Idea,
            title: title.to_string(),
            description: None,
            category: Some(category.to_string()),
            tags: Vec::new(),
            visibility: Visibility::Public,
            image_url: None,
            likes_count: likes,
            comments_count: comments,
            created_at: Some(Utc::now()),
            author: None,
        }
    }

    fn update(amount_used: Option<f64>) -> InvestmentUpdate {
        InvestmentUpdate {
            id: Uuid::new_v4(),
            investment_id: Uuid::new_v4(),
            title: None,
            description: None,
            amount_used,
            progress_percentage: None,
            created_at: None,
        }
    }

    fn connection(requester: Uuid, addressee: Uuid, status: ConnectionStatus) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            requester_id: requester,
            addressee_id: addressee,
            status,
            created_at: None,
        }
    }

    #[test]
    fn feed_filter_keeps_only_matching_interests() {
        let posts = vec![post("a", "Health", 0, 0), post("b", "Finance", 0, 0)];
        let filtered = filter_by_interests(&posts, &["Health".to_string()]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].category.as_deref(), Some("Health"));
    }

    #[test]
    fn feed_filter_matches_substrings_case_insensitively() {
        let posts = vec![post("a", "Social Media", 0, 0), post("b", "Gaming", 0, 0)];
        let filtered = filter_by_interests(&posts, &["media".to_string()]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "a");
    }

    #[test]
    fn feed_filter_without_interests_keeps_everything() {
        let posts = vec![post("a", "Health", 0, 0), post("b", "Finance", 0, 0)];
        assert_eq!(filter_by_interests(&posts, &[]).len(), 2);
    }

    #[test]
    fn feed_filter_drops_posts_without_a_category() {
        let mut uncategorized = post("a", "", 0, 0);
        uncategorized.category = None;
        let filtered = filter_by_interests(&[uncategorized], &["Health".to_string()]);
        assert!(filtered.is_empty());
    }

    #[test]
    fn top_posts_rank_by_combined_reactions() {
        let posts = vec![
            post("first", "x", 10, 5),
            post("second", "x", 2, 1),
            post("third", "x", 8, 8),
        ];
        let ranked = top_reacted(&posts, 5);
        let titles: Vec<&str> = ranked.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "first", "second"]);
        assert_eq!(ranked[0].reactions(), 16);
    }

    #[test]
    fn top_posts_truncate_and_keep_order_on_ties() {
        let posts = vec![
            post("a", "x", 1, 1),
            post("b", "x", 2, 0),
            post("c", "x", 0, 2),
        ];
        let ranked = top_reacted(&posts, 2);
        let titles: Vec<&str> = ranked.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn search_sort_by_recency_puts_newest_first() {
        let mut older = post("older", "x", 50, 50);
        older.created_at = Some(Utc::now() - Duration::hours(2));
        let newer = post("newer", "x", 0, 0);
        let mut posts = vec![older, newer];
        sort_posts(&mut posts, SearchSort::Recent);
        assert_eq!(posts[0].title, "newer");
        sort_posts(&mut posts, SearchSort::Reactions);
        assert_eq!(posts[0].title, "older");
    }

    #[test]
    fn fund_usage_is_percentage_of_amount() {
        let updates = vec![update(Some(100.0)), update(Some(150.0))];
        assert_eq!(fund_usage_percentage(1000.0, &updates), 25.0);
    }

    #[test]
    fn fund_usage_handles_missing_amounts_and_clamps() {
        let updates = vec![update(None), update(Some(50.0))];
        assert_eq!(fund_usage_percentage(100.0, &updates), 50.0);
        assert_eq!(fund_usage_percentage(0.0, &updates), 0.0);
        let overspent = vec![update(Some(500.0))];
        assert_eq!(fund_usage_percentage(100.0, &overspent), 100.0);
    }

    #[test]
    fn relationship_walks_the_connection_state_machine() {
        let viewer = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert_eq!(relationship_between(viewer, None), RelationshipState::NotConnected);

        let pending = connection(viewer, other, ConnectionStatus::Pending);
        assert_eq!(
            relationship_between(viewer, Some(&pending)),
            RelationshipState::PendingOutgoing
        );
        assert_eq!(
            relationship_between(other, Some(&pending)),
            RelationshipState::PendingIncoming
        );

        let accepted = connection(viewer, other, ConnectionStatus::Accepted);
        assert_eq!(
            relationship_between(viewer, Some(&accepted)),
            RelationshipState::Connected
        );
        assert!(relationship_between(viewer, Some(&accepted)).can_chat());

        let rejected = connection(viewer, other, ConnectionStatus::Rejected);
        assert_eq!(
            relationship_between(viewer, Some(&rejected)),
            RelationshipState::Declined
        );
        assert!(!relationship_between(viewer, Some(&rejected)).can_chat());

        // Disconnect deletes the row and the pair starts over.
        assert_eq!(relationship_between(viewer, None), RelationshipState::NotConnected);
    }

    #[test]
    fn sent_message_appends_once_and_clears_input() {
        let chat_id = Uuid::new_v4();
        let mut state = ChatState::for_chat(chat_id);
        state.input = "hello there".to_string();
        state.sending = true;

        let message = Message {
            id: Uuid::new_v4(),
            chat_id,
            sender_id: Uuid::new_v4(),
            content: "hello there".to_string(),
            read: false,
            created_at: Some(Utc::now()),
            sender: None,
        };
        state.apply_sent(message);

        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].content, "hello there");
        assert!(state.input.is_empty());
    }

    #[test]
    fn chat_appends_pushed_inserts_for_its_own_chat() {
        let chat_id = Uuid::new_v4();
        let mut state = ChatState::for_chat(chat_id);

        let event = ChangeEvent {
            kind: ChangeKind::Insert,
            table: "messages".to_string(),
            record: json!({
                "id": Uuid::new_v4(),
                "chat_id": chat_id,
                "sender_id": Uuid::new_v4(),
                "content": "pushed",
                "read": false
            }),
            old_record: None,
        };
        state.apply_change(&event);
        assert_eq!(state.messages.len(), 1);

        let foreign = ChangeEvent {
            kind: ChangeKind::Insert,
            table: "messages".to_string(),
            record: json!({
                "id": Uuid::new_v4(),
                "chat_id": Uuid::new_v4(),
                "sender_id": Uuid::new_v4(),
                "content": "someone else's chat"
            }),
            old_record: None,
        };
        state.apply_change(&foreign);
        assert_eq!(state.messages.len(), 1);

        let delete = ChangeEvent {
            kind: ChangeKind::Delete,
            table: "messages".to_string(),
            record: json!({}),
            old_record: None,
        };
        state.apply_change(&delete);
        assert_eq!(state.messages.len(), 1);
    }

    #[test]
    fn notifications_prepend_pushed_inserts_and_track_unread() {
        let mut state = NotificationsState::default();
        let user_id = Uuid::new_v4();
        state.notifications.push(Notification {
            id: Uuid::new_v4(),
            user_id,
            title: Some("old".to_string()),
            message: None,
            read: true,
            created_at: None,
        });

        let event = ChangeEvent {
            kind: ChangeKind::Insert,
            table: "notifications".to_string(),
            record: json!({
                "id": Uuid::new_v4(),
                "user_id": user_id,
                "title": "new",
                "read": false
            }),
            old_record: None,
        };
        state.apply_change(&event);

        assert_eq!(state.notifications.len(), 2);
        assert_eq!(state.notifications[0].title.as_deref(), Some("new"));
        assert_eq!(state.unread_count(), 1);

        let id = state.notifications[0].id;
        state.mark_read_local(id);
        assert_eq!(state.unread_count(), 0);
    }

    #[test]
    fn tag_input_ignores_blanks_and_repeats() {
        let mut state = NewPostState::default();
        state.tag_input = "  fintech  ".to_string();
        state.add_tag();
        assert_eq!(state.tags, vec!["fintech"]);
        assert!(state.tag_input.is_empty());

        state.tag_input = "fintech".to_string();
        state.add_tag();
        assert_eq!(state.tags.len(), 1);
        assert_eq!(state.tag_input, "fintech");

        state.tag_input = "   ".to_string();
        state.add_tag();
        assert_eq!(state.tags.len(), 1);

        state.remove_tag("fintech");
        assert!(state.tags.is_empty());
    }

    #[test]
    fn onboarding_toggles_interests_in_selection_order() {
        let mut state = OnboardingState::default();
        state.toggle_interest("AI");
        state.toggle_interest("Food");
        assert_eq!(state.interests, vec!["AI", "Food"]);
        state.toggle_interest("AI");
        assert_eq!(state.interests, vec!["Food"]);
    }
}
