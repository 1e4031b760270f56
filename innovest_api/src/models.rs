use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Innovator,
    Investor,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Innovator => "Innovator",
            Role::Investor => "Investor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    #[default]
    Idea,
    Milestone,
}

impl PostType {
    pub fn label(self) -> &'static str {
        match self {
            PostType::Idea => "Idea",
            PostType::Milestone => "Milestone",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    InvestorsOnly,
    Private,
}

impl Visibility {
    pub fn label(self) -> &'static str {
        match self {
            Visibility::Public => "Public",
            Visibility::InvestorsOnly => "Investors Only",
            Visibility::Private => "Private",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The `full_name`/`avatar_url` pair embedded by post and message selects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorRef {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl AuthorRef {
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type", default)]
    pub post_type: PostType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub comments_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "profiles", default)]
    pub author: Option<AuthorRef>,
}

impl Post {
    /// Combined engagement count used for ranking.
    pub fn reactions(&self) -> i64 {
        self.likes_count + self.comments_count
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub addressee_id: Uuid,
    pub status: ConnectionStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The `id`/`full_name`/`avatar_url` triple embedded by chat selects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeerRef {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl PeerRef {
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePreview {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub user1_id: Uuid,
    pub user2_id: Uuid,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user1: Option<PeerRef>,
    #[serde(default)]
    pub user2: Option<PeerRef>,
    #[serde(default)]
    pub messages: Vec<MessagePreview>,
}

impl Chat {
    pub fn other_user_id(&self, viewer: Uuid) -> Uuid {
        if self.user1_id == viewer {
            self.user2_id
        } else {
            self.user1_id
        }
    }

    pub fn other_user(&self, viewer: Uuid) -> Option<&PeerRef> {
        if self.user1_id == viewer {
            self.user2.as_ref()
        } else {
            self.user1.as_ref()
        }
    }

    pub fn latest_message(&self) -> Option<&MessagePreview> {
        self.messages.first()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sender: Option<AuthorRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: Uuid,
    pub investor_id: Uuid,
    pub innovator_id: Uuid,
    pub post_id: Uuid,
    pub amount: f64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub investor: Option<AuthorRef>,
    #[serde(default)]
    pub innovator: Option<AuthorRef>,
    #[serde(default)]
    pub post: Option<PostRef>,
}

/// The `title`/`description` pair embedded by investment selects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostRef {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentUpdate {
    pub id: Uuid,
    pub investment_id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount_used: Option<f64>,
    #[serde(default)]
    pub progress_percentage: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPost {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub title: String,
    pub description: String,
    pub category: String,
    pub visibility: Visibility,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewLike {
    pub user_id: Uuid,
    pub post_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewChat {
    pub user1_id: Uuid,
    pub user2_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewConnection {
    pub requester_id: Uuid,
    pub addressee_id: Uuid,
    pub status: ConnectionStatus,
}

/// Onboarding writes role and interests onto the signed-in profile.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSetup {
    pub role: Role,
    pub interests: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn post_decodes_with_author_embed() {
        let json = r#"{
            "id": "4699eb4c-5c72-4f4d-8c2b-3fd2a14c3c4e",
            "user_id": "91a27f35-2ccd-4d1d-bf0c-a9f0ae87a447",
            "type": "milestone",
            "title": "Prototype shipped",
            "description": "First hardware batch out the door",
            "category": "Technology",
            "tags": ["hardware", "iot"],
            "visibility": "investors_only",
            "image_url": null,
            "likes_count": 12,
            "comments_count": 3,
            "created_at": "2025-04-02T09:30:00Z",
            "profiles": {"full_name": "Ada Byron", "avatar_url": null}
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.post_type, PostType::Milestone);
        assert_eq!(post.visibility, Visibility::InvestorsOnly);
        assert_eq!(post.reactions(), 15);
        assert_eq!(post.author.unwrap().display_name(), "Ada Byron");
    }

    #[test]
    fn post_decodes_without_embed_or_counters() {
        let json = r#"{
            "id": "4699eb4c-5c72-4f4d-8c2b-3fd2a14c3c4e",
            "user_id": "91a27f35-2ccd-4d1d-bf0c-a9f0ae87a447",
            "type": "idea",
            "title": "Solar micro-grids"
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.visibility, Visibility::Public);
        assert_eq!(post.reactions(), 0);
        assert!(post.author.is_none());
        assert!(post.tags.is_empty());
    }

    #[test]
    fn chat_picks_the_other_participant() {
        let me = Uuid::new_v4();
        let them = Uuid::new_v4();
        let json = format!(
            r#"{{
                "id": "{}",
                "user1_id": "{me}",
                "user2_id": "{them}",
                "user1": {{"id": "{me}", "full_name": "Me", "avatar_url": null}},
                "user2": {{"id": "{them}", "full_name": "Them", "avatar_url": null}},
                "messages": [{{"content": "latest", "created_at": "2025-04-02T09:30:00Z"}}]
            }}"#,
            Uuid::new_v4()
        );
        let chat: Chat = serde_json::from_str(&json).unwrap();
        assert_eq!(chat.other_user_id(me), them);
        assert_eq!(chat.other_user(me).unwrap().display_name(), "Them");
        assert_eq!(chat.other_user(them).unwrap().display_name(), "Me");
        assert_eq!(chat.latest_message().unwrap().content, "latest");
    }

    #[test]
    fn new_post_serializes_wire_column_names() {
        let row = NewPost {
            user_id: Uuid::nil(),
            post_type: PostType::Idea,
            title: "t".into(),
            description: "d".into(),
            category: "Finance".into(),
            visibility: Visibility::Public,
            tags: vec!["a".into()],
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["type"], "idea");
        assert_eq!(value["visibility"], "public");
        assert!(value.get("post_type").is_none());
    }

    #[test]
    fn connection_status_uses_lowercase_wire_names() {
        let row = NewConnection {
            requester_id: Uuid::nil(),
            addressee_id: Uuid::nil(),
            status: ConnectionStatus::Pending,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["status"], "pending");
        let parsed: ConnectionStatus = serde_json::from_str("\"accepted\"").unwrap();
        assert_eq!(parsed, ConnectionStatus::Accepted);
    }
}
