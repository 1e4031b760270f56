pub mod auth;
pub mod chat;
pub mod chats;
pub mod feed;
pub mod investment;
pub mod navbar;
pub mod new_post;
pub mod notifications;
pub mod onboarding;
pub mod post_card;
pub mod profile;
pub mod search;
