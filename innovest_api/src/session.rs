use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A signed-in identity plus the bearer token that proves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix timestamp. Informational only; the service is the judge of
    /// whether the token is still good.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

/// Shape of the auth endpoint's password-grant and sign-up responses.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

impl TokenResponse {
    pub(crate) fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| Utc::now().timestamp() + secs));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

fn cache_dir() -> PathBuf {
    if let Some(home) = dirs::home_dir() {
        home.join(".innovest")
    } else {
        PathBuf::from(".innovest")
    }
}

pub fn cache_path() -> PathBuf {
    cache_dir().join("session.json")
}

/// Best-effort read of the session cached by a previous run. A missing or
/// unreadable file is treated the same as no session.
pub fn load_cached() -> Option<Session> {
    load_from(&cache_path())
}

pub fn store_cached(session: &Session) -> Result<()> {
    store_at(&cache_path(), session)
}

pub fn clear_cached() {
    let _ = fs::remove_file(cache_path());
}

fn load_from(path: &Path) -> Option<Session> {
    let bytes = fs::read(path).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn store_at(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_vec_pretty(session)?;
    fs::write(path, body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_session() -> Session {
        Session {
            access_token: "token-abc".into(),
            refresh_token: Some("refresh-def".into()),
            expires_at: Some(1_900_000_000),
            user: User {
                id: Uuid::new_v4(),
                email: Some("ada@example.com".into()),
                created_at: None,
            },
        }
    }

    #[test]
    fn cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let session = sample_session();

        store_at(&path, &session).unwrap();
        let loaded = load_from(&path).unwrap();

        assert_eq!(loaded.access_token, session.access_token);
        assert_eq!(loaded.user.id, session.user.id);
        assert_eq!(loaded.expires_at, session.expires_at);
    }

    #[test]
    fn missing_cache_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from(&dir.path().join("session.json")).is_none());
    }

    #[test]
    fn corrupt_cache_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, b"not json").unwrap();
        assert!(load_from(&path).is_none());
    }

    #[test]
    fn token_response_keeps_explicit_expiry() {
        let json = r#"{
            "access_token": "abc",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1900000000,
            "refresh_token": "def",
            "user": {"id": "91a27f35-2ccd-4d1d-bf0c-a9f0ae87a447", "email": "a@b.c"}
        }"#;
        let session: Session = serde_json::from_str::<TokenResponse>(json)
            .unwrap()
            .into_session();
        assert_eq!(session.expires_at, Some(1_900_000_000));
        assert_eq!(session.user.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn token_response_derives_expiry_from_lifetime() {
        let json = r#"{
            "access_token": "abc",
            "expires_in": 3600,
            "user": {"id": "91a27f35-2ccd-4d1d-bf0c-a9f0ae87a447"}
        }"#;
        let session: Session = serde_json::from_str::<TokenResponse>(json)
            .unwrap()
            .into_session();
        let expires_at = session.expires_at.unwrap();
        assert!(expires_at > Utc::now().timestamp());
    }
}
