use std::sync::{Arc, RwLock};
use std::time::Duration;

use log::warn;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::error::{ApiError, Result};
use crate::query::QueryBuilder;
use crate::realtime::Subscription;
use crate::session::{self, Session, TokenResponse, User};

/// Handle to the hosted service. Cloning is cheap; clones share the HTTP
/// connection pool and the active session.
#[derive(Clone)]
pub struct Client {
    config: ServiceConfig,
    http: HttpClient,
    session: Arc<RwLock<Option<Session>>>,
}

impl Client {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            config,
            http,
            session: Arc::new(RwLock::new(None)),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ServiceConfig::from_env()?)
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session.read().ok().and_then(|guard| guard.clone())
    }

    pub fn current_user(&self) -> Option<User> {
        self.current_session().map(|session| session.user)
    }

    pub fn user_id(&self) -> Result<Uuid> {
        self.current_user()
            .map(|user| user.id)
            .ok_or(ApiError::NotAuthenticated)
    }

    fn set_session(&self, session: Option<Session>) {
        if let Ok(mut guard) = self.session.write() {
            *guard = session;
        }
    }

    pub fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        self.authenticate(self.config.auth_url("signup"), email, password)
    }

    pub fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.authenticate(
            self.config.auth_url("token?grant_type=password"),
            email,
            password,
        )
    }

    fn authenticate(&self, url: String, email: &str, password: &str) -> Result<Session> {
        let response = self
            .http
            .post(url)
            .header("apikey", self.config.anon_key())
            .json(&json!({ "email": email, "password": password }))
            .send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(ApiError::service(status, &body));
        }
        let value: serde_json::Value = serde_json::from_str(&body)?;
        if value.get("access_token").is_none() {
            // Sign-up with confirmation enabled returns the bare user.
            return Err(ApiError::ConfirmationRequired);
        }
        let session = serde_json::from_value::<TokenResponse>(value)?.into_session();
        self.set_session(Some(session.clone()));
        if let Err(err) = session::store_cached(&session) {
            warn!("failed to cache session: {err}");
        }
        Ok(session)
    }

    /// Clears the local session unconditionally; the server-side revoke is
    /// best effort.
    pub fn sign_out(&self) -> Result<()> {
        let token = self.current_session().map(|session| session.access_token);
        self.set_session(None);
        session::clear_cached();
        if let Some(token) = token {
            let result = self
                .http
                .post(self.config.auth_url("logout"))
                .header("apikey", self.config.anon_key())
                .bearer_auth(&token)
                .send();
            match result {
                Ok(response) if !response.status().is_success() => {
                    warn!("sign-out revoke returned {}", response.status());
                }
                Err(err) => warn!("sign-out revoke failed: {err}"),
                _ => {}
            }
        }
        Ok(())
    }

    /// Picks up the session cached by a previous run and checks it against
    /// the auth endpoint. Returns the signed-in user, or `None` when there
    /// is no usable session.
    pub fn restore_session(&self) -> Result<Option<User>> {
        let Some(cached) = session::load_cached() else {
            return Ok(None);
        };
        self.set_session(Some(cached));
        match self.fetch_user() {
            Ok(user) => {
                if let Ok(mut guard) = self.session.write() {
                    if let Some(session) = guard.as_mut() {
                        session.user = user.clone();
                    }
                }
                Ok(Some(user))
            }
            Err(ApiError::Service { status, .. })
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN =>
            {
                self.set_session(None);
                session::clear_cached();
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// `GET /auth/v1/user` with the active token.
    pub fn fetch_user(&self) -> Result<User> {
        let session = self.current_session().ok_or(ApiError::NotAuthenticated)?;
        let response = self
            .http
            .get(self.config.auth_url("user"))
            .header("apikey", self.config.anon_key())
            .bearer_auth(&session.access_token)
            .send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(ApiError::service(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Entry point for table reads and writes.
    pub fn from(&self, table: &str) -> QueryBuilder {
        QueryBuilder::new(self.clone(), table)
    }

    /// Opens a change subscription on `table`, optionally narrowed by a
    /// `column=eq.value` filter.
    pub fn subscribe(&self, table: &str, filter: Option<&str>) -> Result<Subscription> {
        Subscription::open(&self.config, table, filter)
    }

    /// Applies the publishable key and, when signed in, the bearer token.
    /// Anonymous requests still send the key as bearer; the service
    /// expects both headers on every call.
    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("apikey", self.config.anon_key().to_string());
        match self.current_session() {
            Some(session) => request.bearer_auth(session.access_token),
            None => request.bearer_auth(self.config.anon_key().to_string()),
        }
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.http
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::User;

    fn test_client() -> Client {
        let config = ServiceConfig::new("https://abc.innovest.dev", "anon-key").unwrap();
        Client::new(config).unwrap()
    }

    fn test_session(id: Uuid) -> Session {
        Session {
            access_token: "tok".into(),
            refresh_token: None,
            expires_at: None,
            user: User {
                id,
                email: None,
                created_at: None,
            },
        }
    }

    #[test]
    fn user_id_requires_session() {
        let client = test_client();
        assert!(matches!(
            client.user_id(),
            Err(ApiError::NotAuthenticated)
        ));
    }

    #[test]
    fn clones_share_the_session() {
        let client = test_client();
        let clone = client.clone();
        let id = Uuid::new_v4();
        client.set_session(Some(test_session(id)));
        assert_eq!(clone.user_id().unwrap(), id);
        client.set_session(None);
        assert!(clone.current_session().is_none());
    }
}
