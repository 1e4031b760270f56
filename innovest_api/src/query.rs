use reqwest::blocking::Response;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::Client;
use crate::error::{ApiError, Result};

/// Accept header that makes the table API return a bare object instead of
/// a one-element array, and 406 when the row count is not exactly one.
const OBJECT_ACCEPT: &str = "application/vnd.pgrst.object+json";

/// One table operation under construction. Filter and shaping calls
/// chain; the terminal calls (`fetch*`, `insert*`, `update`, `delete`)
/// send the request.
#[derive(Clone)]
pub struct QueryBuilder {
    client: Client,
    table: String,
    select: Option<String>,
    filters: Vec<(String, String)>,
}

impl QueryBuilder {
    pub(crate) fn new(client: Client, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
            select: None,
            filters: Vec::new(),
        }
    }

    /// Column list, optionally with embedded resources, e.g.
    /// `*, profiles(full_name, avatar_url)`.
    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    pub fn neq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("neq.{}", value.to_string())));
        self
    }

    /// Case-insensitive pattern match; `%` is the wildcard.
    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.filters
            .push((column.to_string(), format!("ilike.{pattern}")));
        self
    }

    /// Disjunction of conditions in the service's filter grammar, e.g.
    /// `title.ilike.%solar%,description.ilike.%solar%`.
    pub fn or(mut self, conditions: &str) -> Self {
        self.filters
            .push(("or".to_string(), format!("({conditions})")));
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.filters
            .push(("order".to_string(), format!("{column}.asc")));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.filters
            .push(("order".to_string(), format!("{column}.desc")));
        self
    }

    pub fn limit(mut self, count: usize) -> Self {
        self.filters.push(("limit".to_string(), count.to_string()));
        self
    }

    /// Order applied to an embedded table's rows rather than the top level.
    pub fn order_foreign_desc(mut self, table: &str, column: &str) -> Self {
        self.filters
            .push((format!("{table}.order"), format!("{column}.desc")));
        self
    }

    /// Row cap applied to an embedded table's rows.
    pub fn limit_foreign(mut self, table: &str, count: usize) -> Self {
        self.filters
            .push((format!("{table}.limit"), count.to_string()));
        self
    }

    /// Key/value list exactly as it will appear in the query string.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(select) = &self.select {
            pairs.push(("select".to_string(), select.clone()));
        }
        pairs.extend(self.filters.iter().cloned());
        pairs
    }

    pub fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        let url = self.url();
        let pairs = self.query_pairs();
        let request = self
            .client
            .authorize(self.client.http().get(url).query(&pairs));
        decode(request.send()?)
    }

    /// Exactly one row; [`ApiError::RowNotFound`] when it is missing.
    pub fn fetch_one<T: DeserializeOwned>(self) -> Result<T> {
        let url = self.url();
        let pairs = self.query_pairs();
        let request = self
            .client
            .authorize(self.client.http().get(url).query(&pairs))
            .header("Accept", OBJECT_ACCEPT);
        decode(request.send()?)
    }

    pub fn fetch_optional<T: DeserializeOwned>(self) -> Result<Option<T>> {
        match self.fetch_one() {
            Ok(row) => Ok(Some(row)),
            Err(ApiError::RowNotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Inserts one row and decodes the stored row (with any selected
    /// embeds) from the response.
    pub fn insert<T: Serialize, R: DeserializeOwned>(self, row: &T) -> Result<R> {
        let url = self.url();
        let pairs = self.query_pairs();
        let request = self
            .client
            .authorize(self.client.http().post(url).query(&pairs).json(row))
            .header("Prefer", "return=representation")
            .header("Accept", OBJECT_ACCEPT);
        decode(request.send()?)
    }

    /// Inserts one row, discarding the response body.
    pub fn insert_only<T: Serialize>(self, row: &T) -> Result<()> {
        let url = self.url();
        let pairs = self.query_pairs();
        let request = self
            .client
            .authorize(self.client.http().post(url).query(&pairs).json(row))
            .header("Prefer", "return=minimal");
        check(request.send()?)
    }

    /// Applies a partial update to every row matching the filters.
    pub fn update<T: Serialize>(self, patch: &T) -> Result<()> {
        let url = self.url();
        let pairs = self.query_pairs();
        let request = self
            .client
            .authorize(self.client.http().patch(url).query(&pairs).json(patch))
            .header("Prefer", "return=minimal");
        check(request.send()?)
    }

    /// Deletes every row matching the filters.
    pub fn delete(self) -> Result<()> {
        let url = self.url();
        let pairs = self.query_pairs();
        let request = self
            .client
            .authorize(self.client.http().delete(url).query(&pairs))
            .header("Prefer", "return=minimal");
        check(request.send()?)
    }

    fn url(&self) -> String {
        self.client.config().rest_url(&self.table)
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text()?;
    if status == StatusCode::NOT_ACCEPTABLE {
        return Err(ApiError::RowNotFound);
    }
    if !status.is_success() {
        return Err(ApiError::service(status, &body));
    }
    Ok(serde_json::from_str(&body)?)
}

fn check(response: Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text()?;
    Err(ApiError::service(status, &body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn test_client() -> Client {
        let config = ServiceConfig::new("https://abc.innovest.dev", "anon-key").unwrap();
        Client::new(config).unwrap()
    }

    fn pairs(builder: QueryBuilder) -> Vec<(String, String)> {
        builder.query_pairs()
    }

    #[test]
    fn feed_query_pairs() {
        let query = test_client()
            .from("posts")
            .select("*, profiles(full_name, avatar_url)")
            .eq("visibility", "public")
            .order_desc("created_at")
            .limit(50);
        assert_eq!(
            pairs(query),
            vec![
                (
                    "select".to_string(),
                    "*, profiles(full_name, avatar_url)".to_string()
                ),
                ("visibility".to_string(), "eq.public".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "50".to_string()),
            ]
        );
    }

    #[test]
    fn search_query_pairs() {
        let query = test_client()
            .from("posts")
            .eq("visibility", "public")
            .or("title.ilike.%solar%,description.ilike.%solar%")
            .eq("category", "Environment");
        assert_eq!(
            pairs(query),
            vec![
                ("visibility".to_string(), "eq.public".to_string()),
                (
                    "or".to_string(),
                    "(title.ilike.%solar%,description.ilike.%solar%)".to_string()
                ),
                ("category".to_string(), "eq.Environment".to_string()),
            ]
        );
    }

    #[test]
    fn mark_read_query_pairs() {
        let chat_id = Uuid::nil();
        let sender = Uuid::new_v4();
        let query = test_client()
            .from("messages")
            .eq("chat_id", chat_id)
            .neq("sender_id", sender);
        assert_eq!(
            pairs(query),
            vec![
                ("chat_id".to_string(), format!("eq.{chat_id}")),
                ("sender_id".to_string(), format!("neq.{sender}")),
            ]
        );
    }

    #[test]
    fn embedded_preview_query_pairs() {
        let query = test_client()
            .from("chats")
            .order_foreign_desc("messages", "created_at")
            .limit_foreign("messages", 1);
        assert_eq!(
            pairs(query),
            vec![
                ("messages.order".to_string(), "created_at.desc".to_string()),
                ("messages.limit".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn ilike_keeps_wildcards() {
        let query = test_client().from("posts").ilike("title", "%grid%");
        assert_eq!(
            pairs(query),
            vec![("title".to_string(), "ilike.%grid%".to_string())]
        );
    }
}
