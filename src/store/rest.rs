//! Hosted backend client
//!
//! Talks to the PostgREST surface of the hosted backend:
//! `{base}/rest/v1/{table}` with the service key sent both as `apikey` and
//! as a bearer token. Reads are retried on transient failures; writes are
//! sent once and ask for the stored row back.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::store::{
    with_retry, Anniversary, JournalStore, Letter, MediaFile, Memory, NewAnniversary, NewLetter,
    NewMedia, NewMemory, StoreError, StoreResult, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY,
};

const MEMORIES: &str = "memories";
const MEDIA: &str = "media";
const LETTERS: &str = "letters";
const ANNIVERSARIES: &str = "anniversaries";

// == Rest Store ==
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RestStore {
    /// # Arguments
    /// * `base_url` - Project URL, without the `/rest/v1` suffix
    /// * `api_key` - Service key for the project
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Overrides the read retry schedule.
    pub fn with_retry_policy(mut self, attempts: u32, base_delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = base_delay;
        self
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    // == Reads ==
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        with_retry(self.retry_attempts, self.retry_delay, move || async move {
            debug!(table, "backend select");
            let request = self
                .authorized(self.client.get(self.table_url(table)))
                .query(query);
            let response = checked(request.send().await?).await?;
            response.json::<Vec<T>>().await.map_err(StoreError::from)
        })
        .await
    }

    // == Writes ==
    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> StoreResult<Vec<T>> {
        debug!(table, "backend insert");
        let request = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(body);
        let response = checked(request.send().await?).await?;
        Ok(response.json::<Vec<T>>().await?)
    }

    async fn insert_one<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> StoreResult<T> {
        self.insert::<B, T>(table, body)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode(format!("insert into {table} returned no row")))
    }
}

/// Maps non-success statuses to [`StoreError::Status`].
async fn checked(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl JournalStore for RestStore {
    async fn list_memories(&self) -> StoreResult<Vec<Memory>> {
        self.select(
            MEMORIES,
            &[("select", "*".into()), ("order", "taken_at.desc".into())],
        )
        .await
    }

    async fn list_media(&self, memory_id: &str) -> StoreResult<Vec<MediaFile>> {
        self.select(
            MEDIA,
            &[
                ("select", "*".into()),
                ("memory_id", format!("eq.{memory_id}")),
            ],
        )
        .await
    }

    async fn create_memory(&self, memory: NewMemory) -> StoreResult<Memory> {
        self.insert_one(MEMORIES, &memory).await
    }

    async fn add_media(
        &self,
        memory_id: &str,
        media: Vec<NewMedia>,
    ) -> StoreResult<Vec<MediaFile>> {
        let rows: Vec<_> = media
            .into_iter()
            .map(|media| {
                json!({
                    "memory_id": memory_id,
                    "file_name": media.file_name,
                    "original_name": media.original_name,
                    "file_type": media.file_type,
                    "public_url": media.public_url,
                    "storage_path": media.storage_path,
                    "file_size": media.file_size,
                })
            })
            .collect();
        self.insert(MEDIA, &rows).await
    }

    async fn list_letters(&self) -> StoreResult<Vec<Letter>> {
        self.select(
            LETTERS,
            &[("select", "*".into()), ("order", "created_at.desc".into())],
        )
        .await
    }

    async fn create_letter(&self, letter: NewLetter) -> StoreResult<Letter> {
        self.insert_one(LETTERS, &letter).await
    }

    async fn delete_letter(&self, id: &str) -> StoreResult<()> {
        debug!(table = LETTERS, "backend delete");
        let request = self
            .authorized(self.client.delete(self.table_url(LETTERS)))
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{id}"))]);
        let deleted: Vec<serde_json::Value> = checked(request.send().await?).await?.json().await?;

        if deleted.is_empty() {
            return Err(StoreError::NotFound("Letter not found".to_string()));
        }
        Ok(())
    }

    async fn list_anniversaries(&self) -> StoreResult<Vec<Anniversary>> {
        self.select(
            ANNIVERSARIES,
            &[("select", "*".into()), ("order", "date.asc".into())],
        )
        .await
    }

    async fn create_anniversary(&self, anniversary: NewAnniversary) -> StoreResult<Anniversary> {
        self.insert_one(ANNIVERSARIES, &anniversary).await
    }
}
