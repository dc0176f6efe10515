//! Store Module
//!
//! The journal's backing data store is a hosted BaaS. Handlers talk to it
//! through the [`JournalStore`] port; [`RestStore`] speaks to the hosted
//! PostgREST API and [`InMemoryStore`] keeps everything in process for local
//! development and tests.

mod memory;
mod records;
mod rest;
mod retry;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryStore;
pub use records::{
    Anniversary, Letter, MediaFile, Memory, NewAnniversary, NewLetter, NewMedia, NewMemory,
};
pub use rest::RestStore;
pub use retry::{with_retry, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY};

// == Store Error ==
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached
    #[error("backend request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend answer could not be decoded
    #[error("backend response could not be decoded: {0}")]
    Decode(String),

    /// The referenced row does not exist
    #[error("{0}")]
    NotFound(String),
}

impl StoreError {
    /// Whether retrying the same read may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Request(_) => true,
            StoreError::Status { status, .. } => *status >= 500 || *status == 429,
            StoreError::Decode(_) | StoreError::NotFound(_) => false,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Request(err.to_string())
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Journal Store ==
/// Port to the journal's backing data store.
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// All memories, newest `taken_at` first.
    async fn list_memories(&self) -> StoreResult<Vec<Memory>>;

    async fn list_media(&self, memory_id: &str) -> StoreResult<Vec<MediaFile>>;

    async fn create_memory(&self, memory: NewMemory) -> StoreResult<Memory>;

    /// Attaches media rows to an existing memory.
    async fn add_media(&self, memory_id: &str, media: Vec<NewMedia>)
        -> StoreResult<Vec<MediaFile>>;

    /// All letters, newest first.
    async fn list_letters(&self) -> StoreResult<Vec<Letter>>;

    async fn create_letter(&self, letter: NewLetter) -> StoreResult<Letter>;

    async fn delete_letter(&self, id: &str) -> StoreResult<()>;

    /// All anniversaries, earliest date first.
    async fn list_anniversaries(&self) -> StoreResult<Vec<Anniversary>>;

    async fn create_anniversary(&self, anniversary: NewAnniversary) -> StoreResult<Anniversary>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(StoreError::Request("timeout".into()).is_transient());
        assert!(StoreError::Status { status: 503, body: String::new() }.is_transient());
        assert!(!StoreError::Status { status: 400, body: String::new() }.is_transient());
        assert!(!StoreError::NotFound("Letter not found".into()).is_transient());
    }
}
