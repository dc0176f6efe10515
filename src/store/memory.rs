//! In-process journal store for local development and tests.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{
    Anniversary, JournalStore, Letter, MediaFile, Memory, NewAnniversary, NewLetter, NewMedia,
    NewMemory, StoreError, StoreResult,
};

#[derive(Debug, Default)]
struct Tables {
    memories: Vec<Memory>,
    media: Vec<MediaFile>,
    letters: Vec<Letter>,
    anniversaries: Vec<Anniversary>,
}

// == In-Memory Store ==
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[async_trait]
impl JournalStore for InMemoryStore {
    async fn list_memories(&self) -> StoreResult<Vec<Memory>> {
        let mut memories = self.tables.read().await.memories.clone();
        memories.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));
        Ok(memories)
    }

    async fn list_media(&self, memory_id: &str) -> StoreResult<Vec<MediaFile>> {
        let tables = self.tables.read().await;
        Ok(tables
            .media
            .iter()
            .filter(|media| media.memory_id == memory_id)
            .cloned()
            .collect())
    }

    async fn create_memory(&self, memory: NewMemory) -> StoreResult<Memory> {
        let row = Memory {
            id: new_id(),
            title: memory.title,
            body: memory.body,
            taken_at: memory.taken_at,
            city_code: memory.city_code,
            album_id: memory.album_id,
            created_at: Utc::now(),
        };
        self.tables.write().await.memories.push(row.clone());
        Ok(row)
    }

    async fn add_media(
        &self,
        memory_id: &str,
        media: Vec<NewMedia>,
    ) -> StoreResult<Vec<MediaFile>> {
        let mut tables = self.tables.write().await;
        if !tables.memories.iter().any(|memory| memory.id == memory_id) {
            return Err(StoreError::NotFound("Memory not found".to_string()));
        }

        let rows: Vec<MediaFile> = media
            .into_iter()
            .map(|media| MediaFile {
                id: new_id(),
                memory_id: memory_id.to_string(),
                file_name: media.file_name,
                original_name: media.original_name,
                file_type: media.file_type,
                public_url: media.public_url,
                storage_path: media.storage_path,
                file_size: media.file_size,
                width: None,
                height: None,
            })
            .collect();
        tables.media.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn list_letters(&self) -> StoreResult<Vec<Letter>> {
        let mut letters = self.tables.read().await.letters.clone();
        letters.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(letters)
    }

    async fn create_letter(&self, letter: NewLetter) -> StoreResult<Letter> {
        let row = Letter {
            id: new_id(),
            title: letter.title,
            body: letter.body,
            created_at: Utc::now(),
        };
        self.tables.write().await.letters.push(row.clone());
        Ok(row)
    }

    async fn delete_letter(&self, id: &str) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.letters.len();
        tables.letters.retain(|letter| letter.id != id);

        if tables.letters.len() == before {
            return Err(StoreError::NotFound("Letter not found".to_string()));
        }
        Ok(())
    }

    async fn list_anniversaries(&self) -> StoreResult<Vec<Anniversary>> {
        let mut anniversaries = self.tables.read().await.anniversaries.clone();
        anniversaries.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(anniversaries)
    }

    async fn create_anniversary(&self, anniversary: NewAnniversary) -> StoreResult<Anniversary> {
        let row = Anniversary {
            id: new_id(),
            title: anniversary.title,
            date: anniversary.date,
            repeat: anniversary.repeat,
            created_at: Utc::now(),
        };
        self.tables.write().await.anniversaries.push(row.clone());
        Ok(row)
    }
}
