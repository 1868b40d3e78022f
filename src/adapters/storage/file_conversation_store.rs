//! File-based Conversation Store Adapter
//!
//! Stores each conversation's state as a YAML file on disk, one file per
//! thread. Handy for local runs where state should survive a restart.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::conversation::ConversationState;
use crate::domain::foundation::ThreadId;
use crate::ports::{ConversationStore, StoreError};

/// File-based storage for conversation state
#[derive(Debug, Clone)]
pub struct FileConversationStore {
    base_path: PathBuf,
}

impl FileConversationStore {
    /// Create a new file store with a base directory
    ///
    /// # Arguments
    /// * `base_path` - The root directory for storing conversation files
    ///
    /// # Example
    /// ```ignore
    /// let store = FileConversationStore::new("./data/conversations");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Get the state file path for a thread
    fn state_file_path(&self, thread_id: &ThreadId) -> PathBuf {
        self.base_path
            .join(format!("{}.yaml", file_stem(thread_id.as_str())))
    }

    /// Ensure directory exists
    async fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

/// Thread ids are opaque; anything outside `[A-Za-z0-9_-]` is hex-escaped so
/// an id can never address a path outside the base directory.
fn file_stem(id: &str) -> String {
    let mut stem = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{:02X}", byte));
        }
    }
    stem
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    async fn find(&self, thread_id: &ThreadId) -> Result<Option<ConversationState>, StoreError> {
        let file_path = self.state_file_path(thread_id);

        let yaml = match fs::read_to_string(&file_path).await {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Unavailable(e.to_string())),
        };

        let state = serde_yaml::from_str(&yaml).map_err(|e| StoreError::Corrupted {
            thread_id: thread_id.clone(),
            reason: e.to_string(),
        })?;

        Ok(Some(state))
    }

    async fn save(
        &self,
        thread_id: &ThreadId,
        state: &ConversationState,
    ) -> Result<(), StoreError> {
        self.ensure_dir().await?;

        let yaml = serde_yaml::to_string(state)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;

        // Write then rename so readers never see a half-written file
        let file_path = self.state_file_path(thread_id);
        let tmp_path = file_path.with_extension("yaml.tmp");
        fs::write(&tmp_path, yaml)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        fs::rename(&tmp_path, &file_path)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(())
    }
}
