use domain::error::PersistenceError;
use domain::models::EmbeddingVector;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Single-snapshot JSON file holding one vector per corpus entry, in corpus order.
#[derive(Debug, Clone)]
pub struct EmbeddingStorage {
    path: PathBuf,
}

impl EmbeddingStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no snapshot exists yet.
    pub async fn load(&self) -> Result<Option<Vec<EmbeddingVector>>, PersistenceError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistenceError::io(&self.path, e)),
        };
        let vectors: Vec<EmbeddingVector> =
            serde_json::from_slice(&bytes).map_err(|e| PersistenceError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        Ok(Some(vectors))
    }

    /// Replace the snapshot. Readers see either the old or the new file, never a partial one.
    pub async fn save(&self, vectors: &[EmbeddingVector]) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PersistenceError::io(parent, e))?;
        }
        let bytes = serde_json::to_vec(vectors).map_err(|e| PersistenceError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| PersistenceError::io(&tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(PersistenceError::io(&self.path, e));
        }
        Ok(())
    }

    pub async fn remove(&self) -> Result<(), PersistenceError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistenceError::io(&self.path, e)),
        }
    }
}
