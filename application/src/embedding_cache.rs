use domain::error::{ProviderError, ServiceError};
use domain::models::{Corpus, EmbeddingVector};
use domain::providers::EmbeddingProvider;
use infrastructure::embedding_storage::EmbeddingStorage;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type CachedVectors = Arc<Vec<EmbeddingVector>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Unloaded,
    Valid { entries: usize },
    Rebuilding,
}

enum CacheState {
    Unloaded,
    Valid(CachedVectors),
    Rebuilding,
}

struct CacheInner {
    state: CacheState,
    /// Bumped every time a rebuild runs to completion, successful or not.
    generation: u64,
    last_failure: Option<ServiceError>,
}

/// Owns the corpus embedding snapshot and keeps it aligned with the corpus.
///
/// The snapshot is accepted only when its length equals the corpus length;
/// otherwise the whole corpus is re-embedded in one provider call and the
/// file is replaced. Concurrent callers that find the cache invalid queue on
/// a single rebuild gate, so at most one rebuild is in flight and everyone
/// queued behind it receives its outcome, failures included.
pub struct EmbeddingCacheManager<E> {
    corpus: Arc<Corpus>,
    provider: Arc<E>,
    storage: EmbeddingStorage,
    inner: Mutex<CacheInner>,
    rebuild_gate: tokio::sync::Mutex<()>,
}

impl<E: EmbeddingProvider> EmbeddingCacheManager<E> {
    pub fn new(corpus: Arc<Corpus>, provider: Arc<E>, storage: EmbeddingStorage) -> Self {
        Self {
            corpus,
            provider,
            storage,
            inner: Mutex::new(CacheInner {
                state: CacheState::Unloaded,
                generation: 0,
                last_failure: None,
            }),
            rebuild_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn provider(&self) -> &Arc<E> {
        &self.provider
    }

    pub fn storage(&self) -> &EmbeddingStorage {
        &self.storage
    }

    pub fn status(&self) -> CacheStatus {
        match &lock(&self.inner).state {
            CacheState::Unloaded => CacheStatus::Unloaded,
            CacheState::Valid(vectors) => CacheStatus::Valid {
                entries: vectors.len(),
            },
            CacheState::Rebuilding => CacheStatus::Rebuilding,
        }
    }

    /// Return vectors index-aligned with the corpus, loading or rebuilding as needed.
    pub async fn ensure_valid(&self) -> Result<CachedVectors, ServiceError> {
        let observed = {
            let inner = lock(&self.inner);
            if let CacheState::Valid(vectors) = &inner.state {
                return Ok(Arc::clone(vectors));
            }
            inner.generation
        };

        let _gate = self.rebuild_gate.lock().await;
        {
            let inner = lock(&self.inner);
            if let CacheState::Valid(vectors) = &inner.state {
                return Ok(Arc::clone(vectors));
            }
            if inner.generation != observed {
                if let Some(err) = &inner.last_failure {
                    return Err(err.clone());
                }
            }
        }

        let mut flight = RebuildFlight::begin(&self.inner);
        let outcome = self.load_or_rebuild().await.map(Arc::new);
        flight.finish(&outcome);
        outcome
    }

    /// Forget the in-memory snapshot; the next `ensure_valid` goes back to disk.
    pub async fn invalidate(&self) {
        let _gate = self.rebuild_gate.lock().await;
        let mut inner = lock(&self.inner);
        inner.state = CacheState::Unloaded;
        inner.last_failure = None;
    }

    async fn load_or_rebuild(&self) -> Result<Vec<EmbeddingVector>, ServiceError> {
        let expected = self.corpus.len();
        match self.storage.load().await {
            Ok(Some(vectors)) if vectors.len() == expected => {
                tracing::debug!(entries = expected, "embedding cache hit");
                return Ok(vectors);
            }
            Ok(Some(vectors)) => tracing::info!(
                cached = vectors.len(),
                corpus = expected,
                "embedding cache size mismatch, rebuilding"
            ),
            Ok(None) => tracing::info!("no embedding cache at {:?}, building", self.storage.path()),
            Err(e) => tracing::warn!("ignoring unreadable embedding cache: {e}"),
        }

        let texts = self.corpus.embedding_texts();
        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            self.provider.embed(&texts).await?
        };
        if vectors.len() != texts.len() {
            return Err(ProviderError::Decode(format!(
                "embedded {} corpus entries but received {} vectors",
                texts.len(),
                vectors.len()
            ))
            .into());
        }

        self.storage.save(&vectors).await?;
        tracing::info!(entries = vectors.len(), "embedding cache rebuilt");
        Ok(vectors)
    }
}

/// Marks the cache `Rebuilding` for as long as it lives. Dropped without
/// `finish` (the caller's future was cancelled) it puts the cache back to
/// `Unloaded` and leaves the generation alone, so queued callers rebuild.
struct RebuildFlight<'a> {
    inner: &'a Mutex<CacheInner>,
    finished: bool,
}

impl<'a> RebuildFlight<'a> {
    fn begin(inner: &'a Mutex<CacheInner>) -> Self {
        lock(inner).state = CacheState::Rebuilding;
        Self {
            inner,
            finished: false,
        }
    }

    fn finish(&mut self, outcome: &Result<CachedVectors, ServiceError>) {
        let mut inner = lock(self.inner);
        match outcome {
            Ok(vectors) => {
                inner.state = CacheState::Valid(Arc::clone(vectors));
                inner.last_failure = None;
            }
            Err(err) => {
                inner.state = CacheState::Unloaded;
                inner.last_failure = Some(err.clone());
            }
        }
        inner.generation += 1;
        self.finished = true;
    }
}

impl Drop for RebuildFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!("embedding cache rebuild cancelled");
            lock(self.inner).state = CacheState::Unloaded;
        }
    }
}

fn lock(inner: &Mutex<CacheInner>) -> MutexGuard<'_, CacheInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}
