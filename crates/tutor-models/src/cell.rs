//! One-time model initialization per task family.
//!
//! Each family (generation, translation, intent) owns a [`ModelCell`]. The
//! first caller triggers the load; concurrent callers wait on the same
//! in-flight load instead of starting their own. A failed load leaves the
//! cell empty so the next request retries. Loaded models are never evicted.
//!
//! # Example
//!
//! ```rust,no_run
//! use tutor_models::{InferencePool, ModelCell, ModelFamily, ModelSpec, Seq2SeqLoader, TextGenerator};
//!
//! # async fn run() -> tutor_models::Result<()> {
//! let pool = InferencePool::new(4);
//! let cell: ModelCell<dyn TextGenerator> =
//!     ModelCell::new(ModelFamily::Generation, Seq2SeqLoader::new(ModelSpec::default(), pool));
//!
//! // Loads only once
//! let model = cell.get().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::{ModelError, Result};

/// Task families that each get their own local model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// Answer, notes and quiz generation share one model.
    Generation,
    Translation,
    Intent,
}

impl ModelFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::Generation  => "generation",
            ModelFamily::Translation => "translation",
            ModelFamily::Intent      => "intent",
        }
    }
}

/// Produces a model instance. Called at most once per successful load.
#[async_trait]
pub trait ModelLoader<T: ?Sized + Send + Sync>: Send + Sync {
    fn model_id(&self) -> &str;
    async fn load(&self) -> Result<Arc<T>>;
}

/// Lazily-initialized, never-evicted model handle for one family.
///
/// The load runs on its own task, so a caller that gives up (deadline,
/// disconnect) never abandons it; the next caller joins the same load.
pub struct ModelCell<T: ?Sized + Send + Sync + 'static> {
    inner: Arc<CellInner<T>>,
}

struct CellInner<T: ?Sized + Send + Sync + 'static> {
    family: ModelFamily,
    loader: Box<dyn ModelLoader<T>>,
    model: OnceCell<Arc<T>>,
    load_attempts: AtomicUsize,
}

impl<T: ?Sized + Send + Sync + 'static> std::fmt::Debug for ModelCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCell")
            .field("family", &self.inner.family)
            .field("model_id", &self.inner.loader.model_id())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl<T: ?Sized + Send + Sync + 'static> CellInner<T> {
    async fn load_once(&self) -> Result<Arc<T>> {
        let loaded = self
            .model
            .get_or_try_init(|| async {
                self.load_attempts.fetch_add(1, Ordering::SeqCst);
                let start = Instant::now();
                info!(
                    family = self.family.as_str(),
                    model_id = self.loader.model_id(),
                    "Loading local model"
                );
                let model = self.loader.load().await?;
                info!(
                    family = self.family.as_str(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Local model ready"
                );
                Ok::<_, ModelError>(model)
            })
            .await;

        match loaded {
            Ok(model) => Ok(Arc::clone(model)),
            Err(e) => {
                warn!(family = self.family.as_str(), error = %e, "Local model load failed");
                Err(e)
            }
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> ModelCell<T> {
    pub fn new(family: ModelFamily, loader: impl ModelLoader<T> + 'static) -> Self {
        Self {
            inner: Arc::new(CellInner {
                family,
                loader: Box::new(loader),
                model: OnceCell::new(),
                load_attempts: AtomicUsize::new(0),
            }),
        }
    }

    /// Return the cached model, loading it on first use.
    ///
    /// Waiters share the in-flight initialization of the cell. Dropping the
    /// returned future detaches from the load without cancelling it.
    pub async fn get(&self) -> Result<Arc<T>> {
        if let Some(model) = self.inner.model.get() {
            debug!(family = self.inner.family.as_str(), "Model cache hit");
            return Ok(Arc::clone(model));
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.load_once().await }).await?
    }

    /// Load eagerly, e.g. to warm up at startup.
    pub async fn preload(&self) -> Result<()> {
        self.get().await.map(|_| ())
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.model.initialized()
    }

    /// Number of times the loader has been invoked (including failures).
    pub fn load_attempts(&self) -> usize {
        self.inner.load_attempts.load(Ordering::SeqCst)
    }

    pub fn family(&self) -> ModelFamily {
        self.inner.family
    }

    pub fn model_id(&self) -> &str {
        self.inner.loader.model_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    use crate::InferencePool;

    struct SlowLoader {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ModelLoader<String> for SlowLoader {
        fn model_id(&self) -> &str {
            "slow"
        }

        async fn load(&self) -> Result<Arc<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(Arc::new("weights".to_string()))
        }
    }

    struct FlakyLoader {
        failed_once: AtomicBool,
    }

    #[async_trait]
    impl ModelLoader<String> for FlakyLoader {
        fn model_id(&self) -> &str {
            "flaky"
        }

        async fn load(&self) -> Result<Arc<String>> {
            if !self.failed_once.swap(true, Ordering::SeqCst) {
                return Err(ModelError::Download("connection reset".to_string()));
            }
            Ok(Arc::new("weights".to_string()))
        }
    }

    struct BlockingLoader {
        pool: InferencePool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ModelLoader<String> for BlockingLoader {
        fn model_id(&self) -> &str {
            "blocking"
        }

        async fn load(&self) -> Result<Arc<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pool
                .run(|| {
                    std::thread::sleep(Duration::from_millis(300));
                    Ok(Arc::new("weights".to_string()))
                })
                .await
        }
    }

    #[tokio::test]
    async fn test_abandoned_first_caller_does_not_restart_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cell = ModelCell::new(
            ModelFamily::Translation,
            BlockingLoader { pool: InferencePool::new(2), calls: calls.clone() },
        );

        let first = tokio::time::timeout(Duration::from_millis(50), cell.get()).await;
        assert!(first.is_err());
        assert!(!cell.is_loaded());

        let model = cell.get().await.unwrap();
        assert_eq!(*model, "weights");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cell.load_attempts(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_use_loads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cell = Arc::new(ModelCell::new(
            ModelFamily::Generation,
            SlowLoader { calls: calls.clone() },
        ));

        let a = tokio::spawn({
            let cell = cell.clone();
            async move { cell.get().await }
        });
        let b = tokio::spawn({
            let cell = cell.clone();
            async move { cell.get().await }
        });

        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());
        assert_eq!(*a, "weights");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cell.load_attempts(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let cell = ModelCell::new(
            ModelFamily::Intent,
            FlakyLoader { failed_once: AtomicBool::new(false) },
        );

        assert!(cell.get().await.is_err());
        assert!(!cell.is_loaded());

        let model = cell.get().await.unwrap();
        assert_eq!(*model, "weights");
        assert!(cell.is_loaded());
        assert_eq!(cell.load_attempts(), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_does_not_reload() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cell = ModelCell::new(ModelFamily::Translation, SlowLoader { calls: calls.clone() });
        cell.preload().await.unwrap();
        cell.get().await.unwrap();
        cell.get().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cell.model_id(), "slow");
        assert_eq!(cell.family(), ModelFamily::Translation);
    }
}
