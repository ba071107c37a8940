use crate::domain::errors::BoxError;
use crate::ports::engine::{EngineLoader, TranscodeEngine};
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OnceCell};
use tracing::{debug, info};

/// Lazily loaded engine shared by every preprocessing call.
///
/// The first successful load is kept for the life of the holder. A failed
/// load leaves it empty so the next call tries again. Concurrent first
/// callers wait on a single load instead of starting their own.
///
/// Access is exclusive: a lease holds a lock until dropped, so two
/// transcodes never share the engine's file namespace at the same time.
pub struct SharedEngine<L> {
    loader: L,
    engine: OnceCell<Arc<dyn TranscodeEngine>>,
    exclusive: Mutex<()>,
}

/// Exclusive use of the loaded engine.
pub struct EngineLease<'a> {
    engine: Arc<dyn TranscodeEngine>,
    _guard: MutexGuard<'a, ()>,
}

impl Deref for EngineLease<'_> {
    type Target = dyn TranscodeEngine;

    fn deref(&self) -> &Self::Target {
        self.engine.as_ref()
    }
}

impl<L: EngineLoader> SharedEngine<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            engine: OnceCell::new(),
            exclusive: Mutex::new(()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.engine.initialized()
    }

    /// Loads the engine if needed, then waits for exclusive use of it.
    pub async fn acquire(&self) -> Result<EngineLease<'_>, BoxError> {
        let engine = self
            .engine
            .get_or_try_init(|| async {
                debug!("Loading transcoding engine");
                let engine = self.loader.load().await?;
                info!("Transcoding engine ready");
                Ok::<_, BoxError>(engine)
            })
            .await?
            .clone();

        let guard = self.exclusive.lock().await;
        Ok(EngineLease {
            engine,
            _guard: guard,
        })
    }
}
