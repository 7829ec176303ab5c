//! Shared application state for the HTTP server.
use std::sync::Arc;

use tokio::sync::Mutex as TokioMutex;

use crate::agent::DocAgent;
use crate::config::Config;
use crate::embedder::Embedder;
use crate::store::Store;

/// Shared state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: TokioMutex<Store>,
    collection_id: i64,
    embedder: Arc<dyn Embedder>,
    agent: DocAgent,
    config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Store,
        collection_id: i64,
        embedder: Arc<dyn Embedder>,
        agent: DocAgent,
        config: Arc<Config>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store: TokioMutex::new(store),
                collection_id,
                embedder,
                agent,
                config,
            }),
        }
    }

    pub fn store(&self) -> &TokioMutex<Store> {
        &self.inner.store
    }

    pub fn collection_id(&self) -> i64 {
        self.inner.collection_id
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.inner.embedder.as_ref()
    }

    pub fn agent(&self) -> &DocAgent {
        &self.inner.agent
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}
