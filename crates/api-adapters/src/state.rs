use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use domains::{ImageConverter, UploadEndpoint};
use services::{BoulderSynchronizer, CatalogSettings, FormSession, StorageUploadEndpoint};
use uuid::Uuid;

/// How long an abandoned form stays open, and how many may be open at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormLimits {
    pub ttl: Duration,
    pub max_open: usize,
}

impl Default for FormLimits {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            max_open: 256,
        }
    }
}

/// Shared state available to every handler via `State<AppState>`.
///
/// Cheaply cloneable: everything behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<BoulderSynchronizer>,
    /// Open create/edit forms, keyed by the token embedded in their URLs.
    pub forms: Arc<DashMap<Uuid, Arc<FormSession>>>,
    pub converter: Arc<dyn ImageConverter>,
    /// Where form submissions send their photos.
    pub uploads: Arc<dyn UploadEndpoint>,
    /// Serves `POST /api/boulders`.
    pub upload_service: Arc<StorageUploadEndpoint>,
    pub settings: CatalogSettings,
    pub form_limits: FormLimits,
}

impl AppState {
    pub fn new(
        catalog: Arc<BoulderSynchronizer>,
        converter: Arc<dyn ImageConverter>,
        uploads: Arc<dyn UploadEndpoint>,
        upload_service: Arc<StorageUploadEndpoint>,
        settings: CatalogSettings,
    ) -> Self {
        Self {
            catalog,
            forms: Arc::new(DashMap::new()),
            converter,
            uploads,
            upload_service,
            settings,
            form_limits: FormLimits::default(),
        }
    }

    pub fn with_form_limits(mut self, form_limits: FormLimits) -> Self {
        self.form_limits = form_limits;
        self
    }

    /// Registers a form session under a fresh token, first evicting forms
    /// past their time to live and, when still full, the oldest ones.
    pub async fn open_form(&self, session: FormSession) -> (Uuid, Arc<FormSession>) {
        self.evict_stale().await;

        let token = Uuid::new_v4();
        let session = Arc::new(session);
        self.forms.insert(token, session.clone());
        (token, session)
    }

    pub fn form(&self, token: Uuid) -> Option<Arc<FormSession>> {
        self.forms.get(&token).map(|entry| entry.value().clone())
    }

    pub async fn close_form(&self, token: Uuid) {
        self.forms.remove(&token);
        self.catalog.cancel(token).await;
    }

    async fn evict_stale(&self) {
        let ttl = self.form_limits.ttl;
        let mut evicted = Vec::new();
        self.forms.retain(|token, session| {
            let alive = session.opened_at().elapsed() < ttl;
            if !alive {
                evicted.push(*token);
            }
            alive
        });

        // Leave room for the form about to be opened.
        let max_open = self.form_limits.max_open.max(1);
        while self.forms.len() >= max_open {
            let oldest = self
                .forms
                .iter()
                .min_by_key(|entry| entry.value().opened_at())
                .map(|entry| *entry.key());
            let Some(token) = oldest else { break };
            self.forms.remove(&token);
            evicted.push(token);
        }

        if evicted.is_empty() {
            return;
        }
        tracing::debug!(count = evicted.len(), "evicting abandoned forms");
        for token in evicted {
            self.catalog.cancel(token).await;
        }
    }
}
