//! Record synchronizer: keeps the listing in step with the store.
//!
//! The listing is only ever replaced wholesale by a fresh fetch. Mutations
//! never patch it locally; they re-fetch once the store has accepted them.
//!
//! Several forms can be open at once, so edit sessions are tracked per form
//! token. A mutation closes only the form it was submitted from.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use domains::{Boulder, BoulderRepository, DomainError, Result};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// What an open form is doing. Forms without an entry are `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditSession {
    #[default]
    Closed,
    Creating,
    Editing(Uuid),
}

pub struct BoulderSynchronizer {
    repo: Arc<dyn BoulderRepository>,
    boulders: RwLock<Arc<Vec<Boulder>>>,
    sessions: Mutex<HashMap<Uuid, EditSession>>,
    loading: AtomicBool,
}

impl BoulderSynchronizer {
    pub fn new(repo: Arc<dyn BoulderRepository>) -> Self {
        Self {
            repo,
            boulders: RwLock::new(Arc::new(Vec::new())),
            sessions: Mutex::new(HashMap::new()),
            loading: AtomicBool::new(false),
        }
    }

    /// Fetches every boulder ordered by name and replaces the listing.
    ///
    /// On failure the listing becomes empty and [`DomainError::Fetch`] is
    /// returned. No retry.
    pub async fn list(&self) -> Result<Arc<Vec<Boulder>>> {
        self.loading.store(true, Ordering::Release);
        let fetched = self.repo.list_ordered_by_name().await;
        self.loading.store(false, Ordering::Release);

        match fetched {
            Ok(boulders) => {
                let boulders = Arc::new(boulders);
                tracing::debug!(count = boulders.len(), "boulders fetched");
                *self.boulders.write().await = boulders.clone();
                Ok(boulders)
            }
            Err(err) => {
                let reason = format!("{err:#}");
                tracing::error!(error = %reason, "error fetching boulders");
                *self.boulders.write().await = Arc::new(Vec::new());
                Err(DomainError::Fetch(reason))
            }
        }
    }

    /// Inserts a draft, re-fetches the listing and closes `form`.
    pub async fn create(&self, form: Uuid, draft: &Boulder) -> Result<()> {
        if let Err(err) = self.repo.insert(draft).await {
            let reason = format!("{err:#}");
            tracing::error!(name = %draft.name, error = %reason, "error creating boulder");
            return Err(DomainError::Persist(reason));
        }
        tracing::info!(name = %draft.name, "boulder created");
        self.after_mutation(form).await;
        Ok(())
    }

    /// Replaces the stored record with the same id, re-fetches the listing
    /// and closes `form`. A record without id never reaches the store.
    pub async fn update(&self, form: Uuid, boulder: &Boulder) -> Result<()> {
        let Some(id) = boulder.id else {
            tracing::error!(name = %boulder.name, "update called on a draft");
            return Err(DomainError::MissingIdentifier);
        };
        if let Err(err) = self.repo.update(boulder).await {
            let reason = format!("{err:#}");
            tracing::error!(%id, error = %reason, "error updating boulder");
            return Err(DomainError::Persist(reason));
        }
        tracing::info!(%id, "boulder updated");
        self.after_mutation(form).await;
        Ok(())
    }

    /// Creates drafts, updates persisted records.
    pub async fn submit(&self, form: Uuid, boulder: &Boulder) -> Result<()> {
        if boulder.is_persisted() {
            self.update(form, boulder).await
        } else {
            self.create(form, boulder).await
        }
    }

    async fn after_mutation(&self, form: Uuid) {
        // A failed refresh has already been logged and emptied the listing;
        // the mutation itself succeeded.
        let _ = self.list().await;
        self.cancel(form).await;
    }

    /// Current listing without touching the store.
    pub async fn boulders(&self) -> Arc<Vec<Boulder>> {
        self.boulders.read().await.clone()
    }

    pub async fn find(&self, id: Uuid) -> Option<Boulder> {
        self.boulders
            .read()
            .await
            .iter()
            .find(|b| b.id == Some(id))
            .cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub async fn session(&self, form: Uuid) -> EditSession {
        self.sessions
            .lock()
            .await
            .get(&form)
            .copied()
            .unwrap_or_default()
    }

    pub async fn begin_create(&self, form: Uuid) {
        self.sessions.lock().await.insert(form, EditSession::Creating);
    }

    pub async fn begin_edit(&self, form: Uuid, id: Uuid) {
        self.sessions.lock().await.insert(form, EditSession::Editing(id));
    }

    pub async fn cancel(&self, form: Uuid) {
        self.sessions.lock().await.remove(&form);
    }

    /// Number of forms not yet closed.
    pub async fn open_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use domains::{MockBoulderRepository, StyleValue};
    use mockall::Sequence;

    use super::*;

    fn named(name: &str) -> Boulder {
        Boulder {
            id: Some(Uuid::new_v4()),
            name: name.to_string(),
            ..Boulder::default()
        }
    }

    #[tokio::test]
    async fn list_replaces_the_listing() {
        let mut repo = MockBoulderRepository::new();
        repo.expect_list_ordered_by_name()
            .returning(|| Ok(vec![named("Arista"), named("Bloque X")]));
        let sync = BoulderSynchronizer::new(Arc::new(repo));

        let listed = sync.list().await.unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(sync.boulders().await.len(), 2);
        assert!(!sync.is_loading());
    }

    #[tokio::test]
    async fn failed_fetch_leaves_an_empty_listing() {
        let mut repo = MockBoulderRepository::new();
        let mut seq = Sequence::new();
        repo.expect_list_ordered_by_name()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![named("Arista")]));
        repo.expect_list_ordered_by_name()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(anyhow::anyhow!("connection reset")));
        let sync = BoulderSynchronizer::new(Arc::new(repo));

        sync.list().await.unwrap();
        let err = sync.list().await.unwrap_err();

        assert!(matches!(err, DomainError::Fetch(_)));
        assert!(sync.boulders().await.is_empty());
    }

    #[tokio::test]
    async fn create_inserts_once_then_refreshes() {
        let mut repo = MockBoulderRepository::new();
        let mut seq = Sequence::new();
        repo.expect_insert()
            .withf(|b| {
                b.id.is_none()
                    && b.name == "Bloque X"
                    && b.style == Some(StyleValue::Text(r#"["Dynamic","Technical"]"#.into()))
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        repo.expect_list_ordered_by_name()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![named("Arista"), named("Bloque X"), named("Cueva")]));
        let sync = BoulderSynchronizer::new(Arc::new(repo));
        let form = Uuid::new_v4();
        sync.begin_create(form).await;

        let draft = Boulder {
            name: "Bloque X".into(),
            quality: Some(80),
            style: Some(StyleValue::Text(r#"["Dynamic","Technical"]"#.into())),
            ..Boulder::default()
        };
        sync.submit(form, &draft).await.unwrap();

        let names: Vec<_> = sync.boulders().await.iter().map(|b| b.name.clone()).collect();
        assert_eq!(names, ["Arista", "Bloque X", "Cueva"]);
        assert_eq!(sync.session(form).await, EditSession::Closed);
    }

    #[tokio::test]
    async fn update_without_id_never_reaches_the_store() {
        let mut repo = MockBoulderRepository::new();
        repo.expect_update().never();
        repo.expect_insert().never();
        repo.expect_list_ordered_by_name().never();
        let sync = BoulderSynchronizer::new(Arc::new(repo));

        let err = sync
            .update(Uuid::new_v4(), &Boulder {
                name: "Sin id".into(),
                ..Boulder::default()
            })
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::MissingIdentifier);
    }

    #[tokio::test]
    async fn submit_updates_persisted_records_by_id() {
        let target = named("Arista");
        let id = target.id;
        let mut repo = MockBoulderRepository::new();
        repo.expect_update()
            .withf(move |b| b.id == id)
            .times(1)
            .returning(|_| Ok(()));
        repo.expect_insert().never();
        repo.expect_list_ordered_by_name()
            .times(1)
            .returning(|| Ok(Vec::new()));
        let sync = BoulderSynchronizer::new(Arc::new(repo));
        let form = Uuid::new_v4();
        sync.begin_edit(form, id.unwrap()).await;

        sync.submit(form, &target).await.unwrap();
        assert_eq!(sync.session(form).await, EditSession::Closed);
    }

    #[tokio::test]
    async fn failed_save_keeps_the_session_open() {
        let mut repo = MockBoulderRepository::new();
        repo.expect_update()
            .returning(|_| Err(anyhow::anyhow!("row locked")));
        repo.expect_list_ordered_by_name().never();
        let sync = BoulderSynchronizer::new(Arc::new(repo));
        let target = named("Arista");
        let form = Uuid::new_v4();
        sync.begin_edit(form, target.id.unwrap()).await;

        let err = sync.update(form, &target).await.unwrap_err();

        assert!(matches!(err, DomainError::Persist(_)));
        assert_eq!(sync.session(form).await, EditSession::Editing(target.id.unwrap()));
    }

    #[tokio::test]
    async fn find_looks_in_the_current_listing() {
        let arista = named("Arista");
        let listed = vec![arista.clone()];
        let mut repo = MockBoulderRepository::new();
        repo.expect_list_ordered_by_name()
            .returning(move || Ok(listed.clone()));
        let sync = BoulderSynchronizer::new(Arc::new(repo));

        assert_eq!(sync.find(arista.id.unwrap()).await, None);
        sync.list().await.unwrap();
        assert_eq!(sync.find(arista.id.unwrap()).await, Some(arista));
    }

    #[tokio::test]
    async fn saving_one_form_leaves_the_others_open() {
        let mut repo = MockBoulderRepository::new();
        repo.expect_insert().times(1).returning(|_| Ok(()));
        repo.expect_list_ordered_by_name()
            .returning(|| Ok(vec![named("Bloque X")]));
        let sync = BoulderSynchronizer::new(Arc::new(repo));
        let creating = Uuid::new_v4();
        let editing = Uuid::new_v4();
        let edited = Uuid::new_v4();
        sync.begin_create(creating).await;
        sync.begin_edit(editing, edited).await;

        sync.submit(
            creating,
            &Boulder {
                name: "Bloque X".into(),
                ..Boulder::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(sync.session(creating).await, EditSession::Closed);
        assert_eq!(sync.session(editing).await, EditSession::Editing(edited));

        sync.cancel(editing).await;
        assert_eq!(sync.open_sessions().await, 0);
    }
}
