use std::sync::Arc;

use async_trait::async_trait;
use shared::domain::{Record, RecordFields, RecordId};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod config;
pub mod error;
mod http_store;
mod memory_store;
pub mod state;

pub use error::StoreError;
pub use http_store::HttpRemoteStore;
pub use memory_store::InMemoryRemoteStore;
pub use state::{CollectionState, OperationFailure, OperationKind};

use state::{reduce, CollectionAction};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The four collection operations the controller consumes from a document store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Record>, StoreError>;
    async fn create(&self, fields: &RecordFields) -> Result<RecordId, StoreError>;
    async fn replace_fields(&self, id: &RecordId, fields: &RecordFields) -> Result<(), StoreError>;
    async fn remove(&self, id: &RecordId) -> Result<(), StoreError>;
}

pub struct MissingRemoteStore;

#[async_trait]
impl RemoteStore for MissingRemoteStore {
    async fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn create(&self, _fields: &RecordFields) -> Result<RecordId, StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn replace_fields(
        &self,
        _id: &RecordId,
        _fields: &RecordFields,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn remove(&self, _id: &RecordId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    OperationRequested(OperationKind),
    CollectionChanged(CollectionState),
    OperationFailed(OperationFailure),
}

/// Owns the local mirror of the remote collection.
///
/// Each operation performs exactly one remote call and touches local state
/// only once that call has resolved. Operations may run concurrently; their
/// completions are applied one at a time under the state lock, so racing
/// updates to the same record resolve last-completed-wins.
pub struct ItemsController {
    store: Arc<dyn RemoteStore>,
    state: Mutex<CollectionState>,
    events: broadcast::Sender<ClientEvent>,
}

impl ItemsController {
    pub fn new(store: Arc<dyn RemoteStore>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            store,
            state: Mutex::new(CollectionState::default()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> CollectionState {
        self.state.lock().await.clone()
    }

    /// Replaces the local collection with the remote one. Returns the record count.
    pub async fn load(&self) -> Result<usize, StoreError> {
        self.requested(OperationKind::Load).await;
        match self.store.list_all().await {
            Ok(records) => {
                let count = records.len();
                self.apply(CollectionAction::Loaded(records)).await;
                info!(count, "collection loaded");
                Ok(count)
            }
            Err(err) => Err(self.fail(OperationKind::Load, err).await),
        }
    }

    pub async fn create(&self, fields: RecordFields) -> Result<Record, StoreError> {
        self.requested(OperationKind::Create).await;
        match self.store.create(&fields).await {
            Ok(id) => {
                let record = Record::from_parts(id, fields);
                self.apply(CollectionAction::Created(record.clone())).await;
                info!(record_id = %record.id, "record created");
                Ok(record)
            }
            Err(err) => Err(self.fail(OperationKind::Create, err).await),
        }
    }

    /// Returns whether a local record with `id` existed and was replaced.
    pub async fn update(&self, id: RecordId, fields: RecordFields) -> Result<bool, StoreError> {
        self.requested(OperationKind::Update).await;
        match self.store.replace_fields(&id, &fields).await {
            Ok(()) => {
                let replaced = self
                    .apply(CollectionAction::Updated(Record::from_parts(id.clone(), fields)))
                    .await;
                info!(record_id = %id, replaced, "record updated");
                Ok(replaced)
            }
            Err(err) => Err(self.fail(OperationKind::Update, err).await),
        }
    }

    /// Returns whether a local record with `id` existed and was removed.
    pub async fn delete(&self, id: RecordId) -> Result<bool, StoreError> {
        self.requested(OperationKind::Delete).await;
        match self.store.remove(&id).await {
            Ok(()) => {
                let removed = self.apply(CollectionAction::Deleted(id.clone())).await;
                info!(record_id = %id, removed, "record deleted");
                Ok(removed)
            }
            Err(err) => Err(self.fail(OperationKind::Delete, err).await),
        }
    }

    async fn requested(&self, kind: OperationKind) {
        let _ = self.events.send(ClientEvent::OperationRequested(kind));
        if kind == OperationKind::Load {
            self.apply(CollectionAction::LoadRequested).await;
        }
    }

    async fn apply(&self, action: CollectionAction) -> bool {
        let mut guard = self.state.lock().await;
        let changed = reduce(&mut guard, action);
        // Sent under the lock so subscribers observe snapshots in apply order.
        let _ = self.events.send(ClientEvent::CollectionChanged(guard.clone()));
        changed
    }

    async fn fail(&self, kind: OperationKind, err: StoreError) -> StoreError {
        warn!(operation = kind.label(), error = %err, "remote operation failed");
        let failure = OperationFailure {
            kind,
            code: err.code(),
            message: err.to_string(),
        };
        self.apply(CollectionAction::Failed(failure.clone())).await;
        let _ = self.events.send(ClientEvent::OperationFailed(failure));
        err
    }
}

#[cfg(test)]
mod tests;
