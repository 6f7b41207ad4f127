use async_trait::async_trait;
use shared::domain::{Record, RecordFields, RecordId};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{error::StoreError, RemoteStore};

/// Process-local collection with document-store semantics: ids are assigned
/// on create, replacing an unknown id fails, removing an unknown id succeeds.
#[derive(Default)]
pub struct InMemoryRemoteStore {
    records: RwLock<Vec<Record>>,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().collect()),
        }
    }

    pub async fn records(&self) -> Vec<Record> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn create(&self, fields: &RecordFields) -> Result<RecordId, StoreError> {
        let id = RecordId::new(Uuid::new_v4().simple().to_string());
        self.records
            .write()
            .await
            .push(Record::from_parts(id.clone(), fields.clone()));
        Ok(id)
    }

    async fn replace_fields(&self, id: &RecordId, fields: &RecordFields) -> Result<(), StoreError> {
        let mut guard = self.records.write().await;
        let record = guard
            .iter_mut()
            .find(|record| &record.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;
        record.name = fields.name.clone();
        record.description = fields.description.clone();
        Ok(())
    }

    async fn remove(&self, id: &RecordId) -> Result<(), StoreError> {
        self.records.write().await.retain(|record| &record.id != id);
        Ok(())
    }
}
