//! Request/response bodies exchanged with the collection endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::{Record, RecordId};

pub const DEFAULT_COLLECTION_PATH: &str = "/items";

/// Body returned by the store after it assigned an id to a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRecordResponse {
    pub id: RecordId,
}

pub type ListRecordsResponse = Vec<Record>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_response_reads_bare_id() {
        let body: CreateRecordResponse = serde_json::from_str(r#"{"id":"new-7"}"#).expect("body");
        assert_eq!(body.id, RecordId::new("new-7"));
    }
}
