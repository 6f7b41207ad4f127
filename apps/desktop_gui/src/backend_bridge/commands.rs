//! Backend commands queued from UI to backend worker.

use shared::domain::RecordId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    Load,
    Create {
        name: String,
        description: String,
    },
    Update {
        id: RecordId,
        name: String,
        description: String,
    },
    Delete {
        id: RecordId,
    },
}
