//! Local mirror of the remote collection and the transitions applied to it.
//!
//! Every change to [`CollectionState`] goes through [`reduce`], which the
//! controller calls only after the matching remote call has resolved.

use shared::{
    domain::{Record, RecordId},
    error::ErrorCode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Load,
    Create,
    Update,
    Delete,
}

impl OperationKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFailure {
    pub kind: OperationKind,
    pub code: Option<ErrorCode>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionState {
    pub items: Vec<Record>,
    pub loading: bool,
    pub last_failure: Option<OperationFailure>,
}

impl CollectionState {
    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum CollectionAction {
    LoadRequested,
    Loaded(Vec<Record>),
    Created(Record),
    Updated(Record),
    Deleted(RecordId),
    Failed(OperationFailure),
}

/// Applies `action` to `state`. Returns whether the record list changed.
pub fn reduce(state: &mut CollectionState, action: CollectionAction) -> bool {
    match action {
        CollectionAction::LoadRequested => {
            state.loading = true;
            false
        }
        CollectionAction::Loaded(records) => {
            state.items = dedupe_keep_last(records);
            state.loading = false;
            clear_failure(state, OperationKind::Load);
            true
        }
        CollectionAction::Created(record) => {
            clear_failure(state, OperationKind::Create);
            match state.items.iter_mut().find(|item| item.id == record.id) {
                Some(existing) => *existing = record,
                None => state.items.push(record),
            }
            true
        }
        CollectionAction::Updated(record) => {
            clear_failure(state, OperationKind::Update);
            match state.items.iter().position(|item| item.id == record.id) {
                Some(index) => {
                    state.items[index] = record;
                    true
                }
                None => false,
            }
        }
        CollectionAction::Deleted(id) => {
            clear_failure(state, OperationKind::Delete);
            let before = state.items.len();
            state.items.retain(|item| item.id != id);
            state.items.len() != before
        }
        CollectionAction::Failed(failure) => {
            if failure.kind == OperationKind::Load {
                state.loading = false;
            }
            state.last_failure = Some(failure);
            false
        }
    }
}

fn clear_failure(state: &mut CollectionState, kind: OperationKind) {
    if state
        .last_failure
        .as_ref()
        .is_some_and(|failure| failure.kind == kind)
    {
        state.last_failure = None;
    }
}

fn dedupe_keep_last(records: Vec<Record>) -> Vec<Record> {
    let mut out: Vec<Record> = Vec::with_capacity(records.len());
    for record in records {
        match out.iter_mut().find(|item| item.id == record.id) {
            Some(existing) => *existing = record,
            None => out.push(record),
        }
    }
    out
}
