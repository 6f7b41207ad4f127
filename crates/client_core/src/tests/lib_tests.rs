use super::*;
use futures::future::join_all;
use shared::error::ErrorCode;

struct FailingStore {
    status: u16,
}

#[async_trait]
impl RemoteStore for FailingStore {
    async fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        Err(StoreError::Status {
            status: self.status,
        })
    }

    async fn create(&self, _fields: &RecordFields) -> Result<RecordId, StoreError> {
        Err(StoreError::Status {
            status: self.status,
        })
    }

    async fn replace_fields(
        &self,
        _id: &RecordId,
        _fields: &RecordFields,
    ) -> Result<(), StoreError> {
        Err(StoreError::Status {
            status: self.status,
        })
    }

    async fn remove(&self, _id: &RecordId) -> Result<(), StoreError> {
        Err(StoreError::Status {
            status: self.status,
        })
    }
}

fn record(id: &str, name: &str, description: &str) -> Record {
    Record::from_parts(RecordId::new(id), RecordFields::new(name, description))
}

fn sorted_ids(records: &[Record]) -> Vec<String> {
    let mut ids: Vec<String> = records.iter().map(|r| r.id.0.clone()).collect();
    ids.sort();
    ids
}

fn seeded_controller(records: Vec<Record>) -> (Arc<InMemoryRemoteStore>, Arc<ItemsController>) {
    let store = Arc::new(InMemoryRemoteStore::with_records(records));
    let controller = ItemsController::new(store.clone());
    (store, controller)
}

#[tokio::test]
async fn load_mirrors_remote_collection() {
    let remote = vec![
        record("a", "first", "1"),
        record("b", "second", "2"),
        record("c", "third", "3"),
    ];
    let (_store, controller) = seeded_controller(remote.clone());

    let count = controller.load().await.expect("load");

    let state = controller.snapshot().await;
    assert_eq!(count, 3);
    assert!(!state.loading);
    assert_eq!(sorted_ids(&state.items), sorted_ids(&remote));
    for expected in &remote {
        assert_eq!(state.get(&expected.id), Some(expected));
    }
}

#[tokio::test]
async fn load_replaces_previous_local_contents() {
    let (store, controller) = seeded_controller(vec![record("a", "1", "1")]);
    controller.load().await.expect("first load");

    store.remove(&RecordId::new("a")).await.expect("remote remove");
    store
        .create(&RecordFields::new("fresh", "row"))
        .await
        .expect("remote create");
    controller.load().await.expect("second load");

    let state = controller.snapshot().await;
    assert_eq!(state.len(), 1);
    assert_eq!(state.items[0].name, "fresh");
}

#[tokio::test]
async fn create_appends_record_with_store_assigned_id() {
    let (store, controller) = seeded_controller(vec![record("a", "1", "1")]);
    controller.load().await.expect("load");

    let created = controller
        .create(RecordFields::new("A", "B"))
        .await
        .expect("create");

    let state = controller.snapshot().await;
    assert_eq!(state.len(), 2);
    assert_eq!(created.fields(), RecordFields::new("A", "B"));
    assert_eq!(state.get(&created.id), Some(&created));

    let remote = store.records().await;
    assert!(remote.iter().any(|r| r.id == created.id));
}

#[tokio::test]
async fn update_replaces_only_matching_record() {
    let (_store, controller) =
        seeded_controller(vec![record("x", "a", "b"), record("y", "keep", "me")]);
    controller.load().await.expect("load");

    let replaced = controller
        .update(RecordId::new("x"), RecordFields::new("C", "D"))
        .await
        .expect("update");

    let state = controller.snapshot().await;
    assert!(replaced);
    assert_eq!(state.get(&RecordId::new("x")), Some(&record("x", "C", "D")));
    assert_eq!(
        state.get(&RecordId::new("y")),
        Some(&record("y", "keep", "me"))
    );
    assert_eq!(state.len(), 2);
}

#[tokio::test]
async fn update_of_record_missing_locally_leaves_collection_unchanged() {
    // Remote knows "x" but the local mirror was never loaded.
    let (_store, controller) = seeded_controller(vec![record("x", "a", "b")]);

    let replaced = controller
        .update(RecordId::new("x"), RecordFields::new("C", "D"))
        .await
        .expect("remote update succeeds");

    assert!(!replaced);
    assert!(controller.snapshot().await.is_empty());
}

#[tokio::test]
async fn update_of_unknown_remote_id_fails_without_touching_state() {
    let (_store, controller) = seeded_controller(vec![record("x", "a", "b")]);
    controller.load().await.expect("load");
    let before = controller.snapshot().await.items;

    let err = controller
        .update(RecordId::new("ghost"), RecordFields::new("C", "D"))
        .await
        .expect_err("unknown id");

    assert!(err.is_not_found());
    let state = controller.snapshot().await;
    assert_eq!(state.items, before);
    let failure = state.last_failure.expect("failure recorded");
    assert_eq!(failure.kind, OperationKind::Update);
    assert_eq!(failure.code, Some(ErrorCode::NotFound));
}

#[tokio::test]
async fn delete_removes_exactly_one_record() {
    let (store, controller) =
        seeded_controller(vec![record("x", "a", "b"), record("y", "c", "d")]);
    controller.load().await.expect("load");

    let removed = controller.delete(RecordId::new("x")).await.expect("delete");

    let state = controller.snapshot().await;
    assert!(removed);
    assert_eq!(state.len(), 1);
    assert!(state.get(&RecordId::new("x")).is_none());
    assert_eq!(store.records().await.len(), 1);
}

#[tokio::test]
async fn delete_of_unknown_id_leaves_collection_unchanged() {
    let (_store, controller) = seeded_controller(vec![record("x", "a", "b")]);
    controller.load().await.expect("load");

    let removed = controller
        .delete(RecordId::new("nope"))
        .await
        .expect("delete");

    assert!(!removed);
    assert_eq!(controller.snapshot().await.items, vec![record("x", "a", "b")]);
}

#[tokio::test]
async fn second_delete_of_same_id_is_noop() {
    let (_store, controller) =
        seeded_controller(vec![record("x", "a", "b"), record("y", "c", "d")]);
    controller.load().await.expect("load");

    assert!(controller.delete(RecordId::new("x")).await.expect("first"));
    let after_first = controller.snapshot().await.items;
    assert!(!controller.delete(RecordId::new("x")).await.expect("second"));

    assert_eq!(controller.snapshot().await.items, after_first);
}

#[tokio::test]
async fn create_update_delete_scenario() {
    let (_store, controller) = seeded_controller(Vec::new());
    controller.load().await.expect("load");

    let first = controller
        .create(RecordFields::new("N1", "D1"))
        .await
        .expect("create first");
    let second = controller
        .create(RecordFields::new("N2", "D2"))
        .await
        .expect("create second");
    controller
        .update(first.id.clone(), RecordFields::new("N1b", "D1"))
        .await
        .expect("update first");
    controller.delete(second.id).await.expect("delete second");

    let state = controller.snapshot().await;
    assert_eq!(
        state.items,
        vec![Record::from_parts(first.id, RecordFields::new("N1b", "D1"))]
    );
}

#[tokio::test]
async fn failed_load_clears_loading_and_keeps_items() {
    let controller = ItemsController::new(Arc::new(FailingStore { status: 503 }));
    let mut rx = controller.subscribe_events();

    let err = controller.load().await.expect_err("load fails");
    assert!(matches!(err, StoreError::Status { status: 503 }));

    let state = controller.snapshot().await;
    assert!(!state.loading);
    assert!(state.is_empty());
    let failure = state.last_failure.expect("failure recorded");
    assert_eq!(failure.kind, OperationKind::Load);
    assert_eq!(failure.code, Some(ErrorCode::Internal));

    let mut saw_failure = false;
    while let Ok(event) = rx.try_recv() {
        if let ClientEvent::OperationFailed(failure) = event {
            assert_eq!(failure.kind, OperationKind::Load);
            saw_failure = true;
        }
    }
    assert!(saw_failure, "expected an OperationFailed event");
}

#[tokio::test]
async fn failed_mutations_do_not_change_local_records() {
    let controller = ItemsController::new(Arc::new(FailingStore { status: 403 }));

    assert!(controller.create(RecordFields::new("a", "b")).await.is_err());
    assert!(controller
        .update(RecordId::new("x"), RecordFields::new("a", "b"))
        .await
        .is_err());
    assert!(controller.delete(RecordId::new("x")).await.is_err());

    let state = controller.snapshot().await;
    assert!(state.is_empty());
    assert_eq!(
        state.last_failure.map(|f| (f.kind, f.code)),
        Some((OperationKind::Delete, Some(ErrorCode::Forbidden)))
    );
}

#[tokio::test]
async fn load_emits_requested_then_loading_then_loaded_snapshots() {
    let (_store, controller) = seeded_controller(vec![record("a", "1", "1")]);
    let mut rx = controller.subscribe_events();

    controller.load().await.expect("load");

    match rx.recv().await.expect("requested") {
        ClientEvent::OperationRequested(kind) => assert_eq!(kind, OperationKind::Load),
        other => panic!("unexpected event: {other:?}"),
    }
    match rx.recv().await.expect("loading snapshot") {
        ClientEvent::CollectionChanged(state) => {
            assert!(state.loading);
            assert!(state.is_empty());
        }
        other => panic!("unexpected event: {other:?}"),
    }
    match rx.recv().await.expect("loaded snapshot") {
        ClientEvent::CollectionChanged(state) => {
            assert!(!state.loading);
            assert_eq!(state.len(), 1);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_creates_all_land_with_unique_ids() {
    let (_store, controller) = seeded_controller(Vec::new());

    let results = join_all((0..10).map(|i| {
        let controller = controller.clone();
        async move {
            controller
                .create(RecordFields::new(format!("n{i}"), format!("d{i}")))
                .await
        }
    }))
    .await;

    let state = controller.snapshot().await;
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(state.len(), 10);
    let mut ids = sorted_ids(&state.items);
    ids.dedup();
    assert_eq!(ids.len(), 10);
}

#[tokio::test]
async fn racing_updates_resolve_to_one_of_the_writes() {
    let (_store, controller) = seeded_controller(vec![record("x", "a", "b")]);
    controller.load().await.expect("load");

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move {
            controller
                .update(RecordId::new("x"), RecordFields::new("one", "1"))
                .await
        })
    };
    let second = {
        let controller = controller.clone();
        tokio::spawn(async move {
            controller
                .update(RecordId::new("x"), RecordFields::new("two", "2"))
                .await
        })
    };
    first.await.expect("join").expect("first update");
    second.await.expect("join").expect("second update");

    let state = controller.snapshot().await;
    let fields = state.get(&RecordId::new("x")).expect("record").fields();
    assert!(
        fields == RecordFields::new("one", "1") || fields == RecordFields::new("two", "2"),
        "unexpected fields: {fields:?}"
    );
    assert_eq!(state.len(), 1);
}

#[tokio::test]
async fn missing_store_reports_unavailable() {
    let controller = ItemsController::new(Arc::new(MissingRemoteStore));

    let err = controller.load().await.expect_err("unavailable");

    assert!(matches!(err, StoreError::Unavailable));
    assert_eq!(err.code(), None);
}
