//! Backend worker: owns the tokio runtime and the collection controller.

use std::{path::PathBuf, sync::Arc, thread};

use anyhow::Context;
use client_core::{
    config::{load_settings, normalize_collection_path, DEFAULT_SETTINGS_FILE},
    ClientEvent, HttpRemoteStore, InMemoryRemoteStore, ItemsController, MissingRemoteStore,
    RemoteStore,
};
use crossbeam_channel::{Receiver, Sender};
use shared::domain::RecordFields;
use tokio::sync::broadcast::error::RecvError;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// Where the backend worker keeps the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSelection {
    InMemory,
    Remote {
        config_path: Option<PathBuf>,
        base_url: Option<String>,
        collection_path: Option<String>,
    },
}

pub fn resolve_store(selection: &StoreSelection) -> anyhow::Result<Arc<dyn RemoteStore>> {
    match selection {
        StoreSelection::InMemory => {
            tracing::info!("using in-memory record store");
            Ok(Arc::new(InMemoryRemoteStore::new()))
        }
        StoreSelection::Remote {
            config_path,
            base_url,
            collection_path,
        } => {
            let config_path = config_path.clone().or_else(user_settings_path);
            let mut settings = load_settings(config_path.as_deref())?;
            if let Some(base_url) = base_url {
                settings.base_url = base_url.clone();
            }
            if let Some(collection_path) = collection_path {
                settings.collection_path = normalize_collection_path(collection_path);
            }
            let store = HttpRemoteStore::from_settings(&settings)
                .context("failed to configure remote record store")?;
            tracing::info!(collection = %store.collection_url(), "using remote record store");
            Ok(Arc::new(store))
        }
    }
}

/// `<config dir>/record_crud/store.toml`, when no `store.toml` sits in the working directory.
fn user_settings_path() -> Option<PathBuf> {
    if PathBuf::from(DEFAULT_SETTINGS_FILE).exists() {
        return None;
    }
    let candidate = dirs::config_dir()?
        .join("record_crud")
        .join(DEFAULT_SETTINGS_FILE);
    candidate.exists().then_some(candidate)
}

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, selection: StoreSelection) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let store: Arc<dyn RemoteStore> = match resolve_store(&selection) {
                Ok(store) => store,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("{err:#}"),
                    )));
                    tracing::error!("failed to configure record store: {err:#}");
                    Arc::new(MissingRemoteStore)
                }
            };

            let controller = ItemsController::new(store);
            let events = controller.subscribe_events();
            let forward_tx = ui_tx.clone();
            tokio::task::spawn_blocking(move || forward_client_events(events, forward_tx));
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                let controller = controller.clone();
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    if let Some(message) = run_command(&controller, cmd).await {
                        let _ = ui_tx.try_send(UiEvent::Info(message));
                    }
                });
            }
            tracing::info!("ui command queue closed; backend worker exiting");
        });
    });
}

/// Runs on a blocking thread and waits for room in the UI queue, so no
/// snapshot is dropped while the window is not draining events. If the UI
/// falls far enough behind the broadcast skips old events but still delivers
/// the newest ones.
fn forward_client_events(
    mut events: tokio::sync::broadcast::Receiver<ClientEvent>,
    ui_tx: Sender<UiEvent>,
) {
    loop {
        let event = match events.blocking_recv() {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "ui event forwarder lagged behind controller");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        let evt = match event {
            ClientEvent::OperationRequested(kind) => UiEvent::OperationStarted(kind),
            ClientEvent::CollectionChanged(state) => UiEvent::CollectionChanged(state),
            ClientEvent::OperationFailed(failure) => UiEvent::Error(UiError::from_failure(&failure)),
        };
        if ui_tx.send(evt).is_err() {
            tracing::debug!("ui event queue closed; stopping event forwarder");
            break;
        }
    }
}

/// Runs one command to completion. Failures reach the UI through the
/// controller's event stream, so only a success message is returned.
pub async fn run_command(controller: &ItemsController, cmd: BackendCommand) -> Option<String> {
    let outcome = match cmd {
        BackendCommand::Load => controller
            .load()
            .await
            .map(|count| format!("Loaded {count} records")),
        BackendCommand::Create { name, description } => controller
            .create(RecordFields::new(name, description))
            .await
            .map(|record| format!("Added \"{}\"", record.name)),
        BackendCommand::Update {
            id,
            name,
            description,
        } => controller
            .update(id, RecordFields::new(name, description))
            .await
            .map(|replaced| {
                if replaced {
                    "Record saved".to_string()
                } else {
                    "Record saved remotely but is no longer listed".to_string()
                }
            }),
        BackendCommand::Delete { id } => controller
            .delete(id)
            .await
            .map(|_| "Record deleted".to_string()),
    };

    match outcome {
        Ok(message) => Some(message),
        Err(err) => {
            tracing::debug!(error = %err, "backend command failed");
            None
        }
    }
}
