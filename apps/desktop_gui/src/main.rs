use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::{
    commands::BackendCommand,
    runtime::{self, StoreSelection},
};
use clap::Parser;
use controller::events::UiEvent;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;
use ui::{CrudApp, APP_TITLE};

#[derive(Parser, Debug)]
#[command(about = "Edit a remote record collection")]
struct Args {
    /// Store settings file (defaults to ./store.toml).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the store base URL from settings.
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    collection_path: Option<String>,
    /// Keep records in process memory instead of a remote store.
    #[arg(long, conflicts_with_all = ["config", "base_url", "collection_path"])]
    in_memory: bool,
}

impl Args {
    fn store_selection(self) -> StoreSelection {
        if self.in_memory {
            StoreSelection::InMemory
        } else {
            StoreSelection::Remote {
                config_path: self.config,
                base_url: self.base_url,
                collection_path: self.collection_path,
            }
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    runtime::launch(cmd_rx, ui_tx, args.store_selection());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([760.0, 560.0])
            .with_min_inner_size([560.0, 360.0]),
        ..Default::default()
    };
    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(|_cc| Ok(Box::new(CrudApp::new(cmd_tx, ui_rx)))),
    )
}
