use std::{collections::HashMap, time::Duration};

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::{Record, RecordId};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

pub const APP_TITLE: &str = "Record CRUD";

/// Unsaved name/description text for one row or for the creation form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
    pub name: String,
    pub description: String,
}

impl EditBuffer {
    pub fn from_record(record: &Record) -> Self {
        Self {
            name: record.name.clone(),
            description: record.description.clone(),
        }
    }

    fn matches(&self, record: &Record) -> bool {
        self.name == record.name && self.description == record.description
    }
}

/// Seeds buffers for new rows, drops buffers of removed rows, and refreshes
/// buffers the user has not edited since the previous snapshot.
pub fn sync_edit_buffers(
    buffers: &mut HashMap<RecordId, EditBuffer>,
    previous: &[Record],
    current: &[Record],
) {
    buffers.retain(|id, _| current.iter().any(|record| &record.id == id));
    for record in current {
        match buffers.get_mut(&record.id) {
            None => {
                buffers.insert(record.id.clone(), EditBuffer::from_record(record));
            }
            Some(buffer) => {
                let untouched = previous
                    .iter()
                    .find(|old| old.id == record.id)
                    .is_some_and(|old| buffer.matches(old));
                if untouched {
                    *buffer = EditBuffer::from_record(record);
                }
            }
        }
    }
}

/// Turns the creation form into a command and clears it.
pub fn take_create_command(form: &mut EditBuffer) -> BackendCommand {
    let EditBuffer { name, description } = std::mem::take(form);
    BackendCommand::Create { name, description }
}

pub struct CrudApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    items: Vec<Record>,
    loading: bool,
    edit_buffers: HashMap<RecordId, EditBuffer>,
    new_record: EditBuffer,
    status: String,
    /// Load/startup failure shown above the list with Retry.
    status_banner: Option<String>,
    initial_load_requested: bool,
}

impl CrudApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            items: Vec::new(),
            loading: false,
            edit_buffers: HashMap::new(),
            new_record: EditBuffer::default(),
            status: "Starting...".to_string(),
            status_banner: None,
            initial_load_requested: false,
        }
    }

    fn request_initial_load(&mut self) {
        if self.initial_load_requested {
            return;
        }
        self.initial_load_requested = true;
        self.dispatch(BackendCommand::Load);
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::OperationStarted(kind) => {
                    tracing::debug!(operation = kind.label(), "operation in flight");
                }
                UiEvent::CollectionChanged(state) => {
                    sync_edit_buffers(&mut self.edit_buffers, &self.items, &state.items);
                    self.items = state.items;
                    self.loading = state.loading;
                }
                UiEvent::Error(err) => {
                    tracing::warn!(
                        category = ?err.category(),
                        context = ?err.context(),
                        "{}",
                        err.message()
                    );
                    self.status = err.status_line();
                    if matches!(
                        err.context(),
                        UiErrorContext::BackendStartup | UiErrorContext::Load
                    ) {
                        self.status_banner = Some(err.status_line());
                    }
                }
            }
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(message) = self.status_banner.clone() {
            egui::Frame::NONE
                .fill(egui::Color32::from_rgb(111, 53, 53))
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(egui::RichText::new(&message).color(egui::Color32::WHITE));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                            if ui.button("Retry").clicked() {
                                self.status_banner = None;
                                self.dispatch(BackendCommand::Load);
                            }
                        });
                    });
                });
            ui.add_space(6.0);
        }
    }

    fn show_record_list(&mut self, ui: &mut egui::Ui) {
        ui.heading("Records");
        ui.add_space(4.0);

        if self.loading {
            ui.label("Loading...");
            return;
        }
        if self.items.is_empty() {
            ui.weak("No records yet.");
            return;
        }

        let mut intents = Vec::new();
        egui::ScrollArea::vertical()
            .auto_shrink([false, true])
            .max_height((ui.available_height() - 140.0).max(120.0))
            .show(ui, |ui| {
                for record in &self.items {
                    let buffer = self
                        .edit_buffers
                        .entry(record.id.clone())
                        .or_insert_with(|| EditBuffer::from_record(record));
                    ui.push_id(record.id.as_str(), |ui| {
                        ui.horizontal(|ui| {
                            ui.add(
                                egui::TextEdit::singleline(&mut buffer.name)
                                    .hint_text("Name")
                                    .desired_width(180.0),
                            );
                            ui.add(
                                egui::TextEdit::singleline(&mut buffer.description)
                                    .hint_text("Description")
                                    .desired_width(260.0),
                            );
                            let dirty = !buffer.matches(record);
                            if ui.add_enabled(dirty, egui::Button::new("Save")).clicked() {
                                intents.push(BackendCommand::Update {
                                    id: record.id.clone(),
                                    name: buffer.name.clone(),
                                    description: buffer.description.clone(),
                                });
                            }
                            if ui.button("Delete").clicked() {
                                intents.push(BackendCommand::Delete {
                                    id: record.id.clone(),
                                });
                            }
                        });
                    });
                }
            });

        for cmd in intents {
            self.dispatch(cmd);
        }
    }

    fn show_create_form(&mut self, ui: &mut egui::Ui) {
        ui.heading("Add record");
        ui.add_space(4.0);

        let mut submit = false;
        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut self.new_record.name)
                    .hint_text("Name")
                    .desired_width(180.0),
            );
            let description = ui.add(
                egui::TextEdit::singleline(&mut self.new_record.description)
                    .hint_text("Description")
                    .desired_width(260.0),
            );
            if description.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                submit = true;
            }
            if ui.button("Add").clicked() {
                submit = true;
            }
        });

        if submit {
            let cmd = take_create_command(&mut self.new_record);
            self.dispatch(cmd);
        }
    }
}

impl eframe::App for CrudApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.request_initial_load();
        self.process_ui_events();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.weak(self.status.as_str());
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(APP_TITLE);
            ui.add_space(8.0);
            self.show_status_banner(ui);
            self.show_record_list(ui);
            ui.separator();
            self.show_create_form(ui);
        });

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
