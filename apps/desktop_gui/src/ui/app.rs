use std::time::Duration;

use client_core::ClientSettings;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiError, UiEvent},
    orchestration::dispatch_all,
    reducer::{MountId, TransferListView},
};
use crate::ui::transfers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Transfers,
    Connection,
}

pub struct TransfersApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    settings: ClientSettings,
    screen: Screen,
    transfers: Option<TransferListView>,
    next_mount: MountId,
    status: String,
    status_banner: Option<UiError>,
}

impl TransfersApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        settings: ClientSettings,
    ) -> Self {
        let mut app = Self {
            cmd_tx,
            ui_rx,
            settings,
            screen: Screen::Transfers,
            transfers: None,
            next_mount: 0,
            status: "Starting...".to_string(),
            status_banner: None,
        };
        app.mount_transfers();
        app
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn transfers(&self) -> Option<&TransferListView> {
        self.transfers.as_ref()
    }

    /// Leaving the transfer screen unmounts its view; coming back mounts a fresh one.
    pub fn navigate(&mut self, screen: Screen) {
        if self.screen == screen {
            return;
        }
        self.screen = screen;
        match screen {
            Screen::Transfers => self.mount_transfers(),
            Screen::Connection => {
                if let Some(view) = self.transfers.take() {
                    tracing::debug!(mount = view.mount_id(), "unmounted transfer list view");
                }
            }
        }
    }

    fn mount_transfers(&mut self) {
        self.next_mount += 1;
        let view = TransferListView::new(self.next_mount, self.settings.page_size);
        let commands = view.mount_commands();
        self.transfers = Some(view);
        self.dispatch(commands);
    }

    /// Queues commands for the backend; any the queue refuses are unwound in the view.
    pub fn dispatch(&mut self, commands: Vec<BackendCommand>) {
        let undelivered = dispatch_all(&self.cmd_tx, commands, &mut self.status);
        if undelivered.is_empty() {
            return;
        }
        match self.transfers.as_mut() {
            Some(view) => {
                for cmd in undelivered {
                    view.dispatch_failed(cmd, &self.status);
                }
            }
            None => {
                tracing::debug!(count = undelivered.len(), "no mounted view; refused commands dropped")
            }
        }
    }

    pub fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => {
                    tracing::warn!(context = ?err.context(), "{}", err.message());
                    self.status = err.headline();
                    self.status_banner = Some(err);
                }
                UiEvent::View(event) => match self.transfers.as_mut() {
                    Some(view) => view.apply(event),
                    None => {
                        tracing::debug!(mount = event.mount(), "no mounted view; dropping event")
                    }
                },
            }
        }
    }

    fn show_navigation(&mut self, ctx: &egui::Context) {
        let mut target = self.screen;
        egui::TopBottomPanel::top("navigation").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut target, Screen::Transfers, "Transfers");
                ui.selectable_value(&mut target, Screen::Connection, "Connection");
            });
        });
        self.navigate(target);
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            if let Some(banner) = &self.status_banner {
                let mut dismissed = false;
                ui.horizontal(|ui| {
                    ui.colored_label(ui.visuals().error_fg_color, banner.headline());
                    dismissed = ui.small_button("Dismiss").clicked();
                });
                if dismissed {
                    self.status_banner = None;
                }
            }
            ui.weak(&self.status);
        });
    }

    fn show_connection_screen(&self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Connection");
            ui.add_space(6.0);
            egui::Grid::new("connection_settings")
                .num_columns(2)
                .spacing([16.0, 6.0])
                .show(ui, |ui| {
                    ui.label("API base URL");
                    ui.monospace(self.settings.api_base_url.as_str());
                    ui.end_row();

                    ui.label("Auth token");
                    ui.label(if self.settings.auth_token.is_some() {
                        "configured"
                    } else {
                        "not set"
                    });
                    ui.end_row();

                    ui.label("Page size");
                    ui.label(self.settings.page_size.to_string());
                    ui.end_row();
                });
            ui.add_space(8.0);
            ui.weak(
                "Settings come from transfers.toml, APP__* environment variables and command-line flags. Restart to apply changes.",
            );
        });
    }
}

impl eframe::App for TransfersApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.show_navigation(ctx);
        self.show_status_bar(ctx);

        match self.screen {
            Screen::Transfers => {
                if let Some(view) = self.transfers.as_mut() {
                    let commands = transfers::show(ctx, view);
                    self.dispatch(commands);
                }
            }
            Screen::Connection => self.show_connection_screen(ctx),
        }

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
