use std::sync::Arc;

mod backend_bridge;
mod controller;
mod ui;

use anyhow::Context;
use clap::Parser;
use client_core::{load_settings, TransferClient, WarehouseBackend};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::TransfersApp;

#[derive(Parser, Debug)]
#[command(about = "Receive and revert incoming warehouse transfers")]
struct Args {
    /// Overrides the configured API base URL.
    #[arg(long)]
    api_base_url: Option<String>,
    /// Overrides the configured bearer token.
    #[arg(long)]
    token: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings().context("failed to load client settings")?;
    if let Some(raw) = args.api_base_url.as_deref() {
        settings = settings
            .with_base_url(raw)
            .context("invalid --api-base-url")?;
    }
    if let Some(token) = args.token {
        settings = settings.with_auth_token(token);
    }
    tracing::info!(api_base_url = %settings.api_base_url, "starting transfer desktop client");

    let api: Arc<dyn WarehouseBackend> =
        Arc::new(TransferClient::from_settings(&settings).context("failed to build API client")?);

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(cmd_rx, ui_tx, api);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Warehouse Transfers")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([980.0, 640.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Warehouse Transfers",
        options,
        Box::new(move |_cc| Ok(Box::new(TransfersApp::new(cmd_tx, ui_rx, settings)))),
    )
    .map_err(|err| anyhow::anyhow!("desktop ui failed: {err}"))
}
