//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::WarehouseBackend;
use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent, ViewEvent};

/// Starts the backend worker thread. Commands run concurrently on a tokio runtime;
/// each one produces exactly one event back to the UI.
pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    api: Arc<dyn WarehouseBackend>,
) {
    thread::spawn(move || {
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

        let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

        while let Ok(cmd) = cmd_rx.recv() {
            let api = Arc::clone(&api);
            let ui_tx = ui_tx.clone();
            runtime.spawn(async move {
                let cmd_name = cmd.name();
                let event = handle_command(api.as_ref(), cmd).await;
                deliver(ui_tx, event, cmd_name).await;
            });
        }

        tracing::info!("ui command channel closed; backend worker exiting");
    });
}

/// View results wait for room in a full UI queue; the view stays loading or locked until they arrive.
async fn deliver(ui_tx: Sender<UiEvent>, event: UiEvent, cmd_name: &'static str) {
    let event = match ui_tx.try_send(event) {
        Ok(()) => return,
        Err(TrySendError::Full(event)) => event,
        Err(TrySendError::Disconnected(_)) => {
            tracing::warn!(command = cmd_name, "ui event queue closed; dropping result");
            return;
        }
    };

    tracing::debug!(command = cmd_name, "ui event queue full; waiting to deliver result");
    let sent = tokio::task::spawn_blocking(move || ui_tx.send(event).is_ok()).await;
    if !matches!(sent, Ok(true)) {
        tracing::warn!(command = cmd_name, "ui event queue closed; dropping result");
    }
}

pub async fn handle_command(api: &dyn WarehouseBackend, cmd: BackendCommand) -> UiEvent {
    let event = match cmd {
        BackendCommand::LoadCompanies { mount } => match api.list_companies().await {
            Ok(companies) => ViewEvent::CompaniesLoaded { mount, companies },
            Err(error) => ViewEvent::ReferenceDataFailed { mount, error },
        },
        BackendCommand::LoadWarehouses { mount, company } => {
            match api.list_warehouses(company).await {
                Ok(warehouses) => ViewEvent::WarehousesLoaded {
                    mount,
                    company,
                    warehouses,
                },
                Err(error) => ViewEvent::ReferenceDataFailed { mount, error },
            }
        }
        BackendCommand::LoadTransfers { ticket, query } => {
            match api.list_transfers(&query).await {
                Ok(page) => ViewEvent::TransfersLoaded { ticket, page },
                Err(error) => ViewEvent::TransfersFailed { ticket, error },
            }
        }
        BackendCommand::ReceiveTransfer {
            ticket,
            transfer_id,
            request,
        } => match api.receive_transfer(transfer_id, &request).await {
            Ok(transfer) => ViewEvent::ReceptionSucceeded {
                ticket,
                transfer_id,
                transfer,
            },
            Err(error) => ViewEvent::ReceptionFailed {
                ticket,
                transfer_id,
                error,
            },
        },
        BackendCommand::RevertReception {
            ticket,
            transfer_id,
        } => match api.revert_reception(transfer_id).await {
            Ok(transfer) => ViewEvent::ReversalSucceeded {
                ticket,
                transfer_id,
                transfer,
            },
            Err(error) => ViewEvent::ReversalFailed {
                ticket,
                transfer_id,
                error,
            },
        },
    };
    UiEvent::View(event)
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
