//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

/// Queues one command. A refused command is handed back so the caller can unwind it.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) -> Result<(), BackendCommand> {
    let cmd_name = cmd.name();

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(cmd)) => {
            *status = "UI command queue is full; please retry".to_string();
            Err(cmd)
        }
        Err(TrySendError::Disconnected(cmd)) => {
            *status =
                "Backend command processor disconnected (possible startup/runtime failure); restart the app"
                    .to_string();
            Err(cmd)
        }
    }
}

/// Sends every command produced by one frame. After the first refusal nothing more is
/// sent; the refused command and everything after it are returned.
pub fn dispatch_all(
    cmd_tx: &Sender<BackendCommand>,
    commands: impl IntoIterator<Item = BackendCommand>,
    status: &mut String,
) -> Vec<BackendCommand> {
    let mut undelivered = Vec::new();
    for cmd in commands {
        if !undelivered.is_empty() {
            undelivered.push(cmd);
            continue;
        }
        if let Err(cmd) = dispatch_backend_command(cmd_tx, cmd, status) {
            undelivered.push(cmd);
        }
    }
    undelivered
}
