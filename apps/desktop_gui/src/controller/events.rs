//! UI/backend events and error modeling for desktop GUI controller.

use shared::{
    domain::{CompanyId, TransferId},
    error::{ErrorCode, RequestError},
    protocol::{CompanySummary, Page, Transfer, WarehouseSummary},
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::reducer::{MountId, RequestTicket};

#[derive(Debug)]
pub enum UiEvent {
    Info(String),
    Error(UiError),
    View(ViewEvent),
}

/// Backend results addressed to one mounted transfer list view.
#[derive(Debug, Clone)]
pub enum ViewEvent {
    CompaniesLoaded {
        mount: MountId,
        companies: Vec<CompanySummary>,
    },
    WarehousesLoaded {
        mount: MountId,
        company: CompanyId,
        warehouses: Vec<WarehouseSummary>,
    },
    ReferenceDataFailed {
        mount: MountId,
        error: RequestError,
    },
    TransfersLoaded {
        ticket: RequestTicket,
        page: Page<Transfer>,
    },
    TransfersFailed {
        ticket: RequestTicket,
        error: RequestError,
    },
    ReceptionSucceeded {
        ticket: RequestTicket,
        transfer_id: TransferId,
        transfer: Transfer,
    },
    ReceptionFailed {
        ticket: RequestTicket,
        transfer_id: TransferId,
        error: RequestError,
    },
    ReversalSucceeded {
        ticket: RequestTicket,
        transfer_id: TransferId,
        transfer: Transfer,
    },
    ReversalFailed {
        ticket: RequestTicket,
        transfer_id: TransferId,
        error: RequestError,
    },
}

impl ViewEvent {
    pub fn mount(&self) -> MountId {
        match self {
            ViewEvent::CompaniesLoaded { mount, .. }
            | ViewEvent::WarehousesLoaded { mount, .. }
            | ViewEvent::ReferenceDataFailed { mount, .. } => *mount,
            ViewEvent::TransfersLoaded { ticket, .. }
            | ViewEvent::TransfersFailed { ticket, .. }
            | ViewEvent::ReceptionSucceeded { ticket, .. }
            | ViewEvent::ReceptionFailed { ticket, .. }
            | ViewEvent::ReversalSucceeded { ticket, .. }
            | ViewEvent::ReversalFailed { ticket, .. } => ticket.mount,
        }
    }

    /// Failure event for a command that never reached the backend worker.
    pub fn undelivered(cmd: BackendCommand, reason: &str) -> Self {
        let error = RequestError::Transport(reason.to_string());
        match cmd {
            BackendCommand::LoadCompanies { mount }
            | BackendCommand::LoadWarehouses { mount, .. } => {
                ViewEvent::ReferenceDataFailed { mount, error }
            }
            BackendCommand::LoadTransfers { ticket, .. } => {
                ViewEvent::TransfersFailed { ticket, error }
            }
            BackendCommand::ReceiveTransfer {
                ticket,
                transfer_id,
                ..
            } => ViewEvent::ReceptionFailed {
                ticket,
                transfer_id,
                error,
            },
            BackendCommand::RevertReception {
                ticket,
                transfer_id,
            } => ViewEvent::ReversalFailed {
                ticket,
                transfer_id,
                error,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Validation,
    Conflict,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    ReferenceData,
    LoadTransfers,
    ReceiveTransfer,
    RevertReception,
    General,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("401")
            || message_lower.contains("403")
            || message_lower.contains("unauthorized")
            || message_lower.contains("forbidden")
            || message_lower.contains("session expired")
        {
            UiErrorCategory::Auth
        } else if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("required")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("transport")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_request(context: UiErrorContext, error: &RequestError) -> Self {
        let category = match error {
            RequestError::Validation(_) => UiErrorCategory::Validation,
            RequestError::Transport(_) => UiErrorCategory::Transport,
            RequestError::Decode(_) => UiErrorCategory::Unknown,
            RequestError::Api(api) => match api.code {
                ErrorCode::Unauthorized | ErrorCode::Forbidden => UiErrorCategory::Auth,
                ErrorCode::Conflict => UiErrorCategory::Conflict,
                ErrorCode::Validation => UiErrorCategory::Validation,
                ErrorCode::NotFound | ErrorCode::Internal => UiErrorCategory::Unknown,
            },
        };

        Self {
            category,
            context,
            message: error.user_message(),
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Banner text: the action that failed followed by the server or transport message.
    pub fn headline(&self) -> String {
        let action = match self.context {
            UiErrorContext::BackendStartup => "Startup failed",
            UiErrorContext::ReferenceData => "Could not load companies or warehouses",
            UiErrorContext::LoadTransfers => "Could not load transfers",
            UiErrorContext::ReceiveTransfer => "Reception failed",
            UiErrorContext::RevertReception => "Reversal failed",
            UiErrorContext::General => "Error",
        };
        format!("{action}: {}", self.message)
    }
}
