//! Backend commands queued from UI to backend worker.

use shared::{
    domain::{CompanyId, TransferId},
    protocol::{ReceiveTransferRequest, TransferQuery},
};

use crate::controller::reducer::{MountId, RequestTicket};

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    LoadCompanies {
        mount: MountId,
    },
    LoadWarehouses {
        mount: MountId,
        company: CompanyId,
    },
    LoadTransfers {
        ticket: RequestTicket,
        query: TransferQuery,
    },
    ReceiveTransfer {
        ticket: RequestTicket,
        transfer_id: TransferId,
        request: ReceiveTransferRequest,
    },
    RevertReception {
        ticket: RequestTicket,
        transfer_id: TransferId,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::LoadCompanies { .. } => "load_companies",
            BackendCommand::LoadWarehouses { .. } => "load_warehouses",
            BackendCommand::LoadTransfers { .. } => "load_transfers",
            BackendCommand::ReceiveTransfer { .. } => "receive_transfer",
            BackendCommand::RevertReception { .. } => "revert_reception",
        }
    }
}
