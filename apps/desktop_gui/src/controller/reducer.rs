//! Transfer list view state. The view owns its rows; dialogs and the backend only
//! produce commands and events, and every mutation goes through [`TransferListView::apply`].

use std::collections::HashSet;

use chrono::{DateTime, Local, NaiveDate};
use shared::{
    domain::{CompanyId, TransferAction, TransferId, TransferState, WarehouseId},
    protocol::{CompanySummary, Transfer, TransferFilter, TransferQuery, WarehouseSummary},
};
use thiserror::Error;
use tracing::debug;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, ViewEvent};
use crate::controller::reception::ReceptionForm;

pub type MountId = u64;

/// Identifies the view instance and request a backend response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    pub mount: MountId,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Select a company")]
    MissingCompany,
    #[error("Select a destination warehouse")]
    MissingDestination,
    #[error("{field} must be a date like 2024-03-01 (got '{value}')")]
    InvalidDate { field: &'static str, value: String },
    #[error("The start date is after the end date")]
    InvertedRange,
}

/// Filter fields as currently edited; only submitted copies drive requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterDraft {
    pub company: Option<CompanyId>,
    pub destination_warehouse: Option<WarehouseId>,
    pub origin_warehouse: Option<WarehouseId>,
    pub state: Option<TransferState>,
    pub search: String,
    pub sent_from: String,
    pub sent_to: String,
}

impl FilterDraft {
    pub fn to_filter(&self) -> Result<TransferFilter, FilterError> {
        let company = self.company.ok_or(FilterError::MissingCompany)?;
        let destination = self
            .destination_warehouse
            .ok_or(FilterError::MissingDestination)?;
        let sent_from = parse_date("Sent from", &self.sent_from)?;
        let sent_to = parse_date("Sent to", &self.sent_to)?;
        if let (Some(from), Some(to)) = (sent_from, sent_to) {
            if from > to {
                return Err(FilterError::InvertedRange);
            }
        }

        let search = Some(self.search.trim())
            .filter(|search| !search.is_empty())
            .map(str::to_string);

        Ok(TransferFilter {
            company,
            destination_warehouse: destination,
            origin_warehouse: self.origin_warehouse,
            state: self.state,
            search,
            sent_from,
            sent_to,
        })
    }
}

fn parse_date(field: &'static str, raw: &str) -> Result<Option<NaiveDate>, FilterError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| FilterError::InvalidDate {
            field,
            value: raw.to_string(),
        })
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Error(UiError),
}

pub struct TransferListView {
    mount: MountId,
    pub draft: FilterDraft,
    filter_error: Option<FilterError>,
    active: Option<TransferQuery>,
    pending: Option<TransferQuery>,
    page_size: u32,
    rows: Vec<Transfer>,
    total: u64,
    list_loading: bool,
    next_seq: u64,
    latest_list_seq: u64,
    in_flight: HashSet<TransferId>,
    reception: Option<ReceptionForm>,
    revert_confirmation: Option<TransferId>,
    companies: Vec<CompanySummary>,
    warehouses: Vec<WarehouseSummary>,
    notice: Option<Notice>,
}

impl TransferListView {
    pub fn new(mount: MountId, page_size: u32) -> Self {
        Self {
            mount,
            draft: FilterDraft::default(),
            filter_error: None,
            active: None,
            pending: None,
            page_size: page_size.max(1),
            rows: Vec::new(),
            total: 0,
            list_loading: false,
            next_seq: 0,
            latest_list_seq: 0,
            in_flight: HashSet::new(),
            reception: None,
            revert_confirmation: None,
            companies: Vec::new(),
            warehouses: Vec::new(),
            notice: None,
        }
    }

    /// Reference data requests issued when the view mounts.
    pub fn mount_commands(&self) -> Vec<BackendCommand> {
        vec![BackendCommand::LoadCompanies { mount: self.mount }]
    }

    pub fn mount_id(&self) -> MountId {
        self.mount
    }

    pub fn rows(&self) -> &[Transfer] {
        &self.rows
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn companies(&self) -> &[CompanySummary] {
        &self.companies
    }

    pub fn warehouses(&self) -> &[WarehouseSummary] {
        &self.warehouses
    }

    pub fn has_queried(&self) -> bool {
        self.active.is_some() || self.pending.is_some()
    }

    pub fn list_loading(&self) -> bool {
        self.list_loading
    }

    pub fn filter_error(&self) -> Option<&FilterError> {
        self.filter_error.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn current_page(&self) -> u32 {
        self.active.as_ref().map(|query| query.page).unwrap_or(1)
    }

    pub fn page_count(&self) -> u32 {
        let page_size = self
            .active
            .as_ref()
            .map(|query| query.page_size)
            .unwrap_or(self.page_size);
        let pages = self.total.div_ceil(u64::from(page_size.max(1)));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    pub fn is_busy(&self, transfer_id: TransferId) -> bool {
        self.in_flight.contains(&transfer_id)
    }

    pub fn reception(&self) -> Option<&ReceptionForm> {
        self.reception.as_ref()
    }

    pub fn reception_mut(&mut self) -> Option<&mut ReceptionForm> {
        self.reception.as_mut()
    }

    pub fn revert_confirmation(&self) -> Option<&Transfer> {
        let id = self.revert_confirmation?;
        self.find_row(id)
    }

    /// The only action a row exposes; a pure function of its state.
    pub fn action_for(transfer: &Transfer) -> Option<TransferAction> {
        transfer.state.available_action()
    }

    fn find_row(&self, transfer_id: TransferId) -> Option<&Transfer> {
        self.rows.iter().find(|row| row.id == transfer_id)
    }

    fn next_ticket(&mut self) -> RequestTicket {
        self.next_seq += 1;
        RequestTicket {
            mount: self.mount,
            seq: self.next_seq,
        }
    }

    /// The query only becomes active once its page has loaded.
    fn list_command(&mut self, query: TransferQuery) -> BackendCommand {
        let ticket = self.next_ticket();
        self.latest_list_seq = ticket.seq;
        self.list_loading = true;
        self.pending = Some(query.clone());
        BackendCommand::LoadTransfers { ticket, query }
    }

    /// Picking a company invalidates warehouse choices that belonged to the previous one.
    pub fn select_company(&mut self, company: Option<CompanyId>) -> Option<BackendCommand> {
        if self.draft.company == company {
            return None;
        }
        self.draft.company = company;
        self.draft.destination_warehouse = None;
        self.draft.origin_warehouse = None;
        self.warehouses.clear();
        company.map(|company| BackendCommand::LoadWarehouses {
            mount: self.mount,
            company,
        })
    }

    /// Requests the first page of the submitted filter; it becomes the active query once loaded.
    pub fn submit_filters(&mut self) -> Result<BackendCommand, FilterError> {
        match self.draft.to_filter() {
            Ok(filter) => {
                self.filter_error = None;
                let query = TransferQuery::first_page(filter, self.page_size);
                Ok(self.list_command(query))
            }
            Err(err) => {
                self.filter_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Requests another page of the last submitted filter, ignoring unsubmitted edits.
    pub fn go_to_page(&mut self, page: u32) -> Option<BackendCommand> {
        let active = self.active.as_ref()?;
        if page == 0 || page == active.page || page > self.page_count() {
            return None;
        }
        let mut query = active.clone();
        query.page = page;
        Some(self.list_command(query))
    }

    pub fn set_page_size(&mut self, page_size: u32) -> Option<BackendCommand> {
        if page_size == 0 || page_size == self.page_size {
            return None;
        }
        self.page_size = page_size;
        let mut query = self.active.clone()?;
        query.page = 1;
        query.page_size = page_size;
        Some(self.list_command(query))
    }

    /// Back to the pre-query empty state. Pending list responses become stale.
    pub fn clear_filters(&mut self) {
        self.draft = FilterDraft::default();
        self.filter_error = None;
        self.active = None;
        self.pending = None;
        self.rows.clear();
        self.total = 0;
        self.list_loading = false;
        self.latest_list_seq = self.next_ticket().seq;
        self.warehouses.clear();
        self.reception = None;
        self.revert_confirmation = None;
        self.notice = None;
    }

    pub fn open_reception(&mut self, transfer_id: TransferId) -> bool {
        self.open_reception_at(transfer_id, Local::now())
    }

    pub fn open_reception_at(&mut self, transfer_id: TransferId, now: DateTime<Local>) -> bool {
        if self.is_busy(transfer_id) {
            return false;
        }
        let Some(row) = self.find_row(transfer_id) else {
            return false;
        };
        if Self::action_for(row) != Some(TransferAction::Receive) {
            return false;
        }
        let form = ReceptionForm::open(row, now);
        self.reception = Some(form);
        self.revert_confirmation = None;
        true
    }

    pub fn cancel_reception(&mut self) {
        self.reception = None;
    }

    pub fn submit_reception(&mut self) -> Option<BackendCommand> {
        let form = self.reception.as_ref()?;
        let transfer_id = form.transfer_id();
        if self.in_flight.contains(&transfer_id) {
            return None;
        }

        let request = match form.build_request() {
            Ok(request) => request,
            Err(err) => {
                if let Some(form) = self.reception.as_mut() {
                    form.reject_locally(err);
                }
                return None;
            }
        };

        if let Some(form) = self.reception.as_mut() {
            form.mark_submitting();
        }
        self.in_flight.insert(transfer_id);
        let ticket = self.next_ticket();
        Some(BackendCommand::ReceiveTransfer {
            ticket,
            transfer_id,
            request,
        })
    }

    pub fn request_revert(&mut self, transfer_id: TransferId) -> bool {
        if self.is_busy(transfer_id) {
            return false;
        }
        let eligible = self
            .find_row(transfer_id)
            .map(|row| Self::action_for(row) == Some(TransferAction::Revert))
            .unwrap_or(false);
        if eligible {
            self.revert_confirmation = Some(transfer_id);
        }
        eligible
    }

    pub fn cancel_revert(&mut self) {
        self.revert_confirmation = None;
    }

    pub fn confirm_revert(&mut self) -> Option<BackendCommand> {
        let transfer_id = self.revert_confirmation.take()?;
        if self.in_flight.contains(&transfer_id) {
            return None;
        }
        self.in_flight.insert(transfer_id);
        let ticket = self.next_ticket();
        Some(BackendCommand::RevertReception {
            ticket,
            transfer_id,
        })
    }

    /// Replaces one row wholesale with the server's record.
    fn patch_row(&mut self, updated: Transfer) -> bool {
        match self.rows.iter_mut().find(|row| row.id == updated.id) {
            Some(row) => {
                *row = updated;
                true
            }
            None => false,
        }
    }

    /// Unwinds a command the backend queue refused, as if the request had failed.
    pub fn dispatch_failed(&mut self, cmd: BackendCommand, reason: &str) {
        debug!(command = cmd.name(), reason, "command never reached the backend");
        self.apply(ViewEvent::undelivered(cmd, reason));
    }

    pub fn apply(&mut self, event: ViewEvent) {
        if event.mount() != self.mount {
            debug!(
                event_mount = event.mount(),
                view_mount = self.mount,
                "dropping event addressed to another view"
            );
            return;
        }

        match event {
            ViewEvent::CompaniesLoaded { companies, .. } => {
                self.companies = companies;
            }
            ViewEvent::WarehousesLoaded {
                company,
                warehouses,
                ..
            } => {
                if self.draft.company == Some(company) {
                    self.warehouses = warehouses;
                }
            }
            ViewEvent::ReferenceDataFailed { error, .. } => {
                self.notice = Some(Notice::Error(UiError::from_request(
                    UiErrorContext::ReferenceData,
                    &error,
                )));
            }
            ViewEvent::TransfersLoaded { ticket, page } => {
                if ticket.seq != self.latest_list_seq {
                    debug!(seq = ticket.seq, "dropping stale transfer page");
                    return;
                }
                if let Some(query) = self.pending.take() {
                    self.active = Some(query);
                }
                self.rows = page.results;
                self.total = page.count;
                self.list_loading = false;
            }
            ViewEvent::TransfersFailed { ticket, error } => {
                if ticket.seq != self.latest_list_seq {
                    return;
                }
                self.pending = None;
                self.list_loading = false;
                self.notice = Some(Notice::Error(UiError::from_request(
                    UiErrorContext::LoadTransfers,
                    &error,
                )));
            }
            ViewEvent::ReceptionSucceeded {
                transfer_id,
                transfer,
                ..
            } => {
                self.in_flight.remove(&transfer_id);
                if self
                    .reception
                    .as_ref()
                    .is_some_and(|form| form.transfer_id() == transfer_id)
                {
                    self.reception = None;
                }
                let state = transfer.state;
                self.patch_row(transfer);
                self.notice = Some(Notice::Info(format!(
                    "Transfer #{transfer_id} marked as {}",
                    state.label().to_ascii_lowercase()
                )));
            }
            ViewEvent::ReceptionFailed {
                transfer_id, error, ..
            } => {
                self.in_flight.remove(&transfer_id);
                match self.reception.as_mut() {
                    Some(form) if form.transfer_id() == transfer_id => form.mark_failed(error),
                    _ => {
                        self.notice = Some(Notice::Error(UiError::from_request(
                            UiErrorContext::ReceiveTransfer,
                            &error,
                        )));
                    }
                }
            }
            ViewEvent::ReversalSucceeded {
                transfer_id,
                transfer,
                ..
            } => {
                self.in_flight.remove(&transfer_id);
                self.patch_row(transfer);
                self.notice = Some(Notice::Info(format!(
                    "Reception of transfer #{transfer_id} reverted"
                )));
            }
            ViewEvent::ReversalFailed {
                transfer_id, error, ..
            } => {
                self.in_flight.remove(&transfer_id);
                self.notice = Some(Notice::Error(UiError::from_request(
                    UiErrorContext::RevertReception,
                    &error,
                )));
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
