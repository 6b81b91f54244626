//! Reception form state: pre-filled from the transfer, validated locally, then handed to the list view.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use shared::{
    domain::TransferId,
    error::RequestError,
    protocol::{ReceiveTransferRequest, Transfer},
};
use thiserror::Error;

pub const RECEIVED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

pub const QUANTITY_FIELD: &str = "cantidad_recibida";
pub const NOTES_FIELD: &str = "notas";
pub const RECEIVED_AT_FIELD: &str = "fecha_recepcion";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceptionFormError {
    #[error("Received quantity is required")]
    QuantityRequired,
    #[error("Received quantity must be a number")]
    QuantityNotANumber,
    #[error("Received quantity must be zero or greater")]
    QuantityNegative,
    #[error("Reception time must look like 2024-03-01 14:30")]
    InvalidReceivedAt,
}

impl ReceptionFormError {
    fn field(&self) -> &'static str {
        match self {
            ReceptionFormError::QuantityRequired
            | ReceptionFormError::QuantityNotANumber
            | ReceptionFormError::QuantityNegative => QUANTITY_FIELD,
            ReceptionFormError::InvalidReceivedAt => RECEIVED_AT_FIELD,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReceptionForm {
    transfer_id: TransferId,
    sent_quantity: f64,
    pub quantity_input: String,
    pub notes_input: String,
    pub received_at_input: String,
    submitting: bool,
    local_error: Option<ReceptionFormError>,
    server_error: Option<RequestError>,
}

impl ReceptionForm {
    /// Fresh form for one transfer; nothing carries over from a previous opening.
    pub fn open(transfer: &Transfer, now: DateTime<Local>) -> Self {
        Self {
            transfer_id: transfer.id,
            sent_quantity: transfer.sent_quantity,
            quantity_input: format_quantity(transfer.sent_quantity),
            notes_input: String::new(),
            received_at_input: now.format(RECEIVED_AT_FORMAT).to_string(),
            submitting: false,
            local_error: None,
            server_error: None,
        }
    }

    pub fn transfer_id(&self) -> TransferId {
        self.transfer_id
    }

    pub fn sent_quantity(&self) -> f64 {
        self.sent_quantity
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn parsed_quantity(&self) -> Result<f64, ReceptionFormError> {
        let raw = self.quantity_input.trim().replace(',', ".");
        if raw.is_empty() {
            return Err(ReceptionFormError::QuantityRequired);
        }
        let value = raw
            .parse::<f64>()
            .map_err(|_| ReceptionFormError::QuantityNotANumber)?;
        if !value.is_finite() {
            return Err(ReceptionFormError::QuantityNotANumber);
        }
        if value < 0.0 {
            return Err(ReceptionFormError::QuantityNegative);
        }
        Ok(value)
    }

    /// Difference against the sent quantity, shown as a hint while typing.
    pub fn discrepancy(&self) -> Option<f64> {
        self.parsed_quantity()
            .ok()
            .map(|received| received - self.sent_quantity)
            .filter(|delta| *delta != 0.0)
    }

    pub fn build_request(&self) -> Result<ReceiveTransferRequest, ReceptionFormError> {
        let received_quantity = self.parsed_quantity()?;
        let received_at = parse_received_at(&self.received_at_input)?;
        let notes = Some(self.notes_input.trim())
            .filter(|notes| !notes.is_empty())
            .map(str::to_string);

        Ok(ReceiveTransferRequest {
            received_quantity,
            notes,
            received_at: Some(received_at),
        })
    }

    /// Messages to render under one input, local validation first.
    pub fn errors_for(&self, field: &str) -> Vec<String> {
        let mut messages = Vec::new();
        if let Some(local) = &self.local_error {
            if local.field() == field {
                messages.push(local.to_string());
            }
        }
        if let Some(fields) = self.server_error.as_ref().and_then(RequestError::field_errors) {
            messages.extend(fields.for_field(field).iter().cloned());
        }
        messages
    }

    /// Errors that do not belong to a single input.
    pub fn general_errors(&self) -> Vec<String> {
        match &self.server_error {
            Some(RequestError::Validation(fields)) => fields.general(),
            Some(other) => vec![other.user_message()],
            None => Vec::new(),
        }
    }

    pub(crate) fn reject_locally(&mut self, error: ReceptionFormError) {
        self.local_error = Some(error);
        self.server_error = None;
    }

    pub(crate) fn mark_submitting(&mut self) {
        self.submitting = true;
        self.local_error = None;
        self.server_error = None;
    }

    pub(crate) fn mark_failed(&mut self, error: RequestError) {
        self.submitting = false;
        self.server_error = Some(error);
    }
}

pub fn format_quantity(value: f64) -> String {
    value.to_string()
}

fn parse_received_at(raw: &str) -> Result<DateTime<Utc>, ReceptionFormError> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), RECEIVED_AT_FORMAT)
        .map_err(|_| ReceptionFormError::InvalidReceivedAt)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or(ReceptionFormError::InvalidReceivedAt)
}
