use super::*;
use crate::controller::reception::{QUANTITY_FIELD, RECEIVED_AT_FORMAT};
use chrono::{TimeZone, Utc};
use shared::{
    domain::ProductId,
    error::{ApiError, FieldErrors, RequestError},
    protocol::Page,
};
use std::collections::BTreeMap;

const MOUNT: MountId = 7;

fn transfer(id: i64, state: TransferState, sent: f64, received: Option<f64>) -> Transfer {
    Transfer {
        id: TransferId(id),
        state,
        origin_warehouse: WarehouseId(1),
        origin_warehouse_name: Some("Callao".to_string()),
        destination_warehouse: WarehouseId(2),
        destination_warehouse_name: Some("Arequipa".to_string()),
        product: ProductId(77),
        product_name: Some("Cemento 42.5kg".to_string()),
        sent_quantity: sent,
        received_quantity: received,
        sent_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        received_at: None,
        reception_notes: None,
    }
}

fn sample_rows() -> Vec<Transfer> {
    vec![
        transfer(41, TransferState::Received, 100.0, Some(100.0)),
        transfer(42, TransferState::InTransit, 500.0, None),
        transfer(43, TransferState::Lost, 20.0, None),
        transfer(44, TransferState::ReceivedPartial, 60.0, Some(55.0)),
    ]
}

fn fixed_now() -> DateTime<Local> {
    Utc.with_ymd_and_hms(2024, 3, 2, 14, 30, 0)
        .unwrap()
        .with_timezone(&Local)
}

fn ticket_of(cmd: &BackendCommand) -> RequestTicket {
    match cmd {
        BackendCommand::LoadTransfers { ticket, .. }
        | BackendCommand::ReceiveTransfer { ticket, .. }
        | BackendCommand::RevertReception { ticket, .. } => *ticket,
        other => panic!("command has no ticket: {other:?}"),
    }
}

fn query_of(cmd: &BackendCommand) -> &TransferQuery {
    match cmd {
        BackendCommand::LoadTransfers { query, .. } => query,
        other => panic!("not a list command: {other:?}"),
    }
}

/// A view that has submitted a filter and received `rows` for page 1.
fn loaded_view(rows: Vec<Transfer>) -> TransferListView {
    let mut view = TransferListView::new(MOUNT, 20);
    view.draft.company = Some(CompanyId(1));
    view.draft.destination_warehouse = Some(WarehouseId(2));
    let cmd = view.submit_filters().expect("valid filter");
    let count = rows.len() as u64;
    view.apply(ViewEvent::TransfersLoaded {
        ticket: ticket_of(&cmd),
        page: Page {
            results: rows,
            count,
        },
    });
    view
}

#[test]
fn row_action_depends_only_on_state() {
    let view = loaded_view(sample_rows());
    let actions: Vec<_> = view
        .rows()
        .iter()
        .map(TransferListView::action_for)
        .collect();
    assert_eq!(
        actions,
        vec![
            Some(TransferAction::Revert),
            Some(TransferAction::Receive),
            None,
            Some(TransferAction::Revert),
        ]
    );
    assert_eq!(
        TransferListView::action_for(&transfer(9, TransferState::ReceivedSurplus, 1.0, Some(2.0))),
        Some(TransferAction::Revert)
    );
}

#[test]
fn reception_form_prefills_sent_quantity_and_current_time() {
    let mut view = loaded_view(sample_rows());
    assert!(view.open_reception_at(TransferId(42), fixed_now()));

    let form = view.reception().expect("form open");
    assert_eq!(form.quantity_input, "500");
    assert_eq!(form.parsed_quantity(), Ok(500.0));
    assert_eq!(
        form.received_at_input,
        fixed_now().format(RECEIVED_AT_FORMAT).to_string()
    );
    assert!(form.notes_input.is_empty());
}

#[test]
fn reception_is_only_offered_for_in_transit_rows() {
    let mut view = loaded_view(sample_rows());
    assert!(!view.open_reception_at(TransferId(41), fixed_now()));
    assert!(!view.open_reception_at(TransferId(43), fixed_now()));
    assert!(!view.open_reception_at(TransferId(999), fixed_now()));
    assert!(view.reception().is_none());
}

#[test]
fn successful_reception_patches_only_the_received_row() {
    let mut view = loaded_view(sample_rows());
    let before: Vec<Transfer> = view.rows().to_vec();

    assert!(view.open_reception_at(TransferId(42), fixed_now()));
    {
        let form = view.reception_mut().expect("form");
        form.quantity_input = "480".to_string();
        form.notes_input = "2 sacks damaged".to_string();
    }
    let cmd = view.submit_reception().expect("command");
    match &cmd {
        BackendCommand::ReceiveTransfer {
            transfer_id,
            request,
            ..
        } => {
            assert_eq!(*transfer_id, TransferId(42));
            assert_eq!(request.received_quantity, 480.0);
            assert_eq!(request.notes.as_deref(), Some("2 sacks damaged"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
    assert!(view.is_busy(TransferId(42)));

    let mut updated = transfer(42, TransferState::ReceivedPartial, 500.0, Some(480.0));
    updated.reception_notes = Some("2 sacks damaged".to_string());
    view.apply(ViewEvent::ReceptionSucceeded {
        ticket: ticket_of(&cmd),
        transfer_id: TransferId(42),
        transfer: updated.clone(),
    });

    assert!(view.reception().is_none());
    assert!(!view.is_busy(TransferId(42)));
    for (old, new) in before.iter().zip(view.rows()) {
        if old.id == TransferId(42) {
            assert_eq!(new, &updated);
        } else {
            assert_eq!(old, new);
        }
    }
}

#[test]
fn successful_reversal_patches_only_the_reverted_row() {
    let mut rows = sample_rows();
    rows[1] = transfer(42, TransferState::ReceivedPartial, 500.0, Some(480.0));
    let mut view = loaded_view(rows);
    let before: Vec<Transfer> = view.rows().to_vec();

    assert!(view.request_revert(TransferId(42)));
    assert_eq!(
        view.revert_confirmation().map(|row| row.id),
        Some(TransferId(42))
    );
    let cmd = view.confirm_revert().expect("command");
    assert!(view.revert_confirmation().is_none());

    view.apply(ViewEvent::ReversalSucceeded {
        ticket: ticket_of(&cmd),
        transfer_id: TransferId(42),
        transfer: transfer(42, TransferState::InTransit, 500.0, None),
    });

    let row = view
        .rows()
        .iter()
        .find(|row| row.id == TransferId(42))
        .expect("row");
    assert_eq!(row.state, TransferState::InTransit);
    assert_eq!(row.received_quantity, None);
    for (old, new) in before.iter().zip(view.rows()) {
        if old.id != TransferId(42) {
            assert_eq!(old, new);
        }
    }
}

#[test]
fn revert_requires_confirmation_and_a_received_row() {
    let mut view = loaded_view(sample_rows());
    assert!(view.confirm_revert().is_none());
    assert!(!view.request_revert(TransferId(42)));
    assert!(!view.request_revert(TransferId(43)));

    assert!(view.request_revert(TransferId(44)));
    view.cancel_revert();
    assert!(view.confirm_revert().is_none());
}

#[test]
fn rejected_reception_keeps_rows_and_form_with_field_error() {
    let mut view = loaded_view(sample_rows());
    let before: Vec<Transfer> = view.rows().to_vec();

    assert!(view.open_reception_at(TransferId(42), fixed_now()));
    let cmd = view.submit_reception().expect("command");

    let mut fields = BTreeMap::new();
    fields.insert(
        "cantidad_recibida".to_string(),
        vec!["must be >= 0".to_string()],
    );
    view.apply(ViewEvent::ReceptionFailed {
        ticket: ticket_of(&cmd),
        transfer_id: TransferId(42),
        error: RequestError::Validation(FieldErrors(fields)),
    });

    assert_eq!(view.rows(), before.as_slice());
    let form = view.reception().expect("form stays open");
    assert!(!form.is_submitting());
    assert_eq!(form.errors_for(QUANTITY_FIELD), vec!["must be >= 0"]);
    assert!(!view.is_busy(TransferId(42)));

    // The user can correct and resubmit.
    assert!(view.submit_reception().is_some());
}

#[test]
fn conflict_on_reception_is_shown_in_the_form() {
    let mut view = loaded_view(sample_rows());
    assert!(view.open_reception_at(TransferId(42), fixed_now()));
    let cmd = view.submit_reception().expect("command");

    view.apply(ViewEvent::ReceptionFailed {
        ticket: ticket_of(&cmd),
        transfer_id: TransferId(42),
        error: RequestError::Api(ApiError::new(400, "La transferencia ya fue recibida")),
    });

    let form = view.reception().expect("form stays open");
    assert_eq!(form.general_errors(), vec!["La transferencia ya fue recibida"]);
    assert_eq!(view.rows()[1].state, TransferState::InTransit);
}

#[test]
fn invalid_quantity_is_rejected_without_a_request() {
    let mut view = loaded_view(sample_rows());
    assert!(view.open_reception_at(TransferId(42), fixed_now()));
    view.reception_mut().expect("form").quantity_input = "-3".to_string();

    assert!(view.submit_reception().is_none());
    assert!(!view.is_busy(TransferId(42)));
    let form = view.reception().expect("form");
    assert_eq!(
        form.errors_for(QUANTITY_FIELD),
        vec!["Received quantity must be zero or greater"]
    );

    view.reception_mut().expect("form").quantity_input = "  ".to_string();
    assert!(view.submit_reception().is_none());
    assert_eq!(
        view.reception().expect("form").errors_for(QUANTITY_FIELD),
        vec!["Received quantity is required"]
    );
}

#[test]
fn reopening_the_form_does_not_leak_previous_input() {
    let mut rows = sample_rows();
    rows.push(transfer(45, TransferState::InTransit, 12.0, None));
    let mut view = loaded_view(rows);

    assert!(view.open_reception_at(TransferId(42), fixed_now()));
    {
        let form = view.reception_mut().expect("form");
        form.quantity_input = "1".to_string();
        form.notes_input = "draft".to_string();
    }
    view.cancel_reception();
    assert!(view.reception().is_none());

    assert!(view.open_reception_at(TransferId(42), fixed_now()));
    let form = view.reception().expect("form");
    assert_eq!(form.quantity_input, "500");
    assert!(form.notes_input.is_empty());

    assert!(view.open_reception_at(TransferId(45), fixed_now()));
    let form = view.reception().expect("form");
    assert_eq!(form.transfer_id(), TransferId(45));
    assert_eq!(form.quantity_input, "12");
}

#[test]
fn in_flight_transfer_cannot_be_submitted_twice() {
    let mut view = loaded_view(sample_rows());
    assert!(view.open_reception_at(TransferId(42), fixed_now()));
    assert!(view.submit_reception().is_some());
    assert!(view.submit_reception().is_none());

    assert!(view.request_revert(TransferId(44)));
    assert!(view.confirm_revert().is_some());
    assert!(view.is_busy(TransferId(44)));
    assert!(!view.request_revert(TransferId(44)));
}

#[test]
fn clearing_filters_returns_to_unqueried_state() {
    let mut view = loaded_view(sample_rows());
    assert!(view.has_queried());

    view.clear_filters();

    assert!(!view.has_queried());
    assert!(view.rows().is_empty());
    assert_eq!(view.total(), 0);
    assert!(!view.list_loading());
    assert_eq!(view.draft, FilterDraft::default());
}

#[test]
fn late_page_after_clear_is_discarded() {
    let mut view = loaded_view(sample_rows());
    assert!(view.go_to_page(1).is_none(), "same page is a no-op");

    view.draft.company = Some(CompanyId(1));
    view.draft.destination_warehouse = Some(WarehouseId(2));
    let pending = view.submit_filters().expect("command");
    view.clear_filters();

    view.apply(ViewEvent::TransfersLoaded {
        ticket: ticket_of(&pending),
        page: Page {
            results: sample_rows(),
            count: 4,
        },
    });
    assert!(view.rows().is_empty());
    assert!(!view.has_queried());
}

#[test]
fn page_change_reuses_submitted_filter_verbatim() {
    let mut view = TransferListView::new(MOUNT, 2);
    view.draft.company = Some(CompanyId(1));
    view.draft.destination_warehouse = Some(WarehouseId(2));
    view.draft.state = Some(TransferState::InTransit);
    view.draft.search = "cemento".to_string();
    let first = view.submit_filters().expect("command");
    let submitted = query_of(&first).filter.clone();
    view.apply(ViewEvent::TransfersLoaded {
        ticket: ticket_of(&first),
        page: Page {
            results: sample_rows()[..2].to_vec(),
            count: 5,
        },
    });

    // Unsubmitted edits in the filter bar.
    view.draft.search = "fierro".to_string();
    view.draft.state = None;
    view.draft.sent_from = "not a date".to_string();

    let second = view.go_to_page(2).expect("page command");
    let query = query_of(&second);
    assert_eq!(query.page, 2);
    assert_eq!(query.page_size, 2);
    assert_eq!(query.filter, submitted);
}

#[test]
fn only_latest_list_response_is_applied() {
    let mut view = TransferListView::new(MOUNT, 20);
    view.draft.company = Some(CompanyId(1));
    view.draft.destination_warehouse = Some(WarehouseId(2));
    let older = view.submit_filters().expect("command");
    view.draft.state = Some(TransferState::Lost);
    let newer = view.submit_filters().expect("command");

    view.apply(ViewEvent::TransfersLoaded {
        ticket: ticket_of(&newer),
        page: Page {
            results: vec![transfer(43, TransferState::Lost, 20.0, None)],
            count: 1,
        },
    });
    view.apply(ViewEvent::TransfersLoaded {
        ticket: ticket_of(&older),
        page: Page {
            results: sample_rows(),
            count: 4,
        },
    });

    assert_eq!(view.rows().len(), 1);
    assert_eq!(view.rows()[0].id, TransferId(43));
}

#[test]
fn events_for_another_mount_are_ignored() {
    let mut view = loaded_view(sample_rows());
    view.apply(ViewEvent::ReversalSucceeded {
        ticket: RequestTicket {
            mount: MOUNT + 1,
            seq: 1,
        },
        transfer_id: TransferId(41),
        transfer: transfer(41, TransferState::InTransit, 100.0, None),
    });
    assert_eq!(view.rows()[0].state, TransferState::Received);
}

#[test]
fn failed_reversal_leaves_row_and_reports_error() {
    let mut view = loaded_view(sample_rows());
    assert!(view.request_revert(TransferId(41)));
    let cmd = view.confirm_revert().expect("command");

    view.apply(ViewEvent::ReversalFailed {
        ticket: ticket_of(&cmd),
        transfer_id: TransferId(41),
        error: RequestError::Transport("connection refused".to_string()),
    });

    assert_eq!(view.rows()[0].state, TransferState::Received);
    assert!(!view.is_busy(TransferId(41)));
    match view.notice() {
        Some(Notice::Error(err)) => {
            assert_eq!(err.context(), UiErrorContext::RevertReception);
        }
        other => panic!("unexpected notice: {other:?}"),
    }
}

#[test]
fn filter_submission_requires_company_and_destination() {
    let mut view = TransferListView::new(MOUNT, 20);
    assert_eq!(view.submit_filters(), Err(FilterError::MissingCompany));
    view.draft.company = Some(CompanyId(1));
    assert_eq!(view.submit_filters(), Err(FilterError::MissingDestination));
    view.draft.destination_warehouse = Some(WarehouseId(2));
    view.draft.sent_from = "2024-03-10".to_string();
    view.draft.sent_to = "2024-03-01".to_string();
    assert_eq!(view.submit_filters(), Err(FilterError::InvertedRange));
    assert!(!view.has_queried());
}

#[test]
fn changing_company_resets_warehouse_choices() {
    let mut view = TransferListView::new(MOUNT, 20);
    let cmd = view.select_company(Some(CompanyId(3)));
    assert_eq!(
        cmd,
        Some(BackendCommand::LoadWarehouses {
            mount: MOUNT,
            company: CompanyId(3),
        })
    );
    view.draft.destination_warehouse = Some(WarehouseId(9));
    assert!(view.select_company(Some(CompanyId(3))).is_none());
    assert!(view.select_company(Some(CompanyId(4))).is_some());
    assert_eq!(view.draft.destination_warehouse, None);
}

fn numbered_rows(ids: std::ops::RangeInclusive<i64>) -> Vec<Transfer> {
    ids.map(|id| transfer(id, TransferState::InTransit, 10.0, None))
        .collect()
}

#[test]
fn failed_page_load_keeps_the_loaded_page_and_can_be_retried() {
    let mut view = TransferListView::new(MOUNT, 20);
    view.draft.company = Some(CompanyId(1));
    view.draft.destination_warehouse = Some(WarehouseId(2));
    let first = view.submit_filters().expect("command");
    view.apply(ViewEvent::TransfersLoaded {
        ticket: ticket_of(&first),
        page: Page {
            results: numbered_rows(1..=20),
            count: 60,
        },
    });
    assert_eq!(view.page_count(), 3);

    let second = view.go_to_page(2).expect("page command");
    assert!(view.list_loading());
    assert_eq!(view.current_page(), 1);
    view.apply(ViewEvent::TransfersFailed {
        ticket: ticket_of(&second),
        error: RequestError::Transport("connection reset".to_string()),
    });

    assert_eq!(view.current_page(), 1);
    assert!(!view.list_loading());
    assert_eq!(view.rows()[0].id, TransferId(1));
    assert_eq!(view.total(), 60);

    let retry = view.go_to_page(2).expect("retry of the same page");
    assert_eq!(query_of(&retry), query_of(&second));
    view.apply(ViewEvent::TransfersLoaded {
        ticket: ticket_of(&retry),
        page: Page {
            results: numbered_rows(21..=40),
            count: 60,
        },
    });
    assert_eq!(view.current_page(), 2);
    assert_eq!(view.rows()[0].id, TransferId(21));
}

#[test]
fn failed_first_query_returns_to_unqueried_state() {
    let mut view = TransferListView::new(MOUNT, 20);
    view.draft.company = Some(CompanyId(1));
    view.draft.destination_warehouse = Some(WarehouseId(2));
    let cmd = view.submit_filters().expect("command");
    assert!(view.has_queried());

    view.apply(ViewEvent::TransfersFailed {
        ticket: ticket_of(&cmd),
        error: RequestError::Transport("connection refused".to_string()),
    });

    assert!(!view.has_queried());
    assert!(view.go_to_page(2).is_none());
    assert!(matches!(view.notice(), Some(Notice::Error(_))));
}

#[test]
fn success_releases_the_requested_transfer() {
    let mut view = loaded_view(sample_rows());
    assert!(view.open_reception_at(TransferId(42), fixed_now()));
    let cmd = view.submit_reception().expect("command");

    // The server answers with a record whose id differs from the request.
    view.apply(ViewEvent::ReceptionSucceeded {
        ticket: ticket_of(&cmd),
        transfer_id: TransferId(42),
        transfer: transfer(4200, TransferState::Received, 500.0, Some(500.0)),
    });

    assert!(!view.is_busy(TransferId(42)));
    assert!(view.reception().is_none());
}

#[test]
fn refused_command_unlocks_the_transfer() {
    let mut view = loaded_view(sample_rows());
    assert!(view.open_reception_at(TransferId(42), fixed_now()));
    let cmd = view.submit_reception().expect("command");

    view.dispatch_failed(cmd, "UI command queue is full; please retry");

    assert!(!view.is_busy(TransferId(42)));
    let form = view.reception().expect("form stays open");
    assert!(!form.is_submitting());
    view.cancel_reception();
    assert!(view.open_reception_at(TransferId(42), fixed_now()));

    assert!(view.request_revert(TransferId(44)));
    let revert = view.confirm_revert().expect("command");
    view.dispatch_failed(revert, "UI command queue is full; please retry");
    assert!(!view.is_busy(TransferId(44)));
    assert!(view.request_revert(TransferId(44)));
}
