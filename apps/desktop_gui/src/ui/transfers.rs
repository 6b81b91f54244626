//! Transfer list screen: filter bar, table, pagination and the two action dialogs.

use chrono::Local;
use eframe::egui;
use shared::domain::{CompanyId, TagColor, TransferAction, TransferId, TransferState, WarehouseId};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::reception::{
    format_quantity, NOTES_FIELD, QUANTITY_FIELD, RECEIVED_AT_FIELD,
};
use crate::controller::reducer::{Notice, TransferListView};

const PAGE_SIZES: [u32; 4] = [10, 20, 50, 100];

pub fn tag_color(color: TagColor) -> egui::Color32 {
    match color {
        TagColor::Blue => egui::Color32::from_rgb(22, 119, 255),
        TagColor::Green => egui::Color32::from_rgb(82, 196, 26),
        TagColor::Orange => egui::Color32::from_rgb(250, 140, 22),
        TagColor::Purple => egui::Color32::from_rgb(114, 46, 209),
        TagColor::Red => egui::Color32::from_rgb(245, 34, 45),
    }
}

/// Renders the screen and returns the backend commands the user triggered this frame.
pub fn show(ctx: &egui::Context, view: &mut TransferListView) -> Vec<BackendCommand> {
    let mut commands = Vec::new();

    egui::CentralPanel::default().show(ctx, |ui| {
        ui.heading("Incoming transfers");
        ui.add_space(4.0);
        show_notice(ui, view);
        show_filter_bar(ui, view, &mut commands);
        ui.separator();
        show_pagination(ui, view, &mut commands);
        ui.add_space(4.0);
        show_table(ui, view);
    });

    show_reception_window(ctx, view, &mut commands);
    show_revert_window(ctx, view, &mut commands);
    commands
}

fn show_notice(ui: &mut egui::Ui, view: &mut TransferListView) {
    let Some(notice) = view.notice().cloned() else {
        return;
    };
    let (text, color) = match notice {
        Notice::Info(message) => (message, egui::Color32::from_rgb(82, 196, 26)),
        Notice::Error(err) if err.requires_reauth() => (
            format!(
                "{} (check the API token on the Connection tab)",
                err.headline()
            ),
            ui.visuals().error_fg_color,
        ),
        Notice::Error(err) => (err.headline(), ui.visuals().error_fg_color),
    };

    let mut dismissed = false;
    egui::Frame::NONE
        .fill(color.gamma_multiply(0.15))
        .corner_radius(8.0)
        .inner_margin(egui::Margin::symmetric(10, 6))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(color, text);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    dismissed = ui.small_button("x").clicked();
                });
            });
        });
    if dismissed {
        view.dismiss_notice();
    }
    ui.add_space(4.0);
}

fn show_filter_bar(
    ui: &mut egui::Ui,
    view: &mut TransferListView,
    commands: &mut Vec<BackendCommand>,
) {
    let mut company = view.draft.company;
    let mut destination = view.draft.destination_warehouse;
    let mut origin = view.draft.origin_warehouse;
    let mut state = view.draft.state;

    egui::Grid::new("transfer_filters")
        .num_columns(4)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            ui.label("Company");
            egui::ComboBox::from_id_salt("filter_company")
                .width(200.0)
                .selected_text(company_name(view, company))
                .show_ui(ui, |ui| {
                    for entry in view.companies() {
                        ui.selectable_value(&mut company, Some(entry.id), &entry.name);
                    }
                });

            ui.label("Destination");
            egui::ComboBox::from_id_salt("filter_destination")
                .width(200.0)
                .selected_text(warehouse_name(view, destination, "Select warehouse"))
                .show_ui(ui, |ui| {
                    for entry in view.warehouses() {
                        ui.selectable_value(&mut destination, Some(entry.id), &entry.name);
                    }
                });
            ui.end_row();

            ui.label("Origin");
            egui::ComboBox::from_id_salt("filter_origin")
                .width(200.0)
                .selected_text(warehouse_name(view, origin, "Any"))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut origin, None, "Any");
                    for entry in view.warehouses() {
                        ui.selectable_value(&mut origin, Some(entry.id), &entry.name);
                    }
                });

            ui.label("State");
            egui::ComboBox::from_id_salt("filter_state")
                .width(200.0)
                .selected_text(state.map(TransferState::label).unwrap_or("Any"))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut state, None, "Any");
                    for candidate in TransferState::ALL {
                        ui.selectable_value(&mut state, Some(candidate), candidate.label());
                    }
                });
            ui.end_row();

            ui.label("Search");
            ui.add(
                egui::TextEdit::singleline(&mut view.draft.search)
                    .hint_text("Product, warehouse or notes")
                    .desired_width(200.0),
            );

            ui.label("Sent between");
            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut view.draft.sent_from)
                        .hint_text("YYYY-MM-DD")
                        .desired_width(94.0),
                );
                ui.label("and");
                ui.add(
                    egui::TextEdit::singleline(&mut view.draft.sent_to)
                        .hint_text("YYYY-MM-DD")
                        .desired_width(94.0),
                );
            });
            ui.end_row();
        });

    if company != view.draft.company {
        commands.extend(view.select_company(company));
    } else {
        view.draft.destination_warehouse = destination;
        view.draft.origin_warehouse = origin;
    }
    view.draft.state = state;

    ui.horizontal(|ui| {
        if ui.button("Search").clicked() {
            if let Ok(cmd) = view.submit_filters() {
                commands.push(cmd);
            }
        }
        if ui.button("Clear").clicked() {
            view.clear_filters();
        }
        if let Some(err) = view.filter_error() {
            ui.colored_label(ui.visuals().error_fg_color, err.to_string());
        }
    });
}

fn company_name(view: &TransferListView, company: Option<CompanyId>) -> String {
    company
        .and_then(|id| view.companies().iter().find(|entry| entry.id == id))
        .map(|entry| entry.name.clone())
        .unwrap_or_else(|| "Select company".to_string())
}

fn warehouse_name(view: &TransferListView, warehouse: Option<WarehouseId>, empty: &str) -> String {
    match warehouse {
        Some(id) => view
            .warehouses()
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.name.clone())
            .unwrap_or_else(|| format!("Warehouse {id}")),
        None => empty.to_string(),
    }
}

fn show_pagination(
    ui: &mut egui::Ui,
    view: &mut TransferListView,
    commands: &mut Vec<BackendCommand>,
) {
    if !view.has_queried() {
        return;
    }
    let page = view.current_page();
    let pages = view.page_count();
    let mut page_size = view.page_size();

    ui.horizontal(|ui| {
        if ui.add_enabled(page > 1, egui::Button::new("< Prev")).clicked() {
            commands.extend(view.go_to_page(page - 1));
        }
        ui.label(format!("Page {page} of {pages}"));
        if ui.add_enabled(page < pages, egui::Button::new("Next >")).clicked() {
            commands.extend(view.go_to_page(page + 1));
        }
        ui.separator();
        ui.label(format!("{} transfers", view.total()));
        ui.separator();
        egui::ComboBox::from_id_salt("page_size")
            .selected_text(format!("{page_size} per page"))
            .show_ui(ui, |ui| {
                for size in PAGE_SIZES {
                    ui.selectable_value(&mut page_size, size, format!("{size} per page"));
                }
            });
        if view.list_loading() {
            ui.spinner();
        }
    });

    commands.extend(view.set_page_size(page_size));
}

fn show_table(ui: &mut egui::Ui, view: &mut TransferListView) {
    if !view.has_queried() {
        ui.weak("Choose a company and destination warehouse, then search.");
        return;
    }
    if view.rows().is_empty() {
        if view.list_loading() {
            ui.spinner();
        } else {
            ui.weak("No transfers match the current filter.");
        }
        return;
    }

    let mut intent: Option<(TransferAction, TransferId)> = None;
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            egui::Grid::new("transfers_table")
                .striped(true)
                .num_columns(10)
                .spacing([14.0, 6.0])
                .show(ui, |ui| {
                    for header in [
                        "#", "Sent", "Origin", "Destination", "Product", "Sent qty",
                        "Received qty", "State", "Notes", "",
                    ] {
                        ui.strong(header);
                    }
                    ui.end_row();

                    for row in view.rows() {
                        ui.label(row.id.to_string());
                        ui.label(
                            row.sent_at
                                .with_timezone(&Local)
                                .format("%Y-%m-%d %H:%M")
                                .to_string(),
                        );
                        ui.label(row.origin_display());
                        ui.label(row.destination_display());
                        ui.label(row.product_display());
                        ui.label(format_quantity(row.sent_quantity));
                        ui.label(
                            row.received_quantity
                                .map(format_quantity)
                                .unwrap_or_else(|| "-".to_string()),
                        );
                        state_tag(ui, row.state);
                        ui.label(row.reception_notes.as_deref().unwrap_or(""));

                        match TransferListView::action_for(row) {
                            Some(action) => {
                                let busy = view.is_busy(row.id);
                                let text = if busy { "Working..." } else { action.label() };
                                if ui.add_enabled(!busy, egui::Button::new(text)).clicked() {
                                    intent = Some((action, row.id));
                                }
                            }
                            None => {
                                ui.weak("-");
                            }
                        }
                        ui.end_row();
                    }
                });
        });

    match intent {
        Some((TransferAction::Receive, id)) => {
            view.open_reception(id);
        }
        Some((TransferAction::Revert, id)) => {
            view.request_revert(id);
        }
        None => {}
    }
}

fn state_tag(ui: &mut egui::Ui, state: TransferState) {
    let color = tag_color(state.tag_color());
    egui::Frame::NONE
        .fill(color.gamma_multiply(0.2))
        .stroke(egui::Stroke::new(1.0, color))
        .corner_radius(6.0)
        .inner_margin(egui::Margin::symmetric(6, 2))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(state.label()).color(color));
        });
}

fn field_errors(ui: &mut egui::Ui, messages: Vec<String>) {
    let color = ui.visuals().error_fg_color;
    for message in messages {
        ui.colored_label(color, message);
    }
}

fn show_reception_window(
    ctx: &egui::Context,
    view: &mut TransferListView,
    commands: &mut Vec<BackendCommand>,
) {
    let Some(form) = view.reception_mut() else {
        return;
    };
    let transfer_id = form.transfer_id();
    let mut open = true;
    let mut submit = false;
    let mut cancel = false;

    egui::Window::new(format!("Receive transfer #{transfer_id}"))
        .id(egui::Id::new(("reception_form", transfer_id.0)))
        .collapsible(false)
        .resizable(false)
        .open(&mut open)
        .show(ctx, |ui| {
            let submitting = form.is_submitting();
            ui.label(format!(
                "Sent quantity: {}",
                format_quantity(form.sent_quantity())
            ));
            ui.add_space(6.0);

            ui.label("Received quantity");
            ui.add_enabled(
                !submitting,
                egui::TextEdit::singleline(&mut form.quantity_input),
            );
            field_errors(ui, form.errors_for(QUANTITY_FIELD));
            if let Some(delta) = form.discrepancy() {
                let text = if delta < 0.0 {
                    format!("{} short of the sent quantity", format_quantity(-delta))
                } else {
                    format!("{} over the sent quantity", format_quantity(delta))
                };
                ui.weak(text);
            }

            ui.label("Reception time");
            ui.add_enabled(
                !submitting,
                egui::TextEdit::singleline(&mut form.received_at_input)
                    .hint_text("YYYY-MM-DD HH:MM"),
            );
            field_errors(ui, form.errors_for(RECEIVED_AT_FIELD));

            ui.label("Notes");
            ui.add_enabled(
                !submitting,
                egui::TextEdit::multiline(&mut form.notes_input)
                    .desired_rows(3)
                    .hint_text("Damage, shortages, remarks"),
            );
            field_errors(ui, form.errors_for(NOTES_FIELD));
            field_errors(ui, form.general_errors());

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                let label = if submitting {
                    "Saving..."
                } else {
                    "Confirm reception"
                };
                if ui.add_enabled(!submitting, egui::Button::new(label)).clicked() {
                    submit = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });

    if submit {
        commands.extend(view.submit_reception());
    }
    if cancel || !open {
        view.cancel_reception();
    }
}

fn show_revert_window(
    ctx: &egui::Context,
    view: &mut TransferListView,
    commands: &mut Vec<BackendCommand>,
) {
    let Some(row) = view.revert_confirmation() else {
        return;
    };
    let transfer_id = row.id;
    let summary = format!(
        "Transfer #{transfer_id} ({}) is {}.",
        row.product_display(),
        row.state.label().to_ascii_lowercase()
    );
    let mut confirm = false;
    let mut cancel = false;

    egui::Window::new("Revert reception")
        .id(egui::Id::new(("revert_confirmation", transfer_id.0)))
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(summary);
            ui.label("Reverting puts it back in transit and clears the recorded reception.");
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Revert").clicked() {
                    confirm = true;
                }
                if ui.button("Keep").clicked() {
                    cancel = true;
                }
            });
        });

    if confirm {
        commands.extend(view.confirm_revert());
    } else if cancel {
        view.cancel_revert();
    }
}
