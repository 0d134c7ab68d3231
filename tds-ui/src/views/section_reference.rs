//! Searchable section reference: rates, thresholds and special rules for
//! every section in the catalog.

use cursive::Cursive;
use cursive::event::Key;
use cursive::view::{Nameable, Resizable, Scrollable};
use cursive::views::{Dialog, DummyView, EditView, LinearLayout, OnEventView, TextView};
use tds_core::{FINANCIAL_YEAR, SectionCatalog};

use super::show_message;
use super::status_bar::{KeyHint, build_status_bar, hints};
use crate::app::AppState;

const SEARCH_FIELD: &str = "section_search";
const TABLE_VIEW: &str = "section_table";

/// Header line matching the column widths of `TdsSection::reference_line`.
fn table_header() -> String {
    format!(
        "{:<14} {:<10} {:<10} {:<10} {}",
        "Section", "Company", "Individual", "No PAN", "Threshold"
    )
}

/// The reference table for sections matching `query`.
fn reference_table(
    catalog: &SectionCatalog,
    query: &str,
) -> String {
    let matches = catalog.search(query);
    if matches.is_empty() {
        return format!("No sections match '{}'", query.trim());
    }

    let mut lines = vec![table_header(), "─".repeat(78)];
    lines.extend(matches.iter().map(|s| s.reference_line()));
    lines.join("\n")
}

pub(super) fn show_section_reference(siv: &mut Cursive) {
    let loaded = siv
        .with_user_data(|state: &mut AppState| state.ensure_sections().map_err(|e| e.to_string()))
        .unwrap_or_else(|| Err("Application state is missing".to_string()));

    if let Err(message) = loaded {
        siv.with_user_data(|state: &mut AppState| state.wizard.clear_banner());
        show_message(siv, "Section Reference", message);
        return;
    }

    let table = siv
        .with_user_data(|state: &mut AppState| reference_table(state.catalog(), ""))
        .unwrap_or_default();

    let search = EditView::new()
        .on_edit(on_search)
        .with_name(SEARCH_FIELD)
        .fixed_width(30);

    let status = build_status_bar(&[
        KeyHint::new("Type", "Filter"),
        hints::TAB,
        hints::ESC,
        hints::CTRL_Q,
    ]);

    let layout = LinearLayout::vertical()
        .child(
            LinearLayout::horizontal()
                .child(TextView::new("Search: "))
                .child(search),
        )
        .child(DummyView.fixed_height(1))
        .child(
            TextView::new(table)
                .with_name(TABLE_VIEW)
                .scrollable()
                .max_height(16),
        )
        .child(DummyView.fixed_height(1))
        .child(status);

    let dialog = Dialog::around(layout)
        .title(format!("TDS Sections FY {FINANCIAL_YEAR}"))
        .button("Close", close)
        .padding_lrtb(1, 1, 0, 0);

    siv.add_layer(OnEventView::new(dialog).on_event(Key::Esc, close));
}

fn on_search(
    siv: &mut Cursive,
    query: &str,
    _cursor: usize,
) {
    let table = siv
        .with_user_data(|state: &mut AppState| reference_table(state.catalog(), query))
        .unwrap_or_default();

    siv.call_on_name(TABLE_VIEW, |v: &mut TextView| v.set_content(table));
}

fn close(siv: &mut Cursive) {
    siv.pop_layer();
}
