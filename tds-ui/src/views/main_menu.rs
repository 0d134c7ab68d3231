//! Main menu view for the TDS calculator.

use cursive::Cursive;
use cursive::align::HAlign;
use cursive::view::Resizable;
use cursive::views::{Dialog, DummyView, LinearLayout, SelectView, TextView};
use tds_core::FINANCIAL_YEAR;

use super::section_reference::show_section_reference;
use super::status_bar::{build_status_bar, hints};
use super::push_step;
use crate::app::AppState;

/// Menu actions available from the main menu.
#[derive(Debug, Clone, Copy)]
enum MenuAction {
    NewCalculation,
    SectionReference,
    Exit,
}

/// Displays the main menu as the root view.
pub fn show_main_menu(siv: &mut Cursive) {
    let menu = SelectView::new()
        .item("New Calculation", MenuAction::NewCalculation)
        .item("Section Reference", MenuAction::SectionReference)
        .item("Exit", MenuAction::Exit)
        .on_submit(handle_menu_selection);

    let api_url = siv
        .with_user_data(|state: &mut AppState| state.api_url().to_string())
        .unwrap_or_default();

    let header = LinearLayout::vertical()
        .child(
            TextView::new(format!("FY {FINANCIAL_YEAR} (Non-Salary)"))
                .h_align(HAlign::Center)
                .full_width(),
        )
        .child(
            TextView::new(format!("Service: {api_url}"))
                .h_align(HAlign::Center)
                .full_width(),
        )
        .child(DummyView.fixed_height(1));

    let status = build_status_bar(&[hints::NAVIGATE, hints::ENTER, hints::CTRL_Q]);

    let layout = LinearLayout::vertical()
        .child(header)
        .child(menu)
        .child(DummyView.fixed_height(1))
        .child(status);

    let dialog = Dialog::around(layout)
        .title("TDS Calculator")
        .padding_lrtb(2, 2, 1, 1);

    siv.add_layer(dialog);
}

fn handle_menu_selection(
    siv: &mut Cursive,
    action: &MenuAction,
) {
    match action {
        MenuAction::NewCalculation => start_new_calculation(siv),
        MenuAction::SectionReference => show_section_reference(siv),
        MenuAction::Exit => siv.quit(),
    }
}

fn start_new_calculation(siv: &mut Cursive) {
    siv.with_user_data(|state: &mut AppState| state.wizard.reset());

    push_step(siv);
}
