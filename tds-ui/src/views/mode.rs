//! Mode step: one transaction or several.

use cursive::Cursive;
use cursive::view::Resizable;
use cursive::views::{Dialog, DummyView, LinearLayout, SelectView, TextView};
use tds_core::MAX_TRANSACTIONS;

use super::status_bar::{build_status_bar, hints};
use super::{banner_view, go_back, refresh_banner, show_step, step_layer};
use crate::app::AppState;
use crate::state::Mode;

pub(super) fn show_mode(siv: &mut Cursive) {
    let entity_name = siv
        .with_user_data(|state: &mut AppState| {
            state
                .wizard
                .entity()
                .map(|e| e.entity_name.clone())
                .unwrap_or_default()
        })
        .unwrap_or_default();

    let banner = banner_view(siv);

    let menu = SelectView::new()
        .item("Single Transaction", Mode::Single)
        .item(
            format!("Multiple Transactions (up to {MAX_TRANSACTIONS})"),
            Mode::Multiple,
        )
        .on_submit(on_choose);

    let status = build_status_bar(&[hints::NAVIGATE, hints::ENTER, hints::ESC, hints::CTRL_Q]);

    let layout = LinearLayout::vertical()
        .child(banner)
        .child(TextView::new(format!("Entity: {entity_name}")))
        .child(DummyView.fixed_height(1))
        .child(menu)
        .child(DummyView.fixed_height(1))
        .child(status);

    let dialog = Dialog::around(layout)
        .title("Step 2: Calculation Mode")
        .button("Back", go_back)
        .padding_lrtb(1, 1, 0, 0);

    siv.add_layer(step_layer(dialog));
}

fn on_choose(
    siv: &mut Cursive,
    mode: &Mode,
) {
    let mode = *mode;
    let chosen = siv
        .with_user_data(|state: &mut AppState| match state.wizard.choose_mode(mode) {
            Ok(()) => true,
            Err(e) => {
                state.wizard.set_banner(e.to_string());
                false
            }
        })
        .unwrap_or(false);

    if chosen {
        show_step(siv);
    } else {
        refresh_banner(siv);
    }
}
