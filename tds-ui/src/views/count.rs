//! Transaction count step, shown in multiple mode only.

use cursive::Cursive;
use cursive::view::{Resizable, Scrollable};
use cursive::views::{Dialog, DummyView, LinearLayout, SelectView, TextView};
use tds_core::MAX_TRANSACTIONS;

use super::status_bar::{build_status_bar, hints};
use super::{banner_view, go_back, refresh_banner, show_step, step_layer};
use crate::app::AppState;

pub(super) fn show_count(siv: &mut Cursive) {
    let banner = banner_view(siv);

    let counts = SelectView::new()
        .with_all((1..=MAX_TRANSACTIONS).map(|n| (n.to_string(), n)))
        .on_submit(on_choose);

    let status = build_status_bar(&[hints::NAVIGATE, hints::ENTER, hints::ESC, hints::CTRL_Q]);

    let layout = LinearLayout::vertical()
        .child(banner)
        .child(TextView::new("How many transactions?"))
        .child(DummyView.fixed_height(1))
        .child(counts.scrollable().fixed_size((6, 10)))
        .child(DummyView.fixed_height(1))
        .child(status);

    let dialog = Dialog::around(layout)
        .title("Step 3: Number of Transactions")
        .button("Back", go_back)
        .padding_lrtb(1, 1, 0, 0);

    siv.add_layer(step_layer(dialog));
}

fn on_choose(
    siv: &mut Cursive,
    count: &usize,
) {
    let count = *count;
    let chosen = siv
        .with_user_data(|state: &mut AppState| match state.wizard.choose_count(count) {
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
