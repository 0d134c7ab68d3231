//! Entity details step: the deductor's name and PAN.

use cursive::Cursive;
use cursive::view::{Nameable, Resizable};
use cursive::views::{Dialog, DummyView, EditView, LinearLayout, TextView};

use super::status_bar::{build_status_bar, hints};
use super::{banner_view, go_back, refresh_banner, show_step, step_layer};
use crate::app::AppState;

const NAME_FIELD: &str = "entity_name";
const PAN_FIELD: &str = "entity_pan";

pub(super) fn show_entity(siv: &mut Cursive) {
    let (name, pan) = siv
        .with_user_data(|state: &mut AppState| {
            state
                .wizard
                .entity()
                .map(|e| (e.entity_name.clone(), e.pan_number.clone()))
                .unwrap_or_default()
        })
        .unwrap_or_default();

    let banner = banner_view(siv);

    let name_field = EditView::new()
        .content(name)
        .on_submit(|s, _| on_next(s))
        .with_name(NAME_FIELD)
        .fixed_width(40);

    let pan_field = EditView::new()
        .content(pan)
        .max_content_width(10)
        .on_submit(|s, _| on_next(s))
        .with_name(PAN_FIELD)
        .fixed_width(12);

    let form = LinearLayout::vertical()
        .child(field_row("Entity Name:", name_field))
        .child(field_row("PAN:", pan_field))
        .child(TextView::new("  PAN format: ABCDE1234F"));

    let status = build_status_bar(&[hints::TAB, hints::SHIFT_TAB, hints::ESC, hints::CTRL_Q]);

    let layout = LinearLayout::vertical()
        .child(banner)
        .child(form)
        .child(DummyView.fixed_height(1))
        .child(status);

    let dialog = Dialog::around(layout)
        .title("Step 1: Entity Details")
        .button("Back", go_back)
        .button("Next", on_next)
        .padding_lrtb(1, 1, 0, 0);

    siv.add_layer(step_layer(dialog));
}

fn field_row<V: cursive::View + 'static>(
    label: &str,
    field: V,
) -> LinearLayout {
    LinearLayout::horizontal()
        .child(TextView::new(format!("{label:16} ")))
        .child(field)
}

fn field_text(
    siv: &mut Cursive,
    name: &str,
) -> String {
    siv.call_on_name(name, |v: &mut EditView| v.get_content().to_string())
        .unwrap_or_default()
}

fn on_next(siv: &mut Cursive) {
    let name = field_text(siv, NAME_FIELD);
    let pan = field_text(siv, PAN_FIELD);

    let accepted = siv
        .with_user_data(|state: &mut AppState| {
            match state.wizard.submit_entity(&name, &pan) {
                Ok(_) => true,
                Err(e) => {
                    state.wizard.set_banner(e.to_string());
                    false
                }
            }
        })
        .unwrap_or(false);

    if accepted {
        show_step(siv);
    } else {
        refresh_banner(siv);
    }
}
