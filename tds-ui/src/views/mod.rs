//! UI views for the TDS calculator.
//!
//! - `main_menu` - entry point and navigation
//! - `entity`, `mode`, `count`, `transaction`, `results` - one view per
//!   wizard step
//! - `section_reference` - searchable rate chart
//!
//! The main menu is the base layer. The active wizard step always sits on
//! a single layer above it, so [`show_step`] swaps that layer out.

mod count;
mod entity;
mod main_menu;
mod mode;
mod results;
mod section_reference;
mod status_bar;
mod transaction;

use cursive::Cursive;
use cursive::event::Key;
use cursive::theme::{BaseColor, Color};
use cursive::utils::markup::StyledString;
use cursive::view::{Nameable, Resizable};
use cursive::views::{Dialog, NamedView, OnEventView, ResizedView, TextView};

pub use main_menu::show_main_menu;

use crate::app::AppState;
use crate::state::Step;

const BANNER: &str = "banner";

/// Replaces the current step layer with the view for the wizard's step.
pub(crate) fn show_step(siv: &mut Cursive) {
    siv.pop_layer();
    push_step(siv);
}

/// Pushes the view for the wizard's current step on top of the stack.
pub(crate) fn push_step(siv: &mut Cursive) {
    let step = siv
        .with_user_data(|state: &mut AppState| state.wizard.step())
        .unwrap_or_default();

    match step {
        Step::Entity => entity::show_entity(siv),
        Step::Mode => mode::show_mode(siv),
        Step::Count => count::show_count(siv),
        Step::Transactions => transaction::show_transaction(siv),
        Step::Results => results::show_results(siv),
    }
}

/// Steps the wizard back. Leaving the entity step returns to the menu.
pub(crate) fn go_back(siv: &mut Cursive) {
    let step = siv
        .with_user_data(|state: &mut AppState| {
            let step = state.wizard.step();
            state.wizard.back();
            step
        })
        .unwrap_or_default();

    if step == Step::Entity {
        siv.pop_layer();
    } else {
        show_step(siv);
    }
}

/// Wraps a step dialog so Esc goes back one step.
pub(crate) fn step_layer(dialog: Dialog) -> OnEventView<Dialog> {
    OnEventView::new(dialog).on_event(Key::Esc, go_back)
}

fn banner_text(message: Option<&str>) -> StyledString {
    match message {
        Some(message) => StyledString::styled(message, Color::Light(BaseColor::Red)),
        None => StyledString::new(),
    }
}

/// Red line showing the wizard's error banner, updated by
/// [`refresh_banner`].
pub(crate) fn banner_view(siv: &mut Cursive) -> ResizedView<NamedView<TextView>> {
    let message = siv
        .with_user_data(|state: &mut AppState| state.wizard.banner().map(str::to_string))
        .flatten();

    TextView::new(banner_text(message.as_deref()))
        .with_name(BANNER)
        .full_width()
}

/// Copies the wizard banner into the visible banner line.
pub(crate) fn refresh_banner(siv: &mut Cursive) {
    let message = siv
        .with_user_data(|state: &mut AppState| state.wizard.banner().map(str::to_string))
        .flatten();

    siv.call_on_name(BANNER, |v: &mut TextView| {
        v.set_content(banner_text(message.as_deref()));
    });
}

/// Shows a one-button message box on top of the current view.
pub(crate) fn show_message(
    siv: &mut Cursive,
    title: &str,
    message: impl Into<String>,
) {
    siv.add_layer(
        Dialog::text(message.into())
            .title(title)
            .button("OK", |s| {
                s.pop_layer();
            }),
    );
}
