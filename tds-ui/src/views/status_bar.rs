//! Status bar component for displaying keyboard shortcuts.

use cursive::view::Resizable;
use cursive::views::{LinearLayout, TextView};

/// Keyboard shortcut hint for the status bar.
pub struct KeyHint {
    pub key: &'static str,
    pub action: &'static str,
}

impl KeyHint {
    pub const fn new(
        key: &'static str,
        action: &'static str,
    ) -> Self {
        Self { key, action }
    }
}

fn hint_text(hints: &[KeyHint]) -> String {
    hints
        .iter()
        .map(|h| format!("{}: {}", h.key, h.action))
        .collect::<Vec<_>>()
        .join(" │ ")
}

/// Build a status bar from a list of key hints.
pub fn build_status_bar(hints: &[KeyHint]) -> LinearLayout {
    LinearLayout::horizontal().child(TextView::new(hint_text(hints)).full_width())
}

/// Common key hints for the wizard views.
pub mod hints {
    use super::KeyHint;

    pub const NAVIGATE: KeyHint = KeyHint::new("↑↓", "Navigate");
    pub const TAB: KeyHint = KeyHint::new("Tab", "Next");
    pub const SHIFT_TAB: KeyHint = KeyHint::new("S-Tab", "Prev");
    pub const ESC: KeyHint = KeyHint::new("Esc", "Back");
    pub const ENTER: KeyHint = KeyHint::new("Enter", "Select");
    pub const CTRL_Q: KeyHint = KeyHint::new("C-q", "Quit");
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn hints_are_joined_with_separator() {
        let text = hint_text(&[hints::ESC, hints::CTRL_Q]);

        assert_eq!(text, "Esc: Back │ C-q: Quit");
    }
}
