//! Transaction entry step.
//!
//! One form edits the active transaction draft. The section list comes
//! from the service's catalog; picking a section rebuilds the threshold
//! type, slab and condition choices in place so typed values survive.
//! Form values are written back to the draft before every navigation.

use cursive::Cursive;
use cursive::view::{Nameable, Resizable, Scrollable};
use cursive::views::{
    Checkbox, Dialog, DummyView, EditView, LinearLayout, NamedView, ResizedView, SelectView,
    TextView,
};
use tds_core::calculations::{PURCHASE_OF_GOODS_SECTION, effective_threshold, resolve_rate};
use tds_core::pan::{detect_category, is_valid_pan};
use tds_core::validation::is_complete;
use tds_core::{DeducteeCategory, TdsSection, TransactionDraft};
use thiserror::Error;

use super::status_bar::{build_status_bar, hints};
use super::{banner_view, go_back, refresh_banner, show_step, step_layer};
use crate::app::AppState;
use crate::state::Mode;
use crate::utils::{
    ParseDateError, ParseDecimalError, amount_field, date_field, parse_decimal, parse_form_date,
};

const DEDUCTEE_NAME: &str = "deductee_name";
const DEDUCTEE_PAN: &str = "deductee_pan";
const SECTION: &str = "section";
const SECTION_INFO: &str = "section_info";
const SECTION_OPTIONS: &str = "section_options";
const CATEGORY: &str = "category";
const PAN_AVAILABLE: &str = "pan_available";
const THRESHOLD_TYPE: &str = "threshold_type";
const SLAB: &str = "slab";
const CONDITION: &str = "condition";
const EXCEEDED_BEFORE: &str = "exceeded_before";
const AMOUNT: &str = "amount";
const DEDUCTION_DATE: &str = "deduction_date";
const PAYMENT_DATE: &str = "payment_date";

const LABEL_WIDTH: usize = 20;

#[derive(Debug, Error)]
enum FormError {
    #[error(transparent)]
    Amount(#[from] ParseDecimalError),

    #[error("Deduction date: {0}")]
    DeductionDate(ParseDateError),

    #[error("Payment date: {0}")]
    PaymentDate(ParseDateError),
}

/// Raw contents of the form widgets.
#[derive(Debug, Clone, Default)]
struct FormValues {
    deductee_name: String,
    deductee_pan: String,
    section_code: String,
    category: Option<DeducteeCategory>,
    pan_available: bool,
    threshold_type: Option<String>,
    slab: Option<String>,
    condition: Option<String>,
    exceeded_before: bool,
    amount: String,
    deduction_date: String,
    payment_date: String,
}

impl FormValues {
    /// Copies the fields that cannot fail to parse.
    fn apply_choices(
        &self,
        draft: &mut TransactionDraft,
    ) {
        draft.deductee_name = self.deductee_name.trim().to_string();
        draft.deductee_pan = self.deductee_pan.trim().to_ascii_uppercase();
        draft.section_code = self.section_code.clone();
        if let Some(category) = self.category {
            draft.category = category;
        }
        draft.pan_available = self.pan_available;
        draft.threshold_type = self.threshold_type.clone();
        draft.selected_slab = self.slab.clone();
        draft.selected_condition = self.condition.clone();
        draft.threshold_exceeded_before = self.exceeded_before;
    }

    /// Writes every field into `draft`. Nothing is written when the amount
    /// or a date cannot be read.
    fn apply(
        &self,
        draft: &mut TransactionDraft,
    ) -> Result<(), FormError> {
        let amount = parse_decimal(&self.amount)?;
        let deduction_date =
            parse_form_date(&self.deduction_date).map_err(FormError::DeductionDate)?;
        let payment_date = parse_form_date(&self.payment_date).map_err(FormError::PaymentDate)?;

        self.apply_choices(draft);
        draft.amount = amount;
        draft.deduction_date = deduction_date;
        draft.payment_date = payment_date;
        Ok(())
    }
}

/// The category implied by a complete, well-formed deductee PAN.
fn detected_category(pan: &str) -> Option<DeducteeCategory> {
    is_valid_pan(pan).then(|| detect_category(pan)).flatten()
}

/// Transaction numbers with the active one bracketed and complete ones
/// ticked: `1✓ [2] 3`.
fn progress_line(
    drafts: &[TransactionDraft],
    active: usize,
) -> String {
    drafts
        .iter()
        .enumerate()
        .map(|(i, draft)| {
            let tick = if is_complete(draft) { "✓" } else { "" };
            if i == active {
                format!("[{}{tick}]", i + 1)
            } else {
                format!("{}{tick}", i + 1)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Threshold, rate and special rules of `section` for the draft's
/// current choices.
fn section_summary(
    section: &TdsSection,
    draft: &TransactionDraft,
) -> String {
    let threshold = effective_threshold(
        section,
        draft.threshold_type.as_deref(),
        draft.threshold_exceeded_before,
    );
    let rate = resolve_rate(
        section,
        draft.category,
        draft.pan_available,
        draft.selected_slab.as_deref(),
        draft.selected_condition.as_deref(),
    );
    let threshold_note = if threshold.threshold.is_none() && threshold.note != "-" {
        format!("{} (not applied)", threshold.note)
    } else {
        threshold.note
    };

    let mut summary = format!("Threshold: {threshold_note}\nRate: {}", rate.display);
    let notes = section.special_notes();
    if !notes.is_empty() {
        summary.push('\n');
        summary.push_str(&notes.join(", "));
    }
    summary
}

fn field_row<V: cursive::View + 'static>(
    label: &str,
    field: V,
) -> LinearLayout {
    LinearLayout::horizontal()
        .child(TextView::new(format!("{label:LABEL_WIDTH$} ")))
        .child(field)
}

fn choice(
    items: Vec<(String, String)>,
    current: Option<&str>,
) -> SelectView<String> {
    let selected = current
        .and_then(|c| items.iter().position(|(_, value)| value == c))
        .unwrap_or(0);
    SelectView::new()
        .popup()
        .with_all(items)
        .selected(selected)
        .on_submit(|s, _: &String| update_summary(s))
}

fn date_input(
    name: &str,
    value: String,
) -> ResizedView<NamedView<EditView>> {
    EditView::new().content(value).with_name(name).fixed_width(12)
}

/// Replaces the contents of `layout` with the choices `section` offers.
fn fill_section_options(
    layout: &mut LinearLayout,
    section: Option<&TdsSection>,
    draft: &TransactionDraft,
) {
    layout.clear();
    let Some(section) = section else {
        return;
    };

    if section.has_threshold_types() {
        let items = section
            .threshold_types
            .iter()
            .map(|t| (format!("{} - {}", t.name, t.threshold_note), t.name.clone()))
            .collect();
        layout.add_child(field_row(
            "Threshold Type:",
            choice(items, draft.threshold_type.as_deref()).with_name(THRESHOLD_TYPE),
        ));
    }

    if section.has_slabs() {
        let items = section
            .slabs
            .iter()
            .map(|s| (format!("{} ({}%)", s.description, s.rate.normalize()), s.description.clone()))
            .collect();
        layout.add_child(field_row(
            "Slab:",
            choice(items, draft.selected_slab.as_deref()).with_name(SLAB),
        ));
    }

    if section.has_conditions() {
        let items = section
            .conditions
            .iter()
            .map(|c| (format!("{} ({}%)", c.condition, c.rate.normalize()), c.condition.clone()))
            .collect();
        layout.add_child(field_row(
            "Condition:",
            choice(items, draft.selected_condition.as_deref()).with_name(CONDITION),
        ));
    }

    if section.code == PURCHASE_OF_GOODS_SECTION {
        layout.add_child(
            LinearLayout::horizontal()
                .child(
                    Checkbox::new()
                        .with_checked(draft.threshold_exceeded_before)
                        .on_change(|s, _| update_summary(s))
                        .with_name(EXCEEDED_BEFORE),
                )
                .child(TextView::new(" Purchases from this seller already above ₹50 lakh")),
        );
    }
}

pub(super) fn show_transaction(siv: &mut Cursive) {
    let loaded = siv
        .with_user_data(|state: &mut AppState| state.ensure_sections().is_ok())
        .unwrap_or(false);

    let Some((draft, section, sections, header, nav)) = siv.with_user_data(|state: &mut AppState| {
        let wizard = &state.wizard;
        let draft = wizard.active_transaction().cloned().unwrap_or_default();
        let section = state.catalog().find(&draft.section_code).cloned();
        let sections: Vec<(String, String)> = state
            .catalog()
            .iter()
            .map(|s| (s.display_name(), s.code.clone()))
            .collect();
        let header = match wizard.mode() {
            Some(Mode::Multiple) => format!(
                "Transaction {} of {}   {}",
                wizard.active_index() + 1,
                wizard.transactions().len(),
                progress_line(wizard.transactions(), wizard.active_index())
            ),
            _ => String::new(),
        };
        let nav = (
            wizard.has_previous_transaction(),
            wizard.has_next_transaction(),
        );
        (draft, section, sections, header, nav)
    }) else {
        return;
    };

    let banner = banner_view(siv);

    let mut section_items = vec![("-- Select a section --".to_string(), String::new())];
    section_items.extend(sections);
    let section_select = SelectView::new()
        .popup()
        .autojump()
        .with_all(section_items.clone())
        .selected(
            section_items
                .iter()
                .position(|(_, code)| code.eq_ignore_ascii_case(&draft.section_code))
                .unwrap_or(0),
        )
        .on_submit(on_section_selected)
        .with_name(SECTION);

    let category_select = SelectView::new()
        .popup()
        .with_all(
            DeducteeCategory::all()
                .iter()
                .map(|c| (c.short_label().to_string(), *c)),
        )
        .selected(
            DeducteeCategory::all()
                .iter()
                .position(|c| *c == draft.category)
                .unwrap_or(0),
        )
        .on_submit(|s, _| update_summary(s))
        .with_name(CATEGORY);

    let pan_checkbox = Checkbox::new()
        .with_checked(draft.pan_available)
        .on_change(|s, _| update_summary(s))
        .with_name(PAN_AVAILABLE);

    let mut options = LinearLayout::vertical();
    fill_section_options(&mut options, section.as_ref(), &draft);

    let summary = section
        .as_ref()
        .map(|s| section_summary(s, &draft))
        .unwrap_or_default();

    let form = LinearLayout::vertical()
        .child(field_row(
            "Deductee Name:",
            EditView::new()
                .content(draft.deductee_name.clone())
                .with_name(DEDUCTEE_NAME)
                .fixed_width(30),
        ))
        .child(field_row(
            "Deductee PAN:",
            EditView::new()
                .content(draft.deductee_pan.clone())
                .max_content_width(10)
                .on_edit(on_pan_edited)
                .with_name(DEDUCTEE_PAN)
                .fixed_width(12),
        ))
        .child(field_row("Section:", section_select))
        .child(TextView::new(summary).with_name(SECTION_INFO))
        .child(field_row("Category:", category_select))
        .child(
            LinearLayout::horizontal()
                .child(TextView::new(format!("{:LABEL_WIDTH$} ", "PAN Available:")))
                .child(pan_checkbox),
        )
        .child(options.with_name(SECTION_OPTIONS))
        .child(field_row(
            "Amount (₹):",
            EditView::new()
                .content(amount_field(draft.amount))
                .with_name(AMOUNT)
                .fixed_width(16),
        ))
        .child(field_row(
            "Deduction Date:",
            date_input(DEDUCTION_DATE, date_field(draft.deduction_date)),
        ))
        .child(field_row(
            "Payment Date:",
            date_input(PAYMENT_DATE, date_field(draft.payment_date)),
        ))
        .child(TextView::new("Dates: YYYY-MM-DD or DD-MM-YYYY"));

    let status = build_status_bar(&[hints::TAB, hints::SHIFT_TAB, hints::ESC, hints::CTRL_Q]);

    let mut layout = LinearLayout::vertical().child(banner);
    if !header.is_empty() {
        layout.add_child(TextView::new(header));
    }
    if !loaded {
        layout.add_child(TextView::new("No sections loaded: check the service and go back to retry."));
    }
    let layout = layout
        .child(form.scrollable())
        .child(DummyView.fixed_height(1))
        .child(status);

    let (has_previous, has_next) = nav;
    let mut dialog = Dialog::around(layout)
        .title("Transaction Details")
        .button("Back", go_back)
        .padding_lrtb(1, 1, 0, 0);
    if has_previous {
        dialog.add_button("Previous", on_previous);
    }
    if has_next {
        dialog.add_button("Next", on_next);
    }
    dialog.add_button("Calculate TDS", on_calculate);

    siv.add_layer(step_layer(dialog));
}

fn text(
    siv: &mut Cursive,
    name: &str,
) -> String {
    siv.call_on_name(name, |v: &mut EditView| v.get_content().to_string())
        .unwrap_or_default()
}

fn selection(
    siv: &mut Cursive,
    name: &str,
) -> Option<String> {
    siv.call_on_name(name, |v: &mut SelectView<String>| {
        v.selection().map(|s| (*s).clone())
    })
    .flatten()
}

fn checked(
    siv: &mut Cursive,
    name: &str,
) -> bool {
    siv.call_on_name(name, |c: &mut Checkbox| c.is_checked())
        .unwrap_or(false)
}

fn read_form(siv: &mut Cursive) -> FormValues {
    FormValues {
        deductee_name: text(siv, DEDUCTEE_NAME),
        deductee_pan: text(siv, DEDUCTEE_PAN),
        section_code: selection(siv, SECTION).unwrap_or_default(),
        category: siv
            .call_on_name(CATEGORY, |v: &mut SelectView<DeducteeCategory>| {
                v.selection().map(|c| *c)
            })
            .flatten(),
        pan_available: checked(siv, PAN_AVAILABLE),
        threshold_type: selection(siv, THRESHOLD_TYPE),
        slab: selection(siv, SLAB),
        condition: selection(siv, CONDITION),
        exceeded_before: checked(siv, EXCEEDED_BEFORE),
        amount: text(siv, AMOUNT),
        deduction_date: text(siv, DEDUCTION_DATE),
        payment_date: text(siv, PAYMENT_DATE),
    }
}

/// Writes the form into the active draft. On failure the banner explains
/// why and `false` is returned.
fn save_form(siv: &mut Cursive) -> bool {
    let values = read_form(siv);
    let saved = siv
        .with_user_data(|state: &mut AppState| {
            let Some(draft) = state.wizard.active_transaction_mut() else {
                return false;
            };
            match values.apply(draft) {
                Ok(()) => true,
                Err(e) => {
                    state.wizard.set_banner(e.to_string());
                    false
                }
            }
        })
        .unwrap_or(false);

    if !saved {
        refresh_banner(siv);
    }
    saved
}

/// Recomputes the section summary from the current widget values.
fn update_summary(siv: &mut Cursive) {
    let values = read_form(siv);
    let summary = siv
        .with_user_data(|state: &mut AppState| {
            let section = state.catalog().find(&values.section_code)?;
            let mut preview = TransactionDraft::default();
            values.apply_choices(&mut preview);
            Some(section_summary(section, &preview))
        })
        .flatten()
        .unwrap_or_default();

    siv.call_on_name(SECTION_INFO, |v: &mut TextView| v.set_content(summary));
}

fn on_section_selected(
    siv: &mut Cursive,
    code: &String,
) {
    let values = read_form(siv);
    let Some((section, draft)) = siv
        .with_user_data(|state: &mut AppState| {
            let section = state.catalog().find(code).cloned();
            let draft = state.wizard.active_transaction_mut()?;
            values.apply_choices(draft);
            match &section {
                Some(section) => draft.select_section(section),
                None => {
                    draft.section_code.clear();
                    draft.threshold_type = None;
                    draft.selected_slab = None;
                    draft.selected_condition = None;
                }
            }
            Some((section, draft.clone()))
        })
        .flatten()
    else {
        return;
    };

    siv.call_on_name(SECTION_OPTIONS, |layout: &mut LinearLayout| {
        fill_section_options(layout, section.as_ref(), &draft);
    });
    update_summary(siv);
}

fn on_pan_edited(
    siv: &mut Cursive,
    pan: &str,
    _cursor: usize,
) {
    let Some(category) = detected_category(pan) else {
        return;
    };
    let index = DeducteeCategory::all()
        .iter()
        .position(|c| *c == category)
        .unwrap_or(0);

    siv.call_on_name(CATEGORY, |v: &mut SelectView<DeducteeCategory>| {
        let _ = v.set_selection(index);
    });
    siv.call_on_name(PAN_AVAILABLE, |c: &mut Checkbox| {
        let _ = c.set_checked(true);
    });
    update_summary(siv);
}

fn navigate(
    siv: &mut Cursive,
    step: fn(&mut AppState) -> bool,
) {
    if !save_form(siv) {
        return;
    }
    if siv.with_user_data(step).unwrap_or(false) {
        show_step(siv);
    } else {
        refresh_banner(siv);
    }
}

fn on_previous(siv: &mut Cursive) {
    navigate(siv, |state| report(state, |s| s.wizard.previous_transaction()));
}

fn on_next(siv: &mut Cursive) {
    navigate(siv, |state| report(state, |s| s.wizard.next_transaction()));
}

fn on_calculate(siv: &mut Cursive) {
    navigate(siv, |state| state.calculate().is_ok());
}

fn report<E: std::fmt::Display>(
    state: &mut AppState,
    action: impl FnOnce(&mut AppState) -> Result<(), E>,
) -> bool {
    match action(state) {
        Ok(()) => true,
        Err(e) => {
            state.wizard.set_banner(e.to_string());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tds_core::ThresholdType;

    use super::*;

    fn values() -> FormValues {
        FormValues {
            deductee_name: " Ravi Kumar ".to_string(),
            deductee_pan: "abcpd1234e".to_string(),
            section_code: "194C".to_string(),
            category: Some(DeducteeCategory::Individual),
            pan_available: true,
            threshold_type: Some("Single Payment".to_string()),
            amount: "1,50,000".to_string(),
            deduction_date: "10-06-2025".to_string(),
            payment_date: "2025-07-05".to_string(),
            ..Default::default()
        }
    }

    fn contractors() -> TdsSection {
        TdsSection {
            threshold: Some(dec!(100000)),
            threshold_note: "₹1,00,000 (Annual)".to_string(),
            company_rate: Some(dec!(2)),
            individual_rate: Some(dec!(1)),
            threshold_types: vec![ThresholdType {
                name: "Single Payment".to_string(),
                threshold: dec!(30000),
                threshold_note: "₹30,000 (Single)".to_string(),
            }],
            ..TdsSection::new("194C", "Payment to Contractors")
        }
    }

    #[test]
    fn apply_writes_parsed_fields() {
        let mut draft = TransactionDraft::default();

        values().apply(&mut draft).unwrap();

        assert_eq!(draft.deductee_name, "Ravi Kumar");
        assert_eq!(draft.deductee_pan, "ABCPD1234E");
        assert_eq!(draft.section_code, "194C");
        assert_eq!(draft.amount, dec!(150000));
        assert_eq!(draft.deduction_date, NaiveDate::from_ymd_opt(2025, 6, 10));
        assert_eq!(draft.payment_date, NaiveDate::from_ymd_opt(2025, 7, 5));
        assert_eq!(draft.threshold_type.as_deref(), Some("Single Payment"));
        assert!(is_complete(&draft));
    }

    #[test]
    fn apply_leaves_draft_untouched_on_bad_date() {
        let mut draft = TransactionDraft::default();
        let bad = FormValues {
            payment_date: "yesterday".to_string(),
            ..values()
        };

        let err = bad.apply(&mut draft).unwrap_err();

        assert!(err.to_string().starts_with("Payment date: invalid date 'yesterday'"));
        assert_eq!(draft, TransactionDraft::default());
    }

    #[test]
    fn apply_rejects_bad_amount() {
        let mut draft = TransactionDraft::default();
        let bad = FormValues {
            amount: "12abc".to_string(),
            ..values()
        };

        assert!(matches!(bad.apply(&mut draft), Err(FormError::Amount(_))));
    }

    #[test]
    fn blank_fields_leave_draft_incomplete() {
        let mut draft = TransactionDraft::default();
        let blank = FormValues {
            amount: String::new(),
            deduction_date: String::new(),
            ..values()
        };

        blank.apply(&mut draft).unwrap();

        assert_eq!(draft.deduction_date, None);
        assert!(!is_complete(&draft));
    }

    #[test]
    fn category_detected_only_from_valid_pan() {
        assert_eq!(detected_category("AAACA1234F"), Some(DeducteeCategory::Company));
        assert_eq!(detected_category("abcpd1234e"), Some(DeducteeCategory::Individual));
        assert_eq!(detected_category("AAAC"), None);
        assert_eq!(detected_category("ABCXD1234E"), None);
    }

    #[test]
    fn progress_marks_active_and_complete() {
        let complete = TransactionDraft {
            section_code: "194H".to_string(),
            amount: dec!(20000),
            deduction_date: NaiveDate::from_ymd_opt(2025, 6, 10),
            payment_date: NaiveDate::from_ymd_opt(2025, 7, 5),
            ..Default::default()
        };
        let drafts = vec![complete.clone(), TransactionDraft::default(), complete];

        assert_eq!(progress_line(&drafts, 1), "1✓ [2] 3✓");
        assert_eq!(progress_line(&drafts, 0), "[1✓] 2 3✓");
    }

    #[test]
    fn summary_reflects_threshold_type_and_rate() {
        let mut draft = TransactionDraft::default();
        draft.select_section(&contractors());

        assert_eq!(
            section_summary(&contractors(), &draft),
            "Threshold: ₹30,000 (Single)\nRate: 1%\nMultiple Threshold Types"
        );
    }

    #[test]
    fn summary_shows_no_pan_rate() {
        let draft = TransactionDraft {
            pan_available: false,
            ..Default::default()
        };

        let summary = section_summary(&contractors(), &draft);

        assert!(summary.contains("Rate: 20% (No PAN)"));
        assert!(summary.starts_with("Threshold: ₹1,00,000 (Annual)"));
    }
}
