//! Results step: per-transaction TDS, due dates and interest, with totals
//! and Excel export.

use std::fmt::Write;

use chrono::Local;
use rust_decimal::Decimal;
use cursive::Cursive;
use cursive::view::{Resizable, Scrollable};
use cursive::views::{Dialog, DummyView, LinearLayout, TextView};
use tds_core::CalculateResponse;
use tds_core::format::indian_currency;

use super::status_bar::{KeyHint, build_status_bar, hints};
use super::{banner_view, go_back, refresh_banner, show_message, show_step, step_layer};
use crate::app::AppState;

/// Renders the results table followed by late-payment notes and totals.
fn format_results(response: &CalculateResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>2}  {:<12} {:>14} {:>13} {:>12} {:<11} {:>10}",
        "#", "Section", "Amount", "Rate", "TDS", "Due Date", "Interest"
    );
    let _ = writeln!(out, "{}", "─".repeat(80));

    for r in &response.results {
        let _ = writeln!(
            out,
            "{:>2}  {:<12} {:>14} {:>13} {:>12} {:<11} {:>10}",
            r.transaction_number,
            r.section,
            r.amount_formatted,
            r.rate_display,
            r.tds_amount_formatted,
            r.due_date_formatted,
            r.interest_formatted,
        );
    }

    let late: Vec<_> = response.results.iter().filter(|r| r.is_late).collect();
    if !late.is_empty() {
        out.push('\n');
        for r in late {
            let _ = writeln!(
                out,
                "Transaction {} paid {} after due date {}: {} month(s) interest under Section 201(1A)",
                r.transaction_number, r.payment_date_formatted, r.due_date_formatted, r.months_late
            );
        }
    }

    let below: Vec<_> = response
        .results
        .iter()
        .filter(|r| r.rate.is_some() && !r.above_threshold)
        .map(|r| r.transaction_number.to_string())
        .collect();
    if !below.is_empty() {
        let _ = writeln!(out, "\nBelow threshold, no TDS: {}", below.join(", "));
    }

    let _ = write!(
        out,
        "\nTotal TDS:      {:>16}\nTotal Interest: {:>16}\nTotal Payable:  {:>16}",
        total_text(response.total_tds()),
        total_text(response.total_interest()),
        total_text(response.total_payable()),
    );
    out
}

fn total_text(total: Option<Decimal>) -> String {
    total.map_or_else(|| "out of range".to_string(), indian_currency)
}

pub(super) fn show_results(siv: &mut Cursive) {
    let Some((title, body)) = siv
        .with_user_data(|state: &mut AppState| {
            state.wizard.results().map(|r| {
                (
                    format!("Results: {} ({})", r.entity.entity_name, r.entity.pan_number),
                    format_results(r),
                )
            })
        })
        .flatten()
    else {
        return;
    };

    let banner = banner_view(siv);

    let status = build_status_bar(&[
        KeyHint::new("↑↓", "Scroll"),
        hints::ESC,
        hints::CTRL_Q,
    ]);

    let layout = LinearLayout::vertical()
        .child(banner)
        .child(TextView::new(body).scrollable().max_height(16))
        .child(DummyView.fixed_height(1))
        .child(status);

    let dialog = Dialog::around(layout)
        .title(title)
        .button("Back", go_back)
        .button("Export Excel", on_export)
        .button("New Calculation", on_new_calculation)
        .button("Main Menu", on_main_menu)
        .padding_lrtb(1, 1, 0, 0);

    siv.add_layer(step_layer(dialog));
}

fn on_export(siv: &mut Cursive) {
    let today = Local::now().date_naive();
    let saved = siv
        .with_user_data(|state: &mut AppState| state.export_report(today).ok())
        .flatten();

    match saved {
        Some(path) => {
            refresh_banner(siv);
            show_message(siv, "Report Saved", format!("Report saved to {}", path.display()));
        }
        None => refresh_banner(siv),
    }
}

fn on_new_calculation(siv: &mut Cursive) {
    siv.with_user_data(|state: &mut AppState| state.wizard.new_calculation());
    show_step(siv);
}

fn on_main_menu(siv: &mut Cursive) {
    siv.with_user_data(|state: &mut AppState| state.wizard.reset());
    siv.pop_layer();
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tds_core::{DeducteeCategory, Entity, TdsResult};

    use super::*;

    fn result(
        number: usize,
        tds: Decimal,
        interest: Decimal,
    ) -> TdsResult {
        TdsResult {
            transaction_number: number,
            section: "194J(b)".to_string(),
            section_description: "Fees for Professional services".to_string(),
            category: DeducteeCategory::Individual,
            category_short: "Individual/HUF".to_string(),
            pan_available: true,
            amount: dec!(100000),
            amount_formatted: "₹1,00,000".to_string(),
            effective_threshold: Some(dec!(50000)),
            effective_threshold_note: "₹50,000".to_string(),
            rate: Some(dec!(10)),
            rate_display: "10%".to_string(),
            tds_amount: tds,
            tds_amount_formatted: indian_currency(tds),
            above_threshold: !tds.is_zero(),
            deduction_date: "2025-06-10".to_string(),
            deduction_date_formatted: "10-Jun-2025".to_string(),
            due_date: "2025-07-07".to_string(),
            due_date_formatted: "07-Jul-2025".to_string(),
            payment_date: "2025-08-20".to_string(),
            payment_date_formatted: "20-Aug-2025".to_string(),
            is_late: !interest.is_zero(),
            months_late: if interest.is_zero() { 0 } else { 3 },
            interest,
            interest_formatted: indian_currency(interest),
            total_payable: tds + interest,
            total_payable_formatted: indian_currency(tds + interest),
            is_property_section: false,
            has_threshold_types: false,
            has_slabs: false,
            has_conditions: false,
        }
    }

    fn response() -> CalculateResponse {
        CalculateResponse {
            entity: Entity::new("Acme Traders", "AAACA1234F"),
            results: vec![
                result(1, dec!(10000), dec!(450)),
                result(2, Decimal::ZERO, Decimal::ZERO),
            ],
        }
    }

    #[test]
    fn totals_are_formatted_in_rupees() {
        let text = format_results(&response());
        let total = |label: &str| {
            text.lines()
                .find(|l| l.starts_with(label))
                .map(|l| l[label.len()..].trim().to_string())
        };

        assert_eq!(total("Total TDS:").as_deref(), Some("₹10,000"));
        assert_eq!(total("Total Interest:").as_deref(), Some("₹450"));
        assert_eq!(total("Total Payable:").as_deref(), Some("₹10,450"));
    }

    #[test]
    fn overflowing_total_is_flagged() {
        let mut response = response();
        response.results[1].tds_amount = Decimal::MAX;

        let text = format_results(&response);

        assert!(text.contains("out of range"));
        assert!(text.lines().any(|l| l.starts_with("Total Interest:") && l.ends_with("₹450")));
    }

    #[test]
    fn late_transactions_are_listed() {
        let text = format_results(&response());

        assert!(text.contains(
            "Transaction 1 paid 20-Aug-2025 after due date 07-Jul-2025: 3 month(s) interest"
        ));
        assert!(!text.contains("Transaction 2 paid"));
    }

    #[test]
    fn below_threshold_transactions_are_noted() {
        let text = format_results(&response());

        assert!(text.contains("Below threshold, no TDS: 2"));
    }

    #[test]
    fn one_row_per_result() {
        let text = format_results(&response());
        let rows: Vec<_> = text.lines().filter(|l| l.contains("194J(b)")).collect();

        assert_eq!(rows.len(), 2);
        assert!(rows[0].trim_start().starts_with("1  194J(b)"));
    }
}
