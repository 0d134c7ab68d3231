//! Wizard state for the TDS calculator UI.
//!
//! The wizard is a linear state machine: entity → mode → count (multiple
//! mode only) → transactions → results. Views read and mutate it through
//! Cursive's user data; nothing here touches the terminal or the network,
//! so every transition can be tested directly.

use std::fmt;

use chrono::NaiveDate;
use tds_core::export::excel_filename;
use tds_core::validation::{ValidationError, validate_all, validate_draft, validate_entity};
use tds_core::{
    CalculateRequest, CalculateResponse, Entity, ExcelRequest, MAX_TRANSACTIONS, TransactionDraft,
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    Entity,
    Mode,
    Count,
    Transactions,
    Results,
}

impl fmt::Display for Step {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            Self::Entity => "entity",
            Self::Mode => "mode",
            Self::Count => "transaction count",
            Self::Transactions => "transaction",
            Self::Results => "results",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Single,
    Multiple,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Number of transactions must be between 1 and {max}, got {0}", max = MAX_TRANSACTIONS)]
    InvalidCount(usize),

    #[error("Cannot {action} on the {step} step")]
    WrongStep { action: &'static str, step: Step },

    #[error("There is no transaction {0}")]
    NoSuchTransaction(usize),
}

/// Application-wide state stored in Cursive's user data.
#[derive(Debug, Clone, Default)]
pub struct Wizard {
    step: Step,
    entity: Option<Entity>,
    mode: Option<Mode>,
    transactions: Vec<TransactionDraft>,
    active: usize,
    results: Option<CalculateResponse>,
    banner: Option<String>,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn entity(&self) -> Option<&Entity> {
        self.entity.as_ref()
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn transactions(&self) -> &[TransactionDraft] {
        &self.transactions
    }

    /// 0-based index of the transaction being edited.
    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_transaction(&self) -> Option<&TransactionDraft> {
        self.transactions.get(self.active)
    }

    pub fn active_transaction_mut(&mut self) -> Option<&mut TransactionDraft> {
        self.transactions.get_mut(self.active)
    }

    pub fn results(&self) -> Option<&CalculateResponse> {
        self.results.as_ref()
    }

    /// The single user-visible error message, if any.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn set_banner(
        &mut self,
        message: impl Into<String>,
    ) {
        self.banner = Some(message.into());
    }

    pub fn clear_banner(&mut self) {
        self.banner = None;
    }

    fn expect_step(
        &self,
        step: Step,
        action: &'static str,
    ) -> Result<(), WizardError> {
        if self.step == step {
            Ok(())
        } else {
            Err(WizardError::WrongStep {
                action,
                step: self.step,
            })
        }
    }

    fn go(
        &mut self,
        step: Step,
    ) {
        debug!(from = %self.step, to = %step, "wizard step");
        self.step = step;
        self.banner = None;
    }

    /// Validates and stores the entity, then moves to mode selection.
    pub fn submit_entity(
        &mut self,
        name: &str,
        pan: &str,
    ) -> Result<&Entity, WizardError> {
        self.expect_step(Step::Entity, "submit entity details")?;
        let entity = validate_entity(name, pan)?;
        self.go(Step::Mode);
        Ok(self.entity.insert(entity))
    }

    /// Single mode goes straight to one transaction; multiple mode asks
    /// for a count first.
    pub fn choose_mode(
        &mut self,
        mode: Mode,
    ) -> Result<(), WizardError> {
        self.expect_step(Step::Mode, "choose a mode")?;
        self.mode = Some(mode);
        match mode {
            Mode::Single => {
                self.start_transactions(1);
                self.go(Step::Transactions);
            }
            Mode::Multiple => self.go(Step::Count),
        }
        Ok(())
    }

    pub fn choose_count(
        &mut self,
        count: usize,
    ) -> Result<(), WizardError> {
        self.expect_step(Step::Count, "choose a transaction count")?;
        if !(1..=MAX_TRANSACTIONS).contains(&count) {
            return Err(WizardError::InvalidCount(count));
        }
        self.start_transactions(count);
        self.go(Step::Transactions);
        Ok(())
    }

    fn start_transactions(
        &mut self,
        count: usize,
    ) {
        self.transactions = vec![TransactionDraft::default(); count];
        self.active = 0;
        self.results = None;
    }

    /// Makes another transaction the active one.
    pub fn select_transaction(
        &mut self,
        index: usize,
    ) -> Result<(), WizardError> {
        self.expect_step(Step::Transactions, "switch transactions")?;
        if index >= self.transactions.len() {
            return Err(WizardError::NoSuchTransaction(index + 1));
        }
        self.active = index;
        Ok(())
    }

    pub fn has_next_transaction(&self) -> bool {
        self.active + 1 < self.transactions.len()
    }

    pub fn has_previous_transaction(&self) -> bool {
        self.active > 0
    }

    /// Moves to the next transaction once the active one is complete.
    pub fn next_transaction(&mut self) -> Result<(), WizardError> {
        self.expect_step(Step::Transactions, "advance")?;
        if !self.has_next_transaction() {
            return Err(WizardError::NoSuchTransaction(self.active + 2));
        }
        validate_draft(self.active, &self.transactions[self.active])?;
        self.active += 1;
        self.banner = None;
        Ok(())
    }

    pub fn previous_transaction(&mut self) -> Result<(), WizardError> {
        self.expect_step(Step::Transactions, "go back a transaction")?;
        if !self.has_previous_transaction() {
            return Err(WizardError::NoSuchTransaction(self.active));
        }
        self.active -= 1;
        self.banner = None;
        Ok(())
    }

    /// Builds the `/calculate/` payload.
    ///
    /// Single mode checks only the active transaction; multiple mode
    /// requires every transaction to be complete.
    pub fn calculation_request(&self) -> Result<CalculateRequest, WizardError> {
        self.expect_step(Step::Transactions, "calculate")?;
        let entity = self.entity.clone().unwrap_or_default();

        let transactions = match self.mode {
            Some(Mode::Multiple) => validate_all(&self.transactions)?,
            _ => {
                let draft = self
                    .active_transaction()
                    .ok_or(WizardError::NoSuchTransaction(self.active + 1))?;
                vec![validate_draft(self.active, draft)?]
            }
        };

        Ok(CalculateRequest {
            entity,
            transactions,
        })
    }

    /// Stores a successful calculation and shows the results.
    pub fn accept_results(
        &mut self,
        response: CalculateResponse,
    ) -> Result<(), WizardError> {
        self.expect_step(Step::Transactions, "show results")?;
        self.results = Some(response);
        self.go(Step::Results);
        Ok(())
    }

    /// Builds the `/generate-excel/` payload from the current results.
    pub fn excel_request(&self) -> Option<ExcelRequest> {
        self.results.as_ref().map(|r| ExcelRequest {
            entity: r.entity.clone(),
            results: r.results.clone(),
        })
    }

    /// Report filename for the submitted entity.
    pub fn export_filename(
        &self,
        today: NaiveDate,
    ) -> Option<String> {
        self.entity
            .as_ref()
            .map(|e| excel_filename(&e.entity_name, today))
    }

    /// Steps back once. Leaving a step discards what it produced: results
    /// when leaving the results, transactions when leaving the forms.
    pub fn back(&mut self) {
        let previous = match self.step {
            Step::Entity => return,
            Step::Mode => Step::Entity,
            Step::Count => Step::Mode,
            Step::Transactions => {
                self.transactions.clear();
                self.active = 0;
                match self.mode {
                    Some(Mode::Multiple) => Step::Count,
                    _ => Step::Mode,
                }
            }
            Step::Results => {
                self.results = None;
                Step::Transactions
            }
        };
        self.go(previous);
    }

    /// Keeps the entity and starts a fresh calculation from mode selection.
    pub fn new_calculation(&mut self) {
        self.mode = None;
        self.transactions.clear();
        self.active = 0;
        self.results = None;
        let step = if self.entity.is_some() {
            Step::Mode
        } else {
            Step::Entity
        };
        self.go(step);
    }

    /// Forgets everything, including the entity.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tds_core::validation::MissingField;

    use super::*;

    fn complete(section: &str) -> TransactionDraft {
        TransactionDraft {
            section_code: section.to_string(),
            amount: dec!(50000),
            deduction_date: NaiveDate::from_ymd_opt(2025, 6, 10),
            payment_date: NaiveDate::from_ymd_opt(2025, 7, 5),
            ..Default::default()
        }
    }

    fn at_mode() -> Wizard {
        let mut wizard = Wizard::new();
        wizard.submit_entity("Acme Traders", "aaaca1234f").unwrap();
        wizard
    }

    fn response(wizard: &Wizard) -> CalculateResponse {
        CalculateResponse {
            entity: wizard.entity().cloned().unwrap(),
            results: Vec::new(),
        }
    }

    #[test]
    fn starts_at_entity_step() {
        let wizard = Wizard::new();

        assert_eq!(wizard.step(), Step::Entity);
        assert!(wizard.transactions().is_empty());
        assert!(wizard.results().is_none());
    }

    #[test]
    fn entity_submission_normalizes_pan() {
        let wizard = at_mode();

        assert_eq!(wizard.step(), Step::Mode);
        assert_eq!(wizard.entity().unwrap().pan_number, "AAACA1234F");
    }

    #[test]
    fn invalid_entity_stays_on_entity_step() {
        let mut wizard = Wizard::new();

        let err = wizard.submit_entity("Acme", "12345").unwrap_err();

        assert_eq!(
            err,
            WizardError::Validation(ValidationError::InvalidPan("12345".to_string()))
        );
        assert_eq!(wizard.step(), Step::Entity);
        assert!(wizard.entity().is_none());
    }

    #[test]
    fn single_mode_creates_one_transaction() {
        let mut wizard = at_mode();

        wizard.choose_mode(Mode::Single).unwrap();

        assert_eq!(wizard.step(), Step::Transactions);
        assert_eq!(wizard.transactions().len(), 1);
        assert!(wizard.active_transaction().unwrap().pan_available);
    }

    #[test]
    fn multiple_mode_asks_for_count() {
        let mut wizard = at_mode();

        wizard.choose_mode(Mode::Multiple).unwrap();
        assert_eq!(wizard.step(), Step::Count);

        wizard.choose_count(5).unwrap();
        assert_eq!(wizard.step(), Step::Transactions);
        assert_eq!(wizard.transactions().len(), 5);
        assert_eq!(wizard.active_index(), 0);
    }

    #[test]
    fn count_is_bounded() {
        let mut wizard = at_mode();
        wizard.choose_mode(Mode::Multiple).unwrap();

        assert_eq!(wizard.choose_count(0), Err(WizardError::InvalidCount(0)));
        assert_eq!(wizard.choose_count(21), Err(WizardError::InvalidCount(21)));
        assert_eq!(wizard.step(), Step::Count);
        assert!(wizard.choose_count(20).is_ok());
    }

    #[test]
    fn actions_on_wrong_step_are_rejected() {
        let mut wizard = Wizard::new();

        assert_eq!(
            wizard.choose_mode(Mode::Single),
            Err(WizardError::WrongStep {
                action: "choose a mode",
                step: Step::Entity,
            })
        );
        assert!(wizard.calculation_request().is_err());
    }

    #[test]
    fn next_requires_active_transaction_complete() {
        let mut wizard = at_mode();
        wizard.choose_mode(Mode::Multiple).unwrap();
        wizard.choose_count(2).unwrap();

        let err = wizard.next_transaction().unwrap_err();
        assert_eq!(
            err,
            WizardError::Validation(ValidationError::IncompleteTransaction {
                number: 1,
                missing: vec![
                    MissingField::SectionCode,
                    MissingField::Amount,
                    MissingField::DeductionDate,
                    MissingField::PaymentDate,
                ],
            })
        );

        *wizard.active_transaction_mut().unwrap() = complete("194C");
        wizard.next_transaction().unwrap();
        assert_eq!(wizard.active_index(), 1);
        assert!(!wizard.has_next_transaction());
        assert!(wizard.next_transaction().is_err());

        wizard.previous_transaction().unwrap();
        assert_eq!(wizard.active_index(), 0);
    }

    #[test]
    fn multiple_mode_request_requires_all_complete() {
        let mut wizard = at_mode();
        wizard.choose_mode(Mode::Multiple).unwrap();
        wizard.choose_count(2).unwrap();
        *wizard.active_transaction_mut().unwrap() = complete("194C");

        let err = wizard.calculation_request().unwrap_err();
        assert!(matches!(
            err,
            WizardError::Validation(ValidationError::IncompleteTransaction { number: 2, .. })
        ));

        wizard.select_transaction(1).unwrap();
        *wizard.active_transaction_mut().unwrap() = complete("194H");

        let request = wizard.calculation_request().unwrap();
        assert_eq!(request.transactions.len(), 2);
        assert_eq!(request.transactions[1].section_code, "194H");
        assert_eq!(request.entity.entity_name, "Acme Traders");
    }

    #[test]
    fn single_mode_request_has_one_transaction() {
        let mut wizard = at_mode();
        wizard.choose_mode(Mode::Single).unwrap();
        *wizard.active_transaction_mut().unwrap() = complete("194J(b)");

        let request = wizard.calculation_request().unwrap();

        assert_eq!(request.transactions.len(), 1);
        assert_eq!(request.transactions[0].section_code, "194J(b)");
    }

    #[test]
    fn results_only_after_acceptance() {
        let mut wizard = at_mode();
        wizard.choose_mode(Mode::Single).unwrap();
        assert!(wizard.excel_request().is_none());

        let response = response(&wizard);
        wizard.accept_results(response).unwrap();

        assert_eq!(wizard.step(), Step::Results);
        assert!(wizard.results().is_some());
        assert_eq!(
            wizard.excel_request().unwrap().entity.entity_name,
            "Acme Traders"
        );
    }

    #[test]
    fn back_discards_what_the_step_produced() {
        let mut wizard = at_mode();
        wizard.choose_mode(Mode::Multiple).unwrap();
        wizard.choose_count(3).unwrap();
        let response = response(&wizard);
        wizard.accept_results(response).unwrap();

        wizard.back();
        assert_eq!(wizard.step(), Step::Transactions);
        assert!(wizard.results().is_none());
        assert_eq!(wizard.transactions().len(), 3);

        wizard.back();
        assert_eq!(wizard.step(), Step::Count);
        assert!(wizard.transactions().is_empty());

        wizard.back();
        wizard.back();
        assert_eq!(wizard.step(), Step::Entity);
        wizard.back();
        assert_eq!(wizard.step(), Step::Entity);
    }

    #[test]
    fn single_mode_back_returns_to_mode() {
        let mut wizard = at_mode();
        wizard.choose_mode(Mode::Single).unwrap();

        wizard.back();

        assert_eq!(wizard.step(), Step::Mode);
    }

    #[test]
    fn step_change_clears_banner() {
        let mut wizard = at_mode();
        wizard.set_banner("Network error");
        assert_eq!(wizard.banner(), Some("Network error"));

        wizard.choose_mode(Mode::Single).unwrap();

        assert_eq!(wizard.banner(), None);
    }

    #[test]
    fn new_calculation_keeps_entity() {
        let mut wizard = at_mode();
        wizard.choose_mode(Mode::Single).unwrap();

        wizard.new_calculation();

        assert_eq!(wizard.step(), Step::Mode);
        assert!(wizard.entity().is_some());
        assert!(wizard.transactions().is_empty());

        wizard.reset();
        assert_eq!(wizard.step(), Step::Entity);
        assert!(wizard.entity().is_none());
    }

    #[test]
    fn export_filename_uses_entity_name() {
        let wizard = at_mode();
        let today = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();

        assert_eq!(
            wizard.export_filename(today).as_deref(),
            Some("Acme_Traders_Report_20251103.xlsx")
        );
    }
}
