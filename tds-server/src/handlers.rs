use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::header,
    response::IntoResponse,
};
use chrono::Local;
use tds_core::export::{XLSX_CONTENT_TYPE, excel_filename};
use tds_core::{
    CalculateRequest, CalculateResponse, ExcelRequest, MAX_TRANSACTIONS, SectionListing,
    TdsWorksheet,
};
use tracing::{debug, info};

use crate::errors::ApiError;
use crate::excel::generate_report;
use crate::state::AppState;

/// Collects every problem with a calculation request.
pub fn validate_calculate_request(request: &CalculateRequest) -> Vec<String> {
    let mut problems = Vec::new();

    if request.entity.entity_name.trim().is_empty() {
        problems.push("Entity name is required".to_string());
    }
    if request.transactions.is_empty() {
        problems.push("At least one transaction is required".to_string());
    }
    if request.transactions.len() > MAX_TRANSACTIONS {
        problems.push(format!(
            "At most {MAX_TRANSACTIONS} transactions are allowed, got {}",
            request.transactions.len()
        ));
    }
    for (idx, txn) in request.transactions.iter().enumerate() {
        if txn.section_code.trim().is_empty() {
            problems.push(format!("Transaction {}: section code is required", idx + 1));
        }
        if txn.amount.is_sign_negative() {
            problems.push(format!("Transaction {}: amount must not be negative", idx + 1));
        }
    }

    problems
}

pub async fn list_sections(
    State(state): State<AppState>,
) -> Result<Json<Vec<SectionListing>>, ApiError> {
    let catalog = state.repo.catalog().await?;
    debug!(count = catalog.len(), "listing sections");
    Ok(Json(catalog.listings()))
}

pub async fn calculate(
    State(state): State<AppState>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<Json<CalculateResponse>, ApiError> {
    let Json(request) = payload?;

    let problems = validate_calculate_request(&request);
    if !problems.is_empty() {
        return Err(ApiError::Validation(problems));
    }

    let catalog = state.repo.catalog().await?;
    let results = TdsWorksheet::new(&catalog).calculate_all(&request.transactions)?;

    info!(
        entity = %request.entity.entity_name,
        transactions = results.len(),
        "calculated TDS"
    );

    Ok(Json(CalculateResponse {
        entity: request.entity,
        results,
    }))
}

pub async fn generate_excel(
    payload: Result<Json<ExcelRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;

    if request.results.is_empty() {
        return Err(ApiError::Validation(vec![
            "At least one result is required".to_string(),
        ]));
    }

    let bytes = generate_report(&request.entity, &request.results)?;
    let filename = excel_filename(&request.entity.entity_name, Local::now().date_naive());

    info!(file = %filename, sheets = request.results.len(), "generated report");

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tds_core::{DeducteeCategory, Entity, TransactionInput};

    use super::*;

    fn txn(amount: rust_decimal::Decimal) -> TransactionInput {
        TransactionInput {
            deductee_name: None,
            deductee_pan: None,
            section_code: "194H".to_string(),
            amount,
            category: DeducteeCategory::Individual,
            pan_available: true,
            deduction_date: NaiveDate::from_ymd_opt(2025, 5, 15).unwrap(),
            payment_date: NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
            threshold_type: None,
            annual_threshold_exceeded: false,
            selected_slab: None,
            selected_condition: None,
            threshold_exceeded_before: false,
        }
    }

    #[test]
    fn valid_request_has_no_problems() {
        let request = CalculateRequest {
            entity: Entity::new("Acme", "AAACA1234F"),
            transactions: vec![txn(dec!(1000))],
        };

        assert!(validate_calculate_request(&request).is_empty());
    }

    #[test]
    fn collects_every_problem() {
        let mut bad = txn(dec!(-1));
        bad.section_code = " ".to_string();
        let request = CalculateRequest {
            entity: Entity::new("", ""),
            transactions: vec![txn(dec!(1000)), bad],
        };

        assert_eq!(
            validate_calculate_request(&request),
            vec![
                "Entity name is required",
                "Transaction 2: section code is required",
                "Transaction 2: amount must not be negative",
            ]
        );
    }

    #[test]
    fn rejects_empty_and_oversized_batches() {
        let empty = CalculateRequest {
            entity: Entity::new("Acme", ""),
            transactions: Vec::new(),
        };
        let oversized = CalculateRequest {
            entity: Entity::new("Acme", ""),
            transactions: vec![txn(dec!(1)); MAX_TRANSACTIONS + 1],
        };

        assert_eq!(
            validate_calculate_request(&empty),
            vec!["At least one transaction is required"]
        );
        assert_eq!(
            validate_calculate_request(&oversized),
            vec!["At most 20 transactions are allowed, got 21"]
        );
    }
}
