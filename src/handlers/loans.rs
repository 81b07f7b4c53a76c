//! Loan comparison endpoints

use actix_web::{web, HttpResponse};

use crate::error::{AppError, AppResult};
use crate::loans::{calculate_loan, compare, sample_loans, LoanComparison, LoanDetails, SortBy};
use crate::models::CompareQuery;
use crate::utils::responses::ResponseBuilder;

fn sort_order(query: &CompareQuery) -> AppResult<SortBy> {
    query
        .sort
        .as_deref()
        .filter(|s| !s.is_empty())
        .map_or(Ok(SortBy::default()), str::parse)
        .map_err(AppError::BadRequest)
}

/// `GET /loans/compare`; the bundled demonstration lenders
///
/// # Errors
///
/// Returns 400 for an unknown sort
pub async fn compare_samples(query: web::Query<CompareQuery>) -> AppResult<HttpResponse> {
    let sort_by = sort_order(&query)?;
    Ok(ResponseBuilder::ok().json(&compare(sample_loans(), sort_by)))
}

/// `POST /loans/compare`
///
/// # Errors
///
/// Returns 400 for an unknown sort or any invalid loan
pub async fn compare_loans(
    query: web::Query<CompareQuery>,
    body: web::Json<Vec<LoanDetails>>,
) -> AppResult<HttpResponse> {
    let sort_by = sort_order(&query)?;
    let loans = body.into_inner();
    for loan in &loans {
        loan.validate().map_err(AppError::BadRequest)?;
    }
    Ok(ResponseBuilder::ok().json(&compare(loans, sort_by)))
}

/// `POST /loans/calculate`
///
/// # Errors
///
/// Returns 400 for an invalid loan
pub async fn calculate(body: web::Json<LoanDetails>) -> AppResult<HttpResponse> {
    let loan = body.into_inner();
    loan.validate().map_err(AppError::BadRequest)?;
    let calculation = calculate_loan(&loan);
    Ok(ResponseBuilder::ok().json(&LoanComparison { loan, calculation }))
}
