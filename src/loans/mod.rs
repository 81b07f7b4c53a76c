//! Home loan comparison
//!
//! Pure calculation code with no I/O. Field names serialize in camelCase so the
//! web client can send and receive the same shapes it renders.

pub mod calculations;
pub mod comparison;
pub mod samples;

pub use calculations::{
    calculate_loan, calculate_monthly_repayment, calculate_total_fees, format_currency_aud,
};
pub use comparison::{compare, LoanComparison, LoanComparisonResult, SortBy};
pub use samples::sample_loans;

use serde::{Deserialize, Serialize};

/// Longest term accepted from callers
pub const MAX_LOAN_TERM_YEARS: u32 = 50;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanFees {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub establishment_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valuation_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_fee: Option<f64>,
    /// Lenders Mortgage Insurance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lmi: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanFeatures {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redraw: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_repayments: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_rate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_rate: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetails {
    pub id: String,
    pub lender: String,
    pub loan_amount: f64,
    /// Annual rate in percent, e.g. `6.25`
    pub interest_rate: f64,
    /// Term in years
    pub loan_term: u32,
    #[serde(default)]
    pub fees: LoanFees,
    #[serde(default)]
    pub features: LoanFeatures,
}

impl LoanDetails {
    /// Reject figures the repayment formula cannot handle
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field
    pub fn validate(&self) -> Result<(), String> {
        if !self.loan_amount.is_finite() || self.loan_amount <= 0.0 {
            return Err(format!("{}: loanAmount must be greater than zero", self.id));
        }
        if !self.interest_rate.is_finite() || self.interest_rate < 0.0 {
            return Err(format!("{}: interestRate must not be negative", self.id));
        }
        if self.loan_term == 0 {
            return Err(format!("{}: loanTerm must be at least one year", self.id));
        }
        if self.loan_term > MAX_LOAN_TERM_YEARS {
            return Err(format!(
                "{}: loanTerm must not exceed {MAX_LOAN_TERM_YEARS} years",
                self.id
            ));
        }
        let fees = [
            self.fees.establishment_fee,
            self.fees.application_fee,
            self.fees.valuation_fee,
            self.fees.legal_fee,
            self.fees.lmi,
        ];
        if fees.iter().flatten().any(|fee| !fee.is_finite() || *fee < 0.0) {
            return Err(format!("{}: fees must not be negative", self.id));
        }
        Ok(())
    }
}

/// Derived figures for one loan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanCalculation {
    pub monthly_repayment: f64,
    pub total_interest: f64,
    pub total_cost: f64,
    pub total_fees: f64,
}
