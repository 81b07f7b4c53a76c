use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{calculate_loan, format_currency_aud, LoanCalculation, LoanDetails};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    TotalCost,
    Rate,
    Repayment,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "total_cost" | "totalCost" | "cost" => Ok(Self::TotalCost),
            "rate" | "interest_rate" | "interestRate" => Ok(Self::Rate),
            "repayment" | "monthly_repayment" | "monthlyRepayment" => Ok(Self::Repayment),
            other => Err(format!(
                "Unknown sort '{other}', expected total_cost, rate or repayment"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanComparison {
    #[serde(flatten)]
    pub loan: LoanDetails,
    pub calculation: LoanCalculation,
}

/// Headline figures, pre-formatted as whole dollars
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub best_lender: String,
    pub monthly_repayment: String,
    pub total_cost: String,
    pub potential_savings: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanComparisonResult {
    pub sort_by: SortBy,
    pub count: usize,
    pub loans: Vec<LoanComparison>,
    /// Lowest total cost, whatever the sort order
    pub best_deal: Option<LoanComparison>,
    /// Highest total cost minus lowest total cost
    pub potential_savings: f64,
    pub summary: Option<ComparisonSummary>,
}

fn sort_key(sort_by: SortBy, item: &LoanComparison) -> f64 {
    match sort_by {
        SortBy::TotalCost => item.calculation.total_cost,
        SortBy::Rate => item.loan.interest_rate,
        SortBy::Repayment => item.calculation.monthly_repayment,
    }
}

fn by_total_cost(a: &LoanComparison, b: &LoanComparison) -> Ordering {
    a.calculation.total_cost.total_cmp(&b.calculation.total_cost)
}

/// Attach calculations to every loan and rank them
#[must_use]
pub fn compare(loans: Vec<LoanDetails>, sort_by: SortBy) -> LoanComparisonResult {
    let mut ranked: Vec<LoanComparison> = loans
        .into_iter()
        .map(|loan| LoanComparison {
            calculation: calculate_loan(&loan),
            loan,
        })
        .collect();
    ranked.sort_by(|a, b| sort_key(sort_by, a).total_cmp(&sort_key(sort_by, b)));

    let best_deal = ranked.iter().min_by(|a, b| by_total_cost(a, b)).cloned();
    let worst_cost = ranked
        .iter()
        .max_by(|a, b| by_total_cost(a, b))
        .map(|c| c.calculation.total_cost);
    let potential_savings = match (&best_deal, worst_cost) {
        (Some(best), Some(worst)) => {
            ((worst - best.calculation.total_cost) * 100.0).round() / 100.0
        }
        _ => 0.0,
    };

    let summary = best_deal.as_ref().map(|best| ComparisonSummary {
        best_lender: best.loan.lender.clone(),
        monthly_repayment: format_currency_aud(best.calculation.monthly_repayment),
        total_cost: format_currency_aud(best.calculation.total_cost),
        potential_savings: format_currency_aud(potential_savings),
    });

    LoanComparisonResult {
        sort_by,
        count: ranked.len(),
        loans: ranked,
        best_deal,
        potential_savings,
        summary,
    }
}
