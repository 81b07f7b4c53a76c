use super::{LoanCalculation, LoanDetails, LoanFees};

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Standard amortisation: `M = P·r(1+r)^n / ((1+r)^n − 1)`.
///
/// `r` is the monthly rate and `n` the number of monthly payments. The result is
/// rounded to cents, except for interest-free loans which are a plain division.
#[must_use]
pub fn calculate_monthly_repayment(principal: f64, annual_rate: f64, years: u32) -> f64 {
    let payments = f64::from(years) * 12.0;
    if annual_rate.abs() < f64::EPSILON {
        return principal / payments;
    }

    let monthly_rate = annual_rate / 100.0 / 12.0;
    let growth = (1.0 + monthly_rate).powf(payments);
    round_cents(principal * monthly_rate * growth / (growth - 1.0))
}

/// Sum of the fees that are present
#[must_use]
pub fn calculate_total_fees(fees: &LoanFees) -> f64 {
    [
        fees.establishment_fee,
        fees.application_fee,
        fees.valuation_fee,
        fees.legal_fee,
        fees.lmi,
    ]
    .into_iter()
    .flatten()
    .fold(0.0, |total, fee| total + fee)
}

#[must_use]
pub fn calculate_loan(loan: &LoanDetails) -> LoanCalculation {
    let monthly_repayment =
        calculate_monthly_repayment(loan.loan_amount, loan.interest_rate, loan.loan_term);

    let total_repayments = monthly_repayment * f64::from(loan.loan_term) * 12.0;
    let total_interest = total_repayments - loan.loan_amount;
    let total_fees = calculate_total_fees(&loan.fees);
    let total_cost = total_repayments + total_fees;

    LoanCalculation {
        monthly_repayment,
        total_interest: round_cents(total_interest),
        total_cost: round_cents(total_cost),
        total_fees: round_cents(total_fees),
    }
}

/// Whole Australian dollars with thousands separators, e.g. `$1,082,993`
#[must_use]
pub fn format_currency_aud(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    // Magnitudes beyond i64 are not loan amounts
    #[allow(clippy::cast_possible_truncation)]
    let digits = (rounded.abs() as i64).to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}")
}
