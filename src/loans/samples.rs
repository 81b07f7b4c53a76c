use super::{LoanDetails, LoanFeatures, LoanFees};

/// Demonstration offers from four major lenders, all $500k over 30 years
#[must_use]
pub fn sample_loans() -> Vec<LoanDetails> {
    vec![
        LoanDetails {
            id: "1".to_string(),
            lender: "ANZ Bank".to_string(),
            loan_amount: 500_000.0,
            interest_rate: 6.25,
            loan_term: 30,
            fees: LoanFees {
                establishment_fee: Some(600.0),
                application_fee: Some(0.0),
                valuation_fee: Some(200.0),
                legal_fee: None,
                lmi: Some(15_000.0),
            },
            features: LoanFeatures {
                offset: Some(true),
                redraw: Some(true),
                extra_repayments: Some(true),
                fixed_rate: None,
                variable_rate: Some(true),
            },
        },
        LoanDetails {
            id: "2".to_string(),
            lender: "Commonwealth Bank".to_string(),
            loan_amount: 500_000.0,
            interest_rate: 5.89,
            loan_term: 30,
            fees: LoanFees {
                establishment_fee: Some(800.0),
                application_fee: Some(250.0),
                valuation_fee: Some(150.0),
                legal_fee: Some(300.0),
                lmi: Some(15_000.0),
            },
            features: LoanFeatures {
                redraw: Some(true),
                fixed_rate: Some(true),
                ..LoanFeatures::default()
            },
        },
        LoanDetails {
            id: "3".to_string(),
            lender: "Westpac".to_string(),
            loan_amount: 500_000.0,
            interest_rate: 6.15,
            loan_term: 30,
            fees: LoanFees {
                establishment_fee: Some(700.0),
                application_fee: Some(0.0),
                valuation_fee: Some(180.0),
                legal_fee: None,
                lmi: Some(15_000.0),
            },
            features: LoanFeatures {
                offset: Some(true),
                redraw: Some(true),
                extra_repayments: Some(true),
                fixed_rate: None,
                variable_rate: Some(true),
            },
        },
        LoanDetails {
            id: "4".to_string(),
            lender: "NAB".to_string(),
            loan_amount: 500_000.0,
            interest_rate: 6.05,
            loan_term: 30,
            fees: LoanFees {
                establishment_fee: Some(500.0),
                application_fee: Some(200.0),
                valuation_fee: Some(200.0),
                legal_fee: None,
                lmi: Some(15_000.0),
            },
            features: LoanFeatures {
                offset: Some(true),
                redraw: Some(true),
                extra_repayments: Some(true),
                fixed_rate: None,
                variable_rate: Some(true),
            },
        },
    ]
}
