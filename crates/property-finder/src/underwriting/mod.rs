//! Single-property underwriting: operating income, financing ratios, flip economics, and
//! risk classification.

pub mod amortization;
mod domain;
pub mod risk;
pub mod router;

pub use domain::{
    CalculationError, Dscr, UnderwritingInput, UnderwritingOutput, MAX_LOAN_TERM_YEARS,
};
pub use risk::{RiskAssessment, RiskLevel, RiskThresholds};
pub use router::underwriting_router;

use amortization::monthly_payment;
use risk::{assess, RiskSignals};

/// Stateless calculator applying the risk thresholds to property inputs.
#[derive(Debug, Clone, Default)]
pub struct UnderwritingCalculator {
    thresholds: RiskThresholds,
}

impl UnderwritingCalculator {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    /// Compute every underwriting figure, rejecting out-of-domain inputs.
    ///
    /// Zero denominators are guarded and yield `0` (or an unbounded DSCR) instead of
    /// failing.
    pub fn evaluate(
        &self,
        input: &UnderwritingInput,
    ) -> Result<UnderwritingOutput, CalculationError> {
        validate(input)?;

        let total_investment = input.purchase_price + input.rehab_cost;
        let loan_amount = input.loan_principal();
        let down_payment = total_investment - loan_amount;

        let effective_monthly_rent = input.monthly_rent * (1.0 - input.vacancy_rate);
        let property_management = effective_monthly_rent * input.management_fee_rate;
        let monthly_expenses = input.monthly_taxes
            + input.monthly_insurance
            + input.monthly_utilities
            + input.monthly_maintenance
            + property_management;

        let monthly_cash_flow = effective_monthly_rent - monthly_expenses;
        let noi = monthly_cash_flow * 12.0;

        let cap_rate = if total_investment > 0.0 {
            noi / total_investment * 100.0
        } else {
            0.0
        };

        let monthly_debt_service =
            monthly_payment(loan_amount, input.interest_rate, input.loan_term_years);
        if !monthly_debt_service.is_finite() {
            return Err(CalculationError::Overflow {
                field: "monthly_debt_service",
            });
        }
        let annual_debt_service = monthly_debt_service * 12.0;
        let dscr = if loan_amount > 0.0 && annual_debt_service > 0.0 {
            Dscr::Ratio(noi / annual_debt_service)
        } else {
            Dscr::Unbounded
        };

        let coc_return = if down_payment > 0.0 {
            monthly_cash_flow * 12.0 / down_payment * 100.0
        } else {
            0.0
        };

        let flip = input.flip_sale_price.map(|sale_price| {
            let total_flip_cost = total_investment
                + monthly_cash_flow * f64::from(input.holding_period_months);
            let profit = sale_price - total_flip_cost;
            let roi = if total_flip_cost != 0.0 {
                profit / total_flip_cost * 100.0
            } else {
                0.0
            };
            let margin = if sale_price != 0.0 {
                profit / sale_price * 100.0
            } else {
                0.0
            };
            (profit, roi, margin)
        });

        let assessment = assess(
            &RiskSignals {
                dscr,
                cap_rate,
                coc_return,
                flip_margin: flip.map(|(_, _, margin)| margin),
            },
            &self.thresholds,
        );

        Ok(UnderwritingOutput {
            total_investment,
            down_payment,
            monthly_income: effective_monthly_rent,
            property_management,
            monthly_expenses,
            monthly_cash_flow,
            noi,
            cap_rate,
            monthly_debt_service,
            dscr,
            coc_return,
            flip_profit: flip.map(|(profit, _, _)| profit),
            flip_roi: flip.map(|(_, roi, _)| roi),
            flip_margin: flip.map(|(_, _, margin)| margin),
            risk_level: assessment.level,
            risk_factors: assessment.factors,
        })
    }
}

fn validate(input: &UnderwritingInput) -> Result<(), CalculationError> {
    let amounts = [
        ("purchase_price", Some(input.purchase_price)),
        ("rehab_cost", Some(input.rehab_cost)),
        ("monthly_rent", Some(input.monthly_rent)),
        ("monthly_taxes", Some(input.monthly_taxes)),
        ("monthly_insurance", Some(input.monthly_insurance)),
        ("monthly_utilities", Some(input.monthly_utilities)),
        ("monthly_maintenance", Some(input.monthly_maintenance)),
        ("loan_amount", input.loan_amount),
        ("flip_sale_price", input.flip_sale_price),
    ];
    for (field, value) in amounts {
        let Some(value) = value else { continue };
        if !value.is_finite() {
            return Err(CalculationError::NotFinite { field });
        }
        if value < 0.0 {
            return Err(CalculationError::NegativeAmount { field, value });
        }
    }

    let rates = [
        ("management_fee_rate", input.management_fee_rate),
        ("vacancy_rate", input.vacancy_rate),
        ("interest_rate", input.interest_rate),
    ];
    for (field, value) in rates {
        if !value.is_finite() {
            return Err(CalculationError::NotFinite { field });
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(CalculationError::RateOutOfRange { field, value });
        }
    }

    if input.loan_principal() > 0.0
        && !(1..=MAX_LOAN_TERM_YEARS).contains(&input.loan_term_years)
    {
        return Err(CalculationError::InvalidLoanTerm);
    }

    Ok(())
}
