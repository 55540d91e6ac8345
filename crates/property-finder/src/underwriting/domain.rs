use serde::{Deserialize, Serialize, Serializer};

use super::risk::RiskLevel;

/// Financial parameters for a single candidate property. Money is in dollars, rates are
/// fractions (`0.075` is 7.5%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderwritingInput {
    pub purchase_price: f64,
    #[serde(default)]
    pub rehab_cost: f64,
    pub monthly_rent: f64,
    #[serde(default)]
    pub monthly_taxes: f64,
    #[serde(default)]
    pub monthly_insurance: f64,
    #[serde(default)]
    pub monthly_utilities: f64,
    #[serde(default)]
    pub monthly_maintenance: f64,
    #[serde(
        default = "default_management_fee_rate",
        alias = "property_management_fee"
    )]
    pub management_fee_rate: f64,
    #[serde(default = "default_vacancy_rate")]
    pub vacancy_rate: f64,
    #[serde(default)]
    pub loan_amount: Option<f64>,
    #[serde(default = "default_interest_rate")]
    pub interest_rate: f64,
    #[serde(default = "default_loan_term_years")]
    pub loan_term_years: u32,
    #[serde(default)]
    pub flip_sale_price: Option<f64>,
    #[serde(default = "default_holding_period_months")]
    pub holding_period_months: u32,
}

impl UnderwritingInput {
    /// Input with every optional parameter at its documented default.
    pub fn new(purchase_price: f64, monthly_rent: f64) -> Self {
        Self {
            purchase_price,
            rehab_cost: 0.0,
            monthly_rent,
            monthly_taxes: 0.0,
            monthly_insurance: 0.0,
            monthly_utilities: 0.0,
            monthly_maintenance: 0.0,
            management_fee_rate: default_management_fee_rate(),
            vacancy_rate: default_vacancy_rate(),
            loan_amount: None,
            interest_rate: default_interest_rate(),
            loan_term_years: default_loan_term_years(),
            flip_sale_price: None,
            holding_period_months: default_holding_period_months(),
        }
    }

    pub fn loan_principal(&self) -> f64 {
        self.loan_amount.unwrap_or(0.0)
    }
}

fn default_management_fee_rate() -> f64 {
    0.08
}

fn default_vacancy_rate() -> f64 {
    0.05
}

fn default_interest_rate() -> f64 {
    0.075
}

/// Longest amortization schedule the calculator accepts.
pub const MAX_LOAN_TERM_YEARS: u32 = 50;

fn default_loan_term_years() -> u32 {
    30
}

fn default_holding_period_months() -> u32 {
    6
}

/// Debt service coverage. Without debt there is nothing to cover, which is represented
/// explicitly rather than as an overflowed float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dscr {
    Ratio(f64),
    Unbounded,
}

impl Dscr {
    pub fn ratio(self) -> Option<f64> {
        match self {
            Self::Ratio(value) => Some(value),
            Self::Unbounded => None,
        }
    }

    /// Unbounded coverage is never below any threshold.
    pub fn is_below(self, threshold: f64) -> bool {
        self.ratio().map(|value| value < threshold).unwrap_or(false)
    }
}

impl Serialize for Dscr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Ratio(value) => serializer.serialize_f64(*value),
            Self::Unbounded => serializer.serialize_str("unbounded"),
        }
    }
}

/// Derived underwriting figures. Percentages are expressed as 0-100 values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnderwritingOutput {
    pub total_investment: f64,
    pub down_payment: f64,
    pub monthly_income: f64,
    pub property_management: f64,
    pub monthly_expenses: f64,
    pub monthly_cash_flow: f64,
    pub noi: f64,
    pub cap_rate: f64,
    pub monthly_debt_service: f64,
    pub dscr: Dscr,
    pub coc_return: f64,
    pub flip_profit: Option<f64>,
    pub flip_roi: Option<f64>,
    pub flip_margin: Option<f64>,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalculationError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} must be non-negative (got {value})")]
    NegativeAmount { field: &'static str, value: f64 },
    #[error("{field} must be a fraction between 0 and 1 (got {value})")]
    RateOutOfRange { field: &'static str, value: f64 },
    #[error("loan_term_years must be between 1 and 50 when a loan amount is provided")]
    InvalidLoanTerm,
    #[error("{field} is not representable for these inputs")]
    Overflow { field: &'static str },
}
