/// Level monthly payment for a fully amortizing loan.
///
/// `annual_rate` is a fraction. A zero rate spreads the principal evenly; no principal or
/// no payments means no debt service.
pub fn monthly_payment(principal: f64, annual_rate: f64, term_years: u32) -> f64 {
    let payments = term_years.saturating_mul(12);
    if principal <= 0.0 || payments == 0 {
        return 0.0;
    }

    let monthly_rate = annual_rate / 12.0;
    if monthly_rate == 0.0 {
        return principal / f64::from(payments);
    }

    let growth = (1.0 + monthly_rate).powf(f64::from(payments));
    principal * (monthly_rate * growth) / (growth - 1.0)
}
