use crate::infra::{build_deal_service, load_observations};
use chrono::{Local, NaiveDate};
use clap::Args;
use property_finder::config::AppConfig;
use property_finder::deals::{
    DealListing, DealQuery, ScenarioId, ScoringRunSummary, SortKey, DEFAULT_LISTING_LIMIT,
};
use property_finder::error::AppError;
use property_finder::underwriting::{
    Dscr, UnderwritingCalculator, UnderwritingInput, UnderwritingOutput,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Observation CSV export (zip_code,metric_type,metric_date,value)
    #[arg(long)]
    pub(crate) observations: PathBuf,
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Scenario to score; repeat for several. Defaults to the configured scenarios.
    #[arg(long)]
    pub(crate) scenario: Vec<String>,
    /// Ranking column (score, rent_growth, value_growth, permit_count, income, news_count, flood_flag)
    #[arg(long)]
    pub(crate) sort_by: Option<String>,
    /// Hide deals scoring below this value
    #[arg(long)]
    pub(crate) min_score: Option<u8>,
    /// Maximum number of deals to print
    #[arg(long, default_value_t = DEFAULT_LISTING_LIMIT)]
    pub(crate) limit: usize,
}

#[derive(Args, Debug)]
pub(crate) struct UnderwriteArgs {
    #[arg(long)]
    pub(crate) purchase_price: f64,
    #[arg(long)]
    pub(crate) monthly_rent: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) rehab_cost: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) monthly_taxes: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) monthly_insurance: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) monthly_utilities: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) monthly_maintenance: f64,
    /// Management fee as a fraction of effective rent
    #[arg(long, default_value_t = 0.08)]
    pub(crate) management_fee_rate: f64,
    /// Vacancy allowance as a fraction of gross rent
    #[arg(long, default_value_t = 0.05)]
    pub(crate) vacancy_rate: f64,
    #[arg(long)]
    pub(crate) loan_amount: Option<f64>,
    /// Annual interest rate as a fraction (0.075 = 7.5%)
    #[arg(long, default_value_t = 0.075)]
    pub(crate) interest_rate: f64,
    #[arg(long, default_value_t = 30)]
    pub(crate) loan_term_years: u32,
    /// Expected resale price; enables flip figures
    #[arg(long)]
    pub(crate) flip_sale_price: Option<f64>,
    #[arg(long, default_value_t = 6)]
    pub(crate) holding_period_months: u32,
}

impl From<UnderwriteArgs> for UnderwritingInput {
    fn from(args: UnderwriteArgs) -> Self {
        Self {
            purchase_price: args.purchase_price,
            rehab_cost: args.rehab_cost,
            monthly_rent: args.monthly_rent,
            monthly_taxes: args.monthly_taxes,
            monthly_insurance: args.monthly_insurance,
            monthly_utilities: args.monthly_utilities,
            monthly_maintenance: args.monthly_maintenance,
            management_fee_rate: args.management_fee_rate,
            vacancy_rate: args.vacancy_rate,
            loan_amount: args.loan_amount,
            interest_rate: args.interest_rate,
            loan_term_years: args.loan_term_years,
            flip_sale_price: args.flip_sale_price,
            holding_period_months: args.holding_period_months,
        }
    }
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let observations = load_observations(Some(args.observations.as_path()))?;
    let service = build_deal_service(&config.scoring, observations)?;

    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let requested = (!args.scenario.is_empty()).then_some(args.scenario.as_slice());
    let summary = service.run_batch(as_of, requested)?;

    let query = DealQuery {
        scenario: None,
        min_score: args.min_score,
        sort_by: args
            .sort_by
            .as_deref()
            .map(SortKey::parse)
            .unwrap_or_default(),
        limit: args.limit,
    };
    let deals = service.deals(&query)?;

    println!("Deal ranking as of {as_of}");
    for line in render_ranking(&summary, &deals) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn run_underwrite(args: UnderwriteArgs) -> Result<(), AppError> {
    let input = UnderwritingInput::from(args);
    let output = UnderwritingCalculator::default().evaluate(&input)?;

    for line in render_underwriting(&output) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn render_ranking(summary: &ScoringRunSummary, deals: &[DealListing]) -> Vec<String> {
    let mut lines = vec![format!(
        "Generation {}: {} scores across {} ZIP codes",
        summary.generation, summary.total_deals_scored, summary.zip_codes
    )];
    for failure in &summary.failures {
        lines.push(format!("! skipped {}: {}", failure.scenario, failure.reason));
    }

    if deals.is_empty() {
        lines.push("No deals matched.".to_string());
        return lines;
    }

    let mut header = format!("{:<4}{:<7}", "#", "ZIP");
    for scenario in &summary.scenarios {
        header.push_str(&format!("{:>5}", scenario.as_str()));
    }
    header.push_str(&format!(
        "{:>6}{:>10}{:>10}{:>9}{:>6}{:>7}",
        "best", "rent_g%", "value_g%", "permits", "news", "flood"
    ));
    lines.push(header);

    for (rank, deal) in deals.iter().enumerate() {
        let mut line = format!("{:<4}{:<7}", rank + 1, deal.metrics.zip_code.as_str());
        for scenario in &summary.scenarios {
            line.push_str(&format!("{:>5}", score_cell(deal, scenario)));
        }
        line.push_str(&format!(
            "{:>6}{:>10}{:>10}{:>9}{:>6}{:>7}",
            deal.best_score
                .map(|score| score.to_string())
                .unwrap_or_else(|| "-".to_string()),
            percent_cell(deal.metrics.rent_growth),
            percent_cell(deal.metrics.value_growth),
            deal.metrics.permit_count,
            deal.metrics.news_count,
            if deal.metrics.flood_flag { "yes" } else { "no" },
        ));
        lines.push(line);
    }
    lines
}

fn score_cell(deal: &DealListing, scenario: &ScenarioId) -> String {
    deal.scores
        .get(scenario)
        .map(|score| score.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn percent_cell(value: Option<f64>) -> String {
    value
        .map(|value| format!("{value:.2}"))
        .unwrap_or_else(|| "n/a".to_string())
}

pub(crate) fn render_underwriting(output: &UnderwritingOutput) -> Vec<String> {
    let mut lines = vec![
        "Underwriting summary".to_string(),
        format!("- Total investment: ${:.2}", output.total_investment),
        format!("- Down payment: ${:.2}", output.down_payment),
        format!("- Effective monthly rent: ${:.2}", output.monthly_income),
        format!("- Property management: ${:.2}", output.property_management),
        format!("- Monthly expenses: ${:.2}", output.monthly_expenses),
        format!("- Monthly cash flow: ${:.2}", output.monthly_cash_flow),
        format!("- NOI: ${:.2}", output.noi),
        format!("- Cap rate: {:.2}%", output.cap_rate),
        format!("- Monthly debt service: ${:.2}", output.monthly_debt_service),
        match output.dscr {
            Dscr::Ratio(ratio) => format!("- DSCR: {ratio:.2}"),
            Dscr::Unbounded => "- DSCR: n/a (no debt)".to_string(),
        },
        format!("- Cash on cash return: {:.2}%", output.coc_return),
    ];

    if let (Some(profit), Some(roi), Some(margin)) =
        (output.flip_profit, output.flip_roi, output.flip_margin)
    {
        lines.push(format!(
            "- Flip: ${profit:.2} profit | {roi:.2}% ROI | {margin:.2}% margin"
        ));
    }

    lines.push(format!("Risk level: {}", output.risk_level.label()));
    for factor in &output.risk_factors {
        lines.push(format!("  - {factor}"));
    }
    lines
}
