use serde::{Deserialize, Serialize};

use super::domain::Dscr;

/// Severity of an underwriting result. Ordered so the worst level compares greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Cut-offs used by the risk rules. Ratios are plain, yields are percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub high_risk_dscr: f64,
    pub moderate_risk_dscr: f64,
    pub minimum_cap_rate: f64,
    pub maximum_cap_rate: f64,
    pub minimum_coc_return: f64,
    pub minimum_flip_margin: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high_risk_dscr: 1.25,
            moderate_risk_dscr: 1.5,
            minimum_cap_rate: 4.0,
            maximum_cap_rate: 12.0,
            minimum_coc_return: 8.0,
            minimum_flip_margin: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub factors: Vec<String>,
}

pub(crate) struct RiskSignals {
    pub dscr: Dscr,
    pub cap_rate: f64,
    pub coc_return: f64,
    pub flip_margin: Option<f64>,
}

pub const ACCEPTABLE_FACTOR: &str = "All metrics within acceptable ranges";

struct Assessor {
    level: RiskLevel,
    factors: Vec<String>,
}

impl Assessor {
    fn flag(&mut self, level: RiskLevel, factor: String) {
        self.level = self.level.max(level);
        self.factors.push(factor);
    }
}

pub(crate) fn assess(signals: &RiskSignals, thresholds: &RiskThresholds) -> RiskAssessment {
    let mut assessor = Assessor {
        level: RiskLevel::Low,
        factors: Vec::new(),
    };

    if signals.dscr.is_below(thresholds.high_risk_dscr) {
        assessor.flag(
            RiskLevel::High,
            format!(
                "DSCR below {} (high debt risk)",
                thresholds.high_risk_dscr
            ),
        );
    } else if signals.dscr.is_below(thresholds.moderate_risk_dscr) {
        assessor.flag(
            RiskLevel::Medium,
            format!(
                "DSCR below {} (moderate debt risk)",
                thresholds.moderate_risk_dscr
            ),
        );
    }

    if signals.cap_rate < thresholds.minimum_cap_rate {
        assessor.flag(
            RiskLevel::Medium,
            format!("Cap rate below {}% (low yield)", thresholds.minimum_cap_rate),
        );
    } else if signals.cap_rate > thresholds.maximum_cap_rate {
        assessor.flag(
            RiskLevel::High,
            format!(
                "Cap rate above {}% (high risk area)",
                thresholds.maximum_cap_rate
            ),
        );
    }

    if signals.coc_return < thresholds.minimum_coc_return {
        assessor.flag(
            RiskLevel::Medium,
            format!(
                "Cash on cash return below {}%",
                thresholds.minimum_coc_return
            ),
        );
    }

    if let Some(margin) = signals.flip_margin {
        if margin < thresholds.minimum_flip_margin {
            assessor.flag(
                RiskLevel::High,
                format!("Flip margin below {}%", thresholds.minimum_flip_margin),
            );
        }
    }

    if assessor.factors.is_empty() {
        assessor.factors.push(ACCEPTABLE_FACTOR.to_string());
    }

    RiskAssessment {
        level: assessor.level,
        factors: assessor.factors,
    }
}
