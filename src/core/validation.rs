use serde::Serialize;

use super::types::PortfolioConfig;

const ALLOCATION_TOLERANCE: f64 = 0.01;
const LTV_WARNING_PCT: f64 = 50.0;
const HORIZON_WARNING_YEARS: u32 = 100;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub severity: Severity,
    pub field: &'static str,
    pub message: String,
}

impl Issue {
    fn error(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field,
            message: message.into(),
        }
    }

    fn warning(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field,
            message: message.into(),
        }
    }
}

pub fn validate(config: &PortfolioConfig) -> Vec<Issue> {
    let mut issues = Vec::new();

    let allocations = [
        ("savingsPct", config.savings_pct),
        ("investmentsPct", config.investments_pct),
        ("speculationPct", config.speculation_pct),
    ];
    for (field, value) in allocations {
        if value < 0.0 {
            issues.push(Issue::error(field, format!("{field} must be >= 0")));
        }
    }
    let total: f64 = allocations.iter().map(|(_, value)| value).sum();
    if !total.is_finite() || (total - 100.0).abs() > ALLOCATION_TOLERANCE {
        issues.push(Issue::error(
            "savingsPct",
            format!("bucket allocations must sum to 100, got {total}"),
        ));
    }

    let percentages = [
        ("collateralPct", config.collateral_pct),
        ("ltvRatio", config.ltv_ratio),
        ("incomeAllocationPct", config.income_allocation_pct),
        ("incomeReinvestmentPct", config.income_reinvestment_pct),
    ];
    for (field, value) in percentages {
        if !(0.0..=100.0).contains(&value) {
            issues.push(Issue::error(field, format!("{field} must be between 0 and 100")));
        }
    }
    if config.ltv_ratio > LTV_WARNING_PCT && config.ltv_ratio <= 100.0 {
        issues.push(Issue::warning(
            "ltvRatio",
            format!("ltvRatio above {LTV_WARNING_PCT} carries a high liquidation risk"),
        ));
    }

    if config.time_horizon == 0 {
        issues.push(Issue::warning("timeHorizon", "timeHorizon of 0 projects only the start year"));
    } else if config.time_horizon > HORIZON_WARNING_YEARS {
        issues.push(Issue::warning(
            "timeHorizon",
            format!("timeHorizon above {HORIZON_WARNING_YEARS} years is unlikely to be meaningful"),
        ));
    }
    if config.activation_year > config.time_horizon {
        issues.push(Issue::error(
            "activationYear",
            "activationYear must be <= timeHorizon",
        ));
    }

    if !is_positive(config.btc_stack) {
        issues.push(Issue::error("btcStack", "btcStack must be > 0"));
    }
    if !is_positive(config.exchange_rate) {
        issues.push(Issue::error("exchangeRate", "exchangeRate must be > 0"));
    }
    if config.price_crash > 100.0 {
        issues.push(Issue::warning(
            "priceCrash",
            "priceCrash above 100 is treated as a total loss",
        ));
    }
    if config.collateral_pct > 0.0 && !config.interest_only && config.loan_term_years == 0 {
        issues.push(Issue::warning(
            "loanTermYears",
            "amortizing loan with a 0 year term is repaid in a single year",
        ));
    }

    issues
}

fn is_positive(value: f64) -> bool {
    value > 0.0
}

pub fn has_errors(issues: &[Issue]) -> bool {
    issues.iter().any(|issue| issue.severity == Severity::Error)
}
