use serde::{Deserialize, Serialize};

/// User-owned portfolio inputs. Every field has a default so partially saved
/// documents load cleanly; percentages are expressed in percent units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortfolioConfig {
    pub btc_stack: f64,
    pub exchange_rate: f64,
    pub savings_pct: f64,
    pub investments_pct: f64,
    pub speculation_pct: f64,
    pub investments_start_yield: f64,
    pub investments_end_yield: f64,
    pub speculation_start_yield: f64,
    pub speculation_end_yield: f64,
    /// Optional per-year override for the investments bucket yield.
    pub investments_yields: Vec<f64>,
    /// Optional per-year override for the speculation bucket yield.
    pub speculation_yields: Vec<f64>,
    pub time_horizon: u32,
    pub activation_year: u32,
    pub collateral_pct: f64,
    pub ltv_ratio: f64,
    pub loan_rate: f64,
    pub loan_term_years: u32,
    pub interest_only: bool,
    pub income_allocation_pct: f64,
    pub income_reinvestment_pct: f64,
    pub starting_expenses: f64,
    pub price_crash: f64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            btc_stack: 1.0,
            exchange_rate: 100_000.0,
            savings_pct: 65.0,
            investments_pct: 25.0,
            speculation_pct: 10.0,
            investments_start_yield: 6.0,
            investments_end_yield: 2.0,
            speculation_start_yield: 15.0,
            speculation_end_yield: 5.0,
            investments_yields: Vec::new(),
            speculation_yields: Vec::new(),
            time_horizon: 20,
            activation_year: 5,
            collateral_pct: 0.0,
            ltv_ratio: 40.0,
            loan_rate: 8.0,
            loan_term_years: 10,
            interest_only: true,
            income_allocation_pct: 20.0,
            income_reinvestment_pct: 0.0,
            starting_expenses: 60_000.0,
            price_crash: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateInputs<'a> {
    pub inflation: &'a [f64],
    pub btc_appreciation: &'a [f64],
    pub income_yield: &'a [f64],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearResult {
    pub year: u32,
    pub btc_with_income: f64,
    pub btc_without_income: f64,
}

/// Income outcome had the income pool been activated in `activation_year`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationIncome {
    pub activation_year: u32,
    pub btc_extracted: f64,
    pub pool_usd: f64,
    pub loan_principal: f64,
    pub first_year_income: f64,
    pub first_year_income_with_leverage: f64,
    pub final_year_income: f64,
    pub final_year_income_with_leverage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub results: Vec<YearResult>,
    pub usd_income: Vec<f64>,
    pub usd_income_with_leverage: Vec<f64>,
    pub annual_expenses: Vec<f64>,
    pub btc_price: Vec<f64>,
    pub loan_principal: f64,
    /// Annual debt service on the loan (interest, or the amortizing payment).
    pub loan_interest: f64,
    pub loan_origination_year: Option<u32>,
    pub income_by_activation_year: Vec<ActivationIncome>,
}
