use super::types::{ActivationIncome, PortfolioConfig, ProjectionResult, RateInputs, YearResult};

const AMORTIZATION_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
struct BucketShares {
    savings: f64,
    investments: f64,
    speculation: f64,
}

impl BucketShares {
    fn from_config(config: &PortfolioConfig) -> Self {
        Self {
            savings: share(config.savings_pct),
            investments: share(config.investments_pct),
            speculation: share(config.speculation_pct),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Loan {
    principal: f64,
    annual_service: f64,
    origination_year: u32,
    term_years: u32,
    interest_only: bool,
}

impl Loan {
    fn service_in_year(self, year: u32) -> f64 {
        if self.interest_only || year - self.origination_year < self.term_years {
            self.annual_service
        } else {
            0.0
        }
    }

    fn is_degenerate(self) -> bool {
        self.principal <= 0.0
    }
}

#[derive(Debug, Clone, Copy)]
struct Activation {
    year: u32,
    btc_extracted: f64,
    pool_usd: f64,
    loan: Loan,
}

#[derive(Debug)]
struct Track {
    holdings: Vec<f64>,
    income: Vec<f64>,
    income_with_leverage: Vec<f64>,
    activation: Option<Activation>,
}

/// Runs the full year-by-year projection. Pure and deterministic: the result
/// depends only on the arguments and is rebuilt from scratch on every call.
pub fn project(rates: RateInputs<'_>, config: &PortfolioConfig) -> ProjectionResult {
    let horizon = config.time_horizon;
    let prices = btc_price_path(config.exchange_rate, rates.btc_appreciation, horizon);

    let with_income = simulate_track(rates, config, &prices, Some(config.activation_year));
    let without_income = simulate_track(rates, config, &prices, None);

    let crash_factor = 1.0 - finite_or_zero(config.price_crash) / 100.0;
    let results = (0..=horizon)
        .map(|year| {
            let idx = year as usize;
            YearResult {
                year,
                btc_with_income: non_negative(with_income.holdings[idx] * crash_factor),
                btc_without_income: non_negative(without_income.holdings[idx] * crash_factor),
            }
        })
        .collect();

    let income_by_activation_year = (0..=horizon)
        .map(|year| activation_income(rates, config, &prices, year))
        .collect();

    let (loan_principal, loan_interest, loan_origination_year) = match with_income.activation {
        Some(activation) if !activation.loan.is_degenerate() => (
            activation.loan.principal,
            activation.loan.annual_service,
            Some(activation.year),
        ),
        _ => (0.0, 0.0, None),
    };

    ProjectionResult {
        results,
        usd_income: with_income.income,
        usd_income_with_leverage: with_income.income_with_leverage,
        annual_expenses: expense_path(config.starting_expenses, rates.inflation, horizon),
        btc_price: prices,
        loan_principal,
        loan_interest,
        loan_origination_year,
        income_by_activation_year,
    }
}

fn activation_income(
    rates: RateInputs<'_>,
    config: &PortfolioConfig,
    prices: &[f64],
    activation_year: u32,
) -> ActivationIncome {
    let track = simulate_track(rates, config, prices, Some(activation_year));
    let first = activation_year as usize;
    let last = config.time_horizon as usize;
    let (btc_extracted, pool_usd, loan_principal) = track
        .activation
        .map(|a| (a.btc_extracted, a.pool_usd, a.loan.principal))
        .unwrap_or((0.0, 0.0, 0.0));

    ActivationIncome {
        activation_year,
        btc_extracted,
        pool_usd,
        loan_principal,
        first_year_income: track.income[first],
        first_year_income_with_leverage: track.income_with_leverage[first],
        final_year_income: track.income[last],
        final_year_income_with_leverage: track.income_with_leverage[last],
    }
}

fn simulate_track(
    rates: RateInputs<'_>,
    config: &PortfolioConfig,
    prices: &[f64],
    activation_year: Option<u32>,
) -> Track {
    let horizon = config.time_horizon;
    let years = horizon as usize + 1;
    let shares = BucketShares::from_config(config);
    let reinvest_pct = finite_or_zero(config.income_reinvestment_pct);
    let reinvest_factor = (1.0 + reinvest_pct / 100.0).max(0.0);

    let mut track = Track {
        holdings: Vec::with_capacity(years),
        income: vec![0.0; years],
        income_with_leverage: vec![0.0; years],
        activation: None,
    };

    let mut btc = non_negative(finite_or_zero(config.btc_stack));
    let mut pool = 0.0;
    let mut leveraged_pool = 0.0;

    for year in 0..=horizon {
        let idx = year as usize;

        if activation_year == Some(year) {
            let activation = activate(config, shares, btc, prices[idx], year);
            btc = non_negative(btc - activation.btc_extracted);
            pool = activation.pool_usd;
            leveraged_pool = non_negative(pool + activation.loan.principal);
            track.activation = Some(activation);
        }

        if let Some(activation) = track.activation {
            let net_rate = (rate_at(rates.income_yield, idx) - reinvest_pct) / 100.0;
            let base_income = non_negative(pool * net_rate);
            let leveraged_income = if activation.loan.is_degenerate() {
                base_income
            } else {
                non_negative(leveraged_pool * net_rate - activation.loan.service_in_year(year))
            };
            track.income[idx] = base_income;
            track.income_with_leverage[idx] = leveraged_income;

            pool = non_negative(pool * reinvest_factor);
            leveraged_pool = non_negative(leveraged_pool * reinvest_factor);
        }

        track.holdings.push(btc);
        btc = advance_holdings(btc, shares, config, year);
    }

    track
}

fn activate(
    config: &PortfolioConfig,
    shares: BucketShares,
    btc: f64,
    price: f64,
    year: u32,
) -> Activation {
    let fraction = finite_or_zero(config.income_allocation_pct) / 100.0;
    let btc_extracted = (btc * fraction).clamp(0.0, btc);
    let pool_usd = non_negative(btc_extracted * price);
    let loan = originate_loan(config, shares, btc, price, year);

    Activation {
        year,
        btc_extracted,
        pool_usd,
        loan,
    }
}

fn originate_loan(
    config: &PortfolioConfig,
    shares: BucketShares,
    btc: f64,
    price: f64,
    year: u32,
) -> Loan {
    let collateral_pct = finite_or_zero(config.collateral_pct);
    if collateral_pct <= 0.0 {
        return Loan::default();
    }

    let savings_btc = btc * shares.savings;
    let principal = non_negative(
        savings_btc * collateral_pct / 100.0 * finite_or_zero(config.ltv_ratio) / 100.0 * price,
    );
    let annual_service = if config.interest_only {
        non_negative(principal * finite_or_zero(config.loan_rate) / 100.0)
    } else {
        amortizing_payment(principal, config.loan_rate, config.loan_term_years)
    };

    Loan {
        principal,
        annual_service,
        origination_year: year,
        term_years: config.loan_term_years,
        interest_only: config.interest_only,
    }
}

/// Standard annuity payment. A zero rate spreads principal evenly; a zero
/// `(1+r)^n - 1` denominator is replaced by 1.
fn amortizing_payment(principal: f64, rate_pct: f64, term_years: u32) -> f64 {
    let rate = finite_or_zero(rate_pct) / 100.0;
    if rate == 0.0 {
        return non_negative(principal / term_years.max(1) as f64);
    }

    let growth = (1.0 + rate).powi(term_years as i32);
    let mut denominator = growth - 1.0;
    if denominator.abs() < AMORTIZATION_EPSILON || !denominator.is_finite() {
        denominator = 1.0;
    }
    non_negative(principal * rate * growth / denominator)
}

fn advance_holdings(btc: f64, shares: BucketShares, config: &PortfolioConfig, year: u32) -> f64 {
    let horizon = config.time_horizon;
    let investments_yield = bucket_yield(
        &config.investments_yields,
        config.investments_start_yield,
        config.investments_end_yield,
        year,
        horizon,
    );
    let speculation_yield = bucket_yield(
        &config.speculation_yields,
        config.speculation_start_yield,
        config.speculation_end_yield,
        year,
        horizon,
    );

    non_negative(
        btc * shares.savings
            + btc * shares.investments * growth_factor(investments_yield)
            + btc * shares.speculation * growth_factor(speculation_yield),
    )
}

fn bucket_yield(series: &[f64], start: f64, end: f64, year: u32, horizon: u32) -> f64 {
    match series.get(year as usize) {
        Some(value) if value.is_finite() => *value,
        _ => finite_or_zero(blended_rate(start, end, year, horizon)),
    }
}

fn blended_rate(start: f64, end: f64, year: u32, horizon: u32) -> f64 {
    let denominator = horizon.max(1) as f64;
    start - (start - end) * year as f64 / denominator
}

fn btc_price_path(exchange_rate: f64, appreciation: &[f64], horizon: u32) -> Vec<f64> {
    let mut prices = Vec::with_capacity(horizon as usize + 1);
    let mut price = non_negative(finite_or_zero(exchange_rate));
    for year in 0..=horizon as usize {
        prices.push(price);
        price = non_negative(price * growth_factor(rate_at(appreciation, year)));
    }
    prices
}

fn expense_path(starting_expenses: f64, inflation: &[f64], horizon: u32) -> Vec<f64> {
    let mut expenses = Vec::with_capacity(horizon as usize + 1);
    let mut current = non_negative(finite_or_zero(starting_expenses));
    for year in 0..=horizon as usize {
        expenses.push(current);
        current = non_negative(current * growth_factor(rate_at(inflation, year)));
    }
    expenses
}

fn rate_at(series: &[f64], year: usize) -> f64 {
    series.get(year).copied().map(finite_or_zero).unwrap_or(0.0)
}

fn growth_factor(rate_pct: f64) -> f64 {
    (1.0 + finite_or_zero(rate_pct) / 100.0).max(0.0)
}

fn share(pct: f64) -> f64 {
    (finite_or_zero(pct) / 100.0).max(0.0)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, f64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn flat(rate: f64, horizon: u32) -> Vec<f64> {
        vec![rate; horizon as usize + 1]
    }

    fn zero_growth_config() -> PortfolioConfig {
        PortfolioConfig {
            btc_stack: 1.0,
            exchange_rate: 100_000.0,
            savings_pct: 100.0,
            investments_pct: 0.0,
            speculation_pct: 0.0,
            investments_start_yield: 0.0,
            investments_end_yield: 0.0,
            speculation_start_yield: 0.0,
            speculation_end_yield: 0.0,
            investments_yields: Vec::new(),
            speculation_yields: Vec::new(),
            time_horizon: 10,
            activation_year: 0,
            collateral_pct: 0.0,
            ltv_ratio: 0.0,
            loan_rate: 0.0,
            loan_term_years: 10,
            interest_only: true,
            income_allocation_pct: 0.0,
            income_reinvestment_pct: 0.0,
            starting_expenses: 0.0,
            price_crash: 0.0,
        }
    }

    fn run(config: &PortfolioConfig, inflation: f64, btc: f64, income: f64) -> ProjectionResult {
        let h = config.time_horizon;
        let (i, b, y) = (flat(inflation, h), flat(btc, h), flat(income, h));
        project(
            RateInputs {
                inflation: &i,
                btc_appreciation: &b,
                income_yield: &y,
            },
            config,
        )
    }

    #[test]
    fn result_length_is_horizon_plus_one() {
        for horizon in [0, 1, 2, 17] {
            let mut config = zero_growth_config();
            config.time_horizon = horizon;
            let result = run(&config, 3.0, 10.0, 5.0);
            assert_eq!(result.results.len(), horizon as usize + 1);
            assert_eq!(result.usd_income.len(), horizon as usize + 1);
            assert_eq!(result.annual_expenses.len(), horizon as usize + 1);
            assert_eq!(result.income_by_activation_year.len(), horizon as usize + 1);
        }
    }

    #[test]
    fn zero_growth_keeps_both_tracks_at_the_stack() {
        let mut config = zero_growth_config();
        config.btc_stack = 2.5;
        config.savings_pct = 50.0;
        config.investments_pct = 30.0;
        config.speculation_pct = 20.0;
        let result = run(&config, 0.0, 0.0, 0.0);
        for row in &result.results {
            assert_approx(row.btc_with_income, 2.5);
            assert_approx(row.btc_without_income, 2.5);
        }
    }

    #[test]
    fn single_bucket_compounds_constant_yield() {
        let mut config = zero_growth_config();
        config.savings_pct = 0.0;
        config.investments_pct = 100.0;
        config.investments_start_yield = 20.0;
        config.investments_end_yield = 20.0;
        config.time_horizon = 5;
        let result = run(&config, 0.0, 0.0, 0.0);
        assert_approx(result.results[5].btc_without_income, 2.48832);
        for (n, row) in result.results.iter().enumerate() {
            assert_approx(row.btc_without_income, 1.2_f64.powi(n as i32));
        }
    }

    #[test]
    fn bucket_yield_series_overrides_blend_where_present() {
        let mut config = zero_growth_config();
        config.savings_pct = 0.0;
        config.investments_pct = 100.0;
        config.investments_start_yield = 10.0;
        config.investments_end_yield = 10.0;
        config.investments_yields = vec![50.0, f64::NAN];
        config.time_horizon = 3;
        let result = run(&config, 0.0, 0.0, 0.0);
        assert_approx(result.results[1].btc_without_income, 1.5);
        // NaN slot and missing slot both fall back to the 10% blend.
        assert_approx(result.results[3].btc_without_income, 1.5 * 1.1 * 1.1);
    }

    #[test]
    fn blended_rate_guards_zero_horizon() {
        assert_approx(blended_rate(10.0, 2.0, 0, 0), 10.0);
        assert_approx(blended_rate(10.0, 2.0, 5, 10), 6.0);
        assert_approx(blended_rate(10.0, 2.0, 10, 10), 2.0);
    }

    #[test]
    fn savings_bucket_never_grows_from_yield() {
        let mut config = zero_growth_config();
        config.investments_start_yield = 40.0;
        config.investments_end_yield = 40.0;
        let result = run(&config, 0.0, 25.0, 0.0);
        assert_approx(result.results[10].btc_without_income, 1.0);
        assert!(result.btc_price[10] > result.btc_price[0]);
    }

    #[test]
    fn interest_only_loan_matches_hand_calculation() {
        let mut config = zero_growth_config();
        config.collateral_pct = 50.0;
        config.ltv_ratio = 50.0;
        config.loan_rate = 6.0;
        config.interest_only = true;
        let result = run(&config, 0.0, 0.0, 0.0);
        assert_approx(result.loan_principal, 25_000.0);
        assert_approx(result.loan_interest, 1_500.0);
        assert_eq!(result.loan_origination_year, Some(0));
    }

    #[test]
    fn loan_is_sized_before_income_extraction() {
        let mut config = zero_growth_config();
        config.collateral_pct = 50.0;
        config.ltv_ratio = 50.0;
        config.loan_rate = 6.0;
        config.income_allocation_pct = 25.0;
        config.activation_year = 1;
        let result = run(&config, 0.0, 0.0, 8.0);
        assert_approx(result.loan_principal, 25_000.0);
        assert_approx(result.loan_interest, 1_500.0);
        assert_approx(result.usd_income[1], 2_000.0);
        // (25k pool + 25k loan) * 8% - 1.5k interest.
        assert_approx(result.usd_income_with_leverage[1], 2_500.0);
        assert_approx(result.income_by_activation_year[3].loan_principal, 25_000.0);
    }

    #[test]
    fn amortizing_loan_uses_annuity_payment() {
        let payment = amortizing_payment(100_000.0, 5.0, 10);
        assert_approx_tol(payment, 12_950.4575, 1e-3);
        assert_approx(amortizing_payment(10_000.0, 0.0, 4), 2_500.0);
        assert_approx(amortizing_payment(10_000.0, 0.0, 0), 10_000.0);
        // Zero term: (1+r)^0 - 1 == 0, denominator replaced by 1.
        assert_approx(amortizing_payment(10_000.0, 5.0, 0), 500.0);
    }

    #[test]
    fn amortizing_service_stops_after_term() {
        let mut config = zero_growth_config();
        config.time_horizon = 6;
        config.collateral_pct = 100.0;
        config.ltv_ratio = 10.0;
        config.loan_rate = 0.0;
        config.loan_term_years = 2;
        config.interest_only = false;
        config.income_allocation_pct = 50.0;
        config.activation_year = 1;
        let result = run(&config, 0.0, 0.0, 10.0);

        // Pool 50k + loan (1 BTC * 10% * 100k = 10k) at 10% less 5k service.
        assert_approx(result.loan_principal, 10_000.0);
        assert_approx(result.usd_income_with_leverage[1], 1_000.0);
        assert_approx(result.usd_income_with_leverage[2], 1_000.0);
        assert_approx(result.usd_income_with_leverage[3], 6_000.0);
        assert_approx(result.usd_income[3], 5_000.0);
    }

    #[test]
    fn income_starts_at_activation_year() {
        let mut config = zero_growth_config();
        config.income_allocation_pct = 25.0;
        config.activation_year = 1;
        let result = run(&config, 0.0, 0.0, 8.0);
        assert_approx(result.usd_income[0], 0.0);
        assert_approx(result.usd_income[1], 2_000.0);
        assert_approx(result.usd_income_with_leverage[1], 2_000.0);
        assert_approx(result.results[0].btc_with_income, 1.0);
        assert_approx(result.results[1].btc_with_income, 0.75);
        assert_approx(result.results[1].btc_without_income, 1.0);
    }

    #[test]
    fn reinvestment_reduces_payout_and_grows_pool() {
        let mut config = zero_growth_config();
        config.income_allocation_pct = 10.0;
        config.income_reinvestment_pct = 2.0;
        config.time_horizon = 2;
        let result = run(&config, 0.0, 0.0, 8.0);
        assert_approx(result.usd_income[0], 10_000.0 * 0.06);
        assert_approx(result.usd_income[1], 10_000.0 * 1.02 * 0.06);
        assert_approx(result.usd_income[2], 10_000.0 * 1.02 * 1.02 * 0.06);
    }

    #[test]
    fn income_pool_valued_at_appreciated_price() {
        let mut config = zero_growth_config();
        config.income_allocation_pct = 100.0;
        config.activation_year = 2;
        config.time_horizon = 3;
        let result = run(&config, 0.0, 10.0, 10.0);
        assert_approx(result.btc_price[2], 121_000.0);
        assert_approx(result.usd_income[2], 12_100.0);
        assert_approx(result.results[2].btc_with_income, 0.0);
    }

    #[test]
    fn expenses_inflate_year_over_year() {
        let mut config = zero_growth_config();
        config.starting_expenses = 50_000.0;
        config.time_horizon = 4;
        let result = run(&config, 3.0, 0.0, 0.0);
        assert_approx(result.annual_expenses[0], 50_000.0);
        assert_approx(result.annual_expenses[1], 51_500.0);
        assert_approx(result.annual_expenses[4], 50_000.0 * 1.03_f64.powi(4));
    }

    #[test]
    fn crash_scales_btc_but_not_income() {
        let mut config = zero_growth_config();
        config.income_allocation_pct = 25.0;
        config.activation_year = 1;
        let baseline = run(&config, 0.0, 0.0, 8.0);
        config.price_crash = 40.0;
        let crashed = run(&config, 0.0, 0.0, 8.0);
        for (a, b) in baseline.results.iter().zip(&crashed.results) {
            assert_approx(b.btc_with_income, a.btc_with_income * 0.6);
            assert_approx(b.btc_without_income, a.btc_without_income * 0.6);
        }
        assert_eq!(baseline.usd_income, crashed.usd_income);
    }

    #[test]
    fn short_and_non_finite_series_read_as_zero() {
        let config = PortfolioConfig {
            time_horizon: 5,
            starting_expenses: 1_000.0,
            ..zero_growth_config()
        };
        let inflation = vec![f64::INFINITY, 10.0];
        let btc = vec![f64::NAN];
        let income: Vec<f64> = Vec::new();
        let result = project(
            RateInputs {
                inflation: &inflation,
                btc_appreciation: &btc,
                income_yield: &income,
            },
            &config,
        );
        assert_approx(result.annual_expenses[1], 1_000.0);
        assert_approx(result.annual_expenses[2], 1_100.0);
        assert_approx(result.annual_expenses[5], 1_100.0);
        assert!(result.btc_price.iter().all(|p| (*p - 100_000.0).abs() < EPS));
    }

    #[test]
    fn activation_table_reuses_income_formulas() {
        let mut config = zero_growth_config();
        config.income_allocation_pct = 25.0;
        config.activation_year = 1;
        config.time_horizon = 3;
        let result = run(&config, 0.0, 10.0, 8.0);
        let table = &result.income_by_activation_year;
        assert_eq!(table.len(), 4);
        for entry in table {
            let price = result.btc_price[entry.activation_year as usize];
            assert_approx(entry.btc_extracted, 0.25);
            assert_approx(entry.pool_usd, 0.25 * price);
            assert_approx(entry.first_year_income, 0.25 * price * 0.08);
        }
        assert_approx(table[1].first_year_income, result.usd_income[1]);
        assert_approx(table[1].final_year_income, result.usd_income[3]);
    }

    #[test]
    fn activation_beyond_horizon_produces_no_income() {
        let mut config = zero_growth_config();
        config.income_allocation_pct = 50.0;
        config.collateral_pct = 50.0;
        config.ltv_ratio = 50.0;
        config.activation_year = 99;
        let result = run(&config, 0.0, 0.0, 8.0);
        assert!(result.usd_income.iter().all(|v| *v == 0.0));
        assert_approx(result.loan_principal, 0.0);
        assert_eq!(result.loan_origination_year, None);
    }

    fn assert_all_finite_non_negative(result: &ProjectionResult) {
        for row in &result.results {
            assert!(row.btc_with_income.is_finite() && row.btc_with_income >= 0.0);
            assert!(row.btc_without_income.is_finite() && row.btc_without_income >= 0.0);
        }
        for v in result
            .usd_income
            .iter()
            .chain(&result.usd_income_with_leverage)
            .chain(&result.annual_expenses)
        {
            assert!(v.is_finite() && *v >= 0.0, "bad value {v}");
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_outputs_are_finite_and_non_negative(
            horizon in 0u32..30,
            activation in 0u32..35,
            savings in -50.0f64..150.0,
            investments in -50.0f64..150.0,
            speculation in -50.0f64..150.0,
            inv_yield in -300.0f64..300.0,
            spec_yield in -300.0f64..300.0,
            inflation in -150.0f64..150.0,
            btc in -150.0f64..300.0,
            income in -150.0f64..150.0,
            crash in -100.0f64..250.0,
            collateral in -50.0f64..150.0,
            ltv in -50.0f64..150.0,
            loan_rate in -20.0f64..40.0,
            interest_only in proptest::bool::ANY,
            income_alloc in -50.0f64..150.0,
            reinvest in -50.0f64..50.0
        ) {
            let config = PortfolioConfig {
                btc_stack: 3.0,
                savings_pct: savings,
                investments_pct: investments,
                speculation_pct: speculation,
                investments_start_yield: inv_yield,
                investments_end_yield: -inv_yield,
                speculation_start_yield: spec_yield,
                speculation_end_yield: spec_yield / 2.0,
                time_horizon: horizon,
                activation_year: activation,
                collateral_pct: collateral,
                ltv_ratio: ltv,
                loan_rate,
                interest_only,
                income_allocation_pct: income_alloc,
                income_reinvestment_pct: reinvest,
                price_crash: crash,
                starting_expenses: 40_000.0,
                ..zero_growth_config()
            };
            let result = run(&config, inflation, btc, income);
            prop_assert_eq!(result.results.len(), horizon as usize + 1);
            assert_all_finite_non_negative(&result);
        }

        #[test]
        fn prop_crash_scales_every_year(
            horizon in 0u32..20,
            crash in -200.0f64..100.0,
            inv_yield in -50.0f64..80.0,
            activation in 0u32..20
        ) {
            let mut config = zero_growth_config();
            config.time_horizon = horizon;
            config.savings_pct = 40.0;
            config.investments_pct = 60.0;
            config.investments_start_yield = inv_yield;
            config.investments_end_yield = inv_yield;
            config.income_allocation_pct = 30.0;
            config.activation_year = activation;
            let baseline = run(&config, 2.0, 15.0, 6.0);
            config.price_crash = crash;
            let crashed = run(&config, 2.0, 15.0, 6.0);
            let factor = 1.0 - crash / 100.0;
            for (a, b) in baseline.results.iter().zip(&crashed.results) {
                let tol = 1e-9 * a.btc_with_income.abs().max(1.0) * factor.abs().max(1.0);
                prop_assert!((b.btc_with_income - a.btc_with_income * factor).abs() <= tol);
                prop_assert!((b.btc_without_income - a.btc_without_income * factor).abs() <= tol);
            }
        }
    }
}
