use serde::{Deserialize, Serialize};

use super::curves::{CurveKind, FixedCurve, SeriesKind};
use super::mode::{CurveParams, ModeFlags, ModeState, RateDescriptor};
use super::scenarios::MacroScenario;
use super::session::PlannerSession;
use super::types::PortfolioConfig;
use crate::error::Result;

/// Missing fields resolve against the defaults of the series they belong to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SavedParams {
    pub flat_rate: Option<f64>,
    pub linear_start: Option<f64>,
    pub linear_end: Option<f64>,
    pub preset_key: Option<String>,
    pub fixed_curve: Option<FixedCurve>,
    pub formula_kind: Option<CurveKind>,
}

impl SavedParams {
    pub fn from_params(params: &CurveParams) -> Self {
        Self {
            flat_rate: Some(params.flat_rate),
            linear_start: Some(params.linear_start),
            linear_end: Some(params.linear_end),
            preset_key: Some(params.preset_key.clone()),
            fixed_curve: Some(params.fixed_curve),
            formula_kind: Some(params.formula_kind),
        }
    }

    pub fn into_params(self, kind: SeriesKind) -> CurveParams {
        let defaults = CurveParams::for_kind(kind);
        let formula_kind = match self.formula_kind {
            Some(CurveKind::Manual) | None => defaults.formula_kind,
            Some(formula_kind) => formula_kind,
        };
        CurveParams {
            flat_rate: self.flat_rate.map_or(defaults.flat_rate, finite_or_zero),
            linear_start: self.linear_start.map_or(defaults.linear_start, finite_or_zero),
            linear_end: self.linear_end.map_or(defaults.linear_end, finite_or_zero),
            preset_key: self.preset_key.unwrap_or(defaults.preset_key),
            fixed_curve: self.fixed_curve.unwrap_or(defaults.fixed_curve),
            formula_kind,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SavedSeries {
    pub series: Vec<f64>,
    pub params: SavedParams,
    #[serde(flatten)]
    pub flags: ModeFlags,
}

impl SavedSeries {
    pub fn from_descriptor(descriptor: &RateDescriptor) -> Self {
        Self {
            series: descriptor.series.clone(),
            params: SavedParams::from_params(&descriptor.params),
            flags: descriptor.flags,
        }
    }

    pub fn into_descriptor(self, kind: SeriesKind) -> RateDescriptor {
        let mut params = self.params.into_params(kind);
        let flags = self.flags.repaired();
        // Older documents stored the snap-back formula as the input type of
        // a following series.
        match (flags.state(), self.flags.input_type) {
            (ModeState::Manual, _) | (ModeState::Following, CurveKind::Preset) => {}
            (_, input_type) => params.formula_kind = input_type,
        }
        RateDescriptor {
            kind,
            series: self.series.into_iter().map(finite_or_zero).collect(),
            params,
            flags,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SavedConfig {
    pub name: Option<String>,
    pub portfolio: PortfolioConfig,
    pub macro_scenario: MacroScenario,
    pub inflation: SavedSeries,
    pub btc_price: SavedSeries,
    pub income_yield: SavedSeries,
}

impl SavedConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_session(session: &PlannerSession) -> Self {
        Self {
            name: None,
            portfolio: session.portfolio().clone(),
            macro_scenario: session.macro_scenario().clone(),
            inflation: SavedSeries::from_descriptor(session.descriptor(SeriesKind::Inflation)),
            btc_price: SavedSeries::from_descriptor(session.descriptor(SeriesKind::BtcPrice)),
            income_yield: SavedSeries::from_descriptor(
                session.descriptor(SeriesKind::IncomeYield),
            ),
        }
    }

    pub fn into_session(self) -> PlannerSession {
        PlannerSession::from_parts(
            self.portfolio,
            self.macro_scenario,
            self.inflation.into_descriptor(SeriesKind::Inflation),
            self.btc_price.into_descriptor(SeriesKind::BtcPrice),
            self.income_yield.into_descriptor(SeriesKind::IncomeYield),
        )
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
