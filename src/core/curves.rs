use serde::{Deserialize, Serialize};
use tracing::debug;

use super::quantize::quantize;
use super::scenarios::find_scenario;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SeriesKind {
    Inflation,
    BtcPrice,
    IncomeYield,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 3] = [Self::Inflation, Self::BtcPrice, Self::IncomeYield];

    /// Exponent of the preset power curve. Inflation accelerates late;
    /// appreciation and yield curves front-load more gently.
    pub fn preset_exponent(self) -> f64 {
        match self {
            Self::Inflation => 2.0,
            Self::BtcPrice | Self::IncomeYield => 1.5,
        }
    }

    pub fn default_flat_rate(self) -> f64 {
        match self {
            Self::Inflation => 3.0,
            Self::BtcPrice => 30.0,
            Self::IncomeYield => 8.0,
        }
    }

    pub fn default_axis(self) -> (f64, f64) {
        match self {
            Self::Inflation => (0.0, 20.0),
            Self::BtcPrice => (0.0, 100.0),
            Self::IncomeYield => (0.0, 30.0),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CurveKind {
    #[default]
    Flat,
    Linear,
    Preset,
    FixedCurve,
    Manual,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixedCurve {
    /// Long-range appreciation forecast: starts high and decays linearly to
    /// a floor at the end of the horizon.
    #[default]
    LongRangeForecast,
}

impl FixedCurve {
    fn endpoints(self) -> (f64, f64) {
        match self {
            Self::LongRangeForecast => (50.0, 20.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CurveSpec {
    Flat {
        rate: f64,
    },
    Linear {
        start: f64,
        end: f64,
    },
    Preset {
        #[serde(rename = "scenarioKey")]
        scenario_key: String,
    },
    FixedCurve {
        name: FixedCurve,
    },
    Manual,
}

impl CurveSpec {
    pub fn kind(&self) -> CurveKind {
        match self {
            Self::Flat { .. } => CurveKind::Flat,
            Self::Linear { .. } => CurveKind::Linear,
            Self::Preset { .. } => CurveKind::Preset,
            Self::FixedCurve { .. } => CurveKind::FixedCurve,
            Self::Manual => CurveKind::Manual,
        }
    }
}

/// Produces `horizon` slots for `spec`. `current` is only read by the
/// `Manual` branch, which returns it unchanged.
pub fn generate(spec: &CurveSpec, horizon: usize, kind: SeriesKind, current: &[f64]) -> Vec<f64> {
    let denominator = horizon.saturating_sub(1).max(1) as f64;
    let progress = |i: usize| i as f64 / denominator;

    match spec {
        CurveSpec::Flat { rate } => vec![*rate; horizon],
        CurveSpec::Linear { start, end } => (0..horizon)
            .map(|i| (start + (end - start) * progress(i)).round())
            .collect(),
        CurveSpec::Preset { scenario_key } => match find_scenario(scenario_key) {
            Some(scenario) => {
                let range = scenario.range(kind);
                power_curve(
                    range.start_rate,
                    range.end_rate,
                    range.max_axis_value,
                    horizon,
                    kind,
                )
            }
            None => {
                debug!(%scenario_key, ?kind, "unknown preset key, using flat default");
                vec![kind.default_flat_rate(); horizon]
            }
        },
        CurveSpec::FixedCurve { name } => {
            let (start, floor) = name.endpoints();
            (0..horizon)
                .map(|i| (start + (floor - start) * progress(i)).round())
                .collect()
        }
        CurveSpec::Manual => current.iter().take(horizon).copied().collect(),
    }
}

/// `start + (end - start) * progress^p`, snapped onto the editor's grid so a
/// generated point and a hand-placed point at the same height are identical.
pub fn power_curve(
    start: f64,
    end: f64,
    max_axis_value: f64,
    horizon: usize,
    kind: SeriesKind,
) -> Vec<f64> {
    let denominator = horizon.saturating_sub(1).max(1) as f64;
    let exponent = kind.preset_exponent();
    let lo = start.min(end).min(kind.default_axis().0);
    let hi = start.max(end).max(max_axis_value);

    (0..horizon)
        .map(|i| {
            let progress = i as f64 / denominator;
            quantize(start + (end - start) * progress.powf(exponent), lo, hi)
        })
        .collect()
}

/// Slots past `generated.len()` are left untouched.
pub fn apply_prefix(series: &mut Vec<f64>, generated: &[f64]) {
    for (idx, value) in generated.iter().enumerate() {
        match series.get_mut(idx) {
            Some(slot) => *slot = *value,
            None => series.push(*value),
        }
    }
}

pub fn regenerate_into(series: &mut Vec<f64>, spec: &CurveSpec, horizon: usize, kind: SeriesKind) {
    let generated = generate(spec, horizon, kind, series);
    apply_prefix(series, &generated);
}
