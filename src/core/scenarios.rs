use std::fmt;

use serde::{Deserialize, Serialize};

use super::curves::SeriesKind;

pub const CUSTOM_SCENARIO_KEY: &str = "custom";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRange {
    pub start_rate: f64,
    pub end_rate: f64,
    pub max_axis_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioPreset {
    pub key: &'static str,
    pub label: &'static str,
    pub inflation: RateRange,
    pub btc_price: RateRange,
    pub income_yield: RateRange,
}

impl ScenarioPreset {
    pub fn range(&self, kind: SeriesKind) -> RateRange {
        match kind {
            SeriesKind::Inflation => self.inflation,
            SeriesKind::BtcPrice => self.btc_price,
            SeriesKind::IncomeYield => self.income_yield,
        }
    }
}

const fn range(start_rate: f64, end_rate: f64, max_axis_value: f64) -> RateRange {
    RateRange {
        start_rate,
        end_rate,
        max_axis_value,
    }
}

pub const SCENARIOS: &[ScenarioPreset] = &[
    ScenarioPreset {
        key: "bear",
        label: "Prolonged bear market",
        inflation: range(3.0, 4.0, 20.0),
        btc_price: range(10.0, 4.0, 60.0),
        income_yield: range(6.0, 4.0, 20.0),
    },
    ScenarioPreset {
        key: "moderate",
        label: "Moderate adoption",
        inflation: range(3.0, 5.0, 20.0),
        btc_price: range(30.0, 10.0, 80.0),
        income_yield: range(8.0, 6.0, 20.0),
    },
    ScenarioPreset {
        key: "bull",
        label: "Accelerating adoption",
        inflation: range(4.0, 8.0, 20.0),
        btc_price: range(60.0, 20.0, 100.0),
        income_yield: range(10.0, 6.0, 30.0),
    },
    ScenarioPreset {
        key: "debasement",
        label: "Currency debasement",
        inflation: range(6.0, 20.0, 40.0),
        btc_price: range(50.0, 30.0, 100.0),
        income_yield: range(12.0, 16.0, 30.0),
    },
];

pub fn find_scenario(key: &str) -> Option<&'static ScenarioPreset> {
    SCENARIOS.iter().find(|scenario| scenario.key == key)
}

/// The globally selected macro scenario. `Custom` means no scenario is
/// selected and following is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MacroScenario {
    #[default]
    Custom,
    Named(String),
}

impl MacroScenario {
    pub fn named(key: impl Into<String>) -> Self {
        Self::from(key.into())
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Custom => CUSTOM_SCENARIO_KEY,
            Self::Named(key) => key,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom)
    }

    /// Resolves the catalog entry; `None` for `Custom` and for unknown keys.
    pub fn preset(&self) -> Option<&'static ScenarioPreset> {
        match self {
            Self::Custom => None,
            Self::Named(key) => find_scenario(key),
        }
    }
}

impl From<String> for MacroScenario {
    fn from(value: String) -> Self {
        if value.is_empty() || value == CUSTOM_SCENARIO_KEY {
            Self::Custom
        } else {
            Self::Named(value)
        }
    }
}

impl From<MacroScenario> for String {
    fn from(value: MacroScenario) -> Self {
        value.key().to_string()
    }
}

impl fmt::Display for MacroScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_keys_are_unique_and_resolvable() {
        for (idx, scenario) in SCENARIOS.iter().enumerate() {
            assert_eq!(find_scenario(scenario.key), Some(scenario));
            assert!(
                SCENARIOS[idx + 1..].iter().all(|s| s.key != scenario.key),
                "duplicate key {}",
                scenario.key
            );
            assert_ne!(scenario.key, CUSTOM_SCENARIO_KEY);
        }
    }

    #[test]
    fn catalog_ranges_fit_their_axis() {
        for scenario in SCENARIOS {
            for kind in SeriesKind::ALL {
                let r = scenario.range(kind);
                assert!(r.start_rate <= r.max_axis_value, "{} {kind:?}", scenario.key);
                assert!(r.end_rate <= r.max_axis_value, "{} {kind:?}", scenario.key);
            }
        }
    }

    #[test]
    fn macro_scenario_round_trips_through_strings() {
        assert_eq!(MacroScenario::named("custom"), MacroScenario::Custom);
        assert_eq!(MacroScenario::named(""), MacroScenario::Custom);
        let bull = MacroScenario::named("bull");
        assert_eq!(bull.key(), "bull");
        assert!(bull.preset().is_some());
        assert!(MacroScenario::named("nope").preset().is_none());

        let json = serde_json::to_string(&bull).expect("serialize");
        assert_eq!(json, "\"bull\"");
        let back: MacroScenario = serde_json::from_str("\"custom\"").expect("deserialize");
        assert!(back.is_custom());
    }
}
