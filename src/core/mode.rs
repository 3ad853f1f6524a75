use serde::{Deserialize, Serialize};
use tracing::debug;

use super::curves::{
    CurveKind, CurveSpec, FixedCurve, SeriesKind, apply_prefix, generate, regenerate_into,
};
use super::scenarios::MacroScenario;

const DEFAULT_PRESET_KEY: &str = "moderate";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ModeState {
    Following,
    Auto,
    Manual,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModeFlags {
    pub follow_scenario: bool,
    pub manual_mode: bool,
    pub input_type: CurveKind,
}

impl Default for ModeFlags {
    fn default() -> Self {
        Self {
            follow_scenario: false,
            manual_mode: false,
            input_type: CurveKind::Flat,
        }
    }
}

impl ModeFlags {
    pub fn state(&self) -> ModeState {
        if self.manual_mode {
            ModeState::Manual
        } else if self.follow_scenario {
            ModeState::Following
        } else {
            ModeState::Auto
        }
    }

    /// Manual editing wins over following. The input type always matches
    /// the curve that governs the series.
    pub fn repaired(self) -> Self {
        if self.manual_mode || self.input_type == CurveKind::Manual {
            Self::manual()
        } else if self.follow_scenario {
            Self::following()
        } else {
            self
        }
    }

    fn manual() -> Self {
        Self {
            follow_scenario: false,
            manual_mode: true,
            input_type: CurveKind::Manual,
        }
    }

    fn following() -> Self {
        Self {
            follow_scenario: true,
            manual_mode: false,
            input_type: CurveKind::Preset,
        }
    }

    fn formula(kind: CurveKind) -> Self {
        Self {
            follow_scenario: false,
            manual_mode: false,
            input_type: kind,
        }
    }
}

/// Formula parameters for a series. They survive mode switches so leaving
/// manual or following mode can snap back to the last selected formula.
#[derive(Clone, Debug, PartialEq)]
pub struct CurveParams {
    pub flat_rate: f64,
    pub linear_start: f64,
    pub linear_end: f64,
    pub preset_key: String,
    pub fixed_curve: FixedCurve,
    /// Snap-back target when leaving manual or following mode.
    pub formula_kind: CurveKind,
}

impl CurveParams {
    pub fn for_kind(kind: SeriesKind) -> Self {
        let rate = kind.default_flat_rate();
        Self {
            flat_rate: rate,
            linear_start: rate,
            linear_end: rate,
            preset_key: DEFAULT_PRESET_KEY.to_string(),
            fixed_curve: FixedCurve::default(),
            formula_kind: CurveKind::Flat,
        }
    }

    pub fn spec(&self, kind: CurveKind) -> CurveSpec {
        match kind {
            CurveKind::Flat => CurveSpec::Flat {
                rate: self.flat_rate,
            },
            CurveKind::Linear => CurveSpec::Linear {
                start: self.linear_start,
                end: self.linear_end,
            },
            CurveKind::Preset => CurveSpec::Preset {
                scenario_key: self.preset_key.clone(),
            },
            CurveKind::FixedCurve => CurveSpec::FixedCurve {
                name: self.fixed_curve,
            },
            CurveKind::Manual => CurveSpec::Manual,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RateDescriptor {
    pub kind: SeriesKind,
    pub series: Vec<f64>,
    pub params: CurveParams,
    pub flags: ModeFlags,
}

impl RateDescriptor {
    pub fn new(kind: SeriesKind) -> Self {
        Self {
            kind,
            series: Vec::new(),
            params: CurveParams::for_kind(kind),
            flags: ModeFlags::default(),
        }
    }

    pub fn state(&self) -> ModeState {
        self.flags.state()
    }

    /// The curve the series is currently governed by.
    pub fn active_spec(&self, scenario: &MacroScenario) -> CurveSpec {
        match self.state() {
            ModeState::Manual => CurveSpec::Manual,
            ModeState::Following => CurveSpec::Preset {
                scenario_key: scenario.key().to_string(),
            },
            ModeState::Auto => self.params.spec(self.flags.input_type),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ModeEvent {
    SetFlatRate(f64),
    SetLinearStart(f64),
    SetLinearEnd(f64),
    SelectPreset(String),
    SelectFixedCurve(FixedCurve),
    SelectInputType(CurveKind),
    SetFollowScenario(bool),
    SetDirectEdit(bool),
    DragStarted,
    MacroScenarioChanged,
    HorizonChanged,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Transition {
    /// Nothing observable changed.
    Unchanged,
    /// Flags or parameters changed; stored values stay as they are.
    Updated,
    /// The series must be regenerated before the next projection.
    Regenerate,
    /// The event is not allowed in the current state.
    Rejected,
}

/// Applies `event` to `descriptor`. Never touches `descriptor.series`.
pub fn apply_event(
    descriptor: &mut RateDescriptor,
    event: &ModeEvent,
    scenario: &MacroScenario,
) -> Transition {
    let state = descriptor.state();
    match event {
        ModeEvent::SetFlatRate(rate) => {
            set_param(descriptor, state, |p| replace(&mut p.flat_rate, *rate))
        }
        ModeEvent::SetLinearStart(start) => {
            set_param(descriptor, state, |p| replace(&mut p.linear_start, *start))
        }
        ModeEvent::SetLinearEnd(end) => {
            set_param(descriptor, state, |p| replace(&mut p.linear_end, *end))
        }
        ModeEvent::SelectPreset(key) => {
            set_param(descriptor, state, |p| replace(&mut p.preset_key, key.clone()))
        }
        ModeEvent::SelectFixedCurve(name) => {
            set_param(descriptor, state, |p| replace(&mut p.fixed_curve, *name))
        }
        ModeEvent::SelectInputType(CurveKind::Manual) => enter_manual(descriptor),
        ModeEvent::SelectInputType(kind) => {
            let changed = replace(&mut descriptor.params.formula_kind, *kind);
            match state {
                ModeState::Manual | ModeState::Following => updated_if(changed),
                ModeState::Auto => {
                    if replace(&mut descriptor.flags.input_type, *kind) || changed {
                        Transition::Regenerate
                    } else {
                        Transition::Unchanged
                    }
                }
            }
        }
        ModeEvent::SetFollowScenario(true) => {
            if scenario.is_custom() {
                debug!(kind = ?descriptor.kind, "follow requested with custom macro scenario");
                return Transition::Rejected;
            }
            if state == ModeState::Following {
                return Transition::Unchanged;
            }
            descriptor.flags = ModeFlags::following();
            Transition::Regenerate
        }
        ModeEvent::SetFollowScenario(false) => {
            if state != ModeState::Following {
                return Transition::Unchanged;
            }
            descriptor.flags = ModeFlags::formula(descriptor.params.formula_kind);
            Transition::Regenerate
        }
        ModeEvent::SetDirectEdit(true) | ModeEvent::DragStarted => enter_manual(descriptor),
        ModeEvent::SetDirectEdit(false) => {
            if state != ModeState::Manual {
                return Transition::Unchanged;
            }
            descriptor.flags = ModeFlags::formula(descriptor.params.formula_kind);
            Transition::Regenerate
        }
        ModeEvent::MacroScenarioChanged => match state {
            ModeState::Following if scenario.is_custom() => {
                descriptor.flags = ModeFlags::formula(descriptor.params.formula_kind);
                Transition::Updated
            }
            ModeState::Following => Transition::Regenerate,
            ModeState::Auto | ModeState::Manual => Transition::Unchanged,
        },
        ModeEvent::HorizonChanged => match state {
            ModeState::Following | ModeState::Auto => Transition::Regenerate,
            ModeState::Manual => Transition::Unchanged,
        },
    }
}

/// Returns whether anything was written.
pub fn regenerate(descriptor: &mut RateDescriptor, scenario: &MacroScenario, horizon: usize) -> bool {
    match descriptor.state() {
        ModeState::Manual => false,
        ModeState::Following => {
            if scenario.preset().is_none() {
                debug!(
                    kind = ?descriptor.kind,
                    scenario = %scenario,
                    "followed scenario has no preset, leaving series unchanged"
                );
                return false;
            }
            let spec = descriptor.active_spec(scenario);
            let generated = generate(&spec, horizon, descriptor.kind, &descriptor.series);
            apply_prefix(&mut descriptor.series, &generated);
            true
        }
        ModeState::Auto => {
            let spec = descriptor.params.spec(descriptor.flags.input_type);
            regenerate_into(&mut descriptor.series, &spec, horizon, descriptor.kind);
            true
        }
    }
}

fn enter_manual(descriptor: &mut RateDescriptor) -> Transition {
    if descriptor.state() == ModeState::Manual {
        return Transition::Unchanged;
    }
    descriptor.flags = ModeFlags::manual();
    Transition::Updated
}

fn set_param(
    descriptor: &mut RateDescriptor,
    state: ModeState,
    edit: impl FnOnce(&mut CurveParams) -> bool,
) -> Transition {
    if !edit(&mut descriptor.params) {
        return Transition::Unchanged;
    }
    match state {
        ModeState::Auto => Transition::Regenerate,
        ModeState::Following | ModeState::Manual => Transition::Updated,
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

fn updated_if(changed: bool) -> Transition {
    if changed {
        Transition::Updated
    } else {
        Transition::Unchanged
    }
}
