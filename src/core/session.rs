use tracing::debug;

use super::curves::SeriesKind;
use super::drag::{DragEdit, DragInteractionController, LinearChartFrame, PointerPos};
use super::engine::project;
use super::mode::{ModeEvent, RateDescriptor, Transition, apply_event, regenerate};
use super::scenarios::MacroScenario;
use super::types::{PortfolioConfig, ProjectionResult, RateInputs};
use super::validation::{Issue, validate};

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    SetPortfolio(Box<PortfolioConfig>),
    SetTimeHorizon(u32),
    SelectMacroScenario(MacroScenario),
    Series(SeriesKind, ModeEvent),
    DragStart {
        series: SeriesKind,
        frame: LinearChartFrame,
        pos: PointerPos,
    },
    DragMove {
        frame: LinearChartFrame,
        pos: PointerPos,
    },
    DragEnd,
    SetReadOnly(bool),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct PendingRegeneration {
    inflation: bool,
    btc_price: bool,
    income_yield: bool,
}

impl PendingRegeneration {
    fn all() -> Self {
        Self {
            inflation: true,
            btc_price: true,
            income_yield: true,
        }
    }

    fn slot(&mut self, kind: SeriesKind) -> &mut bool {
        match kind {
            SeriesKind::Inflation => &mut self.inflation,
            SeriesKind::BtcPrice => &mut self.btc_price,
            SeriesKind::IncomeYield => &mut self.income_yield,
        }
    }

    fn mark(&mut self, kind: SeriesKind) {
        *self.slot(kind) = true;
    }

    fn take(&mut self, kind: SeriesKind) -> bool {
        std::mem::take(self.slot(kind))
    }

    fn any(&self) -> bool {
        self.inflation || self.btc_price || self.income_yield
    }
}

#[derive(Clone, Debug)]
pub struct PlannerSession {
    portfolio: PortfolioConfig,
    macro_scenario: MacroScenario,
    inflation: RateDescriptor,
    btc_price: RateDescriptor,
    income_yield: RateDescriptor,
    drag: DragInteractionController,
    drag_series: Option<SeriesKind>,
    pending: PendingRegeneration,
    projection_stale: bool,
    projection: ProjectionResult,
}

impl PlannerSession {
    pub fn new(portfolio: PortfolioConfig, macro_scenario: MacroScenario) -> Self {
        Self::from_parts(
            portfolio,
            macro_scenario,
            RateDescriptor::new(SeriesKind::Inflation),
            RateDescriptor::new(SeriesKind::BtcPrice),
            RateDescriptor::new(SeriesKind::IncomeYield),
        )
    }

    pub fn from_parts(
        portfolio: PortfolioConfig,
        macro_scenario: MacroScenario,
        inflation: RateDescriptor,
        btc_price: RateDescriptor,
        income_yield: RateDescriptor,
    ) -> Self {
        let projection = project(
            RateInputs {
                inflation: &inflation.series,
                btc_appreciation: &btc_price.series,
                income_yield: &income_yield.series,
            },
            &portfolio,
        );
        let mut session = Self {
            portfolio,
            macro_scenario,
            inflation,
            btc_price,
            income_yield,
            drag: DragInteractionController::default(),
            drag_series: None,
            pending: PendingRegeneration::all(),
            projection_stale: true,
            projection,
        };
        session.flush();
        session
    }

    pub fn portfolio(&self) -> &PortfolioConfig {
        &self.portfolio
    }

    pub fn macro_scenario(&self) -> &MacroScenario {
        &self.macro_scenario
    }

    pub fn descriptor(&self, kind: SeriesKind) -> &RateDescriptor {
        match kind {
            SeriesKind::Inflation => &self.inflation,
            SeriesKind::BtcPrice => &self.btc_price,
            SeriesKind::IncomeYield => &self.income_yield,
        }
    }

    fn descriptor_mut(&mut self, kind: SeriesKind) -> &mut RateDescriptor {
        match kind {
            SeriesKind::Inflation => &mut self.inflation,
            SeriesKind::BtcPrice => &mut self.btc_price,
            SeriesKind::IncomeYield => &mut self.income_yield,
        }
    }

    pub fn active_slots(&self) -> usize {
        self.portfolio.time_horizon as usize + 1
    }

    /// The last flushed projection. Stale while [`Self::has_pending`] is true.
    pub fn projection(&self) -> &ProjectionResult {
        &self.projection
    }

    pub fn has_pending(&self) -> bool {
        self.pending.any() || self.projection_stale
    }

    pub fn issues(&self) -> Vec<Issue> {
        validate(&self.portfolio)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn dispatch(&mut self, event: SessionEvent) -> Transition {
        debug!(?event, "dispatch");
        match event {
            SessionEvent::SetPortfolio(portfolio) => {
                let horizon_changed = portfolio.time_horizon != self.portfolio.time_horizon;
                self.portfolio = *portfolio;
                self.projection_stale = true;
                if horizon_changed {
                    self.broadcast(ModeEvent::HorizonChanged)
                } else {
                    Transition::Updated
                }
            }
            SessionEvent::SetTimeHorizon(years) => {
                if years == self.portfolio.time_horizon {
                    return Transition::Unchanged;
                }
                self.portfolio.time_horizon = years;
                self.projection_stale = true;
                self.broadcast(ModeEvent::HorizonChanged)
            }
            SessionEvent::SelectMacroScenario(scenario) => {
                if scenario == self.macro_scenario {
                    return Transition::Unchanged;
                }
                self.macro_scenario = scenario;
                self.broadcast(ModeEvent::MacroScenarioChanged)
            }
            SessionEvent::Series(kind, mode_event) => self.apply_to(kind, &mode_event),
            SessionEvent::DragStart { series, frame, pos } => {
                match self.drag_start(series, &frame, pos) {
                    Some(_) => Transition::Updated,
                    None => Transition::Rejected,
                }
            }
            SessionEvent::DragMove { frame, pos } => match self.drag_move(&frame, pos) {
                Some(_) => Transition::Updated,
                None => Transition::Unchanged,
            },
            SessionEvent::DragEnd => {
                self.drag.drag_end();
                self.drag_series = None;
                Transition::Unchanged
            }
            SessionEvent::SetReadOnly(read_only) => {
                self.drag.set_read_only(read_only);
                if read_only {
                    self.drag_series = None;
                }
                Transition::Updated
            }
        }
    }

    // Drops any pending regeneration for `series`; it is manual from here on.
    pub fn drag_start(
        &mut self,
        series: SeriesKind,
        frame: &LinearChartFrame,
        pos: PointerPos,
    ) -> Option<DragEdit> {
        let descriptor = match series {
            SeriesKind::Inflation => &mut self.inflation,
            SeriesKind::BtcPrice => &mut self.btc_price,
            SeriesKind::IncomeYield => &mut self.income_yield,
        };
        let edit = self.drag.drag_start(frame, pos, &mut descriptor.series)?;
        apply_event(descriptor, &ModeEvent::DragStarted, &self.macro_scenario);
        self.pending.take(series);
        self.drag_series = Some(series);
        self.projection_stale = true;
        debug!(?series, index = edit.index, value = edit.value, "drag started");
        Some(edit)
    }

    pub fn drag_move(&mut self, frame: &LinearChartFrame, pos: PointerPos) -> Option<DragEdit> {
        let series = self.drag_series?;
        let descriptor = match series {
            SeriesKind::Inflation => &mut self.inflation,
            SeriesKind::BtcPrice => &mut self.btc_price,
            SeriesKind::IncomeYield => &mut self.income_yield,
        };
        let edit = self.drag.drag_move(frame, pos, &mut descriptor.series)?;
        self.projection_stale = true;
        Some(edit)
    }

    pub fn hover(&mut self, frame: &LinearChartFrame, pos: PointerPos) -> Option<usize> {
        self.drag.hover(frame, pos)
    }

    /// Regenerates first, then projects.
    pub fn flush(&mut self) -> &ProjectionResult {
        let slots = self.active_slots();
        for kind in SeriesKind::ALL {
            if !self.pending.take(kind) {
                continue;
            }
            let scenario = self.macro_scenario.clone();
            let descriptor = self.descriptor_mut(kind);
            let state = descriptor.state();
            if regenerate(descriptor, &scenario, slots) {
                debug!(?kind, ?state, slots, "regenerated series");
                self.projection_stale = true;
            }
        }

        if self.projection_stale {
            self.projection = project(
                RateInputs {
                    inflation: &self.inflation.series,
                    btc_appreciation: &self.btc_price.series,
                    income_yield: &self.income_yield.series,
                },
                &self.portfolio,
            );
            self.projection_stale = false;
        }
        &self.projection
    }

    fn apply_to(&mut self, kind: SeriesKind, event: &ModeEvent) -> Transition {
        let scenario = self.macro_scenario.clone();
        let transition = apply_event(self.descriptor_mut(kind), event, &scenario);
        if transition == Transition::Regenerate {
            self.pending.mark(kind);
        }
        transition
    }

    fn broadcast(&mut self, event: ModeEvent) -> Transition {
        SeriesKind::ALL
            .into_iter()
            .map(|kind| self.apply_to(kind, &event))
            .fold(Transition::Unchanged, strongest)
    }
}

fn strongest(a: Transition, b: Transition) -> Transition {
    fn rank(t: Transition) -> u8 {
        match t {
            Transition::Unchanged => 0,
            Transition::Rejected => 1,
            Transition::Updated => 2,
            Transition::Regenerate => 3,
        }
    }
    if rank(b) > rank(a) { b } else { a }
}
