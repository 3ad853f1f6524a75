mod curves;
mod drag;
mod engine;
mod mode;
mod persist;
mod quantize;
mod scenarios;
mod session;
mod types;
mod validation;

pub use curves::{
    CurveKind, CurveSpec, FixedCurve, SeriesKind, apply_prefix, generate, power_curve,
};
pub use drag::{ChartTransform, DragEdit, DragInteractionController, LinearChartFrame, PointerPos};
pub use engine::project;
pub use mode::{
    CurveParams, ModeEvent, ModeFlags, ModeState, RateDescriptor, Transition, apply_event,
    regenerate,
};
pub use persist::{SavedConfig, SavedParams, SavedSeries};
pub use quantize::{SNAP_STEP, quantize, snap};
pub use scenarios::{
    CUSTOM_SCENARIO_KEY, MacroScenario, RateRange, SCENARIOS, ScenarioPreset, find_scenario,
};
pub use session::{PlannerSession, SessionEvent};
pub use types::{ActivationIncome, PortfolioConfig, ProjectionResult, RateInputs, YearResult};
pub use validation::{Issue, Severity, has_errors, validate};
