use serde::{Deserialize, Serialize};

use super::curves::SeriesKind;
use super::quantize::quantize;
use super::scenarios::MacroScenario;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerPos {
    pub x: f64,
    pub y: f64,
}

/// `to_domain` must invert `to_pixel`.
pub trait ChartTransform {
    fn slot_count(&self) -> usize;
    fn value_range(&self) -> (f64, f64);
    fn to_pixel(&self, index: usize, value: f64) -> PointerPos;
    fn to_domain(&self, pos: PointerPos) -> (f64, f64);

    fn nearest_index(&self, pos: PointerPos) -> Option<usize> {
        let last = self.slot_count().checked_sub(1)?;
        let (index, _) = self.to_domain(pos);
        if !index.is_finite() {
            return Some(0);
        }
        Some(index.round().clamp(0.0, last as f64) as usize)
    }

    fn snapped_value(&self, pos: PointerPos) -> f64 {
        let (_, value) = self.to_domain(pos);
        let (min, max) = self.value_range();
        quantize(value, min, max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearChartFrame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub slots: usize,
    pub min_value: f64,
    pub max_value: f64,
}

impl LinearChartFrame {
    pub fn for_series(
        kind: SeriesKind,
        scenario: &MacroScenario,
        slots: usize,
        width: f64,
        height: f64,
    ) -> Self {
        let (min_value, default_max) = kind.default_axis();
        let max_value = scenario
            .preset()
            .map(|preset| preset.range(kind).max_axis_value)
            .unwrap_or(default_max);
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
            slots,
            min_value,
            max_value,
        }
    }

    fn index_span(&self) -> f64 {
        self.slots.saturating_sub(1).max(1) as f64
    }

    fn value_span(&self) -> f64 {
        let span = self.max_value - self.min_value;
        if span.abs() < f64::EPSILON { 1.0 } else { span }
    }

    fn pixel_span(extent: f64) -> f64 {
        if extent.abs() < f64::EPSILON { 1.0 } else { extent }
    }
}

impl ChartTransform for LinearChartFrame {
    fn slot_count(&self) -> usize {
        self.slots
    }

    fn value_range(&self) -> (f64, f64) {
        (self.min_value, self.max_value)
    }

    fn to_pixel(&self, index: usize, value: f64) -> PointerPos {
        let fx = index as f64 / self.index_span();
        let fy = (value - self.min_value) / self.value_span();
        PointerPos {
            x: self.left + fx * self.width,
            y: self.top + (1.0 - fy) * self.height,
        }
    }

    fn to_domain(&self, pos: PointerPos) -> (f64, f64) {
        let fx = (pos.x - self.left) / Self::pixel_span(self.width);
        let fy = 1.0 - (pos.y - self.top) / Self::pixel_span(self.height);
        (
            fx * self.index_span(),
            self.min_value + fy * self.value_span(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragEdit {
    pub index: usize,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragInteractionController {
    active_index: Option<usize>,
    hover_index: Option<usize>,
    read_only: bool,
}

impl DragInteractionController {
    pub fn new(read_only: bool) -> Self {
        Self {
            read_only,
            ..Self::default()
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.active_index.is_some()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn hover_index(&self) -> Option<usize> {
        self.hover_index
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
        if read_only {
            self.active_index = None;
        }
    }

    /// `None` when read-only or the chart has no slots.
    pub fn drag_start(
        &mut self,
        transform: &impl ChartTransform,
        pos: PointerPos,
        series: &mut Vec<f64>,
    ) -> Option<DragEdit> {
        if self.read_only {
            return None;
        }
        let index = transform.nearest_index(pos)?;
        self.active_index = Some(index);
        self.hover_index = None;
        Some(write_slot(series, index, transform.snapped_value(pos)))
    }

    pub fn drag_move(
        &mut self,
        transform: &impl ChartTransform,
        pos: PointerPos,
        series: &mut Vec<f64>,
    ) -> Option<DragEdit> {
        if self.read_only {
            return None;
        }
        let index = self.active_index?;
        Some(write_slot(series, index, transform.snapped_value(pos)))
    }

    pub fn drag_end(&mut self) {
        self.active_index = None;
    }

    pub fn hover(&mut self, transform: &impl ChartTransform, pos: PointerPos) -> Option<usize> {
        if self.is_dragging() {
            return None;
        }
        self.hover_index = transform.nearest_index(pos);
        self.hover_index
    }
}

fn write_slot(series: &mut Vec<f64>, index: usize, value: f64) -> DragEdit {
    if index >= series.len() {
        series.resize(index + 1, 0.0);
    }
    series[index] = value;
    DragEdit { index, value }
}
