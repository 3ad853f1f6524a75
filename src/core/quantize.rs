pub const SNAP_STEP: f64 = 2.0;

/// If rounding lands outside `[min, max]` the nearest in-range grid point is
/// used. Non-finite input reads as 0.
pub fn quantize(raw: f64, min: f64, max: f64) -> f64 {
    let (lo, hi) = ordered_bounds(min, max);
    let value = if raw.is_finite() { raw } else { 0.0 };
    let clamped = value.clamp(lo, hi);

    let snapped = snap(clamped);
    let first = (lo / SNAP_STEP).ceil() * SNAP_STEP;
    let last = (hi / SNAP_STEP).floor() * SNAP_STEP;
    if first > last {
        return snap((lo + hi) / 2.0);
    }
    normalize_zero(snapped.clamp(first, last))
}

pub fn snap(value: f64) -> f64 {
    let value = if value.is_finite() { value } else { 0.0 };
    normalize_zero((value / SNAP_STEP).round() * SNAP_STEP)
}

fn ordered_bounds(min: f64, max: f64) -> (f64, f64) {
    let lo = if min.is_finite() { min } else { f64::MIN };
    let hi = if max.is_finite() { max } else { f64::MAX };
    if lo <= hi { (lo, hi) } else { (hi, lo) }
}

// Keeps -0.0 from leaking into serialized series.
fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}
