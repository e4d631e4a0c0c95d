use super::aggregator::CumulativePoint;

/// Smallest bar drawn, in percent, so flat days stay visible
pub const MIN_BAR_HEIGHT: f64 = 4.0;

/// Denominator for bar heights: the largest |cumulative| value, at least 1
pub fn bar_scale(points: &[CumulativePoint]) -> f64 {
    points
        .iter()
        .map(|p| p.cumulative_pnl.abs())
        .fold(1.0, f64::max)
}

/// Bar heights in percent of the scale, one per point
pub fn bar_heights(points: &[CumulativePoint]) -> Vec<f64> {
    let scale = bar_scale(points);
    points
        .iter()
        .map(|p| (p.cumulative_pnl.abs() / scale * 100.0).max(MIN_BAR_HEIGHT))
        .collect()
}
