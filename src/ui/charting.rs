use cognivault::session::SessionRecord;

/// (session number, score) points, oldest first.
pub fn score_points(newest_first: &[SessionRecord]) -> Vec<(f64, f64)> {
    newest_first
        .iter()
        .rev()
        .enumerate()
        .map(|(i, r)| ((i + 1) as f64, f64::from(r.score)))
        .collect()
}

/// X bound for the score chart; at least 2 so a single point still plots.
pub fn compute_x_bound(points: &[(f64, f64)]) -> f64 {
    points.last().map(|p| p.0).unwrap_or(1.0).max(2.0)
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

/// Shade index 0..=4 for a heatmap cell relative to the busiest cell.
pub fn heat_level(count: u32, max: u32) -> usize {
    if count == 0 || max == 0 {
        return 0;
    }
    (count as usize * 4).div_ceil(max as usize).clamp(1, 4)
}
