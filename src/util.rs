pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    let variance = data.iter().map(|v| (m - v) * (m - v)).sum::<f64>() / data.len() as f64;
    Some(variance.sqrt())
}

/// Reaction-time figures for one session, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionSummary {
    pub mean_ms: f64,
    pub spread_ms: f64,
    pub fastest_ms: u64,
}

impl ReactionSummary {
    pub fn from_times(times: &[u64]) -> Option<Self> {
        let data: Vec<f64> = times.iter().map(|&t| t as f64).collect();
        Some(Self {
            mean_ms: mean(&data)?,
            spread_ms: std_dev(&data)?,
            fastest_ms: times.iter().copied().min()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_reaction_times() {
        assert_eq!(mean(&[450., 550., 700., 300.]), Some(500.0));
        assert_eq!(mean(&[612.0]), Some(612.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn population_spread() {
        assert_eq!(std_dev(&[400., 600.]), Some(100.0));
        assert_eq!(std_dev(&[520.0, 520.0, 520.0]), Some(0.0));
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn reaction_summary() {
        let s = ReactionSummary::from_times(&[400, 600, 500]).unwrap();
        assert_eq!(s.mean_ms, 500.0);
        assert_eq!(s.fastest_ms, 400);
        assert!((s.spread_ms - 81.64965809277261).abs() < 1e-9);
        assert_eq!(ReactionSummary::from_times(&[]), None);
    }
}
