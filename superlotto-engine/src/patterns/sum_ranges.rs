use superlotto_db::models::Draw;
use tracing::debug;

use super::{
    check_window, pattern_confidence, PatternAnalysis, PatternPayload, PatternType, SumBandStat,
};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::history;

/// Theoretical bounds of the front-zone sum: 1+2+3+4+5 and 31+..+35.
pub const SUM_MIN: u32 = 15;
pub const SUM_MAX: u32 = 165;

const BAND_LABELS: [&str; 5] = ["very-low", "low", "medium", "high", "very-high"];

/// Buckets front-zone sums into fixed configurable bands and reports the
/// mean and population standard deviation of the sums.
pub fn analyze(draws: &[Draw], window_days: i64, cfg: &EngineConfig) -> Result<PatternAnalysis> {
    check_window(window_days)?;

    let ordered = history::chronological(draws);
    let recent = history::windowed(&ordered, window_days);
    debug!(draws = recent.len(), "sum-range analysis");

    let sums: Vec<u32> = recent.iter().map(|d| d.front_sum()).collect();
    let mut counts = [0u32; 5];
    for &sum in &sums {
        counts[band_index(sum, &cfg.sum_band_edges)] += 1;
    }

    let n = sums.len();
    let mean = if n == 0 {
        0.0
    } else {
        sums.iter().map(|&s| s as f64).sum::<f64>() / n as f64
    };
    let std_dev = if n == 0 {
        0.0
    } else {
        (sums
            .iter()
            .map(|&s| (s as f64 - mean).powi(2))
            .sum::<f64>()
            / n as f64)
            .sqrt()
    };

    let bands = band_bounds(&cfg.sum_band_edges)
        .into_iter()
        .zip(counts)
        .map(|((label, min, max), count)| SumBandStat {
            label: label.to_string(),
            min,
            max,
            count,
            share: if n == 0 { 0.0 } else { count as f64 / n as f64 },
        })
        .collect();

    let (confidence, low_confidence) = pattern_confidence(cfg, n);
    Ok(PatternAnalysis {
        pattern: PatternType::SumRanges,
        payload: PatternPayload::SumRanges { bands, mean, std_dev },
        confidence,
        sample_size: n,
        window_days,
        low_confidence,
    })
}

pub(crate) fn band_index(sum: u32, edges: &[u32; 4]) -> usize {
    edges.iter().position(|&edge| sum < edge).unwrap_or(4)
}

fn band_bounds(edges: &[u32; 4]) -> [(&'static str, u32, u32); 5] {
    [
        (BAND_LABELS[0], SUM_MIN, edges[0] - 1),
        (BAND_LABELS[1], edges[0], edges[1] - 1),
        (BAND_LABELS[2], edges[1], edges[2] - 1),
        (BAND_LABELS[3], edges[2], edges[3] - 1),
        (BAND_LABELS[4], edges[3], SUM_MAX),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::draw_on_day;

    #[test]
    fn test_band_index_edges() {
        let edges = EngineConfig::default().sum_band_edges;
        assert_eq!(band_index(15, &edges), 0);
        assert_eq!(band_index(44, &edges), 0);
        assert_eq!(band_index(45, &edges), 1);
        assert_eq!(band_index(104, &edges), 2);
        assert_eq!(band_index(105, &edges), 3);
        assert_eq!(band_index(165, &edges), 4);
    }

    #[test]
    fn test_mean_and_std_dev() {
        let cfg = EngineConfig::default();
        let draws = vec![
            draw_on_day(0, [1, 2, 3, 4, 5], [1, 2]),      // sum 15
            draw_on_day(3, [31, 32, 33, 34, 35], [1, 2]), // sum 165
        ];
        let analysis = analyze(&draws, 365, &cfg).unwrap();
        let PatternPayload::SumRanges { bands, mean, std_dev } = analysis.payload else {
            panic!("wrong payload variant");
        };
        assert!((mean - 90.0).abs() < 1e-12);
        assert!((std_dev - 75.0).abs() < 1e-12);
        assert_eq!(bands[0].count, 1);
        assert_eq!(bands[4].count, 1);
        assert_eq!(bands.iter().map(|b| b.count).sum::<u32>(), 2);
    }

    #[test]
    fn test_shares_sum_to_one() {
        let cfg = EngineConfig::default();
        let draws = crate::testutil::make_test_draws(60);
        let analysis = analyze(&draws, 100_000, &cfg).unwrap();
        let PatternPayload::SumRanges { bands, .. } = analysis.payload else {
            panic!("wrong payload variant");
        };
        let total: f64 = bands.iter().map(|b| b.share).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_history() {
        let cfg = EngineConfig::default();
        let analysis = analyze(&[], 365, &cfg).unwrap();
        let PatternPayload::SumRanges { mean, std_dev, .. } = analysis.payload else {
            panic!("wrong payload variant");
        };
        assert_eq!(mean, 0.0);
        assert_eq!(std_dev, 0.0);
        assert_eq!(analysis.confidence, 0.0);
    }
}
