//! Structural statistics over draw history: consecutive runs, odd/even
//! balance, sum bands, per-number gap behavior and positional frequencies.
//!
//! Every detector returns a result even on thin history; uncertainty is
//! annotated through the confidence score and the low-confidence flag,
//! never by suppressing output.

pub mod consecutive;
pub mod gap_patterns;
pub mod odd_even;
pub mod positions;
pub mod sum_ranges;

use serde::{Deserialize, Serialize};
use superlotto_db::models::Draw;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternType {
    Consecutive,
    OddEven,
    SumRanges,
    GapPatterns,
    PositionPatterns,
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternType::Consecutive => write!(f, "consecutive-numbers"),
            PatternType::OddEven => write!(f, "odd-even-distribution"),
            PatternType::SumRanges => write!(f, "sum-ranges"),
            PatternType::GapPatterns => write!(f, "gap-patterns"),
            PatternType::PositionPatterns => write!(f, "position-patterns"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    pub pattern: PatternType,
    pub payload: PatternPayload,
    pub confidence: f64,
    pub sample_size: usize,
    pub window_days: i64,
    pub low_confidence: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PatternPayload {
    /// Distribution of consecutive-pair counts (index = pairs per draw).
    Consecutive {
        pair_histogram: [u32; 5],
        draws_with_consecutive: u32,
        share_with_consecutive: f64,
    },
    /// Histogram over front-zone odd counts 0..=5.
    OddEven {
        odd_histogram: [u32; 6],
        modal_odd_count: usize,
        modal_share: f64,
    },
    SumRanges {
        bands: Vec<SumBandStat>,
        mean: f64,
        std_dev: f64,
    },
    GapPatterns { numbers: Vec<GapStat> },
    /// counts[position][number - 1] over the sorted front zone.
    Positions { counts: Vec<Vec<u32>> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SumBandStat {
    pub label: String,
    pub min: u32,
    pub max: u32,
    pub count: u32,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapStat {
    pub number: u8,
    pub appearances: u32,
    pub average_gap: f64,
    pub min_gap: u32,
    pub max_gap: u32,
    pub std_dev: f64,
    pub current_gap: u32,
    /// `(current_gap + 1) / average_gap`; > 1 means overdue relative to
    /// the number's own history.
    pub overdue_ratio: f64,
}

pub fn analyze(
    pattern: PatternType,
    draws: &[Draw],
    window_days: i64,
    cfg: &EngineConfig,
) -> Result<PatternAnalysis> {
    match pattern {
        PatternType::Consecutive => consecutive::analyze(draws, window_days, cfg),
        PatternType::OddEven => odd_even::analyze(draws, window_days, cfg),
        PatternType::SumRanges => sum_ranges::analyze(draws, window_days, cfg),
        PatternType::GapPatterns => gap_patterns::analyze(draws, window_days, cfg),
        PatternType::PositionPatterns => positions::analyze(draws, window_days, cfg),
    }
}

pub(crate) fn check_window(window_days: i64) -> Result<()> {
    if window_days <= 0 {
        return Err(EngineError::invalid("window_days", "must be positive"));
    }
    Ok(())
}

/// `min(1, n/100)`, halved again below the minimum sample size and capped
/// below 0.5 so thin history is always visibly uncertain.
pub(crate) fn pattern_confidence(cfg: &EngineConfig, sample_size: usize) -> (f64, bool) {
    let mut raw = cfg.sample_factor(sample_size);
    if sample_size < cfg.min_sample_size {
        raw *= 0.5;
    }
    cfg.clamp_confidence(raw, sample_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::make_test_draws;

    #[test]
    fn test_confidence_reflects_sample_size() {
        let cfg = EngineConfig::default();
        let (c_small, low_small) = pattern_confidence(&cfg, 10);
        let (c_big, low_big) = pattern_confidence(&cfg, 200);
        assert!(low_small);
        assert!(c_small < 0.5);
        assert!(!low_big);
        assert!(c_big > c_small);
    }

    #[test]
    fn test_dispatch_covers_every_pattern() {
        let cfg = EngineConfig::default();
        let draws = make_test_draws(50);
        for pattern in [
            PatternType::Consecutive,
            PatternType::OddEven,
            PatternType::SumRanges,
            PatternType::GapPatterns,
            PatternType::PositionPatterns,
        ] {
            let analysis = analyze(pattern, &draws, 100_000, &cfg).unwrap();
            assert_eq!(analysis.pattern, pattern);
            assert!(analysis.confidence >= 0.0 && analysis.confidence <= 1.0);
        }
    }

    #[test]
    fn test_rejects_non_positive_window() {
        let cfg = EngineConfig::default();
        let draws = make_test_draws(10);
        assert!(analyze(PatternType::OddEven, &draws, 0, &cfg).is_err());
    }
}
