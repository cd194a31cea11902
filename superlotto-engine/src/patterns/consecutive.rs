use superlotto_db::models::Draw;
use tracing::debug;

use super::{check_window, pattern_confidence, PatternAnalysis, PatternPayload, PatternType};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::history;

/// Counts adjacent pairs differing by exactly 1 in each sorted front zone
/// and aggregates a distribution of pair counts across the window.
pub fn analyze(draws: &[Draw], window_days: i64, cfg: &EngineConfig) -> Result<PatternAnalysis> {
    check_window(window_days)?;

    let ordered = history::chronological(draws);
    let recent = history::windowed(&ordered, window_days);
    debug!(draws = recent.len(), "consecutive-number analysis");

    let mut pair_histogram = [0u32; 5];
    for draw in recent {
        let pairs = consecutive_pairs(draw);
        pair_histogram[pairs.min(4)] += 1;
    }

    let draws_with_consecutive: u32 = pair_histogram[1..].iter().sum();
    let share_with_consecutive = if recent.is_empty() {
        0.0
    } else {
        draws_with_consecutive as f64 / recent.len() as f64
    };

    let (confidence, low_confidence) = pattern_confidence(cfg, recent.len());
    Ok(PatternAnalysis {
        pattern: PatternType::Consecutive,
        payload: PatternPayload::Consecutive {
            pair_histogram,
            draws_with_consecutive,
            share_with_consecutive,
        },
        confidence,
        sample_size: recent.len(),
        window_days,
        low_confidence,
    })
}

fn consecutive_pairs(draw: &Draw) -> usize {
    draw.sorted_front()
        .windows(2)
        .filter(|w| w[1] - w[0] == 1)
        .count()
}
