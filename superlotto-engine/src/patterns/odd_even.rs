use superlotto_db::models::Draw;
use tracing::debug;

use super::{check_window, pattern_confidence, PatternAnalysis, PatternPayload, PatternType};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::history;

/// Histogram over front-zone odd counts (0..=5), reporting the modal odd
/// count and its share. Ties break toward the lower odd count.
pub fn analyze(draws: &[Draw], window_days: i64, cfg: &EngineConfig) -> Result<PatternAnalysis> {
    check_window(window_days)?;

    let ordered = history::chronological(draws);
    let recent = history::windowed(&ordered, window_days);
    debug!(draws = recent.len(), "odd/even analysis");

    let mut odd_histogram = [0u32; 6];
    for draw in recent {
        odd_histogram[draw.odd_count_front()] += 1;
    }

    let modal_odd_count = odd_histogram
        .iter()
        .enumerate()
        .max_by_key(|&(i, &count)| (count, std::cmp::Reverse(i)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let modal_share = if recent.is_empty() {
        0.0
    } else {
        odd_histogram[modal_odd_count] as f64 / recent.len() as f64
    };

    let (confidence, low_confidence) = pattern_confidence(cfg, recent.len());
    Ok(PatternAnalysis {
        pattern: PatternType::OddEven,
        payload: PatternPayload::OddEven {
            odd_histogram,
            modal_odd_count,
            modal_share,
        },
        confidence,
        sample_size: recent.len(),
        window_days,
        low_confidence,
    })
}
