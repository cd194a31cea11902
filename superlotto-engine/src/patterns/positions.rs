use superlotto_db::models::{Draw, Zone};
use tracing::debug;

use super::{check_window, pattern_confidence, PatternAnalysis, PatternPayload, PatternType};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::history;

/// Frequency of each number at each position of the sorted front zone
/// (position 0 = smallest drawn number).
pub fn analyze(draws: &[Draw], window_days: i64, cfg: &EngineConfig) -> Result<PatternAnalysis> {
    check_window(window_days)?;

    let ordered = history::chronological(draws);
    let recent = history::windowed(&ordered, window_days);
    debug!(draws = recent.len(), "position-pattern analysis");

    let zone = Zone::Front;
    let mut counts = vec![vec![0u32; zone.size()]; zone.pick_count()];
    for draw in recent {
        for (pos, &number) in draw.sorted_front().iter().enumerate() {
            counts[pos][(number - 1) as usize] += 1;
        }
    }

    let (confidence, low_confidence) = pattern_confidence(cfg, recent.len());
    Ok(PatternAnalysis {
        pattern: PatternType::PositionPatterns,
        payload: PatternPayload::Positions { counts },
        confidence,
        sample_size: recent.len(),
        window_days,
        low_confidence,
    })
}
