use superlotto_db::models::{Draw, Zone};
use tracing::debug;

use super::{check_window, pattern_confidence, GapStat, PatternAnalysis, PatternPayload, PatternType};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::history;

/// Per-number gap behavior across the FULL available history (gap sequences
/// need every appearance, not just the trailing window; `window_days` is
/// recorded for cache keying only). Feeds "overdue relative to the number's
/// own average gap".
pub fn analyze(draws: &[Draw], window_days: i64, cfg: &EngineConfig) -> Result<PatternAnalysis> {
    check_window(window_days)?;

    let ordered = history::chronological(draws);
    debug!(draws = ordered.len(), "gap-pattern analysis");

    let zone = Zone::Front;
    let theoretical_gap = zone.size() as f64 / zone.pick_count() as f64;

    let numbers = (1..=zone.size() as u8)
        .map(|number| {
            let mut gaps: Vec<u32> = Vec::new();
            let mut last_seen: Option<usize> = None;
            for (t, draw) in ordered.iter().enumerate() {
                if zone.numbers_from(draw).contains(&number) {
                    if let Some(prev) = last_seen {
                        gaps.push((t - prev) as u32);
                    }
                    last_seen = Some(t);
                }
            }

            let appearances = last_seen.map_or(0, |_| gaps.len() as u32 + 1);
            let current_gap = match last_seen {
                Some(t) => (ordered.len() - 1 - t) as u32,
                None => ordered.len() as u32,
            };

            let (average_gap, min_gap, max_gap, std_dev) = if gaps.is_empty() {
                (theoretical_gap, 0, 0, 0.0)
            } else {
                let mean = gaps.iter().sum::<u32>() as f64 / gaps.len() as f64;
                let variance = gaps
                    .iter()
                    .map(|&g| (g as f64 - mean).powi(2))
                    .sum::<f64>()
                    / gaps.len() as f64;
                (
                    mean,
                    *gaps.iter().min().unwrap(),
                    *gaps.iter().max().unwrap(),
                    variance.sqrt(),
                )
            };

            GapStat {
                number,
                appearances,
                average_gap,
                min_gap,
                max_gap,
                std_dev,
                current_gap,
                overdue_ratio: (current_gap as f64 + 1.0) / average_gap.max(1.0),
            }
        })
        .collect();

    let (confidence, low_confidence) = pattern_confidence(cfg, ordered.len());
    Ok(PatternAnalysis {
        pattern: PatternType::GapPatterns,
        payload: PatternPayload::GapPatterns { numbers },
        confidence,
        sample_size: ordered.len(),
        window_days,
        low_confidence,
    })
}
