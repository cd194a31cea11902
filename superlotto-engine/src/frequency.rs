//! Per-number frequency, recency gaps and hot/cold scores over a trailing
//! window of draw history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use superlotto_db::models::{Draw, Zone};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::history;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberFrequency {
    pub number: u8,
    pub zone: Zone,
    /// Occurrences within the analysis window.
    pub frequency: u32,
    pub last_seen: Option<NaiveDate>,
    /// Draws since the last occurrence (0 = drawn in the latest draw);
    /// the windowed draw count when never seen.
    pub current_gap: u32,
    /// Mean draws between appearances within the window; the theoretical
    /// expectation `size / pick_count` with fewer than two appearances.
    pub average_gap: f64,
    pub hot_score: f64,
    pub cold_score: f64,
    pub window_days: i64,
}

/// Computes one record per number in `zone`'s range.
///
/// `hot = frequency * recency_weight` with the hyperbolic weight
/// `1 / (1 + days_since_last_seen / half_life)` (0 when never seen), and
/// `cold = 1 / (1 + hot)`. An empty history yields all-zero records, not an
/// error.
pub fn analyze(
    draws: &[Draw],
    zone: Zone,
    window_days: i64,
    decay_half_life_days: f64,
) -> Result<Vec<NumberFrequency>> {
    if window_days <= 0 {
        return Err(EngineError::invalid("window_days", "must be positive"));
    }
    if decay_half_life_days <= 0.0 || !decay_half_life_days.is_finite() {
        return Err(EngineError::invalid(
            "decay_half_life_days",
            "must be positive and finite",
        ));
    }

    let size = zone.size();
    let ordered = history::chronological(draws);
    let recent = history::windowed(&ordered, window_days);
    debug!(
        zone = %zone,
        window_days,
        draws = recent.len(),
        "frequency analysis"
    );

    if recent.is_empty() {
        return Ok((1..=size as u8)
            .map(|number| NumberFrequency {
                number,
                zone,
                frequency: 0,
                last_seen: None,
                current_gap: 0,
                average_gap: 0.0,
                hot_score: 0.0,
                cold_score: 0.0,
                window_days,
            })
            .collect());
    }

    let latest_date = recent[recent.len() - 1].date;
    let theoretical_gap = size as f64 / zone.pick_count() as f64;

    let records = (1..=size as u8)
        .map(|number| {
            let mut frequency = 0u32;
            let mut last_seen_idx: Option<usize> = None;
            let mut gaps: Vec<u32> = Vec::new();

            for (t, draw) in recent.iter().enumerate() {
                if zone.numbers_from(draw).contains(&number) {
                    frequency += 1;
                    if let Some(prev) = last_seen_idx {
                        gaps.push((t - prev) as u32);
                    }
                    last_seen_idx = Some(t);
                }
            }

            let last_seen = last_seen_idx.map(|t| recent[t].date);
            let current_gap = match last_seen_idx {
                Some(t) => (recent.len() - 1 - t) as u32,
                None => recent.len() as u32,
            };
            let average_gap = if gaps.is_empty() {
                theoretical_gap
            } else {
                gaps.iter().sum::<u32>() as f64 / gaps.len() as f64
            };

            let recency_weight = match last_seen {
                Some(date) => {
                    let days = (latest_date - date).num_days() as f64;
                    1.0 / (1.0 + days / decay_half_life_days)
                }
                None => 0.0,
            };
            let hot_score = frequency as f64 * recency_weight;
            let cold_score = 1.0 / (1.0 + hot_score);

            NumberFrequency {
                number,
                zone,
                frequency,
                last_seen,
                current_gap,
                average_gap,
                hot_score,
                cold_score,
                window_days,
            }
        })
        .collect();

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{draw_on_day, make_test_draws};

    #[test]
    fn test_rejects_bad_parameters() {
        let draws = make_test_draws(5);
        assert!(analyze(&draws, Zone::Front, 0, 30.0).is_err());
        assert!(analyze(&draws, Zone::Front, -10, 30.0).is_err());
        assert!(analyze(&draws, Zone::Front, 365, 0.0).is_err());
        assert!(analyze(&draws, Zone::Front, 365, f64::NAN).is_err());
    }

    #[test]
    fn test_empty_history_is_all_zero_not_an_error() {
        let records = analyze(&[], Zone::Front, 365, 30.0).unwrap();
        assert_eq!(records.len(), 35);
        for r in &records {
            assert_eq!(r.frequency, 0);
            assert_eq!(r.hot_score, 0.0);
            assert_eq!(r.cold_score, 0.0);
            assert!(r.last_seen.is_none());
        }
    }

    #[test]
    fn test_frequency_conservation() {
        let draws = make_test_draws(40);
        for (zone, picks) in [(Zone::Front, 5u32), (Zone::Back, 2u32)] {
            let records = analyze(&draws, zone, 100_000, 30.0).unwrap();
            let total: u32 = records.iter().map(|r| r.frequency).sum();
            assert_eq!(total, 40 * picks);
        }
    }

    #[test]
    fn test_determinism() {
        let draws = make_test_draws(60);
        let a = analyze(&draws, Zone::Front, 365, 30.0).unwrap();
        let b = analyze(&draws, Zone::Front, 365, 30.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_counts_over_three_draws() {
        // [1,2,3,4,5], [2,3,4,5,6], [1,2,3,4,5]: number 2 appears 3 times,
        // number 6 once.
        let draws = vec![
            draw_on_day(0, [1, 2, 3, 4, 5], [1, 2]),
            draw_on_day(3, [2, 3, 4, 5, 6], [1, 2]),
            draw_on_day(6, [1, 2, 3, 4, 5], [1, 2]),
        ];
        let records = analyze(&draws, Zone::Front, 365, 30.0).unwrap();
        let two = &records[1];
        let six = &records[5];
        assert_eq!(two.frequency, 3);
        assert_eq!(six.frequency, 1);
        assert!(two.hot_score > six.hot_score);
    }

    #[test]
    fn test_current_gap_counts_draws_since_last_seen() {
        let draws = vec![
            draw_on_day(0, [1, 2, 3, 4, 5], [1, 2]),
            draw_on_day(3, [10, 11, 12, 13, 14], [3, 4]),
            draw_on_day(6, [20, 21, 22, 23, 24], [5, 6]),
        ];
        let records = analyze(&draws, Zone::Front, 365, 30.0).unwrap();
        assert_eq!(records[0].current_gap, 2); // number 1, seen in oldest draw
        assert_eq!(records[19].current_gap, 0); // number 20, in latest draw
        assert_eq!(records[34].current_gap, 3); // number 35, never seen
    }

    #[test]
    fn test_monotonic_decay_in_half_life() {
        let draws = make_test_draws(40);
        let short = analyze(&draws, Zone::Front, 365, 10.0).unwrap();
        let long = analyze(&draws, Zone::Front, 365, 60.0).unwrap();
        for (s, l) in short.iter().zip(long.iter()) {
            assert!(
                l.hot_score >= s.hot_score,
                "number {}: hot {} < {} with longer half-life",
                s.number,
                l.hot_score,
                s.hot_score
            );
        }
    }

    #[test]
    fn test_window_excludes_old_draws() {
        let draws = vec![
            draw_on_day(0, [1, 2, 3, 4, 5], [1, 2]),
            draw_on_day(100, [6, 7, 8, 9, 10], [3, 4]),
        ];
        let records = analyze(&draws, Zone::Front, 30, 30.0).unwrap();
        assert_eq!(records[0].frequency, 0); // draw on day 0 is outside
        assert_eq!(records[5].frequency, 1);
    }

    #[test]
    fn test_scores_are_bounded() {
        let draws = make_test_draws(80);
        let records = analyze(&draws, Zone::Back, 365, 30.0).unwrap();
        for r in &records {
            assert!(r.hot_score >= 0.0);
            assert!(r.cold_score > 0.0 && r.cold_score <= 1.0);
        }
    }
}
