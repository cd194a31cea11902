//! Statistical analysis and prediction engine over Super Lotto draw
//! history.
//!
//! Every operation is a pure function of an in-memory draw snapshot and its
//! parameters: no I/O, no shared mutable state, deterministic output.
//! Persistence and result caching are collaborators
//! ([`superlotto_db`], [`cache::AnalysisCache`]), not part of the engine.

pub mod cache;
pub mod config;
pub mod ensemble;
pub mod error;
pub mod frequency;
pub mod markov;
pub mod patterns;
pub mod predict;
pub mod suggestions;

pub use config::EngineConfig;
pub use error::{EngineError, Result};

pub mod history {
    //! Snapshot ordering and windowing shared by all analyzers.

    use superlotto_db::models::Draw;

    /// Defensive chronological ordering (oldest first). Ties on date fall
    /// back to the issue number so ordering is total.
    pub fn chronological(draws: &[Draw]) -> Vec<&Draw> {
        let mut ordered: Vec<&Draw> = draws.iter().collect();
        ordered.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.draw_number.cmp(&b.draw_number))
        });
        ordered
    }

    /// Trailing slice of `ordered` whose dates fall within `window_days`
    /// of the most recent draw. `ordered` must be chronological.
    pub fn windowed<'a, 'b>(ordered: &'b [&'a Draw], window_days: i64) -> &'b [&'a Draw] {
        let Some(latest) = ordered.last() else {
            return ordered;
        };
        let start = ordered
            .partition_point(|d| (latest.date - d.date).num_days() > window_days);
        &ordered[start..]
    }
}

pub mod testutil {
    //! Deterministic draw fixtures shared across the engine test modules.

    use chrono::NaiveDate;
    use superlotto_db::models::Draw;

    pub fn make_test_draws(n: usize) -> Vec<Draw> {
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                let base = (i % 7) as u8;
                Draw {
                    id: i as i64 + 1,
                    draw_number: format!("24{:03}", i + 1),
                    date: epoch + chrono::Duration::days(3 * i as i64),
                    front: [
                        base * 5 + 1,
                        base * 5 + 2,
                        base * 5 + 3,
                        base * 5 + 4,
                        base * 5 + 5,
                    ],
                    back: [(i % 12) as u8 + 1, ((i + 5) % 12) as u8 + 1],
                    jackpot_amount: None,
                    winners_count: None,
                }
            })
            .collect()
    }

    /// A draw with explicit numbers, `days` days after 2024-01-01.
    pub fn draw_on_day(days: i64, front: [u8; 5], back: [u8; 2]) -> Draw {
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Draw {
            id: days + 1,
            draw_number: format!("24{:03}", days + 1),
            date: epoch + chrono::Duration::days(days),
            front,
            back,
            jackpot_amount: None,
            winners_count: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::history::{chronological, windowed};
    use super::testutil::{draw_on_day, make_test_draws};

    #[test]
    fn test_make_test_draws_are_valid() {
        for draw in make_test_draws(40) {
            superlotto_db::models::validate_draw(&draw.front, &draw.back).unwrap();
        }
    }

    #[test]
    fn test_chronological_sorts_descending_input() {
        let mut draws = make_test_draws(10);
        draws.reverse();
        let ordered = chronological(&draws);
        assert!(ordered.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn test_windowed_keeps_trailing_period() {
        let draws = vec![
            draw_on_day(0, [1, 2, 3, 4, 5], [1, 2]),
            draw_on_day(5, [6, 7, 8, 9, 10], [3, 4]),
            draw_on_day(40, [11, 12, 13, 14, 15], [5, 6]),
        ];
        let ordered = chronological(&draws);
        let recent = windowed(&ordered, 30);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].front, [11, 12, 13, 14, 15]);

        let all = windowed(&ordered, 365);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_windowed_empty_history() {
        let ordered: Vec<&superlotto_db::models::Draw> = vec![];
        assert!(windowed(&ordered, 30).is_empty());
    }
}
