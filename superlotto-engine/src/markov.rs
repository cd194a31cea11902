//! Order-N Markov transitions over the chronological sequence of drawn
//! front-zone numbers, with exponential per-draw decay weighting.

use std::collections::HashMap;

use superlotto_db::models::{Draw, Zone};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::history;

pub const MAX_ORDER: usize = 3;

/// Row-stochastic transition tables for every order 1..=N. Lower orders are
/// kept so an unseen high-order state can fall back instead of fabricating
/// confidence.
#[derive(Debug, Clone)]
pub struct MarkovModel {
    order: usize,
    window_days: i64,
    decay_factor: f64,
    /// tables[k] holds the rows of order k+1, keyed by the state tuple.
    tables: Vec<HashMap<Vec<u8>, Vec<f64>>>,
    transition_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastBasis {
    /// The full-order state was observed in history.
    Observed { order: usize },
    /// Fell back to a shorter state.
    LowerOrder { order: usize },
    /// No state of any order was observed; the distribution is uniform.
    NoInformation,
}

#[derive(Debug, Clone)]
pub struct MarkovForecast {
    /// (number, probability), descending by probability, ties broken by
    /// lower number.
    pub ranked: Vec<(u8, f64)>,
    pub basis: ForecastBasis,
}

impl MarkovModel {
    pub fn build(
        draws: &[Draw],
        order: usize,
        window_days: i64,
        decay_factor: f64,
    ) -> Result<Self> {
        if order < 1 || order > MAX_ORDER {
            return Err(EngineError::invalid(
                "order",
                format!("must be between 1 and {MAX_ORDER}"),
            ));
        }
        if !(decay_factor > 0.0 && decay_factor <= 1.0) {
            return Err(EngineError::invalid(
                "decay_factor",
                "must be in (0, 1]",
            ));
        }
        if window_days <= 0 {
            return Err(EngineError::invalid("window_days", "must be positive"));
        }

        let ordered = history::chronological(draws);
        let recent = history::windowed(&ordered, window_days);

        // Flattened chronological sequence of drawn numbers, each tagged
        // with the index of its draw for decay weighting.
        let mut sequence: Vec<(u8, usize)> = Vec::with_capacity(recent.len() * 5);
        for (draw_idx, draw) in recent.iter().enumerate() {
            for number in draw.sorted_front() {
                sequence.push((number, draw_idx));
            }
        }

        let latest_draw = recent.len().saturating_sub(1);
        let mut weighted: Vec<HashMap<Vec<u8>, Vec<f64>>> =
            (0..order).map(|_| HashMap::new()).collect();

        for ord in 1..=order {
            for i in ord..sequence.len() {
                let state: Vec<u8> = sequence[i - ord..i].iter().map(|&(n, _)| n).collect();
                let (next, target_draw) = sequence[i];
                let draws_ago = (latest_draw - target_draw) as i32;
                let weight = decay_factor.powi(draws_ago);
                let row = weighted[ord - 1]
                    .entry(state)
                    .or_insert_with(|| vec![0.0; Zone::Front.size()]);
                row[(next - 1) as usize] += weight;
            }
        }

        // Normalize every row to a probability distribution.
        for table in &mut weighted {
            for row in table.values_mut() {
                let total: f64 = row.iter().sum();
                if total > 0.0 {
                    for p in row.iter_mut() {
                        *p /= total;
                    }
                }
            }
        }

        let transition_count = sequence.len().saturating_sub(order);
        debug!(
            order,
            transitions = transition_count,
            states = weighted.iter().map(|t| t.len()).sum::<usize>(),
            "markov model built"
        );

        Ok(Self {
            order,
            window_days,
            decay_factor,
            tables: weighted,
            transition_count,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn window_days(&self) -> i64 {
        self.window_days
    }

    pub fn decay_factor(&self) -> f64 {
        self.decay_factor
    }

    /// Observed transitions at the full order.
    pub fn transition_count(&self) -> usize {
        self.transition_count
    }

    /// Distinct states across all orders.
    pub fn state_count(&self) -> usize {
        self.tables.iter().map(|t| t.len()).sum()
    }

    /// Candidate scores for the next drawn number given the most recent
    /// numbers. Falls back from the full order down to order 1, then to a
    /// uniform no-information distribution.
    pub fn predict_next(&self, recent: &[u8]) -> MarkovForecast {
        let usable = self.order.min(recent.len());
        for ord in (1..=usable).rev() {
            let state = recent[recent.len() - ord..].to_vec();
            if let Some(row) = self.tables[ord - 1].get(&state) {
                let basis = if ord == self.order {
                    ForecastBasis::Observed { order: ord }
                } else {
                    ForecastBasis::LowerOrder { order: ord }
                };
                return MarkovForecast {
                    ranked: rank_distribution(row),
                    basis,
                };
            }
        }

        let size = Zone::Front.size();
        let uniform = vec![1.0 / size as f64; size];
        MarkovForecast {
            ranked: rank_distribution(&uniform),
            basis: ForecastBasis::NoInformation,
        }
    }

    #[cfg(test)]
    fn rows(&self) -> impl Iterator<Item = (&Vec<u8>, &Vec<f64>)> {
        self.tables.iter().flat_map(|t| t.iter())
    }
}

fn rank_distribution(row: &[f64]) -> Vec<(u8, f64)> {
    let mut ranked: Vec<(u8, f64)> = row
        .iter()
        .enumerate()
        .map(|(i, &p)| ((i + 1) as u8, p))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked
}
