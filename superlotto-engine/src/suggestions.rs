//! Grid suggestions sampled from per-number probability vectors, with a
//! deterministic seed and a diversity constraint between grids.

use chrono::Datelike;
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use superlotto_db::models::Zone;

use crate::error::{EngineError, Result};

/// One playable grid. `score` is the probability lift of the combination
/// over a uniform pick (1.0 = no better than chance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub front: [u8; 5],
    pub back: [u8; 2],
    pub score: f64,
}

/// Deterministic seed derived from today's date (YYYYMMDD), so repeated
/// runs on the same day agree.
pub fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    let y = today.year() as u64;
    let m = today.month() as u64;
    let d = today.day() as u64;
    y * 10_000 + m * 100 + d
}

/// Numbers of `a` absent from `b`.
fn front_distance(a: &[u8; 5], b: &[u8; 5]) -> usize {
    a.iter().filter(|x| !b.contains(x)).count()
}

/// Greedy pick: best score first, keeping a minimum pairwise front-zone
/// difference. Falls back to the best remaining grids when diversity
/// cannot be satisfied.
fn select_diverse(candidates: &[Grid], count: usize, min_front_diff: usize) -> Vec<Grid> {
    // candidates must already be sorted by descending score
    let mut selected: Vec<Grid> = Vec::with_capacity(count);

    for candidate in candidates {
        if selected.len() >= count {
            break;
        }
        let dominated = selected
            .iter()
            .any(|s| front_distance(&candidate.front, &s.front) < min_front_diff);
        if !dominated {
            selected.push(candidate.clone());
        }
    }

    if selected.len() < count {
        for candidate in candidates {
            if selected.len() >= count {
                break;
            }
            if !selected
                .iter()
                .any(|s| s.front == candidate.front && s.back == candidate.back)
            {
                selected.push(candidate.clone());
            }
        }
    }

    selected
}

/// Deterministic grid: top 5 front and top 2 back numbers by probability.
pub fn optimal_grid(front_probs: &[f64], back_probs: &[f64]) -> Result<Grid> {
    check_probs(front_probs, back_probs)?;

    let mut front_indices: Vec<usize> = (0..front_probs.len()).collect();
    front_indices.sort_by(|&a, &b| {
        front_probs[b]
            .partial_cmp(&front_probs[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.cmp(&b))
    });

    let mut back_indices: Vec<usize> = (0..back_probs.len()).collect();
    back_indices.sort_by(|&a, &b| {
        back_probs[b]
            .partial_cmp(&back_probs[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.cmp(&b))
    });

    let mut front = [0u8; 5];
    for (i, &idx) in front_indices.iter().take(5).enumerate() {
        front[i] = (idx + 1) as u8;
    }
    front.sort_unstable();

    let mut back = [0u8; 2];
    for (i, &idx) in back_indices.iter().take(2).enumerate() {
        back[i] = (idx + 1) as u8;
    }
    back.sort_unstable();

    let uniform_front = 1.0 / front_probs.len() as f64;
    let uniform_back = 1.0 / back_probs.len() as f64;
    let score: f64 = front
        .iter()
        .map(|&n| front_probs[(n - 1) as usize] / uniform_front)
        .product::<f64>()
        * back
            .iter()
            .map(|&n| back_probs[(n - 1) as usize] / uniform_back)
            .product::<f64>();

    Ok(Grid { front, back, score })
}

/// Samples `count * oversample` candidate grids from the probability
/// vectors, keeps the `count` best under the diversity constraint.
pub fn generate_grids(
    front_probs: &[f64],
    back_probs: &[f64],
    count: usize,
    seed: u64,
    oversample: usize,
    min_front_diff: usize,
) -> Result<Vec<Grid>> {
    check_probs(front_probs, back_probs)?;
    if count == 0 || oversample == 0 {
        return Err(EngineError::invalid(
            "count",
            "count and oversample must be at least 1",
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);

    let uniform_front = 1.0 / front_probs.len() as f64;
    let uniform_back = 1.0 / back_probs.len() as f64;

    let n_candidates = count * oversample;
    let mut candidates = Vec::with_capacity(n_candidates);

    for _ in 0..n_candidates {
        let (front, front_score) =
            sample_without_replacement(front_probs, 5, uniform_front, &mut rng)?;
        let (back, back_score) =
            sample_without_replacement(back_probs, 2, uniform_back, &mut rng)?;

        let mut front_arr = [0u8; 5];
        front_arr.copy_from_slice(&front);
        front_arr.sort_unstable();

        let mut back_arr = [0u8; 2];
        back_arr.copy_from_slice(&back);
        back_arr.sort_unstable();

        candidates.push(Grid {
            front: front_arr,
            back: back_arr,
            score: front_score * back_score,
        });
    }

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(select_diverse(&candidates, count, min_front_diff))
}

fn sample_without_replacement(
    probs: &[f64],
    count: usize,
    uniform_prob: f64,
    rng: &mut StdRng,
) -> Result<(Vec<u8>, f64)> {
    let mut available: Vec<(u8, f64)> = probs
        .iter()
        .enumerate()
        .map(|(i, &p)| ((i + 1) as u8, p))
        .collect();
    let mut selected = Vec::with_capacity(count);
    let mut score = 1.0f64;

    for _ in 0..count {
        let weights: Vec<f64> = available.iter().map(|(_, w)| *w).collect();
        let dist = WeightedIndex::new(&weights)
            .map_err(|e| EngineError::invalid("probs", e.to_string()))?;
        let idx = dist.sample(rng);

        let (number, prob) = available.remove(idx);
        selected.push(number);
        score *= prob / uniform_prob;
    }

    Ok((selected, score))
}

fn check_probs(front_probs: &[f64], back_probs: &[f64]) -> Result<()> {
    if front_probs.len() != Zone::Front.size() {
        return Err(EngineError::invalid(
            "front_probs",
            format!("expected {} entries", Zone::Front.size()),
        ));
    }
    if back_probs.len() != Zone::Back.size() {
        return Err(EngineError::invalid(
            "back_probs",
            format!("expected {} entries", Zone::Back.size()),
        ));
    }
    if front_probs
        .iter()
        .chain(back_probs)
        .any(|p| !p.is_finite() || *p < 0.0)
    {
        return Err(EngineError::invalid(
            "probs",
            "must be finite and non-negative",
        ));
    }
    Ok(())
}
