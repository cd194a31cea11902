//! Prediction generation: deterministic scoring strategies over the
//! analyzer outputs, selecting a structurally valid candidate number set
//! with a confidence score and per-number reasoning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use superlotto_db::models::{validate_draw, Draw, Zone};
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::history;
use crate::markov::{ForecastBasis, MarkovModel};
use crate::patterns::{self, PatternPayload};
use crate::frequency;

/// Closed set of prediction strategies; adding one is a compile-checked
/// change everywhere the enum is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    WeightedFrequency,
    PatternBased,
    HotNumbers,
    ColdNumbers,
    MarkovChain,
    PositionAnalysis,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::WeightedFrequency,
        Algorithm::PatternBased,
        Algorithm::HotNumbers,
        Algorithm::ColdNumbers,
        Algorithm::MarkovChain,
        Algorithm::PositionAnalysis,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::WeightedFrequency => "weighted-frequency",
            Algorithm::PatternBased => "pattern-based",
            Algorithm::HotNumbers => "hot-numbers",
            Algorithm::ColdNumbers => "cold-numbers",
            Algorithm::MarkovChain => "markov-chain",
            Algorithm::PositionAnalysis => "position-analysis",
        }
    }

    /// Prior confidence of the strategy before sample-size and
    /// score-separation adjustments.
    fn base_confidence(&self) -> f64 {
        match self {
            Algorithm::WeightedFrequency => 0.65,
            Algorithm::PatternBased => 0.65,
            Algorithm::HotNumbers => 0.55,
            Algorithm::ColdNumbers => 0.50,
            Algorithm::MarkovChain => 0.70,
            Algorithm::PositionAnalysis => 0.60,
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionParams {
    pub window_days: i64,
    pub decay_half_life_days: f64,
    pub markov_order: usize,
    pub markov_decay: f64,
    /// Cooperative cutoff: cap on the most recent draws scanned. Truncation
    /// is reported in the prediction notes and penalizes confidence.
    pub max_draws: Option<usize>,
}

impl PredictionParams {
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self {
            window_days: 365,
            decay_half_life_days: cfg.default_half_life_days,
            markov_order: 1,
            markov_decay: cfg.default_markov_decay,
            max_draws: None,
        }
    }
}

/// One factor that contributed to selecting a number (or, as a
/// prediction-level note, to interpreting the whole result).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Factor {
    FrequencyRank { rank: usize, frequency: u32 },
    HotScore { score: f64 },
    Overdue { current_gap: u32, average_gap: f64, ratio: f64 },
    Transition { probability: f64 },
    PositionFrequency { position: usize, count: u32 },
    PatternTarget { odd_count: usize, sum_band: String },
    /// Back-zone scores for strategies whose core metric is front-only.
    BackZoneByFrequency,
    MarkovFallback { order: usize },
    MarkovNoInformation,
    HistoryTruncated { scanned: usize, total: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionReason {
    pub number: u8,
    pub zone: Zone,
    pub factors: Vec<Factor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub algorithm: Algorithm,
    pub front: [u8; 5],
    pub back: [u8; 2],
    pub confidence: f64,
    pub low_confidence: bool,
    pub reasoning: Vec<SelectionReason>,
    pub notes: Vec<Factor>,
    pub window_days: i64,
    pub sample_size: usize,
    pub created_at: DateTime<Utc>,
}

/// Outcome of comparing a prediction against an actual draw. Attached to
/// the prediction by the caller; the prediction itself stays immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutcome {
    pub front_matches: usize,
    pub back_matches: usize,
    /// Matched numbers over the 7 drawn, as a percentage.
    pub accuracy: f64,
}

struct Scored {
    front_scores: Vec<f64>,
    back_scores: Vec<f64>,
    front_factors: Vec<Vec<Factor>>,
    back_factors: Vec<Vec<Factor>>,
    /// Strategies with non-top-K selection (positions, pattern
    /// constraints) pre-select the front zone.
    front_override: Option<Vec<u8>>,
    notes: Vec<Factor>,
}

pub fn generate(
    algorithm: Algorithm,
    draws: &[Draw],
    params: &PredictionParams,
    cfg: &EngineConfig,
) -> Result<Prediction> {
    if params.max_draws == Some(0) {
        return Err(EngineError::invalid("max_draws", "must be at least 1"));
    }

    let mut history: Vec<Draw> = draws.to_vec();
    history.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.draw_number.cmp(&b.draw_number))
    });

    let total = history.len();
    let mut notes: Vec<Factor> = Vec::new();
    if let Some(cap) = params.max_draws {
        if history.len() > cap {
            history.drain(..history.len() - cap);
            notes.push(Factor::HistoryTruncated { scanned: cap, total });
        }
    }
    if history.is_empty() {
        return Err(EngineError::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    let ordered = history::chronological(&history);
    let sample_size = history::windowed(&ordered, params.window_days).len();

    let mut scored = match algorithm {
        Algorithm::WeightedFrequency => score_weighted_frequency(&history, params)?,
        Algorithm::HotNumbers => score_hot_numbers(&history, params)?,
        Algorithm::ColdNumbers => score_cold_numbers(&history, params)?,
        Algorithm::MarkovChain => score_markov(&history, params)?,
        Algorithm::PositionAnalysis => score_positions(&history, params, cfg)?,
        Algorithm::PatternBased => score_pattern_based(&history, params, cfg)?,
    };
    notes.append(&mut scored.notes);

    let front_numbers = match &scored.front_override {
        Some(selected) => selected.clone(),
        None => select_top(&scored.front_scores, Zone::Front.pick_count()),
    };
    let back_numbers = select_top(&scored.back_scores, Zone::Back.pick_count());

    let front: [u8; 5] = front_numbers
        .clone()
        .try_into()
        .map_err(|_| EngineError::InvariantViolation("front-zone selection incomplete".into()))?;
    let back: [u8; 2] = back_numbers
        .clone()
        .try_into()
        .map_err(|_| EngineError::InvariantViolation("back-zone selection incomplete".into()))?;
    validate_draw(&front, &back)
        .map_err(|e| EngineError::InvariantViolation(e.to_string()))?;

    let separation = score_separation(&scored.front_scores, &front);
    let truncated = notes
        .iter()
        .any(|n| matches!(n, Factor::HistoryTruncated { .. }));
    let mut raw = algorithm.base_confidence()
        * (0.4 + 0.3 * separation + 0.3 * cfg.sample_factor(sample_size));
    if truncated {
        raw *= cfg.truncation_penalty;
    }
    let (confidence, low_confidence) = cfg.clamp_confidence(raw, sample_size);

    let mut reasoning = Vec::with_capacity(7);
    for &number in &front {
        reasoning.push(SelectionReason {
            number,
            zone: Zone::Front,
            factors: scored.front_factors[(number - 1) as usize].clone(),
        });
    }
    for &number in &back {
        reasoning.push(SelectionReason {
            number,
            zone: Zone::Back,
            factors: scored.back_factors[(number - 1) as usize].clone(),
        });
    }

    info!(
        algorithm = algorithm.name(),
        confidence, sample_size, "prediction generated"
    );

    Ok(Prediction {
        algorithm,
        front,
        back,
        confidence,
        low_confidence,
        reasoning,
        notes,
        window_days: params.window_days,
        sample_size,
        created_at: Utc::now(),
    })
}

/// Match counts are the literal set intersection between predicted and
/// actual numbers.
pub fn validate_prediction(prediction: &Prediction, actual: &Draw) -> PredictionOutcome {
    let front_matches = prediction
        .front
        .iter()
        .filter(|n| actual.front.contains(n))
        .count();
    let back_matches = prediction
        .back
        .iter()
        .filter(|n| actual.back.contains(n))
        .count();
    PredictionOutcome {
        front_matches,
        back_matches,
        accuracy: (front_matches + back_matches) as f64 / 7.0 * 100.0,
    }
}

/// Top `picks` numbers by score, descending, ties broken by lower number;
/// returned in ascending number order.
fn select_top(scores: &[f64], picks: usize) -> Vec<u8> {
    let order = ranked_indices(scores);
    let mut numbers: Vec<u8> = order[..picks.min(order.len())]
        .iter()
        .map(|&i| (i + 1) as u8)
        .collect();
    numbers.sort_unstable();
    numbers
}

fn ranked_indices(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.cmp(&b))
    });
    order
}

/// Normalized gap between the mean selected score and the median score,
/// relative to the full score range. 0 when the distribution is flat.
fn score_separation(scores: &[f64], selected: &[u8]) -> f64 {
    if scores.is_empty() || selected.is_empty() {
        return 0.0;
    }
    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = sorted[sorted.len() / 2];
    let range = sorted[sorted.len() - 1] - sorted[0];
    if range <= 0.0 {
        return 0.0;
    }
    let mean_selected = selected
        .iter()
        .map(|&n| scores[(n - 1) as usize])
        .sum::<f64>()
        / selected.len() as f64;
    ((mean_selected - median) / range).clamp(0.0, 1.0)
}

fn frequency_rank_factors(records: &[frequency::NumberFrequency]) -> Vec<Vec<Factor>> {
    let scores: Vec<f64> = records.iter().map(|r| r.frequency as f64).collect();
    let order = ranked_indices(&scores);
    let mut ranks = vec![0usize; records.len()];
    for (rank, &idx) in order.iter().enumerate() {
        ranks[idx] = rank + 1;
    }
    records
        .iter()
        .map(|r| {
            vec![
                Factor::FrequencyRank {
                    rank: ranks[(r.number - 1) as usize],
                    frequency: r.frequency,
                },
                Factor::HotScore { score: r.hot_score },
            ]
        })
        .collect()
}

fn back_by_frequency(
    history: &[Draw],
    params: &PredictionParams,
) -> Result<(Vec<f64>, Vec<Vec<Factor>>)> {
    let records = frequency::analyze(
        history,
        Zone::Back,
        params.window_days,
        params.decay_half_life_days,
    )?;
    let scores = records.iter().map(|r| r.hot_score).collect();
    let factors = records
        .iter()
        .map(|r| {
            vec![
                Factor::BackZoneByFrequency,
                Factor::HotScore { score: r.hot_score },
            ]
        })
        .collect();
    Ok((scores, factors))
}

/// Ranks both zones by the frequency analyzer's time-decayed hot score.
fn score_weighted_frequency(history: &[Draw], params: &PredictionParams) -> Result<Scored> {
    let front = frequency::analyze(
        history,
        Zone::Front,
        params.window_days,
        params.decay_half_life_days,
    )?;
    let back = frequency::analyze(
        history,
        Zone::Back,
        params.window_days,
        params.decay_half_life_days,
    )?;
    Ok(Scored {
        front_scores: front.iter().map(|r| r.hot_score).collect(),
        back_scores: back.iter().map(|r| r.hot_score).collect(),
        front_factors: frequency_rank_factors(&front),
        back_factors: frequency_rank_factors(&back),
        front_override: None,
        notes: Vec::new(),
    })
}

/// Ranks by raw occurrence count within the window (recency ignored).
fn score_hot_numbers(history: &[Draw], params: &PredictionParams) -> Result<Scored> {
    let front = frequency::analyze(
        history,
        Zone::Front,
        params.window_days,
        params.decay_half_life_days,
    )?;
    let back = frequency::analyze(
        history,
        Zone::Back,
        params.window_days,
        params.decay_half_life_days,
    )?;
    Ok(Scored {
        front_scores: front.iter().map(|r| r.frequency as f64).collect(),
        back_scores: back.iter().map(|r| r.frequency as f64).collect(),
        front_factors: frequency_rank_factors(&front),
        back_factors: frequency_rank_factors(&back),
        front_override: None,
        notes: Vec::new(),
    })
}

/// Ranks by how overdue a number is relative to its own average gap.
fn score_cold_numbers(history: &[Draw], params: &PredictionParams) -> Result<Scored> {
    let overdue = |records: &[frequency::NumberFrequency]| -> (Vec<f64>, Vec<Vec<Factor>>) {
        let scores: Vec<f64> = records
            .iter()
            .map(|r| (r.current_gap as f64 + 1.0) / r.average_gap.max(1.0))
            .collect();
        let factors = records
            .iter()
            .zip(&scores)
            .map(|(r, &ratio)| {
                vec![Factor::Overdue {
                    current_gap: r.current_gap,
                    average_gap: r.average_gap,
                    ratio,
                }]
            })
            .collect();
        (scores, factors)
    };

    let front = frequency::analyze(
        history,
        Zone::Front,
        params.window_days,
        params.decay_half_life_days,
    )?;
    let back = frequency::analyze(
        history,
        Zone::Back,
        params.window_days,
        params.decay_half_life_days,
    )?;
    let (front_scores, front_factors) = overdue(&front);
    let (back_scores, back_factors) = overdue(&back);
    Ok(Scored {
        front_scores,
        back_scores,
        front_factors,
        back_factors,
        front_override: None,
        notes: Vec::new(),
    })
}

/// Front zone from the Markov next-number distribution queried with the
/// latest draw's trailing numbers; back zone by frequency (the chain is
/// built over the front-zone sequence only).
fn score_markov(history: &[Draw], params: &PredictionParams) -> Result<Scored> {
    let model = MarkovModel::build(
        history,
        params.markov_order,
        params.window_days,
        params.markov_decay,
    )?;

    let latest = history
        .iter()
        .max_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.draw_number.cmp(&b.draw_number))
        })
        .expect("history checked non-empty");
    let sorted = latest.sorted_front();
    let query = &sorted[sorted.len() - params.markov_order.min(sorted.len())..];
    let forecast = model.predict_next(query);

    let mut front_scores = vec![0.0f64; Zone::Front.size()];
    for &(number, probability) in &forecast.ranked {
        front_scores[(number - 1) as usize] = probability;
    }
    let front_factors = front_scores
        .iter()
        .map(|&probability| vec![Factor::Transition { probability }])
        .collect();

    let mut notes = Vec::new();
    match forecast.basis {
        ForecastBasis::Observed { .. } => {}
        ForecastBasis::LowerOrder { order } => notes.push(Factor::MarkovFallback { order }),
        ForecastBasis::NoInformation => notes.push(Factor::MarkovNoInformation),
    }

    let (back_scores, back_factors) = back_by_frequency(history, params)?;
    Ok(Scored {
        front_scores,
        back_scores,
        front_factors,
        back_factors,
        front_override: None,
        notes,
    })
}

/// One front number per sorted position, by positional frequency.
fn score_positions(
    history: &[Draw],
    params: &PredictionParams,
    cfg: &EngineConfig,
) -> Result<Scored> {
    let analysis = patterns::positions::analyze(history, params.window_days, cfg)?;
    let PatternPayload::Positions { counts } = analysis.payload else {
        return Err(EngineError::InvariantViolation(
            "position analysis returned wrong payload".into(),
        ));
    };

    let size = Zone::Front.size();
    let mut selected: Vec<u8> = Vec::with_capacity(5);
    let mut front_factors = vec![Vec::new(); size];
    for (position, row) in counts.iter().enumerate() {
        let pick = (0..size)
            .filter(|&i| !selected.contains(&((i + 1) as u8)))
            .max_by_key(|&i| (row[i], std::cmp::Reverse(i)))
            .expect("range larger than pick count");
        let number = (pick + 1) as u8;
        front_factors[pick].push(Factor::PositionFrequency {
            position,
            count: row[pick],
        });
        selected.push(number);
    }
    selected.sort_unstable();

    // Aggregate positional counts as the score vector for confidence.
    let front_scores: Vec<f64> = (0..size)
        .map(|i| counts.iter().map(|row| row[i] as f64).sum())
        .collect();

    let (back_scores, back_factors) = back_by_frequency(history, params)?;
    Ok(Scored {
        front_scores,
        back_scores,
        front_factors,
        back_factors,
        front_override: Some(selected),
        notes: Vec::new(),
    })
}

/// Hot-score ranking constrained to the modal odd/even split, nudged into
/// the modal sum band by bounded same-parity swaps.
fn score_pattern_based(
    history: &[Draw],
    params: &PredictionParams,
    cfg: &EngineConfig,
) -> Result<Scored> {
    let odd_even = patterns::odd_even::analyze(history, params.window_days, cfg)?;
    let PatternPayload::OddEven { modal_odd_count, .. } = odd_even.payload else {
        return Err(EngineError::InvariantViolation(
            "odd/even analysis returned wrong payload".into(),
        ));
    };
    let sums = patterns::sum_ranges::analyze(history, params.window_days, cfg)?;
    let PatternPayload::SumRanges { bands, .. } = sums.payload else {
        return Err(EngineError::InvariantViolation(
            "sum-range analysis returned wrong payload".into(),
        ));
    };
    let modal_band = bands
        .iter()
        .max_by_key(|b| b.count)
        .expect("bands are fixed");

    let front_records = frequency::analyze(
        history,
        Zone::Front,
        params.window_days,
        params.decay_half_life_days,
    )?;
    let front_scores: Vec<f64> = front_records.iter().map(|r| r.hot_score).collect();
    let selected = constrained_selection(
        &front_scores,
        modal_odd_count,
        (modal_band.min, modal_band.max),
    );

    let mut front_factors: Vec<Vec<Factor>> = front_records
        .iter()
        .map(|r| vec![Factor::HotScore { score: r.hot_score }])
        .collect();
    for &number in &selected {
        front_factors[(number - 1) as usize].push(Factor::PatternTarget {
            odd_count: modal_odd_count,
            sum_band: modal_band.label.to_string(),
        });
    }

    let (back_scores, back_factors) = back_by_frequency(history, params)?;
    Ok(Scored {
        front_scores,
        back_scores,
        front_factors,
        back_factors,
        front_override: Some(selected),
        notes: Vec::new(),
    })
}

/// Greedy score-ordered selection holding exactly `target_odd` odd numbers,
/// then up to two same-parity swaps toward the `band` sum range.
fn constrained_selection(scores: &[f64], target_odd: usize, band: (u32, u32)) -> Vec<u8> {
    let order = ranked_indices(scores);
    let target_even = Zone::Front.pick_count() - target_odd;

    let mut selected: Vec<u8> = Vec::with_capacity(5);
    let (mut odds, mut evens) = (0usize, 0usize);
    for &i in &order {
        if selected.len() == 5 {
            break;
        }
        let number = (i + 1) as u8;
        if number % 2 == 1 {
            if odds < target_odd {
                selected.push(number);
                odds += 1;
            }
        } else if evens < target_even {
            selected.push(number);
            evens += 1;
        }
    }

    let band_distance = |sum: u32| -> u32 {
        if sum < band.0 {
            band.0 - sum
        } else if sum > band.1 {
            sum - band.1
        } else {
            0
        }
    };

    for _ in 0..2 {
        let sum: u32 = selected.iter().map(|&n| n as u32).sum();
        let current = band_distance(sum);
        if current == 0 {
            break;
        }
        let mut best: Option<(usize, u8, u32)> = None;
        for (slot, &out) in selected.iter().enumerate() {
            for &i in &order {
                let candidate = (i + 1) as u8;
                if candidate % 2 != out % 2 || selected.contains(&candidate) {
                    continue;
                }
                let new_sum = sum - out as u32 + candidate as u32;
                let distance = band_distance(new_sum);
                if distance < best.map_or(current, |(_, _, d)| d) {
                    best = Some((slot, candidate, distance));
                }
            }
        }
        match best {
            Some((slot, candidate, _)) => selected[slot] = candidate,
            None => break,
        }
    }

    selected.sort_unstable();
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{draw_on_day, make_test_draws};

    fn cfg() -> EngineConfig {
        EngineConfig::default()
    }

    fn params() -> PredictionParams {
        PredictionParams {
            window_days: 100_000,
            decay_half_life_days: 30.0,
            markov_order: 1,
            markov_decay: 0.95,
            max_draws: None,
        }
    }

    #[test]
    fn test_every_algorithm_yields_valid_structure() {
        let draws = make_test_draws(120);
        for algorithm in Algorithm::ALL {
            let prediction = generate(algorithm, &draws, &params(), &cfg()).unwrap();
            validate_draw(&prediction.front, &prediction.back).unwrap();
            assert!(prediction.confidence >= 0.0 && prediction.confidence <= 1.0);
            assert_eq!(prediction.reasoning.len(), 7);
            assert!(prediction.front.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_empty_history_is_insufficient_data() {
        for algorithm in Algorithm::ALL {
            let err = generate(algorithm, &[], &params(), &cfg()).unwrap_err();
            assert!(matches!(err, EngineError::InsufficientData { .. }), "{algorithm}");
        }
    }

    #[test]
    fn test_determinism_across_invocations() {
        let draws = make_test_draws(80);
        for algorithm in Algorithm::ALL {
            let a = generate(algorithm, &draws, &params(), &cfg()).unwrap();
            let b = generate(algorithm, &draws, &params(), &cfg()).unwrap();
            assert_eq!(a.front, b.front, "{algorithm}");
            assert_eq!(a.back, b.back, "{algorithm}");
            assert_eq!(a.confidence, b.confidence, "{algorithm}");
        }
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut draws = make_test_draws(60);
        let forward = generate(Algorithm::WeightedFrequency, &draws, &params(), &cfg()).unwrap();
        draws.reverse();
        let backward = generate(Algorithm::WeightedFrequency, &draws, &params(), &cfg()).unwrap();
        assert_eq!(forward.front, backward.front);
        assert_eq!(forward.back, backward.back);
    }

    #[test]
    fn test_select_top_breaks_ties_by_lower_number() {
        let scores = vec![1.0; 35];
        assert_eq!(select_top(&scores, 5), vec![1, 2, 3, 4, 5]);

        let mut scores = vec![0.0; 35];
        scores[9] = 2.0;
        scores[4] = 2.0;
        scores[29] = 1.0;
        assert_eq!(select_top(&scores, 3), vec![5, 10, 30]);
    }

    #[test]
    fn test_hot_numbers_prefers_frequent() {
        let mut draws = Vec::new();
        for i in 0..20 {
            draws.push(draw_on_day(3 * i, [1, 2, 3, 4, 5], [1, 2]));
        }
        draws.push(draw_on_day(60, [31, 32, 33, 34, 35], [11, 12]));
        let prediction = generate(Algorithm::HotNumbers, &draws, &params(), &cfg()).unwrap();
        assert_eq!(prediction.front, [1, 2, 3, 4, 5]);
        assert_eq!(prediction.back, [1, 2]);
    }

    #[test]
    fn test_cold_numbers_prefers_overdue() {
        // 7 drawn once at the start then absent for 20 draws; 1..5 drawn
        // constantly.
        let mut draws = vec![draw_on_day(0, [7, 10, 15, 20, 25], [3, 4])];
        for i in 1..=20 {
            draws.push(draw_on_day(3 * i, [1, 2, 3, 4, 5], [1, 2]));
        }
        let prediction = generate(Algorithm::ColdNumbers, &draws, &params(), &cfg()).unwrap();
        assert!(!prediction.front.contains(&1));
        assert!(prediction
            .reasoning
            .iter()
            .filter(|r| r.zone == Zone::Front)
            .all(|r| r.factors.iter().any(|f| matches!(f, Factor::Overdue { .. }))));
    }

    #[test]
    fn test_pattern_based_matches_modal_odd_count() {
        // Every historical draw has exactly 3 odd numbers.
        let draws: Vec<Draw> = (0..40)
            .map(|i| {
                let base = (i % 6) as u8;
                draw_on_day(
                    3 * i as i64,
                    [
                        base * 2 + 1,
                        base * 2 + 3,
                        base * 2 + 5,
                        base * 2 + 2,
                        base * 2 + 4,
                    ],
                    [(i % 12) as u8 + 1, ((i + 3) % 12) as u8 + 1],
                )
            })
            .collect();
        let prediction = generate(Algorithm::PatternBased, &draws, &params(), &cfg()).unwrap();
        let odd_count = prediction.front.iter().filter(|&&n| n % 2 == 1).count();
        assert_eq!(odd_count, 3);
    }

    #[test]
    fn test_markov_on_single_draw_flags_no_information() {
        let draws = vec![draw_on_day(0, [1, 2, 3, 4, 5], [1, 2])];
        let prediction = generate(Algorithm::MarkovChain, &draws, &params(), &cfg()).unwrap();
        assert!(prediction.notes.contains(&Factor::MarkovNoInformation));
    }

    #[test]
    fn test_truncation_is_noted_and_penalized() {
        let draws = make_test_draws(200);
        let full = generate(Algorithm::WeightedFrequency, &draws, &params(), &cfg()).unwrap();

        let mut capped_params = params();
        capped_params.max_draws = Some(150);
        let capped =
            generate(Algorithm::WeightedFrequency, &draws, &capped_params, &cfg()).unwrap();
        assert!(capped
            .notes
            .contains(&Factor::HistoryTruncated { scanned: 150, total: 200 }));
        assert!(capped.confidence < full.confidence);
    }

    #[test]
    fn test_zero_max_draws_is_invalid() {
        let draws = make_test_draws(10);
        let mut p = params();
        p.max_draws = Some(0);
        assert!(matches!(
            generate(Algorithm::HotNumbers, &draws, &p, &cfg()).unwrap_err(),
            EngineError::InvalidParameter { .. }
        ));
    }

    #[test]
    fn test_small_history_degrades_confidence() {
        let small = make_test_draws(5);
        let prediction = generate(Algorithm::WeightedFrequency, &small, &params(), &cfg()).unwrap();
        assert!(prediction.low_confidence);
        assert!(prediction.confidence < 0.5);
    }

    #[test]
    fn test_validate_prediction_counts_intersection() {
        let draws = make_test_draws(50);
        let mut prediction =
            generate(Algorithm::WeightedFrequency, &draws, &params(), &cfg()).unwrap();
        prediction.front = [1, 2, 3, 4, 5];
        prediction.back = [1, 2];

        let actual = draw_on_day(300, [3, 4, 5, 6, 7], [2, 9]);
        let outcome = validate_prediction(&prediction, &actual);
        assert_eq!(outcome.front_matches, 3);
        assert_eq!(outcome.back_matches, 1);
        assert!((outcome.accuracy - 4.0 / 7.0 * 100.0).abs() < 1e-9);

        let miss = draw_on_day(300, [30, 31, 32, 33, 34], [11, 12]);
        let outcome = validate_prediction(&prediction, &miss);
        assert_eq!(outcome.front_matches, 0);
        assert_eq!(outcome.back_matches, 0);
        assert_eq!(outcome.accuracy, 0.0);
    }

    #[test]
    fn test_constrained_selection_respects_parity_and_band() {
        let scores: Vec<f64> = (0..35).map(|i| 35.0 - i as f64).collect();
        let selected = constrained_selection(&scores, 2, (45, 74));
        assert_eq!(selected.len(), 5);
        assert_eq!(selected.iter().filter(|&&n| n % 2 == 1).count(), 2);
        let sum: u32 = selected.iter().map(|&n| n as u32).sum();
        assert!(sum >= 45 && sum <= 74, "sum {} outside band", sum);
    }
}
