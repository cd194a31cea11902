//! Weighted-vote combination of several prediction strategies into a
//! single consensus with per-number vote transparency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use superlotto_db::models::{validate_draw, Draw, Zone};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::predict::{self, Algorithm, Prediction, PredictionParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusStrength {
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl std::fmt::Display for ConsensusStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ConsensusStrength::Weak => "weak",
            ConsensusStrength::Moderate => "moderate",
            ConsensusStrength::Strong => "strong",
            ConsensusStrength::VeryStrong => "very-strong",
        })
    }
}

/// Vote record for one number in one zone. `agreement` is the normalized
/// weight of the members that picked the number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberVote {
    pub number: u8,
    pub vote: f64,
    pub vote_share: f64,
    pub supporters: Vec<Algorithm>,
    pub agreement: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberVote {
    pub algorithm: Algorithm,
    pub weight: f64,
    pub confidence: f64,
    pub front: [u8; 5],
    pub back: [u8; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroppedMember {
    pub algorithm: Algorithm,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consensus {
    pub front: [u8; 5],
    pub back: [u8; 2],
    pub confidence: f64,
    pub low_confidence: bool,
    /// Mean supporter weight across the selected numbers.
    pub agreement: f64,
    pub strength: ConsensusStrength,
    /// Every number that received a vote, descending by vote.
    pub front_votes: Vec<NumberVote>,
    pub back_votes: Vec<NumberVote>,
    pub members: Vec<MemberVote>,
    pub dropped: Vec<DroppedMember>,
    pub sample_size: usize,
    pub created_at: DateTime<Utc>,
}

/// Combines already-generated predictions. `weights` pairs with
/// `predictions` by index and is normalized internally; a member's vote for
/// a number is `weight x confidence`.
pub fn combine(
    predictions: &[Prediction],
    weights: &[f64],
    cfg: &EngineConfig,
) -> Result<Consensus> {
    if predictions.is_empty() {
        return Err(EngineError::invalid("predictions", "at least one member required"));
    }
    if predictions.len() != weights.len() {
        return Err(EngineError::invalid(
            "weights",
            format!(
                "expected {} weights, got {}",
                predictions.len(),
                weights.len()
            ),
        ));
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(EngineError::invalid(
            "weights",
            "must be finite and non-negative",
        ));
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(EngineError::invalid("weights", "must sum to a positive value"));
    }
    let normalized: Vec<f64> = weights.iter().map(|w| w / total).collect();

    let (front_votes, front) = tally(predictions, &normalized, Zone::Front)?;
    let (back_votes, back) = tally(predictions, &normalized, Zone::Back)?;
    let front: [u8; 5] = front
        .try_into()
        .map_err(|_| EngineError::InvariantViolation("front-zone tally incomplete".into()))?;
    let back: [u8; 2] = back
        .try_into()
        .map_err(|_| EngineError::InvariantViolation("back-zone tally incomplete".into()))?;
    validate_draw(&front, &back)
        .map_err(|e| EngineError::InvariantViolation(e.to_string()))?;

    let agreement = {
        let selected = front
            .iter()
            .map(|n| (&front_votes, *n))
            .chain(back.iter().map(|n| (&back_votes, *n)));
        let mut sum = 0.0;
        for (votes, number) in selected {
            let vote = votes
                .iter()
                .find(|v| v.number == number)
                .map_or(0.0, |v| v.agreement);
            sum += vote;
        }
        sum / 7.0
    };

    let weighted_confidence: f64 = predictions
        .iter()
        .zip(&normalized)
        .map(|(p, w)| p.confidence * w)
        .sum();
    let sample_size = predictions
        .iter()
        .map(|p| p.sample_size)
        .min()
        .unwrap_or(0);
    let (confidence, low_confidence) =
        cfg.clamp_confidence(weighted_confidence * agreement, sample_size);

    let strength = if agreement >= cfg.agreement_very_strong {
        ConsensusStrength::VeryStrong
    } else if agreement >= cfg.agreement_strong {
        ConsensusStrength::Strong
    } else if agreement >= cfg.agreement_moderate {
        ConsensusStrength::Moderate
    } else {
        ConsensusStrength::Weak
    };

    info!(
        members = predictions.len(),
        confidence, agreement, strength = %strength, "consensus combined"
    );

    Ok(Consensus {
        front,
        back,
        confidence,
        low_confidence,
        agreement,
        strength,
        front_votes,
        back_votes,
        members: predictions
            .iter()
            .zip(&normalized)
            .map(|(p, &weight)| MemberVote {
                algorithm: p.algorithm,
                weight,
                confidence: p.confidence,
                front: p.front,
                back: p.back,
            })
            .collect(),
        dropped: Vec::new(),
        sample_size,
        created_at: Utc::now(),
    })
}

/// Runs each strategy over the same history and combines the survivors.
/// Members that fail recoverably are dropped and reported; the remaining
/// weights are renormalized. Errors only when no member survives or a
/// member fails non-recoverably.
pub fn generate(
    algorithms: &[Algorithm],
    weights: &[f64],
    draws: &[Draw],
    params: &PredictionParams,
    cfg: &EngineConfig,
) -> Result<Consensus> {
    if algorithms.is_empty() {
        return Err(EngineError::invalid("algorithms", "at least one member required"));
    }
    if algorithms.len() != weights.len() {
        return Err(EngineError::invalid(
            "weights",
            format!("expected {} weights, got {}", algorithms.len(), weights.len()),
        ));
    }

    let results: Vec<Result<Prediction>> = std::thread::scope(|scope| {
        let handles: Vec<_> = algorithms
            .iter()
            .map(|&algorithm| {
                scope.spawn(move || predict::generate(algorithm, draws, params, cfg))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("prediction worker panicked"))
            .collect()
    });

    let mut kept: Vec<Prediction> = Vec::with_capacity(algorithms.len());
    let mut kept_weights: Vec<f64> = Vec::with_capacity(algorithms.len());
    let mut dropped: Vec<DroppedMember> = Vec::new();
    let mut last_error: Option<EngineError> = None;
    for ((&algorithm, &weight), result) in algorithms.iter().zip(weights).zip(results) {
        match result {
            Ok(prediction) => {
                kept.push(prediction);
                kept_weights.push(weight);
            }
            Err(e) if e.is_recoverable() => {
                warn!(algorithm = algorithm.name(), error = %e, "ensemble member dropped");
                dropped.push(DroppedMember {
                    algorithm,
                    reason: e.to_string(),
                });
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    if kept.is_empty() {
        return Err(last_error.unwrap_or(EngineError::InsufficientData {
            required: 1,
            available: 0,
        }));
    }

    let mut consensus = combine(&kept, &kept_weights, cfg)?;
    consensus.dropped = dropped;
    Ok(consensus)
}

fn tally(
    predictions: &[Prediction],
    normalized: &[f64],
    zone: Zone,
) -> Result<(Vec<NumberVote>, Vec<u8>)> {
    let size = zone.size();
    let mut vote = vec![0.0f64; size];
    let mut weight_sum = vec![0.0f64; size];
    let mut supporters: Vec<Vec<Algorithm>> = vec![Vec::new(); size];

    let mut total_weighted_confidence = 0.0;
    for (prediction, &weight) in predictions.iter().zip(normalized) {
        total_weighted_confidence += weight * prediction.confidence;
        let picked: &[u8] = match zone {
            Zone::Front => &prediction.front,
            Zone::Back => &prediction.back,
        };
        for &number in picked {
            let idx = (number - 1) as usize;
            vote[idx] += weight * prediction.confidence;
            weight_sum[idx] += weight;
            supporters[idx].push(prediction.algorithm);
        }
    }

    let mut order: Vec<usize> = (0..size).collect();
    order.sort_by(|&a, &b| {
        vote[b]
            .partial_cmp(&vote[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.cmp(&b))
    });
    let mut selected: Vec<u8> = order[..zone.pick_count()]
        .iter()
        .map(|&i| (i + 1) as u8)
        .collect();
    selected.sort_unstable();

    let mut votes: Vec<NumberVote> = order
        .into_iter()
        .filter(|&i| vote[i] > 0.0)
        .map(|i| NumberVote {
            number: (i + 1) as u8,
            vote: vote[i],
            vote_share: if total_weighted_confidence > 0.0 {
                vote[i] / total_weighted_confidence
            } else {
                0.0
            },
            supporters: std::mem::take(&mut supporters[i]),
            agreement: weight_sum[i],
        })
        .collect();
    votes.sort_by(|a, b| {
        b.vote
            .partial_cmp(&a.vote)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.number.cmp(&b.number))
    });

    Ok((votes, selected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::Factor;
    use crate::testutil::make_test_draws;

    fn cfg() -> EngineConfig {
        EngineConfig::default()
    }

    fn member(algorithm: Algorithm, front: [u8; 5], back: [u8; 2], confidence: f64) -> Prediction {
        Prediction {
            algorithm,
            front,
            back,
            confidence,
            low_confidence: false,
            reasoning: Vec::new(),
            notes: Vec::<Factor>::new(),
            window_days: 365,
            sample_size: 120,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_shared_number_outvotes_single_supporter() {
        // Number 5 backed by both members at 0.5x0.8 + 0.5x0.6 = 0.70;
        // number 30 backed only by the stronger member at 0.5x0.8 = 0.40.
        let a = member(Algorithm::WeightedFrequency, [5, 10, 15, 20, 30], [1, 2], 0.8);
        let b = member(Algorithm::MarkovChain, [5, 11, 16, 21, 31], [1, 3], 0.6);
        let consensus = combine(&[a, b], &[0.5, 0.5], &cfg()).unwrap();

        let vote_of = |n: u8| {
            consensus
                .front_votes
                .iter()
                .find(|v| v.number == n)
                .unwrap()
                .vote
        };
        assert!((vote_of(5) - 0.70).abs() < 1e-12);
        assert!((vote_of(30) - 0.40).abs() < 1e-12);
        assert!(consensus.front.contains(&5));
        assert_eq!(consensus.front_votes[0].number, 5);
        assert_eq!(consensus.front_votes[0].supporters.len(), 2);
    }

    #[test]
    fn test_unanimous_members_are_very_strong() {
        let front = [3, 9, 17, 25, 33];
        let back = [4, 8];
        let members = vec![
            member(Algorithm::WeightedFrequency, front, back, 0.7),
            member(Algorithm::HotNumbers, front, back, 0.6),
            member(Algorithm::MarkovChain, front, back, 0.65),
        ];
        let consensus = combine(&members, &[1.0, 1.0, 1.0], &cfg()).unwrap();
        assert_eq!(consensus.front, front);
        assert_eq!(consensus.back, back);
        assert!((consensus.agreement - 1.0).abs() < 1e-12);
        assert_eq!(consensus.strength, ConsensusStrength::VeryStrong);
    }

    #[test]
    fn test_disjoint_members_are_weak() {
        let a = member(Algorithm::HotNumbers, [1, 2, 3, 4, 5], [1, 2], 0.6);
        let b = member(Algorithm::ColdNumbers, [10, 11, 12, 13, 14], [3, 4], 0.6);
        let c = member(Algorithm::MarkovChain, [20, 21, 22, 23, 24], [5, 6], 0.6);
        let consensus = combine(&[a, b, c], &[1.0, 1.0, 1.0], &cfg()).unwrap();
        assert!(consensus.agreement < cfg().agreement_moderate);
        assert_eq!(consensus.strength, ConsensusStrength::Weak);
    }

    #[test]
    fn test_weight_normalization_is_scale_invariant() {
        let a = member(Algorithm::WeightedFrequency, [5, 10, 15, 20, 30], [1, 2], 0.8);
        let b = member(Algorithm::MarkovChain, [5, 11, 16, 21, 31], [1, 3], 0.6);
        let small = combine(&[a.clone(), b.clone()], &[0.2, 0.3], &cfg()).unwrap();
        let large = combine(&[a, b], &[20.0, 30.0], &cfg()).unwrap();
        assert_eq!(small.front, large.front);
        assert_eq!(small.back, large.back);
        assert!((small.confidence - large.confidence).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_weights() {
        let a = member(Algorithm::HotNumbers, [1, 2, 3, 4, 5], [1, 2], 0.6);
        assert!(combine(&[a.clone()], &[], &cfg()).is_err());
        assert!(combine(&[a.clone()], &[0.0], &cfg()).is_err());
        assert!(combine(&[a.clone()], &[-1.0], &cfg()).is_err());
        assert!(combine(&[a], &[f64::NAN], &cfg()).is_err());
        assert!(combine(&[], &[], &cfg()).is_err());
    }

    #[test]
    fn test_generate_runs_all_members() {
        let draws = make_test_draws(100);
        let weights = vec![1.0; Algorithm::ALL.len()];
        let params = PredictionParams::from_config(&cfg());
        let consensus =
            generate(&Algorithm::ALL, &weights, &draws, &params, &cfg()).unwrap();
        assert_eq!(consensus.members.len(), Algorithm::ALL.len());
        assert!(consensus.dropped.is_empty());
        validate_draw(&consensus.front, &consensus.back).unwrap();
    }

    #[test]
    fn test_combine_selects_full_sorted_draw() {
        let a = member(Algorithm::WeightedFrequency, [5, 10, 15, 20, 30], [1, 2], 0.8);
        let b = member(Algorithm::MarkovChain, [5, 11, 16, 21, 31], [1, 3], 0.6);
        let consensus = combine(&[a, b], &[0.5, 0.5], &cfg()).unwrap();
        validate_draw(&consensus.front, &consensus.back).unwrap();
        assert!(consensus.front.windows(2).all(|w| w[0] < w[1]));
        assert!(consensus.back[0] < consensus.back[1]);
    }

    #[test]
    fn test_generate_drops_failing_member_and_renormalizes() {
        // An out-of-range Markov order fails only the MarkovChain member;
        // the survivors split its weight.
        let draws = make_test_draws(100);
        let weights = vec![1.0; Algorithm::ALL.len()];
        let mut params = PredictionParams::from_config(&cfg());
        params.markov_order = 9;
        let consensus =
            generate(&Algorithm::ALL, &weights, &draws, &params, &cfg()).unwrap();
        assert_eq!(consensus.dropped.len(), 1);
        assert_eq!(consensus.dropped[0].algorithm, Algorithm::MarkovChain);
        assert_eq!(consensus.members.len(), Algorithm::ALL.len() - 1);
        let total: f64 = consensus.members.iter().map(|m| m.weight).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(consensus
            .members
            .iter()
            .all(|m| (m.weight - 0.2).abs() < 1e-12));
    }

    #[test]
    fn test_generate_deterministic_despite_threads() {
        let draws = make_test_draws(80);
        let weights = vec![1.0; Algorithm::ALL.len()];
        let params = PredictionParams::from_config(&cfg());
        let a = generate(&Algorithm::ALL, &weights, &draws, &params, &cfg()).unwrap();
        let b = generate(&Algorithm::ALL, &weights, &draws, &params, &cfg()).unwrap();
        assert_eq!(a.front, b.front);
        assert_eq!(a.back, b.back);
        assert_eq!(a.confidence, b.confidence);
    }

    #[test]
    fn test_generate_empty_history_fails() {
        let weights = vec![1.0; Algorithm::ALL.len()];
        let params = PredictionParams::from_config(&cfg());
        let err = generate(&Algorithm::ALL, &weights, &[], &params, &cfg()).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientData { .. }));
    }
}
