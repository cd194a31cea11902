use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable constants of the engine. The scoring formulas treat these as
/// configuration, not fixed truths; defaults match the documented design.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Below this many draws a pattern or prediction is flagged low
    /// confidence.
    pub min_sample_size: usize,
    /// Sample size at which the sample-adequacy factor saturates at 1.0.
    pub full_confidence_sample: usize,
    /// Hard cap applied to any confidence computed from fewer than
    /// `min_sample_size` draws.
    pub low_confidence_cap: f64,
    /// Upper bound on any reported confidence.
    pub max_confidence: f64,
    /// Default half-life (days) for the hyperbolic recency weight of the
    /// frequency analyzer.
    pub default_half_life_days: f64,
    /// Default per-draw exponential decay for Markov transition weighting.
    pub default_markov_decay: f64,
    /// Multiplier applied to confidence when history scanning was cut off
    /// by a caller-supplied draw cap.
    pub truncation_penalty: f64,
    /// Front-zone sum band edges; bands are [15, e1), [e1, e2), ... [e4, 165].
    pub sum_band_edges: [u32; 4],
    /// Ensemble agreement thresholds for Moderate / Strong / VeryStrong.
    pub agreement_moderate: f64,
    pub agreement_strong: f64,
    pub agreement_very_strong: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_sample_size: 30,
            full_confidence_sample: 100,
            low_confidence_cap: 0.5,
            max_confidence: 0.95,
            default_half_life_days: 30.0,
            default_markov_decay: 0.97,
            truncation_penalty: 0.85,
            sum_band_edges: [45, 75, 105, 135],
            agreement_moderate: 0.4,
            agreement_strong: 0.6,
            agreement_very_strong: 0.8,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {:?}", path))?;
        let config: EngineConfig =
            toml::from_str(&text).with_context(|| format!("invalid config {:?}", path))?;
        Ok(config)
    }

    /// Sample-adequacy factor in [0, 1].
    pub fn sample_factor(&self, sample_size: usize) -> f64 {
        (sample_size as f64 / self.full_confidence_sample as f64).min(1.0)
    }

    /// Applies the small-sample cap and the global ceiling to a raw
    /// confidence. Returns (confidence, low_confidence_flag).
    pub fn clamp_confidence(&self, raw: f64, sample_size: usize) -> (f64, bool) {
        let low = sample_size < self.min_sample_size;
        let mut confidence = raw.clamp(0.0, self.max_confidence);
        if low {
            confidence = confidence.min(self.low_confidence_cap * 0.999);
        }
        (confidence, low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_consistent() {
        let cfg = EngineConfig::default();
        assert!(cfg.agreement_moderate < cfg.agreement_strong);
        assert!(cfg.agreement_strong < cfg.agreement_very_strong);
        assert!(cfg.low_confidence_cap <= cfg.max_confidence);
        assert!(cfg.sum_band_edges.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_sample_factor_saturates() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.sample_factor(0), 0.0);
        assert!((cfg.sample_factor(50) - 0.5).abs() < 1e-12);
        assert_eq!(cfg.sample_factor(100), 1.0);
        assert_eq!(cfg.sample_factor(10_000), 1.0);
    }

    #[test]
    fn test_small_samples_are_capped_below_half() {
        let cfg = EngineConfig::default();
        let (confidence, low) = cfg.clamp_confidence(0.9, 10);
        assert!(low);
        assert!(confidence < 0.5);

        let (confidence, low) = cfg.clamp_confidence(0.9, 200);
        assert!(!low);
        assert!((confidence - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_toml_roundtrip() {
        let cfg = EngineConfig::default();
        let text = toml::to_string(&cfg).unwrap();
        let parsed: EngineConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.min_sample_size, cfg.min_sample_size);
        assert_eq!(parsed.sum_band_edges, cfg.sum_band_edges);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: EngineConfig = toml::from_str("min_sample_size = 50").unwrap();
        assert_eq!(parsed.min_sample_size, 50);
        assert_eq!(parsed.full_confidence_sample, 100);
    }
}
