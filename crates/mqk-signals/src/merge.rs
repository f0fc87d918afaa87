//! Signal merge (§4.9 first half): pure and stateless. Groups incoming
//! `AiSignal` values by asset and side, scores each by
//! `confidence · source_weight · provider_reliability`, and keeps only the
//! assets whose winning side clears both an absolute and a relative bar.

use std::collections::BTreeMap;

use mqk_schemas::{AiSignal, Market, Side};

const MAX_MERGED_CONFIDENCE: f64 = 0.98;
const MULTI_SOURCE_BONUS_PER_EXTRA: f64 = 0.02;
const MARGIN_BONUS_SCALE: f64 = 0.10;

/// Per-source/provider weighting the merge scores against. Missing entries
/// default to full weight (`1.0`) — an unseen source starts with no prior
/// penalty until the auto-tuner has evidence against it.
#[derive(Clone, Debug, Default)]
pub struct MergeWeights {
    pub source_weight: BTreeMap<String, f64>,
    pub provider_reliability: BTreeMap<String, f64>,
}

impl MergeWeights {
    fn source_weight(&self, source: &str) -> f64 {
        *self.source_weight.get(source).unwrap_or(&1.0)
    }

    fn provider_reliability(&self, provider: &str) -> f64 {
        *self.provider_reliability.get(provider).unwrap_or(&1.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MergeConfig {
    pub min_direction_score: f64,
    pub arbitration_margin: f64,
}

impl MergeConfig {
    pub fn sane_defaults() -> Self {
        Self { min_direction_score: 0.30, arbitration_margin: 0.15 }
    }
}

/// A single asset's arbitrated signal, ready to feed the cost gate.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedSignal {
    pub asset: Market,
    pub direction: Side,
    pub confidence: f64,
    pub expected_move_pct: Option<f64>,
    pub max_leverage: Option<u32>,
    pub contributing_sources: Vec<String>,
}

struct SideAccumulator {
    /// Sum of `confidence * weight` across contributing signals — both the
    /// side's raw score and the numerator of its weighted-average confidence.
    score: f64,
    weight_sum: f64,
    expected_move_pct: Vec<f64>,
    max_leverage: Option<u32>,
    sources: Vec<String>,
}

impl SideAccumulator {
    fn new() -> Self {
        Self { score: 0.0, weight_sum: 0.0, expected_move_pct: Vec::new(), max_leverage: None, sources: Vec::new() }
    }

    fn add(&mut self, signal: &AiSignal, weight: f64) {
        self.score += signal.confidence * weight;
        self.weight_sum += weight;
        if let Some(m) = signal.expected_move_pct {
            self.expected_move_pct.push(m);
        }
        self.max_leverage = match (self.max_leverage, signal.max_leverage) {
            (None, v) => v,
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
        };
        self.sources.push(signal.source.clone());
    }
}

/// Merges a batch of signals into at most one arbitrated direction per
/// asset. Assets whose winning side fails either the absolute or the
/// relative bar are dropped entirely rather than returned as `Neutral`.
pub fn merge(signals: &[AiSignal], weights: &MergeWeights, config: &MergeConfig) -> BTreeMap<Market, MergedSignal> {
    #[derive(Default)]
    struct Sides {
        long: Option<SideAccumulator>,
        short: Option<SideAccumulator>,
    }

    let mut by_asset: BTreeMap<Market, Sides> = BTreeMap::new();

    for signal in signals {
        let Some(side) = signal.direction.as_side() else { continue };
        let weight = weights.source_weight(&signal.source) * weights.provider_reliability(&signal.provider);
        let sides = by_asset.entry(signal.asset).or_default();
        let slot = match side {
            Side::Long => &mut sides.long,
            Side::Short => &mut sides.short,
        };
        slot.get_or_insert_with(SideAccumulator::new).add(signal, weight);
    }

    let mut out = BTreeMap::new();
    for (asset, sides) in by_asset {
        let long = sides.long;
        let short = sides.short;

        let (winner_side, winner, loser_score) = match (long, short) {
            (Some(l), Some(s)) if l.score >= s.score => (Side::Long, l, s.score),
            (Some(l), Some(s)) => (Side::Short, s, l.score),
            (Some(l), None) => (Side::Long, l, 0.0),
            (None, Some(s)) => (Side::Short, s, 0.0),
            (None, None) => continue,
        };

        if winner.score < config.min_direction_score {
            continue;
        }
        let margin = (winner.score - loser_score) / winner.score;
        if margin < config.arbitration_margin {
            continue;
        }

        let base_confidence = winner.score / winner.weight_sum;
        let multi_source_bonus = MULTI_SOURCE_BONUS_PER_EXTRA * (winner.sources.len().saturating_sub(1)) as f64;
        let margin_bonus = margin * MARGIN_BONUS_SCALE;
        let confidence = (base_confidence + multi_source_bonus + margin_bonus).min(MAX_MERGED_CONFIDENCE);

        let expected_move_pct = if winner.expected_move_pct.is_empty() {
            None
        } else {
            Some(winner.expected_move_pct.iter().sum::<f64>() / winner.expected_move_pct.len() as f64)
        };

        out.insert(
            asset,
            MergedSignal {
                asset,
                direction: winner_side,
                confidence,
                expected_move_pct,
                max_leverage: winner.max_leverage,
                contributing_sources: winner.sources,
            },
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(asset: Market, direction: mqk_schemas::SignalDirection, confidence: f64, source: &str, provider: &str) -> AiSignal {
        AiSignal {
            asset,
            direction,
            confidence,
            regime: "trend".to_string(),
            source: source.to_string(),
            provider: provider.to_string(),
            model: "m1".to_string(),
            expected_move_pct: Some(2.0),
            max_leverage: Some(10),
            rationale: None,
        }
    }

    #[test]
    fn ambiguous_conflict_with_high_margin_requirement_is_dropped() {
        let signals = vec![
            signal(Market::BtcUsd, mqk_schemas::SignalDirection::Long, 0.80, "source-a", "prov-a"),
            signal(Market::BtcUsd, mqk_schemas::SignalDirection::Short, 0.75, "source-b", "prov-b"),
        ];
        let config = MergeConfig { min_direction_score: 0.0, arbitration_margin: 0.40 };
        let merged = merge(&signals, &MergeWeights::default(), &config);
        assert!(merged.is_empty());
    }

    #[test]
    fn agreeing_sources_clear_the_margin_and_boost_confidence() {
        let signals = vec![
            signal(Market::SolUsd, mqk_schemas::SignalDirection::Long, 0.70, "source-a", "prov-a"),
            signal(Market::SolUsd, mqk_schemas::SignalDirection::Long, 0.65, "source-b", "prov-b"),
        ];
        let config = MergeConfig::sane_defaults();
        let merged = merge(&signals, &MergeWeights::default(), &config);
        let m = merged.get(&Market::SolUsd).expect("two agreeing longs must survive");
        assert_eq!(m.direction, Side::Long);
        assert!(m.confidence > 0.675, "multi-source bonus should lift confidence above the plain average");
        assert_eq!(m.contributing_sources.len(), 2);
    }

    #[test]
    fn neutral_signals_never_contribute_to_either_side() {
        let signals = vec![signal(Market::EthUsd, mqk_schemas::SignalDirection::Neutral, 0.90, "source-a", "prov-a")];
        let merged = merge(&signals, &MergeWeights::default(), &MergeConfig::sane_defaults());
        assert!(merged.is_empty());
    }

    #[test]
    fn winner_below_minimum_direction_score_is_dropped_even_with_no_opposition() {
        let signals = vec![signal(Market::JlpUsd, mqk_schemas::SignalDirection::Long, 0.10, "source-a", "prov-a")];
        let config = MergeConfig { min_direction_score: 0.30, arbitration_margin: 0.0 };
        let merged = merge(&signals, &MergeWeights::default(), &config);
        assert!(merged.is_empty());
    }

    #[test]
    fn source_weight_can_flip_the_winning_side() {
        let signals = vec![
            signal(Market::BtcUsd, mqk_schemas::SignalDirection::Long, 0.80, "unreliable", "prov-a"),
            signal(Market::BtcUsd, mqk_schemas::SignalDirection::Short, 0.50, "reliable", "prov-b"),
        ];
        let mut weights = MergeWeights::default();
        weights.source_weight.insert("unreliable".to_string(), 0.10);
        let config = MergeConfig { min_direction_score: 0.0, arbitration_margin: 0.0 };
        let merged = merge(&signals, &weights, &config);
        assert_eq!(merged.get(&Market::BtcUsd).unwrap().direction, Side::Short);
    }
}
