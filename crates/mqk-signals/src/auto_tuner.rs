//! Auto-tuner (§4.9 second half): post-trade learning that retunes
//! per-source weights, a half-Kelly size multiplier, and a confidence
//! calibration factor from accumulated trade outcomes.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

const EMA_ALPHA: f64 = 0.30;
const MIN_WEIGHT: f64 = 0.10;
const KELLY_MIN: f64 = 0.25;
const KELLY_MAX: f64 = 1.50;
const CALIBRATION_MIN: f64 = 0.50;
const CALIBRATION_MAX: f64 = 1.50;

#[derive(Clone, Debug, PartialEq)]
pub struct TradeOutcome {
    pub source: String,
    pub asset: mqk_schemas::Market,
    pub direction: mqk_schemas::Side,
    pub confidence_at_entry: f64,
    pub pnl_pct: f64,
    pub hold_hours: f64,
    pub fees_usd: f64,
    pub exit_trigger: String,
    pub regime: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AutoTunerConfig {
    pub outcomes_before_retune: usize,
    pub retune_interval: Duration,
}

impl AutoTunerConfig {
    pub fn sane_defaults() -> Self {
        Self { outcomes_before_retune: 10, retune_interval: Duration::hours(24) }
    }
}

/// Per-source parameters the tuner maintains and the merge/sizing stages
/// consume. Unseen sources get full weight, neutral Kelly, and no
/// calibration adjustment until at least one retune has run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceParams {
    pub weight: f64,
    pub size_multiplier: f64,
    pub confidence_calibration: f64,
}

impl SourceParams {
    fn default_for_unseen() -> Self {
        Self { weight: 1.0, size_multiplier: 1.0, confidence_calibration: 1.0 }
    }
}

pub struct AutoTuner {
    config: AutoTunerConfig,
    pending: Vec<TradeOutcome>,
    last_retune_at: DateTime<Utc>,
    params: BTreeMap<String, SourceParams>,
}

impl AutoTuner {
    pub fn new(config: AutoTunerConfig, now: DateTime<Utc>) -> Self {
        Self { config, pending: Vec::new(), last_retune_at: now, params: BTreeMap::new() }
    }

    pub fn params_for(&self, source: &str) -> SourceParams {
        self.params.get(source).cloned().unwrap_or_else(SourceParams::default_for_unseen)
    }

    /// Records one closed trade's outcome and retunes if either the outcome
    /// count or the time threshold has been reached.
    pub fn record_outcome(&mut self, outcome: TradeOutcome, now: DateTime<Utc>) {
        self.pending.push(outcome);
        if self.pending.len() >= self.config.outcomes_before_retune || now - self.last_retune_at >= self.config.retune_interval {
            self.retune(now);
        }
    }

    fn retune(&mut self, now: DateTime<Utc>) {
        if self.pending.is_empty() {
            self.last_retune_at = now;
            return;
        }

        let mut by_source: BTreeMap<String, Vec<&TradeOutcome>> = BTreeMap::new();
        for outcome in &self.pending {
            by_source.entry(outcome.source.clone()).or_default().push(outcome);
        }

        for (source, outcomes) in &by_source {
            let n = outcomes.len() as f64;
            let wins: Vec<&&TradeOutcome> = outcomes.iter().filter(|o| o.pnl_pct > 0.0).collect();
            let losses: Vec<&&TradeOutcome> = outcomes.iter().filter(|o| o.pnl_pct <= 0.0).collect();
            let win_rate = wins.len() as f64 / n;
            let avg_win = if wins.is_empty() { 0.0 } else { wins.iter().map(|o| o.pnl_pct).sum::<f64>() / wins.len() as f64 };
            let avg_loss = if losses.is_empty() { 0.0 } else { losses.iter().map(|o| o.pnl_pct.abs()).sum::<f64>() / losses.len() as f64 };
            let avg_claimed_confidence = outcomes.iter().map(|o| o.confidence_at_entry).sum::<f64>() / n;

            let prior = self.params.get(source).cloned().unwrap_or_else(SourceParams::default_for_unseen);
            let new_weight = (prior.weight * (1.0 - EMA_ALPHA) + win_rate * EMA_ALPHA).max(MIN_WEIGHT);

            let size_multiplier = if avg_win > 0.0 {
                ((win_rate * avg_win - (1.0 - win_rate) * avg_loss) / avg_win / 2.0).clamp(KELLY_MIN, KELLY_MAX)
            } else {
                KELLY_MIN
            };

            let confidence_calibration = if avg_claimed_confidence > 0.0 { (win_rate / avg_claimed_confidence).clamp(CALIBRATION_MIN, CALIBRATION_MAX) } else { CALIBRATION_MIN };

            self.params.insert(source.clone(), SourceParams { weight: new_weight, size_multiplier, confidence_calibration });
        }

        renormalize_weights(&mut self.params);

        self.pending.clear();
        self.last_retune_at = now;
    }
}

/// Renormalizes every tracked source's weight to sum to 1 while keeping
/// every source at or above `min_weight` (the floor from `retune` survives
/// a naive proportional renormalization only when one source dominates).
///
/// Water-fills: sources whose proportional share would fall under the
/// floor are pinned at exactly `min_weight`; the remaining budget is
/// renormalized across the rest, repeating until no new source needs
/// pinning. Requires `n * min_weight <= 1`; with more sources than that
/// allows, the floor cannot hold simultaneously for all and this falls
/// back to a plain proportional split.
fn renormalize_weights(params: &mut BTreeMap<String, SourceParams>) {
    let n = params.len();
    if n == 0 {
        return;
    }
    if n as f64 * MIN_WEIGHT > 1.0 {
        let total: f64 = params.values().map(|p| p.weight).sum();
        if total > 0.0 {
            for p in params.values_mut() {
                p.weight /= total;
            }
        }
        return;
    }

    let mut pinned: BTreeMap<String, f64> = BTreeMap::new();
    loop {
        let remaining_raw_total: f64 = params.iter().filter(|(k, _)| !pinned.contains_key(*k)).map(|(_, p)| p.weight).sum();
        let remaining_budget = 1.0 - pinned.len() as f64 * MIN_WEIGHT;

        if remaining_raw_total <= 0.0 {
            break;
        }

        let newly_pinned: Vec<String> = params
            .iter()
            .filter(|(k, _)| !pinned.contains_key(*k))
            .filter(|(_, p)| p.weight / remaining_raw_total * remaining_budget < MIN_WEIGHT)
            .map(|(k, _)| k.clone())
            .collect();

        if newly_pinned.is_empty() {
            for (k, p) in params.iter_mut() {
                if !pinned.contains_key(k) {
                    p.weight = p.weight / remaining_raw_total * remaining_budget;
                }
            }
            break;
        }
        for k in newly_pinned {
            pinned.insert(k, MIN_WEIGHT);
        }
    }

    for (source, weight) in pinned {
        if let Some(p) = params.get_mut(&source) {
            p.weight = weight;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mqk_schemas::{Market, Side};

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, h, 0, 0).unwrap()
    }

    fn outcome(source: &str, pnl_pct: f64, confidence: f64) -> TradeOutcome {
        TradeOutcome {
            source: source.to_string(),
            asset: Market::SolUsd,
            direction: Side::Long,
            confidence_at_entry: confidence,
            pnl_pct,
            hold_hours: 4.0,
            fees_usd: 1.0,
            exit_trigger: "take_profit".to_string(),
            regime: "trend".to_string(),
        }
    }

    #[test]
    fn unseen_source_gets_neutral_defaults() {
        let tuner = AutoTuner::new(AutoTunerConfig::sane_defaults(), at(0));
        let params = tuner.params_for("never-seen");
        assert_eq!(params.weight, 1.0);
        assert_eq!(params.size_multiplier, 1.0);
        assert_eq!(params.confidence_calibration, 1.0);
    }

    #[test]
    fn retunes_after_reaching_the_outcome_threshold() {
        let mut config = AutoTunerConfig::sane_defaults();
        config.outcomes_before_retune = 4;
        let mut tuner = AutoTuner::new(config, at(0));

        for _ in 0..3 {
            tuner.record_outcome(outcome("alpha", 5.0, 0.7), at(1));
        }
        tuner.record_outcome(outcome("alpha", -2.0, 0.7), at(1));

        let params = tuner.params_for("alpha");
        assert!(params.weight >= MIN_WEIGHT);
        assert!((KELLY_MIN..=KELLY_MAX).contains(&params.size_multiplier));
    }

    #[test]
    fn weights_renormalize_to_one_across_multiple_sources() {
        let mut config = AutoTunerConfig::sane_defaults();
        config.outcomes_before_retune = 2;
        let mut tuner = AutoTuner::new(config, at(0));

        tuner.record_outcome(outcome("good", 10.0, 0.8), at(1));
        tuner.record_outcome(outcome("bad", -10.0, 0.8), at(1));

        let total = tuner.params_for("good").weight + tuner.params_for("bad").weight;
        assert!((total - 1.0).abs() < 0.01);
        assert!(tuner.params_for("good").weight > tuner.params_for("bad").weight);
    }

    #[test]
    fn retunes_after_the_time_interval_even_below_the_outcome_threshold() {
        let mut tuner = AutoTuner::new(AutoTunerConfig::sane_defaults(), at(0));
        tuner.record_outcome(outcome("alpha", 5.0, 0.7), at(0));
        // single outcome, far below the default 10-outcome threshold, but
        // 25 hours later exceeds the 24h retune interval.
        tuner.record_outcome(outcome("alpha", 5.0, 0.7), Utc.with_ymd_and_hms(2026, 1, 2, 1, 0, 0).unwrap());
        assert_ne!(tuner.params_for("alpha").weight, 1.0);
    }

    #[test]
    fn weight_never_drops_below_the_floor() {
        let mut config = AutoTunerConfig::sane_defaults();
        config.outcomes_before_retune = 6;
        let mut tuner = AutoTuner::new(config, at(0));

        // Repeated retune cycles, each with a 0% win rate for "loser", drag
        // its EMA weight steadily downward; the floor must still hold.
        for _ in 0..30 {
            for _ in 0..3 {
                tuner.record_outcome(outcome("winner", 10.0, 0.9), at(1));
            }
            for _ in 0..3 {
                tuner.record_outcome(outcome("loser", -10.0, 0.9), at(1));
            }
        }

        assert!(tuner.params_for("loser").weight >= MIN_WEIGHT - 1e-9);
        assert!(tuner.params_for("winner").weight > tuner.params_for("loser").weight);
    }
}
