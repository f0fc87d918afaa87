//! Signal merge and auto-tuner (§4.9): arbitrates multi-source `AiSignal`s
//! into at most one direction per asset, learns per-source weights from
//! closed-trade outcomes, and bridges a winning signal through the cost
//! gate into an `OpenPosition` intent.

mod auto_tuner;
mod cost_gate_bridge;
mod merge;

pub use auto_tuner::{AutoTuner, AutoTunerConfig, SourceParams, TradeOutcome};
pub use cost_gate_bridge::{build_open_position_intent, hold_hours_for_leverage, CostGateFixedParams, SignalToIntentError};
pub use merge::{merge, MergeConfig, MergeWeights, MergedSignal};
