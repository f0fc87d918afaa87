//! Risk engine (§4.5): the execution-service risk gate (kill switch + static
//! size/leverage/open-position bounds) plus a stateless cost gate (eight
//! ordered economic-viability checks). Both are pure functions of their
//! inputs — no IO, no clock, no broker/chain calls.

mod cost_gate;
mod engine;
mod types;

pub use cost_gate::{check as check_cost_gate, CostGateInput, GateRefusal};
pub use engine::evaluate;
pub use types::{ReasonCode, RiskAction, RiskConfig, RiskDecision, RiskInput};
