//! Scenario-test harness: wires the reference paper collaborators
//! (`mqk-chain-paper`) into one `ExecutionService` over a temp-directory
//! journal and control-state file — the same assembly `mqk-cli run start`
//! does in production, minus the background loop tasks, so scenario tests
//! can drive `execute()` directly and inspect the journal/control-state
//! side effects a restart would see.

mod harness;

pub use harness::{AlwaysClean, Harness, NeverClean, PaperExecutionService};
