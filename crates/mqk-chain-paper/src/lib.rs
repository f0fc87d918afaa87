//! Deterministic test-double collaborators for the six `mqk-schemas`
//! traits the execution service and position monitor depend on
//! (`ChainClient`, `TransactionBuilder`, `TxSigner`, `OraclePriceFeed`,
//! `OperatorAlerts`, `FeeOracle`).
//!
//! Shared design decisions, carried over from the broker-adapter test
//! doubles this crate used to hold: no randomness, no wall-clock reads,
//! deterministic ids derived from inputs, explicit setters for wiring test
//! scenarios rather than implicit state machines.

mod alerts;
mod builder;
mod chain;
mod fees;
mod oracle;
mod signer;

pub use alerts::PaperAlerts;
pub use builder::PaperBuilder;
pub use chain::PaperChain;
pub use fees::PaperFees;
pub use oracle::PaperOracle;
pub use signer::PaperSigner;
