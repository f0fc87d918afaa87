//! Shared wire types and collaborator contracts.
//!
//! Everything in this crate is either a plain data type passed between the
//! other crates in the workspace, or a trait describing a collaborator this
//! workspace treats as an opaque black box (signal producer, fee oracle,
//! transaction builder, chain client, price feed, operator alerting). Real
//! implementations of those traits (an actual Solana RPC client, an actual
//! transaction builder, an actual signer) are out of scope for this crate;
//! `mqk-chain-paper` provides deterministic test doubles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Perpetuals market this core is willing to trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Market {
    #[serde(rename = "SOL-USD")]
    SolUsd,
    #[serde(rename = "BTC-USD")]
    BtcUsd,
    #[serde(rename = "ETH-USD")]
    EthUsd,
    #[serde(rename = "JLP-USD")]
    JlpUsd,
    #[serde(rename = "BONK-USD")]
    BonkUsd,
}

impl Market {
    pub const ALL: [Market; 5] = [
        Market::SolUsd,
        Market::BtcUsd,
        Market::EthUsd,
        Market::JlpUsd,
        Market::BonkUsd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::SolUsd => "SOL-USD",
            Market::BtcUsd => "BTC-USD",
            Market::EthUsd => "ETH-USD",
            Market::JlpUsd => "JLP-USD",
            Market::BonkUsd => "BONK-USD",
        }
    }

    pub fn parse(s: &str) -> Option<Market> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position/intent direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

/// Collateral mint accepted by the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollateralMint {
    #[serde(rename = "SOL")]
    Sol,
    #[serde(rename = "USDC")]
    Usdc,
    #[serde(rename = "USDT")]
    Usdt,
}

impl CollateralMint {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollateralMint::Sol => "SOL",
            CollateralMint::Usdc => "USDC",
            CollateralMint::Usdt => "USDT",
        }
    }

    pub fn parse(s: &str) -> Option<CollateralMint> {
        match s {
            "SOL" => Some(CollateralMint::Sol),
            "USDC" => Some(CollateralMint::Usdc),
            "USDT" => Some(CollateralMint::Usdt),
            _ => None,
        }
    }
}

/// Direction of an `AISignal`. `Neutral` never wins a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalDirection {
    Long,
    Short,
    Neutral,
}

impl SignalDirection {
    pub fn as_side(&self) -> Option<Side> {
        match self {
            SignalDirection::Long => Some(Side::Long),
            SignalDirection::Short => Some(Side::Short),
            SignalDirection::Neutral => None,
        }
    }
}

/// A single opaque trading signal from an upstream producer. This workspace
/// does not compute signals — only merges and scores them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSignal {
    pub asset: Market,
    pub direction: SignalDirection,
    /// In [0, 1].
    pub confidence: f64,
    pub regime: String,
    pub source: String,
    pub provider: String,
    pub model: String,
    pub expected_move_pct: Option<f64>,
    pub max_leverage: Option<u32>,
    pub rationale: Option<String>,
}

/// A decoded on-chain position account, as returned by reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainPosition {
    pub pda: String,
    pub owner: String,
    pub side: Side,
    pub size_usd: f64,
}

/// Kind of on-chain trigger/market request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Market,
    Trigger,
}

/// A decoded on-chain request account (market order or TP/SL trigger).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainRequest {
    pub pda: String,
    pub position: String,
    pub request_type: RequestType,
    pub executed: bool,
    pub trigger_price: Option<f64>,
    pub trigger_above_threshold: Option<bool>,
    pub entire_position: bool,
    pub size_usd_delta: f64,
}

/// Outcome of fetching one batch of accounts from the chain.
#[derive(Debug, Clone, Default)]
pub struct ChainSnapshot {
    pub positions: Vec<ChainPosition>,
    pub requests: Vec<ChainRequest>,
}

/// Batch chain-RPC contract (§6.1). A real implementation talks to a
/// validator RPC endpoint; `mqk-chain-paper` provides a deterministic
/// in-memory double.
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync {
    /// Fetch and decode every account in `pdas`, in batches of at most
    /// `batch_size`. Implementations must never panic on a malformed
    /// account; unknown discriminators are simply omitted from the result.
    async fn get_multiple_accounts(
        &self,
        pdas: &[String],
        batch_size: usize,
    ) -> anyhow::Result<ChainSnapshot>;

    /// Submit a signed transaction, returning its signature.
    async fn send_raw_transaction(&self, signed_tx: &[u8]) -> anyhow::Result<String>;

    /// Poll confirmation status for `signature`. `Ok(None)` means "not yet
    /// observed"; callers are responsible for their own timeout/backoff.
    async fn get_signature_status(&self, signature: &str) -> anyhow::Result<Option<TxStatus>>;
}

/// Lets the runtime hold one `Arc<Chn>` shared between the execution
/// service and the reconciliation loop instead of needing two client
/// instances wired to the same backing state.
#[async_trait::async_trait]
impl<T: ChainClient + ?Sized> ChainClient for std::sync::Arc<T> {
    async fn get_multiple_accounts(&self, pdas: &[String], batch_size: usize) -> anyhow::Result<ChainSnapshot> {
        (**self).get_multiple_accounts(pdas, batch_size).await
    }

    async fn send_raw_transaction(&self, signed_tx: &[u8]) -> anyhow::Result<String> {
        (**self).send_raw_transaction(signed_tx).await
    }

    async fn get_signature_status(&self, signature: &str) -> anyhow::Result<Option<TxStatus>> {
        (**self).get_signature_status(signature).await
    }
}

/// Terminal status of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    Confirmed { slot: u64, block_time: i64 },
    Failed { reason: String },
}

/// Builds an unsigned transaction for an intent. PDA derivation, account
/// enumeration, and instruction encoding are entirely the builder's
/// responsibility and out of scope for this crate.
pub trait TransactionBuilder: Send + Sync {
    fn build(&self, intent_json: &serde_json::Value, wallet_addr: &str) -> anyhow::Result<Vec<u8>>;
}

/// Signs unsigned transaction bytes with the process-owned keypair.
pub trait TxSigner: Send + Sync {
    fn sign(&self, unsigned_tx: &[u8]) -> anyhow::Result<Vec<u8>>;
    fn wallet_address(&self) -> String;
}

/// Oracle price feed (§6.1). Returns `0.0` (never an error) when no price is
/// available so callers can treat "no price yet" uniformly with "zero mark".
#[async_trait::async_trait]
pub trait OraclePriceFeed: Send + Sync {
    async fn get_price(&self, market: Market) -> f64;
}

#[async_trait::async_trait]
impl<T: OraclePriceFeed + ?Sized> OraclePriceFeed for std::sync::Arc<T> {
    async fn get_price(&self, market: Market) -> f64 {
        (**self).get_price(market).await
    }
}

/// Best-effort operator alert channel. Must never block or fail the caller.
#[async_trait::async_trait]
pub trait OperatorAlerts: Send + Sync {
    async fn send_alert(&self, text: &str);
}

#[async_trait::async_trait]
impl<T: OperatorAlerts + ?Sized> OperatorAlerts for std::sync::Arc<T> {
    async fn send_alert(&self, text: &str) {
        (**self).send_alert(text).await
    }
}

/// Pure fee/hurdle oracle (§6.1). Implementations are pure functions of
/// their inputs; no IO, no clock.
pub trait FeeOracle: Send + Sync {
    /// Hourly borrow rate at the given utilization, via a dual-slope curve.
    fn borrow_rate(&self, utilization: f64) -> f64;

    /// Total round-trip fees for a position of `notional_usd` held for
    /// `hold_hours` at `utilization`.
    fn full_fees(&self, notional_usd: f64, hold_hours: f64, utilization: f64) -> FeeBreakdown;

    /// Minimum favorable price-move percentage for a round trip to break even.
    fn minimum_win_pct(&self, notional_usd: f64, hold_hours: f64) -> f64;
}

impl<T: FeeOracle + ?Sized> FeeOracle for std::sync::Arc<T> {
    fn borrow_rate(&self, utilization: f64) -> f64 {
        (**self).borrow_rate(utilization)
    }

    fn full_fees(&self, notional_usd: f64, hold_hours: f64, utilization: f64) -> FeeBreakdown {
        (**self).full_fees(notional_usd, hold_hours, utilization)
    }

    fn minimum_win_pct(&self, notional_usd: f64, hold_hours: f64) -> f64 {
        (**self).minimum_win_pct(notional_usd, hold_hours)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub open_usd: f64,
    pub close_usd: f64,
    pub borrow_usd: f64,
    pub impact_open_usd: f64,
    pub impact_close_usd: f64,
    pub execution_usd: f64,
    pub total_usd: f64,
}

/// Timestamp helper: nanoseconds since epoch, used for intent creation
/// timestamps (§3.1) where sub-second ordering matters.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}
