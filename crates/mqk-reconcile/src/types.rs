use mqk_schemas::{CollateralMint, Market, Side};
use std::collections::BTreeMap;

/// The position-manager's view of one locally-tracked position, reduced to
/// the fields reconciliation needs. Decouples this crate from depending on
/// `mqk-position` directly; the runtime builds this view from its
/// `TrackedPosition` map each reconcile tick.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalPositionView {
    pub idempotency_key: String,
    pub pda: Option<String>,
    pub side: Side,
    pub size_usd: f64,
}

/// Everything reconciliation needs from the position manager: all currently
/// tracked positions, keyed by idempotency key.
#[derive(Clone, Debug, Default)]
pub struct LocalSnapshot {
    pub positions: BTreeMap<String, LocalPositionView>,
}

impl LocalSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Tolerance for comparing on-chain vs. local notional size; on-chain values
/// accrue borrow/funding between marks so an exact-equality comparison would
/// false-positive on every tick.
pub const SIZE_MISMATCH_TOLERANCE_USD: f64 = 1.0;

/// A candidate position-account PDA this core is willing to enumerate and
/// check during reconciliation (§4.7): one per (market, collateral mint,
/// side, slot) tuple, where `slot` allows more than one concurrently open
/// position per (market, mint, side) triple.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PdaSlot {
    pub market: Market,
    pub mint: CollateralMint,
    pub side: Side,
    pub slot: u8,
}

/// Number of position slots enumerated per (market, mint, side) triple.
pub const SLOTS_PER_MARKET_MINT_SIDE: u8 = 9;

impl PdaSlot {
    /// Deterministic placeholder PDA string. A real implementation derives
    /// this via the Solana PDA derivation algorithm against the program id
    /// and these seeds; that derivation is owned by the `ChainClient`
    /// collaborator (§6.1), not this crate.
    pub fn placeholder_pda(&self) -> String {
        format!(
            "pda:{}:{}:{}:{}",
            self.market.as_str(),
            self.mint.as_str(),
            self.side.as_str(),
            self.slot
        )
    }
}

/// Enumerate every candidate PDA this core will batch-fetch during one
/// reconciliation pass: every market × every accepted collateral mint ×
/// both sides × `SLOTS_PER_MARKET_MINT_SIDE` slots.
pub fn enumerate_candidate_pdas(markets: &[Market], mints: &[CollateralMint]) -> Vec<String> {
    let mut out = Vec::with_capacity(markets.len() * mints.len() * 2 * SLOTS_PER_MARKET_MINT_SIDE as usize);
    for &market in markets {
        for &mint in mints {
            for side in [Side::Long, Side::Short] {
                for slot in 0..SLOTS_PER_MARKET_MINT_SIDE {
                    out.push(PdaSlot { market, mint, side, slot }.placeholder_pda());
                }
            }
        }
    }
    out
}

/// One discrepancy found while diffing the local view against the chain
/// snapshot (§4.7).
#[derive(Clone, Debug, PartialEq)]
pub enum Classification {
    /// A position exists on chain that this core has no local record of.
    Ghost { pda: String, side: Side, size_usd: f64 },
    /// A position is tracked both locally and on chain, but their notional
    /// sizes disagree beyond tolerance.
    Mismatch {
        idempotency_key: String,
        pda: String,
        local_size_usd: f64,
        chain_size_usd: f64,
    },
    /// A position is tracked locally with a known PDA, but that PDA no
    /// longer exists on chain (closed out-of-band, e.g. liquidated).
    Zombie { idempotency_key: String, pda: String },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReconcileReport {
    pub classifications: Vec<Classification>,
}

impl ReconcileReport {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn is_clean(&self) -> bool {
        self.classifications.is_empty()
    }
}
