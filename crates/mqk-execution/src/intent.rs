//! `ExecutionIntent` (§3.1): a tagged-variant value object, immutable after
//! construction. Every variant carries an `idempotency_key` (UUIDv4) and a
//! nanosecond creation timestamp. Construction enforces every numeric bound
//! up front — a value that exists is, by construction, valid.

use chrono::{DateTime, Utc};
use mqk_schemas::{CollateralMint, Market, Side};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum InvalidIntent {
    LeverageOutOfRange { got: u32 },
    SizeOutOfRange { got: f64 },
    CollateralNotPositive { got: f64 },
    SlippageOutOfRange { got: u32 },
    ReduceSizeNotPositive { got: f64 },
    TriggerPriceNotPositive { got: f64 },
    PartialTpslSizeNotPositive { got: f64 },
}

impl std::fmt::Display for InvalidIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidIntent::LeverageOutOfRange { got } => write!(f, "INVALID_INTENT: leverage {got} outside [1, 100]"),
            InvalidIntent::SizeOutOfRange { got } => write!(f, "INVALID_INTENT: size_usd {got} outside [10, 1000000]"),
            InvalidIntent::CollateralNotPositive { got } => write!(f, "INVALID_INTENT: collateral_usd {got} must be > 0"),
            InvalidIntent::SlippageOutOfRange { got } => write!(f, "INVALID_INTENT: max_slippage_bps {got} outside [0, 10000]"),
            InvalidIntent::ReduceSizeNotPositive { got } => write!(f, "INVALID_INTENT: reduce_size_usd {got} must be > 0"),
            InvalidIntent::TriggerPriceNotPositive { got } => write!(f, "INVALID_INTENT: trigger_price {got} must be > 0"),
            InvalidIntent::PartialTpslSizeNotPositive { got } => write!(f, "INVALID_INTENT: size_usd {got} must be > 0 for a partial TP/SL"),
        }
    }
}

impl std::error::Error for InvalidIntent {}

const MIN_LEVERAGE: u32 = 1;
const MAX_LEVERAGE: u32 = 100;
const MIN_SIZE_USD: f64 = 10.0;
const MAX_SIZE_USD: f64 = 1_000_000.0;
const MAX_SLIPPAGE_BPS: u32 = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub idempotency_key: String,
    pub created_at_ns: i64,
    pub market: Market,
    pub side: Side,
    pub collateral_mint: CollateralMint,
    pub collateral_usd: f64,
    pub leverage: u32,
    pub size_usd: f64,
    pub max_slippage_bps: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReducePosition {
    pub idempotency_key: String,
    pub created_at_ns: i64,
    pub position_pda: String,
    pub reduce_size_usd: f64,
    pub max_slippage_bps: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosePosition {
    pub idempotency_key: String,
    pub created_at_ns: i64,
    pub position_pda: String,
    pub max_slippage_bps: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTpsl {
    pub idempotency_key: String,
    pub created_at_ns: i64,
    pub position_pda: String,
    pub trigger_price: f64,
    pub trigger_above_threshold: bool,
    pub entire_position: bool,
    pub size_usd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CancelRequest {
    pub idempotency_key: String,
    pub created_at_ns: i64,
    pub request_pda: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Noop {
    pub idempotency_key: String,
    pub created_at_ns: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionIntent {
    OpenPosition(OpenPosition),
    ReducePosition(ReducePosition),
    ClosePosition(ClosePosition),
    CreateTpsl(CreateTpsl),
    CancelRequest(CancelRequest),
    Noop(Noop),
}

fn new_idempotency_key() -> String {
    Uuid::new_v4().to_string()
}

fn now_ns() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(0)
}

impl ExecutionIntent {
    #[allow(clippy::too_many_arguments)]
    pub fn open_position(
        market: Market,
        side: Side,
        collateral_mint: CollateralMint,
        collateral_usd: f64,
        leverage: u32,
        max_slippage_bps: u32,
    ) -> Result<Self, InvalidIntent> {
        if !(MIN_LEVERAGE..=MAX_LEVERAGE).contains(&leverage) {
            return Err(InvalidIntent::LeverageOutOfRange { got: leverage });
        }
        if collateral_usd <= 0.0 {
            return Err(InvalidIntent::CollateralNotPositive { got: collateral_usd });
        }
        if max_slippage_bps > MAX_SLIPPAGE_BPS {
            return Err(InvalidIntent::SlippageOutOfRange { got: max_slippage_bps });
        }
        let size_usd = collateral_usd * leverage as f64;
        if !(MIN_SIZE_USD..=MAX_SIZE_USD).contains(&size_usd) {
            return Err(InvalidIntent::SizeOutOfRange { got: size_usd });
        }
        Ok(ExecutionIntent::OpenPosition(OpenPosition {
            idempotency_key: new_idempotency_key(),
            created_at_ns: now_ns(),
            market,
            side,
            collateral_mint,
            collateral_usd,
            leverage,
            size_usd,
            max_slippage_bps,
        }))
    }

    pub fn reduce_position(position_pda: String, reduce_size_usd: f64, max_slippage_bps: u32) -> Result<Self, InvalidIntent> {
        if reduce_size_usd <= 0.0 {
            return Err(InvalidIntent::ReduceSizeNotPositive { got: reduce_size_usd });
        }
        if max_slippage_bps > MAX_SLIPPAGE_BPS {
            return Err(InvalidIntent::SlippageOutOfRange { got: max_slippage_bps });
        }
        Ok(ExecutionIntent::ReducePosition(ReducePosition {
            idempotency_key: new_idempotency_key(),
            created_at_ns: now_ns(),
            position_pda,
            reduce_size_usd,
            max_slippage_bps,
        }))
    }

    pub fn close_position(position_pda: String, max_slippage_bps: u32) -> Result<Self, InvalidIntent> {
        if max_slippage_bps > MAX_SLIPPAGE_BPS {
            return Err(InvalidIntent::SlippageOutOfRange { got: max_slippage_bps });
        }
        Ok(ExecutionIntent::ClosePosition(ClosePosition {
            idempotency_key: new_idempotency_key(),
            created_at_ns: now_ns(),
            position_pda,
            max_slippage_bps,
        }))
    }

    pub fn create_tpsl(
        position_pda: String,
        trigger_price: f64,
        trigger_above_threshold: bool,
        entire_position: bool,
        size_usd: Option<f64>,
    ) -> Result<Self, InvalidIntent> {
        if trigger_price <= 0.0 {
            return Err(InvalidIntent::TriggerPriceNotPositive { got: trigger_price });
        }
        if !entire_position {
            match size_usd {
                Some(s) if s > 0.0 => {}
                Some(s) => return Err(InvalidIntent::PartialTpslSizeNotPositive { got: s }),
                None => return Err(InvalidIntent::PartialTpslSizeNotPositive { got: 0.0 }),
            }
        }
        Ok(ExecutionIntent::CreateTpsl(CreateTpsl {
            idempotency_key: new_idempotency_key(),
            created_at_ns: now_ns(),
            position_pda,
            trigger_price,
            trigger_above_threshold,
            entire_position,
            size_usd,
        }))
    }

    pub fn cancel_request(request_pda: String) -> Self {
        ExecutionIntent::CancelRequest(CancelRequest {
            idempotency_key: new_idempotency_key(),
            created_at_ns: now_ns(),
            request_pda,
        })
    }

    pub fn noop() -> Self {
        ExecutionIntent::Noop(Noop { idempotency_key: new_idempotency_key(), created_at_ns: now_ns() })
    }

    pub fn idempotency_key(&self) -> &str {
        match self {
            ExecutionIntent::OpenPosition(i) => &i.idempotency_key,
            ExecutionIntent::ReducePosition(i) => &i.idempotency_key,
            ExecutionIntent::ClosePosition(i) => &i.idempotency_key,
            ExecutionIntent::CreateTpsl(i) => &i.idempotency_key,
            ExecutionIntent::CancelRequest(i) => &i.idempotency_key,
            ExecutionIntent::Noop(i) => &i.idempotency_key,
        }
    }

    pub fn created_at_ns(&self) -> i64 {
        match self {
            ExecutionIntent::OpenPosition(i) => i.created_at_ns,
            ExecutionIntent::ReducePosition(i) => i.created_at_ns,
            ExecutionIntent::ClosePosition(i) => i.created_at_ns,
            ExecutionIntent::CreateTpsl(i) => i.created_at_ns,
            ExecutionIntent::CancelRequest(i) => i.created_at_ns,
            ExecutionIntent::Noop(i) => i.created_at_ns,
        }
    }

    /// Stable string discriminant for persistence, matching
    /// `mqk_journal::intent_kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionIntent::OpenPosition(_) => mqk_journal::intent_kind::OPEN_POSITION,
            ExecutionIntent::ReducePosition(_) => mqk_journal::intent_kind::REDUCE_POSITION,
            ExecutionIntent::ClosePosition(_) => mqk_journal::intent_kind::CLOSE_POSITION,
            ExecutionIntent::CreateTpsl(_) => mqk_journal::intent_kind::CREATE_TPSL,
            ExecutionIntent::CancelRequest(_) => mqk_journal::intent_kind::CANCEL_REQUEST,
            ExecutionIntent::Noop(_) => mqk_journal::intent_kind::NOOP,
        }
    }

    /// JSON representation stored in the journal's `intent_blob` column and
    /// handed to the `TransactionBuilder`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ExecutionIntent::OpenPosition(i) => serde_json::json!({
                "idempotency_key": i.idempotency_key,
                "market": i.market.as_str(),
                "side": i.side.as_str(),
                "collateral_mint": i.collateral_mint.as_str(),
                "collateral_usd": i.collateral_usd,
                "leverage": i.leverage,
                "size_usd": i.size_usd,
                "max_slippage_bps": i.max_slippage_bps,
            }),
            ExecutionIntent::ReducePosition(i) => serde_json::json!({
                "idempotency_key": i.idempotency_key,
                "position_pda": i.position_pda,
                "reduce_size_usd": i.reduce_size_usd,
                "max_slippage_bps": i.max_slippage_bps,
            }),
            ExecutionIntent::ClosePosition(i) => serde_json::json!({
                "idempotency_key": i.idempotency_key,
                "position_pda": i.position_pda,
                "max_slippage_bps": i.max_slippage_bps,
            }),
            ExecutionIntent::CreateTpsl(i) => serde_json::json!({
                "idempotency_key": i.idempotency_key,
                "position_pda": i.position_pda,
                "trigger_price": i.trigger_price,
                "trigger_above_threshold": i.trigger_above_threshold,
                "entire_position": i.entire_position,
                "size_usd": i.size_usd,
            }),
            ExecutionIntent::CancelRequest(i) => serde_json::json!({
                "idempotency_key": i.idempotency_key,
                "request_pda": i.request_pda,
            }),
            ExecutionIntent::Noop(i) => serde_json::json!({
                "idempotency_key": i.idempotency_key,
            }),
        }
    }
}
