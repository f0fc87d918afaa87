//! External file queue ingress (§4.1.1): tails an append-only
//! newline-delimited JSON file, normalizes legacy field names, and
//! enqueues the resulting intent. A sibling cursor file tracks the byte
//! offset already consumed so a restart doesn't replay old records.

use std::path::PathBuf;

use mqk_execution::ExecutionIntent;
use mqk_schemas::{CollateralMint, Market, Side};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::intent_bus::IntentProducer;

pub struct FileQueueIngress {
    queue_path: PathBuf,
    cursor_path: PathBuf,
    producer: IntentProducer,
}

impl FileQueueIngress {
    pub fn new(queue_path: impl Into<PathBuf>, cursor_path: impl Into<PathBuf>, producer: IntentProducer) -> Self {
        Self { queue_path: queue_path.into(), cursor_path: cursor_path.into(), producer: producer.named("file_queue") }
    }

    async fn read_cursor(&self) -> u64 {
        match tokio::fs::read_to_string(&self.cursor_path).await {
            Ok(text) => text.trim().parse().unwrap_or(0),
            Err(_) => 0,
        }
    }

    async fn write_cursor(&self, offset: u64) -> anyhow::Result<()> {
        let tmp = self.cursor_path.with_extension("tmp");
        tokio::fs::write(&tmp, offset.to_string()).await?;
        tokio::fs::rename(&tmp, &self.cursor_path).await?;
        Ok(())
    }

    /// One poll: reads whatever bytes were appended since the last cursor,
    /// parses complete lines, enqueues each resulting intent, and advances
    /// the cursor past every line consumed (malformed or not — a bad record
    /// is skipped, never retried forever).
    pub async fn poll_once(&self) -> anyhow::Result<usize> {
        let mut file = match tokio::fs::File::open(&self.queue_path).await {
            Ok(f) => f,
            Err(_) => return Ok(0),
        };

        let cursor = self.read_cursor().await;
        file.seek(std::io::SeekFrom::Start(cursor)).await?;

        let mut buf = String::new();
        file.read_to_string(&mut buf).await?;
        if buf.is_empty() {
            return Ok(0);
        }

        let mut consumed_bytes = cursor;
        let mut enqueued = 0usize;
        let mut remaining = buf.as_str();
        loop {
            // A trailing chunk with no newline yet is a partial record;
            // leave it unconsumed for the next poll.
            let Some(newline_at) = remaining.find('\n') else { break };
            let line = &remaining[..newline_at];
            remaining = &remaining[newline_at + 1..];
            consumed_bytes += line.len() as u64 + 1;

            if line.is_empty() {
                continue;
            }

            match parse_record(line) {
                Ok(intent) => {
                    if self.producer.try_enqueue(intent).is_ok() {
                        enqueued += 1;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, record = line, "malformed_file_queue_record_skipped");
                }
            }
        }

        self.write_cursor(consumed_bytes).await?;
        Ok(enqueued)
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>, poll_interval: std::time::Duration) {
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.poll_once().await {
                        tracing::error!(error = %err, "file_queue_poll_failed");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() { return; }
                }
            }
        }
    }
}

/// Normalizes legacy field names before building an `ExecutionIntent`:
/// `type` → `intent_type`, `collateral_usd` → `collateral_amount_usd`,
/// and defaults `size_usd` to `collateral_amount_usd * leverage` when
/// absent (the constructor recomputes it anyway, but this keeps the
/// record's own declared size from silently overriding it).
fn parse_record(line: &str) -> anyhow::Result<ExecutionIntent> {
    let mut record: Value = serde_json::from_str(line)?;
    let obj = record.as_object_mut().ok_or_else(|| anyhow::anyhow!("record is not a JSON object"))?;

    if let Some(legacy_type) = obj.remove("type") {
        obj.entry("intent_type").or_insert(legacy_type);
    }
    if let Some(legacy_collateral) = obj.remove("collateral_usd") {
        obj.entry("collateral_amount_usd").or_insert(legacy_collateral);
    }

    let intent_type = obj.get("intent_type").and_then(Value::as_str).ok_or_else(|| anyhow::anyhow!("missing intent_type"))?;

    match intent_type {
        "open_position" => {
            let market = field_str(obj, "market")?;
            let market = Market::parse(market).ok_or_else(|| anyhow::anyhow!("unknown market {market}"))?;
            let side = match field_str(obj, "side")? {
                "long" => Side::Long,
                "short" => Side::Short,
                other => anyhow::bail!("unknown side {other}"),
            };
            let collateral_mint = field_str(obj, "collateral_mint").ok().and_then(CollateralMint::parse).unwrap_or(CollateralMint::Usdc);
            let collateral_usd = field_f64(obj, "collateral_amount_usd")?;
            let leverage = field_f64(obj, "leverage")? as u32;
            let max_slippage_bps = obj.get("max_slippage_bps").and_then(Value::as_u64).unwrap_or(50) as u32;
            ExecutionIntent::open_position(market, side, collateral_mint, collateral_usd, leverage, max_slippage_bps).map_err(Into::into)
        }
        "reduce_position" => {
            let pda = field_str(obj, "position_pda")?.to_string();
            let reduce_size_usd = field_f64(obj, "reduce_size_usd")?;
            let max_slippage_bps = obj.get("max_slippage_bps").and_then(Value::as_u64).unwrap_or(50) as u32;
            ExecutionIntent::reduce_position(pda, reduce_size_usd, max_slippage_bps).map_err(Into::into)
        }
        "close_position" => {
            let pda = field_str(obj, "position_pda")?.to_string();
            let max_slippage_bps = obj.get("max_slippage_bps").and_then(Value::as_u64).unwrap_or(50) as u32;
            ExecutionIntent::close_position(pda, max_slippage_bps).map_err(Into::into)
        }
        "cancel_request" => Ok(ExecutionIntent::cancel_request(field_str(obj, "request_pda")?.to_string())),
        "noop" => Ok(ExecutionIntent::noop()),
        other => anyhow::bail!("unsupported intent_type {other}"),
    }
}

fn field_str<'a>(obj: &'a serde_json::Map<String, Value>, key: &str) -> anyhow::Result<&'a str> {
    obj.get(key).and_then(Value::as_str).ok_or_else(|| anyhow::anyhow!("missing field {key}"))
}

fn field_f64(obj: &serde_json::Map<String, Value>, key: &str) -> anyhow::Result<f64> {
    obj.get(key).and_then(Value::as_f64).ok_or_else(|| anyhow::anyhow!("missing field {key}"))
}
