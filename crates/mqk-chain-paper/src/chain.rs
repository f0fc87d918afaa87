//! Deterministic in-memory "paper" chain client.
//!
//! Design decisions (kept intentionally simple/deterministic, same spirit as
//! a paper broker adapter):
//! - `send_raw_transaction` assigns signatures as `"paper:tx:{n}"` in
//!   submission order; no randomness, no wall-clock reads.
//! - Unless a test calls [`PaperChain::queue_signature_status`], a
//!   submitted transaction confirms immediately on the first status poll —
//!   this keeps `ExecutionService` tests from needing a real poll loop.
//! - State is mutated through `&self` (an internal `Mutex`) because
//!   `ChainClient` is an async trait object shared across tasks.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use mqk_schemas::{ChainClient, ChainPosition, ChainRequest, ChainSnapshot, TxStatus};

#[derive(Default)]
struct ChainState {
    positions: BTreeMap<String, ChainPosition>,
    requests: BTreeMap<String, ChainRequest>,
    signature_status: BTreeMap<String, TxStatus>,
    submitted: Vec<Vec<u8>>,
}

#[derive(Default)]
pub struct PaperChain {
    state: Mutex<ChainState>,
    next_signature: AtomicUsize,
    fail_next_submit: Mutex<Option<String>>,
}

impl PaperChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&self, position: ChainPosition) {
        self.state.lock().unwrap().positions.insert(position.pda.clone(), position);
    }

    pub fn set_request(&self, request: ChainRequest) {
        self.state.lock().unwrap().requests.insert(request.pda.clone(), request);
    }

    pub fn remove_position(&self, pda: &str) {
        self.state.lock().unwrap().positions.remove(pda);
    }

    /// Pins the status a future `get_signature_status(signature)` call
    /// returns, overriding the default immediate-confirm behavior.
    pub fn queue_signature_status(&self, signature: impl Into<String>, status: TxStatus) {
        self.state.lock().unwrap().signature_status.insert(signature.into(), status);
    }

    /// Makes the next `send_raw_transaction` call fail with `reason`
    /// instead of succeeding.
    pub fn fail_next_submit(&self, reason: impl Into<String>) {
        *self.fail_next_submit.lock().unwrap() = Some(reason.into());
    }

    pub fn submitted_transactions(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn submit_count(&self) -> usize {
        self.state.lock().unwrap().submitted.len()
    }
}

#[async_trait::async_trait]
impl ChainClient for PaperChain {
    async fn get_multiple_accounts(&self, pdas: &[String], _batch_size: usize) -> anyhow::Result<ChainSnapshot> {
        let state = self.state.lock().unwrap();
        let wanted: std::collections::BTreeSet<&String> = pdas.iter().collect();
        let positions = state.positions.values().filter(|p| wanted.contains(&p.pda)).cloned().collect();
        let requests = state.requests.values().filter(|r| wanted.contains(&r.pda)).cloned().collect();
        Ok(ChainSnapshot { positions, requests })
    }

    async fn send_raw_transaction(&self, signed_tx: &[u8]) -> anyhow::Result<String> {
        if let Some(reason) = self.fail_next_submit.lock().unwrap().take() {
            anyhow::bail!(reason);
        }
        let n = self.next_signature.fetch_add(1, Ordering::SeqCst);
        let signature = format!("paper:tx:{n}");
        self.state.lock().unwrap().submitted.push(signed_tx.to_vec());
        Ok(signature)
    }

    async fn get_signature_status(&self, signature: &str) -> anyhow::Result<Option<TxStatus>> {
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.signature_status.remove(signature) {
            return Ok(Some(status));
        }
        Ok(Some(TxStatus::Confirmed { slot: 0, block_time: 0 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mqk_schemas::Side;

    #[tokio::test]
    async fn submitted_transactions_confirm_immediately_by_default() {
        let chain = PaperChain::new();
        let sig = chain.send_raw_transaction(&[1, 2, 3]).await.unwrap();
        let status = chain.get_signature_status(&sig).await.unwrap();
        assert_eq!(status, Some(TxStatus::Confirmed { slot: 0, block_time: 0 }));
        assert_eq!(chain.submit_count(), 1);
    }

    #[tokio::test]
    async fn queued_status_overrides_the_default_confirm() {
        let chain = PaperChain::new();
        let sig = chain.send_raw_transaction(&[]).await.unwrap();
        chain.queue_signature_status(&sig, TxStatus::Failed { reason: "slippage".to_string() });
        let status = chain.get_signature_status(&sig).await.unwrap();
        assert_eq!(status, Some(TxStatus::Failed { reason: "slippage".to_string() }));
    }

    #[tokio::test]
    async fn fail_next_submit_is_consumed_once() {
        let chain = PaperChain::new();
        chain.fail_next_submit("rpc down");
        assert!(chain.send_raw_transaction(&[]).await.is_err());
        assert!(chain.send_raw_transaction(&[]).await.is_ok());
    }

    #[tokio::test]
    async fn get_multiple_accounts_filters_by_requested_pda() {
        let chain = PaperChain::new();
        chain.set_position(ChainPosition { pda: "pos-1".to_string(), owner: "wallet".to_string(), side: Side::Long, size_usd: 100.0 });
        chain.set_position(ChainPosition { pda: "pos-2".to_string(), owner: "wallet".to_string(), side: Side::Short, size_usd: 50.0 });

        let snapshot = chain.get_multiple_accounts(&["pos-1".to_string()], 100).await.unwrap();
        assert_eq!(snapshot.positions.len(), 1);
        assert_eq!(snapshot.positions[0].pda, "pos-1");
    }
}
