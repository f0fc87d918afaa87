//! Deterministic "paper" transaction builder: serializes the intent and
//! wallet address into bytes without talking to any chain program. Useful
//! as the `TransactionBuilder` collaborator in execution-service tests.

use mqk_schemas::TransactionBuilder;

#[derive(Clone, Debug, Default)]
pub struct PaperBuilder;

impl TransactionBuilder for PaperBuilder {
    fn build(&self, intent_json: &serde_json::Value, wallet_addr: &str) -> anyhow::Result<Vec<u8>> {
        let envelope = serde_json::json!({
            "wallet": wallet_addr,
            "intent": intent_json,
        });
        Ok(serde_json::to_vec(&envelope)?)
    }
}
