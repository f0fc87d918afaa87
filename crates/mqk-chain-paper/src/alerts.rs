//! Deterministic "paper" operator-alerts sink: records sent alert text for
//! test assertions instead of paging anyone.

use std::sync::Mutex;

use mqk_schemas::OperatorAlerts;

#[derive(Default)]
pub struct PaperAlerts {
    sent: Mutex<Vec<String>>,
}

impl PaperAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl OperatorAlerts for PaperAlerts {
    async fn send_alert(&self, text: &str) {
        self.sent.lock().unwrap().push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn alerts_accumulate_in_send_order() {
        let alerts = PaperAlerts::new();
        alerts.send_alert("first").await;
        alerts.send_alert("second").await;
        assert_eq!(alerts.sent(), vec!["first".to_string(), "second".to_string()]);
    }
}
