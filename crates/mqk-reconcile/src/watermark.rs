//! Snapshot monotonicity watermark.
//!
//! Tracks the fetch timestamp of the last accepted chain snapshot and
//! rejects any snapshot whose timestamp is older, so a delayed RPC response
//! racing ahead of a newer one can never regress the reconcile state.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SnapshotFreshness {
    Fresh,
    Stale { watermark_ms: i64, got_ms: i64 },
    NoTimestamp,
}

impl SnapshotFreshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, SnapshotFreshness::Fresh)
    }
}

#[derive(Clone, Debug)]
pub struct SnapshotWatermark {
    last_accepted_ms: i64,
}

impl Default for SnapshotWatermark {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotWatermark {
    pub fn new() -> Self {
        Self { last_accepted_ms: i64::MIN }
    }

    pub fn check(&self, fetched_at_ms: i64) -> SnapshotFreshness {
        if fetched_at_ms == 0 {
            return SnapshotFreshness::NoTimestamp;
        }
        if fetched_at_ms < self.last_accepted_ms {
            return SnapshotFreshness::Stale {
                watermark_ms: self.last_accepted_ms,
                got_ms: fetched_at_ms,
            };
        }
        SnapshotFreshness::Fresh
    }

    pub fn accept(&mut self, fetched_at_ms: i64) -> SnapshotFreshness {
        let result = self.check(fetched_at_ms);
        if result.is_fresh() {
            self.last_accepted_ms = fetched_at_ms;
        }
        result
    }

    pub fn last_accepted_ms(&self) -> i64 {
        self.last_accepted_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_snapshot_older_than_watermark() {
        let mut wm = SnapshotWatermark::new();
        assert!(wm.accept(100).is_fresh());
        assert_eq!(wm.accept(50), SnapshotFreshness::Stale { watermark_ms: 100, got_ms: 50 });
        assert_eq!(wm.last_accepted_ms(), 100);
    }

    #[test]
    fn zero_timestamp_is_never_trusted() {
        let wm = SnapshotWatermark::new();
        assert_eq!(wm.check(0), SnapshotFreshness::NoTimestamp);
    }
}
