/// The three run modes this core supports. `DryRun` submits no transactions
/// but otherwise runs the full pipeline (§3.4 `desired_live=false`); `Live`
/// requires an armed `LiveControlState` (§4.4).
pub enum RunMode {
    Backtest,
    DryRun,
    Live,
}

/// Config pointers a given mode is expected to read. Used by an unused-keys
/// audit at startup to flag stale or misplaced configuration.
pub fn consumed_pointers(mode: RunMode) -> &'static [&'static str] {
    match mode {
        RunMode::Backtest => BACKTEST,
        RunMode::DryRun => DRY_RUN,
        RunMode::Live => LIVE,
    }
}

static BACKTEST: &[&str] = &["/runtime/mode", "/position", "/signals"];

static DRY_RUN: &[&str] = &[
    "/runtime/mode",
    "/chain",
    "/risk",
    "/cost_gate",
    "/position",
    "/reconcile",
    "/signals",
];

static LIVE: &[&str] = &[
    "/runtime/mode",
    "/chain",
    "/risk",
    "/cost_gate",
    "/position",
    "/reconcile",
    "/signals",
    "/integrity",
    "/live_control",
];
