//! Secrets & RPC/signer routing.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (e.g. `"MQK_RPC_URL"`), never
//!   values.
//! - At startup, callers invoke `resolve_secrets_for_mode()` once.
//! - `Debug` impls on all secret-containing structs **redact** values.
//! - Error messages reference the env var **NAME**, never the value.
//!
//! # Mode-aware enforcement
//! - `LIVE`: RPC URL, wallet address, and signer keystore path are **required**.
//! - `DRY_RUN`: RPC URL and wallet address are **required** (reads only); the
//!   signer keystore path is optional since no transaction is ever signed.
//! - `BACKTEST`: nothing is required — all optional.

use anyhow::{bail, Result};
use serde_json::Value;

/// All runtime-resolved secrets for one engine instantiation.
/// **Values are redacted in `Debug` output.**
#[derive(Clone)]
pub struct ResolvedSecrets {
    pub rpc_url: Option<String>,
    pub wallet_address: Option<String>,
    /// Path to the signer keystore file, not its contents. The signer loader
    /// itself is an out-of-scope collaborator (§1).
    pub signer_keystore_path: Option<String>,
    pub operator_alert_webhook: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("rpc_url", &self.rpc_url.as_ref().map(|_| "<REDACTED>"))
            .field(
                "wallet_address",
                &self.wallet_address.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "signer_keystore_path",
                &self.signer_keystore_path.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "operator_alert_webhook",
                &self.operator_alert_webhook.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

struct SecretEnvNames {
    rpc_url_var: String,
    wallet_address_var: String,
    signer_keystore_path_var: String,
    operator_alert_webhook_var: Option<String>,
}

fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

fn parse_env_names(config_json: &Value) -> SecretEnvNames {
    SecretEnvNames {
        rpc_url_var: read_str_at(config_json, "/chain/keys_env/rpc_url")
            .unwrap_or_else(|| "MQK_RPC_URL".to_string()),
        wallet_address_var: read_str_at(config_json, "/chain/keys_env/wallet_address")
            .unwrap_or_else(|| "MQK_WALLET_ADDRESS".to_string()),
        signer_keystore_path_var: read_str_at(config_json, "/chain/keys_env/signer_keystore_path")
            .unwrap_or_else(|| "MQK_SIGNER_KEYSTORE_PATH".to_string()),
        operator_alert_webhook_var: read_str_at(config_json, "/alerts/webhook_env"),
    }
}

/// `mode` is case-insensitive: `"LIVE"`, `"DRY_RUN"`, or `"BACKTEST"`.
pub fn resolve_secrets_for_mode(config_json: &Value, mode: &str) -> Result<ResolvedSecrets> {
    let names = parse_env_names(config_json);
    let mode_upper = mode.trim().to_ascii_uppercase();

    let rpc_url = resolve_env(&names.rpc_url_var);
    let wallet_address = resolve_env(&names.wallet_address_var);
    let signer_keystore_path = resolve_env(&names.signer_keystore_path_var);

    match mode_upper.as_str() {
        "LIVE" => {
            if rpc_url.is_none() {
                bail!(
                    "SECRETS_MISSING mode=LIVE: required env var '{}' (rpc url) is not set or empty",
                    names.rpc_url_var,
                );
            }
            if wallet_address.is_none() {
                bail!(
                    "SECRETS_MISSING mode=LIVE: required env var '{}' (wallet address) is not set or empty",
                    names.wallet_address_var,
                );
            }
            if signer_keystore_path.is_none() {
                bail!(
                    "SECRETS_MISSING mode=LIVE: required env var '{}' (signer keystore path) is not set or empty",
                    names.signer_keystore_path_var,
                );
            }
        }
        "DRY_RUN" => {
            if rpc_url.is_none() {
                bail!(
                    "SECRETS_MISSING mode=DRY_RUN: required env var '{}' (rpc url) is not set or empty",
                    names.rpc_url_var,
                );
            }
            if wallet_address.is_none() {
                bail!(
                    "SECRETS_MISSING mode=DRY_RUN: required env var '{}' (wallet address) is not set or empty",
                    names.wallet_address_var,
                );
            }
        }
        "BACKTEST" => {}
        other => {
            bail!(
                "SECRETS_UNKNOWN_MODE: unrecognised mode '{}'; expected one of: LIVE | DRY_RUN | BACKTEST",
                other,
            );
        }
    }

    let operator_alert_webhook = names
        .operator_alert_webhook_var
        .as_deref()
        .and_then(resolve_env);

    Ok(ResolvedSecrets {
        rpc_url,
        wallet_address,
        signer_keystore_path,
        operator_alert_webhook,
    })
}
