//! Core diff engine (§4.7): classifies every position as clean, GHOST,
//! MISMATCH, or ZOMBIE by comparing the locally-tracked set against a
//! batch-fetched `ChainSnapshot`. Pure, deterministic, no IO.

use crate::types::{Classification, LocalSnapshot, ReconcileReport, SIZE_MISMATCH_TOLERANCE_USD};
use mqk_schemas::ChainSnapshot;
use std::collections::BTreeSet;

pub fn reconcile(local: &LocalSnapshot, chain: &ChainSnapshot) -> ReconcileReport {
    let mut classifications = Vec::new();
    let mut matched_pdas: BTreeSet<&str> = BTreeSet::new();

    for position in local.positions.values() {
        let Some(pda) = &position.pda else {
            // No PDA known yet (still awaiting confirmation) — nothing to
            // reconcile against until the chain assigns one.
            continue;
        };
        match chain.positions.iter().find(|p| &p.pda == pda) {
            Some(chain_pos) => {
                matched_pdas.insert(pda.as_str());
                let diff = (chain_pos.size_usd - position.size_usd).abs();
                if diff > SIZE_MISMATCH_TOLERANCE_USD || chain_pos.side != position.side {
                    classifications.push(Classification::Mismatch {
                        idempotency_key: position.idempotency_key.clone(),
                        pda: pda.clone(),
                        local_size_usd: position.size_usd,
                        chain_size_usd: chain_pos.size_usd,
                    });
                }
            }
            None => classifications.push(Classification::Zombie {
                idempotency_key: position.idempotency_key.clone(),
                pda: pda.clone(),
            }),
        }
    }

    for chain_pos in &chain.positions {
        if !matched_pdas.contains(chain_pos.pda.as_str()) {
            classifications.push(Classification::Ghost {
                pda: chain_pos.pda.clone(),
                side: chain_pos.side,
                size_usd: chain_pos.size_usd,
            });
        }
    }

    ReconcileReport { classifications }
}
