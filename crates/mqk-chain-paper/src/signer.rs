//! Deterministic "paper" signer. No real cryptography: `sign` marks an
//! unsigned transaction as signed by appending a fixed tag, so tests can
//! assert a transaction passed through signing without needing a real key.

use mqk_schemas::TxSigner;

#[derive(Clone, Debug)]
pub struct PaperSigner {
    wallet_addr: String,
}

impl PaperSigner {
    pub fn new(wallet_addr: impl Into<String>) -> Self {
        Self { wallet_addr: wallet_addr.into() }
    }
}

impl Default for PaperSigner {
    fn default() -> Self {
        Self::new("paper-wallet")
    }
}

const SIGNED_TAG: &[u8] = b"paper-signed";

impl TxSigner for PaperSigner {
    fn sign(&self, unsigned_tx: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut signed = unsigned_tx.to_vec();
        signed.extend_from_slice(SIGNED_TAG);
        Ok(signed)
    }

    fn wallet_address(&self) -> String {
        self.wallet_addr.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_appends_a_fixed_tag_deterministically() {
        let signer = PaperSigner::default();
        let a = signer.sign(&[1, 2, 3]).unwrap();
        let b = signer.sign(&[1, 2, 3]).unwrap();
        assert_eq!(a, b);
        assert!(a.ends_with(SIGNED_TAG));
    }

    #[test]
    fn wallet_address_matches_construction() {
        let signer = PaperSigner::new("wallet-xyz");
        assert_eq!(signer.wallet_address(), "wallet-xyz");
    }
}
