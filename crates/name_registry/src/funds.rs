//! Collection of unofficial signup payments.
//!
//! The registry only decides whether a payment is sufficient. Accepted
//! payments are handed over in full to a [`FeeVault`]; custody and
//! withdrawal belong to the vault's owner.

use namereg_types::{Address, Amount};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// What a payment was charged for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeKind {
    UserSignUp,
    ApplicationSignUp,
}

/// Receives accepted signup payments.
pub trait FeeVault: Send + Sync {
    fn deposit(&self, payer: &Address, amount: Amount, kind: FeeKind);
}

/// Fee collection statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCollectionStats {
    pub total_collected: Amount,
    pub deposits: u64,
    pub user_sign_up: Amount,
    pub application_sign_up: Amount,
}

/// In-memory running totals of collected payments.
#[derive(Clone, Default)]
pub struct MemoryFeeVault {
    by_payer: Arc<RwLock<HashMap<Address, Amount>>>,
    stats: Arc<RwLock<FeeCollectionStats>>,
}

impl MemoryFeeVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_collected(&self) -> Amount {
        self.stats.read().total_collected
    }

    /// Everything `payer` has paid so far
    pub fn collected_from(&self, payer: &Address) -> Amount {
        self.by_payer.read().get(payer).copied().unwrap_or(0)
    }

    pub fn statistics(&self) -> FeeCollectionStats {
        self.stats.read().clone()
    }
}

impl FeeVault for MemoryFeeVault {
    fn deposit(&self, payer: &Address, amount: Amount, kind: FeeKind) {
        if amount == 0 {
            return;
        }

        {
            let mut by_payer = self.by_payer.write();
            let entry = by_payer.entry(*payer).or_insert(0);
            *entry = entry.saturating_add(amount);
        }

        {
            let mut stats = self.stats.write();
            stats.total_collected = stats.total_collected.saturating_add(amount);
            stats.deposits += 1;
            match kind {
                FeeKind::UserSignUp => {
                    stats.user_sign_up = stats.user_sign_up.saturating_add(amount)
                }
                FeeKind::ApplicationSignUp => {
                    stats.application_sign_up = stats.application_sign_up.saturating_add(amount)
                }
            }
        }

        info!(
            target: "namereg::fees",
            "Collected {} from {} for {:?}",
            amount,
            payer,
            kind
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposits_accumulate_per_payer_and_kind() {
        let vault = MemoryFeeVault::new();
        let alice = Address([1; 20]);
        let bob = Address([2; 20]);

        vault.deposit(&alice, 150, FeeKind::UserSignUp);
        vault.deposit(&alice, 20, FeeKind::ApplicationSignUp);
        vault.deposit(&bob, 5, FeeKind::ApplicationSignUp);

        assert_eq!(vault.total_collected(), 175);
        assert_eq!(vault.collected_from(&alice), 170);
        assert_eq!(vault.collected_from(&bob), 5);

        let stats = vault.statistics();
        assert_eq!(stats.deposits, 3);
        assert_eq!(stats.user_sign_up, 150);
        assert_eq!(stats.application_sign_up, 25);
    }

    #[test]
    fn zero_deposits_are_ignored() {
        let vault = MemoryFeeVault::new();
        vault.deposit(&Address::ZERO, 0, FeeKind::UserSignUp);
        assert_eq!(vault.statistics(), FeeCollectionStats::default());
    }
}
