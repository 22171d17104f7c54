//! Persistence seam for vault records.

use std::collections::BTreeMap;

use crate::error::{SentinelError, SentinelResult};
use crate::types::AccountId;
use crate::vault::Vault;

/// Keyed storage of vault records, one per owner.
///
/// Implementations only store and enumerate; protocol rules (uniqueness on
/// creation, drained balance on removal) are enforced by the registry.
pub trait VaultStore: Send {
    /// Loads the vault owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn get(&self, owner: &AccountId) -> SentinelResult<Option<Vault>>;

    /// Inserts or replaces the vault keyed by its owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn put(&mut self, vault: Vault) -> SentinelResult<()>;

    /// Deletes the vault owned by `owner`, returning it if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn remove(&mut self, owner: &AccountId) -> SentinelResult<Option<Vault>>;

    /// Lists owners in a stable order, skipping `from_index` entries and
    /// returning at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn owners(&self, from_index: usize, limit: Option<usize>) -> SentinelResult<Vec<AccountId>>;

    /// Number of stored vaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn len(&self) -> SentinelResult<usize>;

    /// Returns `true` if no vault is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn is_empty(&self) -> SentinelResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns `true` if `owner` has a vault.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn contains(&self, owner: &AccountId) -> SentinelResult<bool> {
        Ok(self.get(owner)?.is_some())
    }
}

/// Vault records held in an ordered map.
///
/// Ordering by owner name keeps enumeration stable across calls, which is what
/// paginated listing relies on.
#[derive(Debug, Default, Clone)]
pub struct MemoryVaultStore {
    vaults: BTreeMap<AccountId, Vault>,
}

impl MemoryVaultStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from previously exported records.
    ///
    /// # Errors
    ///
    /// Returns a storage error on duplicate owners or on a record that
    /// violates the vault invariants.
    pub fn from_vaults(vaults: Vec<Vault>) -> SentinelResult<Self> {
        let mut map = BTreeMap::new();
        for vault in vaults {
            vault.check_invariants()?;
            let owner = vault.owner().clone();
            if map.insert(owner.clone(), vault).is_some() {
                return Err(SentinelError::storage(format!(
                    "duplicate vault for {owner}"
                )));
            }
        }
        Ok(Self { vaults: map })
    }

    /// Exports every record in owner order.
    #[must_use]
    pub fn to_vaults(&self) -> Vec<Vault> {
        self.vaults.values().cloned().collect()
    }
}

impl VaultStore for MemoryVaultStore {
    fn get(&self, owner: &AccountId) -> SentinelResult<Option<Vault>> {
        Ok(self.vaults.get(owner).cloned())
    }

    fn put(&mut self, vault: Vault) -> SentinelResult<()> {
        self.vaults.insert(vault.owner().clone(), vault);
        Ok(())
    }

    fn remove(&mut self, owner: &AccountId) -> SentinelResult<Option<Vault>> {
        Ok(self.vaults.remove(owner))
    }

    fn owners(&self, from_index: usize, limit: Option<usize>) -> SentinelResult<Vec<AccountId>> {
        let keys = self.vaults.keys().skip(from_index).cloned();
        Ok(match limit {
            Some(limit) => keys.take(limit).collect(),
            None => keys.collect(),
        })
    }

    fn len(&self) -> SentinelResult<usize> {
        Ok(self.vaults.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;

    fn vault(owner: &str) -> Vault {
        Vault::new(
            AccountId::new(owner).unwrap(),
            AccountId::new("heir.near").unwrap(),
            60_000,
            60_000,
            Timestamp::ZERO,
        )
    }

    #[test]
    fn test_owners_are_ordered_and_paginated() {
        let mut store = MemoryVaultStore::new();
        for owner in ["carol.near", "alice.near", "bob.near"] {
            store.put(vault(owner)).unwrap();
        }
        let all: Vec<String> = store
            .owners(0, None)
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(all, ["alice.near", "bob.near", "carol.near"]);

        let page = store.owners(1, Some(1)).unwrap();
        assert_eq!(page, vec![AccountId::new("bob.near").unwrap()]);
        assert!(store.owners(5, Some(10)).unwrap().is_empty());
    }

    #[test]
    fn test_from_vaults_rejects_duplicates() {
        let err = MemoryVaultStore::from_vaults(vec![vault("a.near"), vault("a.near")]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Storage);
    }

    #[test]
    fn test_export_round_trip() {
        let store = MemoryVaultStore::from_vaults(vec![vault("a.near"), vault("b.near")]).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        let json = serde_json::to_string(&store.to_vaults()).unwrap();
        let restored: Vec<Vault> = serde_json::from_str(&json).unwrap();
        let restored = MemoryVaultStore::from_vaults(restored).unwrap();
        assert!(restored.contains(&AccountId::new("b.near").unwrap()).unwrap());
    }
}
