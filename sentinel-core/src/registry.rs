//! The collection of vaults, one per owner.

use crate::defaults::{effective_grace_period_ms, effective_interval_ms};
use crate::error::{SentinelError, SentinelResult};
use crate::store::VaultStore;
use crate::types::{AccountId, Timestamp};
use crate::vault::Vault;

/// Vault lookup, creation and deletion on top of a [`VaultStore`].
#[derive(Debug)]
pub struct VaultRegistry<S> {
    store: S,
}

impl<S: VaultStore> VaultRegistry<S> {
    /// Wraps a store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrows the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Unwraps the underlying store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Creates a vault for `owner`, active at `now`.
    ///
    /// Missing or sub-floor durations are replaced by the policy defaults
    /// rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if `owner` has a vault and `InvalidArgument`
    /// if `beneficiary` is blank.
    pub fn create(
        &mut self,
        owner: &AccountId,
        beneficiary: &str,
        interval_ms: Option<u64>,
        grace_period_ms: Option<u64>,
        now: Timestamp,
    ) -> SentinelResult<Vault> {
        if self.store.contains(owner)? {
            return Err(SentinelError::AlreadyExists {
                owner: owner.clone(),
            });
        }
        let beneficiary = parse_beneficiary(beneficiary)?;
        let vault = Vault::new(
            owner.clone(),
            beneficiary,
            effective_interval_ms(interval_ms),
            effective_grace_period_ms(grace_period_ms),
            now,
        );
        self.store.put(vault.clone())?;
        Ok(vault)
    }

    /// Loads the vault of `owner`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn get(&self, owner: &AccountId) -> SentinelResult<Option<Vault>> {
        self.store.get(owner)
    }

    /// Loads the vault of `owner`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `owner` has no vault.
    pub fn require(&self, owner: &AccountId) -> SentinelResult<Vault> {
        self.store
            .get(owner)?
            .ok_or_else(|| SentinelError::NotFound {
                owner: owner.clone(),
            })
    }

    /// Writes back a vault previously loaded from this registry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the vault was removed meanwhile.
    pub fn commit(&mut self, vault: Vault) -> SentinelResult<()> {
        if !self.store.contains(vault.owner())? {
            return Err(SentinelError::NotFound {
                owner: vault.owner().clone(),
            });
        }
        self.store.put(vault)
    }

    /// Deletes a vault whose balance has already been refunded.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if `drained` still holds funds and `NotFound`
    /// if its owner has no vault.
    pub fn remove(&mut self, drained: &Vault) -> SentinelResult<()> {
        if !drained.balance().is_zero() {
            return Err(SentinelError::invalid_state(
                drained.owner(),
                "vault must be drained before removal",
            ));
        }
        self.store
            .remove(drained.owner())?
            .map(|_| ())
            .ok_or_else(|| SentinelError::NotFound {
                owner: drained.owner().clone(),
            })
    }

    /// Lists owners in stable order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn list_owners(
        &self,
        from_index: usize,
        limit: Option<usize>,
    ) -> SentinelResult<Vec<AccountId>> {
        self.store.owners(from_index, limit)
    }

    /// Number of registered vaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn count(&self) -> SentinelResult<usize> {
        self.store.len()
    }
}

/// Parses a beneficiary name, rejecting blank input.
///
/// # Errors
///
/// Returns `InvalidArgument` naming the `beneficiary` parameter.
pub fn parse_beneficiary(beneficiary: &str) -> SentinelResult<AccountId> {
    AccountId::new(beneficiary)
        .map_err(|_| SentinelError::invalid_argument("beneficiary", "beneficiary required"))
}
