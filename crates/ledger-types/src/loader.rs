use talus_identifiers::{Address, Buf32, ProcessId};

use crate::{
    account::Account,
    errors::{StateError, StateResult},
    utxo::Utxo,
};

/// Read-only view onto the committed state of a target chain.
///
/// Implementations sit on top of the persistent store and must be safe for
/// concurrent readers: one committed store can back many independent overlay
/// stacks at once. The overlay is the only mutator; nothing here writes.
pub trait Loader: Send + Sync {
    /// Gets the chain name.
    fn name(&self) -> &str;

    /// Gets the chain version.
    fn version(&self) -> u16;

    /// Gets the height the next block would commit at.
    fn target_height(&self) -> u32;

    /// Gets the hash of the last committed block.
    fn last_hash(&self) -> Buf32;

    /// Gets the timestamp of the last committed block.
    fn last_timestamp(&self) -> u64;

    /// Gets the sequence of the account. 0 means the account is absent or
    /// has never transacted.
    fn seq(&self, addr: Address) -> u64;

    /// Gets the account at the address.
    fn account(&self, addr: Address) -> StateResult<Box<dyn Account>>;

    /// Resolves an account name to its address.
    fn address_by_name(&self, name: &str) -> StateResult<Address>;

    /// Checks whether an account exists at the address.
    fn is_exist_account(&self, addr: Address) -> StateResult<bool>;

    /// Checks whether an account name is registered.
    fn is_exist_account_name(&self, name: &str) -> StateResult<bool>;

    /// Gets account-scoped data. Empty means absent.
    fn account_data(&self, addr: Address, key: &[u8]) -> Vec<u8>;

    /// Enumerates account-scoped data keys under the prefix.
    fn account_data_keys(&self, addr: Address, prefix: &[u8]) -> StateResult<Vec<Vec<u8>>>;

    /// Checks whether the UTXO id is live.
    fn is_exist_utxo(&self, id: u64) -> StateResult<bool>;

    /// Gets the UTXO at the id.
    fn utxo(&self, id: u64) -> StateResult<Utxo>;
}

/// Loader extension for process-scoped data.
///
/// Split from [`Loader`] so process state is not exposed to arbitrary
/// external readers; only the overlay and the processes themselves consume
/// this.
pub trait InternalLoader: Loader {
    /// Gets process-scoped data. Empty means absent.
    fn process_data(&self, pid: ProcessId, key: &[u8]) -> Vec<u8>;

    /// Enumerates process-scoped data keys under the prefix.
    fn process_data_keys(&self, pid: ProcessId, prefix: &[u8]) -> StateResult<Vec<Vec<u8>>>;
}

/// Loader over no state at all. Used to seed the genesis overlay.
#[derive(Copy, Clone, Debug, Default)]
pub struct EmptyLoader;

impl Loader for EmptyLoader {
    fn name(&self) -> &str {
        ""
    }

    fn version(&self) -> u16 {
        0
    }

    fn target_height(&self) -> u32 {
        0
    }

    fn last_hash(&self) -> Buf32 {
        Buf32::zero()
    }

    fn last_timestamp(&self) -> u64 {
        0
    }

    fn seq(&self, _addr: Address) -> u64 {
        0
    }

    fn account(&self, _addr: Address) -> StateResult<Box<dyn Account>> {
        Err(StateError::NotExistAccount)
    }

    fn address_by_name(&self, _name: &str) -> StateResult<Address> {
        Err(StateError::NotExistAccount)
    }

    fn is_exist_account(&self, _addr: Address) -> StateResult<bool> {
        Ok(false)
    }

    fn is_exist_account_name(&self, _name: &str) -> StateResult<bool> {
        Ok(false)
    }

    fn account_data(&self, _addr: Address, _key: &[u8]) -> Vec<u8> {
        Vec::new()
    }

    fn account_data_keys(&self, _addr: Address, _prefix: &[u8]) -> StateResult<Vec<Vec<u8>>> {
        Ok(Vec::new())
    }

    fn is_exist_utxo(&self, _id: u64) -> StateResult<bool> {
        Ok(false)
    }

    fn utxo(&self, _id: u64) -> StateResult<Utxo> {
        Err(StateError::NotExistUtxo)
    }
}

impl InternalLoader for EmptyLoader {
    fn process_data(&self, _pid: ProcessId, _key: &[u8]) -> Vec<u8> {
        Vec::new()
    }

    fn process_data_keys(&self, _pid: ProcessId, _prefix: &[u8]) -> StateResult<Vec<Vec<u8>>> {
        Ok(Vec::new())
    }
}
