//! Execution context over a committed chain state.
//!
//! A [`Context`] owns a stack of overlay layers above one loader. Callers
//! take numbered snapshots before tentative work (a transaction, a block),
//! then either commit the snapshot, folding its delta into the layer
//! below, or revert it and drop the delta. The outermost layer is the
//! only writer; everything below it is reached read-only.
//!
//! A context is owned by exactly one executor at a time. There is no
//! internal locking; reads that memoize take `&mut self`.

use std::sync::Arc;

use talus_identifiers::{Address, Buf32, ProcessId};
use talus_ledger_types::{Account, Event, InternalLoader, StateResult, TxOut, Utxo};
use tracing::*;

use crate::{
    digest,
    state_cache::StateCache,
};

/// Snapshot-stack manager and the state interface handed to transactions.
pub struct Context {
    loader: Arc<dyn InternalLoader>,
    top: Option<Box<StateCache>>,
    depth: usize,
}

impl Context {
    /// Creates a context with a single base layer over the loader.
    pub fn new(loader: Arc<dyn InternalLoader>) -> Self {
        let top = StateCache::new(loader.clone(), None);
        Self {
            loader,
            top: Some(Box::new(top)),
            depth: 1,
        }
    }

    fn top(&self) -> &StateCache {
        self.top.as_ref().expect("state: layer stack")
    }

    fn top_mut(&mut self) -> &mut StateCache {
        self.top.as_mut().expect("state: layer stack")
    }

    // -- snapshot stack --

    /// Pushes a snapshot and returns its number.
    ///
    /// The new layer becomes the single outermost writer; the previous top
    /// becomes read-only underneath it.
    pub fn snapshot(&mut self) -> usize {
        let mut parent = self.top.take().expect("state: layer stack");
        parent.is_top = false;
        self.top = Some(Box::new(StateCache::new(self.loader.clone(), Some(parent))));
        self.depth += 1;
        trace!(sn = self.depth, "pushed state snapshot");
        self.depth
    }

    /// Commits snapshots numbered `sn` and above, folding each delta into
    /// the layer below. The base layer is never popped.
    pub fn commit(&mut self, sn: usize) {
        while self.depth >= sn && self.depth > 1 {
            let child = self.top.take().expect("state: layer stack");
            let mut parent = child.fold_into_parent();
            parent.is_top = true;
            self.top = Some(parent);
            self.depth -= 1;
        }
        debug!(sn, depth = self.depth, "committed state snapshots");
    }

    /// Reverts snapshots numbered `sn` and above, dropping their deltas.
    /// The base layer is never popped.
    pub fn revert(&mut self, sn: usize) {
        while self.depth >= sn && self.depth > 1 {
            let child = self.top.take().expect("state: layer stack");
            let mut parent = child.discard();
            parent.is_top = true;
            self.top = Some(parent);
            self.depth -= 1;
        }
        debug!(sn, depth = self.depth, "reverted state snapshots");
    }

    /// Gets the current stack depth. 1 means only the base layer.
    pub fn depth(&self) -> usize {
        self.depth
    }

    // -- chain parameters --

    /// Gets the chain name.
    pub fn name(&self) -> &str {
        self.loader.name()
    }

    /// Gets the chain version.
    pub fn version(&self) -> u16 {
        self.loader.version()
    }

    /// Gets the height the next block would commit at.
    pub fn target_height(&self) -> u32 {
        self.loader.target_height()
    }

    /// Gets the hash of the last committed block.
    pub fn last_hash(&self) -> Buf32 {
        self.loader.last_hash()
    }

    /// Gets the timestamp of the last committed block.
    pub fn last_timestamp(&self) -> u64 {
        self.loader.last_timestamp()
    }

    // -- reads --

    /// Gets the sequence of the account. 0 means absent.
    pub fn seq(&mut self, addr: Address) -> u64 {
        self.top_mut().seq(addr)
    }

    /// Gets the account at the address.
    pub fn account(&mut self, addr: Address) -> StateResult<&dyn Account> {
        self.top_mut().account(addr)
    }

    /// Gets the account at the address, mutably.
    ///
    /// The handle aliases the top layer's own copy: mutations become part
    /// of the pending delta and never touch the layers below.
    pub fn account_mut(&mut self, addr: Address) -> StateResult<&mut dyn Account> {
        self.top_mut().account_mut(addr)
    }

    /// Resolves an account name to its address.
    pub fn address_by_name(&mut self, name: &str) -> StateResult<Address> {
        self.top_mut().address_by_name(name)
    }

    /// Checks whether an account exists at the address.
    pub fn has_account(&self, addr: Address) -> StateResult<bool> {
        self.top().has_account(addr)
    }

    /// Checks whether an account name is registered.
    pub fn has_account_name(&self, name: &str) -> StateResult<bool> {
        self.top().has_account_name(name)
    }

    /// Gets account-scoped data. Empty means absent.
    pub fn account_data(&mut self, addr: Address, key: &[u8]) -> Vec<u8> {
        self.top_mut().account_data(addr, key)
    }

    /// Enumerates account-scoped data keys visible at the top layer.
    pub fn account_data_keys(&self, addr: Address, prefix: &[u8]) -> StateResult<Vec<Vec<u8>>> {
        self.top().account_data_keys(addr, prefix)
    }

    /// Gets process-scoped data. Empty means absent.
    pub fn process_data(&mut self, pid: ProcessId, key: &[u8]) -> Vec<u8> {
        self.top_mut().process_data(pid, key)
    }

    /// Enumerates process-scoped data keys visible at the top layer.
    pub fn process_data_keys(&self, pid: ProcessId, prefix: &[u8]) -> StateResult<Vec<Vec<u8>>> {
        self.top().process_data_keys(pid, prefix)
    }

    /// Gets the UTXO at the id. Reading a spent id fails as a double spend.
    pub fn utxo(&mut self, id: u64) -> StateResult<&Utxo> {
        self.top_mut().utxo(id)
    }

    /// Checks whether the UTXO id is live.
    pub fn is_exist_utxo(&self, id: u64) -> StateResult<bool> {
        self.top().is_exist_utxo(id)
    }

    // -- mutators --

    /// Advances the sequence of the account.
    pub fn add_seq(&mut self, addr: Address) {
        self.top_mut().add_seq(addr)
    }

    /// Inserts a new account, registering its address and its name.
    pub fn create_account(&mut self, acc: Box<dyn Account>) -> StateResult<()> {
        self.top_mut().create_account(acc)
    }

    /// Deletes the account, tombstoning its address and its name.
    pub fn delete_account(&mut self, acc: &dyn Account) -> StateResult<()> {
        self.top_mut().delete_account(acc)
    }

    /// Sets account-scoped data. Empty value deletes the key.
    pub fn set_account_data(&mut self, addr: Address, key: &[u8], value: Vec<u8>) {
        self.top_mut().set_account_data(addr, key, value)
    }

    /// Sets process-scoped data. Empty value deletes the key.
    pub fn set_process_data(&mut self, pid: ProcessId, key: &[u8], value: Vec<u8>) {
        self.top_mut().set_process_data(pid, key, value)
    }

    /// Mints a new UTXO under an id that must not be live.
    pub fn create_utxo(&mut self, id: u64, vout: TxOut) -> StateResult<()> {
        self.top_mut().create_utxo(id, vout)
    }

    /// Consumes the UTXO at the id.
    pub fn delete_utxo(&mut self, id: u64) -> StateResult<()> {
        self.top_mut().delete_utxo(id)
    }

    /// Stamps the event with the next layer-unique index and buffers it.
    pub fn emit_event(&mut self, event: Box<dyn Event>) -> StateResult<()> {
        self.top_mut().emit_event(event)
    }

    // -- introspection --

    /// Computes the state-change commitment over the top layer's delta.
    pub fn hash(&self) -> Buf32 {
        digest::state_digest(self.top())
    }

    /// Renders the top layer's delta for diagnostics. Not consensus data.
    pub fn dump(&self) -> String {
        digest::dump(self.top())
    }

    /// Scopes this context to one process id.
    pub fn for_process(&mut self, pid: ProcessId) -> ProcessContext<'_> {
        ProcessContext { ctx: self, pid }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("chain", &self.loader.name())
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

/// A context borrow bound to one process id.
///
/// Handed to a process so it can only touch its own slice of the
/// process-data keyspace; everything else passes through to the
/// underlying context.
#[derive(Debug)]
pub struct ProcessContext<'a> {
    ctx: &'a mut Context,
    pid: ProcessId,
}

impl ProcessContext<'_> {
    /// Gets the bound process id.
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Gets data under this process's keyspace. Empty means absent.
    pub fn process_data(&mut self, key: &[u8]) -> Vec<u8> {
        let pid = self.pid;
        self.ctx.process_data(pid, key)
    }

    /// Sets data under this process's keyspace. Empty value deletes.
    pub fn set_process_data(&mut self, key: &[u8], value: Vec<u8>) {
        let pid = self.pid;
        self.ctx.set_process_data(pid, key, value)
    }

    /// Enumerates this process's data keys under the prefix.
    pub fn process_data_keys(&self, prefix: &[u8]) -> StateResult<Vec<Vec<u8>>> {
        self.ctx.process_data_keys(self.pid, prefix)
    }

    /// Gets the underlying context for the common operations.
    pub fn ctx(&mut self) -> &mut Context {
        self.ctx
    }
}
