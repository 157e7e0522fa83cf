//! A single overlay layer: pending writes, deletion tombstones, and the
//! event buffer for one tentative unit of execution.
//!
//! Layers chain through `parent`: reads cascade tombstone → pending →
//! parent → loader, and the outermost (`is_top`) layer memoizes what it
//! observes from below so the delta digest covers the read set as well as
//! the write set. Inner layers never cache; they are scratch spaces whose
//! reads may be discarded wholesale.

use std::sync::Arc;

use talus_identifiers::{Address, ProcessId};
use talus_ledger_types::{Account, Event, InternalLoader, StateError, StateResult, TxOut, Utxo};

use crate::map::{StateMap, StateSet};

/// Builds the composite key for account-scoped data.
pub(crate) fn account_data_key(addr: Address, key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(Address::LEN + key.len());
    out.extend_from_slice(addr.as_slice());
    out.extend_from_slice(key);
    out
}

/// Builds the composite key for process-scoped data. The prefix is exactly
/// the one pid byte.
pub(crate) fn process_data_key(pid: ProcessId, key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + key.len());
    out.push(pid);
    out.extend_from_slice(key);
    out
}

/// One overlay layer over the committed state.
///
/// Owned by its child layer (or by the context when outermost). The parent
/// is only ever reached through shared references, so a child cannot
/// mutate it; folding a layer into its parent consumes the layer.
pub(crate) struct StateCache {
    loader: Arc<dyn InternalLoader>,
    pub(crate) parent: Option<Box<StateCache>>,
    pub(crate) seq_map: StateMap<Address, u64>,
    pub(crate) account_map: StateMap<Address, Box<dyn Account>>,
    pub(crate) deleted_account_set: StateSet<Address>,
    pub(crate) account_name_map: StateMap<String, Address>,
    pub(crate) deleted_account_name_set: StateSet<String>,
    pub(crate) account_data_map: StateMap<Vec<u8>, Vec<u8>>,
    pub(crate) deleted_account_data_set: StateSet<Vec<u8>>,
    pub(crate) process_data_map: StateMap<Vec<u8>, Vec<u8>>,
    pub(crate) deleted_process_data_set: StateSet<Vec<u8>>,
    pub(crate) utxo_map: StateMap<u64, Utxo>,
    pub(crate) created_utxo_map: StateMap<u64, TxOut>,
    pub(crate) deleted_utxo_set: StateSet<u64>,
    pub(crate) events: Vec<Box<dyn Event>>,
    pub(crate) event_n: u16,
    pub(crate) is_top: bool,
}

impl StateCache {
    /// Creates a layer over the loader, optionally chained onto a parent.
    ///
    /// The event counter seeds from the parent so sibling layers never
    /// reuse event indices. The creator is responsible for clearing the
    /// parent's `is_top` flag before chaining it.
    pub(crate) fn new(loader: Arc<dyn InternalLoader>, parent: Option<Box<StateCache>>) -> Self {
        let event_n = parent.as_ref().map(|p| p.event_n).unwrap_or_default();
        Self {
            loader,
            parent,
            seq_map: StateMap::new(),
            account_map: StateMap::new(),
            deleted_account_set: StateSet::new(),
            account_name_map: StateMap::new(),
            deleted_account_name_set: StateSet::new(),
            account_data_map: StateMap::new(),
            deleted_account_data_set: StateSet::new(),
            process_data_map: StateMap::new(),
            deleted_process_data_set: StateSet::new(),
            utxo_map: StateMap::new(),
            created_utxo_map: StateMap::new(),
            deleted_utxo_set: StateSet::new(),
            events: Vec::new(),
            event_n,
            is_top: true,
        }
    }

    pub(crate) fn loader(&self) -> &dyn InternalLoader {
        self.loader.as_ref()
    }

    // -- sequences --

    /// Gets the sequence of the account.
    pub(crate) fn seq(&mut self, addr: Address) -> u64 {
        if self.deleted_account_set.has(&addr) {
            return 0;
        }
        if let Some(seq) = self.seq_map.get(&addr) {
            return *seq;
        }
        let seq = match &self.parent {
            Some(parent) => parent.seq_ro(addr),
            None => self.loader.seq(addr),
        };
        if seq > 0 && self.is_top {
            self.seq_map.put(addr, seq);
        }
        seq
    }

    fn seq_ro(&self, addr: Address) -> u64 {
        if self.deleted_account_set.has(&addr) {
            return 0;
        }
        if let Some(seq) = self.seq_map.get(&addr) {
            return *seq;
        }
        match &self.parent {
            Some(parent) => parent.seq_ro(addr),
            None => self.loader.seq(addr),
        }
    }

    /// Advances the sequence of the account. No-op on a deleted account.
    pub(crate) fn add_seq(&mut self, addr: Address) {
        if self.deleted_account_set.has(&addr) {
            return;
        }
        let next = self.seq(addr) + 1;
        self.seq_map.put(addr, next);
    }

    // -- accounts --

    /// Gets the account at the address.
    pub(crate) fn account(&mut self, addr: Address) -> StateResult<&dyn Account> {
        self.cache_account(addr)?;
        Ok(self
            .account_map
            .get(&addr)
            .expect("state: cached account")
            .as_ref())
    }

    /// Gets the account at the address, mutably. The handle aliases the
    /// layer's own copy, so caller mutations become part of the delta.
    pub(crate) fn account_mut(&mut self, addr: Address) -> StateResult<&mut dyn Account> {
        self.cache_account(addr)?;
        Ok(self
            .account_map
            .get_mut(&addr)
            .expect("state: cached account")
            .as_mut())
    }

    fn cache_account(&mut self, addr: Address) -> StateResult<()> {
        if self.deleted_account_set.has(&addr) {
            return Err(StateError::NotExistAccount);
        }
        if self.account_map.has(&addr) {
            return Ok(());
        }
        debug_assert!(self.is_top, "state: reads enter at the top layer");
        let acc = match &self.parent {
            Some(parent) => parent.account_ro(addr)?,
            None => self.loader.account(addr)?,
        };
        self.account_map.put(addr, acc);
        Ok(())
    }

    fn account_ro(&self, addr: Address) -> StateResult<Box<dyn Account>> {
        if self.deleted_account_set.has(&addr) {
            return Err(StateError::NotExistAccount);
        }
        if let Some(acc) = self.account_map.get(&addr) {
            return Ok(acc.clone_boxed());
        }
        match &self.parent {
            Some(parent) => parent.account_ro(addr),
            None => self.loader.account(addr),
        }
    }

    /// Resolves an account name to its address.
    pub(crate) fn address_by_name(&mut self, name: &str) -> StateResult<Address> {
        if self.deleted_account_name_set.has(name) {
            return Err(StateError::NotExistAccount);
        }
        if let Some(addr) = self.account_name_map.get(name) {
            return Ok(*addr);
        }
        let addr = match &self.parent {
            Some(parent) => parent.address_by_name_ro(name)?,
            None => self.loader.address_by_name(name)?,
        };
        if self.is_top {
            self.account_name_map.put(name.to_owned(), addr);
        }
        Ok(addr)
    }

    fn address_by_name_ro(&self, name: &str) -> StateResult<Address> {
        if self.deleted_account_name_set.has(name) {
            return Err(StateError::NotExistAccount);
        }
        if let Some(addr) = self.account_name_map.get(name) {
            return Ok(*addr);
        }
        match &self.parent {
            Some(parent) => parent.address_by_name_ro(name),
            None => self.loader.address_by_name(name),
        }
    }

    /// Checks whether an account exists at the address. Never caches.
    pub(crate) fn has_account(&self, addr: Address) -> StateResult<bool> {
        if self.deleted_account_set.has(&addr) {
            return Ok(false);
        }
        if self.account_map.has(&addr) {
            return Ok(true);
        }
        match &self.parent {
            Some(parent) => parent.has_account(addr),
            None => self.loader.is_exist_account(addr),
        }
    }

    /// Checks whether an account name is registered. Never caches.
    pub(crate) fn has_account_name(&self, name: &str) -> StateResult<bool> {
        if self.deleted_account_name_set.has(name) {
            return Ok(false);
        }
        if self.account_name_map.has(name) {
            return Ok(true);
        }
        match &self.parent {
            Some(parent) => parent.has_account_name(name),
            None => self.loader.is_exist_account_name(name),
        }
    }

    /// Inserts a new account, registering both its address and its name.
    pub(crate) fn create_account(&mut self, acc: Box<dyn Account>) -> StateResult<()> {
        if acc.name().len() < 4 {
            return Err(StateError::InvalidAccountName);
        }
        let addr = acc.address();
        let name = acc.name().to_owned();
        match self.account(addr) {
            Err(StateError::NotExistAccount) => {}
            Err(err) => return Err(err),
            Ok(_) => return Err(StateError::ExistAccount),
        }
        match self.address_by_name(&name) {
            Err(StateError::NotExistAccount) => {}
            Err(err) => return Err(err),
            Ok(_) => return Err(StateError::ExistAccount),
        }
        // Inserting under a same-layer tombstone revives the key: a key
        // lives in the pending map or the tombstone set, never both.
        self.deleted_account_set.delete(&addr);
        self.deleted_account_name_set.delete(name.as_str());
        self.account_name_map.put(name, addr);
        self.account_map.put(addr, acc);
        Ok(())
    }

    /// Deletes the account, tombstoning both its address and its name.
    pub(crate) fn delete_account(&mut self, acc: &dyn Account) -> StateResult<()> {
        let addr = acc.address();
        self.account(addr)?;
        let name = acc.name().to_owned();
        self.account_map.delete(&addr);
        self.account_name_map.delete(name.as_str());
        self.deleted_account_set.put(addr);
        self.deleted_account_name_set.put(name);
        Ok(())
    }

    // -- account data --

    /// Gets account-scoped data. Empty means absent.
    pub(crate) fn account_data(&mut self, addr: Address, key: &[u8]) -> Vec<u8> {
        let dkey = account_data_key(addr, key);
        if self.deleted_account_data_set.has(dkey.as_slice()) {
            return Vec::new();
        }
        if let Some(value) = self.account_data_map.get(dkey.as_slice()) {
            return value.clone();
        }
        let value = match &self.parent {
            Some(parent) => parent.account_data_ro(addr, key, &dkey),
            None => self.loader.account_data(addr, key),
        };
        if !value.is_empty() && self.is_top {
            self.account_data_map.put(dkey, value.clone());
        }
        value
    }

    fn account_data_ro(&self, addr: Address, key: &[u8], dkey: &[u8]) -> Vec<u8> {
        if self.deleted_account_data_set.has(dkey) {
            return Vec::new();
        }
        if let Some(value) = self.account_data_map.get(dkey) {
            return value.clone();
        }
        match &self.parent {
            Some(parent) => parent.account_data_ro(addr, key, dkey),
            None => self.loader.account_data(addr, key),
        }
    }

    /// Sets account-scoped data. Empty value deletes the key.
    pub(crate) fn set_account_data(&mut self, addr: Address, key: &[u8], value: Vec<u8>) {
        let dkey = account_data_key(addr, key);
        if value.is_empty() {
            self.account_data_map.delete(dkey.as_slice());
            self.deleted_account_data_set.put(dkey);
        } else {
            self.deleted_account_data_set.delete(dkey.as_slice());
            self.account_data_map.put(dkey, value);
        }
    }

    /// Enumerates account-scoped data keys visible at this layer.
    ///
    /// The prefix is forwarded to the loader; the layer's own pending keys
    /// are folded in unfiltered, matching the committed-store enumeration
    /// the callers already rely on.
    pub(crate) fn account_data_keys(
        &self,
        addr: Address,
        prefix: &[u8],
    ) -> StateResult<Vec<Vec<u8>>> {
        let mut key_set = StateSet::new();
        let below = match &self.parent {
            Some(parent) => parent.account_data_keys(addr, prefix)?,
            None => self.loader.account_data_keys(addr, prefix)?,
        };
        for key in below {
            key_set.put(key);
        }
        self.account_data_map.each_prefix(addr.as_slice(), |key, _| {
            key_set.put(key[Address::LEN..].to_vec());
            true
        });
        self.deleted_account_data_set
            .each_prefix(addr.as_slice(), |key| {
                key_set.delete(&key[Address::LEN..]);
                true
            });
        let mut keys = Vec::new();
        key_set.each_all(|key: &Vec<u8>| {
            keys.push(key.clone());
            true
        });
        Ok(keys)
    }

    // -- process data --

    /// Gets process-scoped data. Empty means absent.
    pub(crate) fn process_data(&mut self, pid: ProcessId, key: &[u8]) -> Vec<u8> {
        let dkey = process_data_key(pid, key);
        if self.deleted_process_data_set.has(dkey.as_slice()) {
            return Vec::new();
        }
        if let Some(value) = self.process_data_map.get(dkey.as_slice()) {
            return value.clone();
        }
        let value = match &self.parent {
            Some(parent) => parent.process_data_ro(pid, key, &dkey),
            None => self.loader.process_data(pid, key),
        };
        if !value.is_empty() && self.is_top {
            self.process_data_map.put(dkey, value.clone());
        }
        value
    }

    fn process_data_ro(&self, pid: ProcessId, key: &[u8], dkey: &[u8]) -> Vec<u8> {
        if self.deleted_process_data_set.has(dkey) {
            return Vec::new();
        }
        if let Some(value) = self.process_data_map.get(dkey) {
            return value.clone();
        }
        match &self.parent {
            Some(parent) => parent.process_data_ro(pid, key, dkey),
            None => self.loader.process_data(pid, key),
        }
    }

    /// Sets process-scoped data. Empty value deletes the key.
    pub(crate) fn set_process_data(&mut self, pid: ProcessId, key: &[u8], value: Vec<u8>) {
        let dkey = process_data_key(pid, key);
        if value.is_empty() {
            self.process_data_map.delete(dkey.as_slice());
            self.deleted_process_data_set.put(dkey);
        } else {
            self.deleted_process_data_set.delete(dkey.as_slice());
            self.process_data_map.put(dkey, value);
        }
    }

    /// Enumerates process-scoped data keys visible at this layer.
    pub(crate) fn process_data_keys(
        &self,
        pid: ProcessId,
        prefix: &[u8],
    ) -> StateResult<Vec<Vec<u8>>> {
        let mut key_set = StateSet::new();
        let below = match &self.parent {
            Some(parent) => parent.process_data_keys(pid, prefix)?,
            None => self.loader.process_data_keys(pid, prefix)?,
        };
        for key in below {
            key_set.put(key);
        }
        self.process_data_map.each_prefix(&[pid], |key, _| {
            key_set.put(key[1..].to_vec());
            true
        });
        self.deleted_process_data_set.each_prefix(&[pid], |key| {
            key_set.delete(&key[1..]);
            true
        });
        let mut keys = Vec::new();
        key_set.each_all(|key: &Vec<u8>| {
            keys.push(key.clone());
            true
        });
        Ok(keys)
    }

    // -- utxos --

    /// Checks whether the UTXO id is live. Never caches.
    pub(crate) fn is_exist_utxo(&self, id: u64) -> StateResult<bool> {
        if self.deleted_utxo_set.has(&id) {
            return Ok(false);
        }
        if self.utxo_map.has(&id) || self.created_utxo_map.has(&id) {
            return Ok(true);
        }
        match &self.parent {
            Some(parent) => parent.is_exist_utxo(id),
            None => self.loader.is_exist_utxo(id),
        }
    }

    /// Gets the UTXO at the id. Reading a tombstoned id is a double spend.
    pub(crate) fn utxo(&mut self, id: u64) -> StateResult<&Utxo> {
        if self.deleted_utxo_set.has(&id) {
            return Err(StateError::DoubleSpent);
        }
        if !self.utxo_map.has(&id) {
            debug_assert!(self.is_top, "state: reads enter at the top layer");
            let utxo = match &self.parent {
                Some(parent) => parent.utxo_ro(id)?,
                None => self.loader.utxo(id)?,
            };
            self.utxo_map.put(id, utxo);
        }
        Ok(self.utxo_map.get(&id).expect("state: cached utxo"))
    }

    fn utxo_ro(&self, id: u64) -> StateResult<Utxo> {
        if self.deleted_utxo_set.has(&id) {
            return Err(StateError::DoubleSpent);
        }
        if let Some(utxo) = self.utxo_map.get(&id) {
            return Ok(*utxo);
        }
        match &self.parent {
            Some(parent) => parent.utxo_ro(id),
            None => self.loader.utxo(id),
        }
    }

    /// Mints a new UTXO under an id that must not be live.
    pub(crate) fn create_utxo(&mut self, id: u64, vout: TxOut) -> StateResult<()> {
        match self.utxo(id) {
            Err(StateError::NotExistUtxo) => {}
            Err(err) => return Err(err),
            Ok(_) => return Err(StateError::ExistUtxo),
        }
        self.created_utxo_map.put(id, vout);
        Ok(())
    }

    /// Consumes the UTXO at the id.
    pub(crate) fn delete_utxo(&mut self, id: u64) -> StateResult<()> {
        self.utxo(id)?;
        self.deleted_utxo_set.put(id);
        Ok(())
    }

    // -- events --

    /// Stamps the event with the next index and appends it to the buffer.
    pub(crate) fn emit_event(&mut self, mut event: Box<dyn Event>) -> StateResult<()> {
        event.set_n(self.event_n);
        self.event_n += 1;
        self.events.push(event);
        Ok(())
    }

    // -- lifecycle --

    /// Folds this layer into its parent and returns the parent.
    ///
    /// Pending entries overwrite the parent's and clear the parent's
    /// matching tombstones; tombstones copy over and clear the parent's
    /// matching pending entries; events append in order and the event
    /// counter advances. The result is the same state the parent would
    /// hold had every operation been applied to it directly.
    pub(crate) fn fold_into_parent(self: Box<Self>) -> Box<StateCache> {
        let StateCache {
            parent,
            seq_map,
            account_map,
            deleted_account_set,
            account_name_map,
            deleted_account_name_set,
            account_data_map,
            deleted_account_data_set,
            process_data_map,
            deleted_process_data_set,
            utxo_map,
            created_utxo_map,
            deleted_utxo_set,
            mut events,
            event_n,
            ..
        } = *self;
        let mut parent = parent.expect("state: fold above base layer");

        for (addr, seq) in seq_map {
            parent.seq_map.put(addr, seq);
        }
        for (addr, acc) in account_map {
            parent.deleted_account_set.delete(&addr);
            parent.account_map.put(addr, acc);
        }
        for addr in deleted_account_set {
            parent.account_map.delete(&addr);
            parent.deleted_account_set.put(addr);
        }
        for (name, addr) in account_name_map {
            parent.deleted_account_name_set.delete(name.as_str());
            parent.account_name_map.put(name, addr);
        }
        for name in deleted_account_name_set {
            parent.account_name_map.delete(name.as_str());
            parent.deleted_account_name_set.put(name);
        }
        for (key, value) in account_data_map {
            parent.deleted_account_data_set.delete(key.as_slice());
            parent.account_data_map.put(key, value);
        }
        for key in deleted_account_data_set {
            parent.account_data_map.delete(key.as_slice());
            parent.deleted_account_data_set.put(key);
        }
        for (key, value) in process_data_map {
            parent.deleted_process_data_set.delete(key.as_slice());
            parent.process_data_map.put(key, value);
        }
        for key in deleted_process_data_set {
            parent.process_data_map.delete(key.as_slice());
            parent.deleted_process_data_set.put(key);
        }
        for (id, utxo) in utxo_map {
            parent.utxo_map.put(id, utxo);
        }
        for (id, vout) in created_utxo_map {
            parent.created_utxo_map.put(id, vout);
        }
        for id in deleted_utxo_set {
            parent.deleted_utxo_set.put(id);
        }

        parent.events.append(&mut events);
        parent.event_n = event_n;
        parent
    }

    /// Drops this layer and returns the parent untouched.
    pub(crate) fn discard(self: Box<Self>) -> Box<StateCache> {
        self.parent.expect("state: discard above base layer")
    }
}
