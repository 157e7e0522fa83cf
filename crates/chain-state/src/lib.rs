//! Layered transactional state overlay.
//!
//! This crate is where tentative execution happens. A [`Context`] stacks
//! copy-on-read overlay layers above a read-only [`Loader`] view of
//! committed chain state: transactions mutate the top layer, observe
//! their own writes immediately, and either fold the delta down on commit
//! or drop it on revert. The top layer doubles as a read-set snapshot,
//! so the canonical digest ([`Context::hash`]) commits to everything the
//! execution observed and changed; that digest is what block validation
//! compares across nodes.
//!
//! The overlay is thread-confined by design: one executor owns a context,
//! reads that memoize take `&mut self`, and there is no internal locking.
//! Only the [`Loader`] is shared, and only for reading.

mod context;
mod digest;
mod map;
mod state_cache;


pub use context::{Context, ProcessContext};
// Re-exported so overlay consumers see one coherent surface.
pub use talus_ledger_types::{
    Account, EmptyLoader, Event, InternalLoader, Loader, SingleAccount, StateError, StateResult,
    TxOut, Utxo,
};
