//! Ledger data types.
//!
//! This crate holds the abstract types the state layer manipulates without
//! caring about their concrete shape: accounts are a capability trait
//! (address, name, signer validation, deep copy), events are an opaque
//! ordered record, and the committed store is reached only through the
//! [`Loader`] contract. The overlay in `talus-chain-state` is generic over
//! all of these; processes and transactions supply the concrete kinds.

mod account;
mod errors;
mod event;
mod loader;
mod utxo;

pub use account::{Account, SingleAccount};
pub use errors::{StateError, StateResult};
pub use event::Event;
pub use loader::{EmptyLoader, InternalLoader, Loader};
pub use utxo::{TxOut, Utxo};
