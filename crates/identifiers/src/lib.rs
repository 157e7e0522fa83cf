//! Core identifier types and buffer types.

#[macro_use]
mod macros;

mod address;
mod buf;

pub use address::{Address, ProcessId};
pub use buf::{Buf20, Buf32};
