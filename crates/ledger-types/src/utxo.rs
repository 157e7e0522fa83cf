use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use talus_identifiers::Buf32;

/// A transaction output: an amount locked to a public key hash.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Arbitrary,
    BorshDeserialize,
    BorshSerialize,
    Deserialize,
    Serialize,
)]
pub struct TxOut {
    amount: u64,
    public_hash: Buf32,
}

impl TxOut {
    pub fn new(amount: u64, public_hash: Buf32) -> Self {
        Self {
            amount,
            public_hash,
        }
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn public_hash(&self) -> Buf32 {
        self.public_hash
    }
}

/// An unspent transaction output together with its ledger id.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Arbitrary,
    BorshDeserialize,
    BorshSerialize,
    Deserialize,
    Serialize,
)]
pub struct Utxo {
    id: u64,
    tx_out: TxOut,
}

impl Utxo {
    pub fn new(id: u64, tx_out: TxOut) -> Self {
        Self { id, tx_out }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn tx_out(&self) -> &TxOut {
        &self.tx_out
    }
}
