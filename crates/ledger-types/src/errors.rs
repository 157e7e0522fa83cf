use thiserror::Error;

pub type StateResult<T> = Result<T, StateError>;

/// State access and mutation error types.
///
/// These are sentinels: callers match on them to distinguish "absent" from
/// real failures, so variants carry no payload beyond the opaque
/// [`Storage`](StateError::Storage) passthrough.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum StateError {
    /// Lookup miss for an account address or name.
    #[error("account does not exist")]
    NotExistAccount,

    /// Tried to create an account whose address or name is taken.
    #[error("account already exists")]
    ExistAccount,

    /// Tried to assign an address that is already assigned.
    #[error("address already exists")]
    ExistAddress,

    /// Tried to register a name that is already registered.
    #[error("account name already exists")]
    ExistAccountName,

    /// Account name failed the length rules.
    #[error("invalid account name")]
    InvalidAccountName,

    /// Transaction sequence does not follow the account's sequence.
    #[error("invalid sequence")]
    InvalidSequence,

    /// Signer set has the wrong cardinality for the account kind.
    #[error("invalid signer count")]
    InvalidSignerCount,

    /// A signer does not match the account's registered key.
    #[error("invalid account signer")]
    InvalidAccountSigner,

    /// Lookup miss for a UTXO id.
    #[error("utxo does not exist")]
    NotExistUtxo,

    /// Tried to mint a UTXO id that is already live.
    #[error("utxo already exists")]
    ExistUtxo,

    /// Tried to read or consume a UTXO that is already spent.
    #[error("utxo already spent")]
    DoubleSpent,

    /// Opaque failure surfaced by the committed-state store.
    #[error("storage: {0}")]
    Storage(String),
}
