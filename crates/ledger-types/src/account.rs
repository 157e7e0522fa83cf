use std::{any::Any, fmt::Debug};

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use talus_identifiers::{Address, Buf32};

use crate::{
    errors::{StateError, StateResult},
    loader::Loader,
};

/// Abstract account state.
///
/// The state layer needs only the address, the name, signer validation, and
/// the ability to take an independent deep copy. Transactions interpret
/// concrete account kinds through the `Any` escape hatches.
pub trait Account: Debug + Send + Sync {
    /// Gets the account address.
    fn address(&self) -> Address;

    /// Gets the account name.
    fn name(&self) -> &str;

    /// Validates that the given signers may act for this account.
    fn validate(&self, loader: &dyn Loader, signers: &[Buf32]) -> StateResult<()>;

    /// Gets the canonical byte encoding, used when folding the account into
    /// a state digest.
    fn to_bytes(&self) -> Vec<u8>;

    /// Returns an independent deep copy of the account.
    fn clone_boxed(&self) -> Box<dyn Account>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl Clone for Box<dyn Account> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

/// An account controlled by a single key.
///
/// This is the baseline account kind; other kinds (multisig, formulator)
/// live with the processes that define them.
#[derive(
    Clone, Debug, Eq, PartialEq, Arbitrary, BorshDeserialize, BorshSerialize, Deserialize, Serialize,
)]
pub struct SingleAccount {
    address: Address,
    name: String,
    key_hash: Buf32,
}

impl SingleAccount {
    /// Creates a new account record.
    pub fn new(address: Address, name: impl Into<String>, key_hash: Buf32) -> Self {
        Self {
            address,
            name: name.into(),
            key_hash,
        }
    }

    /// Gets the hash of the controlling public key.
    pub fn key_hash(&self) -> Buf32 {
        self.key_hash
    }

    /// Replaces the controlling key hash.
    pub fn set_key_hash(&mut self, key_hash: Buf32) {
        self.key_hash = key_hash;
    }
}

impl Account for SingleAccount {
    fn address(&self) -> Address {
        self.address
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, _loader: &dyn Loader, signers: &[Buf32]) -> StateResult<()> {
        if signers.len() != 1 {
            return Err(StateError::InvalidSignerCount);
        }
        if signers[0] != self.key_hash {
            return Err(StateError::InvalidAccountSigner);
        }
        Ok(())
    }

    fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).expect("account: borsh encode")
    }

    fn clone_boxed(&self) -> Box<dyn Account> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::EmptyLoader;

    fn test_account() -> SingleAccount {
        SingleAccount::new(Address::new([1; 20]), "alice001", Buf32::from([9; 32]))
    }

    #[test]
    fn test_validate_single_signer() {
        let acc = test_account();
        let loader = EmptyLoader;

        assert!(acc.validate(&loader, &[Buf32::from([9; 32])]).is_ok());
        assert_eq!(
            acc.validate(&loader, &[]).unwrap_err(),
            StateError::InvalidSignerCount,
        );
        assert_eq!(
            acc.validate(&loader, &[Buf32::from([9; 32]); 2]).unwrap_err(),
            StateError::InvalidSignerCount,
        );
        assert_eq!(
            acc.validate(&loader, &[Buf32::from([8; 32])]).unwrap_err(),
            StateError::InvalidAccountSigner,
        );
    }

    #[test]
    fn test_clone_boxed_is_deep() {
        let acc = test_account();
        let mut cloned = acc.clone_boxed();
        let single = cloned
            .as_any_mut()
            .downcast_mut::<SingleAccount>()
            .expect("test: downcast");
        single.set_key_hash(Buf32::from([7; 32]));

        assert_eq!(acc.key_hash(), Buf32::from([9; 32]));
        assert_ne!(acc.to_bytes(), cloned.to_bytes());
    }
}
