//! Confidential compute capability set.
//!
//! Sealed predictions and running totals are opaque handles. The program only
//! ever combines them through [`FheEngine`]; it never branches on their
//! content. Any FHE or MPC backend able to provide `add`, `eq`, `lt` and
//! `select` over these handles can sit behind the trait.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use thiserror::Error;

/// Opaque handle to a ciphertext of `T`.
pub struct Encrypted<T> {
    handle: u64,
    _kind: PhantomData<T>,
}

pub type EncryptedU64 = Encrypted<u64>;
pub type EncryptedBool = Encrypted<bool>;

impl<T> Encrypted<T> {
    pub const fn from_handle(handle: u64) -> Self {
        Self {
            handle,
            _kind: PhantomData,
        }
    }

    pub const fn handle(&self) -> u64 {
        self.handle
    }
}

impl<T> Clone for Encrypted<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Encrypted<T> {}

impl<T> PartialEq for Encrypted<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T> Eq for Encrypted<T> {}

impl<T> Hash for Encrypted<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl<T> fmt::Debug for Encrypted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Encrypted(#{})", self.handle)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FheError {
    #[error("Unknown ciphertext handle #{0}")]
    UnknownHandle(u64),

    #[error("Homomorphic addition overflowed")]
    Overflow,
}

/// Operations the settlement program performs on ciphertexts.
pub trait FheEngine: Send {
    /// Trivially encrypts a public constant.
    fn encrypt(&mut self, value: u64) -> EncryptedU64;

    fn add(&mut self, lhs: &EncryptedU64, rhs: &EncryptedU64) -> Result<EncryptedU64, FheError>;

    fn eq(&mut self, lhs: &EncryptedU64, rhs: &EncryptedU64) -> Result<EncryptedBool, FheError>;

    fn lt(&mut self, lhs: &EncryptedU64, rhs: &EncryptedU64) -> Result<EncryptedBool, FheError>;

    /// Oblivious conditional: `condition ? if_true : if_false`.
    fn select(
        &mut self,
        condition: &EncryptedBool,
        if_true: &EncryptedU64,
        if_false: &EncryptedU64,
    ) -> Result<EncryptedU64, FheError>;

    /// Serialized ciphertext, as handed to the key holder for decryption.
    fn export(&self, ciphertext: &EncryptedU64) -> Result<Vec<u8>, FheError>;
}

/// Development backend: keeps every plaintext in a table keyed by handle.
/// Provides no confidentiality; it exists so the sealed path can run and be
/// tested without an FHE coprocessor.
#[derive(Debug, Default, Clone)]
pub struct ClearTextEngine {
    next_handle: u64,
    values: HashMap<u64, u64>,
    flags: HashMap<u64, bool>,
}

impl ClearTextEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decryption side of the engine, used by oracles in development.
    pub fn reveal(&self, ciphertext: &EncryptedU64) -> Option<u64> {
        self.values.get(&ciphertext.handle()).copied()
    }

    pub fn reveal_bool(&self, ciphertext: &EncryptedBool) -> Option<bool> {
        self.flags.get(&ciphertext.handle()).copied()
    }

    pub fn ciphertext_count(&self) -> usize {
        self.values.len() + self.flags.len()
    }

    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn value(&self, ciphertext: &EncryptedU64) -> Result<u64, FheError> {
        self.reveal(ciphertext)
            .ok_or(FheError::UnknownHandle(ciphertext.handle()))
    }

    fn flag(&self, ciphertext: &EncryptedBool) -> Result<bool, FheError> {
        self.reveal_bool(ciphertext)
            .ok_or(FheError::UnknownHandle(ciphertext.handle()))
    }

    fn store_flag(&mut self, flag: bool) -> EncryptedBool {
        let handle = self.allocate();
        self.flags.insert(handle, flag);
        Encrypted::from_handle(handle)
    }
}

impl FheEngine for ClearTextEngine {
    fn encrypt(&mut self, value: u64) -> EncryptedU64 {
        let handle = self.allocate();
        self.values.insert(handle, value);
        Encrypted::from_handle(handle)
    }

    fn add(&mut self, lhs: &EncryptedU64, rhs: &EncryptedU64) -> Result<EncryptedU64, FheError> {
        let sum = self
            .value(lhs)?
            .checked_add(self.value(rhs)?)
            .ok_or(FheError::Overflow)?;
        Ok(self.encrypt(sum))
    }

    fn eq(&mut self, lhs: &EncryptedU64, rhs: &EncryptedU64) -> Result<EncryptedBool, FheError> {
        let flag = self.value(lhs)? == self.value(rhs)?;
        Ok(self.store_flag(flag))
    }

    fn lt(&mut self, lhs: &EncryptedU64, rhs: &EncryptedU64) -> Result<EncryptedBool, FheError> {
        let flag = self.value(lhs)? < self.value(rhs)?;
        Ok(self.store_flag(flag))
    }

    fn select(
        &mut self,
        condition: &EncryptedBool,
        if_true: &EncryptedU64,
        if_false: &EncryptedU64,
    ) -> Result<EncryptedU64, FheError> {
        let chosen = if self.flag(condition)? {
            self.value(if_true)?
        } else {
            self.value(if_false)?
        };
        // Fresh handle: the result must not be linkable to either input.
        Ok(self.encrypt(chosen))
    }

    /// Little-endian plaintext; this engine has no real ciphertext.
    fn export(&self, ciphertext: &EncryptedU64) -> Result<Vec<u8>, FheError> {
        Ok(self.value(ciphertext)?.to_le_bytes().to_vec())
    }
}
