//! Asynchronous reveal boundary for sealed point totals.
//!
//! A decryption request is issued in one transaction and its result is read
//! in a later one. Nothing here times out; callers retry until every ticket
//! is ready.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::confidential::{ClearTextEngine, EncryptedU64};
use crate::points::Points;
use crate::state::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Unknown decryption request {0}")]
    UnknownRequest(RequestId),

    #[error("Decryption oracle unavailable: {0}")]
    Unavailable(String),
}

pub trait DecryptionOracle: Send {
    /// Schedules a reveal. Never returns plaintext.
    fn request(&mut self, ciphertext: EncryptedU64) -> Result<RequestId, OracleError>;

    /// Revealed plaintext, once available.
    fn poll(&self, request: RequestId) -> Option<u64>;
}

/// Handle for one participant's pending reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptionTicket {
    pub participant: Address,
    pub ciphertext: EncryptedU64,
    pub request: RequestId,
}

impl DecryptionTicket {
    pub fn request(
        oracle: &mut dyn DecryptionOracle,
        participant: Address,
        ciphertext: EncryptedU64,
    ) -> Result<Self, OracleError> {
        let request = oracle.request(ciphertext)?;
        Ok(Self {
            participant,
            ciphertext,
            request,
        })
    }

    pub fn poll_ready(&self, oracle: &dyn DecryptionOracle) -> Option<Points> {
        oracle.poll(self.request).map(Points::from_hundredths)
    }
}

/// Oracle whose results are delivered by callback: requests queue up until a
/// relay (or a test) calls [`CallbackOracle::fulfill`].
#[derive(Debug, Default, Clone)]
pub struct CallbackOracle {
    next_id: u64,
    pending: IndexMap<RequestId, EncryptedU64>,
    revealed: HashMap<RequestId, u64>,
}

impl CallbackOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests still waiting for a plaintext, oldest first.
    pub fn pending(&self) -> Vec<(RequestId, EncryptedU64)> {
        self.pending.iter().map(|(id, ct)| (*id, *ct)).collect()
    }

    pub fn is_ready(&self, request: RequestId) -> bool {
        self.revealed.contains_key(&request)
    }

    pub fn fulfill(&mut self, request: RequestId, value: u64) -> Result<(), OracleError> {
        if self.pending.shift_remove(&request).is_none() {
            return Err(OracleError::UnknownRequest(request));
        }
        self.revealed.insert(request, value);
        Ok(())
    }

    /// Reveals every pending request the engine knows about.
    pub fn fulfill_from(&mut self, engine: &ClearTextEngine) -> usize {
        let ready: Vec<(RequestId, u64)> = self
            .pending
            .iter()
            .filter_map(|(id, ct)| engine.reveal(ct).map(|value| (*id, value)))
            .collect();
        for (id, value) in &ready {
            self.pending.shift_remove(id);
            self.revealed.insert(*id, *value);
        }
        ready.len()
    }
}

impl DecryptionOracle for CallbackOracle {
    fn request(&mut self, ciphertext: EncryptedU64) -> Result<RequestId, OracleError> {
        self.next_id += 1;
        let id = RequestId(self.next_id);
        self.pending.insert(id, ciphertext);
        Ok(id)
    }

    fn poll(&self, request: RequestId) -> Option<u64> {
        self.revealed.get(&request).copied()
    }
}
