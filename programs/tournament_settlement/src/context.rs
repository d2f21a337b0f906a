use crate::confidential::FheEngine;
use crate::errors::{Result, SettlementError};
use crate::oracle::DecryptionOracle;
use crate::outcome_source::OutcomeSource;
use crate::state::Address;

/// Everything an instruction sees besides the tournament state: the signer,
/// the clock, and the collaborators it may call into.
pub struct Context<'a> {
    pub signer: Address,
    /// Unix seconds.
    pub now: i64,
    pub outcomes: &'a dyn OutcomeSource,
    fhe: Option<&'a mut dyn FheEngine>,
    oracle: Option<&'a mut dyn DecryptionOracle>,
}

impl<'a> Context<'a> {
    pub fn new(signer: Address, now: i64, outcomes: &'a dyn OutcomeSource) -> Self {
        Self {
            signer,
            now,
            outcomes,
            fhe: None,
            oracle: None,
        }
    }

    pub fn with_fhe(mut self, fhe: &'a mut dyn FheEngine) -> Self {
        self.fhe = Some(fhe);
        self
    }

    pub fn with_oracle(mut self, oracle: &'a mut dyn DecryptionOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub(crate) fn fhe(&mut self) -> Result<&mut (dyn FheEngine + 'a)> {
        self.fhe
            .as_deref_mut()
            .ok_or(SettlementError::ConfidentialBackendRequired)
    }

    pub(crate) fn oracle(&mut self) -> Result<&mut (dyn DecryptionOracle + 'a)> {
        self.oracle
            .as_deref_mut()
            .ok_or(SettlementError::OracleRequired)
    }
}
