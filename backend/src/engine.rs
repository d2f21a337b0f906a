//! Compute engines a confidential tournament can run on.

use tournament_settlement::{CallbackOracle, ClearTextEngine, FheEngine, FheError, EncryptedU64};

pub enum ComputeEngine {
    /// In-process plaintext tables. The host can read every sealed value,
    /// so this engine is for development and tests only.
    Development(ClearTextEngine),
    /// An engine whose exported ciphertexts only the gateway's key holder
    /// can decrypt.
    External(Box<dyn FheEngine>),
}

impl ComputeEngine {
    pub fn development() -> Self {
        ComputeEngine::Development(ClearTextEngine::new())
    }

    pub fn external(engine: Box<dyn FheEngine>) -> Self {
        ComputeEngine::External(engine)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, ComputeEngine::Development(_))
    }

    pub fn engine(&mut self) -> &mut dyn FheEngine {
        match self {
            ComputeEngine::Development(engine) => engine,
            ComputeEngine::External(engine) => engine.as_mut(),
        }
    }

    pub fn export(&self, ciphertext: &EncryptedU64) -> Result<Vec<u8>, FheError> {
        match self {
            ComputeEngine::Development(engine) => engine.export(ciphertext),
            ComputeEngine::External(engine) => engine.export(ciphertext),
        }
    }

    /// Answers every pending request in-process. `None` unless this is the
    /// development engine.
    pub fn reveal_into(&self, oracle: &mut CallbackOracle) -> Option<usize> {
        match self {
            ComputeEngine::Development(engine) => Some(oracle.fulfill_from(engine)),
            ComputeEngine::External(_) => None,
        }
    }
}

impl std::fmt::Debug for ComputeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComputeEngine::Development(_) => f.write_str("ComputeEngine::Development"),
            ComputeEngine::External(_) => f.write_str("ComputeEngine::External"),
        }
    }
}
