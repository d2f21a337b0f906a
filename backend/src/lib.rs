//! Settlement host
//!
//! Runs one tournament behind a serialized service exposed over gRPC,
//! relays decryption requests to the gateway, and mirrors committed events
//! into a hash-chained audit log.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod grpc_service;
pub mod services;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AppConfig;
pub use engine::ComputeEngine;
pub use error::{AppError, AppResult};
pub use services::{
    AuditTrail, Finalizer, RevealRelay, SettlementService, TournamentDefinition,
    TournamentSnapshot,
};
