pub mod audit;
pub mod finalizer;
pub mod reveal_relay;
pub mod settlement;

pub use audit::AuditTrail;
pub use finalizer::Finalizer;
pub use reveal_relay::RevealRelay;
pub use settlement::{SettlementService, TournamentDefinition, TournamentSnapshot};
