use crate::config::FinalizeConfig;
use crate::error::{AppError, AppResult};
use crate::services::settlement::SettlementService;
use std::sync::Arc;
use tournament_settlement::{Address, Settlement};
use tracing::{error, info, warn};

/// Drives `finalize_and_distribute` to completion, backing off while
/// decryptions are still outstanding
pub struct Finalizer {
    service: Arc<SettlementService>,
    admin: Address,
    config: FinalizeConfig,
}

impl Finalizer {
    pub fn new(service: Arc<SettlementService>, admin: Address, config: FinalizeConfig) -> Self {
        Self {
            service,
            admin,
            config,
        }
    }

    pub async fn run(&self) -> AppResult<Settlement> {
        let mut backoff = self.config.initial_backoff();
        let max_backoff = self.config.max_backoff();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.service.finalize_and_distribute(self.admin).await {
                Ok(settlement) => {
                    info!(attempt, "tournament settled");
                    return Ok(settlement);
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = self.config.max_attempts,
                        error = %e,
                        "finalization not ready, retrying in {:?}",
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(max_backoff);
                }
                Err(e) => {
                    error!(attempt, error = %e, "finalization failed");
                    return Err(match e {
                        AppError::Settlement(inner) if inner.is_retryable() => AppError::Message(
                            format!("gave up after {} attempts: {}", attempt, inner),
                        ),
                        other => other,
                    });
                }
            }
        }
    }
}
