use crate::error::AppResult;
use crate::gateway::GatewayClient;
use crate::services::settlement::SettlementService;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time;
use tournament_settlement::RequestId;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Carries pending decryption requests to the gateway and feeds the
/// plaintexts back through the oracle callback
pub struct RevealRelay {
    service: Arc<SettlementService>,
    gateway: Option<GatewayClient>,
    poll_interval: Duration,
    submitted: Mutex<HashMap<RequestId, Uuid>>,
}

impl RevealRelay {
    /// Without a gateway the relay answers from the development engine and
    /// fails on any other
    pub fn new(service: Arc<SettlementService>, gateway: Option<GatewayClient>) -> Self {
        Self {
            service,
            gateway,
            poll_interval: Duration::from_secs(2),
            submitted: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub async fn start(self) {
        let mut interval = time::interval(self.poll_interval);
        info!(
            gateway = self.gateway.as_ref().map(|g| g.base_url()).unwrap_or("local"),
            "reveal relay started, polling every {:?}",
            self.poll_interval
        );

        loop {
            interval.tick().await;

            if let Err(e) = self.run_once().await {
                error!("Error in reveal relay: {}", e);
            }
        }
    }

    /// One relay pass; returns the number of requests fulfilled
    pub async fn run_once(&self) -> AppResult<usize> {
        let gateway = match &self.gateway {
            Some(gateway) => gateway,
            None => {
                let fulfilled = self.service.reveal_locally().await?;
                if fulfilled > 0 {
                    info!(fulfilled, "decryptions revealed locally");
                }
                return Ok(fulfilled);
            }
        };

        let pending = self.service.pending_decryptions().await?;
        if pending.is_empty() {
            return Ok(0);
        }

        let mut submitted = self.submitted.lock().await;
        for (request, ciphertext) in &pending {
            if !submitted.contains_key(request) {
                let job = gateway.submit(*request, ciphertext).await?;
                debug!(%request, %job, "decryption submitted");
                submitted.insert(*request, job);
            }
        }

        let jobs: Vec<(RequestId, Uuid)> = pending
            .iter()
            .filter_map(|(request, _)| submitted.get(request).map(|job| (*request, *job)))
            .collect();
        let statuses = join_all(jobs.iter().map(|(_, job)| gateway.status(*job))).await;

        let mut fulfilled = 0;
        for ((request, job), status) in jobs.into_iter().zip(statuses) {
            match status {
                Ok(Some(value)) => {
                    self.service.fulfill_decryption(request, value).await?;
                    submitted.remove(&request);
                    fulfilled += 1;
                }
                Ok(None) => {}
                Err(e) => warn!(%request, %job, error = %e, "decryption status unavailable"),
            }
        }

        if fulfilled > 0 {
            info!(fulfilled, waiting = submitted.len(), "decryptions relayed");
        }
        Ok(fulfilled)
    }
}
