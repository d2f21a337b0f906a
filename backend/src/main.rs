//! Settlement host service
//!
//! Loads a tournament definition, deploys it, serves it over gRPC, and keeps
//! two background tasks running:
//! - the reveal relay, which carries decryption requests to the gateway
//! - the settlement watcher, which finalizes once decryption is underway

use anyhow::Context as _;
use settlement_backend::gateway::GatewayClient;
use settlement_backend::grpc_service::{proto, SettlementGrpcService};
use settlement_backend::{
    AppConfig, AppError, AuditTrail, Finalizer, RevealRelay, SettlementService, SystemClock,
    TournamentDefinition,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::time;
use tonic::transport::Server;
use tracing::{error, info, warn};

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "settlement_backend={level},tournament_settlement={level},tonic=info",
            level = config.log_level
        )
        .into()
    });

    if config.is_production() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().map_err(AppError::Config)?;
    init_tracing(&config);

    info!("Settlement host starting");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);
    info!("gRPC port: {}", config.grpc_port);
    info!("Tournament file: {}", config.tournament_file.display());

    let definition = TournamentDefinition::load(&config.tournament_file)
        .with_context(|| format!("loading {}", config.tournament_file.display()))?;

    let audit = Arc::new(
        AuditTrail::new(config.audit_log_dir.clone()).context("audit trail initialization")?,
    );
    info!("✓ Audit trail at {}", audit.path().display());

    let service = Arc::new(
        SettlementService::deploy(definition, Arc::new(SystemClock))
            .context("tournament deployment")?
            .with_audit(audit),
    );
    let admin = service.admin().await;
    info!(%admin, "✓ Tournament deployed");

    // Sealed predictions are readable on the development engine
    if config.is_production()
        && service.is_confidential().await
        && service.uses_development_engine().await
    {
        return Err(AppError::Config(
            "confidential tournaments need an external compute engine in production".to_string(),
        )
        .into());
    }

    let gateway = GatewayClient::from_config(&config.gateway).context("decryption gateway")?;
    if gateway.is_none() {
        warn!("No decryption gateway configured, revealing with the development engine");
    }

    let relay = RevealRelay::new(service.clone(), gateway)
        .with_poll_interval(config.gateway.poll_interval());
    let relay_handle = tokio::spawn(async move {
        relay.start().await;
    });
    info!("✓ Reveal relay started");

    let watcher_service = service.clone();
    let finalize_config = config.finalize.clone();
    let poll_interval = config.gateway.poll_interval();
    tokio::spawn(async move {
        let mut interval = time::interval(poll_interval);
        loop {
            interval.tick().await;
            let snapshot = watcher_service.snapshot().await;
            if !snapshot.active {
                info!(phase = %snapshot.phase, "tournament settled");
                return;
            }
            if snapshot.phase == "decrypting" {
                let finalizer =
                    Finalizer::new(watcher_service.clone(), admin, finalize_config.clone());
                if let Err(e) = finalizer.run().await {
                    error!("Finalization failed: {}", e);
                }
            }
        }
    });
    info!("✓ Settlement watcher started");

    let grpc_addr: SocketAddr = format!("0.0.0.0:{}", config.grpc_port)
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid gRPC address: {}", e)))?;
    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(proto::FILE_DESCRIPTOR_SET)
        .build()
        .context("gRPC reflection")?;
    let grpc_service = SettlementGrpcService::new(service.clone())
        .with_development_rpcs(config.is_development());

    info!("Starting gRPC server on {}...", grpc_addr);
    let grpc_server = Server::builder()
        .add_service(reflection)
        .add_service(grpc_service.into_server())
        .serve(grpc_addr);
    let grpc_handle = tokio::spawn(async move {
        if let Err(e) = grpc_server.await {
            error!("gRPC server error: {}", e);
        }
    });
    info!("✓ gRPC server started on {}", grpc_addr);
    info!("Press Ctrl+C to shut down");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = relay_handle => {
            error!("Reveal relay exited unexpectedly");
        }
        _ = grpc_handle => {
            error!("gRPC server exited unexpectedly");
        }
    }

    let snapshot = service.snapshot().await;
    service
        .check_conservation()
        .await
        .context("fund conservation check")?;
    info!(
        snapshot = %serde_json::to_string(&snapshot)?,
        "Settlement host shutdown complete"
    );
    Ok(())
}
