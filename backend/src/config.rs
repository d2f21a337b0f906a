use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Retry policy for finalization while decryptions are still pending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

/// Decryption gateway configuration. Without a URL the relay reveals
/// locally through the development engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub url: Option<String>,
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub environment: String,
    pub grpc_port: u16,
    pub tournament_file: PathBuf,
    pub audit_log_dir: PathBuf,
    pub gateway: GatewayConfig,
    pub finalize: FinalizeConfig,
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

impl FinalizeConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        let config = Self {
            max_attempts: parse_or("FINALIZE_MAX_ATTEMPTS", defaults.max_attempts),
            initial_backoff_ms: parse_or("FINALIZE_INITIAL_BACKOFF_MS", defaults.initial_backoff_ms),
            max_backoff_ms: parse_or("FINALIZE_MAX_BACKOFF_MS", defaults.max_backoff_ms),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("FINALIZE_MAX_ATTEMPTS must be greater than 0".to_string());
        }
        if self.initial_backoff_ms == 0 || self.initial_backoff_ms > self.max_backoff_ms {
            return Err(
                "FINALIZE_INITIAL_BACKOFF_MS must be positive and at most FINALIZE_MAX_BACKOFF_MS"
                    .to_string(),
            );
        }
        Ok(())
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

impl Default for FinalizeConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        let url = env::var("DECRYPTION_GATEWAY_URL")
            .ok()
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());

        if let Some(url) = &url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!("Invalid DECRYPTION_GATEWAY_URL: {}", url));
            }
        }

        let timeout_secs = parse_or("GATEWAY_TIMEOUT_SECS", defaults.timeout_secs);
        let poll_interval_ms = parse_or("RELAY_POLL_INTERVAL_MS", defaults.poll_interval_ms);

        if timeout_secs == 0 {
            return Err("GATEWAY_TIMEOUT_SECS must be greater than 0".to_string());
        }
        if poll_interval_ms == 0 {
            return Err("RELAY_POLL_INTERVAL_MS must be greater than 0".to_string());
        }

        Ok(Self {
            url,
            timeout_secs,
            poll_interval_ms,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 10,
            poll_interval_ms: 2_000,
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let log_level = env::var("LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string());

        let environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string());

        let grpc_port = env::var("GRPC_PORT")
            .unwrap_or_else(|_| "50051".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid GRPC_PORT: {}", e))?;

        let tournament_file = PathBuf::from(
            env::var("TOURNAMENT_FILE").unwrap_or_else(|_| "./tournament.json".to_string()),
        );

        let audit_log_dir = PathBuf::from(
            env::var("AUDIT_LOG_DIR").unwrap_or_else(|_| "./logs".to_string()),
        );

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        let config = Self {
            log_level: log_level.to_lowercase(),
            environment: environment.to_lowercase(),
            grpc_port,
            tournament_file,
            audit_log_dir,
            gateway: GatewayConfig::from_env()?,
            finalize: FinalizeConfig::from_env()?,
        };

        Ok(config)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            environment: "development".to_string(),
            grpc_port: 50051,
            tournament_file: PathBuf::from("./tournament.json"),
            audit_log_dir: PathBuf::from("./logs"),
            gateway: GatewayConfig::default(),
            finalize: FinalizeConfig::default(),
        }
    }
}
