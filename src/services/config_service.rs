use loco_rs::prelude::*;

use crate::services::circuit_breaker::CircuitBreakerConfig;

/// Typed configuration loader, one function per concern, mirroring the environment-first
/// loading style used throughout `services/`. Every getter fails loudly on malformed required
/// input rather than silently falling back to an insecure default.
pub struct ConfigService;

impl ConfigService {
    /// Required: 32 raw bytes, hex-encoded, used to derive per-workspace credential
    /// encryption keys. Boot fails if this is absent or the wrong length.
    pub fn master_encryption_key() -> Result<Vec<u8>> {
        let hex_key = std::env::var("MASTER_ENCRYPTION_KEY")
            .map_err(|_| Error::string("MASTER_ENCRYPTION_KEY environment variable not set"))?;

        let key = hex::decode(&hex_key)
            .map_err(|e| Error::string(&format!("MASTER_ENCRYPTION_KEY is not valid hex: {e}")))?;

        if key.len() != 32 {
            return Err(Error::string(&format!(
                "MASTER_ENCRYPTION_KEY must decode to 32 bytes, got {}",
                key.len()
            )));
        }

        Ok(key)
    }

    pub fn database_url() -> Result<String> {
        std::env::var("DATABASE_URL").map_err(|_| Error::string("DATABASE_URL environment variable not set"))
    }

    /// Optional breaker tuning, defaulting to the values documented for this subsystem.
    pub fn circuit_breaker_config() -> CircuitBreakerConfig {
        let default = CircuitBreakerConfig::default();

        let window_size = std::env::var("CIRCUIT_BREAKER_WINDOW_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.window_size);

        let failure_threshold = std::env::var("CIRCUIT_BREAKER_FAILURE_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.failure_threshold);

        let cooldown_ms: i64 = std::env::var("CIRCUIT_BREAKER_COOLDOWN_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| default.cooldown.num_milliseconds());

        CircuitBreakerConfig {
            window_size,
            failure_threshold,
            cooldown: chrono::Duration::milliseconds(cooldown_ms),
        }
    }

    pub fn webhook_http_timeout_secs() -> u64 {
        std::env::var("WEBHOOK_HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circuit_breaker_config_falls_back_to_defaults_when_unset() {
        std::env::remove_var("CIRCUIT_BREAKER_WINDOW_SIZE");
        std::env::remove_var("CIRCUIT_BREAKER_FAILURE_THRESHOLD");
        std::env::remove_var("CIRCUIT_BREAKER_COOLDOWN_MS");

        let config = ConfigService::circuit_breaker_config();
        let default = CircuitBreakerConfig::default();
        assert_eq!(config.window_size, default.window_size);
        assert_eq!(config.failure_threshold, default.failure_threshold);
        assert_eq!(config.cooldown, default.cooldown);
    }

    #[test]
    fn master_encryption_key_rejects_wrong_length() {
        std::env::set_var("MASTER_ENCRYPTION_KEY", "aabbcc");
        let result = ConfigService::master_encryption_key();
        assert!(result.is_err());
        std::env::remove_var("MASTER_ENCRYPTION_KEY");
    }

    #[test]
    fn master_encryption_key_accepts_32_bytes_hex() {
        let hex_key = hex::encode([7u8; 32]);
        std::env::set_var("MASTER_ENCRYPTION_KEY", &hex_key);
        let result = ConfigService::master_encryption_key().unwrap();
        assert_eq!(result.len(), 32);
        std::env::remove_var("MASTER_ENCRYPTION_KEY");
    }
}
