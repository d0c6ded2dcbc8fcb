//! Rate limiting configuration

use serde::Deserialize;

/// Configuration for rate limiting
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enforced
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Maximum requests per window before a penalty applies
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    /// Length of the counting window in seconds
    #[serde(default = "default_window")]
    pub window_seconds: u64,
    /// Duration of the cooldown penalty in seconds
    #[serde(default = "default_cooldown")]
    pub cooldown_seconds: u64,
    /// Duration of the tempban penalty in seconds
    #[serde(default = "default_tempban")]
    pub tempban_seconds: u64,
    /// Store key prefix for rate limit state
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_enabled() -> bool {
    true
}

fn default_threshold() -> u32 {
    5 // 5 requests per window per identity
}

fn default_window() -> u64 {
    1 // 1 second window
}

fn default_cooldown() -> u64 {
    60 // 1 minute cooldown after the first violation
}

fn default_tempban() -> u64 {
    3600 // 1 hour tempban after violating the cooldown
}

fn default_prefix() -> String {
    "vesta:ratelimit".to_string()
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            threshold: default_threshold(),
            window_seconds: default_window(),
            cooldown_seconds: default_cooldown(),
            tempban_seconds: default_tempban(),
            prefix: default_prefix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.threshold, 5);
        assert_eq!(config.window_seconds, 1);
        assert_eq!(config.cooldown_seconds, 60);
        assert_eq!(config.tempban_seconds, 3600);
        assert_eq!(config.prefix, "vesta:ratelimit");
    }
}
