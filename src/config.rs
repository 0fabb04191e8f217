use std::env;
use std::time::Duration;

/// Process-wide configuration, constructed once at startup and passed by
/// reference into each provider adapter's constructor. Nothing mutates it
/// after construction; credentialed adapters copy what they need.
#[derive(Debug, Clone)]
pub struct Config {
    /// Contact address advertised in polite-pool User-Agent headers and
    /// the Unpaywall `email` parameter.
    pub contact_email: String,
    /// ISBNdb is only queried when a key is present.
    pub isbndb_api_key: Option<String>,
    /// Per-provider fetch budget; a provider that exceeds it is treated
    /// like one that returned a network error.
    pub provider_timeout: Duration,
    pub cache_enabled: bool,
    pub cache_max_entries: usize,
    pub cache_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contact_email: "support@citegen.dev".to_string(),
            isbndb_api_key: None,
            provider_timeout: Duration::from_secs(10),
            cache_enabled: true,
            cache_max_entries: 1000,
            cache_ttl: Duration::from_secs(86400),
        }
    }
}

impl Config {
    /// Defaults overlaid with environment variables:
    /// `CITEGEN_CONTACT_EMAIL`, `ISBNDB_API_KEY`, `PROVIDER_TIMEOUT_SECS`,
    /// `CACHE_ENABLED`, `CACHE_MAX_SIZE`, `CACHE_TTL` (seconds).
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(email) = env::var("CITEGEN_CONTACT_EMAIL") {
            if !email.is_empty() {
                config.contact_email = email;
            }
        }
        if let Ok(key) = env::var("ISBNDB_API_KEY") {
            if !key.is_empty() {
                config.isbndb_api_key = Some(key);
            }
        }
        if let Some(secs) = env_u64("PROVIDER_TIMEOUT_SECS") {
            config.provider_timeout = Duration::from_secs(secs);
        }
        if let Ok(flag) = env::var("CACHE_ENABLED") {
            config.cache_enabled = matches!(flag.to_lowercase().as_str(), "true" | "1" | "t");
        }
        if let Some(max) = env_u64("CACHE_MAX_SIZE") {
            config.cache_max_entries = max as usize;
        }
        if let Some(secs) = env_u64("CACHE_TTL") {
            config.cache_ttl = Duration::from_secs(secs);
        }

        config
    }

    /// User-Agent string sent to providers that ask clients to identify
    /// themselves (Crossref etiquette).
    pub fn user_agent(&self) -> String {
        format!(
            "citegen/{} (mailto:{})",
            env!("CARGO_PKG_VERSION"),
            self.contact_email
        )
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert!(config.cache_enabled);
        assert!(config.isbndb_api_key.is_none());
        assert_eq!(config.cache_max_entries, 1000);
    }

    #[test]
    fn user_agent_carries_contact_email() {
        let config = Config {
            contact_email: "team@example.org".to_string(),
            ..Config::default()
        };
        assert!(config.user_agent().contains("mailto:team@example.org"));
    }
}
