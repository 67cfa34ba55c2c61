//! Configuration Module
//!
//! Cache construction options, loadable from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Blob name used when persistence is switched on without an explicit name.
pub const DEFAULT_PERSIST_NAME: &str = "lru-cache";

// == Persist Target ==
/// Where, if anywhere, the cache mirrors its contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PersistTarget {
    /// No persistence
    #[default]
    Off,
    /// Persist under [`DEFAULT_PERSIST_NAME`]
    Default,
    /// Persist under the given name
    Named(String),
}

impl PersistTarget {
    /// Returns the blob name, or None when persistence is off.
    pub fn name(&self) -> Option<&str> {
        match self {
            PersistTarget::Off => None,
            PersistTarget::Default => Some(DEFAULT_PERSIST_NAME),
            PersistTarget::Named(name) => Some(name),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, PersistTarget::Off)
    }

    /// Parses the `CACHE_PERSIST` forms: `off|false|0`, `on|true|1`, or a name.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" => PersistTarget::Off,
            s if ["off", "false", "0"].contains(&s.to_ascii_lowercase().as_str()) => {
                PersistTarget::Off
            }
            s if ["on", "true", "1"].contains(&s.to_ascii_lowercase().as_str()) => {
                PersistTarget::Default
            }
            s => PersistTarget::Named(s.to_string()),
        }
    }
}

/// Cache configuration, fixed at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Capacity ceiling, None = unbounded
    pub max_size: Option<usize>,
    /// TTL applied when `set` gets none, None = entries never expire
    pub default_ttl: Option<Duration>,
    /// Persistence target
    pub persist: PersistTarget,
}

impl CacheConfig {
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    pub fn with_persist(mut self, persist: PersistTarget) -> Self {
        self.persist = persist;
        self
    }

    /// Rejects configurations the cache cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == Some(0) {
            return Err(CacheError::InvalidConfig(
                "max_size must be at least 1".to_string(),
            ));
        }
        if let PersistTarget::Named(name) = &self.persist {
            if name.trim().is_empty() {
                return Err(CacheError::InvalidConfig(
                    "persistence name cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Creates a CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Capacity ceiling (default: unbounded)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds, 0 = none (default: none)
    /// - `CACHE_PERSIST` - `off`, `on`, or a blob name (default: off)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`CacheConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_size = match lookup("CACHE_MAX_SIZE") {
            Some(raw) if !raw.trim().is_empty() => {
                Some(raw.trim().parse::<usize>().map_err(|_| {
                    CacheError::InvalidConfig(format!("CACHE_MAX_SIZE is not a valid size: {raw}"))
                })?)
            }
            _ => None,
        };

        let default_ttl = match lookup("CACHE_DEFAULT_TTL_MS") {
            Some(raw) if !raw.trim().is_empty() => {
                let ms = raw.trim().parse::<i64>().map_err(|_| {
                    CacheError::InvalidConfig(format!(
                        "CACHE_DEFAULT_TTL_MS is not a valid duration: {raw}"
                    ))
                })?;
                // Non-positive TTL means "never expire"
                u64::try_from(ms)
                    .ok()
                    .filter(|ms| *ms > 0)
                    .map(Duration::from_millis)
            }
            _ => None,
        };

        let persist = lookup("CACHE_PERSIST")
            .map(|raw| PersistTarget::parse(&raw))
            .unwrap_or_default();

        let config = Self {
            max_size,
            default_ttl,
            persist,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.max_size, None);
        assert_eq!(config.default_ttl, None);
        assert_eq!(config.persist, PersistTarget::Off);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_lookup_empty() {
        let config = CacheConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_config_from_lookup_all_set() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            ("CACHE_MAX_SIZE", "3"),
            ("CACHE_DEFAULT_TTL_MS", "100"),
            ("CACHE_PERSIST", "sessions"),
        ]))
        .unwrap();

        assert_eq!(config.max_size, Some(3));
        assert_eq!(config.default_ttl, Some(Duration::from_millis(100)));
        assert_eq!(config.persist, PersistTarget::Named("sessions".to_string()));
    }

    #[test]
    fn test_config_rejects_negative_capacity() {
        let result = CacheConfig::from_lookup(lookup_from(&[("CACHE_MAX_SIZE", "-1")]));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_rejects_zero_capacity() {
        let result = CacheConfig::from_lookup(lookup_from(&[("CACHE_MAX_SIZE", "0")]));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_non_positive_ttl_means_none() {
        for raw in ["0", "-50"] {
            let config =
                CacheConfig::from_lookup(lookup_from(&[("CACHE_DEFAULT_TTL_MS", raw)])).unwrap();
            assert_eq!(config.default_ttl, None, "ttl {raw} should mean no expiry");
        }
    }

    #[test]
    fn test_persist_target_parse() {
        assert_eq!(PersistTarget::parse("off"), PersistTarget::Off);
        assert_eq!(PersistTarget::parse("FALSE"), PersistTarget::Off);
        assert_eq!(PersistTarget::parse(""), PersistTarget::Off);
        assert_eq!(PersistTarget::parse("on"), PersistTarget::Default);
        assert_eq!(PersistTarget::parse("1"), PersistTarget::Default);
        assert_eq!(
            PersistTarget::parse("my-cache"),
            PersistTarget::Named("my-cache".to_string())
        );
    }

    #[test]
    fn test_persist_target_name() {
        assert_eq!(PersistTarget::Off.name(), None);
        assert_eq!(PersistTarget::Default.name(), Some(DEFAULT_PERSIST_NAME));
        assert_eq!(PersistTarget::Named("x".into()).name(), Some("x"));
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let config = CacheConfig::default().with_persist(PersistTarget::Named("  ".into()));
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfig(_))
        ));
    }
}
