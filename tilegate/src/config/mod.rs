//! Process configuration.
//!
//! Resolution order: explicit overrides (CLI flags) win over environment
//! variables, which win over defaults. The API key has no default; the
//! process must refuse to start without one.
//!
//! Environment surface:
//!
//! | Variable                         | Default        |
//! |----------------------------------|----------------|
//! | `TILEGATE_API_KEY`               | (required)     |
//! | `TILEGATE_CACHE_DIR`             | `/mapcache`    |
//! | `TILEGATE_BOUNDARY_FILE`         | `nz.geojson`   |
//! | `TILEGATE_LISTEN`                | `0.0.0.0:8080` |
//! | `TILEGATE_UPSTREAM_TIMEOUT_SECS` | `30`           |
//! | `TILEGATE_MAX_FETCHES`           | `8`            |
//! | `TILEGATE_NEGATIVE_TTL_SECS`     | `86400` (`0` disables expiry) |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Environment variable names.
pub const ENV_API_KEY: &str = "TILEGATE_API_KEY";
pub const ENV_CACHE_DIR: &str = "TILEGATE_CACHE_DIR";
pub const ENV_BOUNDARY_FILE: &str = "TILEGATE_BOUNDARY_FILE";
pub const ENV_LISTEN: &str = "TILEGATE_LISTEN";
pub const ENV_UPSTREAM_TIMEOUT_SECS: &str = "TILEGATE_UPSTREAM_TIMEOUT_SECS";
pub const ENV_MAX_FETCHES: &str = "TILEGATE_MAX_FETCHES";
pub const ENV_NEGATIVE_TTL_SECS: &str = "TILEGATE_NEGATIVE_TTL_SECS";

/// Configuration errors; all are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key missing: set {ENV_API_KEY} or pass --api-key")]
    MissingApiKey,

    #[error("invalid listen address {value:?}: {source}")]
    InvalidListenAddr {
        value: String,
        source: std::net::AddrParseError,
    },

    #[error("invalid value {value:?} for {name}")]
    InvalidNumber { name: &'static str, value: String },
}

/// CLI flag overrides applied on top of the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub boundary_file: Option<PathBuf>,
    pub listen: Option<String>,
}

/// Resolved process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream API key, embedded in every tile URL.
    pub api_key: String,
    /// Root of the on-disk tile cache.
    pub cache_dir: PathBuf,
    /// GeoJSON boundary description file.
    pub boundary_file: PathBuf,
    /// Listener bind address.
    pub listen: SocketAddr,
    /// Per-request upstream deadline.
    pub upstream_timeout: Duration,
    /// Upper bound on concurrent upstream fetches.
    pub max_concurrent_fetches: usize,
    /// Negative marker expiry; `None` keeps markers forever.
    pub negative_ttl: Option<Duration>,
}

impl Config {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(ConfigOverrides::default())
    }

    /// Resolves configuration from the environment with CLI overrides.
    pub fn from_env_with(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        Self::resolve(|key| std::env::var(key).ok(), overrides)
    }

    /// Resolution against an arbitrary variable lookup, for testability.
    fn resolve(
        lookup: impl Fn(&str) -> Option<String>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let api_key = overrides
            .api_key
            .or_else(|| lookup(ENV_API_KEY))
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let cache_dir = overrides
            .cache_dir
            .or_else(|| lookup(ENV_CACHE_DIR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("/mapcache"));

        let boundary_file = overrides
            .boundary_file
            .or_else(|| lookup(ENV_BOUNDARY_FILE).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("nz.geojson"));

        let listen = overrides
            .listen
            .or_else(|| lookup(ENV_LISTEN))
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let listen = listen
            .parse()
            .map_err(|source| ConfigError::InvalidListenAddr {
                value: listen,
                source,
            })?;

        let timeout_secs = parse_number(&lookup, ENV_UPSTREAM_TIMEOUT_SECS, 30u64)?;
        let max_concurrent_fetches =
            parse_number(&lookup, ENV_MAX_FETCHES, 8usize)?.max(1);
        let negative_ttl_secs = parse_number(&lookup, ENV_NEGATIVE_TTL_SECS, 86_400u64)?;

        Ok(Self {
            api_key,
            cache_dir,
            boundary_file,
            listen,
            upstream_timeout: Duration::from_secs(timeout_secs),
            max_concurrent_fetches,
            negative_ttl: (negative_ttl_secs > 0).then(|| Duration::from_secs(negative_ttl_secs)),
        })
    }
}

fn parse_number<T: std::str::FromStr>(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn resolve(
        env: &HashMap<String, String>,
        overrides: ConfigOverrides,
    ) -> Result<Config, ConfigError> {
        Config::resolve(|key| env.get(key).cloned(), overrides)
    }

    #[test]
    fn test_defaults_apply() {
        let env = vars(&[(ENV_API_KEY, "SECRET")]);
        let config = resolve(&env, ConfigOverrides::default()).unwrap();

        assert_eq!(config.api_key, "SECRET");
        assert_eq!(config.cache_dir, PathBuf::from("/mapcache"));
        assert_eq!(config.boundary_file, PathBuf::from("nz.geojson"));
        assert_eq!(config.listen.to_string(), "0.0.0.0:8080");
        assert_eq!(config.upstream_timeout, Duration::from_secs(30));
        assert_eq!(config.max_concurrent_fetches, 8);
        assert_eq!(config.negative_ttl, Some(Duration::from_secs(86_400)));
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let env = vars(&[]);
        assert!(matches!(
            resolve(&env, ConfigOverrides::default()),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_empty_api_key_is_fatal() {
        let env = vars(&[(ENV_API_KEY, "")]);
        assert!(matches!(
            resolve(&env, ConfigOverrides::default()),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_overrides_win_over_environment() {
        let env = vars(&[
            (ENV_API_KEY, "FROM_ENV"),
            (ENV_CACHE_DIR, "/env-cache"),
        ]);
        let overrides = ConfigOverrides {
            api_key: Some("FROM_FLAG".into()),
            cache_dir: Some(PathBuf::from("/flag-cache")),
            ..Default::default()
        };
        let config = resolve(&env, overrides).unwrap();

        assert_eq!(config.api_key, "FROM_FLAG");
        assert_eq!(config.cache_dir, PathBuf::from("/flag-cache"));
    }

    #[test]
    fn test_flag_api_key_satisfies_requirement_without_env() {
        let env = vars(&[]);
        let overrides = ConfigOverrides {
            api_key: Some("FROM_FLAG".into()),
            ..Default::default()
        };
        assert!(resolve(&env, overrides).is_ok());
    }

    #[test]
    fn test_invalid_listen_address_is_fatal() {
        let env = vars(&[(ENV_API_KEY, "SECRET"), (ENV_LISTEN, "not-an-addr")]);
        assert!(matches!(
            resolve(&env, ConfigOverrides::default()),
            Err(ConfigError::InvalidListenAddr { .. })
        ));
    }

    #[test]
    fn test_invalid_timeout_is_fatal() {
        let env = vars(&[
            (ENV_API_KEY, "SECRET"),
            (ENV_UPSTREAM_TIMEOUT_SECS, "soon"),
        ]);
        assert!(matches!(
            resolve(&env, ConfigOverrides::default()),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_zero_ttl_disables_expiry() {
        let env = vars(&[(ENV_API_KEY, "SECRET"), (ENV_NEGATIVE_TTL_SECS, "0")]);
        let config = resolve(&env, ConfigOverrides::default()).unwrap();
        assert_eq!(config.negative_ttl, None);
    }

    #[test]
    fn test_zero_fetch_bound_is_clamped() {
        let env = vars(&[(ENV_API_KEY, "SECRET"), (ENV_MAX_FETCHES, "0")]);
        let config = resolve(&env, ConfigOverrides::default()).unwrap();
        assert_eq!(config.max_concurrent_fetches, 1);
    }
}
