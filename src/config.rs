use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MedRemind";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Storage key holding the medicine collection in the local store.
pub const MEDICINES_KEY: &str = "medicines";

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_TOKEN_TTL_SECS: u64 = 7 * 24 * 3600;
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 600_000;

/// Get the application data directory
/// ~/MedRemind/ on all platforms, falling back to the working directory
/// when no home directory can be resolved.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the backend SQLite database
pub fn database_path() -> PathBuf {
    app_data_dir().join("medremind.db")
}

/// Directory backing the local key-value store
pub fn local_store_dir() -> PathBuf {
    app_data_dir().join("store")
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medremind=info,medremind_lib=info,tower_http=warn"
}

/// Runtime settings for the REST backend, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub token_ttl_secs: u64,
    pub pbkdf2_iterations: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.parse().unwrap_or_else(|_| {
                SocketAddr::from(([127, 0, 0, 1], 8080))
            }),
            db_path: database_path(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            pbkdf2_iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

impl ServerConfig {
    /// Build from `MEDREMIND_*` variables. Unparseable values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(raw) = lookup("MEDREMIND_BIND") {
            match raw.parse() {
                Ok(addr) => cfg.bind_addr = addr,
                Err(e) => tracing::warn!(value = %raw, "Ignoring MEDREMIND_BIND: {e}"),
            }
        }
        if let Some(raw) = lookup("MEDREMIND_DB") {
            if !raw.trim().is_empty() {
                cfg.db_path = PathBuf::from(raw);
            }
        }
        if let Some(raw) = lookup("MEDREMIND_TOKEN_TTL_SECS") {
            match raw.parse::<u64>() {
                Ok(v) if v > 0 => cfg.token_ttl_secs = v,
                _ => tracing::warn!(value = %raw, "Ignoring MEDREMIND_TOKEN_TTL_SECS"),
            }
        }
        if let Some(raw) = lookup("MEDREMIND_PBKDF2_ITERATIONS") {
            match raw.parse::<u32>() {
                Ok(v) if v > 0 => cfg.pbkdf2_iterations = v,
                _ => tracing::warn!(value = %raw, "Ignoring MEDREMIND_PBKDF2_ITERATIONS"),
            }
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("MedRemind"));
    }

    #[test]
    fn database_under_app_data() {
        assert!(database_path().starts_with(app_data_dir()));
        assert!(local_store_dir().starts_with(app_data_dir()));
    }

    #[test]
    fn defaults_when_env_empty() {
        let cfg = ServerConfig::from_lookup(|_| None);
        assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(cfg.token_ttl_secs, 604_800);
        assert_eq!(cfg.pbkdf2_iterations, DEFAULT_PBKDF2_ITERATIONS);
    }

    #[test]
    fn env_overrides_are_applied() {
        let cfg = ServerConfig::from_lookup(lookup_from(&[
            ("MEDREMIND_BIND", "0.0.0.0:9000"),
            ("MEDREMIND_DB", "/tmp/meds.db"),
            ("MEDREMIND_TOKEN_TTL_SECS", "60"),
            ("MEDREMIND_PBKDF2_ITERATIONS", "1000"),
        ]));
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/meds.db"));
        assert_eq!(cfg.token_ttl_secs, 60);
        assert_eq!(cfg.pbkdf2_iterations, 1000);
    }

    #[test]
    fn invalid_values_fall_back() {
        let cfg = ServerConfig::from_lookup(lookup_from(&[
            ("MEDREMIND_BIND", "not an address"),
            ("MEDREMIND_TOKEN_TTL_SECS", "0"),
            ("MEDREMIND_PBKDF2_ITERATIONS", "many"),
        ]));
        assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(cfg.token_ttl_secs, 604_800);
        assert_eq!(cfg.pbkdf2_iterations, DEFAULT_PBKDF2_ITERATIONS);
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
