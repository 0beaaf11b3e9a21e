use granary::{GranaryError, PlannerLimits, Result};
use std::path::PathBuf;
use std::time::Duration;

/// HTTP server settings, loaded from `GRANARY_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Corpus file (JSON array or JSON lines).
    pub corpus_path: Option<PathBuf>,
    pub bind_addr: String,
    /// Mount point of the search endpoint.
    pub base_path: String,
    pub default_rows: usize,
    pub max_rows: usize,
    pub query_timeout: Duration,
    /// Start without a corpus when it is missing or fails to load; queries
    /// answer 503 until one is available.
    pub lenient_startup: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            corpus_path: None,
            bind_addr: "127.0.0.1:7800".to_string(),
            base_path: "/api/activities".to_string(),
            default_rows: granary::query::planner::DEFAULT_ROWS,
            max_rows: granary::query::planner::MAX_ROWS,
            query_timeout: Duration::from_millis(2000),
            lenient_startup: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset keys take their defaults; set keys
    /// that do not parse are an error rather than silently defaulted.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            corpus_path: get("GRANARY_CORPUS").map(PathBuf::from),
            bind_addr: get("GRANARY_BIND_ADDR").unwrap_or(defaults.bind_addr),
            base_path: get("GRANARY_BASE_PATH").unwrap_or(defaults.base_path),
            default_rows: parse_or(
                "GRANARY_DEFAULT_ROWS",
                get("GRANARY_DEFAULT_ROWS"),
                defaults.default_rows,
            )?,
            max_rows: parse_or("GRANARY_MAX_ROWS", get("GRANARY_MAX_ROWS"), defaults.max_rows)?,
            query_timeout: Duration::from_millis(parse_or(
                "GRANARY_QUERY_TIMEOUT_MS",
                get("GRANARY_QUERY_TIMEOUT_MS"),
                defaults.query_timeout.as_millis() as u64,
            )?),
            lenient_startup: match get("GRANARY_LENIENT_STARTUP") {
                Some(v) => parse_flag("GRANARY_LENIENT_STARTUP", &v)?,
                None => defaults.lenient_startup,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rows == 0 {
            return Err(GranaryError::Config("GRANARY_MAX_ROWS must be at least 1".into()));
        }
        if self.default_rows > self.max_rows {
            return Err(GranaryError::Config(format!(
                "GRANARY_DEFAULT_ROWS ({}) exceeds GRANARY_MAX_ROWS ({})",
                self.default_rows, self.max_rows
            )));
        }
        if self.query_timeout.is_zero() {
            return Err(GranaryError::Config(
                "GRANARY_QUERY_TIMEOUT_MS must be positive".into(),
            ));
        }
        if !self.base_path.starts_with('/') || self.base_path.len() < 2 {
            return Err(GranaryError::Config(format!(
                "GRANARY_BASE_PATH must start with '/' and name a path, got '{}'",
                self.base_path
            )));
        }
        Ok(())
    }

    pub fn planner_limits(&self) -> PlannerLimits {
        PlannerLimits {
            default_rows: self.default_rows,
            max_rows: self.max_rows,
        }
    }

    /// Base path without a trailing slash.
    pub fn search_path(&self) -> &str {
        self.base_path.trim_end_matches('/')
    }
}

/// Boolean switch, case-insensitive. Accepts the same spellings as clap's
/// `BoolishValueParser` so the binary and the library agree.
fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(GranaryError::Config(format!(
            "{} has invalid value '{}', expected true or false",
            key, raw
        ))),
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| GranaryError::Config(format!("{} has invalid value '{}'", key, v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ServerConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let c = from_pairs(&[]).unwrap();
        assert_eq!(c, ServerConfig::default());
        assert_eq!(c.planner_limits(), PlannerLimits::default());
        assert_eq!(c.search_path(), "/api/activities");
    }

    #[test]
    fn overrides() {
        let c = from_pairs(&[
            ("GRANARY_CORPUS", "/data/activities.jsonl"),
            ("GRANARY_BIND_ADDR", "0.0.0.0:9000"),
            ("GRANARY_DEFAULT_ROWS", "25"),
            ("GRANARY_MAX_ROWS", "50"),
            ("GRANARY_QUERY_TIMEOUT_MS", "150"),
            ("GRANARY_BASE_PATH", "/grants/"),
            ("GRANARY_LENIENT_STARTUP", "1"),
        ])
        .unwrap();
        assert_eq!(c.corpus_path, Some(PathBuf::from("/data/activities.jsonl")));
        assert_eq!(c.bind_addr, "0.0.0.0:9000");
        assert_eq!(c.default_rows, 25);
        assert_eq!(c.max_rows, 50);
        assert_eq!(c.query_timeout, Duration::from_millis(150));
        assert_eq!(c.search_path(), "/grants");
        assert!(c.lenient_startup);
    }

    #[test]
    fn invalid_numbers_are_config_errors() {
        for pairs in [
            [("GRANARY_MAX_ROWS", "lots")],
            [("GRANARY_DEFAULT_ROWS", "-1")],
            [("GRANARY_QUERY_TIMEOUT_MS", "0")],
            [("GRANARY_MAX_ROWS", "5")],
            [("GRANARY_BASE_PATH", "api")],
        ] {
            assert!(
                matches!(from_pairs(&pairs), Err(GranaryError::Config(_))),
                "{:?}",
                pairs
            );
        }
    }

    #[test]
    fn lenient_startup_spellings() {
        for (raw, expected) in [
            ("true", true),
            ("TRUE", true),
            ("on", true),
            ("1", true),
            ("False", false),
            ("no", false),
            ("OFF", false),
            ("0", false),
        ] {
            let c = from_pairs(&[("GRANARY_LENIENT_STARTUP", raw)]).unwrap();
            assert_eq!(c.lenient_startup, expected, "{}", raw);
        }
        assert!(matches!(
            from_pairs(&[("GRANARY_LENIENT_STARTUP", "sometimes")]),
            Err(GranaryError::Config(_))
        ));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let c = from_pairs(&[("GRANARY_BIND_ADDR", "  "), ("GRANARY_MAX_ROWS", "")]).unwrap();
        assert_eq!(c.bind_addr, "127.0.0.1:7800");
        assert_eq!(c.max_rows, 100);
    }

    #[test]
    #[serial_test::serial]
    fn reads_process_environment() {
        std::env::set_var("GRANARY_DEFAULT_ROWS", "7");
        let c = ServerConfig::from_env();
        std::env::remove_var("GRANARY_DEFAULT_ROWS");
        assert_eq!(c.unwrap().default_rows, 7);
    }
}
