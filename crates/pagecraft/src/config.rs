//! Test-run configuration.
//!
//! Settings live in a TOML file. Nested tables are flattened into dotted keys,
//! so `[agoda] url = "..."` and a top-level `"agoda.url" = "..."` are the same
//! setting. Every getter has a documented default: a missing key is logged
//! at `warn` and the default is used, an unparsable value is logged at
//! `error` and the default is used. Only a missing or malformed file is fatal.

use crate::result::{PageError, PageResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, error, warn};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "PAGECRAFT_CONFIG";

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "pagecraft.toml";

/// Prefix for per-key environment overrides
pub const ENV_PREFIX: &str = "PAGECRAFT_";

/// Keys understood by the typed getters, with their defaults
pub const KNOWN_KEYS: &[(&str, &str)] = &[
    ("browser", "chrome"),
    ("browserSize", "1920x1080"),
    ("pageLoadTimeout", "20000"),
    ("elementTimeout", "10000"),
    ("timeout", "5000"),
    ("pollInterval", "100"),
    ("staleRetries", "3"),
    ("staleRetryDelay", "500"),
    ("headless", "false"),
    ("base.url", "http://localhost"),
    ("agoda.url", "https://www.agoda.com/"),
    ("vietjet.url", "https://www.vietjetair.com/"),
    ("remoteGridUrl", ""),
    ("chromePath", ""),
    ("downloadDir", "target/downloads"),
    ("screenshotDir", "target/screenshots"),
    ("locatorDir", "locators"),
    ("logLevel", "info"),
    ("logFormat", "pretty"),
];

/// Immutable key/value configuration loaded once per test run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    values: BTreeMap<String, String>,
    source: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns [`PageError::ConfigNotFound`] when the file does not exist and
    /// [`PageError::ConfigParse`] when it is not valid TOML.
    pub fn load(path: impl AsRef<Path>) -> PageResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PageError::ConfigNotFound {
                    path: path.display().to_string(),
                }
            } else {
                PageError::Io(e)
            }
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.source = Some(path.to_path_buf());
        debug!(path = %path.display(), keys = config.values.len(), "Loaded configuration");
        Ok(config)
    }

    /// Locate and load the configuration file, then apply environment overrides
    ///
    /// The path comes from `PAGECRAFT_CONFIG`, falling back to
    /// `pagecraft.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn discover() -> PageResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Ok(Self::load(path)?.with_env_overrides(std::env::vars()))
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns [`PageError::ConfigParse`] if the text is not valid TOML.
    pub fn from_toml_str(content: &str) -> PageResult<Self> {
        let table: toml::Table = content.parse().map_err(|e: toml::de::Error| {
            PageError::ConfigParse {
                message: e.to_string(),
            }
        })?;
        let mut values = BTreeMap::new();
        flatten("", &table, &mut values);
        Ok(Self {
            values,
            source: None,
        })
    }

    /// Build a configuration from explicit pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            source: None,
        }
    }

    /// Overlay `PAGECRAFT_<KEY>` variables onto known keys
    ///
    /// `browserSize` maps to `PAGECRAFT_BROWSER_SIZE`, `agoda.url` to
    /// `PAGECRAFT_AGODA_URL`.
    #[must_use]
    pub fn with_env_overrides<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let lookup: BTreeMap<String, &str> = KNOWN_KEYS
            .iter()
            .map(|(key, _)| (env_name(key), *key))
            .collect();
        for (name, value) in vars {
            if let Some(key) = lookup.get(&name) {
                debug!(key = %key, "Configuration overridden from environment");
                self.values.insert((*key).to_string(), value);
            }
        }
        self
    }

    /// File the configuration was read from, if any
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Raw value for a key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Raw value for a key, or the default with a warning
    pub fn get_or(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(v) => v.to_string(),
            None => {
                warn!(key, default, "Configuration key missing, using default");
                default.to_string()
            }
        }
    }

    /// Parsed value for a key, or the default
    ///
    /// Missing keys warn, unparsable values log an error; neither fails.
    pub fn get_parsed<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr + std::fmt::Debug,
    {
        match self.get(key) {
            None => {
                warn!(key, ?default, "Configuration key missing, using default");
                default
            }
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                error!(key, value = raw, ?default, "Invalid configuration value, using default");
                default
            }),
        }
    }

    /// Boolean value for a key, `true`/`false` in any letter case
    pub fn get_flag(&self, key: &str, default: bool) -> bool {
        match self.get(key).map(str::trim) {
            None => {
                warn!(key, default, "Configuration key missing, using default");
                default
            }
            Some(raw) if raw.eq_ignore_ascii_case("true") => true,
            Some(raw) if raw.eq_ignore_ascii_case("false") => false,
            Some(raw) => {
                error!(key, value = raw, default, "Invalid configuration value, using default");
                default
            }
        }
    }

    fn optional(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Browser family to launch (`browser`, default `chrome`)
    pub fn browser(&self) -> String {
        self.get_or("browser", "chrome")
    }

    /// Window size (`browserSize`, default `1920x1080`)
    pub fn browser_size(&self) -> (u32, u32) {
        let raw = self.get_or("browserSize", "1920x1080");
        parse_size(&raw).unwrap_or_else(|| {
            error!(value = %raw, "Invalid browserSize, using 1920x1080");
            (1920, 1080)
        })
    }

    /// Page load timeout (`pageLoadTimeout`, default 20000)
    pub fn page_load_timeout_ms(&self) -> u64 {
        self.get_parsed("pageLoadTimeout", 20_000)
    }

    /// Element wait timeout (`elementTimeout`, default 10000)
    pub fn element_timeout_ms(&self) -> u64 {
        self.get_parsed("elementTimeout", 10_000)
    }

    /// General purpose timeout (`timeout`, default 5000)
    pub fn timeout_ms(&self) -> u64 {
        self.get_parsed("timeout", 5_000)
    }

    /// Wait polling interval (`pollInterval`, default 100)
    pub fn poll_interval_ms(&self) -> u64 {
        self.get_parsed("pollInterval", 100)
    }

    /// Attempts made for actions hitting stale elements (`staleRetries`, default 3)
    pub fn stale_retries(&self) -> u32 {
        self.get_parsed("staleRetries", 3)
    }

    /// Delay between stale retries (`staleRetryDelay`, default 500)
    pub fn stale_retry_delay_ms(&self) -> u64 {
        self.get_parsed("staleRetryDelay", 500)
    }

    /// Run without a visible window (`headless`, default false)
    pub fn headless(&self) -> bool {
        self.get_flag("headless", false)
    }

    /// Base URL for relative navigation (`base.url`)
    pub fn base_url(&self) -> String {
        self.get_or("base.url", "http://localhost")
    }

    /// Agoda entry point (`agoda.url`)
    pub fn agoda_url(&self) -> String {
        self.get_or("agoda.url", "https://www.agoda.com/")
    }

    /// Vietjet entry point (`vietjet.url`)
    pub fn vietjet_url(&self) -> String {
        self.get_or("vietjet.url", "https://www.vietjetair.com/")
    }

    /// Remote browser endpoint; empty means launch locally
    pub fn remote_grid_url(&self) -> Option<String> {
        self.optional("remoteGridUrl")
    }

    /// Explicit browser executable
    pub fn chrome_path(&self) -> Option<String> {
        self.optional("chromePath")
    }

    /// Directory downloads land in
    pub fn download_dir(&self) -> PathBuf {
        PathBuf::from(self.get_or("downloadDir", "target/downloads"))
    }

    /// Directory screenshots are written to
    pub fn screenshot_dir(&self) -> PathBuf {
        PathBuf::from(self.get_or("screenshotDir", "target/screenshots"))
    }

    /// Directory holding locator JSON files
    pub fn locator_dir(&self) -> PathBuf {
        PathBuf::from(self.get_or("locatorDir", "locators"))
    }

    /// Log level filter used when `RUST_LOG` is unset
    pub fn log_level(&self) -> String {
        self.get_or("logLevel", "info")
    }

    /// Log output format, `pretty` or `json`
    pub fn log_format(&self) -> String {
        self.get_or("logFormat", "pretty")
    }
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut BTreeMap<String, String>) {
    for (key, value) in table {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(inner) => flatten(&full, inner, out),
            toml::Value::String(s) => {
                out.insert(full, s.clone());
            }
            other => {
                out.insert(full, other.to_string());
            }
        }
    }
}

fn env_name(key: &str) -> String {
    let mut name = String::from(ENV_PREFIX);
    for (i, ch) in key.chars().enumerate() {
        if ch == '.' {
            name.push('_');
        } else if ch.is_ascii_uppercase() && i > 0 {
            name.push('_');
            name.push(ch);
        } else {
            name.push(ch.to_ascii_uppercase());
        }
    }
    name
}

fn parse_size(raw: &str) -> Option<(u32, u32)> {
    let (w, h) = raw.trim().split_once(['x', 'X', ','])?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
browser = "chrome"
browserSize = "1280x720"
elementTimeout = 10000
headless = true
"remoteGridUrl" = ""

[base]
url = "http://localhost:8080"

[agoda]
url = "https://www.agoda.com/"
"#;

    #[test]
    fn test_load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.source(), Some(file.path()));
        assert_eq!(config.element_timeout_ms(), 10_000);
        assert!(config.headless());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, PageError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let err = Config::from_toml_str("browser = ").unwrap_err();
        assert!(matches!(err, PageError::ConfigParse { .. }));
    }

    #[test]
    fn test_tables_flatten_to_dotted_keys() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.get("base.url"), Some("http://localhost:8080"));
        assert_eq!(config.base_url(), "http://localhost:8080");
        assert_eq!(config.agoda_url(), "https://www.agoda.com/");
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = Config::default();
        assert_eq!(config.element_timeout_ms(), 10_000);
        assert_eq!(config.page_load_timeout_ms(), 20_000);
        assert_eq!(config.timeout_ms(), 5_000);
        assert_eq!(config.stale_retries(), 3);
        assert_eq!(config.stale_retry_delay_ms(), 500);
        assert_eq!(config.browser(), "chrome");
        assert_eq!(config.browser_size(), (1920, 1080));
        assert!(!config.headless());
        assert_eq!(config.remote_grid_url(), None);
    }

    #[test]
    fn test_unparsable_value_falls_back() {
        let config = Config::from_pairs([("elementTimeout", "ten"), ("headless", "maybe")]);
        assert_eq!(config.element_timeout_ms(), 10_000);
        assert!(!config.headless());
    }

    #[test]
    fn test_browser_size_parses() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.browser_size(), (1280, 720));
        let bad = Config::from_pairs([("browserSize", "wide")]);
        assert_eq!(bad.browser_size(), (1920, 1080));
    }

    #[test]
    fn test_empty_remote_grid_is_none() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.remote_grid_url(), None);
        let remote = Config::from_pairs([("remoteGridUrl", "ws://grid:9222")]);
        assert_eq!(remote.remote_grid_url().as_deref(), Some("ws://grid:9222"));
    }

    #[test]
    fn test_env_names() {
        assert_eq!(env_name("browserSize"), "PAGECRAFT_BROWSER_SIZE");
        assert_eq!(env_name("agoda.url"), "PAGECRAFT_AGODA_URL");
        assert_eq!(env_name("headless"), "PAGECRAFT_HEADLESS");
    }

    #[test]
    fn test_env_overrides_known_keys_only() {
        let config = Config::from_toml_str(SAMPLE).unwrap().with_env_overrides([
            ("PAGECRAFT_ELEMENT_TIMEOUT".to_string(), "2500".to_string()),
            ("PAGECRAFT_UNRELATED".to_string(), "x".to_string()),
        ]);
        assert_eq!(config.element_timeout_ms(), 2_500);
        assert_eq!(config.get("UNRELATED"), None);
    }

    #[test]
    fn test_env_override_uses_word_boundaries() {
        let squashed = Config::default()
            .with_env_overrides([("PAGECRAFT_ELEMENTTIMEOUT".to_string(), "15000".to_string())]);
        assert_eq!(squashed.element_timeout_ms(), 10_000);
        let split = Config::default()
            .with_env_overrides([("PAGECRAFT_ELEMENT_TIMEOUT".to_string(), "15000".to_string())]);
        assert_eq!(split.element_timeout_ms(), 15_000);
    }

    #[test]
    fn test_headless_ignores_case() {
        for raw in ["TRUE", "True", " true "] {
            assert!(Config::from_pairs([("headless", raw)]).headless(), "{raw:?}");
        }
        assert!(!Config::from_pairs([("headless", "FALSE")]).headless());
        assert!(!Config::from_pairs([("headless", "yes")]).headless());
        let from_env = Config::default()
            .with_env_overrides([("PAGECRAFT_HEADLESS".to_string(), "TRUE".to_string())]);
        assert!(from_env.headless());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_element_timeout_round_trips(ms in 0u64..10_000_000) {
                let config = Config::from_toml_str(&format!("elementTimeout = {ms}")).unwrap();
                prop_assert_eq!(config.element_timeout_ms(), ms);
            }
        }
    }
}
