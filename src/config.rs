//! Application configuration loaded from environment variables.
//!
//! Every value has a default so the client starts against a local backend
//! with no environment at all:
//! - `TORMENTUS_API_URL`: REST base URL (default `http://localhost:8080`)
//! - `TORMENTUS_WS_URL`: feed endpoint (default: API URL with a `ws`
//!   scheme and `/ws` path)
//! - `TORMENTUS_RECONNECT_DELAY_MS`: fixed delay between reconnects
//! - `TORMENTUS_MAX_RECONNECT_ATTEMPTS`: give up after this many
//!   consecutive failures (unset means retry forever)
//! - `TORMENTUS_REQUEST_TIMEOUT_SECS`: REST request timeout
//! - `TORMENTUS_SYMBOLS`: comma-separated symbols opened as tabs at start
//! - `TORMENTUS_CHART_CANDLES`: candle buffer length
//! - `TORMENTUS_LOG_FILE`: tracing output file
//! - `TORMENTUS_SESSION_FILE`: store the session in a JSON file instead of
//!   the OS keychain

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::TormentusError;

/// Default REST base URL.
const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Default delay between reconnection attempts.
const DEFAULT_RECONNECT_DELAY_MS: u64 = 3_000;

/// Default REST request timeout.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default symbol opened when none are configured.
const DEFAULT_SYMBOL: &str = "BTC/USDT";

/// Default number of candles kept in the chart buffer.
const DEFAULT_CHART_CANDLES: usize = 100;

/// Default tracing output file.
const DEFAULT_LOG_FILE: &str = "tormentus.log";

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub feed: FeedConfig,
    pub ui: UiConfig,
    pub log_file: PathBuf,
    pub session_file: Option<PathBuf>,
}

/// REST endpoint settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

/// Price feed settings.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub websocket_url: String,
    pub reconnect: ReconnectPolicy,
}

/// Dashboard settings.
#[derive(Debug, Clone)]
pub struct UiConfig {
    /// Symbols subscribed at startup; never empty.
    pub symbols: Vec<String>,
    pub chart_candles: usize,
}

/// Fixed-delay reconnect policy for the feed connection.
///
/// There is no backoff or jitter: every attempt waits exactly `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    /// Consecutive failed attempts tolerated before giving up.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Returns `true` once `failures` consecutive failures exhaust the policy.
    pub fn exhausted(&self, failures: u32) -> bool {
        self.max_attempts.is_some_and(|max| failures >= max)
    }
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`TormentusError::Config`] if a numeric variable does not
/// parse, the API URL has no `http`/`https` scheme, or the chart length
/// is zero.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let base_url = non_empty_var("TORMENTUS_API_URL")
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
        .trim_end_matches('/')
        .to_string();

    let websocket_url = match non_empty_var("TORMENTUS_WS_URL") {
        Some(url) => url,
        None => derive_websocket_url(&base_url)?,
    };

    let delay_ms = parsed_var("TORMENTUS_RECONNECT_DELAY_MS")?.unwrap_or(DEFAULT_RECONNECT_DELAY_MS);
    let max_attempts = parsed_var::<u32>("TORMENTUS_MAX_RECONNECT_ATTEMPTS")?;
    if max_attempts == Some(0) {
        return Err(TormentusError::Config(
            "TORMENTUS_MAX_RECONNECT_ATTEMPTS must be at least 1".to_string(),
        ));
    }

    let timeout_secs =
        parsed_var("TORMENTUS_REQUEST_TIMEOUT_SECS")?.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

    let chart_candles = parsed_var("TORMENTUS_CHART_CANDLES")?.unwrap_or(DEFAULT_CHART_CANDLES);
    if chart_candles == 0 {
        return Err(TormentusError::Config(
            "TORMENTUS_CHART_CANDLES must be at least 1".to_string(),
        ));
    }

    let symbols = non_empty_var("TORMENTUS_SYMBOLS")
        .map(|raw| parse_symbols(&raw))
        .filter(|symbols| !symbols.is_empty())
        .unwrap_or_else(|| vec![DEFAULT_SYMBOL.to_string()]);

    Ok(AppConfig {
        api: ApiConfig {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
        },
        feed: FeedConfig {
            websocket_url,
            reconnect: ReconnectPolicy {
                delay: Duration::from_millis(delay_ms),
                max_attempts,
            },
        },
        ui: UiConfig {
            symbols,
            chart_candles,
        },
        log_file: non_empty_var("TORMENTUS_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        session_file: non_empty_var("TORMENTUS_SESSION_FILE").map(PathBuf::from),
    })
}

/// Builds the feed URL from the REST base URL (`http` -> `ws`, `https` -> `wss`).
fn derive_websocket_url(base_url: &str) -> crate::Result<String> {
    if let Some(rest) = base_url.strip_prefix("https://") {
        Ok(format!("wss://{rest}/ws"))
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        Ok(format!("ws://{rest}/ws"))
    } else {
        Err(TormentusError::Config(format!(
            "TORMENTUS_API_URL must start with http:// or https://, got {base_url}"
        )))
    }
}

/// Splits a comma-separated symbol list, dropping blanks and duplicates.
fn parse_symbols(raw: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !symbols.iter().any(|s| s == symbol) {
            symbols.push(symbol.to_string());
        }
    }
    symbols
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Parses a non-empty environment variable, reporting which one failed.
fn parsed_var<T: FromStr>(name: &str) -> crate::Result<Option<T>> {
    match non_empty_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| TormentusError::Config(format!("{name} has invalid value {raw:?}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: [&str; 9] = [
        "TORMENTUS_API_URL",
        "TORMENTUS_WS_URL",
        "TORMENTUS_RECONNECT_DELAY_MS",
        "TORMENTUS_MAX_RECONNECT_ATTEMPTS",
        "TORMENTUS_REQUEST_TIMEOUT_SECS",
        "TORMENTUS_SYMBOLS",
        "TORMENTUS_CHART_CANDLES",
        "TORMENTUS_LOG_FILE",
        "TORMENTUS_SESSION_FILE",
    ];

    /// Serializes tests that touch the process environment.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    /// Helper that clears every config var, applies `vars`, runs `f`, then
    /// restores originals. Holds [`ENV_LOCK`] for the whole run.
    fn with_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let originals: Vec<(&str, Option<String>)> = ALL_VARS
            .iter()
            .map(|k| (*k, std::env::var(k).ok()))
            .collect();

        // SAFETY: ENV_LOCK keeps other config tests from reading concurrently.
        unsafe {
            for k in ALL_VARS {
                std::env::remove_var(k);
            }
            for (k, v) in vars {
                std::env::set_var(k, v);
            }
        }

        f();

        for (k, original) in originals {
            // SAFETY: restoring original values while still holding ENV_LOCK.
            unsafe {
                match original {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn defaults_without_env_vars() {
        with_env(&[], || {
            let config = fetch_config().unwrap();
            assert_eq!(config.api.base_url, DEFAULT_API_URL);
            assert_eq!(config.feed.websocket_url, "ws://localhost:8080/ws");
            assert_eq!(config.feed.reconnect, ReconnectPolicy::default());
            assert_eq!(config.feed.reconnect.delay, Duration::from_secs(3));
            assert_eq!(config.ui.symbols, vec!["BTC/USDT".to_string()]);
            assert_eq!(config.ui.chart_candles, 100);
            assert!(config.session_file.is_none());
        });
    }

    #[test]
    fn https_api_derives_wss_feed() {
        with_env(&[("TORMENTUS_API_URL", "https://trade.example.com/")], || {
            let config = fetch_config().unwrap();
            assert_eq!(config.api.base_url, "https://trade.example.com");
            assert_eq!(config.feed.websocket_url, "wss://trade.example.com/ws");
        });
    }

    #[test]
    fn explicit_feed_url_wins() {
        with_env(
            &[
                ("TORMENTUS_API_URL", "https://trade.example.com"),
                ("TORMENTUS_WS_URL", "wss://feed.example.com/stream"),
            ],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.feed.websocket_url, "wss://feed.example.com/stream");
            },
        );
    }

    #[test]
    fn rejects_api_url_without_scheme() {
        with_env(&[("TORMENTUS_API_URL", "trade.example.com")], || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("must start with http"));
        });
    }

    #[test]
    fn reconnect_policy_from_env() {
        with_env(
            &[
                ("TORMENTUS_RECONNECT_DELAY_MS", "250"),
                ("TORMENTUS_MAX_RECONNECT_ATTEMPTS", "5"),
            ],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.feed.reconnect.delay, Duration::from_millis(250));
                assert_eq!(config.feed.reconnect.max_attempts, Some(5));
            },
        );
    }

    #[test]
    fn rejects_unparsable_numbers() {
        with_env(&[("TORMENTUS_RECONNECT_DELAY_MS", "soon")], || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("TORMENTUS_RECONNECT_DELAY_MS"));
        });
    }

    #[test]
    fn rejects_zero_max_attempts() {
        with_env(&[("TORMENTUS_MAX_RECONNECT_ATTEMPTS", "0")], || {
            assert!(fetch_config().is_err());
        });
    }

    #[test]
    fn symbols_are_trimmed_and_deduplicated() {
        with_env(
            &[("TORMENTUS_SYMBOLS", " ETH/USDT, BTC/USDT ,,ETH/USDT")],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.ui.symbols, vec!["ETH/USDT", "BTC/USDT"]);
            },
        );
    }

    #[test]
    fn blank_symbol_list_falls_back_to_default() {
        with_env(&[("TORMENTUS_SYMBOLS", " , ")], || {
            let config = fetch_config().unwrap();
            assert_eq!(config.ui.symbols, vec![DEFAULT_SYMBOL]);
        });
    }

    #[test]
    fn policy_exhaustion() {
        let unlimited = ReconnectPolicy::default();
        assert!(!unlimited.exhausted(u32::MAX));

        let capped = ReconnectPolicy {
            delay: Duration::from_millis(1),
            max_attempts: Some(3),
        };
        assert!(!capped.exhausted(2));
        assert!(capped.exhausted(3));
    }
}
