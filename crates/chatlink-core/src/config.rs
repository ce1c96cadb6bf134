use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_BRAND_NAME: &str = "BlackinBot";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Typed process configuration.
#[derive(Clone, Debug)]
pub struct Config {
    // Record store
    pub store_url: String,
    pub store_service_key: String,

    // Telegram
    pub telegram_api_url: String,

    // Runtime
    pub request_timeout: Duration,

    // Confirmation notice
    pub brand_name: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"))?;
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let store_url = get("SUPABASE_URL").ok_or_else(|| {
            Error::Config("SUPABASE_URL environment variable is required".to_string())
        })?;
        let store_service_key = get("SUPABASE_SERVICE_KEY").ok_or_else(|| {
            Error::Config("SUPABASE_SERVICE_KEY environment variable is required".to_string())
        })?;

        let telegram_api_url =
            get("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string());

        let request_timeout = match get("REQUEST_TIMEOUT_MS") {
            Some(raw) => {
                let ms = raw.trim().parse::<u64>().map_err(|_| {
                    Error::Config(format!("REQUEST_TIMEOUT_MS must be an integer, got {raw:?}"))
                })?;
                if ms == 0 {
                    return Err(Error::Config(
                        "REQUEST_TIMEOUT_MS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_millis(ms)
            }
            None => Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        };

        let brand_name = get("BRAND_NAME").unwrap_or_else(|| DEFAULT_BRAND_NAME.to_string());

        Ok(Self {
            store_url: store_url.trim_end_matches('/').to_string(),
            store_service_key,
            telegram_api_url: telegram_api_url.trim_end_matches('/').to_string(),
            request_timeout,
            brand_name,
        })
    }
}

fn load_dotenv_if_present(path: &Path) -> Result<()> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, unquote(v.trim()));
    }
    Ok(())
}

fn unquote(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_keys_missing() {
        let cfg = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://db.example.co/"),
            ("SUPABASE_SERVICE_KEY", "svc"),
        ]))
        .unwrap();

        assert_eq!(cfg.store_url, "https://db.example.co");
        assert_eq!(cfg.telegram_api_url, DEFAULT_TELEGRAM_API_URL);
        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
        assert_eq!(cfg.brand_name, DEFAULT_BRAND_NAME);
    }

    #[test]
    fn missing_store_url_is_config_error() {
        let err = Config::from_lookup(lookup(&[("SUPABASE_SERVICE_KEY", "svc")])).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("SUPABASE_URL")));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let err = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://db.example.co"),
            ("SUPABASE_SERVICE_KEY", "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("SUPABASE_SERVICE_KEY")));
    }

    #[test]
    fn timeout_must_be_positive_integer() {
        let base = [
            ("SUPABASE_URL", "https://db.example.co"),
            ("SUPABASE_SERVICE_KEY", "svc"),
        ];

        let mut bad = base.to_vec();
        bad.push(("REQUEST_TIMEOUT_MS", "soon"));
        assert!(Config::from_lookup(lookup(&bad)).is_err());

        let mut zero = base.to_vec();
        zero.push(("REQUEST_TIMEOUT_MS", "0"));
        assert!(Config::from_lookup(lookup(&zero)).is_err());

        let mut ok = base.to_vec();
        ok.push(("REQUEST_TIMEOUT_MS", "2500"));
        let cfg = Config::from_lookup(lookup(&ok)).unwrap();
        assert_eq!(cfg.request_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn unquote_strips_matching_quotes_only() {
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("'abc'"), "abc");
        assert_eq!(unquote("\"abc'"), "\"abc'");
        assert_eq!(unquote("x"), "x");
    }

    #[test]
    fn missing_dotenv_is_ignored() {
        assert!(load_dotenv_if_present(Path::new("definitely-missing.env")).is_ok());
    }

    #[test]
    fn unreadable_dotenv_is_io_error() {
        let dir = env::temp_dir();
        assert!(matches!(load_dotenv_if_present(&dir), Err(Error::Io(_))));
    }
}
