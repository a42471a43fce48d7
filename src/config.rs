//! Runtime configuration from the environment and `.env`

use std::env::VarError;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub request_timeout_secs: u64,
    /// Upper bound accepted for a search target count.
    pub max_count: usize,
    pub default_count: usize,
    /// Multiplier applied to every marketplace's inter-page delay; `0` disables it.
    pub delay_scale: f64,
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            max_count: 100,
            default_count: 30,
            delay_scale: 1.0,
        }
    }
}

/// Load configuration, reading `.env` first if present.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key))
}

/// Build configuration from an env-var lookup function.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an invalid value.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|e| invalid(var, e.to_string())),
            Err(_) => Ok(default),
        }
    };

    let parse_count = |var: &str, default: usize| -> Result<usize, ConfigError> {
        let value = match lookup(var) {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|e| invalid(var, e.to_string()))?,
            Err(_) => default,
        };
        if value == 0 {
            return Err(invalid(var, "must be at least 1".to_string()));
        }
        Ok(value)
    };

    let defaults = AppConfig::default();

    let request_timeout_secs = parse_u64("RANK_FETCHER_TIMEOUT_SECS", defaults.request_timeout_secs)?;
    let max_count = parse_count("RANK_FETCHER_MAX_COUNT", defaults.max_count)?;
    let default_count = parse_count("RANK_FETCHER_DEFAULT_COUNT", defaults.default_count.min(max_count))?;
    if default_count > max_count {
        return Err(invalid(
            "RANK_FETCHER_DEFAULT_COUNT",
            format!("must not exceed RANK_FETCHER_MAX_COUNT ({max_count})"),
        ));
    }

    let delay_scale = match lookup("RANK_FETCHER_DELAY_SCALE") {
        Ok(raw) => {
            let scale = raw
                .trim()
                .parse::<f64>()
                .map_err(|e| invalid("RANK_FETCHER_DELAY_SCALE", e.to_string()))?;
            if !scale.is_finite() || scale < 0.0 {
                return Err(invalid(
                    "RANK_FETCHER_DELAY_SCALE",
                    "must be a non-negative number".to_string(),
                ));
            }
            scale
        }
        Err(_) => defaults.delay_scale,
    };

    Ok(AppConfig {
        request_timeout_secs,
        max_count,
        default_count,
        delay_scale,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    fn assert_invalid(result: Result<AppConfig, ConfigError>, expected: &str) {
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == expected),
            "expected InvalidEnvVar({expected}), got: {result:?}"
        );
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let map = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn overrides_are_applied() {
        let map = HashMap::from([
            ("RANK_FETCHER_TIMEOUT_SECS", "25"),
            ("RANK_FETCHER_MAX_COUNT", "50"),
            ("RANK_FETCHER_DEFAULT_COUNT", " 12 "),
            ("RANK_FETCHER_DELAY_SCALE", "0"),
        ]);
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.request_timeout_secs, 25);
        assert_eq!(cfg.max_count, 50);
        assert_eq!(cfg.default_count, 12);
        assert_eq!(cfg.delay_scale, 0.0);
    }

    #[test]
    fn small_max_count_lowers_the_default() {
        let map = HashMap::from([("RANK_FETCHER_MAX_COUNT", "20")]);
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.default_count, 20);
    }

    #[test]
    fn timeout_must_be_a_number() {
        let map = HashMap::from([("RANK_FETCHER_TIMEOUT_SECS", "soon")]);
        assert_invalid(build_app_config(lookup_from_map(&map)), "RANK_FETCHER_TIMEOUT_SECS");
    }

    #[test]
    fn zero_max_count_is_rejected() {
        let map = HashMap::from([("RANK_FETCHER_MAX_COUNT", "0")]);
        assert_invalid(build_app_config(lookup_from_map(&map)), "RANK_FETCHER_MAX_COUNT");
    }

    #[test]
    fn default_count_above_max_is_rejected() {
        let map = HashMap::from([
            ("RANK_FETCHER_MAX_COUNT", "10"),
            ("RANK_FETCHER_DEFAULT_COUNT", "11"),
        ]);
        assert_invalid(build_app_config(lookup_from_map(&map)), "RANK_FETCHER_DEFAULT_COUNT");
    }

    #[test]
    fn negative_delay_scale_is_rejected() {
        let map = HashMap::from([("RANK_FETCHER_DELAY_SCALE", "-1.5")]);
        assert_invalid(build_app_config(lookup_from_map(&map)), "RANK_FETCHER_DELAY_SCALE");

        let map = HashMap::from([("RANK_FETCHER_DELAY_SCALE", "NaN")]);
        assert_invalid(build_app_config(lookup_from_map(&map)), "RANK_FETCHER_DELAY_SCALE");
    }
}
