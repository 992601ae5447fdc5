//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Environment variables are never read during request handling.

use crate::constants::{
    CACHE_CAPACITY_ENV, DEFAULT_CACHE_CAPACITY, DEFAULT_LLM_MODEL, DEFAULT_LLM_TIMEOUT_SECS,
    DEFAULT_REST_ADDR, GENERATOR_ENV, LLM_API_KEY_ENV, LLM_MODEL_ENV, LLM_TIMEOUT_SECS_ENV,
    LLM_URL_ENV, REST_ADDR_ENV,
};
use crate::generation::RemoteSettings;
use crate::{SummaryError, SummaryResult};
use std::str::FromStr;
use std::time::Duration;

/// Which narrative generator writes the overview.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeneratorKind {
    Template,
    Remote(RemoteSettings),
}

/// Configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryConfig {
    rest_addr: String,
    generator: GeneratorKind,
    cache_capacity: usize,
}

impl SummaryConfig {
    pub fn new(
        rest_addr: impl Into<String>,
        generator: GeneratorKind,
        cache_capacity: usize,
    ) -> SummaryResult<Self> {
        let rest_addr = rest_addr.into();
        if rest_addr.trim().is_empty() {
            return Err(SummaryError::InvalidConfig(format!(
                "{REST_ADDR_ENV} cannot be empty"
            )));
        }
        if let GeneratorKind::Remote(settings) = &generator {
            if settings.url.trim().is_empty() {
                return Err(SummaryError::InvalidConfig(format!(
                    "{LLM_URL_ENV} is required when {GENERATOR_ENV}=remote"
                )));
            }
            if settings.timeout.is_zero() {
                return Err(SummaryError::InvalidConfig(format!(
                    "{LLM_TIMEOUT_SECS_ENV} must be greater than zero"
                )));
            }
        }
        Ok(Self {
            rest_addr,
            generator,
            cache_capacity,
        })
    }

    /// Reads the process environment.
    pub fn from_env() -> SummaryResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration from any variable source. Unset and blank variables take their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SummaryResult<Self> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let rest_addr = get(REST_ADDR_ENV).unwrap_or_else(|| DEFAULT_REST_ADDR.to_string());
        let cache_capacity = parse_or(get(CACHE_CAPACITY_ENV), CACHE_CAPACITY_ENV, DEFAULT_CACHE_CAPACITY)?;

        let generator = match get(GENERATOR_ENV).map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("template") => GeneratorKind::Template,
            Some("remote") => {
                let timeout_secs =
                    parse_or(get(LLM_TIMEOUT_SECS_ENV), LLM_TIMEOUT_SECS_ENV, DEFAULT_LLM_TIMEOUT_SECS)?;
                GeneratorKind::Remote(RemoteSettings {
                    url: get(LLM_URL_ENV).unwrap_or_default(),
                    model: get(LLM_MODEL_ENV).unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
                    api_key: get(LLM_API_KEY_ENV),
                    timeout: Duration::from_secs(timeout_secs),
                })
            }
            Some(other) => {
                return Err(SummaryError::InvalidConfig(format!(
                    "{GENERATOR_ENV} must be `template` or `remote`, got {other:?}"
                )))
            }
        };

        Self::new(rest_addr, generator, cache_capacity)
    }

    pub fn rest_addr(&self) -> &str {
        &self.rest_addr
    }

    pub fn generator(&self) -> &GeneratorKind {
        &self.generator
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            rest_addr: DEFAULT_REST_ADDR.to_string(),
            generator: GeneratorKind::Template,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, name: &str, default: T) -> SummaryResult<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| SummaryError::InvalidConfig(format!("{name} is not a valid number: {raw:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)]) -> SummaryResult<SummaryConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SummaryConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = resolve(&[]).expect("defaults");
        assert_eq!(config, SummaryConfig::default());
        assert_eq!(config.rest_addr(), "0.0.0.0:3000");
        assert_eq!(config.cache_capacity(), 256);
        assert_eq!(config.generator(), &GeneratorKind::Template);
    }

    #[test]
    fn test_remote_generator_settings() {
        let config = resolve(&[
            (GENERATOR_ENV, "Remote"),
            (LLM_URL_ENV, "http://localhost:8080/v1/chat/completions"),
            (LLM_TIMEOUT_SECS_ENV, "5"),
        ])
        .expect("remote config");

        let GeneratorKind::Remote(settings) = config.generator() else {
            panic!("expected remote generator");
        };
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn test_remote_generator_requires_url() {
        let err = resolve(&[(GENERATOR_ENV, "remote")]).expect_err("url required");
        assert!(matches!(err, SummaryError::InvalidConfig(msg) if msg.contains(LLM_URL_ENV)));
    }

    #[test]
    fn test_rejects_unknown_generator_and_bad_numbers() {
        assert!(matches!(
            resolve(&[(GENERATOR_ENV, "gpt")]),
            Err(SummaryError::InvalidConfig(_))
        ));
        assert!(matches!(
            resolve(&[(CACHE_CAPACITY_ENV, "lots")]),
            Err(SummaryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_blank_values_take_defaults() {
        let config = resolve(&[(REST_ADDR_ENV, "  "), (CACHE_CAPACITY_ENV, "0")]).expect("config");
        assert_eq!(config.rest_addr(), DEFAULT_REST_ADDR);
        assert_eq!(config.cache_capacity(), 0);
    }
}
