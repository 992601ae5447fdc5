//! Environment variable names and defaults used by the summary service.

/// REST bind address.
pub const REST_ADDR_ENV: &str = "EHR_SUMMARY_REST_ADDR";
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Narrative generator: `template` or `remote`.
pub const GENERATOR_ENV: &str = "EHR_SUMMARY_GENERATOR";

/// Chat-completions endpoint for the remote generator.
pub const LLM_URL_ENV: &str = "EHR_SUMMARY_LLM_URL";
pub const LLM_MODEL_ENV: &str = "EHR_SUMMARY_LLM_MODEL";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const LLM_API_KEY_ENV: &str = "EHR_SUMMARY_LLM_API_KEY";
pub const LLM_TIMEOUT_SECS_ENV: &str = "EHR_SUMMARY_LLM_TIMEOUT_SECS";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

/// Number of cached summaries; 0 disables the cache.
pub const CACHE_CAPACITY_ENV: &str = "EHR_SUMMARY_CACHE_CAPACITY";
pub const DEFAULT_CACHE_CAPACITY: usize = 256;
