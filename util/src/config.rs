//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub grade_cache_path: String,
    pub circuit_breaker_reset_secs: u64,
    pub max_content_chars: usize,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// This method is used internally to populate the singleton. It panics
    /// if required variables are missing or improperly formatted.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "grading-core".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "grader=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "grader.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-pro".into()),
            grade_cache_path: env::var("GRADE_CACHE_PATH")
                .unwrap_or_else(|_| "grade_cache.json".into()),
            circuit_breaker_reset_secs: env::var("CIRCUIT_BREAKER_RESET_SECS")
                .unwrap_or_else(|_| "60".into())
                .parse()
                .unwrap(),
            max_content_chars: env::var("MAX_CONTENT_CHARS")
                .unwrap_or_else(|_| "120000".into())
                .parse()
                .unwrap(),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    /// Override `env` value.
    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_project_name(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.project_name = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_log_file(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_file = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_gemini_api_key(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.gemini_api_key = value.into());
    }

    pub fn set_gemini_model(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.gemini_model = value.into());
    }

    pub fn set_grade_cache_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.grade_cache_path = value.into());
    }

    pub fn set_circuit_breaker_reset_secs(value: impl Into<u64>) {
        AppConfig::set_field(|cfg| cfg.circuit_breaker_reset_secs = value.into());
    }

    pub fn set_max_content_chars(value: impl Into<usize>) {
        AppConfig::set_field(|cfg| cfg.max_content_chars = value.into());
    }
}

// --- Convenience accessors (clone out of the read guard) ---

pub fn gemini_api_key() -> String {
    AppConfig::global().gemini_api_key.clone()
}

pub fn gemini_model() -> String {
    AppConfig::global().gemini_model.clone()
}

pub fn grade_cache_path() -> String {
    AppConfig::global().grade_cache_path.clone()
}

pub fn circuit_breaker_reset_secs() -> u64 {
    AppConfig::global().circuit_breaker_reset_secs
}

pub fn max_content_chars() -> usize {
    AppConfig::global().max_content_chars
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults_without_env_overrides() {
        AppConfig::reset();
        assert_eq!(gemini_model(), "gemini-2.5-pro");
        assert_eq!(grade_cache_path(), "grade_cache.json");
        assert_eq!(circuit_breaker_reset_secs(), 60);
        assert_eq!(max_content_chars(), 120000);
    }

    #[test]
    #[serial]
    fn test_setters_override_and_reset_restores() {
        AppConfig::set_gemini_model("gemini-test");
        AppConfig::set_grade_cache_path("/tmp/cache.json");
        AppConfig::set_circuit_breaker_reset_secs(5u64);
        AppConfig::set_log_to_stdout(true);

        assert_eq!(gemini_model(), "gemini-test");
        assert_eq!(grade_cache_path(), "/tmp/cache.json");
        assert_eq!(circuit_breaker_reset_secs(), 5);
        assert!(log_to_stdout());

        AppConfig::reset();
        assert_eq!(gemini_model(), "gemini-2.5-pro");
    }
}
