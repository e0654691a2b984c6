use crate::config::{Config, DataSource};
use std::env;
use std::sync::Mutex;
use std::sync::OnceLock;

// Global lock to prevent race conditions when modifying environment variables in tests
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn get_env_lock() -> &'static Mutex<()> {
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

const KEYS: &[&str] = &[
    "DATA_SOURCE",
    "MASSIVE_API_KEY",
    "MASSIVE_BASE_URL",
    "MASSIVE_MAX_CALLS_PER_MINUTE",
    "CSV_DATA_DIR",
    "FORECAST_EPOCHS",
    "TRAINING_EPOCHS",
    "FORECAST_BATCH_SIZE",
    "FORECAST_DEFAULT_DAYS",
    "FORECAST_MAX_CONCURRENCY",
    "FORECAST_LEARNING_RATE",
    "FORECAST_SEED",
    "OBSERVABILITY_ENABLED",
    "OBSERVABILITY_INTERVAL",
];

fn set(key: &str, value: &str) {
    // SAFETY: env-mutating tests hold ENV_LOCK
    unsafe { env::set_var(key, value) };
}

fn clear_all() {
    for key in KEYS {
        // SAFETY: env-mutating tests hold ENV_LOCK
        unsafe { env::remove_var(key) };
    }
}

#[test]
fn test_config_defaults() {
    let _guard = get_env_lock().lock().unwrap();
    clear_all();

    let config = Config::from_env().unwrap();

    assert_eq!(config.data_source, DataSource::Mock);
    assert_eq!(config.massive_base_url, "https://api.polygon.io");
    assert_eq!(config.massive_max_calls_per_minute, 5);
    assert_eq!(config.csv_data_dir, "data/prices");
    assert_eq!(config.forecast_epochs, 15);
    assert_eq!(config.training_epochs, 25);
    assert_eq!(config.batch_size, 32);
    assert_eq!(config.default_days, 7);
    assert_eq!(config.max_concurrency, 2);
    assert!((config.learning_rate - 0.001).abs() < 1e-12);
    assert_eq!(config.seed, None);
    assert!(config.observability_enabled);
    assert_eq!(config.observability_interval_seconds, 60);
}

#[test]
fn test_config_overrides() {
    let _guard = get_env_lock().lock().unwrap();
    clear_all();
    set("DATA_SOURCE", "Massive");
    set("MASSIVE_API_KEY", "abc123");
    set("FORECAST_EPOCHS", "5");
    set("TRAINING_EPOCHS", "40");
    set("FORECAST_DEFAULT_DAYS", "14");
    set("FORECAST_SEED", "42");
    set("OBSERVABILITY_ENABLED", "false");

    let config = Config::from_env().unwrap();

    assert_eq!(config.data_source, DataSource::Massive);
    assert_eq!(config.massive_api_key, "abc123");
    assert_eq!(config.forecast_epochs, 5);
    assert_eq!(config.default_days, 14);
    assert!(!config.observability_enabled);

    let settings = config.training_settings();
    assert_eq!(settings.epochs, 40);
    assert_eq!(settings.seed, Some(42));
    assert_eq!(config.forecast_settings().epochs, 5);

    clear_all();
}

#[test]
fn test_unparseable_numbers_fall_back_to_defaults() {
    let _guard = get_env_lock().lock().unwrap();
    clear_all();
    set("FORECAST_EPOCHS", "lots");
    set("MASSIVE_MAX_CALLS_PER_MINUTE", "0");

    let config = Config::from_env().unwrap();

    assert_eq!(config.forecast_epochs, 15);
    assert_eq!(config.massive_max_calls_per_minute, 5);

    clear_all();
}

#[test]
fn test_invalid_data_source_is_rejected() {
    let _guard = get_env_lock().lock().unwrap();
    clear_all();
    set("DATA_SOURCE", "bloomberg");

    assert!(Config::from_env().is_err());

    clear_all();
}

#[test]
fn test_default_days_out_of_range_is_rejected() {
    let _guard = get_env_lock().lock().unwrap();
    clear_all();
    set("FORECAST_DEFAULT_DAYS", "45");
    assert!(Config::from_env().is_err());

    set("FORECAST_DEFAULT_DAYS", "7");
    set("FORECAST_MAX_CONCURRENCY", "0");
    assert!(Config::from_env().is_err());

    clear_all();
}
