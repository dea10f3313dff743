use super::*;
use serde_json::json;
use std::io::Write;

#[test]
fn test_embedded_defaults_match_struct_defaults() {
    let config = TaskpoolConfig::embedded_defaults().expect("Should load default config");
    assert_eq!(config, TaskpoolConfig::default());
    assert_eq!(config.anomaly.history_capacity, 20);
    assert_eq!(config.anomaly.slack_percent, 10);
    assert_eq!(config.tasks.count, 100);
    assert_eq!((config.tasks.min, config.tasks.max), (3, 1000));
}

#[test]
fn test_custom_config_file_overrides_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[pool]\nworkers = 3\n\n[anomaly]\nslack_percent = 25").unwrap();

    let figment = TaskpoolConfig::figment(Some(file.path()), None::<()>, "TASKPOOL_TEST_FILE_").unwrap();
    let config: TaskpoolConfig = figment.extract().unwrap();

    assert_eq!(config.pool.workers, 3);
    assert_eq!(config.anomaly.slack_percent, 25);
    // Untouched keys keep their defaults
    assert_eq!(config.anomaly.history_capacity, 20);
}

#[test]
fn test_json_config_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"tasks": {{"count": 7, "seed": 9}}}}"#).unwrap();

    let figment = TaskpoolConfig::figment(Some(file.path()), None::<()>, "TASKPOOL_TEST_JSON_").unwrap();
    let config: TaskpoolConfig = figment.extract().unwrap();

    assert_eq!(config.tasks.count, 7);
    assert_eq!(config.tasks.seed, Some(9));
}

#[test]
fn test_missing_custom_config_is_an_error() {
    let result = TaskpoolConfig::figment(
        Some(std::path::Path::new("definitely_missing_taskpool.toml")),
        None::<()>,
        "TASKPOOL_TEST_MISSING_",
    );
    assert!(result.is_err());
}

#[test]
fn test_environment_overrides_nested_keys() {
    unsafe {
        std::env::set_var("TASKPOOL_TEST_ENV_POOL__WORKERS", "5");
        std::env::set_var("TASKPOOL_TEST_ENV_TASKS__MAX", "50");
    }

    let figment = TaskpoolConfig::figment(None, None::<()>, "TASKPOOL_TEST_ENV_").unwrap();
    let config: TaskpoolConfig = figment.extract().unwrap();

    assert_eq!(config.pool.workers, 5);
    assert_eq!(config.tasks.max, 50);
}

#[test]
fn test_cli_overrides_win() {
    unsafe {
        std::env::set_var("TASKPOOL_TEST_CLI_POOL__WORKERS", "5");
    }

    let overrides = json!({ "pool": { "workers": 9 }, "tasks": { "count": 4 } });
    let figment = TaskpoolConfig::figment(None, Some(overrides), "TASKPOOL_TEST_CLI_").unwrap();
    let config: TaskpoolConfig = figment.extract().unwrap();

    assert_eq!(config.pool.workers, 9);
    assert_eq!(config.tasks.count, 4);
    assert_eq!(config.tasks.max, 1000);
}

#[test]
fn test_validation() {
    assert!(TaskpoolConfig::default().validate().is_ok());

    let mut config = TaskpoolConfig::default();
    config.anomaly.history_capacity = 0;
    assert!(config.validate().is_err());

    let mut config = TaskpoolConfig::default();
    config.pool.channel_buffer_multiplier = 0;
    assert!(config.validate().is_err());

    let mut config = TaskpoolConfig::default();
    config.tasks.min = 10;
    config.tasks.max = 3;
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_oversized_allocations() {
    let mut config = TaskpoolConfig::default();
    config.anomaly.history_capacity = 1_000_000_000_000;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("history_capacity"));

    config.anomaly.history_capacity = crate::parallel::history::MAX_HISTORY_CAPACITY;
    assert!(config.validate().is_ok());

    let mut config = TaskpoolConfig::default();
    config.pool.workers = 4;
    config.pool.channel_buffer_multiplier = usize::MAX;
    assert!(config.validate().is_err());

    let mut config = TaskpoolConfig::default();
    config.pool.workers = 1_000_000;
    assert!(config.validate().is_err());
}

#[test]
fn test_pool_settings_conversion() {
    let mut config = TaskpoolConfig::default();
    config.pool.workers = 4;
    config.pool.simulated_delay_ms = 5;
    config.anomaly.history_capacity = 8;
    config.anomaly.slack_percent = 30;

    let settings = config.pool_settings();
    assert_eq!(settings.workers, 4);
    assert_eq!(settings.history_capacity, 8);
    assert_eq!(settings.policy, AnomalyPolicy::new(30));
    assert!(settings.delay.is_some());
    assert!(TaskpoolConfig::default().pool_settings().delay.is_none());
}

#[test]
fn test_task_source_conversion() {
    let mut config = TaskpoolConfig::default();
    config.tasks.count = 12;
    assert_eq!(config.task_source().unwrap().len(), 12);

    config.tasks.min = 5;
    config.tasks.max = 1;
    assert!(config.task_source().is_err());
}

#[test]
fn test_serialization_round_trip_through_toml() {
    let mut config = TaskpoolConfig::default();
    config.tasks.seed = Some(42);

    let rendered = config.to_toml().unwrap();
    assert!(rendered.contains("seed = 42"));
    let parsed: TaskpoolConfig = toml::from_str(&rendered).unwrap();
    assert_eq!(parsed, config);

    let unseeded = TaskpoolConfig::default().to_toml().unwrap();
    assert!(!unseeded.contains("seed"));
}
