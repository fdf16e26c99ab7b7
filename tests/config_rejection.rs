// SPDX-License-Identifier: MIT OR Apache-2.0

use sherlock::{Error, LoggerSpec, LoggingConfig, LoggingManager, LoggingPresets, SinkSpec};

#[test]
fn unknown_sink_fails_setup_and_opens_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");
    let mut config = LoggingConfig {
        logs_dir: logs.clone(),
        console_enabled: false,
        ..LoggingConfig::default()
    };
    config
        .loggers
        .insert("billing".to_string(), LoggerSpec::new("BillingLogger", &["billing"]));
    let manager = LoggingManager::new(config);

    let err = manager.setup().unwrap_err();
    assert!(err.is_config());
    assert_eq!(
        err.to_string(),
        "logger `BillingLogger` references unknown sink `billing`"
    );
    assert!(!manager.is_configured());
    assert!(!logs.exists());
    assert!(manager.stats().loggers.is_empty());
}

#[test]
fn invalid_level_names_its_field() {
    let mut config = LoggingPresets::minimal();
    config.console_level = "loud".into();
    let err = LoggingManager::new(config).setup().unwrap_err();
    assert!(matches!(&err, Error::InvalidLevel { field, value } if field == "console_level" && value == "loud"));
}

#[test]
fn disabled_sinks_never_create_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = LoggingConfig {
        logs_dir: dir.path().to_path_buf(),
        console_enabled: false,
        ..LoggingConfig::default()
    };
    config
        .log_files
        .insert("audit".to_string(), SinkSpec::new("audit.log").disabled());
    config
        .loggers
        .insert("audit".to_string(), LoggerSpec::new("AuditLogger", &["audit"]));
    let manager = LoggingManager::new(config);
    manager.setup().unwrap();
    manager.logger("AuditLogger").error("who did this");
    manager.flush();

    assert!(!dir.path().join("audit.log").exists());
    // the logger still propagates to the root sinks
    let app = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
    assert!(app.contains("who did this"));
}
