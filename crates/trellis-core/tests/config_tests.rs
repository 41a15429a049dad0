use std::io::Write;

use trellis_core::config::{
    ReporterConfig, TimingConfig, DEFAULT_SHOW_PASSES, DEFAULT_SLOW_MS, DEFAULT_TIMEOUT_MS,
};
use trellis_core::tree::Tree;
use trellis_core::{ConfigError, Limit, RunnerConfig, Suite};

#[test]
fn test_default_config() {
    let config = RunnerConfig::default();
    assert_eq!(config.timing.timeout_ms, DEFAULT_TIMEOUT_MS);
    assert_eq!(config.timing.slow_ms, DEFAULT_SLOW_MS);
    assert_eq!(config.reporter.show_passes, DEFAULT_SHOW_PASSES);
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[timing]
timeout_ms = 5000
slow_ms = 0

[reporter]
show_skipped = true
"#
    )
    .unwrap();

    let config = RunnerConfig::from_file(file.path()).unwrap();
    assert_eq!(config.timing.timeout_ms, 5000);
    assert_eq!(config.timing.slow_ms, 0);
    assert!(config.reporter.show_skipped);
    assert_eq!(config.reporter.show_passes, DEFAULT_SHOW_PASSES);
}

#[test]
fn test_missing_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = RunnerConfig::from_file(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::ReadError(_))));
}

#[test]
fn test_invalid_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trellis.toml");
    std::fs::write(&path, "[timing]\ntimeout_ms = \"soon\"\n").unwrap();
    let result = RunnerConfig::from_file(&path);
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn test_suite_uses_configured_defaults() {
    let config = RunnerConfig {
        timing: TimingConfig {
            timeout_ms: 300,
            slow_ms: 0,
        },
        reporter: ReporterConfig::default(),
    };
    let suite = Suite::with_config(config);
    assert_eq!(suite.timeout(Tree::ROOT), Limit::Millis(300));
    assert_eq!(suite.slow(Tree::ROOT), Limit::Unlimited);
}

#[test]
fn test_default_config_string_round_trips() {
    let text = RunnerConfig::default_config_string();
    let parsed = RunnerConfig::from_toml(&text).unwrap();
    assert_eq!(parsed, RunnerConfig::default());
}
