//! Integration tests for CLI argument handling
//!
//! Tests the --date flag and startup validation from the command line.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_energydash"))
        .args(args)
        .output()
        .expect("Failed to execute energydash")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("energydash"), "Help should mention energydash");
    assert!(stdout.contains("--date"), "Help should mention --date flag");
    assert!(stdout.contains("--api-url"), "Help should mention --api-url flag");
}

#[test]
fn test_version_flag_exits_successfully() {
    let output = run_cli(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_invalid_date_prints_error_and_exits() {
    let output = run_cli(&["--date", "not-a-date"]);
    assert!(!output.status.success(), "Expected invalid date to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid date"),
        "Should print error message about invalid date: {}",
        stderr
    );
}

#[test]
fn test_date_before_earliest_prints_error_and_exits() {
    let output = run_cli(&["--date", "2021-06-01"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("out of range"),
        "Should print error message about range: {}",
        stderr
    );
}

#[test]
fn test_non_numeric_cache_bound_is_rejected() {
    let output = run_cli(&["--max-cache-entries", "lots"]);
    assert!(!output.status.success());
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use chrono::NaiveDate;
    use clap::Parser;
    use energydash::cli::{parse_date_arg, CacheLocation, Cli, StartupConfig};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 20).unwrap()
    }

    #[test]
    fn test_cli_date_flag() {
        let cli = Cli::parse_from(["energydash", "--date", "2024-01-01"]);
        assert_eq!(cli.date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_parse_date_arg_today_is_valid() {
        assert_eq!(parse_date_arg("2025-02-20", today()).unwrap(), today());
    }

    #[test]
    fn test_parse_date_arg_tomorrow_is_rejected() {
        assert!(parse_date_arg("2025-02-21", today()).is_err());
    }

    #[test]
    fn test_startup_config_from_cli_cache_dir() {
        let cli = Cli::parse_from(["energydash", "--cache-dir", "/var/cache/energy"]);
        let config = StartupConfig::from_cli(&cli, today()).unwrap();
        assert_eq!(
            config.cache_location,
            CacheLocation::Dir("/var/cache/energy".into())
        );
    }

    #[test]
    fn test_startup_config_from_cli_invalid_date() {
        let cli = Cli::parse_from(["energydash", "--date", "2024-13-01"]);
        assert!(StartupConfig::from_cli(&cli, today()).is_err());
    }
}
