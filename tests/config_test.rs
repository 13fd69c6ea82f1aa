//! Integration tests for Settings loading and the `config init` template.
//!
//! These tests run without a global config (temp directories only), so they
//! exercise the local layer on top of compiled defaults.

use std::fs;

use tempfile::TempDir;

use natstat_cli::cli::commands::{apply_overrides, write_template};
use natstat_cli::cli::Cli;
use natstat_cli::config::{local_config_path, Settings, DEFAULT_BASE_URL};
use natstat_cli::exitcode;

use clap::Parser;

#[test]
fn given_local_config_when_load_then_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        r#"
api_key = "local-key"
timeout_secs = 5

[output]
delimiter = ";"
"#,
    )
    .unwrap();

    let settings = Settings::load(Some(dir.path())).expect("load settings");

    assert_eq!(settings.api_key.as_deref(), Some("local-key"));
    assert_eq!(settings.timeout_secs, 5);
    assert_eq!(settings.output.delimiter, ';');
    assert_eq!(settings.base_url, DEFAULT_BASE_URL);
}

#[test]
fn given_no_local_config_when_load_then_defaults() {
    let dir = TempDir::new().unwrap();

    let settings = Settings::load(Some(dir.path())).expect("load settings");

    assert_eq!(settings.output.delimiter, ',');
    assert_eq!(settings.base_url, DEFAULT_BASE_URL);
}

#[test]
fn given_malformed_local_config_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "timeout_secs = \"soon\"").unwrap();

    let err = Settings::load(Some(dir.path())).unwrap_err();

    assert!(err.to_string().contains(".natstat.toml"), "{err}");
}

#[test]
fn given_multi_char_delimiter_in_file_when_load_then_error() {
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        "[output]\ndelimiter = \"::\"\n",
    )
    .unwrap();

    assert!(Settings::load(Some(dir.path())).is_err());
}

#[test]
fn given_written_template_when_loading_file_then_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("natstat.toml");

    write_template(&path, false).unwrap();
    let settings = Settings::load_file(&path).unwrap();

    assert_eq!(settings, Settings::default());
}

#[test]
fn given_existing_file_when_writing_template_without_force_then_usage_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("natstat.toml");
    fs::write(&path, "api_key = \"keep\"").unwrap();

    let err = write_template(&path, false).unwrap_err();
    assert_eq!(err.exit_code(), exitcode::USAGE);
    assert_eq!(fs::read_to_string(&path).unwrap(), "api_key = \"keep\"");

    write_template(&path, true).unwrap();
    assert!(fs::read_to_string(&path).unwrap().starts_with("# natstat configuration"));
}

#[test]
fn given_global_flags_when_applying_overrides_then_flags_win() {
    let cli = Cli::try_parse_from([
        "natstat",
        "--api-key",
        "flag-key",
        "--base-url",
        "http://localhost:8080/v3",
        "--delimiter",
        "\\t",
    ])
    .unwrap();
    let mut settings = Settings {
        api_key: Some("file-key".into()),
        ..Settings::default()
    };

    apply_overrides(&mut settings, &cli).unwrap();

    assert_eq!(settings.api_key.as_deref(), Some("flag-key"));
    assert_eq!(settings.base_url, "http://localhost:8080/v3");
    assert_eq!(settings.delimiter_byte().unwrap(), b'\t');
}

#[test]
fn given_bad_delimiter_flag_when_applying_overrides_then_config_exit_code() {
    let cli = Cli::try_parse_from(["natstat", "--delimiter", "ab"]).unwrap();
    let mut settings = Settings::default();

    let err = apply_overrides(&mut settings, &cli).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::CONFIG);
}
