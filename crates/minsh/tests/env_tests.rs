//! Session environment tests
//!
//! Covers: process environment inheritance, dotenv loading order and
//! provenance, and the logging configuration exposed on the builder.

use minsh::{LogConfig, Shell};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::fs;

#[tokio::test]
#[serial]
async fn inherits_process_environment() {
    // SAFETY: serialized with every other test that touches the process env
    unsafe { std::env::set_var("MINSH_TEST_INHERITED", "from-process") };
    let dir = tempfile::tempdir().unwrap();

    let mut shell = Shell::builder().no_dotenv().cwd(dir.path()).build();
    let result = shell.exec("echo $MINSH_TEST_INHERITED").await.unwrap();
    assert_eq!(result.stdout, "from-process\n");

    let isolated = Shell::builder()
        .inherit_process_env(false)
        .no_dotenv()
        .cwd(dir.path())
        .build();
    assert!(!isolated.env().contains("MINSH_TEST_INHERITED"));

    unsafe { std::env::remove_var("MINSH_TEST_INHERITED") };
}

#[tokio::test]
#[serial]
async fn dotenv_overrides_process_values() {
    unsafe { std::env::set_var("MINSH_TEST_OVERRIDE", "process") };
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(".env"), "MINSH_TEST_OVERRIDE=dotenv\n").unwrap();

    let shell = Shell::builder().cwd(dir.path()).build();
    assert_eq!(shell.env().get("MINSH_TEST_OVERRIDE"), Some("dotenv"));
    assert!(shell.env().is_from_dotenv("MINSH_TEST_OVERRIDE"));

    unsafe { std::env::remove_var("MINSH_TEST_OVERRIDE") };
}

#[tokio::test]
async fn dotenv_formats() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.env");
    fs::write(
        &path,
        "# comment\n\
         \n\
         export EXPORTED=yes\n\
         DOUBLE=\"line\\none\"\n\
         SINGLE='$NOT_EXPANDED'\n\
         TRAILING=value # note\n\
         lower_case=ok\n\
         1BAD=skipped\n",
    )
    .unwrap();

    let mut shell = Shell::builder()
        .inherit_process_env(false)
        .dotenv(&path)
        .cwd(dir.path())
        .build();

    assert_eq!(shell.env().get("EXPORTED"), Some("yes"));
    assert_eq!(shell.env().get("DOUBLE"), Some("line\none"));
    assert_eq!(shell.env().get("SINGLE"), Some("$NOT_EXPANDED"));
    assert_eq!(shell.env().get("TRAILING"), Some("value"));
    assert_eq!(shell.env().get("lower_case"), Some("ok"));
    assert!(!shell.env().contains("1BAD"));

    let result = shell.exec("echo $TRAILING").await.unwrap();
    assert_eq!(result.stdout, "value\n");
}

#[tokio::test]
async fn missing_dotenv_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let shell = Shell::builder()
        .inherit_process_env(false)
        .dotenv(dir.path().join("absent.env"))
        .cwd(dir.path())
        .build();
    assert!(shell.env().is_empty());
}

#[tokio::test]
async fn no_dotenv_skips_default_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(".env"), "SKIPPED=1\n").unwrap();
    let shell = Shell::builder()
        .inherit_process_env(false)
        .no_dotenv()
        .cwd(dir.path())
        .build();
    assert!(!shell.env().contains("SKIPPED"));
}

#[tokio::test]
async fn log_config_does_not_change_results() {
    let dir = tempfile::tempdir().unwrap();
    let mut shell = Shell::builder()
        .inherit_process_env(false)
        .no_dotenv()
        .cwd(dir.path())
        .env("API_TOKEN", "secret-value")
        .log_config(LogConfig::new().unsafe_log_commands().max_value_length(8))
        .build();

    let result = shell.exec("echo $API_TOKEN").await.unwrap();
    assert_eq!(result.stdout, "secret-value\n");
}

#[test]
fn log_config_redaction() {
    let config = LogConfig::new();
    assert_eq!(config.redact_var("DB_PASSWORD", "hunter2").as_ref(), "[REDACTED]");
    assert_eq!(config.redact_var("EDITOR", "vim").as_ref(), "vim");
    assert!(config.should_redact_env("GITHUB_TOKEN"));
    assert!(!config.should_redact_env("HOME"));
}
