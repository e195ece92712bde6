//! Smoke tests to verify command wiring

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn guestbook() -> Command {
    let mut cmd = Command::cargo_bin("guestbook").unwrap();
    // Keep the developer's environment out of the tests
    cmd.env_remove("DATABASE")
        .env_remove("GUESTBOOK_CONFIG")
        .env_remove("GUESTBOOK_SECRET_FILE")
        .env_remove("PORT")
        .env("HOME", std::env::temp_dir())
        .arg("--env-file")
        .arg("/nonexistent/.env");
    cmd
}

#[test]
fn test_help_lists_commands() {
    guestbook()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("schema"));
}

#[test]
fn test_serve_help() {
    guestbook()
        .arg("serve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Address to bind to"));
}

#[test]
fn test_schema_prints_ddl() {
    guestbook()
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "CREATE TABLE IF NOT EXISTS `guestbook`.`guestbook`",
        ));
}

#[test]
fn test_schema_uses_database_override() {
    guestbook()
        .env("DATABASE", "guestbook_staging")
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("USE `guestbook_staging`;"));
}

#[test]
fn test_invalid_database_name_fails() {
    guestbook()
        .env("DATABASE", "bad-name;")
        .arg("schema")
        .assert()
        .failure()
        .stderr(predicate::str::contains("database name"));
}

#[test]
fn test_serve_fails_when_secret_missing() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "secret_file = \"/nonexistent/secret.json\"").unwrap();

    guestbook()
        .arg("--config")
        .arg(config.path())
        .arg("serve")
        .arg("--bind")
        .arg("127.0.0.1:0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to retrieve secret"));
}
