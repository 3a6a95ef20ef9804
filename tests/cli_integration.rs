//! Integration tests for the otpvault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Passwords are supplied through `OTPVAULT_PASSWORD` so nothing
//! prompts, and `--no-clip` keeps `generate` away from the clipboard.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const PASSWORD: &str = "Str0ng!Pass";
const HOTP_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

/// Helper: get a Command pointing at the otpvault binary.
fn otpvault() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("otpvault").expect("binary should exist")
}

/// Helper: a command bound to a vault inside `tmp`, with the password set.
fn vault_cmd(tmp: &TempDir) -> Command {
    let mut cmd = otpvault();
    cmd.arg("--vault-dir")
        .arg(tmp.path().join(".otpvault"))
        .env("OTPVAULT_PASSWORD", PASSWORD)
        .env_remove("OTPVAULT_NEW_PASSWORD")
        .env_remove("OTPVAULT_BACKUP_PASSWORD");
    cmd
}

/// Helper: an installed vault holding one HOTP token (id 1).
fn installed_with_hotp() -> TempDir {
    let tmp = TempDir::new().unwrap();
    vault_cmd(&tmp).arg("install").assert().success();
    vault_cmd(&tmp)
        .args([
            "add",
            "--secret",
            HOTP_SECRET,
            "--issuer",
            "Bank",
            "--account",
            "me@bank",
            "--type",
            "hotp",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added token 1"));
    tmp
}

#[test]
fn help_flag_shows_usage() {
    otpvault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Encrypted local vault for TOTP/HOTP two-factor tokens",
        ))
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("clean-install"));
}

#[test]
fn version_flag_shows_version() {
    otpvault()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("otpvault"));
}

#[test]
fn version_command_shows_crypto_parameters() {
    otpvault()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("AES-256-GCM"));
}

#[test]
fn no_args_shows_help() {
    otpvault()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn list_on_missing_vault_fails() {
    let tmp = TempDir::new().unwrap();
    vault_cmd(&tmp)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not installed"));
}

#[test]
fn install_twice_fails() {
    let tmp = TempDir::new().unwrap();
    vault_cmd(&tmp)
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("Vault created"));
    tmp.child(".otpvault/vault.bin").assert(predicate::path::exists());

    vault_cmd(&tmp)
        .arg("install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already installed"));
}

#[test]
fn install_with_weak_password_fails() {
    let tmp = TempDir::new().unwrap();
    vault_cmd(&tmp)
        .env("OTPVAULT_PASSWORD", "short")
        .arg("install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Weak password"));
}

#[test]
fn add_list_and_generate_hotp() {
    let tmp = installed_with_hotp();

    vault_cmd(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bank"))
        .stdout(predicate::str::contains("me@bank"))
        .stdout(predicate::str::contains(HOTP_SECRET).not());

    vault_cmd(&tmp)
        .args(["generate", "1", "--no-clip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("755224"));

    // The counter was persisted, so the next code moves on.
    vault_cmd(&tmp)
        .args(["generate", "1", "--no-clip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("287082"));
}

#[test]
fn wrong_password_fails() {
    let tmp = installed_with_hotp();
    vault_cmd(&tmp)
        .env("OTPVAULT_PASSWORD", "Wr0ng!Pass")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authentication failed"));
}

#[test]
fn remove_with_force_deletes_token() {
    let tmp = installed_with_hotp();
    vault_cmd(&tmp)
        .args(["remove", "1", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed token 1"));

    vault_cmd(&tmp)
        .args(["generate", "1", "--no-clip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn export_then_import_into_fresh_vault() {
    let source = installed_with_hotp();
    let csv = source.child("tokens.csv");
    vault_cmd(&source)
        .args(["export", "--format", "csv", "--output"])
        .arg(csv.path())
        .assert()
        .success();
    csv.assert(predicate::str::contains(HOTP_SECRET));

    let target = TempDir::new().unwrap();
    vault_cmd(&target).arg("install").assert().success();
    vault_cmd(&target)
        .arg("import")
        .arg(csv.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 token(s)"));

    vault_cmd(&target)
        .args(["export", "--format", "uri"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("otpauth://hotp/Bank:me%40bank"));
}

#[test]
fn export_rejects_unknown_format() {
    let tmp = installed_with_hotp();
    vault_cmd(&tmp)
        .args(["export", "--format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported format"));
}

#[test]
fn backup_is_listed() {
    let tmp = installed_with_hotp();
    vault_cmd(&tmp)
        .arg("backup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Backed up 1 token(s)"));

    vault_cmd(&tmp)
        .arg("backups")
        .assert()
        .success()
        .stdout(predicate::str::contains("otpvault-backup-"));
}

#[test]
fn clean_install_requires_force() {
    let tmp = installed_with_hotp();
    vault_cmd(&tmp)
        .arg("clean-install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    // Still the old vault.
    vault_cmd(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bank"));

    vault_cmd(&tmp)
        .args(["clean-install", "--force"])
        .assert()
        .success();
    vault_cmd(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bank").not());
}

#[test]
fn passwd_does_not_reuse_current_password_from_env() {
    let tmp = installed_with_hotp();

    // Only OTPVAULT_PASSWORD is set: there is no new password to use.
    vault_cmd(&tmp).arg("passwd").assert().failure();

    vault_cmd(&tmp)
        .arg("passwd")
        .env("OTPVAULT_NEW_PASSWORD", PASSWORD)
        .assert()
        .failure()
        .stderr(predicate::str::contains("must differ"));

    vault_cmd(&tmp).arg("list").assert().success();
}

#[test]
fn passwd_rekeys_vault() {
    let tmp = installed_with_hotp();
    vault_cmd(&tmp)
        .arg("passwd")
        .env("OTPVAULT_NEW_PASSWORD", "N3w!Password")
        .assert()
        .success()
        .stdout(predicate::str::contains("Password changed"));

    vault_cmd(&tmp).arg("list").assert().failure();
    vault_cmd(&tmp)
        .env("OTPVAULT_PASSWORD", "N3w!Password")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bank"));
}

#[test]
fn completions_bash_prints_script() {
    otpvault()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("otpvault"));
}

#[test]
fn import_help_shows_file_arg() {
    otpvault()
        .args(["import", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("file"));
}
