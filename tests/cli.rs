use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ADMIN_PASSWORD: &str = "Adm1n!pass";

fn checkdesk(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("checkdesk").expect("bin");
    cmd.env("CHECKDESK_DATA_DIR", data_dir).env_remove("RUST_LOG");
    cmd
}

fn init(data_dir: &Path) {
    checkdesk(data_dir)
        .args(["init", "--password-stdin"])
        .write_stdin(format!("{}\n", ADMIN_PASSWORD))
        .assert()
        .success()
        .stdout(predicate::str::contains("Created admin user: admin"))
        .stdout(predicate::str::contains("Initialization complete!"));
}

fn login(data_dir: &Path) {
    checkdesk(data_dir)
        .args(["login", "admin", "--password-stdin"])
        .write_stdin(format!("{}\n", ADMIN_PASSWORD))
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as admin (admin)"));
}

fn record_check(data_dir: &Path) {
    checkdesk(data_dir)
        .args(["client", "create", "Atlas SARL", "--kind", "company"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created client: Atlas SARL"));

    checkdesk(data_dir)
        .args([
            "check", "add", "0012345", "1500.00", "--client", "Atlas SARL", "--bank", "BP",
            "--issued", "2024-01-10", "--due", "2030-01-15",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded check 0012345"));
}

#[test]
fn help_lists_commands() {
    let temp = TempDir::new().unwrap();
    checkdesk(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("backup"))
        .stdout(predicate::str::contains("dashboard"));
}

#[test]
fn commands_require_init() {
    let temp = TempDir::new().unwrap();
    checkdesk(temp.path())
        .args(["bank", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("checkdesk init"));
}

#[test]
fn init_login_and_whoami() {
    let temp = TempDir::new().unwrap();
    init(temp.path());

    checkdesk(temp.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));

    login(temp.path());

    checkdesk(temp.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("admin (admin)"));

    checkdesk(temp.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out."));
}

#[test]
fn init_twice_keeps_existing_admin() {
    let temp = TempDir::new().unwrap();
    init(temp.path());

    checkdesk(temp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Users already exist"));
}

#[test]
fn wrong_password_is_rejected() {
    let temp = TempDir::new().unwrap();
    init(temp.path());

    checkdesk(temp.path())
        .args(["login", "admin", "--password-stdin"])
        .write_stdin("Wr0ng!pass\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn logged_out_user_is_refused() {
    let temp = TempDir::new().unwrap();
    init(temp.path());

    checkdesk(temp.path())
        .args(["bank", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn seeded_banks_are_listed() {
    let temp = TempDir::new().unwrap();
    init(temp.path());
    login(temp.path());

    checkdesk(temp.path())
        .args(["bank", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Banque Populaire"))
        .stdout(predicate::str::contains("AWB"));
}

#[test]
fn check_lifecycle() {
    let temp = TempDir::new().unwrap();
    init(temp.path());
    login(temp.path());
    record_check(temp.path());

    checkdesk(temp.path())
        .args(["check", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0012345"))
        .stdout(predicate::str::contains("Atlas SARL"));

    checkdesk(temp.path())
        .args(["check", "status", "0012345", "cashed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is now Cashed"));

    checkdesk(temp.path())
        .args(["check", "status", "0012345", "cashed"])
        .assert()
        .failure();

    checkdesk(temp.path())
        .args(["check", "list", "--status", "pending"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0012345").not());
}

#[test]
fn quick_search_cannot_be_saved() {
    let temp = TempDir::new().unwrap();
    init(temp.path());
    login(temp.path());

    checkdesk(temp.path())
        .args(["search", "--quick", "overdue", "--save", "late"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));

    checkdesk(temp.path())
        .args(["search", "--status", "pending", "--save", "open"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved search: open"));

    checkdesk(temp.path())
        .args(["search", "--list-saved"])
        .assert()
        .success()
        .stdout(predicate::str::contains("open"))
        .stdout(predicate::str::contains("late").not());
}

#[test]
fn amount_with_extra_decimals_is_rejected() {
    let temp = TempDir::new().unwrap();
    init(temp.path());
    login(temp.path());
    record_check(temp.path());

    checkdesk(temp.path())
        .args([
            "check", "add", "0099999", "1.999", "--client", "Atlas SARL", "--bank", "BP",
            "--issued", "2024-01-10", "--due", "2030-01-15",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid amount"));
}

#[test]
fn duplicate_check_needs_force() {
    let temp = TempDir::new().unwrap();
    init(temp.path());
    login(temp.path());
    record_check(temp.path());

    checkdesk(temp.path())
        .args([
            "check", "add", "0012345", "1500.00", "--client", "Atlas SARL", "--bank", "AWB",
            "--issued", "2024-01-10", "--due", "2030-01-15",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"));
}

#[test]
fn export_checks_to_csv() {
    let temp = TempDir::new().unwrap();
    init(temp.path());
    login(temp.path());
    record_check(temp.path());

    let output = temp.path().join("out").join("checks.csv");
    checkdesk(temp.path())
        .args(["export", "checks", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 check(s)"));

    let contents = fs::read_to_string(&output).unwrap();
    assert!(contents.starts_with("Number,Client,Bank"));
    assert!(contents.contains("0012345"));

    checkdesk(temp.path())
        .args(["export", "history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("checks.csv"));
}

#[test]
fn backup_create_and_list() {
    let temp = TempDir::new().unwrap();
    init(temp.path());
    login(temp.path());

    checkdesk(temp.path())
        .args(["backup", "create"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup created: backup-"));

    checkdesk(temp.path())
        .args(["backup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 1 backup(s)"));
}

#[test]
fn config_get_and_set() {
    let temp = TempDir::new().unwrap();
    init(temp.path());
    login(temp.path());

    checkdesk(temp.path())
        .args(["config", "set", "notification_days", "7"])
        .assert()
        .success();

    checkdesk(temp.path())
        .args(["config", "get", "notification_days"])
        .assert()
        .success()
        .stdout(predicate::str::diff("7\n"));

    checkdesk(temp.path())
        .args(["config", "get", "no_such_key"])
        .assert()
        .failure();
}
