mod support;

use predicates::str::contains;

#[test]
fn tasktable_help_works() {
    support::tasktable_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("task table"));
}

#[test]
fn subcommand_help_works() {
    for cmd in ["list", "tui"] {
        support::tasktable_cmd()
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn version_flag_works() {
    support::tasktable_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains("tasktable"));
}

#[test]
fn tui_rejects_json_output() {
    let dir = support::TestDir::new();
    dir.cmd()
        .args(["tui", "--json"])
        .assert()
        .code(2)
        .stdout(contains("\"status\": \"error\""))
        .stdout(contains("does not support --json"));
}

#[test]
fn tui_rejects_quiet() {
    let dir = support::TestDir::new();
    dir.cmd()
        .args(["tui", "--quiet"])
        .assert()
        .code(2)
        .stderr(contains("does not support --quiet"));
}

#[test]
fn unknown_subcommand_fails() {
    support::tasktable_cmd().arg("frobnicate").assert().failure();
}
