use assert_cmd::Command;
use predicates::str::contains;

fn bin() -> Command {
    Command::cargo_bin("modlock").unwrap()
}

#[test]
fn help_lists_core_commands() {
    bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("modlock"))
        .stdout(contains("update"))
        .stdout(contains("install"))
        .stdout(contains("--game-version"))
        .stdout(contains("--lock"));
}

#[test]
fn version_is_reported() {
    bin()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn subcommand_help_is_available() {
    for sub in ["update", "install"] {
        bin().args([sub, "--help"]).assert().success();
    }
}

#[test]
fn bad_game_version_is_rejected_up_front() {
    bin()
        .args(["--game-version", "2.0.x", "update"])
        .assert()
        .failure()
        .stderr(contains("invalid version string"));
}
