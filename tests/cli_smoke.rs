mod common;

use std::path::Path;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

use common::{seeded_home, storage_in, temp_home, LEDGER_NAME};
use consign_core::domain::ItemStatus;
use consign_core::engine::LedgerStorage;

const BIN_NAME: &str = "consign_core_cli";

fn cli(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin(BIN_NAME).expect("binary exists");
    cmd.env("CONSIGN_CORE_HOME", home)
        .env("CONSIGN_CORE_TODAY", "2024-03-31")
        .env("NO_COLOR", "1")
        .env_remove("CONSIGN_CORE_CLI_SCRIPT");
    cmd
}

#[test]
fn help_lists_report_commands() {
    cli(&temp_home())
        .arg("help")
        .assert()
        .success()
        .stdout(contains("Available commands").and(contains("breakdown")));
}

#[test]
fn version_prints_build_metadata() {
    cli(&temp_home())
        .arg("version")
        .assert()
        .success()
        .stdout(contains("Consign Core"));
}

#[test]
fn kpi_renders_march_summary() {
    let (home, _) = seeded_home();
    cli(&home)
        .args(["--ledger", LEDGER_NAME, "kpi", "--from", "2024-03-01", "--to", "2024-03-31"])
        .assert()
        .success()
        .stdout(
            contains("14200.00 USD")
                .and(contains("Top brand"))
                .and(contains("Hermes")),
        );
}

#[test]
fn kpi_json_is_machine_readable() {
    let (home, _) = seeded_home();
    let output = cli(&home)
        .args([
            "--json", "--ledger", LEDGER_NAME, "kpi", "--from", "2024-03-01", "--to", "2024-03-31",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["items_sold"], 2);
    assert_eq!(json["payment_count"], 3);
    assert_eq!(json["top_performing_vendor"], "Ana");
}

#[test]
fn payouts_lists_items_owed_to_vendors() {
    let (home, _) = seeded_home();
    cli(&home)
        .args(["--ledger", LEDGER_NAME, "payouts"])
        .assert()
        .success()
        .stdout(
            contains("Birkin 30")
                .and(contains("Classic Flap"))
                .and(contains("6709.09 USD")),
        );
}

#[test]
fn unknown_command_suggests_closest_name() {
    cli(&temp_home())
        .arg("kpo")
        .assert()
        .failure()
        .stdout(contains("Suggestion: `kpi`?"));
}

#[test]
fn reports_need_an_open_ledger() {
    cli(&temp_home())
        .arg("kpi")
        .assert()
        .failure()
        .stderr(contains("No ledger open"));
}

#[test]
fn script_mode_records_payment_and_persists() {
    let (home, shop) = seeded_home();
    let script = format!(
        "open {LEDGER_NAME}\n\
         pay \"Kelly Wallet\" --client Carla --amount 300 --date 2024-03-30\n\
         # comments are skipped\n\
         exit\n\
         kpi\n"
    );
    cli(&home)
        .env("CONSIGN_CORE_CLI_SCRIPT", "1")
        .write_stdin(script)
        .assert()
        .success()
        .stdout(contains("item is reserved").and(contains("KPI summary").not()));

    let storage = storage_in(&home);
    let ledger = storage.load_ledger(LEDGER_NAME).unwrap();
    assert_eq!(ledger.item(shop.wallet).unwrap().status, ItemStatus::Reserved);
    assert_eq!(ledger.client_payments.len(), 4);
    assert_eq!(storage.list_backups(LEDGER_NAME).unwrap().len(), 1);
}

#[test]
fn last_opened_ledger_is_reused() {
    let (home, _) = seeded_home();
    cli(&home)
        .args(["open", LEDGER_NAME])
        .assert()
        .success()
        .stdout(contains("Opened `Boutique`"));
    cli(&home)
        .args(["settlement", "Birkin 30"])
        .assert()
        .success()
        .stdout(contains("5400.00 USD"));
}

#[test]
fn refused_payout_exits_with_error() {
    let (home, _) = seeded_home();
    cli(&home)
        .args([
            "--ledger",
            LEDGER_NAME,
            "payout",
            "Kelly Wallet",
            "--amount",
            "100",
        ])
        .assert()
        .failure()
        .stderr(contains("cannot be settled"));
}

#[test]
fn config_settings_persist_and_round_trip_through_backups() {
    let home = temp_home();
    cli(&home)
        .args(["config", "set", "payout_readiness", "full"])
        .assert()
        .success();
    cli(&home)
        .args(["config", "set", "locale", "pt-PT"])
        .assert()
        .success()
        .stdout(contains("Set `locale`"));
    cli(&home)
        .args(["config", "backup", "before", "trip"])
        .assert()
        .success()
        .stdout(contains("Configuration backup written"));

    let listing = cli(&home)
        .args(["--json", "config", "backups"])
        .output()
        .unwrap();
    let names: Vec<String> = serde_json::from_slice(&listing.stdout).unwrap();
    assert_eq!(names.len(), 1);

    cli(&home)
        .args(["config", "set", "locale", "en-GB"])
        .assert()
        .success();
    cli(&home)
        .args(["config", "restore", names[0].as_str()])
        .assert()
        .success();
    cli(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(contains("pt-PT").and(contains("full settlement")));
}

#[test]
fn config_rejects_unknown_keys() {
    cli(&temp_home())
        .args(["config", "set", "theme", "dark"])
        .assert()
        .failure()
        .stderr(contains("unknown setting"));
}
