mod common;

use common::{TestWorkspace, csv_ddl, path_str};
use predicates::str::contains;

#[test]
fn inspect_prints_variant_and_statistics() {
    let workspace = TestWorkspace::new();
    let input = workspace.write(
        "sample.csv",
        "id,price,label\n1,9.99,ab\n128,10.5,cde\n",
    );

    csv_ddl()
        .args(["inspect", "-i", path_str(&input), "--fallback", "replay"])
        .assert()
        .success()
        .stdout(contains("#  name   type"))
        .stdout(contains("SMALLINT"))
        .stdout(contains("range 1..=128"))
        .stdout(contains("literal width 3"))
        .stdout(contains("lengths {2,3}, ascii"));
}

#[test]
fn inspect_reports_empty_input() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("empty.csv", "");

    csv_ddl()
        .args(["inspect", "-i", path_str(&input)])
        .assert()
        .success()
        .stdout(contains("No columns inferred"));
}

#[test]
fn inspect_fails_on_integer_overflow() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("big.csv", "N\n-99999999999999999999\n");

    csv_ddl()
        .args(["inspect", "-i", path_str(&input)])
        .assert()
        .failure()
        .stderr(contains("Column 'N'"));
}
