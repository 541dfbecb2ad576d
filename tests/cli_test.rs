use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = tempfile::NamedTempFile::new()?;
    write!(
        config,
        r#"{{
            "modules": {{
                "deposit_transfer": {{ "scan_interval_ms": 50 }},
                "txqueue_created": {{ "scan_interval_ms": 50 }}
            }}
        }}"#
    )?;

    let mut cmd = Command::new(cargo_bin!());
    cmd.arg("tests/fixtures/world.json")
        .arg("--config")
        .arg(config.path())
        .arg("--subsystems")
        .arg("deposit_transfer,txqueue_created")
        .arg("--run-for-ms")
        .arg("1000");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "id,coin_type_id,address,incoming,outcoming,locked,locked_by,collecting_tid",
        ))
        .stdout(predicate::str::contains(
            "id,coin_type_id,from_account_id,to_account_id,amount,state,tx_type",
        ))
        // d1 is collected down to the reserve, d2 stays below it
        .stdout(predicate::str::contains("d1,usdt,d1-addr,10,0,true,Collecting,"))
        .stdout(predicate::str::contains("d2,usdt,d2-addr,0.5,0,false,Nobody,"))
        .stdout(predicate::str::contains(",usdt,d1-acc,collector-acc,9,Wait,PaymentCollect"));

    Ok(())
}

#[test]
fn test_cli_missing_fixture() {
    let mut cmd = Command::new(cargo_bin!());
    cmd.arg("tests/fixtures/missing.json").arg("--run-for-ms").arg("10");
    cmd.assert().failure();
}
