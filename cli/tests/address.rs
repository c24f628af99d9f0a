use anyhow::Result;
use predicates::str::contains;
use tempfile::TempDir;

fn leaddesk(home: &TempDir) -> Result<assert_cmd::Command> {
    let mut cmd = assert_cmd::Command::cargo_bin("leaddesk")?;
    cmd.env("LEADDESK_HOME", home.path());
    cmd.env_remove("LEADDESK_API_TOKEN");
    Ok(cmd)
}

#[test]
fn normalize_prints_the_canonical_address() -> Result<()> {
    let home = TempDir::new()?;
    leaddesk(&home)?
        .args([
            "address",
            "normalize",
            "?scope=mine&junk=1&page=2&sortOrder=desc&limit=45",
        ])
        .assert()
        .success()
        .stdout("page=2&limit=50&scope=mine\n");
    Ok(())
}

#[test]
fn merge_resets_the_page_when_a_filter_changes() -> Result<()> {
    let home = TempDir::new()?;
    leaddesk(&home)?
        .args(["address", "merge", "page=3&search=alice", "statusId=foo"])
        .assert()
        .success()
        .stdout("search=alice&statusId=foo\n");

    leaddesk(&home)?
        .args(["address", "merge", "page=3&search=alice", "page=4"])
        .assert()
        .success()
        .stdout("page=4&search=alice\n");
    Ok(())
}

#[test]
fn merge_with_empty_value_clears_the_key() -> Result<()> {
    let home = TempDir::new()?;
    leaddesk(&home)?
        .args(["address", "merge", "statusId=won&tagId=hot", "tagId="])
        .assert()
        .success()
        .stdout("statusId=won\n");
    Ok(())
}

#[test]
fn merge_rejects_unknown_keys() -> Result<()> {
    let home = TempDir::new()?;
    leaddesk(&home)?
        .args(["address", "merge", "", "colour=red"])
        .assert()
        .failure()
        .stderr(contains("unknown query key 'colour'"));
    Ok(())
}

#[test]
fn commands_that_need_the_store_require_a_configured_operator() -> Result<()> {
    let home = TempDir::new()?;
    leaddesk(&home)?
        .args(["--unit", "north", "list"])
        .assert()
        .failure()
        .stderr(contains("operator_id is not set"));
    Ok(())
}
