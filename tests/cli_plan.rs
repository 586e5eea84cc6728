use assert_cmd::prelude::*;
use std::process::Command;

#[test]
fn command_plan_sorted() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("maftc")?;
    let output = cmd
        .arg("plan")
        .arg("tests/maf/example.maf")
        .output()
        .unwrap();

    let stdout = String::from_utf8(output.stdout).unwrap();

    // the gapless row claims the whole first block in one segment
    assert!(stdout.contains("block #0: 4 rows, 10 cols, 1 segments"));
    assert!(stdout.contains("  ref=3 seqD [0, 10)"));
    assert!(stdout.contains("block #1: 2 rows, 4 cols, 1 segments"));
    assert!(stdout.contains("  ref=0 seqA [0, 4)"));

    Ok(())
}

#[test]
fn command_plan_raw() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("maftc")?;
    let output = cmd
        .arg("plan")
        .arg("--raw")
        .arg("tests/maf/example.maf")
        .output()
        .unwrap();

    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(stdout.contains("block #0: 4 rows, 10 cols, 7 segments"));
    for segment in [
        "ref=3 seqD [3, 4)",
        "ref=2 seqC [4, 5)",
        "ref=1 seqB [8, 9)",
        "ref=1 seqB [2, 3)",
        "ref=0 seqA [9, 10)",
        "ref=0 seqA [5, 8)",
        "ref=0 seqA [0, 2)",
    ] {
        assert!(stdout.contains(segment), "missing {}", segment);
    }

    Ok(())
}

#[test]
fn command_plan_matrix() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("maftc")?;
    let output = cmd
        .arg("plan")
        .arg("--raw")
        .arg("--matrix")
        .arg("tests/maf/example.maf")
        .output()
        .unwrap();

    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(stdout.contains("  **---***-* seqA"));
    assert!(stdout.contains("  ..*--...*. seqB"));
    assert!(stdout.contains("  .-.-*..... seqC"));
    assert!(stdout.contains("  ...*...... seqD"));

    Ok(())
}
