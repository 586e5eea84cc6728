use assert_cmd::prelude::*;
use std::process::Command;

#[test]
fn command_stat() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("maftc")?;
    let output = cmd
        .arg("stat")
        .arg("tests/maf/example.maf")
        .output()
        .unwrap();

    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(stdout.starts_with("#block\trows\tcols\tgaps\tsegments\tpinches\tpinched_bases"));
    // one gapless reference, three partners with 3 + 2 + 3 gap-free runs
    assert!(stdout.contains("0\t4\t10\t8\t1\t8\t22"));
    assert!(stdout.contains("1\t2\t4\t0\t1\t1\t4"));
    assert_eq!(stdout.lines().count(), 3);

    Ok(())
}

#[test]
fn command_stat_detail() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("maftc")?;
    let output = cmd
        .arg("stat")
        .arg("--detail")
        .arg("tests/maf/example.maf")
        .output()
        .unwrap();

    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(stdout.contains("# seqD(+):6-15\tgaps=0"));
    assert!(stdout.contains("# seqC(-):5-12\tgaps=2"));
    assert!(stdout.contains("# seqE(+):1-4\tgaps=0"));

    Ok(())
}
