use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use tempfile::{tempdir, TempDir};

fn create_test_files(dir: &TempDir, files: &[(&str, &str)]) -> Result<()> {
    for (name, content) in files {
        let file_path = dir.path().join(name);
        let mut file = File::create(file_path)?;
        writeln!(file, "{}", content)?;
    }
    Ok(())
}

fn docscout(dir: &TempDir) -> Result<Command> {
    let mut cmd = Command::cargo_bin("docscout-cli")?;
    // Run inside the temp dir so a stray .docscout.yaml cannot leak in; plain output for matching
    cmd.current_dir(dir.path()).env("NO_COLOR", "1");
    Ok(cmd)
}

#[test]
fn test_search_prints_table_and_summary() -> Result<()> {
    let temp_dir = tempdir()?;
    create_test_files(
        &temp_dir,
        &[
            ("invoice.txt", "Invoice 42 was paid on time"),
            ("notes.txt", "nothing relevant"),
        ],
    )?;

    docscout(&temp_dir)?
        .args(["search", "-p", "invoice", "-d", ".", "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("File"))
        .stdout(predicate::str::contains("Context"))
        .stdout(predicate::str::contains("invoice.txt"))
        .stdout(predicate::str::contains("...Invoice 42 was paid on time..."))
        .stdout(predicate::str::contains("notes.txt").not())
        .stdout(predicate::str::contains("Found 1 matches in 1 files"));
    Ok(())
}

#[test]
fn test_stats_only() -> Result<()> {
    let temp_dir = tempdir()?;
    create_test_files(
        &temp_dir,
        &[("a.txt", "todo one\ntodo two"), ("b.txt", "TODO three")],
    )?;

    docscout(&temp_dir)?
        .args(["search", "-p", "todo", "--stats", "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 3 matches in 2 files"))
        .stdout(predicate::str::contains("Context").not());
    Ok(())
}

#[test]
fn test_extension_filter() -> Result<()> {
    let temp_dir = tempdir()?;
    create_test_files(
        &temp_dir,
        &[("keep.csv", "needle"), ("skip.log", "needle")],
    )?;

    docscout(&temp_dir)?
        .args(["search", "-p", "needle", "-e", "csv", "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("keep.csv"))
        .stdout(predicate::str::contains("skip.log").not())
        .stdout(predicate::str::contains("Found 1 matches in 1 files"));
    Ok(())
}

#[test]
fn test_category_filter_by_number() -> Result<()> {
    let temp_dir = tempdir()?;
    create_test_files(
        &temp_dir,
        &[("page.html", "needle"), ("script.py", "needle")],
    )?;

    docscout(&temp_dir)?
        .args(["search", "-p", "needle", "-c", "4", "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("page.html"))
        .stdout(predicate::str::contains("script.py").not());
    Ok(())
}

#[test]
fn test_unknown_category_fails() -> Result<()> {
    let temp_dir = tempdir()?;

    docscout(&temp_dir)?
        .args(["search", "-p", "needle", "-c", "pictures", "--no-progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown category"));
    Ok(())
}

#[test]
fn test_invalid_pattern_fails() -> Result<()> {
    let temp_dir = tempdir()?;
    create_test_files(&temp_dir, &[("a.txt", "content")])?;

    docscout(&temp_dir)?
        .args(["search", "-p", "(unclosed", "--no-progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidPattern"));
    Ok(())
}

#[test]
fn test_save_results() -> Result<()> {
    let temp_dir = tempdir()?;
    create_test_files(&temp_dir, &[("report.txt", "receipt 7 attached")])?;
    let out_dir = tempdir()?;

    docscout(&temp_dir)?
        .args(["search", "-p", "receipt", "--no-progress", "--save"])
        .arg(out_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Results saved to"));

    let saved: Vec<_> = fs::read_dir(out_dir.path())?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(saved.len(), 1);
    assert!(saved[0].starts_with("search_results_"));
    assert!(saved[0].ends_with(".json"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.path().join(&saved[0]))?)?;
    assert_eq!(json["pattern"], "receipt");
    assert_eq!(json["results"][0]["type"], "text");
    assert_eq!(json["results"][0]["matches"][0]["match"], "receipt");
    Ok(())
}

#[test]
fn test_config_file_supplies_defaults() -> Result<()> {
    let temp_dir = tempdir()?;
    create_test_files(
        &temp_dir,
        &[("a.txt", "needle"), ("b.md", "needle")],
    )?;
    let config_path = temp_dir.path().join("scan.yaml");
    fs::write(&config_path, "file_extensions: [\"md\"]\n")?;

    docscout(&temp_dir)?
        .args(["search", "-p", "needle", "--no-progress", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("b.md"))
        .stdout(predicate::str::contains("a.txt").not());
    Ok(())
}

#[test]
fn test_explicit_default_context_overrides_config_file() -> Result<()> {
    let temp_dir = tempdir()?;
    create_test_files(
        &temp_dir,
        &[("long.txt", "the shipment arrived late and the needle was found in the hay")],
    )?;
    let config_path = temp_dir.path().join("scan.yaml");
    fs::write(&config_path, "context_chars: 3\nfile_extensions: [\"txt\"]\n")?;

    // The config file narrows the window
    docscout(&temp_dir)?
        .args(["search", "-p", "needle", "--no-progress", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("...he needle wa..."));

    // --context 50 equals the built-in default but was given explicitly, so it wins
    docscout(&temp_dir)?
        .args(["search", "-p", "needle", "--no-progress", "--context", "50", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "...the shipment arrived late and the needle was found in the hay...",
        ));
    Ok(())
}

#[test]
fn test_missing_config_file_fails() -> Result<()> {
    let temp_dir = tempdir()?;

    docscout(&temp_dir)?
        .args(["search", "-p", "x", "--config", "does-not-exist.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ConfigError"));
    Ok(())
}

#[test]
fn test_categories_listing() -> Result<()> {
    let temp_dir = tempdir()?;

    docscout(&temp_dir)?
        .arg("categories")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. documents"))
        .stdout(predicate::str::contains("2. spreadsheets"))
        .stdout(predicate::str::contains(".xlsx"))
        .stdout(predicate::str::contains("5. source code"))
        .stdout(predicate::str::contains("19 extensions in total"));
    Ok(())
}
