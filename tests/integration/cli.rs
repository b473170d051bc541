// SPDX-License-Identifier: Apache-2.0 OR MIT
//! The `logcore` binary against a history directory written by the library.

use anyhow::Result;
use logcore::logging::{BufferedConsole, LogArg, ManualScheduler};
use logcore::{Logger, LoggerConfig, Severity};
use std::path::Path;
use std::process::Output;
use std::sync::Arc;
use tokio::process::Command as TokioCommand;

fn seed_history(dir: &Path) {
    let mut config = LoggerConfig::default();
    config.storage.dir = Some(dir.to_path_buf());
    let logger = Logger::builder()
        .config(config)
        .console_output(Box::new(BufferedConsole::new()))
        .scheduler(Arc::new(ManualScheduler::new()))
        .build();
    let err = std::io::Error::new(std::io::ErrorKind::NotFound, "effect file missing");
    logger.error_with("Effects", "load failed", vec![LogArg::error(&err)]);
    logger.warn("Chat", "slow reply");
    logger.log(Severity::Error, "Chat", "send failed", Vec::new());
    logger.shutdown();
}

async fn run_cli(dir: &Path, args: &[&str]) -> Result<Output> {
    let output = TokioCommand::new(env!("CARGO_BIN_EXE_logcore"))
        .arg("--store-dir")
        .arg(dir)
        .args(args)
        .env_remove("LOGCORE_LEVEL")
        .env_remove("LOGCORE_PROFILE")
        .output()
        .await?;
    Ok(output)
}

#[tokio::test]
async fn test_history_listing_and_filters() -> Result<()> {
    let dir = tempfile::tempdir()?;
    seed_history(dir.path());

    let output = run_cli(dir.path(), &["history"]).await?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("[ERROR][Effects] load failed"));
    assert!(stdout.contains("effect file missing"));
    assert!(stdout.contains("[WARN][Chat] slow reply"));

    let output = run_cli(dir.path(), &["history", "--module", "Chat", "--json"]).await?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line))
        .collect::<Result<_, _>>()?;
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["message"], "slow reply");
    assert_eq!(lines[1]["level"], "ERROR");

    let output = run_cli(dir.path(), &["history", "--level", "warn"]).await?;
    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(stdout.lines().count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_export_then_clear() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    seed_history(dir.path());

    let output = run_cli(
        dir.path(),
        &["export", "--level", "error", "--out", out.path().to_str().unwrap()],
    )
    .await?;
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)?.contains("Exported 2 entries"));

    let exported: Vec<_> = std::fs::read_dir(out.path())?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    assert_eq!(exported.len(), 1);
    let export: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&exported[0])?)?;
    assert_eq!(export["count"], 2);
    assert_eq!(export["filters"]["level"], "ERROR");

    let output = run_cli(dir.path(), &["clear"]).await?;
    assert!(output.status.success());
    let output = run_cli(dir.path(), &["history"]).await?;
    assert!(output.stdout.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_diagnose_and_stats() -> Result<()> {
    let dir = tempfile::tempdir()?;
    seed_history(dir.path());

    let output = run_cli(dir.path(), &["diagnose"]).await?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("[PASS] storage_access"));
    assert!(stdout.contains("0 failed"));

    let output = run_cli(dir.path(), &["stats"]).await?;
    assert!(output.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(stats["history_len"], 3);
    assert_eq!(stats["persistence_enabled"], true);
    Ok(())
}

#[tokio::test]
async fn test_missing_store_dir_fails() -> Result<()> {
    let output = TokioCommand::new(env!("CARGO_BIN_EXE_logcore"))
        .arg("stats")
        .output()
        .await?;
    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr)?.contains("no history directory"));
    Ok(())
}
