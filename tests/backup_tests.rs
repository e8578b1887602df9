//! Backup retention across pipeline runs

use std::fs;
use std::path::{Path, PathBuf};

use parcel_pipeline::config::Settings;
use parcel_pipeline::output::BackupManager;
use parcel_pipeline::pipeline::PipelineExecutor;
use serde_json::json;
use tempfile::TempDir;

fn input(dir: &Path, count: usize) -> PathBuf {
    let features: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "type": "Feature",
                "geometry": null,
                "properties": {
                    "AddressPoints.TRUE_SITE_": format!("{} SW 8TH ST", 1200 + i),
                    "AddressPoints.TRUE_OWNER": "CALLE OCHO TRUST",
                }
            })
        })
        .collect();
    let path = dir.join("parcels.json");
    fs::write(&path, json!({"type": "FeatureCollection", "features": features}).to_string()).unwrap();
    path
}

fn settings(dir: &Path, keep: usize, compress: bool) -> Settings {
    let mut settings = Settings::default()
        .with_input(input(dir, 8))
        .with_output_root(dir.join("out"));
    settings.backup.keep_backups = keep;
    settings.backup.compress = compress;
    settings
}

fn backup_sets(settings: &Settings) -> Vec<PathBuf> {
    BackupManager::from_settings(&settings.output, &settings.backup)
        .list()
        .unwrap()
}

#[test]
fn test_first_run_has_nothing_to_back_up() {
    let dir = TempDir::new().unwrap();
    let settings = settings(dir.path(), 3, false);
    PipelineExecutor::new(settings.clone()).unwrap().run().unwrap();
    assert!(backup_sets(&settings).is_empty());
}

#[test]
fn test_successive_runs_keep_at_most_keep_backups() {
    let dir = TempDir::new().unwrap();
    let settings = settings(dir.path(), 2, false);

    let mut seen = Vec::new();
    for _ in 0..5 {
        PipelineExecutor::new(settings.clone()).unwrap().run().unwrap();
        let sets = backup_sets(&settings);
        assert!(sets.len() <= 2);
        seen.extend(sets);
    }
    seen.sort();
    seen.dedup();

    let remaining = backup_sets(&settings);
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining, seen[seen.len() - 2..].to_vec());
    assert!(remaining[1].join("split_output/chunks/chunk_001.json").exists());
}

#[test]
fn test_compressed_backups() {
    let dir = TempDir::new().unwrap();
    let settings = settings(dir.path(), 5, true);
    for _ in 0..2 {
        PipelineExecutor::new(settings.clone()).unwrap().run().unwrap();
    }

    let sets = backup_sets(&settings);
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].extension().and_then(|e| e.to_str()), Some("zip"));
}

#[test]
fn test_backups_disabled() {
    let dir = TempDir::new().unwrap();
    let settings = settings(dir.path(), 5, false).with_backups(false);
    for _ in 0..2 {
        PipelineExecutor::new(settings.clone()).unwrap().run().unwrap();
    }
    assert!(!dir.path().join("out/backups").exists());
}
