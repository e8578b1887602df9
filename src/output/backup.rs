//! Timestamped backups of existing output directories
//!
//! A backup set is either a directory or, with compression enabled, a single
//! `.zip` archive named `backup_YYYYMMDD_HHMMSS_mmm`. Names sort
//! chronologically, so retention simply drops the lexicographically smallest
//! sets.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use super::error::{WriteError, WriteResult};
use crate::config::{BackupSettings, OutputSettings};

const BACKUP_PREFIX: &str = "backup_";
/// `YYYYMMDD_HHMMSS_mmm`
const STAMP_LEN: usize = 19;

/// Result of a backup pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackupOutcome {
    /// Set created in this pass, if anything existed to back up
    pub created: Option<PathBuf>,
    /// Sets evicted by retention
    pub removed: Vec<PathBuf>,
}

/// Creates and rotates backup sets
#[derive(Debug, Clone)]
pub struct BackupManager {
    backup_dir: PathBuf,
    sources: Vec<PathBuf>,
    keep: usize,
    compress: bool,
}

impl BackupManager {
    pub fn new(backup_dir: impl Into<PathBuf>, sources: Vec<PathBuf>, keep: usize, compress: bool) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            sources,
            keep: keep.max(1),
            compress,
        }
    }

    pub fn from_settings(output: &OutputSettings, backup: &BackupSettings) -> Self {
        Self::new(
            &output.backup_directory,
            output.data_directories().into_iter().map(Path::to_path_buf).collect(),
            backup.keep_backups,
            backup.compress,
        )
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Back up, then apply retention
    pub fn run(&self) -> WriteResult<BackupOutcome> {
        let created = self.create()?;
        let removed = self.prune()?;
        Ok(BackupOutcome { created, removed })
    }

    /// Copy every non-empty source directory into a new backup set.
    /// Returns `None` when there is nothing to back up.
    pub fn create(&self) -> WriteResult<Option<PathBuf>> {
        let sources: Vec<(String, PathBuf)> = self
            .sources
            .iter()
            .enumerate()
            .filter(|(_, dir)| has_entries(dir))
            .map(|(i, dir)| {
                let label = dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| format!("output_{i}"));
                (label, dir.clone())
            })
            .collect();
        if sources.is_empty() {
            debug!("No existing outputs to back up");
            return Ok(None);
        }

        fs::create_dir_all(&self.backup_dir).map_err(|e| WriteError::io(&self.backup_dir, e))?;
        let target = self.next_target()?;
        if self.compress {
            self.write_archive(&target, &sources)?;
        } else {
            for (label, dir) in &sources {
                self.copy_tree(dir, &target.join(label))?;
            }
        }
        info!(backup = %target.display(), sources = sources.len(), "Created backup");
        Ok(Some(target))
    }

    /// Remove the oldest sets beyond the retention limit
    pub fn prune(&self) -> WriteResult<Vec<PathBuf>> {
        let existing = self.list()?;
        let excess = existing.len().saturating_sub(self.keep);
        let mut removed = Vec::with_capacity(excess);
        for path in existing.into_iter().take(excess) {
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            result.map_err(|e| WriteError::io(&path, e))?;
            debug!(backup = %path.display(), "Evicted backup");
            removed.push(path);
        }
        Ok(removed)
    }

    /// Existing backup sets, oldest first
    pub fn list(&self) -> WriteResult<Vec<PathBuf>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }
        let pattern = format!(
            "{}/{}*",
            glob::Pattern::escape(&self.backup_dir.to_string_lossy()),
            BACKUP_PREFIX
        );
        let mut sets: Vec<PathBuf> = glob::glob(&pattern)?.filter_map(Result::ok).collect();
        sets.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
        Ok(sets)
    }

    /// Unique path that sorts after every existing set, even when several
    /// sets are created within the same millisecond
    fn next_target(&self) -> WriteResult<PathBuf> {
        let newest = self
            .list()?
            .last()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned());
        let mut stamp = Utc::now().format("%Y%m%d_%H%M%S_%3f").to_string();
        if let Some(previous) = newest
            .as_deref()
            .and_then(|n| n.strip_prefix(BACKUP_PREFIX))
            .and_then(|rest| rest.get(..STAMP_LEN))
        {
            if previous > stamp.as_str() {
                stamp = previous.to_string();
            }
        }

        let extension = if self.compress { ".zip" } else { "" };
        let mut name = format!("{BACKUP_PREFIX}{stamp}{extension}");
        let mut suffix = 0;
        while self.backup_dir.join(&name).exists()
            || newest.as_deref().is_some_and(|n| name.as_str() <= n)
        {
            suffix += 1;
            name = format!("{BACKUP_PREFIX}{stamp}_{suffix:03}{extension}");
        }
        Ok(self.backup_dir.join(name))
    }

    /// Files under `dir`, skipping anything inside the backup directory
    fn files_under(&self, dir: &Path) -> WriteResult<Vec<PathBuf>> {
        let pattern = format!("{}/**/*", glob::Pattern::escape(&dir.to_string_lossy()));
        Ok(glob::glob(&pattern)?
            .filter_map(Result::ok)
            .filter(|p| p.is_file() && !p.starts_with(&self.backup_dir))
            .collect())
    }

    fn copy_tree(&self, source: &Path, target: &Path) -> WriteResult<()> {
        for file in self.files_under(source)? {
            let Ok(relative) = file.strip_prefix(source) else {
                continue;
            };
            let dest = target.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| WriteError::io(parent, e))?;
            }
            fs::copy(&file, &dest).map_err(|e| WriteError::io(&file, e))?;
        }
        Ok(())
    }

    fn write_archive(&self, target: &Path, sources: &[(String, PathBuf)]) -> WriteResult<()> {
        let zip_error = |source| WriteError::Zip {
            path: target.to_path_buf(),
            source,
        };
        let file = File::create(target).map_err(|e| WriteError::io(target, e))?;
        let mut archive = zip::ZipWriter::new(BufWriter::new(file));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for (label, dir) in sources {
            for path in self.files_under(dir)? {
                let Ok(relative) = path.strip_prefix(dir) else {
                    continue;
                };
                let entry = format!(
                    "{label}/{}",
                    relative.to_string_lossy().replace('\\', "/")
                );
                archive.start_file(entry, options).map_err(zip_error)?;
                let mut input = File::open(&path).map_err(|e| WriteError::io(&path, e))?;
                io::copy(&mut input, &mut archive).map_err(|e| WriteError::io(&path, e))?;
            }
        }
        archive.finish().map_err(zip_error)?;
        Ok(())
    }
}

fn has_entries(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seeded(dir: &TempDir) -> Vec<PathBuf> {
        let out = dir.path().join("split_output");
        fs::create_dir_all(out.join("chunks")).unwrap();
        fs::write(out.join("chunks/chunk_001.json"), "{}").unwrap();
        vec![out, dir.path().join("rag_data")]
    }

    #[test]
    fn test_nothing_to_back_up() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), vec![dir.path().join("missing")], 3, false);
        assert_eq!(manager.create().unwrap(), None);
        assert!(manager.list().unwrap().is_empty());
    }

    #[test]
    fn test_directory_backup_copies_tree() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), seeded(&dir), 3, false);
        let created = manager.create().unwrap().unwrap();
        assert!(created.join("split_output/chunks/chunk_001.json").exists());
        assert!(!created.join("rag_data").exists());
        assert!(created
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("backup_"));
    }

    #[test]
    fn test_compressed_backup() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), seeded(&dir), 3, true);
        let created = manager.create().unwrap().unwrap();
        assert_eq!(created.extension().and_then(|e| e.to_str()), Some("zip"));

        let mut archive = zip::ZipArchive::new(File::open(&created).unwrap()).unwrap();
        assert!(archive.by_name("split_output/chunks/chunk_001.json").is_ok());
    }

    #[test]
    fn test_backup_dir_inside_source_is_skipped() {
        let dir = TempDir::new().unwrap();
        let sources = seeded(&dir);
        let backup_dir = sources[0].join("backups");
        let manager = BackupManager::new(&backup_dir, sources.clone(), 5, false);
        manager.create().unwrap();
        let second = manager.create().unwrap().unwrap();
        assert!(!second.join("split_output/backups").exists());
    }

    #[test]
    fn test_retention_keeps_newest() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"), seeded(&dir), 2, false);
        let mut created = Vec::new();
        for _ in 0..4 {
            created.push(manager.run().unwrap().created.unwrap());
        }
        let remaining = manager.list().unwrap();
        assert_eq!(remaining, created[2..].to_vec());
    }
}
