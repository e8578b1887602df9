//! Size-capped log file with numbered rotations

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug)]
struct RotatingState {
    path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    file: File,
    written: u64,
}

/// Log writer that rotates `processing.log` to `processing.log.1` once the
/// next write would exceed `max_bytes`, shifting older rotations up and
/// keeping at most `backup_count` of them.
#[derive(Debug, Clone)]
pub struct RotatingFileWriter {
    state: Arc<Mutex<RotatingState>>,
}

impl RotatingFileWriter {
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64, backup_count: usize) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = open_append(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            state: Arc::new(Mutex::new(RotatingState {
                path,
                max_bytes: max_bytes.max(1),
                backup_count,
                file,
                written,
            })),
        })
    }

    pub fn path(&self) -> PathBuf {
        match self.state.lock() {
            Ok(state) => state.path.clone(),
            Err(poisoned) => poisoned.into_inner().path.clone(),
        }
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("log writer lock poisoned"))?;
        if state.written > 0 && state.written + buf.len() as u64 > state.max_bytes {
            state.rotate()?;
        }
        state.file.write_all(buf)?;
        state.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("log writer lock poisoned"))?;
        state.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl RotatingState {
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.backup_count == 0 {
            self.file = File::create(&self.path)?;
        } else {
            let oldest = rotated_path(&self.path, self.backup_count);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (1..self.backup_count).rev() {
                let from = rotated_path(&self.path, index);
                if from.exists() {
                    fs::rename(&from, rotated_path(&self.path, index + 1))?;
                }
            }
            fs::rename(&self.path, rotated_path(&self.path, 1))?;
            self.file = open_append(&self.path)?;
        }
        self.written = 0;
        Ok(())
    }
}

/// `processing.log` -> `processing.log.<index>`
pub fn rotated_path(path: &Path, index: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rotates_and_caps_backups() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs/processing.log");
        let mut writer = RotatingFileWriter::new(&path, 10, 2).unwrap();

        for line in ["first-000\n", "second-00\n", "third-000\n", "fourth-00\n"] {
            writer.write_all(line.as_bytes()).unwrap();
        }
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "fourth-00\n");
        assert_eq!(fs::read_to_string(rotated_path(&path, 1)).unwrap(), "third-000\n");
        assert_eq!(fs::read_to_string(rotated_path(&path, 2)).unwrap(), "second-00\n");
        assert!(!rotated_path(&path, 3).exists());
    }

    #[test]
    fn test_zero_backups_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processing.log");
        let mut writer = RotatingFileWriter::new(&path, 8, 0).unwrap();
        writer.write_all(b"aaaaaaa\n").unwrap();
        writer.write_all(b"bbbbbbb\n").unwrap();
        writer.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "bbbbbbb\n");
        assert!(!rotated_path(&path, 1).exists());
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processing.log");
        fs::write(&path, "old\n").unwrap();
        let mut writer = RotatingFileWriter::new(&path, 1024, 1).unwrap();
        writer.write_all(b"new\n").unwrap();
        writer.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
        assert_eq!(writer.path(), path);
    }
}
