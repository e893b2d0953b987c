use std::collections::BTreeMap;
use std::future::Future;
use std::io::{BufRead, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;

use coda_api::{ApiError, RowStore};

use super::config::{DiskRecord, FileStoreConfig, WriteMode};

// ════════════════════════════════════════════════════════════════
//  FileStore
// ════════════════════════════════════════════════════════════════

/// JSON Lines row store. Reading back keeps the last line of every id.
#[derive(Clone)]
pub struct FileStore {
    path: PathBuf,
    write_mode: WriteMode,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>, write_mode: WriteMode) -> Self {
        Self { path: path.into(), write_mode }
    }

    pub fn from_config(config: &FileStoreConfig) -> Self {
        Self::new(&config.path, config.write_mode)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── Write ──

    fn do_set(&self, id: &str, data: serde_json::Value) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ApiError::io(format!("mkdir: {e}")))?;
        }

        let line = serde_json::to_string(&DiskRecord { id: id.to_string(), data })
            .map_err(|e| ApiError::format_err(format!("json serialize: {e}")))?;

        match self.write_mode {
            WriteMode::Append => self.append_line(&line),
            WriteMode::Upsert => self.upsert_line(&line, id),
        }
    }

    fn append_line(&self, line: &str) -> Result<(), ApiError> {
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ApiError::io(format!("open {}: {e}", self.path.display())))?;
        writeln!(f, "{line}").map_err(|e| ApiError::io(format!("write: {e}")))
    }

    /// Replace the last line when it holds the same id, append otherwise.
    fn upsert_line(&self, line: &str, id: &str) -> Result<(), ApiError> {
        if !self.path.exists() {
            return self.append_line(line);
        }

        let mut f = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| ApiError::io(format!("open {}: {e}", self.path.display())))?;

        if let Some((last_line, last_pos)) = read_last_line(&mut f)? {
            if parse_id(&last_line).is_ok_and(|last_id| last_id == id) {
                f.set_len(last_pos).map_err(|e| ApiError::io(format!("truncate: {e}")))?;
            }
        }

        f.seek(SeekFrom::End(0)).map_err(|e| ApiError::io(format!("seek end: {e}")))?;
        writeln!(f, "{line}").map_err(|e| ApiError::io(format!("write: {e}")))
    }

    // ── Read ──

    /// Stored rows by id, later lines winning. A missing file is empty.
    pub fn read_all(&self) -> Result<BTreeMap<String, serde_json::Value>, ApiError> {
        let f = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(ApiError::io(format!("open {}: {e}", self.path.display()))),
        };

        let mut rows = BTreeMap::new();
        for line in std::io::BufReader::new(f).lines() {
            let line = line.map_err(|e| ApiError::io(format!("read line: {e}")))?;
            if line.is_empty() {
                continue;
            }
            let record: DiskRecord = serde_json::from_str(&line)
                .map_err(|e| ApiError::format_err(format!("parse json: {e}")))?;
            rows.insert(record.id, record.data);
        }
        Ok(rows)
    }
}

// ════════════════════════════════════════════════════════════════
//  RowStore impl
// ════════════════════════════════════════════════════════════════

impl RowStore for FileStore {
    fn set<'a>(
        &'a self,
        id: &'a str,
        data: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + 'a>> {
        Box::pin(async move { self.do_set(id, data) })
    }

    fn flush(&self) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }
}

// ════════════════════════════════════════════════════════════════
//  Helpers
// ════════════════════════════════════════════════════════════════

/// Прочитать последнюю строку файла и позицию её начала.
fn read_last_line(f: &mut std::fs::File) -> Result<Option<(String, u64)>, ApiError> {
    let len = f.seek(SeekFrom::End(0)).map_err(|e| ApiError::io(format!("seek: {e}")))?;
    if len == 0 {
        return Ok(None);
    }

    let mut pos = len;
    let mut found_content = false;

    while pos > 0 {
        pos -= 1;
        f.seek(SeekFrom::Start(pos)).map_err(|e| ApiError::io(format!("seek: {e}")))?;
        let mut buf = [0u8; 1];
        std::io::Read::read_exact(f, &mut buf).map_err(|e| ApiError::io(format!("read: {e}")))?;

        if buf[0] == b'\n' {
            if found_content {
                pos += 1;
                break;
            }
        } else {
            found_content = true;
        }
    }

    f.seek(SeekFrom::Start(pos)).map_err(|e| ApiError::io(format!("seek: {e}")))?;
    let mut line = String::new();
    std::io::BufReader::new(&*f)
        .read_line(&mut line)
        .map_err(|e| ApiError::io(format!("read_line: {e}")))?;

    let line = line.trim_end().to_string();
    if line.is_empty() {
        return Ok(None);
    }

    Ok(Some((line, pos)))
}

/// Извлечь id из JSON-строки без разбора `data`.
fn parse_id(line: &str) -> Result<String, ApiError> {
    #[derive(serde::Deserialize)]
    struct IdOnly {
        id: String,
    }
    let rec: IdOnly = serde_json::from_str(line)
        .map_err(|e| ApiError::format_err(format!("parse id: {e}")))?;
    Ok(rec.id)
}
