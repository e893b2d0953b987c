// ════════════════════════════════════════════════════════════════
//  Configuration
// ════════════════════════════════════════════════════════════════

/// Режим записи.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Если последняя строка с тем же id — перезаписать её.
    #[default]
    Upsert,
    /// Всегда дописывать в конец файла.
    Append,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct FileStoreConfig {
    /// Target `.jsonl` file.
    pub path: String,
    #[serde(default)]
    pub write_mode: WriteMode,
}

// ════════════════════════════════════════════════════════════════
//  On-disk record format
// ════════════════════════════════════════════════════════════════

/// One line of the file: `{"id":..,"data":..}`.
#[derive(serde::Serialize, serde::Deserialize)]
pub(crate) struct DiskRecord {
    pub id: String,
    pub data: serde_json::Value,
}
