//! Append-only JSON-lines audit log

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use crate::error::{CheckdeskError, CheckdeskResult};

use super::entry::{AuditEntry, EntityType};

/// Writes audit entries to a log file, one JSON object per line
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append an entry and flush it to disk
    pub fn log(&self, entry: &AuditEntry) -> CheckdeskResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| CheckdeskError::Io(format!("Failed to open audit log: {}", e)))?;

        let json = serde_json::to_string(entry)
            .map_err(|e| CheckdeskError::Json(format!("Failed to serialize audit entry: {}", e)))?;

        writeln!(file, "{}", json)
            .map_err(|e| CheckdeskError::Io(format!("Failed to write audit entry: {}", e)))?;
        file.flush()
            .map_err(|e| CheckdeskError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// Read every entry, oldest first
    pub fn read_all(&self) -> CheckdeskResult<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| CheckdeskError::Io(format!("Failed to open audit log: {}", e)))?;

        let mut entries = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                CheckdeskError::Io(format!("Failed to read audit log line {}: {}", line_num + 1, e))
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let entry: AuditEntry = serde_json::from_str(&line).map_err(|e| {
                CheckdeskError::Json(format!(
                    "Failed to parse audit entry at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// The most recent `count` entries, oldest first
    pub fn read_recent(&self, count: usize) -> CheckdeskResult<Vec<AuditEntry>> {
        let all_entries = self.read_all()?;
        let start = all_entries.len().saturating_sub(count);
        Ok(all_entries[start..].to_vec())
    }

    /// The most recent `count` entries matching an entity type and/or actor
    pub fn read_filtered(
        &self,
        entity_type: Option<EntityType>,
        actor: Option<&str>,
        count: usize,
    ) -> CheckdeskResult<Vec<AuditEntry>> {
        let matching: Vec<AuditEntry> = self
            .read_all()?
            .into_iter()
            .filter(|e| entity_type.map_or(true, |t| e.entity_type == t))
            .filter(|e| {
                actor.map_or(true, |a| {
                    e.actor
                        .as_deref()
                        .map(|x| x.eq_ignore_ascii_case(a))
                        .unwrap_or(false)
                })
            })
            .collect();
        let start = matching.len().saturating_sub(count);
        Ok(matching[start..].to_vec())
    }

    pub fn exists(&self) -> bool {
        self.log_path.exists()
    }

    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}
