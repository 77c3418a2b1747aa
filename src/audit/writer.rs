//! Audit entry destinations.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::AuditEntry;

/// Destination for audit entries. Driven by the single consumer task.
#[async_trait]
pub trait AuditWriter: Send + 'static {
    async fn write(&mut self, entry: &AuditEntry) -> std::io::Result<()>;

    async fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Emits entries as `info` events on the `audit` target.
#[derive(Debug, Default)]
pub struct LogWriter;

#[async_trait]
impl AuditWriter for LogWriter {
    async fn write(&mut self, entry: &AuditEntry) -> std::io::Result<()> {
        tracing::info!(
            target: "audit",
            actor = %entry.actor,
            module = %entry.module,
            operation = %entry.operation,
            details = %entry.details,
            "audit"
        );
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
pub struct JsonLinesWriter {
    file: File,
}

impl JsonLinesWriter {
    pub async fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path).await?;
        Ok(Self { file })
    }
}

#[async_trait]
impl AuditWriter for JsonLinesWriter {
    async fn write(&mut self, entry: &AuditEntry) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');
        self.file.write_all(&line).await
    }

    async fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush().await
    }
}

/// Keeps entries in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuditWriter for MemoryWriter {
    async fn write(&mut self, entry: &AuditEntry) -> std::io::Result<()> {
        self.entries
            .lock()
            .map_err(|_| std::io::Error::other("audit buffer poisoned"))?
            .push(entry.clone());
        Ok(())
    }
}
