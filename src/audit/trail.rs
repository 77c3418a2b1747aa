//! Bounded audit queue with a single background consumer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::writer::AuditWriter;
use super::AuditEntry;
use crate::observability::metrics;

/// Producer handle. Cheap to clone; `write` never blocks.
#[derive(Clone, Debug)]
pub struct AuditSink {
    tx: mpsc::Sender<AuditEntry>,
    dropped: Arc<AtomicU64>,
}

impl AuditSink {
    /// Queue an entry. Dropped (and counted) when the queue is full or stopped.
    pub fn write(&self, entry: AuditEntry) {
        match self.tx.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                metrics::record_audit_dropped();
                tracing::warn!(
                    module = %entry.module,
                    operation = %entry.operation,
                    "Audit queue full, entry dropped"
                );
            }
            Err(TrySendError::Closed(entry)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                metrics::record_audit_dropped();
                tracing::debug!(
                    module = %entry.module,
                    operation = %entry.operation,
                    "Audit trail stopped, entry dropped"
                );
            }
        }
    }

    /// Number of entries dropped so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Owns the queue and the consumer task.
pub struct AuditTrail {
    sink: AuditSink,
    pending: Option<(mpsc::Receiver<AuditEntry>, Box<dyn AuditWriter>)>,
    stop: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl AuditTrail {
    /// Create a stopped trail. Entries written before `start` wait in the queue.
    pub fn new(capacity: usize, writer: impl AuditWriter) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            sink: AuditSink {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            pending: Some((rx, Box::new(writer))),
            stop: CancellationToken::new(),
            task: None,
        }
    }

    /// Producer handle for injection into domain services.
    pub fn sink(&self) -> AuditSink {
        self.sink.clone()
    }

    /// Spawn the consumer. Calling it again is a no-op.
    pub fn start(&mut self) {
        if let Some((rx, writer)) = self.pending.take() {
            let stop = self.stop.clone();
            self.task = Some(tokio::spawn(consume(rx, writer, stop)));
            tracing::info!("Audit trail started");
        }
    }

    /// Stop accepting entries, drain what is queued and wait for the consumer.
    pub async fn stop(&mut self) {
        self.stop.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Audit consumer task failed");
            }
        }
        tracing::info!(dropped = self.sink.dropped(), "Audit trail stopped");
    }
}

async fn consume(
    mut rx: mpsc::Receiver<AuditEntry>,
    mut writer: Box<dyn AuditWriter>,
    stop: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            _ = stop.cancelled() => break,
            entry = rx.recv() => match entry {
                Some(entry) => write_one(writer.as_mut(), &entry).await,
                None => break,
            },
        }
    }

    rx.close();
    while let Some(entry) = rx.recv().await {
        write_one(writer.as_mut(), &entry).await;
    }
    if let Err(e) = writer.flush().await {
        tracing::warn!(error = %e, "Failed to flush audit writer");
    }
}

async fn write_one(writer: &mut dyn AuditWriter, entry: &AuditEntry) {
    if let Err(e) = writer.write(entry).await {
        tracing::warn!(error = %e, module = %entry.module, "Failed to write audit entry");
    }
}
