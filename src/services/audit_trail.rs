//! Audit trail writer
//!
//! Appends one human-readable line to an external plain-text event log after
//! every committed create and delete. Updates are intentionally not audited:
//! the trail tracks existence changes, not field edits.
//!
//! Appends go through a single in-process writer guarded by a mutex, so
//! concurrent requests never interleave or truncate each other's lines. The
//! write is best-effort: a failure is logged as a diagnostic and never
//! surfaced to the operation that triggered it.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::sync::Mutex;
use tracing::warn;

use crate::models::AccessLog;

/// Audit event kinds written to the trail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    Create,
    Delete,
}

impl AuditEvent {
    fn label(self) -> &'static str {
        match self {
            AuditEvent::Create => "CREATE",
            AuditEvent::Delete => "DELETE",
        }
    }
}

/// Single-writer append handle for the event log file
pub struct AuditTrail {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AuditTrail {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a committed create
    pub async fn record_created(&self, log: &AccessLog) {
        let message = format!(
            "Access log created for card {}. Status: {}.",
            log.card_id,
            log.status_label()
        );
        self.append(AuditEvent::Create, &message).await;
    }

    /// Record a committed delete, using the id and card_id captured before
    /// the row was removed
    pub async fn record_deleted(&self, id: i64, card_id: &str) {
        let message = format!("Access log (ID: {}) for card {} was deleted.", id, card_id);
        self.append(AuditEvent::Delete, &message).await;
    }

    async fn append(&self, event: AuditEvent, message: &str) {
        let line = format!(
            "[{}] - {}: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            event.label(),
            message
        );

        let _guard = self.lock.lock().await;
        if let Err(e) = append_line(&self.path, &line) {
            warn!(error = %e, path = ?self.path, "Failed to append to audit trail");
        }
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())
}
