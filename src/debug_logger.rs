// Debug logging module for asynchronous decision tracing
//
// This module provides fire-and-forget async logging so the tick loop never
// waits on disk. Each controller decision is written as one line of JSONL.

use log::error;
use parking_lot::Mutex as SyncMutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::simulation::Decision;
use crate::types::{AgentId, GridCoordinates};

/// Represents a single debug log entry
#[derive(Debug, Serialize)]
struct DebugLogEntry {
    tick: u64,
    agent: AgentId,
    location: GridCoordinates,
    direction: Option<String>,
    place_device: bool,
    timestamp: String,
}

/// Shared debug logger state
/// Uses Arc<Mutex<File>> to allow concurrent async writes from multiple tasks
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<File>>>,
    pending: Arc<SyncMutex<Vec<JoinHandle<()>>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    pending: Arc::new(SyncMutex::new(Vec::new())),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            pending: Arc::new(SyncMutex::new(Vec::new())),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs a decision asynchronously (fire-and-forget)
    pub fn log_decision(&self, decision: &Decision) {
        if !self.enabled {
            return;
        }

        let entry = DebugLogEntry {
            tick: decision.tick,
            agent: decision.agent,
            location: decision.location,
            direction: decision.intent.direction.map(|d| d.as_str().to_string()),
            place_device: decision.intent.place_device,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let file_handle = self.file.clone();

        let handle = tokio::spawn(async move {
            Self::log_entry_internal(file_handle, entry).await;
        });

        let mut pending = self.pending.lock();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Waits for every queued write to land on disk
    pub async fn flush(&self) {
        let handles: Vec<_> = self.pending.lock().drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Debug log task failed: {}", e);
            }
        }
    }

    /// Internal async function that performs the actual file write
    async fn log_entry_internal(file_handle: Arc<Mutex<Option<File>>>, entry: DebugLogEntry) {
        let mut file_guard = file_handle.lock().await;

        if let Some(file) = file_guard.as_mut() {
            match serde_json::to_string(&entry) {
                Ok(json_line) => {
                    let line_with_newline = format!("{}\n", json_line);
                    if let Err(e) = file.write_all(line_with_newline.as_bytes()).await {
                        error!("Failed to write debug log entry: {}", e);
                    } else if let Err(e) = file.flush().await {
                        error!("Failed to flush debug log: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize debug log entry: {}", e);
                }
            }
        }
    }
}
