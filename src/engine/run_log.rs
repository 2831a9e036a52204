use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classifier::MessageVerdict;
use crate::engine::state::ReplyOutcome;
use crate::errors::ChatLoopResult;

#[derive(Debug, Clone, Serialize)]
pub struct RunLogEntry {
    pub ts: DateTime<Utc>,
    pub run_id: String,
    pub cycle: u64,
    pub slot: usize,
    /// Absent when the capture failed before anything could be classified.
    pub verdict: Option<MessageVerdict>,
    #[serde(flatten)]
    pub outcome: ReplyOutcome,
}

/// Append-only destination for run log entries.
pub trait LogSink: Send + Sync {
    fn append(&mut self, entry: &RunLogEntry) -> ChatLoopResult<()>;
}

/// One JSON object per line, flushed after every entry.
pub struct JsonlSink {
    path: PathBuf,
    file: File,
}

impl JsonlSink {
    pub fn open(path: impl Into<PathBuf>) -> ChatLoopResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for JsonlSink {
    fn append(&mut self, entry: &RunLogEntry) -> ChatLoopResult<()> {
        let line = serde_json::to_string(entry)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }
}

/// Records every decision the cycle takes. Each entry goes to the tracing
/// stream and to every attached sink; nothing is ever read back.
pub struct RunLog {
    run_id: String,
    sinks: Vec<Box<dyn LogSink>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            sinks: Vec::new(),
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn record(
        &mut self,
        cycle: u64,
        slot: usize,
        verdict: Option<&MessageVerdict>,
        outcome: &ReplyOutcome,
        ts: DateTime<Utc>,
    ) {
        match outcome {
            ReplyOutcome::Sent { reply } => {
                tracing::info!(cycle, slot, reply = %reply, "reply sent");
            }
            ReplyOutcome::SkippedDryRun { reply } => {
                tracing::info!(cycle, slot, reply = %reply, "dry-run: reply generated, not sent");
            }
            ReplyOutcome::CaptureFailed { error } => {
                tracing::warn!(cycle, slot, error = %error, "capture failed");
            }
            ReplyOutcome::GenerationFailed { error } => {
                tracing::warn!(cycle, slot, error = %error, "reply generation failed");
            }
            ReplyOutcome::DeliveryFailed { error, .. } => {
                tracing::warn!(cycle, slot, error = %error, "reply delivery failed");
            }
            skipped => {
                tracing::info!(cycle, slot, outcome = skipped.label(), verdict = ?verdict, "skipped");
            }
        }

        if self.sinks.is_empty() {
            return;
        }
        let entry = RunLogEntry {
            ts,
            run_id: self.run_id.clone(),
            cycle,
            slot,
            verdict: verdict.cloned(),
            outcome: outcome.clone(),
        };
        for sink in &mut self.sinks {
            // A broken log file must not stop the cycle.
            if let Err(e) = sink.append(&entry) {
                tracing::warn!(error = %e, "run log sink append failed");
            }
        }
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

/// `<data_local_dir>/chatloop/runs/run_<id>.jsonl`, falling back to the
/// working directory.
pub fn default_log_path(run_id: &str) -> PathBuf {
    let base = dirs::data_local_dir()
        .map(|d| d.join("chatloop").join("runs"))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(format!("run_{run_id}.jsonl"))
}
