//! Per-turn audit logging for operator review.
//!
//! Every completed turn is appended to a flat file and mirrored to the
//! tracing log under a dedicated target. Nothing here ever reaches the
//! caller.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use tellerbot_schema::TurnRecord;

pub struct AuditLog {
    path: Option<PathBuf>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Tracing-only mode, used when no audit file is configured.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn append(&self, record: &TurnRecord) -> Result<()> {
        let metadata = serde_json::to_string(&record.metadata)?;

        tracing::info!(
            target: "tellerbot::audit",
            thread_id = %record.thread_id,
            decision = %record.decision,
            method = record.metadata.method(),
            input = %record.user_input,
            output = %record.final_output,
            "turn_complete"
        );

        if let Some(path) = &self.path {
            let rule = "=".repeat(50);
            let entry = format!(
                "\n{rule}\nAUDIT LOG - Thread: {}\nInput: {}\nDecision: {}\nOutput: {}\nMetadata: {}\n{rule}\n",
                record.thread_id, record.user_input, record.decision, record.final_output, metadata,
            );
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            file.write_all(entry.as_bytes())?;
        }

        Ok(())
    }
}
