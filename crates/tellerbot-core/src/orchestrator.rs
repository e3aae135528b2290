use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tellerbot_memory::{CheckpointStore, PassageSearch};
use tellerbot_provider::TextGenerator;
use tellerbot_schema::{ChatRequest, TurnMetadata, TurnRecord};

use crate::audit::AuditLog;
use crate::fallback::RetrievalFallback;
use crate::responders;
use crate::router::{route, Responder};
use crate::validator::validate;

/// Composes one turn: validator -> router -> responder, then persists the
/// record and writes the audit entry. Collaborators are injected; the
/// orchestrator itself holds no mutable state, so one instance serves all
/// conversations.
pub struct Orchestrator {
    fallback: RetrievalFallback,
    checkpoints: Arc<dyn CheckpointStore>,
    audit: AuditLog,
}

impl Orchestrator {
    pub fn new(
        search: Arc<dyn PassageSearch>,
        generator: Arc<dyn TextGenerator>,
        checkpoints: Arc<dyn CheckpointStore>,
        audit: AuditLog,
    ) -> Self {
        Self {
            fallback: RetrievalFallback::new(search, generator),
            checkpoints,
            audit,
        }
    }

    pub async fn run_turn(&self, request: &ChatRequest) -> Result<TurnRecord> {
        let (decision, validator_metadata) = validate(&request.user_input);
        if let Some(meta) = &validator_metadata {
            // Zero-cost classification; the responder below writes the
            // turn's final metadata.
            tracing::debug!(
                thread_id = %request.thread_id,
                decision = %decision,
                method = meta.method(),
                "classified without model"
            );
        }

        let responder = route(decision);
        let (final_output, metadata) = match responder {
            Responder::Greeting => (
                responders::greeting(&request.user_input).to_string(),
                TurnMetadata::static_response(Utc::now()),
            ),
            Responder::RetrievalFallback => self.fallback.respond(&request.user_input).await?,
            fixed => {
                let text = responders::canned(fixed)
                    .expect("static responders always have canned text");
                (text.to_string(), TurnMetadata::static_response(Utc::now()))
            }
        };

        let record = TurnRecord {
            thread_id: request.thread_id.clone(),
            user_input: request.user_input.clone(),
            decision,
            final_output,
            metadata,
            at: Utc::now(),
        };

        self.checkpoints.put(record.clone()).await?;

        // Audit failure is an operator problem, not a turn failure.
        if let Err(err) = self.audit.append(&record) {
            tracing::warn!(error = %err, "audit append failed");
        }

        Ok(record)
    }
}
