use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tellerbot_memory::PassageSearch;
use tellerbot_provider::{Generation, TextGenerator};
use tellerbot_schema::{ScoredPassage, TurnMetadata};

/// Relevance floor for a direct grounded answer.
pub const HIGH_THRESHOLD: f32 = 0.75;
/// Subtracted from the high threshold for the second, softer attempt.
pub const THRESHOLD_DELTA: f32 = 0.15;
/// Candidate pool requested from the search collaborator before filtering.
pub const CANDIDATE_POOL: usize = 5;

/// The two retrieval stages, tried in order. Each pairs a threshold with a
/// prompt template and a metadata tag; a confident hit answers directly, a
/// marginal one only suggests a related question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Answer,
    Recommend,
}

impl Stage {
    fn threshold(self) -> f32 {
        match self {
            Self::Answer => HIGH_THRESHOLD,
            Self::Recommend => HIGH_THRESHOLD - THRESHOLD_DELTA,
        }
    }

    fn template(self) -> &'static str {
        match self {
            Self::Answer => crate::prompts::ANSWER_FROM_CONTEXT,
            Self::Recommend => crate::prompts::RECOMMEND_RELATED_QUESTION,
        }
    }

    fn metadata(self, generation: &Generation) -> TurnMetadata {
        match self {
            Self::Answer => TurnMetadata::RagHighThreshold {
                model: generation.model.clone(),
                input_tokens: generation.input_tokens,
                output_tokens: generation.output_tokens,
                time_to_read: generation.time_to_read,
                time_to_generate: generation.time_to_generate,
                timestamp: Utc::now(),
            },
            Self::Recommend => TurnMetadata::RagAcceptableThreshold {
                model: generation.model.clone(),
                input_tokens: generation.input_tokens,
                output_tokens: generation.output_tokens,
                time_to_read: generation.time_to_read,
                time_to_generate: generation.time_to_generate,
                timestamp: Utc::now(),
            },
        }
    }
}

/// Free-text responder: a two-stage threshold cascade over the search
/// collaborator, degrading to an explicit no-information answer. Each
/// external call is attempted exactly once; failures propagate.
pub struct RetrievalFallback {
    search: Arc<dyn PassageSearch>,
    generator: Arc<dyn TextGenerator>,
}

impl RetrievalFallback {
    pub fn new(search: Arc<dyn PassageSearch>, generator: Arc<dyn TextGenerator>) -> Self {
        Self { search, generator }
    }

    pub async fn respond(&self, user_input: &str) -> Result<(String, TurnMetadata)> {
        for stage in [Stage::Answer, Stage::Recommend] {
            let candidates = self.search.search(user_input, CANDIDATE_POOL).await?;
            if let Some(passage) = first_above(&candidates, stage.threshold()) {
                tracing::debug!(
                    stage = ?stage,
                    score = passage.score,
                    "retrieval stage matched"
                );
                let prompt = crate::prompts::render(stage.template(), &passage.text, user_input);
                let generation = self.generator.generate(&prompt).await?;
                let metadata = stage.metadata(&generation);
                return Ok((generation.content, metadata));
            }
        }

        tracing::debug!("no passage at either threshold, answering without context");
        let prompt = crate::prompts::render(crate::prompts::NO_INFORMATION, "", user_input);
        let generation = self.generator.generate(&prompt).await?;
        let metadata = TurnMetadata::FallbackLowThreshold {
            model: generation.model.clone(),
            input_tokens: generation.input_tokens,
            output_tokens: generation.output_tokens,
            time_to_read: generation.time_to_read,
            time_to_generate: generation.time_to_generate,
            timestamp: Utc::now(),
        };
        Ok((generation.content, metadata))
    }
}

/// First candidate at or above the threshold. Candidates arrive ordered by
/// descending score, so this is also the best one.
fn first_above(candidates: &[ScoredPassage], threshold: f32) -> Option<&ScoredPassage> {
    candidates.iter().find(|p| p.score >= threshold)
}
