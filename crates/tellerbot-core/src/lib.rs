pub mod audit;
pub mod fallback;
pub mod orchestrator;
pub mod prompts;
pub mod responders;
pub mod router;
pub mod validator;

pub use audit::AuditLog;
pub use fallback::{RetrievalFallback, CANDIDATE_POOL, HIGH_THRESHOLD, THRESHOLD_DELTA};
pub use orchestrator::Orchestrator;
pub use router::{route, Responder};
pub use validator::validate;
