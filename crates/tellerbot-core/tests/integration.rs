use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tellerbot_core::{AuditLog, Orchestrator};
use tellerbot_memory::{CheckpointStore, PassageSearch, SqliteCheckpointStore};
use tellerbot_provider::{Generation, TextGenerator};
use tellerbot_schema::{ChatRequest, Intent, ScoredPassage};

struct FixedSearch {
    results: Vec<ScoredPassage>,
    calls: AtomicUsize,
}

impl FixedSearch {
    fn new(results: Vec<(f32, &str)>) -> Arc<Self> {
        Arc::new(Self {
            results: results
                .into_iter()
                .map(|(score, text)| ScoredPassage {
                    text: text.to_string(),
                    score,
                })
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn empty() -> Arc<Self> {
        Self::new(vec![])
    }
}

#[async_trait]
impl PassageSearch for FixedSearch {
    async fn search(&self, _query: &str, pool_size: usize) -> Result<Vec<ScoredPassage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.results.iter().take(pool_size).cloned().collect())
    }
}

struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
    reply: String,
}

impl RecordingGenerator {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
            reply: reply.to_string(),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<Generation> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(Generation {
            content: self.reply.clone(),
            model: "gemma3:4b".into(),
            input_tokens: Some(30),
            output_tokens: Some(12),
            time_to_read: Some(100_000),
            time_to_generate: Some(500_000),
        })
    }
}

fn orchestrator(
    search: Arc<FixedSearch>,
    generator: Arc<RecordingGenerator>,
) -> (Orchestrator, Arc<SqliteCheckpointStore>) {
    let checkpoints = Arc::new(SqliteCheckpointStore::open_in_memory().unwrap());
    let orchestrator = Orchestrator::new(
        search,
        generator,
        checkpoints.clone(),
        AuditLog::disabled(),
    );
    (orchestrator, checkpoints)
}

fn request(input: &str) -> ChatRequest {
    ChatRequest {
        user_input: input.to_string(),
        thread_id: "test-thread".to_string(),
    }
}

// Scenario A: a button label gets its canned answer at zero cost.
#[tokio::test]
async fn button_label_returns_fixed_loan_response() {
    let search = FixedSearch::empty();
    let generator = RecordingGenerator::new("unused");
    let (orch, _) = orchestrator(search.clone(), generator.clone());

    let record = orch.run_turn(&request("สินเชื่อ")).await.unwrap();

    assert_eq!(record.decision, Intent::Loans);
    assert_eq!(record.decision.label(), "สินเชื่อ");
    assert!(record.final_output.contains("สมัครสินเชื่อ"));
    assert_eq!(record.metadata.tokens(), Some(0));
    // Neither collaborator is touched on the static path.
    assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn all_four_buttons_stay_zero_cost() {
    for label in tellerbot_schema::BUTTON_LABELS {
        let search = FixedSearch::empty();
        let generator = RecordingGenerator::new("unused");
        let (orch, _) = orchestrator(search.clone(), generator.clone());

        let record = orch.run_turn(&request(label)).await.unwrap();
        assert_eq!(record.decision.label(), label);
        assert_eq!(record.metadata.method(), "static_response");
        assert_eq!(record.metadata.tokens(), Some(0));
        assert!(generator.prompts().is_empty());
    }
}

// Scenario B: an English greeting gets the English greeting string.
#[tokio::test]
async fn english_greeting_gets_english_reply() {
    let (orch, _) = orchestrator(FixedSearch::empty(), RecordingGenerator::new("unused"));

    let record = orch.run_turn(&request("hello")).await.unwrap();

    assert_eq!(record.decision, Intent::Greeting);
    assert!(record.final_output.starts_with("Hello! I am your TTB AI Assistant"));
    assert_eq!(record.metadata.tokens(), Some(0));
}

// Scenario C: a Thai greeting gets the Thai greeting string.
#[tokio::test]
async fn thai_greeting_gets_thai_reply() {
    let (orch, _) = orchestrator(FixedSearch::empty(), RecordingGenerator::new("unused"));

    let record = orch.run_turn(&request("สวัสดี")).await.unwrap();

    assert_eq!(record.decision, Intent::Greeting);
    assert!(record.final_output.starts_with("สวัสดีครับ"));
    assert_eq!(record.metadata.tokens(), Some(0));
}

// Scenario D: a confident retrieval hit answers from context.
#[tokio::test]
async fn high_scoring_passage_answers_from_context() {
    let search = FixedSearch::new(vec![(0.8, "credit risk passage")]);
    let generator = RecordingGenerator::new("grounded answer");
    let (orch, _) = orchestrator(search.clone(), generator.clone());

    let record = orch
        .run_turn(&request("อยากรู้เรื่อง credit risk"))
        .await
        .unwrap();

    assert_eq!(record.decision, Intent::Unknown);
    assert_eq!(record.final_output, "grounded answer");
    assert!(record.metadata.method().contains("high"));
    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("ONLY on context"));
    // One search call: the low-threshold stage never ran.
    assert_eq!(search.calls.load(Ordering::SeqCst), 1);
}

// Scenario E: only a marginal hit, so suggest a related question.
#[tokio::test]
async fn marginal_passage_recommends_related_question() {
    let search = FixedSearch::new(vec![(0.65, "adjacent topic passage")]);
    let generator = RecordingGenerator::new("maybe ask this instead");
    let (orch, _) = orchestrator(search.clone(), generator.clone());

    let record = orch.run_turn(&request("vague question")).await.unwrap();

    assert!(record.metadata.method().contains("acceptable"));
    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("recommended question"));
    assert_eq!(search.calls.load(Ordering::SeqCst), 2);
}

// Scenario F: nothing retrieved, admit the gap explicitly.
#[tokio::test]
async fn no_passage_degrades_to_missing_information() {
    let search = FixedSearch::new(vec![(0.3, "unrelated")]);
    let generator = RecordingGenerator::new("I don't have that information");
    let (orch, _) = orchestrator(search.clone(), generator.clone());

    let record = orch.run_turn(&request("lottery numbers")).await.unwrap();

    assert!(record.metadata.method().contains("fallback"));
    assert!(record.final_output.contains("don't have that information"));
    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("I don't have that information about lottery numbers"));
}

// Frozen collaborators + identical input => identical shape every time.
#[tokio::test]
async fn repeated_turns_are_idempotent_in_shape() {
    let search = FixedSearch::new(vec![(0.8, "passage")]);
    let generator = RecordingGenerator::new("answer");
    let (orch, _) = orchestrator(search, generator);

    let first = orch.run_turn(&request("free text")).await.unwrap();
    let second = orch.run_turn(&request("free text")).await.unwrap();

    assert_eq!(first.decision, second.decision);
    assert_eq!(first.final_output, second.final_output);
    assert_eq!(first.metadata.method(), second.metadata.method());
}

#[tokio::test]
async fn turn_is_checkpointed_under_its_thread_id() {
    let (orch, checkpoints) = orchestrator(FixedSearch::empty(), RecordingGenerator::new("x"));

    orch.run_turn(&request("hello")).await.unwrap();

    let saved = checkpoints.get("test-thread").await.unwrap().unwrap();
    assert_eq!(saved.user_input, "hello");
    assert_eq!(saved.decision, Intent::Greeting);
}

#[tokio::test]
async fn later_turn_overwrites_the_checkpoint() {
    let (orch, checkpoints) = orchestrator(
        FixedSearch::new(vec![(0.8, "passage")]),
        RecordingGenerator::new("answer"),
    );

    orch.run_turn(&request("hello")).await.unwrap();
    orch.run_turn(&request("free text question")).await.unwrap();

    let saved = checkpoints.get("test-thread").await.unwrap().unwrap();
    assert_eq!(saved.user_input, "free text question");
    assert_eq!(saved.decision, Intent::Unknown);
}

#[tokio::test]
async fn audit_file_gets_one_entry_per_turn() {
    let dir = tempfile::tempdir().unwrap();
    let audit_path = dir.path().join("chat_audit_log.txt");
    let checkpoints = Arc::new(SqliteCheckpointStore::open_in_memory().unwrap());
    let orch = Orchestrator::new(
        FixedSearch::empty(),
        RecordingGenerator::new("x"),
        checkpoints,
        AuditLog::new(&audit_path),
    );

    orch.run_turn(&request("hello")).await.unwrap();
    orch.run_turn(&request("สินเชื่อ")).await.unwrap();

    let content = std::fs::read_to_string(&audit_path).unwrap();
    assert_eq!(content.matches("AUDIT LOG - Thread: test-thread").count(), 2);
    assert!(content.contains("Decision: greeting"));
    assert!(content.contains("Decision: สินเชื่อ"));
}

#[tokio::test]
async fn collaborator_failure_propagates_out_of_the_turn() {
    struct FailingSearch;

    #[async_trait]
    impl PassageSearch for FailingSearch {
        async fn search(&self, _q: &str, _n: usize) -> Result<Vec<ScoredPassage>> {
            anyhow::bail!("search backend unreachable")
        }
    }

    let checkpoints = Arc::new(SqliteCheckpointStore::open_in_memory().unwrap());
    let orch = Orchestrator::new(
        Arc::new(FailingSearch),
        RecordingGenerator::new("x"),
        checkpoints.clone(),
        AuditLog::disabled(),
    );

    let err = orch.run_turn(&request("free text")).await.unwrap_err();
    assert!(err.to_string().contains("unreachable"));
    // The failed turn is never checkpointed.
    assert!(checkpoints.get("test-thread").await.unwrap().is_none());
}

#[tokio::test]
async fn greeting_never_reaches_the_collaborators() {
    let search = FixedSearch::new(vec![(0.9, "passage")]);
    let generator = RecordingGenerator::new("unused");
    let (orch, _) = orchestrator(search.clone(), generator.clone());

    orch.run_turn(&request("sawasdee")).await.unwrap();

    assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    assert!(generator.prompts().is_empty());
}
