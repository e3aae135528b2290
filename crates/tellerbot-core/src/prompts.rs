//! Prompt templates for the retrieval fallback. Placeholders are plain
//! `{context}` / `{question}` markers substituted by string replacement.

/// Grounded answer from a high-confidence passage.
pub const ANSWER_FROM_CONTEXT: &str = "You are an AI assistant for TTB bank. Answer the user based ONLY on context.
Context: {context}
Question: {question}
Keep it professional and use the same language as the user.";

/// Softer path for a marginal passage: suggest a related question instead
/// of answering directly.
pub const RECOMMEND_RELATED_QUESTION: &str = "You are an AI assistant for TTB bank.
Create a new recommended question by adding on this context.
Context: {context}
User Query: {question}
Keep it concise and use the same language as the user.";

/// Terminal default when nothing was retrieved at either threshold.
pub const NO_INFORMATION: &str = "You are a helpful AI assistant. Say: \"I don't have that information about {question}\" briefly and in the same language as the user.";

pub fn render(template: &str, context: &str, question: &str) -> String {
    template
        .replace("{context}", context)
        .replace("{question}", question)
}
