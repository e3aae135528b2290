use chrono::Utc;
use tellerbot_schema::{Intent, TurnMetadata};

/// Greeting substrings, English and Thai. Matched against the normalized
/// input with `contains`, so "hello there" still greets.
const GREETINGS: [&str; 6] = ["hi", "hello", "สวัสดี", "หวัดดี", "sawasdee", "hey"];

/// Classify raw user text into the closed intent set. Total: every input
/// yields a decision, no external calls, no failure modes.
///
/// Button matches are exact against the normalized text and come with
/// zero-token string-match metadata; greetings match on substring; anything
/// else is `Unknown` with no metadata attached yet.
pub fn validate(user_input: &str) -> (Intent, Option<TurnMetadata>) {
    let normalized = user_input.trim().to_lowercase();

    if let Some(intent) = Intent::from_button_label(&normalized) {
        return (intent, Some(TurnMetadata::string_match(Utc::now())));
    }

    if GREETINGS.iter().any(|greet| normalized.contains(greet)) {
        return (Intent::Greeting, Some(TurnMetadata::string_match(Utc::now())));
    }

    (Intent::Unknown, None)
}
