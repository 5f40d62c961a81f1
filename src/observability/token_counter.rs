use std::time::Duration;

use tracing::info;

use crate::protocol::openai_chat::ChatMessage;
use crate::protocol::unified::UsageMetadata;

const CHARS_PER_TOKEN: u64 = 4;

/// Estimate the number of tokens in `text`.
///
/// Uses the `chars / 4` heuristic, rounded up, instead of a real tokenizer.
#[must_use]
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(CHARS_PER_TOKEN)
}

/// Estimate the tokens of a mapped message list.
///
/// Character counts of every message body are summed before the ceiling
/// division, so many short messages are not each rounded up.
#[must_use]
pub fn estimate_messages_tokens(messages: &[ChatMessage]) -> u64 {
    let chars: u64 = messages
        .iter()
        .map(|message| message.content.chars().count() as u64)
        .sum();
    chars.div_ceil(CHARS_PER_TOKEN)
}

/// Log token usage for a completed generation at INFO level.
pub fn log_generation_usage(model: &str, usage: Option<&UsageMetadata>, duration: Duration) {
    let usage = usage.copied().unwrap_or_default();
    info!(
        model = model,
        prompt_tokens = usage.prompt_token_count,
        candidates_tokens = usage.candidates_token_count,
        total_tokens = usage.total_token_count,
        duration_seconds = duration.as_secs_f64(),
        "generation completed"
    );
}
