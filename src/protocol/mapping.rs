use super::openai_chat::{ChatUsage, WireRole};
use super::unified::{FinishReason, Role, UsageMetadata};

// ---------------------------------------------------------------------------
// Role mappings
// ---------------------------------------------------------------------------

#[must_use]
pub fn unified_role_to_wire(role: Role) -> WireRole {
    match role {
        Role::System => WireRole::System,
        Role::User => WireRole::User,
        Role::Model => WireRole::Assistant,
        Role::Function => WireRole::Tool,
    }
}

#[must_use]
pub fn wire_role_to_unified(role: WireRole) -> Role {
    match role {
        WireRole::System => Role::System,
        WireRole::User => Role::User,
        WireRole::Assistant => Role::Model,
        WireRole::Tool => Role::Function,
    }
}

// ---------------------------------------------------------------------------
// Finish reason mapping
// ---------------------------------------------------------------------------

/// Map a wire `finish_reason` to the unified finish reason.
///
/// Lossy on purpose: `tool_calls` becomes `STOP`, so callers tell tool stops
/// apart by looking for function-call parts.
#[must_use]
pub fn wire_finish_reason_to_unified(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("stop" | "tool_calls") => FinishReason::Stop,
        Some("length") => FinishReason::MaxTokens,
        _ => FinishReason::Other,
    }
}

// ---------------------------------------------------------------------------
// Usage mapping
// ---------------------------------------------------------------------------

#[must_use]
pub fn wire_usage_to_unified(usage: &ChatUsage) -> UsageMetadata {
    UsageMetadata {
        prompt_token_count: usage.prompt_tokens,
        candidates_token_count: usage.completion_tokens,
        total_token_count: usage.total_tokens,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
