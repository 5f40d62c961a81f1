use crate::error::AdapterError;
use crate::protocol::mapping::{wire_finish_reason_to_unified, wire_usage_to_unified};
use crate::protocol::unified::{
    Candidate, Content, FunctionCall, GenerateContentResponse, Part, Role,
};

use super::{ChatResponse, StreamChunk, ToolCall};

/// Decode a non-streaming Chat Completions response into a unified response.
///
/// Only the first choice is used. Text comes first, then one function-call
/// part per tool call in wire order.
///
/// # Errors
///
/// Returns [`AdapterError::NoCandidate`] when the response has no choices and
/// [`AdapterError::MalformedToolArguments`] when a tool call's argument text
/// is not valid JSON.
pub fn decode_chat_response(
    response: &ChatResponse,
) -> Result<GenerateContentResponse, AdapterError> {
    let choice = response.choices.first().ok_or(AdapterError::NoCandidate)?;

    let mut parts: Vec<Part> = Vec::new();

    if let Some(text) = choice.message.content.as_deref() {
        if !text.is_empty() {
            parts.push(Part::Text(text.to_string()));
        }
    }

    if let Some(ref tool_calls) = choice.message.tool_calls {
        for tool_call in tool_calls {
            parts.push(Part::FunctionCall(decode_tool_call(tool_call)?));
        }
    }

    Ok(GenerateContentResponse {
        candidates: vec![Candidate {
            index: 0,
            content: Content::new(Role::Model, parts),
            finish_reason: wire_finish_reason_to_unified(choice.finish_reason.as_deref()),
        }],
        usage_metadata: response.usage.as_ref().map(wire_usage_to_unified),
        model_version: Some(response.model.clone()),
        response_id: Some(response.id.clone()),
    })
}

fn decode_tool_call(tool_call: &ToolCall) -> Result<FunctionCall, AdapterError> {
    let args = serde_json::from_str(&tool_call.function.arguments).map_err(|source| {
        AdapterError::MalformedToolArguments {
            name: tool_call.function.name.clone(),
            source,
        }
    })?;
    Ok(FunctionCall {
        name: tool_call.function.name.clone(),
        args: Some(args),
    })
}

/// Decode one streamed chunk into a unified partial response.
///
/// Returns `None` when the chunk has no choices. The result always carries
/// exactly one text part holding the delta text (empty when absent).
/// Tool-call deltas are not reassembled into function-call parts.
#[must_use]
pub fn decode_stream_chunk(chunk: &StreamChunk) -> Option<GenerateContentResponse> {
    let choice = chunk.choices.first()?;
    let text = choice.delta.content.clone().unwrap_or_default();

    Some(GenerateContentResponse {
        candidates: vec![Candidate {
            index: 0,
            content: Content::new(Role::Model, vec![Part::Text(text)]),
            finish_reason: wire_finish_reason_to_unified(choice.finish_reason.as_deref()),
        }],
        usage_metadata: None,
        model_version: Some(chunk.model.clone()),
        response_id: Some(chunk.id.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::unified::FinishReason;
    use serde_json::json;

    fn response(value: serde_json::Value) -> ChatResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_decode_text_response() {
        let resp = response(json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "devstral:24b",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello!"},
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 10,
                "completion_tokens": 5,
                "total_tokens": 15
            }
        }));
        let unified = decode_chat_response(&resp).unwrap();
        assert_eq!(unified.response_id.as_deref(), Some("chatcmpl-123"));
        assert_eq!(unified.model_version.as_deref(), Some("devstral:24b"));
        let candidate = &unified.candidates[0];
        assert_eq!(candidate.content.role, Some(Role::Model));
        assert_eq!(candidate.content.parts(), &[Part::text("Hello!")]);
        assert_eq!(candidate.finish_reason, FinishReason::Stop);
        let usage = unified.usage_metadata.unwrap();
        assert_eq!(usage.prompt_token_count, 10);
        assert_eq!(usage.candidates_token_count, 5);
        assert_eq!(usage.total_token_count, 15);
    }

    #[test]
    fn test_decode_tool_call_response() {
        let resp = response(json!({
            "id": "chatcmpl-456",
            "object": "chat.completion",
            "model": "devstral:24b",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Checking.",
                    "tool_calls": [
                        {
                            "id": "call_abc",
                            "type": "function",
                            "function": {"name": "get_weather", "arguments": "{\"location\":\"SF\"}"}
                        },
                        {
                            "id": "call_def",
                            "type": "function",
                            "function": {"name": "get_time", "arguments": "{}"}
                        }
                    ]
                },
                "finish_reason": "tool_calls"
            }]
        }));
        let unified = decode_chat_response(&resp).unwrap();
        let parts = unified.candidates[0].content.parts();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], Part::text("Checking."));
        assert_eq!(
            parts[1],
            Part::FunctionCall(FunctionCall {
                name: "get_weather".to_string(),
                args: Some(json!({"location": "SF"})),
            })
        );
        assert!(matches!(&parts[2], Part::FunctionCall(call) if call.name == "get_time"));
        assert_eq!(unified.candidates[0].finish_reason, FinishReason::Stop);
        assert!(unified.usage_metadata.is_none());
    }

    #[test]
    fn test_null_and_empty_content_produce_no_text_part() {
        for content in [json!(null), json!("")] {
            let resp = response(json!({
                "id": "x",
                "model": "m",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": content},
                    "finish_reason": "length"
                }]
            }));
            let unified = decode_chat_response(&resp).unwrap();
            assert!(unified.candidates[0].content.parts().is_empty());
            assert_eq!(unified.candidates[0].finish_reason, FinishReason::MaxTokens);
        }
    }

    #[test]
    fn test_decode_empty_choices() {
        let resp = response(json!({
            "id": "chatcmpl-789",
            "object": "chat.completion",
            "model": "m",
            "choices": []
        }));
        assert!(matches!(
            decode_chat_response(&resp),
            Err(AdapterError::NoCandidate)
        ));
    }

    #[test]
    fn test_malformed_tool_arguments_are_rejected() {
        let resp = response(json!({
            "id": "x",
            "model": "m",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "broken", "arguments": "{\"a\":"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }));
        let err = decode_chat_response(&resp).unwrap_err();
        assert!(matches!(
            err,
            AdapterError::MalformedToolArguments { ref name, .. } if name == "broken"
        ));
    }

    #[test]
    fn test_unknown_finish_reason_maps_to_other() {
        let resp = response(json!({
            "id": "x",
            "model": "m",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "hi"},
                "finish_reason": null
            }]
        }));
        let unified = decode_chat_response(&resp).unwrap();
        assert_eq!(unified.candidates[0].finish_reason, FinishReason::Other);
    }

    #[test]
    fn test_decode_stream_chunk_text_delta() {
        let chunk: StreamChunk = serde_json::from_value(json!({
            "id": "chatcmpl-s1",
            "object": "chat.completion.chunk",
            "created": 1,
            "model": "devstral:24b",
            "choices": [{"index": 0, "delta": {"content": "Hi"}, "finish_reason": null}]
        }))
        .unwrap();
        let unified = decode_stream_chunk(&chunk).unwrap();
        assert_eq!(unified.candidates[0].content.parts(), &[Part::text("Hi")]);
        assert_eq!(unified.candidates[0].finish_reason, FinishReason::Other);
        assert_eq!(unified.response_id.as_deref(), Some("chatcmpl-s1"));
        assert_eq!(unified.model_version.as_deref(), Some("devstral:24b"));
        assert!(unified.usage_metadata.is_none());
    }

    #[test]
    fn test_decode_stream_chunk_without_content_yields_empty_text() {
        let chunk: StreamChunk = serde_json::from_value(json!({
            "id": "chatcmpl-s2",
            "model": "m",
            "choices": [{
                "index": 0,
                "delta": {
                    "tool_calls": [{"index": 0, "id": "call_1", "function": {"name": "f", "arguments": "{}"}}]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();
        let unified = decode_stream_chunk(&chunk).unwrap();
        assert_eq!(unified.candidates[0].content.parts(), &[Part::text("")]);
        assert_eq!(unified.candidates[0].finish_reason, FinishReason::Stop);
    }

    #[test]
    fn test_decode_stream_chunk_without_choices_is_skipped() {
        let chunk: StreamChunk = serde_json::from_value(json!({
            "id": "chatcmpl-s3",
            "model": "m",
            "choices": []
        }))
        .unwrap();
        assert!(decode_stream_chunk(&chunk).is_none());
    }
}
