use serde_json::Value;

use crate::error::AdapterError;
use crate::protocol::mapping::unified_role_to_wire;
use crate::protocol::unified::{
    normalize_contents, Content, ContentList, FunctionCall, FunctionResponse,
    GenerateContentRequest, Part, Role, SystemInstruction, Tool,
};
use crate::util::CallIdGenerator;

use super::{
    function_type, ChatMessage, ChatRequest, ChatTool, ChatToolFunction, ToolCall,
    ToolCallFunction, WireRole,
};

/// Encode a unified request into the Chat Completions wire format.
///
/// `default_model` is used when the request does not name a model.
/// Generation-config scalars are passed through unchanged.
///
/// # Errors
///
/// Returns [`AdapterError::Encode`] when a function-call argument or
/// function-response value cannot be serialized to JSON text.
pub fn encode_chat_request(
    request: &GenerateContentRequest,
    default_model: &str,
    stream: bool,
) -> Result<ChatRequest, AdapterError> {
    let config = request.config.as_ref();
    let mut messages = encode_messages(&request.contents)?;

    if let Some(system) = config.and_then(|c| c.system_instruction.as_ref()) {
        if let Some(message) = encode_system_instruction(system) {
            messages.insert(0, message);
        }
    }

    let model = match request.model.as_deref() {
        Some(model) if !model.is_empty() => model.to_string(),
        _ => default_model.to_string(),
    };

    Ok(ChatRequest {
        model,
        messages,
        stream,
        tools: encode_tools(config.and_then(|c| c.tools.as_deref())),
        temperature: config.and_then(|c| c.temperature),
        top_p: config.and_then(|c| c.top_p),
        max_tokens: config.and_then(|c| c.max_output_tokens),
    })
}

/// Encode unified contents into wire messages, preserving conversation order.
///
/// Tool-call ids are drawn from one generator per call, so they are unique
/// across the whole message list.
///
/// # Errors
///
/// Returns [`AdapterError::Encode`] when a part payload cannot be serialized.
pub fn encode_messages(contents: &ContentList) -> Result<Vec<ChatMessage>, AdapterError> {
    let contents = normalize_contents(contents);
    let mut ids = CallIdGenerator::new();
    let mut messages = Vec::with_capacity(contents.len());
    for content in contents {
        messages.push(encode_message(content, &mut ids)?);
    }
    Ok(messages)
}

fn encode_message(content: &Content, ids: &mut CallIdGenerator) -> Result<ChatMessage, AdapterError> {
    let role = unified_role_to_wire(content.role.unwrap_or(Role::User));

    let mut text = String::new();
    let mut tool_calls: Vec<ToolCall> = Vec::new();
    let mut tool_call_id: Option<String> = None;

    for part in content.parts() {
        match part {
            Part::Text(t) => text.push_str(t),
            Part::FunctionCall(call) => tool_calls.push(encode_tool_call(call, ids)?),
            Part::FunctionResponse(response) => {
                // Last response wins; any text gathered so far is replaced.
                tool_call_id = Some(function_response_call_id(response));
                text = serde_json::to_string(&response.response)
                    .map_err(|e| AdapterError::Encode(e.to_string()))?;
            }
        }
    }

    Ok(ChatMessage {
        role,
        content: text,
        tool_calls: if tool_calls.is_empty() {
            None
        } else {
            Some(tool_calls)
        },
        tool_call_id,
    })
}

fn encode_tool_call(call: &FunctionCall, ids: &mut CallIdGenerator) -> Result<ToolCall, AdapterError> {
    let arguments = match call.args.as_ref() {
        None | Some(Value::Null) => "{}".to_string(),
        Some(args) => {
            serde_json::to_string(args).map_err(|e| AdapterError::Encode(e.to_string()))?
        }
    };
    Ok(ToolCall {
        id: ids.next_id(),
        type_: function_type(),
        function: ToolCallFunction {
            name: call.name.clone(),
            arguments,
        },
    })
}

/// Tool-call id a function response refers to: `call_<name>`.
#[must_use]
pub fn function_response_call_id(response: &FunctionResponse) -> String {
    let name = match response.name.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => "unknown",
    };
    format!("call_{name}")
}

fn encode_system_instruction(system: &SystemInstruction) -> Option<ChatMessage> {
    if matches!(system, SystemInstruction::Text(text) if text.is_empty()) {
        return None;
    }
    Some(ChatMessage {
        role: WireRole::System,
        content: system.text(),
        tool_calls: None,
        tool_call_id: None,
    })
}

/// Flatten all tool groups into wire tool descriptors.
///
/// Declarations without a name are dropped; an empty result is `None`.
#[must_use]
pub fn encode_tools(tools: Option<&[Tool]>) -> Option<Vec<ChatTool>> {
    let encoded: Vec<ChatTool> = tools?
        .iter()
        .filter_map(|tool| tool.function_declarations.as_deref())
        .flatten()
        .filter_map(|decl| {
            let name = decl.name.as_deref().filter(|name| !name.is_empty())?;
            Some(ChatTool {
                type_: function_type(),
                function: ChatToolFunction {
                    name: name.to_string(),
                    description: decl.description.clone(),
                    parameters: decl.parameters.clone(),
                },
            })
        })
        .collect();

    if encoded.is_empty() {
        None
    } else {
        Some(encoded)
    }
}
