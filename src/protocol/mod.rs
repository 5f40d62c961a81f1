pub mod mapping;
pub mod openai_chat;
pub mod unified;
