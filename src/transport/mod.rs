mod http_transport;

pub use http_transport::{chat_completions_url, HttpTransport, CHAT_COMPLETIONS_PATH};
