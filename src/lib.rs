pub mod config;
pub mod error;
pub mod generator;
pub mod observability;
pub mod protocol;
pub mod stream;
pub mod transport;

mod util;

pub use error::{AdapterError, ChunkParseWarning};
pub use generator::{ContentGenerator, OllamaContentGenerator, ResponseStream};
