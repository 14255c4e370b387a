//! casegen-completion: one blocking call to a chat-completion endpoint.
//!
//! The client sends a single user message, non-streaming, and hands back
//! the text of the first choice. It never retries and keeps no state
//! between calls. [`Completer`] is the seam the server depends on, so
//! handlers can run against a stub.

mod client;
mod error;
mod stop;

pub use client::{
    ChatCompletionClient, ClientConfig, Completer, CompletionRequest, API_KEY_ENV,
    DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, PLACEHOLDER_API_KEY,
};
pub use error::CompletionError;
pub use stop::truncate_at_stop;
