//! casegen-core: prompt construction and reply extraction.
//!
//! Pure building blocks for turning a function snippet or a requirement
//! description into a chat exchange, and for recovering the structured
//! test-design payload from whatever text the model sends back.
//!
//! # Public API
//!
//! - [`GenerationKind`] -- what the caller submitted (code or requirement)
//! - [`build_messages()`] / [`serialize_exchange()`] -- prompt construction
//! - [`extract()`] / [`extract_bytes()`] -- reply extraction into an
//!   [`ExtractionResult`]
//!
//! Nothing in this crate performs I/O.

pub mod extract;
pub mod kind;
pub mod prompt;

pub use extract::{extract, extract_bytes, ExtractionFailure, ExtractionResult, FailureKind};
pub use kind::{GenerationKind, UnknownKind};
pub use prompt::{build_messages, serialize_exchange, ChatMessage, Role, SYSTEM_PROMPT};
