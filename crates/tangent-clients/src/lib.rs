//! External collaborator interfaces (spec §6) and one reqwest-based
//! implementation of each.
//!
//! These are the four vendor seams the core pipeline depends on but does
//! not own: an LLM, an embedding service, a web-search index, and a
//! long-term memory store. Every trait method returns `anyhow::Result` —
//! callers decide what a failure means for their own fallback, this crate
//! only needs to report that the call didn't work.

mod error;
mod llm;
mod embedding;
mod websearch;
mod memory_store;

pub use error::ClientError;
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, Message, OpenAiLlmClient, Role};
pub use embedding::{EmbeddingClient, HttpEmbeddingClient};
pub use websearch::{ExaWebSearchClient, SearchOptions, WebSearchClient};
pub use memory_store::{MemoryStoreClient, SupermemoryClient};
