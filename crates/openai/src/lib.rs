//! Chat-completion client and the per-chunk notes requester.

pub mod client;
pub mod reply;
pub mod requester;

pub use client::{
    ChatMessage, ChatRequest, CompletionTransport, HttpTransport, OpenAiConfig, DEFAULT_ENDPOINT,
    DEFAULT_MODEL,
};
pub use reply::decode_reply;
pub use requester::{ChunkNotes, NotesRequester};
