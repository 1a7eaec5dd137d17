//! Conversational document analysis over a chat-completion API.

mod client;
mod config;
mod conversation;

pub use client::{
    AnalysisClient, AnalysisError, AttemptError, ChatEndpoint, ChatRequest, ChatResponse, Choice,
    ChoiceMessage, HttpEndpoint,
};
pub use config::{AnalysisConfig, DEFAULT_DOCUMENT_PROMPT, DEFAULT_SYSTEM_PROMPT};
pub use conversation::{Conversation, Message, Role};
