//! docuchat - document text extraction and conversational analysis.
//!
//! Turns scanned or digital documents (images, PDFs, DOCX) into ordered text
//! and forwards it to a chat-completion endpoint, threading caller-owned
//! multi-turn conversation state.

pub mod cli;
pub mod config;
pub mod extract;
pub mod llm;
pub mod ocr;
