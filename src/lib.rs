//! # docchat — Retrieval-Augmented Document Chatbot
//!
//! Ingests a directory of documents into a local vector index, then answers
//! questions over a single HTTP route by retrieving relevant passages and
//! handing them to an LLM-backed agent that composes a grounded answer.
//!
//! ## Architecture
//!
//! - **[`config`]** — Configuration loading, validation, and defaults
//! - **[`store`]** — SQLite + sqlite-vec vector collection (upsert, search, delete)
//! - **[`embedder`]** — Text embedding via ONNX Runtime (bge-small-en-v1.5)
//! - **[`ingest`]** — Document loading, chunking, and differential ingestion
//! - **[`llm`]** — Chat-completions client behind the `LlmProvider` trait
//! - **[`agent`]** — Grounded answer composition from retrieved passages
//! - **[`server`]** — axum HTTP server with the chat route and embedded UI

pub mod agent;
pub mod config;
pub mod embedder;
pub mod ingest;
pub mod llm;
pub mod server;
pub mod store;
