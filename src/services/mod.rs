// src/services/mod.rs
pub mod catalog;
pub mod catalog_store;
pub mod chatbot;
pub mod gemini;
pub mod metrics_manager;
pub mod recommender;
pub mod session_manager;
