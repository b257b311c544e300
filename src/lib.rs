pub mod assistant;
pub mod config;
pub mod error;
pub mod host;
pub mod llm;
pub mod ui;
pub mod version;
