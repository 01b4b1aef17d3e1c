pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod ocr;
pub mod pipeline;
pub mod transcript;
pub mod video;
