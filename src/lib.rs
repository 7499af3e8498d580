pub mod api;
pub mod codegen;
pub mod config;
pub mod error;
pub mod models;
pub mod network;
pub mod recording;
pub mod selector;
pub mod waits;
