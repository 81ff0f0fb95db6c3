// Shared domain types, app/UI protocol messages, and configuration loading.

pub mod comment;
pub mod config;
pub mod protocol;
