// Composer and board state machines plus the orchestrator that drives them
// from user commands and service results.

pub mod app;
pub mod board;
pub mod composer;
pub mod task;
