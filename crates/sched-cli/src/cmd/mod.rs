pub mod classify;
pub mod config;
pub mod options;
pub mod plan;
