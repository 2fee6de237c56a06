pub mod clear;
pub mod common;
pub mod completions;
pub mod config;
pub mod pending;
pub mod submit;
pub mod sync;
