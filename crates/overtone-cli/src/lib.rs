//! Overtone CLI library
//!
//! This module exposes the CLI's internal modules for testing and reuse.

pub mod commands;
pub mod input;
pub mod output;
