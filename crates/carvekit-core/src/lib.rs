//! # CarveKit Core
//!
//! Core types and utilities for CarveKit.
//! Provides the tool geometry model, G-code numeric field formatting
//! and parsing, and shared type aliases.

pub mod tools;
pub mod types;
pub mod units;

pub use tools::{CarveTool, ToolShape};
pub use types::BoxedIterator;
pub use units::{format_coord, format_feed, parse_words};
