//! # TagSense Reader
//!
//! Inventory-tag reading service:
//! - Reader adapter contract and EPC buffer decoding
//! - Reading session with deduplicating tag store and threshold detection
//! - Fallback tag source when no reader can be opened
//! - HTTP control API with server-sent event stream

pub mod api;
pub mod config;
pub mod error;
pub mod fallback;
pub mod notify;
pub mod pagination;
pub mod reader;
pub mod session;

pub use error::{Error, Result};
