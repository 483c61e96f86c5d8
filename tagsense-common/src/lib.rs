//! # TagSense Common Library
//!
//! Shared code for TagSense services:
//! - Tag models (TagRecord, TagCounterSnapshot)
//! - Event types (TagEvent enum) and the EventBus
//! - Configuration file resolution
//! - Common error types

pub mod config;
pub mod error;
pub mod events;
pub mod models;

pub use error::{Error, Result};
pub use events::{EventBus, TagEvent};
pub use models::{TagCounterSnapshot, TagRecord};
